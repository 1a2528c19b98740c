//! Entity - opaque generational identifier for game objects.
//!
//! Low 32 bits = id, high 32 bits = generation (version). `NullEntity`
//! is all-ones. Id 0 is reserved and never allocated so the "non-zero"
//! half of the validity predicate is free to check `id != 0`.

use alloc::vec::Vec;
use core::fmt;
use core::hash::{Hash, Hasher};

/// Entity identifier with a generation for ABA protection.
#[derive(Clone, Copy, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The null entity sentinel: all bits set.
    #[inline]
    pub const fn null() -> Self {
        Self {
            index: u32::MAX,
            generation: u32::MAX,
        }
    }

    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        self.index == u32::MAX && self.generation == u32::MAX
    }

    /// Validity predicate: non-null, non-zero id, and below the
    /// reserved sentinel (`u32::MAX`, shared with `null`).
    #[inline]
    pub const fn is_valid_handle_shape(&self) -> bool {
        !self.is_null() && self.index != 0 && self.index != u32::MAX
    }

    #[inline]
    pub const fn to_bits(&self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl PartialEq for Entity {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_bits().hash(state);
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Entity(null)")
        } else {
            write!(f, "Entity({}v{})", self.index, self.generation)
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}v{}", self.index, self.generation)
        }
    }
}

/// Entity id allocator: free-list + generation table.
///
/// Id `0` is never handed out; the first call to `allocate` returns id
/// `1`, generation `1`. Generation only advances when a freed id is
/// *reused* (on the allocate that pops it back off the free list), not
/// at release time — so `is_alive` must check entity-set membership as
/// well as generation, not generation alone (a released id keeps its
/// last-assigned generation until reallocated).
pub struct EntityAllocator {
    /// generations[id] = current version last handed out for `id`.
    /// Index 0 is an unused placeholder so real ids start at 1.
    generations: Vec<u32>,
    /// Whether `id` is currently present in the entity-set.
    alive: Vec<bool>,
    free_list: Vec<u32>,
    alive_count: usize,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            generations: alloc::vec![0],
            alive: alloc::vec![false],
            free_list: Vec::new(),
            alive_count: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut generations = Vec::with_capacity(capacity + 1);
        generations.push(0);
        let mut alive = Vec::with_capacity(capacity + 1);
        alive.push(false);
        Self {
            generations,
            alive,
            free_list: Vec::new(),
            alive_count: 0,
        }
    }

    /// Allocate a new entity handle.
    pub fn allocate(&mut self) -> Entity {
        let index = if let Some(index) = self.free_list.pop() {
            index
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(false);
            index
        };

        let generation = self.generations[index as usize] + 1;
        self.generations[index as usize] = generation;
        self.alive[index as usize] = true;
        self.alive_count += 1;
        Entity::new(index, generation)
    }

    /// Release an entity handle. No-op (returns `false`) if the handle
    /// is already stale or was never allocated; logged by the caller.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        self.alive[entity.index as usize] = false;
        self.free_list.push(entity.index);
        self.alive_count -= 1;
        true
    }

    /// True iff `entity`'s generation matches the table AND its id is
    /// currently in the entity-set.
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        if !entity.is_valid_handle_shape() {
            return false;
        }
        let idx = entity.index as usize;
        self.generations.get(idx).copied() == Some(entity.generation)
            && self.alive.get(idx).copied().unwrap_or(false)
    }

    #[inline]
    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.generations.len().saturating_sub(1)
    }

    /// Current generation for `id`, or `None` if `id` was never
    /// allocated.
    pub fn generation_of(&self, id: u32) -> Option<u32> {
        self.generations.get(id as usize).copied().filter(|_| id != 0)
    }

    pub fn reserve(&mut self, additional: usize) {
        self.generations.reserve(additional);
        self.alive.reserve(additional);
    }

    /// Every currently-live entity, in ascending id order.
    pub fn live_entities(&self) -> Vec<Entity> {
        let mut out = Vec::with_capacity(self.alive_count);
        for (index, &is_alive) in self.alive.iter().enumerate() {
            if is_alive {
                out.push(Entity::new(index as u32, self.generations[index]));
            }
        }
        out
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
