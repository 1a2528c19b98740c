//! Archetype / Chunk - cache-line-aligned hot-path component storage.
//! Optional: `Registry`'s primary storage is `ComponentPool<T>`
//! (`component.rs`); archetypes exist for callers that want
//! contiguous, aligned multi-component rows for SIMD iteration over a
//! fixed component signature.
//!
//! Structurally grounded on the donor's `Archetype`/`Archetypes`
//! (signature-keyed dedup, swap-with-tail row removal, entity ->
//! (chunk, row) lookup); the deterministic aligned byte-offset layout
//! within a chunk is new.

use crate::component::ComponentTypeId;
use crate::entity::Entity;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use engine_memory::align_up;

/// Default chunk size (16 KiB) and cache-line alignment (64 B).
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;
pub const CACHE_LINE: usize = 64;
pub const METADATA_RESERVE: usize = 512;
pub const MIN_CHUNK_CAPACITY: usize = 16;
pub const MAX_CHUNK_CAPACITY: usize = 1024;

/// Unique identifier for an archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArchetypeId(pub u32);

impl ArchetypeId {
    pub const INVALID: Self = Self(u32::MAX);
}

/// Per-type layout description a caller supplies when declaring an
/// archetype's component signature. `drop_fn` is invoked on the
/// original tail slot's bytes when a row is swap-removed, so
/// non-trivial component types stay sound; `None` for `T: Copy` style
/// "plain data records".
#[derive(Clone, Copy)]
pub struct ComponentLayout {
    pub type_id: ComponentTypeId,
    pub size: usize,
    pub align: usize,
    pub drop_fn: Option<unsafe fn(*mut u8)>,
}

impl ComponentLayout {
    pub fn of<T: 'static>(type_id: ComponentTypeId) -> Self {
        unsafe fn drop_in_place_erased<T>(ptr: *mut u8) {
            core::ptr::drop_in_place(ptr as *mut T);
        }
        let drop_fn = if core::mem::needs_drop::<T>() {
            Some(drop_in_place_erased::<T> as unsafe fn(*mut u8))
        } else {
            None
        };
        Self {
            type_id,
            size: core::mem::size_of::<T>(),
            align: core::mem::align_of::<T>(),
            drop_fn,
        }
    }
}

/// Entity-id slot size within a chunk: `Entity::to_bits()` is a u64.
const ENTITY_ID_SIZE: usize = 8;

#[derive(Clone, Copy)]
struct ResolvedSlot {
    layout: ComponentLayout,
    offset: usize,
}

/// Result of the deterministic chunk-layout computation.
struct ChunkLayout {
    capacity: usize,
    slots: Vec<ResolvedSlot>,
    total_bytes: usize,
}

fn layout_size_for(capacity: usize, components: &[ComponentLayout]) -> usize {
    let mut offset = align_up(capacity * ENTITY_ID_SIZE, CACHE_LINE);
    for c in components {
        offset = align_up(offset, c.align.max(CACHE_LINE));
        offset += capacity * c.size;
    }
    offset
}

fn resolve_slots(capacity: usize, components: &[ComponentLayout]) -> (Vec<ResolvedSlot>, usize) {
    let mut offset = align_up(capacity * ENTITY_ID_SIZE, CACHE_LINE);
    let mut slots = Vec::with_capacity(components.len());
    for &layout in components {
        offset = align_up(offset, layout.align.max(CACHE_LINE));
        slots.push(ResolvedSlot { layout, offset });
        offset += capacity * layout.size;
    }
    (slots, offset)
}

fn compute_chunk_layout(components: &[ComponentLayout], chunk_size: usize) -> ChunkLayout {
    let budget = chunk_size.saturating_sub(METADATA_RESERVE);

    // largest capacity in [MIN_CHUNK_CAPACITY, MAX_CHUNK_CAPACITY] whose
    // layout fits the budget; layout size is monotonic in capacity.
    let mut lo = MIN_CHUNK_CAPACITY;
    let mut hi = MAX_CHUNK_CAPACITY;
    let mut best = MIN_CHUNK_CAPACITY;
    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        if layout_size_for(mid, components) <= budget {
            best = mid;
            lo = mid + 1;
        } else if mid == 0 {
            break;
        } else {
            hi = mid - 1;
        }
    }

    let (slots, total_bytes) = resolve_slots(best, components);
    ChunkLayout {
        capacity: best,
        slots,
        total_bytes,
    }
}

/// A fixed-size, cache-line-aligned byte buffer holding up to
/// `capacity` rows for one component signature.
pub struct Chunk {
    buffer: Vec<u8>,
    layout: Vec<ResolvedSlot>,
    capacity: usize,
    len: usize,
}

impl Chunk {
    fn new(chunk_layout: &ChunkLayout) -> Self {
        Self {
            buffer: alloc::vec![0u8; chunk_layout.total_bytes],
            layout: chunk_layout.slots.clone(),
            capacity: chunk_layout.capacity,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn has_space(&self) -> bool {
        self.len < self.capacity
    }

    fn entity_ptr(&self, row: usize) -> *const u64 {
        unsafe { self.buffer.as_ptr().add(row * ENTITY_ID_SIZE) as *const u64 }
    }

    fn entity_ptr_mut(&mut self, row: usize) -> *mut u64 {
        unsafe { self.buffer.as_mut_ptr().add(row * ENTITY_ID_SIZE) as *mut u64 }
    }

    pub fn entity_at(&self, row: usize) -> Entity {
        debug_assert!(row < self.len);
        Entity::from_bits(unsafe { *self.entity_ptr(row) })
    }

    fn slot_for(&self, type_id: ComponentTypeId) -> Option<&ResolvedSlot> {
        self.layout.iter().find(|s| s.layout.type_id == type_id)
    }

    fn component_ptr(&self, type_id: ComponentTypeId, row: usize) -> Option<*const u8> {
        let slot = self.slot_for(type_id)?;
        Some(unsafe { self.buffer.as_ptr().add(slot.offset + row * slot.layout.size) })
    }

    fn component_ptr_mut(&mut self, type_id: ComponentTypeId, row: usize) -> Option<*mut u8> {
        let slot = self.slot_for(type_id)?;
        let offset = slot.offset + row * slot.layout.size;
        Some(unsafe { self.buffer.as_mut_ptr().add(offset) })
    }

    /// Read a typed reference to the component at `row`. The caller
    /// must pass the same `T` the archetype was declared with for
    /// `type_id` (caller contract, matching the donor's unsafe
    /// `get<T>`/`get_mut<T>` pair).
    ///
    /// # Safety
    /// `T` must match the layout registered for `type_id`.
    pub unsafe fn component<T>(&self, type_id: ComponentTypeId, row: usize) -> Option<&T> {
        self.component_ptr(type_id, row).map(|p| &*(p as *const T))
    }

    /// # Safety
    /// `T` must match the layout registered for `type_id`.
    pub unsafe fn component_mut<T>(&mut self, type_id: ComponentTypeId, row: usize) -> Option<&mut T> {
        self.component_ptr_mut(type_id, row).map(|p| &mut *(p as *mut T))
    }

    /// Append a row: write the entity id, then each component via
    /// `write`. `write(row, type_id, dst_ptr)` must initialize
    /// `size_of` bytes at `dst_ptr` for that component slot.
    ///
    /// # Safety
    /// `write` must fully initialize every declared component slot for
    /// the new row before returning.
    pub unsafe fn push_row(&mut self, entity: Entity, mut write: impl FnMut(ComponentTypeId, *mut u8)) -> usize {
        debug_assert!(self.has_space());
        let row = self.len;
        *self.entity_ptr_mut(row) = entity.to_bits();
        let type_ids: Vec<ComponentTypeId> = self.layout.iter().map(|s| s.layout.type_id).collect();
        for type_id in type_ids {
            let ptr = self.component_ptr_mut(type_id, row).expect("declared slot");
            write(type_id, ptr);
        }
        self.len += 1;
        row
    }

    /// Remove row: swap-with-tail across every component array,
    /// running destructors on the vacated tail slot for non-trivial
    /// types. Returns the entity that was moved into
    /// `row`, if any (the caller must fix up its index).
    pub fn swap_remove_row(&mut self, row: usize) -> Option<Entity> {
        debug_assert!(row < self.len);
        let last = self.len - 1;

        if row != last {
            for slot in self.layout.clone() {
                unsafe {
                    let dst = self.component_ptr_mut(slot.layout.type_id, row).unwrap();
                    let src = self.component_ptr_mut(slot.layout.type_id, last).unwrap();
                    core::ptr::copy_nonoverlapping(src, dst, slot.layout.size);
                }
            }
            unsafe {
                *self.entity_ptr_mut(row) = *self.entity_ptr(last);
            }
        } else {
            // dropping the tail in place
            for slot in self.layout.clone() {
                if let Some(drop_fn) = slot.layout.drop_fn {
                    unsafe {
                        let ptr = self.component_ptr_mut(slot.layout.type_id, last).unwrap();
                        drop_fn(ptr);
                    }
                }
            }
        }

        self.len -= 1;
        if row != last {
            Some(self.entity_at(row))
        } else {
            None
        }
    }
}

impl Drop for Chunk {
    fn drop(&mut self) {
        for row in 0..self.len {
            for slot in self.layout.clone() {
                if let Some(drop_fn) = slot.layout.drop_fn {
                    unsafe {
                        let ptr = self.component_ptr_mut(slot.layout.type_id, row).unwrap();
                        drop_fn(ptr);
                    }
                }
            }
        }
    }
}

/// Where an entity's row lives within an archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkLocation {
    pub chunk_index: usize,
    pub row: usize,
}

/// Groups chunks sharing one component signature.
pub struct Archetype {
    id: ArchetypeId,
    signature: Vec<ComponentTypeId>,
    components: Vec<ComponentLayout>,
    chunk_layout_template: Vec<ComponentLayout>,
    chunks: Vec<Chunk>,
    locations: BTreeMap<Entity, ChunkLocation>,
}

impl Archetype {
    fn new(id: ArchetypeId, mut components: Vec<ComponentLayout>) -> Self {
        components.sort_by_key(|c| c.type_id);
        let signature = components.iter().map(|c| c.type_id).collect();
        Self {
            id,
            signature,
            chunk_layout_template: components.clone(),
            components,
            chunks: Vec::new(),
            locations: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> ArchetypeId {
        self.id
    }

    pub fn signature(&self) -> &[ComponentTypeId] {
        &self.signature
    }

    pub fn entity_count(&self) -> usize {
        self.locations.len()
    }

    pub fn location_of(&self, entity: Entity) -> Option<ChunkLocation> {
        self.locations.get(&entity).copied()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Add a row to the first chunk with space, allocating a new chunk
    /// if none has room.
    ///
    /// # Safety
    /// `write` must initialize every declared component for the row.
    pub unsafe fn add_row(&mut self, entity: Entity, write: impl FnMut(ComponentTypeId, *mut u8)) -> ChunkLocation {
        let chunk_index = match self.chunks.iter().position(Chunk::has_space) {
            Some(i) => i,
            None => {
                let layout = compute_chunk_layout(&self.chunk_layout_template, DEFAULT_CHUNK_SIZE);
                self.chunks.push(Chunk::new(&layout));
                self.chunks.len() - 1
            }
        };
        let row = self.chunks[chunk_index].push_row(entity, write);
        let location = ChunkLocation { chunk_index, row };
        self.locations.insert(entity, location);
        location
    }

    /// Remove an entity's row via swap-with-tail, fixing up the
    /// location of whichever entity was moved into the vacated slot.
    pub fn remove_entity(&mut self, entity: Entity) -> Option<()> {
        let location = self.locations.remove(&entity)?;
        let chunk = &mut self.chunks[location.chunk_index];
        if let Some(moved_entity) = chunk.swap_remove_row(location.row) {
            self.locations.insert(moved_entity, location);
        }
        Some(())
    }
}

/// Owns every archetype, deduplicated by component signature.
pub struct Archetypes {
    archetypes: Vec<Archetype>,
    signature_map: BTreeMap<Vec<ComponentTypeId>, ArchetypeId>,
    next_id: u32,
}

impl Archetypes {
    pub fn new() -> Self {
        Self {
            archetypes: Vec::new(),
            signature_map: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Find or create the archetype for an (order-independent)
    /// component signature.
    pub fn get_or_create(&mut self, mut components: Vec<ComponentLayout>) -> ArchetypeId {
        components.sort_by_key(|c| c.type_id);
        let signature: Vec<ComponentTypeId> = components.iter().map(|c| c.type_id).collect();

        if let Some(&id) = self.signature_map.get(&signature) {
            return id;
        }

        let id = ArchetypeId(self.next_id);
        self.next_id += 1;
        self.archetypes.push(Archetype::new(id, components));
        self.signature_map.insert(signature, id);
        id
    }

    pub fn get(&self, id: ArchetypeId) -> Option<&Archetype> {
        self.archetypes.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: ArchetypeId) -> Option<&mut Archetype> {
        self.archetypes.iter_mut().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.iter()
    }
}

impl Default for Archetypes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_places_components_cache_line_aligned_after_entity_array() {
        let position = ComponentLayout {
            type_id: ComponentTypeId(0),
            size: 8,
            align: 4,
            drop_fn: None,
        };
        let layout = compute_chunk_layout(&[position], DEFAULT_CHUNK_SIZE);
        assert!(layout.capacity >= MIN_CHUNK_CAPACITY);
        assert!(layout.capacity <= MAX_CHUNK_CAPACITY);
        for slot in &layout.slots {
            assert_eq!(slot.offset % CACHE_LINE, 0);
        }
    }

    #[test]
    fn capacity_clamped_to_spec_bounds() {
        // A huge component forces the binary search toward the floor.
        let huge = ComponentLayout {
            type_id: ComponentTypeId(0),
            size: 4096,
            align: 8,
            drop_fn: None,
        };
        let layout = compute_chunk_layout(&[huge], DEFAULT_CHUNK_SIZE);
        assert_eq!(layout.capacity, MIN_CHUNK_CAPACITY);
    }

    #[test]
    fn archetypes_dedup_by_signature_regardless_of_declaration_order() {
        let mut archetypes = Archetypes::new();
        let a = ComponentLayout {
            type_id: ComponentTypeId(1),
            size: 8,
            align: 4,
            drop_fn: None,
        };
        let b = ComponentLayout {
            type_id: ComponentTypeId(2),
            size: 4,
            align: 4,
            drop_fn: None,
        };
        let id1 = archetypes.get_or_create(alloc::vec![a, b]);
        let id2 = archetypes.get_or_create(alloc::vec![b, a]);
        assert_eq!(id1, id2);
    }

    #[test]
    fn add_and_remove_row_round_trip() {
        let mut archetypes = Archetypes::new();
        let position = ComponentLayout::of::<(f32, f32)>(ComponentTypeId(0));
        let id = archetypes.get_or_create(alloc::vec![position]);
        let archetype = archetypes.get_mut(id).unwrap();

        let e1 = Entity::new(1, 1);
        let e2 = Entity::new(2, 1);
        unsafe {
            archetype.add_row(e1, |_, ptr| {
                (ptr as *mut (f32, f32)).write((1.0, 2.0));
            });
            archetype.add_row(e2, |_, ptr| {
                (ptr as *mut (f32, f32)).write((3.0, 4.0));
            });
        }
        assert_eq!(archetype.entity_count(), 2);

        archetype.remove_entity(e1);
        assert_eq!(archetype.entity_count(), 1);
        assert!(archetype.location_of(e1).is_none());
        assert!(archetype.location_of(e2).is_some());
    }
}
