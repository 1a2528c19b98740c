//! Registry - central owner of entity identity and component pools.
//!
//! Grounded on the original `Engine/ECS/Registry.h`'s API surface
//! (`CreateEntity`/`DestroyEntity`/`AddComponent`/`GetComponent`/
//! `GetAllWith`/`Clear`/`SafeClear`) and, structurally, on the donor's
//! `void_ecs/src/world.rs` `World` (type-erased per-type pool map), but
//! without `World`'s raw-pointer `WorldRef` indirection — pools are
//! owned directly behind `Box<dyn Any>` and the registry is borrowed
//! normally through `&mut self`.

use crate::component::ComponentPool;
use crate::entity::{Entity, EntityAllocator};
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::any::{Any, TypeId};

/// Marker for types storable as components. Blanket-implemented for
/// every `'static` type, so component types are distinguished at
/// compile time.
pub trait Component: 'static {}
impl<T: 'static> Component for T {}

/// Declares that `Self` requires another component to be present.
/// `AddComponent` auto-inserts `Dependency::default()` (logging a
/// warning) when the dependency is missing. Components with no
/// dependency simply don't implement this trait.
pub trait DependsOn: Component {
    type Dependency: Component + Default;
}

/// Type-erased component pool, stored behind a `Box<dyn ErasedPool>` so
/// the registry can own pools of every distinct `T` in one map keyed
/// by `TypeId` (grounded on `void_ecs::World`'s per-type storage map,
/// without its raw-pointer `WorldRef` indirection).
trait ErasedPool: 'static {
    fn remove_erased(&mut self, entity: Entity);
    fn shrink_erased(&mut self);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedPool for ComponentPool<T> {
    fn remove_erased(&mut self, entity: Entity) {
        self.remove(entity);
    }
    fn shrink_erased(&mut self) {
        self.shrink();
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn pool_of<T: Component>(
    pools: &BTreeMap<TypeId, Box<dyn ErasedPool>>,
) -> Option<&ComponentPool<T>> {
    pools
        .get(&TypeId::of::<T>())
        .and_then(|b| b.as_any().downcast_ref::<ComponentPool<T>>())
}

fn pool_of_mut<T: Component>(
    pools: &mut BTreeMap<TypeId, Box<dyn ErasedPool>>,
) -> Option<&mut ComponentPool<T>> {
    pools
        .get_mut(&TypeId::of::<T>())
        .and_then(|b| b.as_any_mut().downcast_mut::<ComponentPool<T>>())
}

fn pool_of_mut_or_create<T: Component>(
    pools: &mut BTreeMap<TypeId, Box<dyn ErasedPool>>,
) -> &mut ComponentPool<T> {
    pools
        .entry(TypeId::of::<T>())
        .or_insert_with(|| Box::new(ComponentPool::<T>::new()) as Box<dyn ErasedPool>)
        .as_any_mut()
        .downcast_mut::<ComponentPool<T>>()
        .expect("component pool type mismatch on freshly inserted entry")
}

/// Central owner of entity identity and component pools.
pub struct Registry {
    allocator: EntityAllocator,
    pools: BTreeMap<TypeId, Box<dyn ErasedPool>>,
    pending_destruction: Vec<Entity>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            pools: BTreeMap::new(),
            pending_destruction: Vec::new(),
        }
    }

    /// CreateEntity() -> Handle.
    pub fn create_entity(&mut self) -> Entity {
        self.allocator.allocate()
    }

    pub fn contains_entity(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// DestroyEntity(h): immediate removal from every known pool plus
    /// the allocator, per the Design Notes' decision to keep this
    /// synchronous (matches `Registry::DestroyEntity` in the original
    /// source). A stale or unknown handle is a no-op with a warning.
    pub fn destroy_entity(&mut self, entity: Entity) {
        if !self.allocator.is_alive(entity) {
            log::warn!("ecs: attempt to destroy invalid entity {entity}");
            return;
        }

        for pool in self.pools.values_mut() {
            pool.remove_erased(entity);
        }

        self.allocator.deallocate(entity);
    }

    /// Batch-destroy, grounded on `Registry::DestroyEntities` in the
    /// original source (SPEC_FULL.md A.6 supplement).
    pub fn destroy_entities(&mut self, entities: &[Entity]) {
        for &entity in entities {
            self.destroy_entity(entity);
        }
    }

    /// Queue an entity for destruction at the next drain point instead
    /// of destroying it immediately; used by systems that must finish
    /// an in-progress iteration before mutating the live set (spec
    /// §4.2, §4.6 "deferred-destruction drain").
    pub fn queue_destroy(&mut self, entity: Entity) {
        self.pending_destruction.push(entity);
    }

    /// Drains and applies every queued destruction. Called by
    /// `ECSContext` between systems.
    pub fn process_pending_destructions(&mut self) {
        if self.pending_destruction.is_empty() {
            return;
        }
        let queued = core::mem::take(&mut self.pending_destruction);
        self.destroy_entities(&queued);
    }

    /// AddComponent<T>(h, value): no-op with a warning on a stale
    /// handle - logged and ignored rather than propagated.
    pub fn add_component<T: Component>(&mut self, entity: Entity, value: T) {
        if !self.contains_entity(entity) {
            log::warn!("ecs: cannot add component to invalid entity {entity}");
            return;
        }
        pool_of_mut_or_create::<T>(&mut self.pools).set(entity, value);
    }

    /// Same as `add_component`, but for components declaring a
    /// dependency via `DependsOn`: inserts `T::Dependency::default()`
    /// first when missing, logging a warning.
    pub fn add_component_with_dependency<T: DependsOn>(&mut self, entity: Entity, value: T) {
        if !self.contains_entity(entity) {
            log::warn!("ecs: cannot add component to invalid entity {entity}");
            return;
        }
        if !self.has_component::<T::Dependency>(entity) {
            log::warn!(
                "ecs: entity {entity} missing dependency for component; inserting default"
            );
            pool_of_mut_or_create::<T::Dependency>(&mut self.pools)
                .set(entity, T::Dependency::default());
        }
        pool_of_mut_or_create::<T>(&mut self.pools).set(entity, value);
    }

    /// GetComponent<T>(h) -> optional reference; none if h is stale.
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.contains_entity(entity) {
            return None;
        }
        pool_of::<T>(&self.pools)?.get(entity)
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.contains_entity(entity) {
            return None;
        }
        pool_of_mut::<T>(&mut self.pools)?.get_mut(entity)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.contains_entity(entity)
            && pool_of::<T>(&self.pools).is_some_and(|p| p.contains(entity))
    }

    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        if !self.contains_entity(entity) {
            return None;
        }
        pool_of_mut::<T>(&mut self.pools)?.remove(entity)
    }

    pub fn pool<T: Component>(&self) -> Option<&ComponentPool<T>> {
        pool_of::<T>(&self.pools)
    }

    pub fn pool_mut<T: Component>(&mut self) -> Option<&mut ComponentPool<T>> {
        pool_of_mut::<T>(&mut self.pools)
    }

    /// ForEach<T>(fn): snapshot entity ids first, then iterate with a
    /// per-entry validity re-check before dispatch, so removing an
    /// entity mid-pass is safe.
    pub fn for_each<T: Component>(&mut self, mut f: impl FnMut(&mut Registry, Entity)) {
        let snapshot: Vec<Entity> = match pool_of::<T>(&self.pools) {
            Some(p) => p.entities().to_vec(),
            None => return,
        };

        for entity in snapshot {
            if self.has_component::<T>(entity) {
                f(self, entity);
            }
        }
    }

    pub fn reserve(&mut self, capacity: usize) {
        self.allocator.reserve(capacity);
    }

    /// GetEntities(): every currently-live entity, in ascending id
    /// order.
    pub fn entities(&self) -> Vec<Entity> {
        self.allocator.live_entities()
    }

    /// GetEntityCount().
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// GetComponentCount<T>(): 0 if the type has never had a pool
    /// created for it.
    pub fn component_count<T: Component>(&self) -> usize {
        pool_of::<T>(&self.pools).map(|p| p.len()).unwrap_or(0)
    }

    /// ShrinkComponentPools(): reclaims slack sparse-table/dense-array
    /// capacity across every registered pool (`ComponentPool::shrink`).
    pub fn shrink_component_pools(&mut self) {
        for pool in self.pools.values_mut() {
            pool.shrink_erased();
        }
    }

    /// Clear: drop every pool and reset the allocator.
    pub fn clear(&mut self) {
        self.pools.clear();
        self.allocator = EntityAllocator::new();
        self.pending_destruction.clear();
    }

    /// SafeClear(): `Clear` that reports failure via a bool instead of
    /// propagating.
    /// Pool drops in safe Rust can't panic on ordinary data, so this
    /// always succeeds; it exists to preserve the observable boolean
    /// contract callers rely on.
    pub fn safe_clear(&mut self) -> bool {
        self.clear();
        true
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
