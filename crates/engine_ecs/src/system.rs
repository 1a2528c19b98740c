//! System - priority-ordered per-frame processors.
//!
//! Keeps the donor's shape (a `System` trait plus a container that
//! runs systems in order each frame) but replaces the donor's stage/
//! resource-conflict scheduler with a simpler priority-sorted list and
//! the `CoreSystem` gather/batch template grounded on
//! `Registry::GetAllWith` + `ForEach`.

use crate::component::ComponentPool;
use crate::entity::Entity;
use crate::registry::{Component, Registry};
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

/// Priority is clamped to this range on every write.
pub const PRIORITY_MIN: i32 = -10_000;
pub const PRIORITY_MAX: i32 = 10_000;
const DEFAULT_PRIORITY: i32 = 100;

fn clamp_priority(priority: i32) -> i32 {
    priority.clamp(PRIORITY_MIN, PRIORITY_MAX)
}

/// Every system carries an active flag, a clamped priority, and a
/// debug name. Grounded on `Engine/ECS/System.h`'s `ISystem`, minus its
/// `m_Active`/`m_Priority` base-class fields - a Rust trait has no
/// storage of its own, so `set_active`/`set_priority` default to
/// no-ops and a system that wants real runtime toggling overrides the
/// getter and setter together against a field of its own.
pub trait System: 'static {
    /// Whether the system currently runs (default true).
    fn active(&self) -> bool {
        true
    }

    /// Priority; lower values run first. Clamped to
    /// `[PRIORITY_MIN, PRIORITY_MAX]` by `ECSContext::add_system`.
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Debug name, defaulting to the implementing type's name.
    fn name(&self) -> &str;

    fn update(&mut self, registry: &mut Registry, delta_time: f32);

    fn fixed_update(&mut self, registry: &mut Registry, fixed_delta_time: f32) {
        self.update(registry, fixed_delta_time);
    }

    /// Runs once, when the system is added to an `ECSContext`.
    fn init(&mut self, _registry: &mut Registry) {}

    /// Runs once, when the owning `ECSContext` shuts down.
    fn shutdown(&mut self, _registry: &mut Registry) {}

    /// Toggles whether the system runs. See the trait's doc comment:
    /// only takes effect if `active()` is overridden to match.
    fn set_active(&mut self, _active: bool) {}

    /// Sets this system's priority; `ECSContext::resort_systems` must
    /// be called afterwards to re-sort the execution order. Only takes
    /// effect if `priority()` is overridden to match.
    fn set_priority(&mut self, _priority: i32) {}

    fn as_any(&self) -> &dyn core::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn core::any::Any {
        self
    }
}

/// Default batch size for `CoreSystem`'s batch phase.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Filter + batch template: gather every entity carrying component
/// `F` (the "first filter type"), then drive a per-batch hook over
/// the matches in slices of `batch_size`.
///
/// A `CoreSystem<Components…>` over an arbitrary component list would
/// need variadic generics; Rust lacks that directly, so callers supply
/// their own `requires(&Registry, Entity) -> bool` predicate for any
/// additional filter types beyond `F`, and the gather step still
/// requires every remaining type to be present.
pub struct CoreSystem<F> {
    name: String,
    active: bool,
    priority: i32,
    batch_size: usize,
    buffer: Vec<Entity>,
    _filter: core::marker::PhantomData<fn(&F)>,
}

impl<F: Component> CoreSystem<F> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            priority: DEFAULT_PRIORITY,
            batch_size: DEFAULT_BATCH_SIZE,
            buffer: Vec::new(),
            _filter: core::marker::PhantomData,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = clamp_priority(priority);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Gather phase: snapshot entities carrying `F`, filtered by
    /// `requires`. Reuses `self.buffer` across calls.
    pub fn gather(&mut self, registry: &Registry, requires: impl Fn(&Registry, Entity) -> bool) {
        self.buffer.clear();
        if let Some(pool) = registry.pool::<F>() {
            self.buffer
                .extend(pool.entities().iter().copied().filter(|&e| requires(registry, e)));
        }
    }

    /// Batch phase: walk the gathered buffer in `batch_size` slices,
    /// invoking `per_entity` for each matching entity. `per_batch`
    /// defaults to per-entity dispatch.
    pub fn dispatch(&self, registry: &mut Registry, mut per_entity: impl FnMut(&mut Registry, Entity)) {
        for batch in self.buffer.chunks(self.batch_size) {
            for &entity in batch {
                per_entity(registry, entity);
            }
        }
    }

    pub fn matches(&self) -> &[Entity] {
        &self.buffer
    }
}

/// Owns a registry and a priority-sorted vector of systems (spec
/// §4.6). `Update`/`FixedUpdate` walk systems in non-decreasing
/// priority, skip inactive systems, and drain deferred destructions
/// between phases.
pub struct ECSContext {
    registry: Registry,
    systems: Vec<(i32, Box<dyn System>)>,
}

impl ECSContext {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            systems: Vec::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Priority-sorted insert; stable among equal priorities. Runs
    /// `System::init` once, immediately, matching `ECSContext::AddSystem`
    /// in the original source.
    pub fn add_system(&mut self, mut system: Box<dyn System>) {
        system.init(&mut self.registry);
        let priority = clamp_priority(system.priority());
        let pos = self
            .systems
            .partition_point(|(p, _)| *p <= priority);
        self.systems.insert(pos, (priority, system));
    }

    /// Positional insert, bypassing priority ordering. Still runs
    /// `System::init` immediately.
    pub fn add_system_at(&mut self, index: usize, mut system: Box<dyn System>) {
        system.init(&mut self.registry);
        let priority = clamp_priority(system.priority());
        let index = index.min(self.systems.len());
        self.systems.insert(index, (priority, system));
    }

    /// GetSystem<T>(): the first boxed system of type `T`, if any.
    pub fn get_system<T: System>(&self) -> Option<&T> {
        self.systems.iter().find_map(|(_, s)| s.as_any().downcast_ref::<T>())
    }

    /// Mutable counterpart of `get_system`, needed to actually call
    /// `set_active`/`set_priority` on a system owned by this context.
    pub fn get_system_mut<T: System>(&mut self) -> Option<&mut T> {
        self.systems.iter_mut().find_map(|(_, s)| s.as_any_mut().downcast_mut::<T>())
    }

    /// ResortSystems(): re-reads every system's (possibly just-changed)
    /// priority and re-sorts, stably among equal priorities. Call this
    /// after `set_priority`.
    pub fn resort_systems(&mut self) {
        for (priority, system) in self.systems.iter_mut() {
            *priority = clamp_priority(system.priority());
        }
        self.systems.sort_by_key(|(priority, _)| *priority);
    }

    pub fn update(&mut self, delta_time: f32) {
        for (_, system) in self.systems.iter_mut() {
            if system.active() {
                system.update(&mut self.registry, delta_time);
            }
            self.registry.process_pending_destructions();
        }
    }

    pub fn fixed_update(&mut self, fixed_delta_time: f32) {
        for (_, system) in self.systems.iter_mut() {
            if system.active() {
                system.fixed_update(&mut self.registry, fixed_delta_time);
            }
            self.registry.process_pending_destructions();
        }
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Shutdown(): runs every system's `shutdown` in execution order,
    /// drops them all, then clears the registry. Matches
    /// `ECSContext::Shutdown` in the original source.
    pub fn shutdown(&mut self) {
        for (_, system) in self.systems.iter_mut() {
            system.shutdown(&mut self.registry);
        }
        self.systems.clear();
        self.registry.clear();
    }
}

impl Default for ECSContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingSystem {
        name: &'static str,
        priority: i32,
        log: alloc::rc::Rc<core::cell::RefCell<Vec<&'static str>>>,
    }

    impl System for RecordingSystem {
        fn name(&self) -> &str {
            self.name
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn update(&mut self, _registry: &mut Registry, _delta_time: f32) {
            self.log.borrow_mut().push(self.name);
        }
    }

    #[test]
    fn systems_run_in_priority_order() {
        let log = alloc::rc::Rc::new(core::cell::RefCell::new(Vec::new()));
        let mut ctx = ECSContext::new();
        ctx.add_system(Box::new(RecordingSystem { name: "b", priority: 50, log: log.clone() }));
        ctx.add_system(Box::new(RecordingSystem { name: "a", priority: -10, log: log.clone() }));
        ctx.add_system(Box::new(RecordingSystem { name: "c", priority: 200, log: log.clone() }));

        ctx.update(0.016);
        assert_eq!(*log.borrow(), alloc::vec!["a", "b", "c"]);
    }

    #[test]
    fn priority_clamped_on_add() {
        struct Extreme;
        impl System for Extreme {
            fn name(&self) -> &str {
                "extreme"
            }
            fn priority(&self) -> i32 {
                999_999
            }
            fn update(&mut self, _r: &mut Registry, _dt: f32) {}
        }

        let mut ctx = ECSContext::new();
        ctx.add_system(Box::new(Extreme));
        assert_eq!(ctx.systems[0].0, PRIORITY_MAX);
    }

    #[test]
    fn inactive_system_is_skipped() {
        struct Toggle(bool, alloc::rc::Rc<core::cell::RefCell<u32>>);
        impl System for Toggle {
            fn name(&self) -> &str {
                "toggle"
            }
            fn active(&self) -> bool {
                self.0
            }
            fn update(&mut self, _r: &mut Registry, _dt: f32) {
                *self.1.borrow_mut() += 1;
            }
        }

        let count = alloc::rc::Rc::new(core::cell::RefCell::new(0));
        let mut ctx = ECSContext::new();
        ctx.add_system(Box::new(Toggle(false, count.clone())));
        ctx.update(0.0);
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn core_system_gathers_and_dispatches_in_batches() {
        let mut registry = Registry::new();
        for i in 0..10 {
            let e = registry.create_entity();
            registry.add_component(e, i as i32);
        }

        let mut core: CoreSystem<i32> = CoreSystem::new("counter").with_batch_size(4);
        core.gather(&registry, |_, _| true);
        assert_eq!(core.matches().len(), 10);

        let mut touched = 0;
        core.dispatch(&mut registry, |_, _| touched += 1);
        assert_eq!(touched, 10);
    }

    struct MutableSystem {
        active: bool,
        priority: i32,
        inits: alloc::rc::Rc<core::cell::RefCell<u32>>,
        shutdowns: alloc::rc::Rc<core::cell::RefCell<u32>>,
    }

    impl System for MutableSystem {
        fn name(&self) -> &str {
            "mutable"
        }
        fn active(&self) -> bool {
            self.active
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn set_active(&mut self, active: bool) {
            self.active = active;
        }
        fn set_priority(&mut self, priority: i32) {
            self.priority = clamp_priority(priority);
        }
        fn init(&mut self, _registry: &mut Registry) {
            *self.inits.borrow_mut() += 1;
        }
        fn shutdown(&mut self, _registry: &mut Registry) {
            *self.shutdowns.borrow_mut() += 1;
        }
        fn update(&mut self, _registry: &mut Registry, _delta_time: f32) {}
    }

    #[test]
    fn add_system_runs_init_immediately() {
        let inits = alloc::rc::Rc::new(core::cell::RefCell::new(0));
        let shutdowns = alloc::rc::Rc::new(core::cell::RefCell::new(0));
        let mut ctx = ECSContext::new();
        ctx.add_system(Box::new(MutableSystem {
            active: true,
            priority: 100,
            inits: inits.clone(),
            shutdowns: shutdowns.clone(),
        }));
        assert_eq!(*inits.borrow(), 1);
    }

    #[test]
    fn get_system_mut_toggles_active_and_priority_then_resort_reorders() {
        let log = alloc::rc::Rc::new(core::cell::RefCell::new(Vec::new()));
        let mut ctx = ECSContext::new();
        ctx.add_system(Box::new(RecordingSystem { name: "a", priority: -10, log: log.clone() }));
        ctx.add_system(Box::new(MutableSystem {
            active: true,
            priority: 500,
            inits: alloc::rc::Rc::new(core::cell::RefCell::new(0)),
            shutdowns: alloc::rc::Rc::new(core::cell::RefCell::new(0)),
        }));

        let mutable = ctx.get_system_mut::<MutableSystem>().expect("system present");
        mutable.set_active(false);
        mutable.set_priority(-20);
        ctx.resort_systems();

        // The now-deprioritized system sorts ahead of "a", but stays
        // inactive, so it never records itself in `log`.
        assert_eq!(ctx.systems[0].1.priority(), -20);
        ctx.update(0.0);
        assert_eq!(*log.borrow(), alloc::vec!["a"]);
    }

    #[test]
    fn shutdown_runs_every_system_and_clears_registry() {
        let inits = alloc::rc::Rc::new(core::cell::RefCell::new(0));
        let shutdowns = alloc::rc::Rc::new(core::cell::RefCell::new(0));
        let mut ctx = ECSContext::new();
        ctx.add_system(Box::new(MutableSystem {
            active: true,
            priority: 100,
            inits: inits.clone(),
            shutdowns: shutdowns.clone(),
        }));
        ctx.registry_mut().create_entity();

        ctx.shutdown();
        assert_eq!(*shutdowns.borrow(), 1);
        assert_eq!(ctx.system_count(), 0);
        assert_eq!(ctx.registry().entity_count(), 0);
    }
}
