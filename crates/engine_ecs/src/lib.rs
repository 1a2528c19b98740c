//! engine_ecs - Entity-Component-System runtime.
//!
//! Sparse-set component pools as the primary storage, an optional
//! cache-line-aligned archetype/chunk layout for hot iteration paths,
//! SIMD-eligible batch kernels over `Vector2` spans, and a priority-
//! ordered system scheduler. Carries no knowledge of scripting; the
//! `logcon`/`engine_bridge` crates sit on top.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod archetype;
pub mod component;
pub mod entity;
pub mod error;
pub mod registry;
pub mod system;
pub mod vector_ops;

pub use archetype::{Archetype, ArchetypeId, Archetypes, Chunk, ChunkLocation, ComponentLayout};
pub use component::{ComponentPool, ComponentTypeId, ComponentTypeRegistry};
pub use entity::{Entity, EntityAllocator};
pub use error::{EcsError, Result};
pub use registry::{Component, DependsOn, Registry};
pub use system::{CoreSystem, ECSContext, System, DEFAULT_BATCH_SIZE, PRIORITY_MAX, PRIORITY_MIN};

/// Commonly imported items.
pub mod prelude {
    pub use crate::component::{ComponentPool, ComponentTypeId};
    pub use crate::entity::{Entity, EntityAllocator};
    pub use crate::error::{EcsError, Result};
    pub use crate::registry::{Component, DependsOn, Registry};
    pub use crate::system::{CoreSystem, ECSContext, System};
    pub use crate::vector_ops::{apply_gravity, scale_vectors, update_positions};
}
