//! engine_bridge - the GameObject <-> ECS bridge and the
//! script binding layer that drives a `logcon::Interpreter` against it.
//!
//! This is the only crate that depends on both `engine_ecs` and
//! `logcon`; everything below is glue, not new engine semantics.

pub mod components;
pub mod ecs_bridge;
pub mod game_object;
pub mod script_binding;

pub use components::{Sprite, Transform};
pub use ecs_bridge::{EcsBridge, GameObjectId, RegistryId};
pub use game_object::{Color, GameObject};
pub use script_binding::bind_script;
