//! Error kinds surfaced at the few boundaries that actually throw.
//! Everything else (stale handles, missing dependencies, runtime
//! limits) degrades to a logged warning and a default value instead
//! of propagating an `EcsError`.

use alloc::string::String;

/// Errors that actually propagate out of `engine_ecs`, as opposed to
/// the degrade-and-warn conditions everything else keeps internal.
#[derive(thiserror::Error, Debug)]
pub enum EcsError {
    #[error("pool operation failed: {0}")]
    PoolFailure(String),

    #[error("entity {0} is not a valid handle shape")]
    InvalidHandle(Entity),
}

use crate::entity::Entity;

pub type Result<T> = core::result::Result<T, EcsError>;
