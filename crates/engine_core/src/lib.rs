//! engine_core - shared primitives for the 2D engine core.
//!
//! Zero-dependency foundation the other workspace crates build on:
//! an untyped `Error`/`Result` pair for failures that don't warrant a
//! crate-local `thiserror` enum. `no_std` + `alloc` friendly so the
//! rest of the workspace can stay portable.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

pub mod error;

pub use error::*;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::error::{Error, Result};
}
