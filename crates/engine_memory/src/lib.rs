//! engine_memory - alignment helpers for cache-line-aligned chunk layout.
//!
//! The donor crate this was pulled from carries a full allocator
//! zoo (arena/pool/free-list/stack). The engine core's only remaining
//! use for a "memory" crate is computing aligned byte offsets for
//! `engine_ecs::archetype::Chunk`, so that's all that's
//! left here.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Align a value up to the given alignment.
#[inline]
pub const fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (value + align - 1) & !(align - 1)
}

/// Align a value down to the given alignment.
#[inline]
pub const fn align_down(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    value & !(align - 1)
}

/// Check if a pointer is aligned.
#[inline]
pub fn is_aligned(ptr: *const u8, align: usize) -> bool {
    (ptr as usize) & (align - 1) == 0
}

pub mod prelude {
    pub use crate::{align_down, align_up, is_aligned};
}
