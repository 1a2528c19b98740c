//! A small untyped error type for conditions that don't warrant a
//! crate-local `thiserror` enum.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

/// A generic engine error: a message with no further structure.
///
/// Crates with a typed failure surface (`engine_ecs::EcsError`,
/// `logcon::CompileError`) define their own enums; this type exists for
/// the handful of spots that only need "something went wrong, here is
/// why" without a dedicated variant set.
#[derive(Debug, Clone)]
pub struct Error(Box<str>);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error(s.into())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error(s.into_boxed_str())
    }
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn error_display_round_trips_message() {
        let e: Error = "pool allocation failed".into();
        assert_eq!(e.to_string(), "pool allocation failed");
    }
}
