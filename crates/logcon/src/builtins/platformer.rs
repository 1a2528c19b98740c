//! Platformer-flavored builtins, grounded on
//! `BuiltinFunctions.cpp`'s `platformer` category.

use crate::function_registry::{FunctionRegistrar, FunctionRegistry};
use crate::value::RuntimeValue;

pub fn register(registry: &mut FunctionRegistry) {
    let mut r = FunctionRegistrar::new(registry, "platformer");

    r.add(&["jump", "прыжок", "saltar", "sauter", "springen", "跳跃"], "jump impulse, default 5.0", 0, 1, |args| {
        RuntimeValue::Number(args.first().map(RuntimeValue::as_number).unwrap_or(5.0))
    });

    r.add(&["gravity", "гравитация", "gravedad", "gravité", "schwerkraft", "重力"], "gravity accel, default 0.5", 0, 1, |args| {
        RuntimeValue::Number(args.first().map(RuntimeValue::as_number).unwrap_or(0.5))
    });

    r.add(
        &["isgrounded", "наземле", "земля", "ensuelo", "ausol", "amBoden", "在地面"],
        "true when y position has reached the ground level",
        2,
        2,
        |args| RuntimeValue::Bool(args[0].as_number() >= args[1].as_number()),
    );
}
