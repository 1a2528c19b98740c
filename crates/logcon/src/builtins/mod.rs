//! Builtin function categories, grounded on
//! `BuiltinFunctions.cpp`'s `RegisterBuiltinFunctions`.

pub mod array;
pub mod game;
pub mod math;
pub mod platformer;
pub mod rpg;
pub mod shooter;
pub mod strings;

use crate::function_registry::FunctionRegistry;

/// Registers every category into `registry`. Called once by
/// `ScriptCompiler::compile_script`'s idempotent init step.
pub fn register_builtin_functions(registry: &mut FunctionRegistry) {
    math::register(registry);
    strings::register(registry);
    array::register(registry);
    game::register(registry);
    rpg::register(registry);
    platformer::register(registry);
    shooter::register(registry);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_registers_at_least_one_function() {
        let mut registry = FunctionRegistry::new();
        register_builtin_functions(&mut registry);
        for category in ["math", "string", "array", "game", "rpg", "platformer", "shooter"] {
            assert!(
                registry.functions_by_category(category).next().is_some(),
                "category {category} registered nothing"
            );
        }
    }
}
