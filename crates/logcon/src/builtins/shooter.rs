//! Shooter-flavored builtins, grounded on
//! `BuiltinFunctions.cpp`'s `shooter` category.

use crate::function_registry::{FunctionRegistrar, FunctionRegistry};
use crate::value::RuntimeValue;

pub fn register(registry: &mut FunctionRegistry) {
    let mut r = FunctionRegistrar::new(registry, "shooter");

    r.add(&["shoot", "выстрел", "disparar", "tirer", "schießen", "射击"], "true when ammo and fire rate both allow firing", 2, 2, |args| {
        RuntimeValue::Bool(args[0].as_number() > 0.0 && args[1].as_number() > 0.0)
    });

    r.add(&["reload", "перезарядка", "recargar", "recharger", "nachladen", "重新装填"], "returns the reloaded magazine size", 2, 2, |args| {
        RuntimeValue::Number(args[1].as_number())
    });

    r.add(&["recoil", "отдача", "retroceso", "recul", "rückstoß", "后坐力"], "recoil offset, default weapon power 10.0", 0, 1, |args| {
        let power = args.first().map(RuntimeValue::as_number).unwrap_or(10.0);
        RuntimeValue::Number(power * 0.01)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shoot_requires_both_ammo_and_fire_rate() {
        let mut registry = FunctionRegistry::new();
        register(&mut registry);
        let result = registry.call_function("shoot", &[RuntimeValue::Number(0.0), RuntimeValue::Number(1.0)]).unwrap();
        assert!(!result.as_bool());
    }

    #[test]
    fn reload_returns_max_ammo() {
        let mut registry = FunctionRegistry::new();
        register(&mut registry);
        let result = registry.call_function("reload", &[RuntimeValue::Number(0.0), RuntimeValue::Number(30.0)]).unwrap();
        assert_eq!(result.as_number(), 30.0);
    }
}
