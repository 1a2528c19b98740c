//! RPG-flavored builtins, grounded on
//! `BuiltinFunctions.cpp`'s `rpg` category.

use super::array::uniform;
use crate::function_registry::{FunctionRegistrar, FunctionRegistry};
use crate::value::RuntimeValue;

pub fn register(registry: &mut FunctionRegistry) {
    let mut r = FunctionRegistrar::new(registry, "rpg");

    r.add(&["damage", "урон", "daño", "dégât", "schaden", "伤害"], "attack reduced by half of defense, floored at 0", 2, 2, |args| {
        let (attack, defense) = (args[0].as_number(), args[1].as_number());
        RuntimeValue::Number((attack - defense * 0.5).max(0.0))
    });

    r.add(&["heal", "лечение", "исцеление", "curar", "guérir", "heilen", "治疗"], "current + heal, capped at max", 3, 3, |args| {
        let (current, heal, max) = (args[0].as_number(), args[1].as_number(), args[2].as_number());
        RuntimeValue::Number((current + heal).min(max))
    });

    r.add(
        &["experience", "опыт", "experiencia", "expérience", "erfahrung", "经验"],
        "base experience scaled by level^1.5",
        2,
        2,
        |args| {
            let (base_xp, level) = (args[0].as_number(), args[1].as_number());
            RuntimeValue::Number(base_xp * level.powf(1.5))
        },
    );

    r.add(
        &["chance", "шанс", "вероятность", "probabilidad", "wahrscheinlichkeit", "概率"],
        "roll a probability clamped into [0, 1]",
        1,
        1,
        |args| RuntimeValue::Bool(uniform(0.0, 1.0) < args[0].as_number().clamp(0.0, 1.0)),
    );

    r.add(
        &["critchance", "крит", "критшанс", "critico", "critique", "kritisch", "暴击"],
        "doubles damage on a crit roll",
        2,
        2,
        |args| {
            let (base_damage, crit_rate) = (args[0].as_number(), args[1].as_number().clamp(0.0, 1.0));
            let crit = uniform(0.0, 1.0) < crit_rate;
            RuntimeValue::Number(if crit { base_damage * 2.0 } else { base_damage })
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> FunctionRegistry {
        let mut registry = FunctionRegistry::new();
        register(&mut registry);
        registry
    }

    #[test]
    fn damage_is_floored_at_zero() {
        let registry = registry();
        let result = registry.call_function("damage", &[RuntimeValue::Number(1.0), RuntimeValue::Number(100.0)]).unwrap();
        assert_eq!(result.as_number(), 0.0);
    }

    #[test]
    fn heal_caps_at_max() {
        let registry = registry();
        let result = registry
            .call_function("heal", &[RuntimeValue::Number(90.0), RuntimeValue::Number(50.0), RuntimeValue::Number(100.0)])
            .unwrap();
        assert_eq!(result.as_number(), 100.0);
    }

    #[test]
    fn experience_scales_by_level() {
        let registry = registry();
        let result = registry.call_function("experience", &[RuntimeValue::Number(10.0), RuntimeValue::Number(4.0)]).unwrap();
        assert_eq!(result.as_number(), 80.0);
    }
}
