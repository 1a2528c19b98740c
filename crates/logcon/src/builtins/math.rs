//! Math builtins, grounded on `BuiltinFunctions.cpp`'s
//! `math` category. Every entry is registered under its English name
//! plus the Russian/Spanish/French/German/Chinese aliases the original
//! carries.

use crate::function_registry::{FunctionRegistrar, FunctionRegistry};
use crate::value::RuntimeValue;

pub fn register(registry: &mut FunctionRegistry) {
    let mut r = FunctionRegistrar::new(registry, "math");

    r.add(&["sqrt", "корень", "raiz", "racine", "wurzel", "平方根"], "square root", 1, 1, |args| {
        RuntimeValue::Number(args[0].as_number().sqrt())
    });
    r.add(&["abs", "модуль", "valor_absoluto", "valeur_absolue", "betrag", "绝对值"], "absolute value", 1, 1, |args| {
        RuntimeValue::Number(args[0].as_number().abs())
    });
    r.add(&["sin", "синус", "seno", "sinus"], "sine", 1, 1, |args| RuntimeValue::Number(args[0].as_number().sin()));
    r.add(&["cos", "косинус", "coseno", "cosinus"], "cosine", 1, 1, |args| {
        RuntimeValue::Number(args[0].as_number().cos())
    });
    r.add(&["tan", "тангенс", "tangente", "tangens"], "tangent", 1, 1, |args| {
        RuntimeValue::Number(args[0].as_number().tan())
    });
    r.add(&["floor", "пол", "suelo", "sol", "boden", "向下取整"], "round toward negative infinity", 1, 1, |args| {
        RuntimeValue::Number(args[0].as_number().floor())
    });
    r.add(&["ceil", "потолок", "techo", "plafond", "decke", "向上取整"], "round toward positive infinity", 1, 1, |args| {
        RuntimeValue::Number(args[0].as_number().ceil())
    });
    r.add(&["round", "округлить", "redondear", "arrondir", "runden", "四舍五入"], "round to nearest", 1, 1, |args| {
        RuntimeValue::Number(args[0].as_number().round())
    });
    r.add(&["min", "минимум", "minimo", "minimum"], "smallest of at least two numbers", 2, usize::MAX, |args| {
        RuntimeValue::Number(args.iter().map(RuntimeValue::as_number).fold(f64::INFINITY, f64::min))
    });
    r.add(&["max", "максимум", "maximo", "maximum"], "largest of at least two numbers", 2, usize::MAX, |args| {
        RuntimeValue::Number(args.iter().map(RuntimeValue::as_number).fold(f64::NEG_INFINITY, f64::max))
    });
    r.add(&["pow", "степень", "potencia", "puissance", "potenz", "幂"], "base raised to exponent", 2, 2, |args| {
        RuntimeValue::Number(args[0].as_number().powf(args[1].as_number()))
    });
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
    fn sqrt_by_alias() {
        let registry = registry();
        let result = registry.call_function("корень", &[RuntimeValue::Number(9.0)]).unwrap();
        assert_eq!(result.as_number(), 3.0);
    }

    #[test]
    fn min_requires_at_least_two_args() {
        let registry = registry();
        assert!(registry.call_function("min", &[RuntimeValue::Number(1.0)]).is_none());
    }

    #[test]
    fn pow_computes_exponent() {
        let registry = registry();
        let result = registry
            .call_function("pow", &[RuntimeValue::Number(2.0), RuntimeValue::Number(10.0)])
            .unwrap();
        assert_eq!(result.as_number(), 1024.0);
    }
}
