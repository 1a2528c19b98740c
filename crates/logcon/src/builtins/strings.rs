//! String builtins, grounded on `BuiltinFunctions.cpp`'s
//! `string` category.

use crate::function_registry::{FunctionRegistrar, FunctionRegistry};
use crate::value::RuntimeValue;

pub fn register(registry: &mut FunctionRegistry) {
    let mut r = FunctionRegistrar::new(registry, "string");

    r.add(&["length", "длина", "longitud", "longueur", "länge", "长度"], "character count", 1, 1, |args| {
        RuntimeValue::Number(args[0].as_string().chars().count() as f64)
    });
    r.add(&["upper", "заглавные", "mayusculas", "majuscules", "großbuchstaben", "大写"], "uppercase", 1, 1, |args| {
        RuntimeValue::String(args[0].as_string().to_uppercase())
    });
    r.add(&["lower", "строчные", "minusculas", "minuscules", "kleinbuchstaben", "小写"], "lowercase", 1, 1, |args| {
        RuntimeValue::String(args[0].as_string().to_lowercase())
    });
    r.add(
        &["contains", "содержит", "contiene", "contient", "enthält", "包含"],
        "substring containment test",
        2,
        2,
        |args| RuntimeValue::Bool(args[0].as_string().contains(&args[1].as_string())),
    );
    r.add(
        &["substring", "подстрока", "subcadena", "souschaîne", "teilzeichenkette", "子串"],
        "bounds-checked substring",
        2,
        3,
        |args| {
            let source: Vec<char> = args[0].as_string().chars().collect();
            let start = args[1].as_number().max(0.0) as usize;
            if start >= source.len() {
                return RuntimeValue::String(String::new());
            }
            let length = args.get(2).map(|v| v.as_number() as usize).unwrap_or(source.len() - start);
            let end = (start + length).min(source.len());
            RuntimeValue::String(source[start..end].iter().collect())
        },
    );
}
