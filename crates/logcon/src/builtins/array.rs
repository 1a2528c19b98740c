//! Array builtins, grounded on `BuiltinFunctions.cpp`'s
//! `array` category. `sort` here is the `FunctionRegistry`-registered
//! version (a plain ascending sort by `AsNumber`); the legacy
//! `CallBuiltin` bubble sort in the interpreter's fallback path
//! produces the same observable result and isn't reimplemented
//! separately.

use crate::function_registry::{FunctionRegistrar, FunctionRegistry};
use crate::value::RuntimeValue;
use rand::seq::SliceRandom;
use rand::Rng;

/// `push` refuses to grow an array past this size.
pub const MAX_ARRAY_SIZE: usize = 1_000_000;

pub fn register(registry: &mut FunctionRegistry) {
    let mut r = FunctionRegistrar::new(registry, "array");

    r.add(&["size", "размер", "tamaño", "taille", "größe", "大小"], "element count", 1, 1, |args| {
        match &args[0] {
            RuntimeValue::Array(a) => RuntimeValue::Number(a.borrow().len() as f64),
            _ => RuntimeValue::Number(0.0),
        }
    });

    r.add(&["push", "добавить", "agregar", "ajouter", "hinzufügen", "添加"], "append an element", 2, 2, |args| {
        if let RuntimeValue::Array(a) = &args[0] {
            let mut items = a.borrow_mut();
            if items.len() >= MAX_ARRAY_SIZE {
                log::warn!("push: array already at MAX_ARRAY_SIZE ({MAX_ARRAY_SIZE}), ignoring");
                return RuntimeValue::Bool(false);
            }
            items.push(args[1].clone());
            return RuntimeValue::Bool(true);
        }
        RuntimeValue::Bool(false)
    });

    r.add(&["pop", "удалить", "eliminar", "supprimer", "entfernen", "删除"], "remove the last element", 1, 1, |args| {
        if let RuntimeValue::Array(a) = &args[0] {
            return a.borrow_mut().pop().unwrap_or(RuntimeValue::Unit);
        }
        RuntimeValue::Unit
    });

    r.add(
        &["shuffle", "перемешать", "mezclar", "mélanger", "mischen", "洗牌"],
        "Fisher-Yates shuffle in place",
        1,
        1,
        |args| {
            if let RuntimeValue::Array(a) = &args[0] {
                a.borrow_mut().shuffle(&mut rand::thread_rng());
                return RuntimeValue::Bool(true);
            }
            RuntimeValue::Bool(false)
        },
    );

    r.add(&["sort", "сортировать", "ordenar", "trier", "sortieren", "排序"], "ascending sort by numeric value", 1, 1, |args| {
        if let RuntimeValue::Array(a) = &args[0] {
            a.borrow_mut().sort_by(|x, y| x.as_number().partial_cmp(&y.as_number()).unwrap_or(std::cmp::Ordering::Equal));
            return RuntimeValue::Bool(true);
        }
        RuntimeValue::Bool(false)
    });

    r.add(&["find", "найти", "encontrar", "trouver", "finden", "查找"], "index of a value, or -1", 2, 2, |args| {
        if let RuntimeValue::Array(a) = &args[0] {
            let items = a.borrow();
            let needle = &args[1];
            let index = if let RuntimeValue::Number(n) = needle {
                items.iter().position(|v| v.as_number() == *n)
            } else {
                let needle_string = needle.as_string();
                items.iter().position(|v| v.as_string() == needle_string)
            };
            return RuntimeValue::Number(index.map(|i| i as f64).unwrap_or(-1.0));
        }
        RuntimeValue::Number(-1.0)
    });
}

/// Uniform random number in `[min, max)`, swapping bounds if `min >
/// max`.
pub fn uniform(min: f64, max: f64) -> f64 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    if (hi - lo).abs() < f64::EPSILON {
        return lo;
    }
    rand::thread_rng().gen_range(lo..hi)
}
