//! General-purpose game math builtins, grounded on
//! `BuiltinFunctions.cpp`'s `game` category.

use super::array::uniform;
use crate::function_registry::{FunctionRegistrar, FunctionRegistry};
use crate::value::RuntimeValue;

pub fn register(registry: &mut FunctionRegistry) {
    let mut r = FunctionRegistrar::new(registry, "game");

    r.add(
        &["random", "рандом", "случайное", "aleatorio", "aléatoire", "zufällig", "随机"],
        "uniform random number, default range [0, 1)",
        0,
        2,
        |args| {
            let min = args.first().map(RuntimeValue::as_number).unwrap_or(0.0);
            let max = args.get(1).map(RuntimeValue::as_number).unwrap_or(1.0);
            RuntimeValue::Number(uniform(min, max))
        },
    );

    r.add(
        &["distance", "дистанция", "расстояние", "distancia", "entfernung", "距离"],
        "Euclidean distance between two points",
        4,
        4,
        |args| {
            let (x1, y1, x2, y2) = (args[0].as_number(), args[1].as_number(), args[2].as_number(), args[3].as_number());
            RuntimeValue::Number(((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt())
        },
    );

    r.add(&["angle", "угол", "angulo", "winkel", "角度"], "angle in degrees between two points", 4, 4, |args| {
        let (x1, y1, x2, y2) = (args[0].as_number(), args[1].as_number(), args[2].as_number(), args[3].as_number());
        RuntimeValue::Number((y2 - y1).atan2(x2 - x1).to_degrees())
    });

    r.add(&["lerp", "лерп", "интерполяция", "interpolacion", "interpolation"], "linear interpolation, t clamped [0,1]", 3, 3, |args| {
        let (a, b, t) = (args[0].as_number(), args[1].as_number(), args[2].as_number().clamp(0.0, 1.0));
        RuntimeValue::Number(a + (b - a) * t)
    });

    r.add(&["clamp", "зажать", "ограничить", "limitar", "begrenzen", "限制"], "clamp a value into [min, max]", 3, 3, |args| {
        let (value, min, max) = (args[0].as_number(), args[1].as_number(), args[2].as_number());
        RuntimeValue::Number(value.clamp(min.min(max), max.max(min)))
    });
}
