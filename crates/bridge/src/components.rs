//! Default ECS components a `GameObject` mirrors onto.
//!
//! Grounded on `ECS/Components/Core/TransformComponent.h` and
//! `ECS/Components/Visual/SpriteComponent.h`: plain data records, no
//! behavior, installed by `EnsureEntity` and kept in sync by `Sync`.

use engine_math::Vector2;

use crate::game_object::Color;

/// Position, rotation, and size: position mirrors x/y, size mirrors
/// width/height, rotation mirrors angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector2,
    pub rotation: f32,
    pub size: Vector2,
}

impl Transform {
    pub fn new(position: Vector2, rotation: f32) -> Self {
        Self { position, rotation, size: Vector2::ONE }
    }
}

/// Visual presentation: tint mirrors color with alpha, plus
/// visibility, flip flags, layer, and texture path.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    pub texture_path: String,
    pub tint: Color,
    pub visible: bool,
    pub flip_x: bool,
    pub flip_y: bool,
    pub layer: i32,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            texture_path: String::new(),
            tint: Color::default(),
            visible: true,
            flip_x: false,
            flip_y: false,
            layer: 0,
        }
    }
}
