//! GameObject - the legacy, script-addressable record.
//!
//! Grounded on `Core/GameObject.h`: a named record carrying the fields
//! scripts read and write directly, plus chainable lifecycle hooks.
//! `logcon::ScriptHost` is implemented directly against it so the
//! interpreter can bind a script instance without an unmanaged
//! back-pointer (`SPEC_FULL.md` A.5).

use logcon::{RuntimeValue, ScriptHost};

/// RGBA tint, `0.0..=1.0` per channel - mirrors `Core/Color.h`'s float
/// tint used by `SpriteComponent`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

type CreateHook = Box<dyn FnMut(&mut GameObject)>;
type UpdateHook = Box<dyn FnMut(&mut GameObject, f32)>;
type DestroyHook = Box<dyn FnMut(&mut GameObject)>;

/// A named, long-lived game record. Holds the
/// legacy fields LogCon scripts read/write as properties, plus the
/// three lifecycle hook chains a script binding installs into.
pub struct GameObject {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub width: f64,
    pub height: f64,
    pub layer: i32,
    pub visible: bool,
    pub alpha: f64,
    pub physics: bool,
    pub speedx: f64,
    pub speedy: f64,
    pub gravity: f64,
    pub friction: f64,
    pub image: String,
    pub color: Color,
    pub flip_x: bool,
    pub flip_y: bool,

    on_create: Vec<CreateHook>,
    on_update: Vec<UpdateHook>,
    on_destroy: Vec<DestroyHook>,
}

impl GameObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            width: 0.0,
            height: 0.0,
            layer: 0,
            visible: true,
            alpha: 1.0,
            physics: false,
            speedx: 0.0,
            speedy: 0.0,
            gravity: 0.0,
            friction: 0.0,
            image: String::new(),
            color: Color::default(),
            flip_x: false,
            flip_y: false,
            on_create: Vec::new(),
            on_update: Vec::new(),
            on_destroy: Vec::new(),
        }
    }

    /// Installs `hook` to run before any previously installed
    /// `OnCreate` hook; previously installed callbacks, if any, are
    /// chained after the new one.
    pub fn install_on_create(&mut self, hook: impl FnMut(&mut GameObject) + 'static) {
        self.on_create.insert(0, Box::new(hook));
    }

    pub fn install_on_update(&mut self, hook: impl FnMut(&mut GameObject, f32) + 'static) {
        self.on_update.insert(0, Box::new(hook));
    }

    pub fn install_on_destroy(&mut self, hook: impl FnMut(&mut GameObject) + 'static) {
        self.on_destroy.insert(0, Box::new(hook));
    }

    pub fn fire_create(&mut self) {
        let mut hooks = core::mem::take(&mut self.on_create);
        for hook in &mut hooks {
            hook(self);
        }
        self.on_create = hooks;
    }

    pub fn fire_update(&mut self, delta_time: f32) {
        let mut hooks = core::mem::take(&mut self.on_update);
        for hook in &mut hooks {
            hook(self, delta_time);
        }
        self.on_update = hooks;
    }

    pub fn fire_destroy(&mut self) {
        let mut hooks = core::mem::take(&mut self.on_destroy);
        for hook in &mut hooks {
            hook(self);
        }
        self.on_destroy = hooks;
    }
}

/// Normalized GameObject-field mapping: the same canonical
/// names `logcon::interpreter`'s `host_field_name` resolves aliases to.
impl ScriptHost for GameObject {
    fn get_field(&self, name: &str) -> RuntimeValue {
        match name {
            "x" => RuntimeValue::Number(self.x),
            "y" => RuntimeValue::Number(self.y),
            "width" => RuntimeValue::Number(self.width),
            "height" => RuntimeValue::Number(self.height),
            "angle" => RuntimeValue::Number(self.angle),
            "layer" => RuntimeValue::Number(self.layer as f64),
            "visible" => RuntimeValue::Bool(self.visible),
            "alpha" => RuntimeValue::Number(self.alpha),
            "physics" => RuntimeValue::Bool(self.physics),
            "speedx" => RuntimeValue::Number(self.speedx),
            "speedy" => RuntimeValue::Number(self.speedy),
            "gravity" => RuntimeValue::Number(self.gravity),
            "friction" => RuntimeValue::Number(self.friction),
            _ => RuntimeValue::String(name.to_string()),
        }
    }

    fn set_field(&mut self, name: &str, value: RuntimeValue) {
        match name {
            "x" => self.x = value.as_number(),
            "y" => self.y = value.as_number(),
            "width" => self.width = value.as_number(),
            "height" => self.height = value.as_number(),
            "angle" => self.angle = value.as_number(),
            "layer" => self.layer = value.as_number() as i32,
            "visible" => self.visible = value.as_bool(),
            "alpha" => self.alpha = value.as_number(),
            "physics" => self.physics = value.as_bool(),
            "speedx" => self.speedx = value.as_number(),
            "speedy" => self.speedy = value.as_number(),
            "gravity" => self.gravity = value.as_number(),
            "friction" => self.friction = value.as_number(),
            _ => log::warn!("GameObject '{}' has no field named '{name}'; write ignored", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_round_trips_through_script_host() {
        let mut go = GameObject::new("Hero");
        go.set_field("x", RuntimeValue::Number(42.0));
        assert_eq!(go.get_field("x").as_number(), 42.0);
    }

    #[test]
    fn layer_coerces_to_integer_on_write() {
        let mut go = GameObject::new("Hero");
        go.set_field("layer", RuntimeValue::Number(3.0));
        assert_eq!(go.layer, 3);
    }

    #[test]
    fn unknown_field_write_is_ignored() {
        let mut go = GameObject::new("Hero");
        go.set_field("nonexistent", RuntimeValue::Number(1.0));
        assert_eq!(go.get_field("nonexistent").as_string(), "nonexistent");
    }

    #[test]
    fn create_hooks_chain_newest_first() {
        let mut go = GameObject::new("Hero");
        let order = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));

        let order1 = order.clone();
        go.install_on_create(move |_| order1.borrow_mut().push(1));
        let order2 = order.clone();
        go.install_on_create(move |_| order2.borrow_mut().push(2));

        go.fire_create();
        assert_eq!(*order.borrow(), vec![2, 1]);
    }

    #[test]
    fn update_hooks_receive_delta_time() {
        let mut go = GameObject::new("Hero");
        let seen = std::rc::Rc::new(std::cell::RefCell::new(0.0f32));
        let seen2 = seen.clone();
        go.install_on_update(move |_, dt| *seen2.borrow_mut() = dt);
        go.fire_update(0.016);
        assert_eq!(*seen.borrow(), 0.016);
    }
}
