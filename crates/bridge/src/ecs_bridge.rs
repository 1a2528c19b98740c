//! GameObject <-> ECS bridge.
//!
//! Grounded on `Engine/ECS/GameObjectECSBridge.h`: `EnsureEntity` is
//! idempotent per `(GameObjectId, RegistryId)` pair, `Sync` mirrors the
//! legacy fields onto the default `Transform`/`Sprite` components every
//! frame, and `Remove` tears the mapping down with the entity. The
//! donor keys its mapping off a raw `GameObject*`; callers here supply
//! a stable `GameObjectId` instead; `RegistryId` plays the same role
//! as the donor's `Registry*` comparison (a scene swap invalidates a
//! stale mapping without this bridge needing to reach into a registry
//! it no longer holds a reference to).

use std::collections::HashMap;

use engine_ecs::{Entity, Registry};
use engine_math::Vector2;

use crate::components::{Sprite, Transform};
use crate::game_object::GameObject;

pub type GameObjectId = u64;
pub type RegistryId = u64;

struct MappingEntry {
    entity: Entity,
    registry_id: RegistryId,
}

/// Owns the GameObject -> Entity mapping for a scene.
#[derive(Default)]
pub struct EcsBridge {
    mapping: HashMap<GameObjectId, MappingEntry>,
}

impl EcsBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entity for `id`, creating it (with default
    /// `Transform`/`Sprite` components mirroring `obj`) if none exists
    /// yet, or if the existing mapping belongs to a different
    /// registry, or if its entity is no longer alive.
    pub fn ensure_entity(
        &mut self,
        registry_id: RegistryId,
        registry: &mut Registry,
        id: GameObjectId,
        obj: &GameObject,
    ) -> Entity {
        if let Some(entry) = self.mapping.get(&id) {
            if entry.registry_id == registry_id && registry.contains_entity(entry.entity) {
                return entry.entity;
            }
            self.mapping.remove(&id);
        }

        let entity = registry.create_entity();

        let mut transform = Transform::new(Vector2::new(obj.x as f32, obj.y as f32), obj.angle as f32);
        transform.size = Vector2::new(obj.width as f32, obj.height as f32);
        registry.add_component(entity, transform);

        let mut sprite = Sprite {
            texture_path: obj.image.clone(),
            ..Sprite::default()
        };
        sprite.tint = obj.color;
        sprite.tint.a = obj.alpha as f32;
        sprite.visible = obj.visible;
        sprite.flip_x = obj.flip_x;
        sprite.flip_y = obj.flip_y;
        sprite.layer = obj.layer;
        registry.add_component(entity, sprite);

        self.mapping.insert(id, MappingEntry { entity, registry_id });
        entity
    }

    /// Copies `obj`'s legacy fields onto its mirrored components,
    /// ensuring the entity first.
    pub fn sync(&mut self, registry_id: RegistryId, registry: &mut Registry, id: GameObjectId, obj: &GameObject) {
        let entity = self.ensure_entity(registry_id, registry, id, obj);
        if !registry.contains_entity(entity) {
            return;
        }

        if let Some(transform) = registry.get_component_mut::<Transform>(entity) {
            transform.position = Vector2::new(obj.x as f32, obj.y as f32);
            transform.rotation = obj.angle as f32;
            transform.size = Vector2::new(obj.width as f32, obj.height as f32);
        }

        if let Some(sprite) = registry.get_component_mut::<Sprite>(entity) {
            sprite.tint = obj.color;
            sprite.tint.a = obj.alpha as f32;
            sprite.visible = obj.visible;
            sprite.flip_x = obj.flip_x;
            sprite.flip_y = obj.flip_y;
            sprite.layer = obj.layer;
            if sprite.texture_path != obj.image {
                sprite.texture_path = obj.image.clone();
            }
        }
    }

    /// Destroys the mirrored entity and erases the mapping (spec
    /// §4.13's `Remove`). A no-op if `id` belongs to a different
    /// registry than `registry` or was never mapped.
    pub fn remove(&mut self, registry_id: RegistryId, registry: &mut Registry, id: GameObjectId) {
        let Some(entry) = self.mapping.remove(&id) else {
            return;
        };
        if entry.registry_id == registry_id {
            registry.destroy_entity(entry.entity);
        }
    }

    pub fn entity_of(&self, id: GameObjectId) -> Option<Entity> {
        self.mapping.get(&id).map(|e| e.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_entity_creates_default_components() {
        let mut bridge = EcsBridge::new();
        let mut registry = Registry::new();
        let mut obj = GameObject::new("Hero");
        obj.x = 10.0;
        obj.y = 20.0;
        obj.width = 32.0;
        obj.height = 48.0;

        let entity = bridge.ensure_entity(1, &mut registry, 0, &obj);
        let transform = registry.get_component::<Transform>(entity).unwrap();
        assert_eq!(transform.position, Vector2::new(10.0, 20.0));
        assert_eq!(transform.size, Vector2::new(32.0, 48.0));
        assert!(registry.get_component::<Sprite>(entity).is_some());
    }

    #[test]
    fn ensure_entity_is_idempotent() {
        let mut bridge = EcsBridge::new();
        let mut registry = Registry::new();
        let obj = GameObject::new("Hero");

        let first = bridge.ensure_entity(1, &mut registry, 0, &obj);
        let second = bridge.ensure_entity(1, &mut registry, 0, &obj);
        assert_eq!(first, second);
    }

    #[test]
    fn sync_mirrors_updated_fields() {
        let mut bridge = EcsBridge::new();
        let mut registry = Registry::new();
        let mut obj = GameObject::new("Hero");
        bridge.ensure_entity(1, &mut registry, 0, &obj);

        obj.x = 99.0;
        obj.alpha = 0.5;
        bridge.sync(1, &mut registry, 0, &obj);

        let entity = bridge.entity_of(0).unwrap();
        let transform = registry.get_component::<Transform>(entity).unwrap();
        assert_eq!(transform.position.x, 99.0);
        let sprite = registry.get_component::<Sprite>(entity).unwrap();
        assert_eq!(sprite.tint.a, 0.5);
    }

    #[test]
    fn remove_destroys_entity_and_clears_mapping() {
        let mut bridge = EcsBridge::new();
        let mut registry = Registry::new();
        let obj = GameObject::new("Hero");
        let entity = bridge.ensure_entity(1, &mut registry, 0, &obj);

        bridge.remove(1, &mut registry, 0);
        assert!(!registry.contains_entity(entity));
        assert!(bridge.entity_of(0).is_none());
    }

    #[test]
    fn different_registry_id_forces_recreation() {
        let mut bridge = EcsBridge::new();
        let mut registry = Registry::new();
        let obj = GameObject::new("Hero");

        let first = bridge.ensure_entity(1, &mut registry, 0, &obj);
        let second = bridge.ensure_entity(2, &mut registry, 0, &obj);
        assert_ne!(first, second);
        assert_eq!(bridge.entity_of(0), Some(second));
    }
}
