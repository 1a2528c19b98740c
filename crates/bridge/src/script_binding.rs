//! Ties a parsed `logcon::Script` to live `GameObject`s.
//!
//! The original interpreter captures a raw `GameObject*` and installs
//! itself directly into the object's callback slots. Here the
//! `Interpreter` lives behind an `Rc<RefCell<_>>` shared by the hook
//! closures `bind` installs on the `GameObject`, so destroying a
//! `GameObject` automatically unregisters its interpreter instance
//! through the installed `OnDestroy` hook.

use std::cell::RefCell;
use std::rc::Rc;

use logcon::{Interpreter, InstanceId, Script};

use crate::game_object::GameObject;

/// Binds every entity in `script` to a `GameObject` of the same name,
/// looked up or created by `find_or_create`, and installs chained
/// `OnCreate`/`OnUpdate`/`OnDestroy` hooks that drive `interpreter`,
/// newest-installed chained ahead of whatever the `GameObject` already
/// carried. Fires the freshly-installed `OnCreate` chain once, since
/// binding a script to an object marks it live.
///
/// `next_instance_id` assigns each bound entity a stable `InstanceId`;
/// a typical caller derives it from an ECS `Entity`'s bit pattern.
pub fn bind_script(
    interpreter: Rc<RefCell<Interpreter>>,
    script: &Script,
    mut next_instance_id: impl FnMut(&str) -> InstanceId,
    mut find_or_create: impl FnMut(&str) -> Rc<RefCell<GameObject>>,
) {
    for entity in &script.entities {
        let id = next_instance_id(&entity.name);
        let game_object = find_or_create(&entity.name);

        {
            let mut go = game_object.borrow_mut();
            let mut interp = interpreter.borrow_mut();
            interp.instantiate(id, entity, &mut *go);
        }

        let create_interp = interpreter.clone();
        game_object.borrow_mut().install_on_create(move |go| {
            create_interp.borrow_mut().create(id, go);
        });

        let update_interp = interpreter.clone();
        game_object.borrow_mut().install_on_update(move |go, dt| {
            update_interp.borrow_mut().update(id, dt, go);
        });

        let destroy_interp = interpreter.clone();
        game_object.borrow_mut().install_on_destroy(move |go| {
            destroy_interp.borrow_mut().destroy(id, go);
        });

        // The object is live as soon as it's bound, so fire its
        // freshly-installed `OnCreate` chain (newest-first) now rather
        // than leaving it for a caller who may not know to.
        game_object.borrow_mut().fire_create();
    }
}
