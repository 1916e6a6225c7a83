use crate::world::{
    Door, DoorState, Entity, EntityIdAllocator, EntityKind, EntityState, Key, KeyLocation, Rect,
    Scene, Table, Vec2,
};

use super::compiler::LoadedScript;
use super::hashing::fingerprint_script;

pub const DEFAULT_SCENE_ID: &str = "hall";

/// The built-in hall: a locked door and a wobbly table with the door's key
/// hidden underneath it. Used whenever no usable script is available.
pub fn default_script() -> LoadedScript {
    let mut ids = EntityIdAllocator::default();
    let door_id = ids.allocate();
    let table_id = ids.allocate();
    let key_id = ids.allocate();

    let mut scene = Scene::new(
        DEFAULT_SCENE_ID.to_string(),
        "scene.hall.title".to_string(),
        "scene.hall.description".to_string(),
    );

    scene.place(Entity::new(
        door_id,
        "door_001".to_string(),
        "object.door".to_string(),
        Rect::centered(Vec2::new(300.0, 200.0), EntityKind::Door.default_size()),
        EntityState::Door(Door {
            state: DoorState::Locked,
            key_required: Some(key_id),
            leads_to: None,
        }),
    ));
    scene.place(Entity::new(
        table_id,
        "table_001".to_string(),
        "object.table".to_string(),
        Rect::centered(Vec2::new(150.0, 300.0), EntityKind::Table.default_size()),
        EntityState::Table(Table {
            displaced: false,
            items_on_top: Vec::new(),
            concealed: vec![key_id],
        }),
    ));
    scene.place(
        Entity::new(
            key_id,
            "key_001".to_string(),
            "object.key".to_string(),
            Rect::centered(Vec2::new(150.0, 300.0), EntityKind::Key.default_size()),
            EntityState::Key(Key {
                location: KeyLocation::OnGround,
            }),
        )
        .with_flags(false, true),
    );

    LoadedScript {
        scenes: vec![scene],
        start_scene: DEFAULT_SCENE_ID.to_string(),
        fingerprint: fingerprint_script(""),
        is_default: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hall_hides_key_under_table() {
        let script = default_script();
        let scene = &script.scenes[0];
        let key = scene.entity_by_name("key_001").expect("key");
        let door = scene.entity_by_name("door_001").expect("door");
        let table = scene.entity_by_name("table_001").expect("table");

        assert!(!key.is_visible());
        assert_eq!(door.door().expect("door").key_required, Some(key.id()));
        assert_eq!(table.table().expect("table").concealed, vec![key.id()]);
        assert_eq!(scene.hit_test(Vec2::new(150.0, 300.0)), Some(table.id()));
    }

    #[test]
    fn default_is_deterministic() {
        let a = default_script();
        let b = default_script();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(
            a.scenes[0].entities().iter().map(Entity::id).collect::<Vec<_>>(),
            b.scenes[0].entities().iter().map(Entity::id).collect::<Vec<_>>()
        );
    }
}
