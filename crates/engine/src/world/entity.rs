use std::fmt;

use crate::interaction::Verb;

use super::geometry::{Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub(crate) struct EntityIdAllocator {
    next: u32,
}

impl EntityIdAllocator {
    pub(crate) fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Door,
    Key,
    Table,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Door, EntityKind::Key, EntityKind::Table];

    /// Token used in scripts (`kind="Door"`).
    pub fn script_name(self) -> &'static str {
        match self {
            Self::Door => "Door",
            Self::Key => "Key",
            Self::Table => "Table",
        }
    }

    pub fn from_script_name(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.script_name() == value)
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Door => "door",
            Self::Key => "key",
            Self::Table => "table",
        }
    }

    pub fn default_size(self) -> Vec2 {
        match self {
            Self::Door => Vec2::new(64.0, 128.0),
            Self::Key => Vec2::new(32.0, 32.0),
            Self::Table => Vec2::new(96.0, 64.0),
        }
    }
}

/// Door position and lock. `Open` carries no lock, so an open locked door is
/// unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Open,
    Closed,
    Locked,
}

impl DoorState {
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn is_locked(self) -> bool {
        matches!(self, Self::Locked)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Door {
    pub state: DoorState,
    pub key_required: Option<EntityId>,
    pub leads_to: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLocation {
    OnGround,
    InInventory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub location: KeyLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub displaced: bool,
    pub items_on_top: Vec<EntityId>,
    pub concealed: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityState {
    Door(Door),
    Key(Key),
    Table(Table),
}

impl EntityState {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Door(_) => EntityKind::Door,
            Self::Key(_) => EntityKind::Key,
            Self::Table(_) => EntityKind::Table,
        }
    }

    pub fn visual_tag(&self) -> &'static str {
        match self {
            Self::Door(door) => match door.state {
                DoorState::Open => "door.open",
                DoorState::Closed => "door.closed",
                DoorState::Locked => "door.locked",
            },
            Self::Key(key) => match key.location {
                KeyLocation::OnGround => "key.on_ground",
                KeyLocation::InInventory => "key.in_inventory",
            },
            Self::Table(table) => {
                if table.displaced {
                    "table.displaced"
                } else {
                    "table.undisturbed"
                }
            }
        }
    }
}

/// Script-authored reply used instead of the generic refusal when `verb`
/// does not apply to the entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedRefusal {
    pub verb: Verb,
    pub message_key: String,
}

#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    name: String,
    label: String,
    sprite: Option<String>,
    bounds: Rect,
    visible: bool,
    interactive: bool,
    state: EntityState,
    refusals: Vec<ScriptedRefusal>,
    placement: u64,
}

impl Entity {
    pub(crate) fn new(
        id: EntityId,
        name: String,
        label: String,
        bounds: Rect,
        state: EntityState,
    ) -> Self {
        Self {
            id,
            name,
            label,
            sprite: None,
            bounds,
            visible: true,
            interactive: true,
            state,
            refusals: Vec::new(),
            placement: 0,
        }
    }

    pub(crate) fn with_sprite(mut self, sprite: Option<String>) -> Self {
        self.sprite = sprite;
        self
    }

    pub(crate) fn with_refusals(mut self, refusals: Vec<ScriptedRefusal>) -> Self {
        self.refusals = refusals;
        self
    }

    pub(crate) fn with_flags(mut self, visible: bool, interactive: bool) -> Self {
        self.visible = visible;
        self.interactive = interactive;
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Script-level identifier, unique across a loaded script.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display-name message key.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn sprite(&self) -> Option<&str> {
        self.sprite.as_deref()
    }

    pub fn kind(&self) -> EntityKind {
        self.state.kind()
    }

    pub fn refusals(&self) -> &[ScriptedRefusal] {
        &self.refusals
    }

    pub fn refusal_for(&self, verb: Verb) -> Option<&str> {
        self.refusals
            .iter()
            .find(|refusal| refusal.verb == verb)
            .map(|refusal| refusal.message_key.as_str())
    }

    pub fn position(&self) -> Vec2 {
        self.bounds.center()
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn state(&self) -> &EntityState {
        &self.state
    }

    pub fn door(&self) -> Option<&Door> {
        match &self.state {
            EntityState::Door(door) => Some(door),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&Key> {
        match &self.state {
            EntityState::Key(key) => Some(key),
            _ => None,
        }
    }

    pub fn table(&self) -> Option<&Table> {
        match &self.state {
            EntityState::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Keys that moved to the inventory stay in the scene graph but are no
    /// longer part of the world the player can click.
    pub fn is_hit_testable(&self) -> bool {
        if !self.visible || !self.interactive {
            return false;
        }
        !matches!(
            &self.state,
            EntityState::Key(Key {
                location: KeyLocation::InInventory
            })
        )
    }

    pub(crate) fn placement(&self) -> u64 {
        self.placement
    }

    pub(crate) fn set_placement(&mut self, placement: u64) {
        self.placement = placement;
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub(crate) fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub(crate) fn move_to(&mut self, position: Vec2) {
        self.bounds = self.bounds.recentered(position);
    }

    pub(crate) fn state_mut(&mut self) -> &mut EntityState {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_entity(location: KeyLocation) -> Entity {
        Entity::new(
            EntityId(1),
            "key_001".to_string(),
            "object.key".to_string(),
            Rect::centered(Vec2::new(10.0, 10.0), EntityKind::Key.default_size()),
            EntityState::Key(Key { location }),
        )
    }

    #[test]
    fn kind_round_trips_script_name() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_script_name(kind.script_name()), Some(kind));
        }
        assert_eq!(EntityKind::from_script_name("door"), None);
    }

    #[test]
    fn held_key_is_not_hit_testable_even_if_visible() {
        let on_ground = key_entity(KeyLocation::OnGround);
        assert!(on_ground.is_hit_testable());
        let held = key_entity(KeyLocation::InInventory);
        assert!(!held.is_hit_testable());
    }

    #[test]
    fn move_keeps_bounds_consistent() {
        let mut entity = key_entity(KeyLocation::OnGround);
        entity.move_to(Vec2::new(40.0, 12.0));
        assert_eq!(entity.position(), Vec2::new(40.0, 12.0));
        assert_eq!(entity.bounds().size(), EntityKind::Key.default_size());
        assert!(entity.bounds().contains(Vec2::new(55.0, 27.0)));
    }

    #[test]
    fn visual_tags_follow_state() {
        let door = EntityState::Door(Door {
            state: DoorState::Locked,
            key_required: None,
            leads_to: None,
        });
        assert_eq!(door.visual_tag(), "door.locked");
        let table = EntityState::Table(Table {
            displaced: true,
            items_on_top: Vec::new(),
            concealed: Vec::new(),
        });
        assert_eq!(table.visual_tag(), "table.displaced");
    }
}
