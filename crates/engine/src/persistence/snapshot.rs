use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::world::{
    DoorState, EntityId, EntityKind, EntityState, Inventory, KeyLocation, SceneManager, Vec2,
};

use super::atomic_io::write_text_atomic;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("read snapshot '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("write snapshot '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("encode snapshot json: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{0}")]
    Parse(String),
    #[error("{0}")]
    Validation(String),
}

type PersistenceResult<T> = Result<T, PersistenceError>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedVec2 {
    pub x: f32,
    pub y: f32,
}

impl SavedVec2 {
    fn from_vec2(value: Vec2) -> Self {
        Self {
            x: value.x,
            y: value.y,
        }
    }

    fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavedDoorState {
    Open,
    Closed,
    Locked,
}

impl SavedDoorState {
    fn from_runtime(state: DoorState) -> Self {
        match state {
            DoorState::Open => Self::Open,
            DoorState::Closed => Self::Closed,
            DoorState::Locked => Self::Locked,
        }
    }

    fn to_runtime(self) -> DoorState {
        match self {
            Self::Open => DoorState::Open,
            Self::Closed => DoorState::Closed,
            Self::Locked => DoorState::Locked,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SavedEntityState {
    Door { door: SavedDoorState },
    Key { in_inventory: bool },
    Table { displaced: bool },
}

impl SavedEntityState {
    fn kind(self) -> EntityKind {
        match self {
            Self::Door { .. } => EntityKind::Door,
            Self::Key { .. } => EntityKind::Key,
            Self::Table { .. } => EntityKind::Table,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedEntity {
    /// Script id of the entity.
    pub name: String,
    pub position: SavedVec2,
    pub visible: bool,
    pub interactive: bool,
    pub placement: u64,
    pub state: SavedEntityState,
}

/// Mutable game state on top of a loaded script. Static data (labels,
/// sizes, key requirements, exits) is not saved; it comes from the script
/// the fingerprint names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub snapshot_version: u32,
    pub script_fingerprint: String,
    pub active_scene: String,
    pub inventory: Vec<String>,
    #[serde(default)]
    pub inventory_scroll: usize,
    pub entities: Vec<SavedEntity>,
}

impl GameSnapshot {
    pub fn capture(scenes: &SceneManager, inventory: &Inventory, script_fingerprint: &str) -> Self {
        let entities = scenes
            .scenes()
            .iter()
            .flat_map(|scene| scene.entities())
            .map(|entity| SavedEntity {
                name: entity.name().to_string(),
                position: SavedVec2::from_vec2(entity.position()),
                visible: entity.is_visible(),
                interactive: entity.is_interactive(),
                placement: entity.placement(),
                state: match entity.state() {
                    EntityState::Door(door) => SavedEntityState::Door {
                        door: SavedDoorState::from_runtime(door.state),
                    },
                    EntityState::Key(key) => SavedEntityState::Key {
                        in_inventory: key.location == KeyLocation::InInventory,
                    },
                    EntityState::Table(table) => SavedEntityState::Table {
                        displaced: table.displaced,
                    },
                },
            })
            .collect();

        let inventory_names = inventory
            .items()
            .iter()
            .filter_map(|id| scenes.find_entity(*id))
            .map(|(_, entity)| entity.name().to_string())
            .collect();

        Self {
            snapshot_version: SNAPSHOT_VERSION,
            script_fingerprint: script_fingerprint.to_string(),
            active_scene: scenes.active_id().to_string(),
            inventory: inventory_names,
            inventory_scroll: inventory.scroll_offset(),
            entities,
        }
    }

    /// Validates the snapshot against the running script and applies it.
    /// Nothing is modified unless every check passes.
    pub fn restore(
        &self,
        scenes: &mut SceneManager,
        inventory: &mut Inventory,
        script_fingerprint: &str,
    ) -> PersistenceResult<()> {
        let resolved = self.validate(scenes, script_fingerprint)?;

        let mut next_scenes = scenes.clone();
        for (index, saved) in self.entities.iter().enumerate() {
            let id = resolved.entity_ids[index];
            let scene = next_scenes
                .scene_of_mut(id)
                .ok_or_else(|| validation_err(&format!("entities[{index}].name"), "entity vanished"))?;
            scene
                .restore_placement(id, saved.placement)
                .map_err(|error| validation_err(&format!("entities[{index}]"), error.to_string()))?;
            let Some(entity) = scene.find_entity_mut(id) else {
                return Err(validation_err(&format!("entities[{index}].name"), "entity vanished"));
            };
            entity.move_to(saved.position.to_vec2());
            entity.set_visible(saved.visible);
            entity.set_interactive(saved.interactive);
            match (entity.state_mut(), saved.state) {
                (EntityState::Door(door), SavedEntityState::Door { door: state }) => {
                    door.state = state.to_runtime();
                }
                (EntityState::Key(key), SavedEntityState::Key { in_inventory }) => {
                    key.location = if in_inventory {
                        KeyLocation::InInventory
                    } else {
                        KeyLocation::OnGround
                    };
                }
                (EntityState::Table(table), SavedEntityState::Table { displaced }) => {
                    table.displaced = displaced;
                }
                _ => {
                    return Err(validation_err(
                        &format!("entities[{index}].state.kind"),
                        "kind changed during restore",
                    ))
                }
            }
        }
        next_scenes
            .transition_to(&self.active_scene)
            .map_err(|error| validation_err("active_scene", error.to_string()))?;

        let mut next_inventory = inventory.clone();
        next_inventory
            .restore(resolved.inventory_ids, self.inventory_scroll)
            .map_err(|error| validation_err("inventory", error.to_string()))?;

        *scenes = next_scenes;
        *inventory = next_inventory;
        info!(
            active_scene = %self.active_scene,
            entity_count = self.entities.len(),
            inventory_count = self.inventory.len(),
            "snapshot_restored"
        );
        Ok(())
    }

    fn validate(&self, scenes: &SceneManager, script_fingerprint: &str) -> PersistenceResult<Resolved> {
        if self.snapshot_version != SNAPSHOT_VERSION {
            return Err(expected_actual(
                "snapshot_version",
                SNAPSHOT_VERSION,
                self.snapshot_version,
            ));
        }
        if self.script_fingerprint != script_fingerprint {
            return Err(validation_err(
                "script_fingerprint",
                "snapshot was made with a different script",
            ));
        }
        if scenes.scene(&self.active_scene).is_none() {
            return Err(validation_err(
                "active_scene",
                format!("unknown scene '{}'", self.active_scene),
            ));
        }

        let total_entities = scenes
            .scenes()
            .iter()
            .map(|scene| scene.entity_count())
            .sum::<usize>();
        if self.entities.len() != total_entities {
            return Err(expected_actual(
                "entities",
                format!("{total_entities} entries"),
                self.entities.len(),
            ));
        }

        let mut first_seen = HashMap::<&str, usize>::with_capacity(self.entities.len());
        let mut entity_ids = Vec::with_capacity(self.entities.len());
        let mut held_keys = HashMap::<&str, bool>::new();
        for (index, saved) in self.entities.iter().enumerate() {
            let name_path = format!("entities[{index}].name");
            if let Some(first) = first_seen.insert(saved.name.as_str(), index) {
                return Err(validation_err(
                    &name_path,
                    format!(
                        "duplicate entity '{}' (first seen at entities[{first}].name)",
                        saved.name
                    ),
                ));
            }
            let Some((_, entity)) = scenes.find_entity_by_name(&saved.name) else {
                return Err(validation_err(
                    &name_path,
                    format!("unknown entity '{}'", saved.name),
                ));
            };
            if entity.kind() != saved.state.kind() {
                return Err(expected_actual(
                    &format!("entities[{index}].state.kind"),
                    entity.kind().as_token(),
                    saved.state.kind().as_token(),
                ));
            }
            if !saved.position.to_vec2().is_finite() {
                return Err(expected_actual(
                    &format!("entities[{index}].position"),
                    "finite numbers",
                    format!("({}, {})", saved.position.x, saved.position.y),
                ));
            }
            if let SavedEntityState::Key { in_inventory } = saved.state {
                if in_inventory && saved.visible {
                    return Err(validation_err(
                        &format!("entities[{index}].visible"),
                        "a held key cannot be visible in the scene",
                    ));
                }
                held_keys.insert(saved.name.as_str(), in_inventory);
            }
            entity_ids.push(entity.id());
        }

        let mut inventory_ids = Vec::<EntityId>::with_capacity(self.inventory.len());
        for (index, name) in self.inventory.iter().enumerate() {
            let path = format!("inventory[{index}]");
            match held_keys.get(name.as_str()) {
                Some(true) => {}
                Some(false) => {
                    return Err(validation_err(
                        &path,
                        format!("'{name}' is listed but its key state is not held"),
                    ))
                }
                None => {
                    return Err(validation_err(
                        &path,
                        format!("'{name}' is not a key in this script"),
                    ))
                }
            }
            let Some(&entity_index) = first_seen.get(name.as_str()) else {
                return Err(validation_err(&path, format!("unknown entity '{name}'")));
            };
            let id = entity_ids[entity_index];
            if inventory_ids.contains(&id) {
                return Err(validation_err(&path, format!("duplicate inventory entry '{name}'")));
            }
            inventory_ids.push(id);
        }
        let held_count = held_keys.values().filter(|held| **held).count();
        if held_count != inventory_ids.len() {
            return Err(expected_actual(
                "inventory",
                format!("{held_count} held keys"),
                inventory_ids.len(),
            ));
        }

        Ok(Resolved {
            entity_ids,
            inventory_ids,
        })
    }
}

struct Resolved {
    entity_ids: Vec<EntityId>,
    inventory_ids: Vec<EntityId>,
}

pub fn save_snapshot(path: &Path, snapshot: &GameSnapshot) -> PersistenceResult<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    write_text_atomic(path, &json).map_err(|source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "snapshot_saved");
    Ok(())
}

pub fn load_snapshot(path: &Path) -> PersistenceResult<GameSnapshot> {
    let raw = fs::read_to_string(path).map_err(|source| PersistenceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_snapshot_json(&raw)
}

pub fn parse_snapshot_json(raw: &str) -> PersistenceResult<GameSnapshot> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, GameSnapshot>(&mut deserializer) {
        Ok(snapshot) => Ok(snapshot),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(PersistenceError::Parse(format!("parse snapshot json: {source}")))
            } else {
                Err(PersistenceError::Parse(format!(
                    "parse snapshot json at {path}: {source}"
                )))
            }
        }
    }
}

fn validation_err(path: &str, message: impl Into<String>) -> PersistenceError {
    PersistenceError::Validation(format!("validation failed at {path}: {}", message.into()))
}

fn expected_actual(path: &str, expected: impl Display, actual: impl Display) -> PersistenceError {
    validation_err(path, format!("expected {expected}, got {actual}"))
}
