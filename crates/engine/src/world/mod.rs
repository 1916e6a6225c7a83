mod entity;
mod geometry;
mod inventory;
mod scene;
mod scene_manager;

use thiserror::Error;

pub(crate) use entity::EntityIdAllocator;
pub use entity::{
    Door, DoorState, Entity, EntityId, EntityKind, EntityState, Key, KeyLocation,
    ScriptedRefusal, Table,
};
pub use geometry::{Rect, Vec2};
pub use inventory::{Inventory, InventoryError, InventoryWindow, DEFAULT_INVENTORY_WINDOW_SLOTS};
pub use scene::{DebugEntityInfo, RenderView, Scene};
pub use scene_manager::SceneManager;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("no entity with id {0}")]
    Entity(EntityId),
    #[error("no entity named '{0}'")]
    EntityName(String),
    #[error("no scene with id '{0}'")]
    Scene(String),
}
