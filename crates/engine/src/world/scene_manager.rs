use tracing::info;

use super::entity::{Entity, EntityId};
use super::scene::Scene;
use super::NotFound;

/// Owns every loaded scene and tracks which one is active. Scenes are swapped,
/// never dropped, so state survives leaving and re-entering a room.
#[derive(Debug, Clone)]
pub struct SceneManager {
    scenes: Vec<Scene>,
    active: usize,
}

impl SceneManager {
    pub fn new(scenes: Vec<Scene>, start_scene: &str) -> Result<Self, NotFound> {
        let active = scenes
            .iter()
            .position(|scene| scene.id() == start_scene)
            .ok_or_else(|| NotFound::Scene(start_scene.to_string()))?;
        Ok(Self { scenes, active })
    }

    pub fn active(&self) -> &Scene {
        &self.scenes[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Scene {
        &mut self.scenes[self.active]
    }

    pub fn active_id(&self) -> &str {
        self.active().id()
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|scene| scene.id() == id)
    }

    /// Returns true when the active scene changed.
    pub fn transition_to(&mut self, id: &str) -> Result<bool, NotFound> {
        let index = self
            .scenes
            .iter()
            .position(|scene| scene.id() == id)
            .ok_or_else(|| NotFound::Scene(id.to_string()))?;
        if index == self.active {
            return Ok(false);
        }
        let previous = self.active;
        self.active = index;
        info!(
            from = %self.scenes[previous].id(),
            to = %self.scenes[index].id(),
            "scene_switched"
        );
        Ok(true)
    }

    /// Looks an entity up in any scene. Inventory items keep living in the
    /// scene they were picked up from.
    pub fn find_entity(&self, id: EntityId) -> Option<(&Scene, &Entity)> {
        self.scenes
            .iter()
            .find_map(|scene| scene.find_entity(id).map(|entity| (scene, entity)))
    }

    /// The scene that owns `id`, wherever the player currently is.
    pub fn scene_of_mut(&mut self, id: EntityId) -> Option<&mut Scene> {
        self.scenes
            .iter_mut()
            .find(|scene| scene.find_entity(id).is_some())
    }

    pub fn find_entity_by_name(&self, name: &str) -> Option<(&Scene, &Entity)> {
        self.scenes
            .iter()
            .find_map(|scene| scene.entity_by_name(name).map(|entity| (scene, entity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_scene(id: &str) -> Scene {
        Scene::new(
            id.to_string(),
            format!("scene.{id}.title"),
            format!("scene.{id}.description"),
        )
    }

    #[test]
    fn unknown_start_scene_fails() {
        let err = SceneManager::new(vec![empty_scene("hall")], "cellar").expect_err("err");
        assert_eq!(err, NotFound::Scene("cellar".to_string()));
    }

    #[test]
    fn transition_swaps_active_scene() {
        let mut manager =
            SceneManager::new(vec![empty_scene("hall"), empty_scene("garden")], "hall")
                .expect("manager");
        assert_eq!(manager.active_id(), "hall");
        assert_eq!(manager.transition_to("garden"), Ok(true));
        assert_eq!(manager.active_id(), "garden");
        assert_eq!(manager.transition_to("garden"), Ok(false));
        assert_eq!(
            manager.transition_to("attic"),
            Err(NotFound::Scene("attic".to_string()))
        );
        assert_eq!(manager.active_id(), "garden");
        assert_eq!(manager.scenes().len(), 2);
    }
}
