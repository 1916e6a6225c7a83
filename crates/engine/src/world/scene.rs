use super::entity::{Entity, EntityId, EntityKind};
use super::geometry::{Rect, Vec2};
use super::NotFound;

/// Render-relevant projection of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderView<'a> {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: Vec2,
    pub bounds: Rect,
    pub visual_state: &'static str,
    pub sprite: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DebugEntityInfo {
    pub id: EntityId,
    pub name: String,
    pub bounds: Rect,
}

#[derive(Debug, Clone)]
pub struct Scene {
    id: String,
    title: String,
    description: String,
    entities: Vec<Entity>,
    next_placement: u64,
}

impl Scene {
    pub(crate) fn new(id: String, title: String, description: String) -> Self {
        Self {
            id,
            title,
            description,
            entities: Vec::new(),
            next_placement: 0,
        }
    }

    pub(crate) fn place(&mut self, mut entity: Entity) {
        entity.set_placement(self.allocate_placement());
        self.entities.push(entity);
    }

    fn allocate_placement(&mut self) -> u64 {
        let placement = self.next_placement;
        self.next_placement = self.next_placement.saturating_add(1);
        placement
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Title message key.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Description message key.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    pub(crate) fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id() == id)
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.name() == name)
    }

    /// Returns the topmost visible, interactive entity under `point`.
    ///
    /// Topmost means the highest placement order: entities placed or revealed
    /// later win over earlier ones when boxes overlap.
    pub fn hit_test(&self, point: Vec2) -> Option<EntityId> {
        let mut best: Option<(u64, EntityId)> = None;

        for entity in &self.entities {
            if !entity.is_hit_testable() {
                continue;
            }
            if !entity.bounds().contains(point) {
                continue;
            }

            match best {
                Some((order, _)) if order >= entity.placement() => {}
                _ => best = Some((entity.placement(), entity.id())),
            }
        }

        best.map(|(_, id)| id)
    }

    pub fn move_entity(&mut self, id: EntityId, position: Vec2) -> Result<(), NotFound> {
        let entity = self.find_entity_mut(id).ok_or(NotFound::Entity(id))?;
        entity.move_to(position);
        Ok(())
    }

    /// Makes an entity visible and moves it to the top of the hit-test order.
    /// Returns false when it was already visible.
    pub(crate) fn reveal(&mut self, id: EntityId) -> Result<bool, NotFound> {
        let placement = self.next_placement;
        let entity = self.find_entity_mut(id).ok_or(NotFound::Entity(id))?;
        if entity.is_visible() {
            return Ok(false);
        }
        entity.set_visible(true);
        entity.set_placement(placement);
        self.next_placement = self.next_placement.saturating_add(1);
        Ok(true)
    }

    /// Reapplies a saved hit-test order. Later placements keep counting from
    /// above the highest restored value.
    pub(crate) fn restore_placement(&mut self, id: EntityId, placement: u64) -> Result<(), NotFound> {
        let entity = self.find_entity_mut(id).ok_or(NotFound::Entity(id))?;
        entity.set_placement(placement);
        self.next_placement = self.next_placement.max(placement.saturating_add(1));
        Ok(())
    }

    pub fn render_views(&self) -> Vec<RenderView<'_>> {
        let mut views = self
            .entities
            .iter()
            .filter(|entity| entity.is_hit_testable())
            .collect::<Vec<_>>();
        // Back to front.
        views.sort_by_key(|entity| entity.placement());
        views
            .into_iter()
            .map(|entity| RenderView {
                id: entity.id(),
                kind: entity.kind(),
                position: entity.position(),
                bounds: entity.bounds(),
                visual_state: entity.state().visual_tag(),
                sprite: entity.sprite(),
            })
            .collect()
    }

    pub fn debug_entities(&self) -> Vec<DebugEntityInfo> {
        self.entities
            .iter()
            .filter(|entity| entity.is_visible())
            .map(|entity| DebugEntityInfo {
                id: entity.id(),
                name: entity.name().to_string(),
                bounds: entity.bounds(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::entity::{EntityState, Key, KeyLocation, Table};

    fn scene_with_overlap() -> Scene {
        let mut scene = Scene::new(
            "hall".to_string(),
            "scene.hall.title".to_string(),
            "scene.hall.description".to_string(),
        );
        scene.place(Entity::new(
            EntityId(0),
            "table".to_string(),
            "object.table".to_string(),
            Rect::centered(Vec2::new(100.0, 100.0), Vec2::new(96.0, 64.0)),
            EntityState::Table(Table {
                displaced: false,
                items_on_top: Vec::new(),
                concealed: vec![EntityId(1)],
            }),
        ));
        scene.place(
            Entity::new(
                EntityId(1),
                "key".to_string(),
                "object.key".to_string(),
                Rect::centered(Vec2::new(100.0, 100.0), Vec2::new(32.0, 32.0)),
                EntityState::Key(Key {
                    location: KeyLocation::OnGround,
                }),
            )
            .with_flags(false, true),
        );
        scene
    }

    #[test]
    fn empty_background_hit_is_none() {
        let scene = scene_with_overlap();
        assert_eq!(scene.hit_test(Vec2::new(400.0, 400.0)), None);
    }

    #[test]
    fn hidden_entity_is_skipped_by_hit_test() {
        let scene = scene_with_overlap();
        assert_eq!(scene.hit_test(Vec2::new(100.0, 100.0)), Some(EntityId(0)));
    }

    #[test]
    fn revealed_entity_wins_overlap() {
        let mut scene = scene_with_overlap();
        assert!(scene.reveal(EntityId(1)).expect("reveal"));
        assert_eq!(scene.hit_test(Vec2::new(100.0, 100.0)), Some(EntityId(1)));
        // Outside the key but still on the table.
        assert_eq!(scene.hit_test(Vec2::new(60.0, 100.0)), Some(EntityId(0)));
    }

    #[test]
    fn reveal_twice_reports_no_change() {
        let mut scene = scene_with_overlap();
        assert!(scene.reveal(EntityId(1)).expect("first"));
        assert!(!scene.reveal(EntityId(1)).expect("second"));
    }

    #[test]
    fn non_interactive_entity_is_skipped() {
        let mut scene = scene_with_overlap();
        scene
            .find_entity_mut(EntityId(0))
            .expect("table")
            .set_interactive(false);
        assert_eq!(scene.hit_test(Vec2::new(100.0, 100.0)), None);
    }

    #[test]
    fn move_entity_updates_hit_region() {
        let mut scene = scene_with_overlap();
        scene
            .move_entity(EntityId(0), Vec2::new(300.0, 100.0))
            .expect("move");
        assert_eq!(scene.hit_test(Vec2::new(100.0, 100.0)), None);
        assert_eq!(scene.hit_test(Vec2::new(300.0, 100.0)), Some(EntityId(0)));
        assert_eq!(
            scene.move_entity(EntityId(9), Vec2::default()),
            Err(NotFound::Entity(EntityId(9)))
        );
    }

    #[test]
    fn render_views_are_back_to_front_and_skip_hidden() {
        let mut scene = scene_with_overlap();
        let views = scene.render_views();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].visual_state, "table.undisturbed");

        scene.reveal(EntityId(1)).expect("reveal");
        let ids = scene
            .render_views()
            .iter()
            .map(|view| view.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![EntityId(0), EntityId(1)]);
    }

    #[test]
    fn debug_listing_only_has_visible_entities() {
        let scene = scene_with_overlap();
        let listing = scene.debug_entities();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].name, "table");
    }
}
