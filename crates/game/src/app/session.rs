use std::path::PathBuf;

use engine::{
    load_snapshot, resolve, resolve_at, save_snapshot, Action, ActionError, EntityId,
    GameSnapshot, InteractionContext, Inventory, Message, Outcome, Rules, SceneManager,
    TracingSink, Vec2, Verb,
};
use tracing::{info, warn};

use super::console::GameCommand;

pub(crate) mod ui_keys {
    pub(crate) const SCENE_ENTERED: &str = "ui.scene_entered";
    pub(crate) const SCENE_OBJECT: &str = "ui.scene_object";
    pub(crate) const SCENE_UNKNOWN: &str = "ui.scene_unknown";
    pub(crate) const NO_SUCH_ENTITY: &str = "ui.no_such_entity";
    pub(crate) const CLICK_NOTHING: &str = "ui.click_nothing";
    pub(crate) const INVENTORY_EMPTY: &str = "ui.inventory_empty";
    pub(crate) const INVENTORY_HEADER: &str = "ui.inventory_header";
    pub(crate) const INVENTORY_ITEM: &str = "ui.inventory_item";
    pub(crate) const INVENTORY_MORE: &str = "ui.inventory_more";
    pub(crate) const INVENTORY_SCROLLED: &str = "ui.inventory_scrolled";
    pub(crate) const DEBUG_ENTITY: &str = "ui.debug_entity";
    pub(crate) const DEBUG_VIEW: &str = "ui.debug_view";
    pub(crate) const SAVED: &str = "ui.saved";
    pub(crate) const SAVE_FAILED: &str = "ui.save_failed";
    pub(crate) const LOADED: &str = "ui.loaded";
    pub(crate) const LOAD_FAILED: &str = "ui.load_failed";
    pub(crate) const BAD_COMMAND: &str = "ui.bad_command";
    pub(crate) const LANGUAGE_CHANGED: &str = "ui.language_changed";
    pub(crate) const LANGUAGE_UNKNOWN: &str = "ui.language_unknown";
    pub(crate) const FAREWELL: &str = "ui.farewell";
}

/// What one command produced: messages to show, and whether to stop.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Turn {
    pub(crate) messages: Vec<Message>,
    pub(crate) quit: bool,
}

impl Turn {
    fn say(message: Message) -> Self {
        Self {
            messages: vec![message],
            quit: false,
        }
    }
}

/// Running game state: every scene, the inventory, and the rule settings.
pub(crate) struct Session {
    scenes: SceneManager,
    inventory: Inventory,
    rules: Rules,
    script_fingerprint: String,
    save_path: PathBuf,
    diagnostics: TracingSink,
}

impl Session {
    pub(crate) fn new(
        scenes: SceneManager,
        rules: Rules,
        script_fingerprint: String,
        save_path: PathBuf,
    ) -> Self {
        Self {
            scenes,
            inventory: Inventory::default(),
            rules,
            script_fingerprint,
            save_path,
            diagnostics: TracingSink,
        }
    }

    #[cfg(test)]
    pub(crate) fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    #[cfg(test)]
    pub(crate) fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub(crate) fn execute(&mut self, command: GameCommand) -> Turn {
        match command {
            // Help needs the command registry and language switches need the
            // locale; the console loop answers both.
            GameCommand::Help | GameCommand::Language { .. } => Turn::default(),
            GameCommand::Describe => Turn {
                messages: self.describe_scene(),
                quit: false,
            },
            GameCommand::Act { verb, target } => self.act_by_name(verb, &target, None),
            GameCommand::ActWith { verb, target, item } => {
                self.act_by_name(verb, &target, Some(&item))
            }
            GameCommand::Click { x, y, verb, item } => self.click(Vec2::new(x, y), verb, item.as_deref()),
            GameCommand::Inventory => Turn {
                messages: self.list_inventory(),
                quit: false,
            },
            GameCommand::Scroll { delta } => {
                let offset = self.inventory.scroll_by(delta);
                let mut messages = vec![
                    Message::new(ui_keys::INVENTORY_SCROLLED).with_param(offset.to_string())
                ];
                messages.extend(self.list_inventory());
                Turn {
                    messages,
                    quit: false,
                }
            }
            GameCommand::Scene { id } => match self.scenes.transition_to(&id) {
                Ok(_) => Turn {
                    messages: self.describe_scene(),
                    quit: false,
                },
                Err(_) => Turn::say(Message::new(ui_keys::SCENE_UNKNOWN).with_param(id)),
            },
            GameCommand::Debug => Turn {
                messages: self.debug_dump(),
                quit: false,
            },
            GameCommand::Save => self.save(),
            GameCommand::Load => self.load(),
            GameCommand::Quit => Turn {
                messages: vec![Message::new(ui_keys::FAREWELL)],
                quit: true,
            },
        }
    }

    pub(crate) fn describe_scene(&self) -> Vec<Message> {
        let scene = self.scenes.active();
        let mut messages = vec![Message::new(ui_keys::SCENE_ENTERED)
            .with_param(scene.title())
            .with_param(scene.description())];
        messages.extend(
            scene
                .entities()
                .iter()
                .filter(|entity| entity.is_hit_testable())
                .map(|entity| {
                    Message::new(ui_keys::SCENE_OBJECT)
                        .with_param(entity.label())
                        .with_param(entity.name())
                }),
        );
        messages
    }

    fn act_by_name(&mut self, verb: Verb, target: &str, item: Option<&str>) -> Turn {
        let Some(target_id) = self.lookup_target(target) else {
            return Turn::say(Message::new(ui_keys::NO_SUCH_ENTITY).with_param(target));
        };
        let item_id = match item {
            Some(name) => match self.scenes.find_entity_by_name(name) {
                Some((_, entity)) => Some(entity.id()),
                None => {
                    return Turn::say(Message::new(ui_keys::NO_SUCH_ENTITY).with_param(name))
                }
            },
            None => None,
        };
        let Some(action) = Action::from_verb(verb, item_id) else {
            return Turn::say(Message::new(ui_keys::BAD_COMMAND).with_param(verb.label_key()));
        };

        let Some(scene) = self.scenes.scene_of_mut(target_id) else {
            return Turn::say(Message::new(ui_keys::NO_SUCH_ENTITY).with_param(target));
        };
        let mut context = InteractionContext {
            scene,
            inventory: &mut self.inventory,
            rules: &self.rules,
            diagnostics: &mut self.diagnostics,
        };
        let result = resolve(target_id, action, &mut context);
        self.finish(result)
    }

    fn click(&mut self, point: Vec2, verb: Verb, item: Option<&str>) -> Turn {
        let item_id = match item {
            Some(name) => match self.scenes.find_entity_by_name(name) {
                Some((_, entity)) => Some(entity.id()),
                None => {
                    return Turn::say(Message::new(ui_keys::NO_SUCH_ENTITY).with_param(name))
                }
            },
            None => None,
        };
        let Some(action) = Action::from_verb(verb, item_id) else {
            return Turn::say(Message::new(ui_keys::BAD_COMMAND).with_param(verb.label_key()));
        };

        let mut context = InteractionContext {
            scene: self.scenes.active_mut(),
            inventory: &mut self.inventory,
            rules: &self.rules,
            diagnostics: &mut self.diagnostics,
        };
        match resolve_at(point, action, &mut context) {
            Ok(Some(outcome)) => self.finish(Ok(outcome)),
            Ok(None) => Turn::say(Message::new(ui_keys::CLICK_NOTHING)),
            Err(error) => self.finish(Err(error)),
        }
    }

    /// Targets are looked up in the active scene first; held items can be
    /// named from anywhere.
    fn lookup_target(&self, name: &str) -> Option<EntityId> {
        if let Some(entity) = self.scenes.active().entity_by_name(name) {
            return Some(entity.id());
        }
        self.scenes
            .find_entity_by_name(name)
            .map(|(_, entity)| entity.id())
            .filter(|id| self.inventory.has(*id))
    }

    fn finish(&mut self, result: Result<Outcome, ActionError>) -> Turn {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(error) => return Turn::say(error.message()),
        };
        let mut messages = vec![outcome.message.clone()];
        if let Some(scene_id) = outcome.transition_target() {
            match self.scenes.transition_to(scene_id) {
                Ok(_) => messages.extend(self.describe_scene()),
                Err(error) => {
                    warn!(error = %error, "transition_target_missing");
                    messages.push(Message::new(ui_keys::SCENE_UNKNOWN).with_param(scene_id));
                }
            }
        }
        Turn {
            messages,
            quit: false,
        }
    }

    fn list_inventory(&self) -> Vec<Message> {
        let window = self.inventory.window();
        if window.total == 0 {
            return vec![Message::new(ui_keys::INVENTORY_EMPTY)];
        }

        let mut messages = vec![Message::new(ui_keys::INVENTORY_HEADER)
            .with_param((window.offset + 1).to_string())
            .with_param((window.offset + window.slots.len()).to_string())
            .with_param(window.total.to_string())];
        for id in window.slots {
            if let Some((_, entity)) = self.scenes.find_entity(*id) {
                messages.push(
                    Message::new(ui_keys::INVENTORY_ITEM)
                        .with_param(entity.label())
                        .with_param(entity.name()),
                );
            }
        }
        if window.can_scroll_forward() {
            let remaining = window.total - (window.offset + window.slots.len());
            messages.push(Message::new(ui_keys::INVENTORY_MORE).with_param(remaining.to_string()));
        }
        messages
    }

    fn debug_dump(&self) -> Vec<Message> {
        let scene = self.scenes.active();
        let mut messages = scene
            .debug_entities()
            .into_iter()
            .map(|info| {
                let min = info.bounds.min();
                let max = info.bounds.max();
                Message::new(ui_keys::DEBUG_ENTITY).with_params([
                    info.name,
                    info.id.to_string(),
                    format!("{:.0}", min.x),
                    format!("{:.0}", min.y),
                    format!("{:.0}", max.x),
                    format!("{:.0}", max.y),
                ])
            })
            .collect::<Vec<_>>();
        messages.extend(scene.render_views().into_iter().map(|view| {
            Message::new(ui_keys::DEBUG_VIEW).with_params([
                view.id.to_string(),
                view.kind.as_token().to_string(),
                view.visual_state.to_string(),
                format!("{:.0}", view.position.x),
                format!("{:.0}", view.position.y),
            ])
        }));
        messages
    }

    fn save(&mut self) -> Turn {
        let snapshot = GameSnapshot::capture(&self.scenes, &self.inventory, &self.script_fingerprint);
        match save_snapshot(&self.save_path, &snapshot) {
            Ok(()) => Turn::say(
                Message::new(ui_keys::SAVED).with_param(self.save_path.display().to_string()),
            ),
            Err(error) => {
                warn!(error = %error, "save_failed");
                Turn::say(Message::new(ui_keys::SAVE_FAILED).with_param(error.to_string()))
            }
        }
    }

    fn load(&mut self) -> Turn {
        let restored = load_snapshot(&self.save_path).and_then(|snapshot| {
            snapshot.restore(&mut self.scenes, &mut self.inventory, &self.script_fingerprint)
        });
        match restored {
            Ok(()) => {
                info!(path = %self.save_path.display(), "save_loaded");
                let mut messages = vec![Message::new(ui_keys::LOADED)];
                messages.extend(self.describe_scene());
                Turn {
                    messages,
                    quit: false,
                }
            }
            Err(error) => {
                warn!(error = %error, "load_failed");
                Turn::say(Message::new(ui_keys::LOAD_FAILED).with_param(error.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use engine::{default_script, keys, parse_script, DoorState, KeyLocation};
    use tempfile::TempDir;

    use super::*;

    const TWO_ROOMS: &str = r#"<Script start="hall">
  <Scene id="hall">
    <entities>
      <Entity id="door_001" kind="Door" name="object.door"/>
      <Entity id="table_001" kind="Table" name="object.table"/>
      <Entity id="key_001" kind="Key" name="object.key"/>
    </entities>
    <object_properties>
      <Object ref="door_001">
        <position>300 200</position>
        <locked>true</locked>
        <key_required>key_001</key_required>
        <leads_to>garden</leads_to>
      </Object>
      <Object ref="table_001"><position>150 300</position><conceals>key_001</conceals></Object>
      <Object ref="key_001"><position>150 300</position></Object>
    </object_properties>
  </Scene>
  <Scene id="garden">
    <entities><Entity id="gate" kind="Door" name="object.gate"/></entities>
    <object_properties><Object ref="gate"><position>40 40</position></Object></object_properties>
  </Scene>
</Script>"#;

    fn session_in(temp: &TempDir, rules: Rules) -> Session {
        let script = parse_script(TWO_ROOMS).expect("script");
        let fingerprint = script.fingerprint.clone();
        let scenes = script.into_scene_manager().expect("scenes");
        Session::new(scenes, rules, fingerprint, temp.path().join("slot.json"))
    }

    fn act(verb: Verb, target: &str) -> GameCommand {
        GameCommand::Act {
            verb,
            target: target.to_string(),
        }
    }

    fn keys_of(turn: &Turn) -> Vec<&str> {
        turn.messages.iter().map(Message::key).collect()
    }

    fn door_state(session: &Session) -> DoorState {
        let (_, door) = session
            .scenes()
            .find_entity_by_name("door_001")
            .expect("door");
        door.door().expect("door").state
    }

    #[test]
    fn commands_play_the_locked_door_puzzle_into_the_next_room() {
        let temp = TempDir::new().expect("temp");
        let mut session = session_in(&temp, Rules::default());

        let turn = session.execute(act(Verb::Open, "door_001"));
        assert_eq!(keys_of(&turn), [keys::DOOR_IS_LOCKED]);

        let turn = session.execute(GameCommand::Click {
            x: 150.0,
            y: 300.0,
            verb: Verb::Push,
            item: None,
        });
        assert_eq!(keys_of(&turn), [keys::TABLE_MOVED_REVEALING]);

        session.execute(act(Verb::Take, "key_001"));
        session.execute(GameCommand::ActWith {
            verb: Verb::Use,
            target: "door_001".to_string(),
            item: "key_001".to_string(),
        });
        assert_eq!(door_state(&session), DoorState::Closed);
        session.execute(act(Verb::Open, "door_001"));

        let turn = session.execute(act(Verb::Enter, "door_001"));
        assert_eq!(turn.messages[0].key(), keys::DOOR_ENTERED);
        assert_eq!(turn.messages[1].key(), ui_keys::SCENE_ENTERED);
        assert_eq!(session.scenes().active_id(), "garden");

        // Held items stay usable after leaving their room.
        let turn = session.execute(act(Verb::Look, "key_001"));
        assert_eq!(keys_of(&turn), [keys::KEY_LOOK_HELD]);
    }

    #[test]
    fn unknown_names_and_empty_clicks_are_reported() {
        let temp = TempDir::new().expect("temp");
        let mut session = session_in(&temp, Rules::default());
        let turn = session.execute(act(Verb::Look, "gate"));
        assert_eq!(keys_of(&turn), [ui_keys::NO_SUCH_ENTITY]);

        let turn = session.execute(GameCommand::Click {
            x: 900.0,
            y: 900.0,
            verb: Verb::Look,
            item: None,
        });
        assert_eq!(keys_of(&turn), [ui_keys::CLICK_NOTHING]);
    }

    #[test]
    fn inventory_lists_held_items() {
        let temp = TempDir::new().expect("temp");
        let mut session = session_in(&temp, Rules::default());
        let turn = session.execute(GameCommand::Inventory);
        assert_eq!(keys_of(&turn), [ui_keys::INVENTORY_EMPTY]);

        session.execute(act(Verb::Push, "table_001"));
        session.execute(act(Verb::Take, "key_001"));
        let turn = session.execute(GameCommand::Inventory);
        assert_eq!(keys_of(&turn), [ui_keys::INVENTORY_HEADER, ui_keys::INVENTORY_ITEM]);
        assert_eq!(turn.messages[1].params(), ["object.key", "key_001"]);

        let turn = session.execute(GameCommand::Scroll { delta: 5 });
        assert_eq!(turn.messages[0].params(), ["0"]);
    }

    #[test]
    fn save_and_load_restore_progress() {
        let temp = TempDir::new().expect("temp");
        let mut session = session_in(&temp, Rules::default());
        session.execute(act(Verb::Push, "table_001"));
        session.execute(act(Verb::Take, "key_001"));
        let turn = session.execute(GameCommand::Save);
        assert_eq!(keys_of(&turn), [ui_keys::SAVED]);

        let mut fresh = session_in(&temp, Rules::default());
        let turn = fresh.execute(GameCommand::Load);
        assert_eq!(turn.messages[0].key(), ui_keys::LOADED);
        let (_, key) = fresh.scenes().find_entity_by_name("key_001").expect("key");
        assert_eq!(key.key().expect("key").location, KeyLocation::InInventory);
        assert_eq!(fresh.inventory().items(), [key.id()]);
    }

    #[test]
    fn load_against_other_script_fails_cleanly() {
        let temp = TempDir::new().expect("temp");
        let mut session = session_in(&temp, Rules::default());
        session.execute(GameCommand::Save);

        let script = default_script();
        let mut other = Session::new(
            script.clone().into_scene_manager().expect("scenes"),
            Rules::default(),
            script.fingerprint.clone(),
            temp.path().join("slot.json"),
        );
        let turn = other.execute(GameCommand::Load);
        assert_eq!(keys_of(&turn), [ui_keys::LOAD_FAILED]);
        assert!(other.inventory().is_empty());
    }

    #[test]
    fn load_without_save_reports_failure() {
        let temp = TempDir::new().expect("temp");
        let mut session = session_in(&temp, Rules::default());
        let turn = session.execute(GameCommand::Load);
        assert_eq!(keys_of(&turn), [ui_keys::LOAD_FAILED]);
    }

    #[test]
    fn scene_command_and_debug_dump() {
        let temp = TempDir::new().expect("temp");
        let mut session = session_in(&temp, Rules::default());
        let turn = session.execute(GameCommand::Scene {
            id: "attic".to_string(),
        });
        assert_eq!(keys_of(&turn), [ui_keys::SCENE_UNKNOWN]);

        let turn = session.execute(GameCommand::Debug);
        // Door and table are visible; the key is still hidden.
        let entity_lines = turn
            .messages
            .iter()
            .filter(|message| message.key() == ui_keys::DEBUG_ENTITY)
            .count();
        assert_eq!(entity_lines, 2);

        let turn = session.execute(GameCommand::Scene {
            id: "garden".to_string(),
        });
        assert_eq!(turn.messages[0].key(), ui_keys::SCENE_ENTERED);
        assert_eq!(session.scenes().active_id(), "garden");
    }

    #[test]
    fn verb_item_mismatch_is_reported() {
        let temp = TempDir::new().expect("temp");
        let mut session = session_in(&temp, Rules::default());
        let turn = session.execute(act(Verb::Use, "door_001"));
        assert_eq!(keys_of(&turn), [ui_keys::BAD_COMMAND]);
        assert_eq!(turn.messages[0].params(), ["verb.use"]);

        let turn = session.execute(GameCommand::Click {
            x: 300.0,
            y: 200.0,
            verb: Verb::Look,
            item: Some("door_001".to_string()),
        });
        assert_eq!(keys_of(&turn), [ui_keys::BAD_COMMAND]);
        assert_eq!(door_state(&session), DoorState::Locked);
    }

    #[test]
    fn lock_command_locks_a_closed_door() {
        let temp = TempDir::new().expect("temp");
        let mut session = session_in(&temp, Rules::default());
        session.execute(act(Verb::Push, "table_001"));
        session.execute(act(Verb::Take, "key_001"));
        session.execute(GameCommand::ActWith {
            verb: Verb::Unlock,
            target: "door_001".to_string(),
            item: "key_001".to_string(),
        });
        let turn = session.execute(act(Verb::Lock, "door_001"));
        assert_eq!(keys_of(&turn), [keys::DOOR_LOCKED]);
        assert_eq!(door_state(&session), DoorState::Locked);
    }

    #[test]
    fn quit_ends_the_session() {
        let temp = TempDir::new().expect("temp");
        let mut session = session_in(&temp, Rules::default());
        let turn = session.execute(GameCommand::Quit);
        assert!(turn.quit);
    }
}
