use crate::world::{
    Door, DoorState, Entity, EntityId, EntityKind, EntityState, Inventory, Key, KeyLocation,
    NotFound, Scene, Table, Vec2,
};

use super::action::Action;
use super::diagnostics::{DiagnosticEvent, DiagnosticSink};
use super::message::{keys, Message};
use super::outcome::{ActionError, Effect, IllegalAction, Outcome};
use super::rules::{Rules, UseKeyRule};

/// Everything an action may read or write besides its target.
pub struct InteractionContext<'a> {
    pub scene: &'a mut Scene,
    pub inventory: &'a mut Inventory,
    pub rules: &'a Rules,
    pub diagnostics: &'a mut dyn DiagnosticSink,
}

/// Resolves `action` against the entity `target` in `context.scene`.
///
/// Legality is decided against unmodified state first; effects are only
/// applied once every precondition holds, so a rejected action leaves the
/// scene and inventory untouched.
pub fn resolve(
    target: EntityId,
    action: Action,
    context: &mut InteractionContext<'_>,
) -> Result<Outcome, ActionError> {
    let verb = action.verb();
    let result = plan(target, action, context.scene, context.inventory, context.rules)
        .and_then(|planned| commit(planned, context.scene, context.inventory));

    let event = match &result {
        Ok(outcome) => DiagnosticEvent::ActionResolved {
            target,
            verb,
            message_key: outcome.message.key().to_string(),
            effect_count: outcome.effects.len(),
        },
        Err(error) => DiagnosticEvent::ActionRejected {
            target,
            verb,
            message_key: error.message().key().to_string(),
        },
    };
    context.diagnostics.record(event);
    result
}

/// Hit-tests `point` and resolves the action against whatever is there.
/// `Ok(None)` means the click landed on empty background.
pub fn resolve_at(
    point: Vec2,
    action: Action,
    context: &mut InteractionContext<'_>,
) -> Result<Option<Outcome>, ActionError> {
    match context.scene.hit_test(point) {
        Some(target) => resolve(target, action, context).map(Some),
        None => Ok(None),
    }
}

fn plan(
    target: EntityId,
    action: Action,
    scene: &Scene,
    inventory: &Inventory,
    rules: &Rules,
) -> Result<Outcome, ActionError> {
    let entity = scene.find_entity(target).ok_or(NotFound::Entity(target))?;
    if !entity.is_interactive() {
        return Err(ActionError::illegal(
            IllegalAction::NotInteractive,
            entity.label(),
        ));
    }

    let planned = match entity.state() {
        EntityState::Door(door) => plan_door(entity, door, action, scene, inventory, rules),
        EntityState::Key(key) => plan_key(entity, key, action, inventory),
        EntityState::Table(table) => plan_table(entity, table, action, scene, rules),
    };
    planned.map_err(|reason| match (reason, entity.refusal_for(action.verb())) {
        (IllegalAction::Unsupported(_), Some(message_key)) => ActionError::Illegal {
            reason,
            message: Message::new(message_key.to_string()).with_param(entity.label()),
        },
        _ => ActionError::illegal(reason, entity.label()),
    })
}

fn plan_door(
    entity: &Entity,
    door: &Door,
    action: Action,
    scene: &Scene,
    inventory: &Inventory,
    rules: &Rules,
) -> Result<Outcome, IllegalAction> {
    let label = entity.label();
    match action {
        Action::Look => {
            let key = match door.state {
                DoorState::Open => keys::DOOR_LOOK_OPEN,
                DoorState::Closed => keys::DOOR_LOOK_CLOSED,
                DoorState::Locked => keys::DOOR_LOOK_LOCKED,
            };
            Ok(Outcome::message_only(Message::new(key).with_param(label)))
        }
        Action::Open => match door.state {
            DoorState::Open => Err(IllegalAction::AlreadyOpen),
            DoorState::Locked => Err(IllegalAction::Locked),
            DoorState::Closed => Ok(door_change(entity, door, DoorState::Open, keys::DOOR_OPENED)),
        },
        Action::Close => match door.state {
            DoorState::Open => Ok(door_change(
                entity,
                door,
                DoorState::Closed,
                keys::DOOR_CLOSED,
            )),
            DoorState::Closed | DoorState::Locked => Err(IllegalAction::AlreadyClosed),
        },
        Action::Unlock { key } => {
            check_key(door, key, inventory)?;
            unlock(entity, door, UseKeyRule::UnlockOnly)
        }
        Action::Use { item } => {
            if !inventory.has(item) {
                return Err(IllegalAction::ItemNotHeld);
            }
            if scene
                .find_entity(item)
                .is_some_and(|held| held.kind() != EntityKind::Key)
            {
                return Err(IllegalAction::CannotCombine);
            }
            check_key(door, item, inventory)?;
            unlock(entity, door, rules.use_key_rule)
        }
        Action::Lock => match door.state {
            DoorState::Open => Err(IllegalAction::MustBeClosed),
            DoorState::Locked => Err(IllegalAction::AlreadyLocked),
            DoorState::Closed => Ok(door_change(
                entity,
                door,
                DoorState::Locked,
                keys::DOOR_LOCKED,
            )),
        },
        Action::Push => Ok(Outcome::message_only(
            Message::new(keys::DOOR_PUSH_RESISTS).with_param(label),
        )),
        Action::Pull => Ok(Outcome::message_only(
            Message::new(keys::DOOR_PULL_NOTHING).with_param(label),
        )),
        Action::Enter => {
            if !door.state.is_open() {
                return Err(IllegalAction::DoorClosed);
            }
            let Some(scene_id) = &door.leads_to else {
                return Err(IllegalAction::NoExit);
            };
            Ok(Outcome {
                message: Message::new(keys::DOOR_ENTERED).with_param(label),
                effects: vec![Effect::Transition {
                    scene_id: scene_id.clone(),
                }],
            })
        }
        Action::Take | Action::TalkTo | Action::Give => {
            Err(IllegalAction::Unsupported(action.verb()))
        }
    }
}

fn check_key(door: &Door, key: EntityId, inventory: &Inventory) -> Result<(), IllegalAction> {
    if !inventory.has(key) {
        return Err(IllegalAction::ItemNotHeld);
    }
    if door.key_required != Some(key) {
        return Err(IllegalAction::WrongKey);
    }
    Ok(())
}

fn unlock(entity: &Entity, door: &Door, rule: UseKeyRule) -> Result<Outcome, IllegalAction> {
    if !door.state.is_locked() {
        return Err(IllegalAction::NotLocked);
    }
    Ok(match rule {
        UseKeyRule::UnlockOnly => {
            door_change(entity, door, DoorState::Closed, keys::DOOR_UNLOCKED)
        }
        UseKeyRule::UnlockAndOpen => door_change(
            entity,
            door,
            DoorState::Open,
            keys::DOOR_UNLOCKED_AND_OPENED,
        ),
    })
}

fn door_change(entity: &Entity, door: &Door, to: DoorState, key: &'static str) -> Outcome {
    Outcome {
        message: Message::new(key).with_param(entity.label()),
        effects: vec![Effect::DoorChanged {
            door: entity.id(),
            from: door.state,
            to,
        }],
    }
}

fn plan_key(
    entity: &Entity,
    key: &Key,
    action: Action,
    inventory: &Inventory,
) -> Result<Outcome, IllegalAction> {
    let label = entity.label();
    match action {
        Action::Look => {
            let message_key = match key.location {
                KeyLocation::InInventory => keys::KEY_LOOK_HELD,
                KeyLocation::OnGround if entity.is_visible() => keys::KEY_LOOK,
                KeyLocation::OnGround => keys::KEY_LOOK_CONCEALED,
            };
            Ok(Outcome::message_only(
                Message::new(message_key).with_param(label),
            ))
        }
        Action::Take => {
            let on_ground = key.location == KeyLocation::OnGround && entity.is_visible();
            if !on_ground || inventory.has(entity.id()) {
                return Err(IllegalAction::NotOnGround);
            }
            Ok(Outcome {
                message: Message::new(keys::KEY_TAKEN).with_param(label),
                effects: vec![Effect::KeyTaken { key: entity.id() }],
            })
        }
        Action::Use { .. } | Action::Unlock { .. } => Err(IllegalAction::CannotCombine),
        Action::Open
        | Action::Close
        | Action::Lock
        | Action::Push
        | Action::Pull
        | Action::TalkTo
        | Action::Give
        | Action::Enter => Err(IllegalAction::Unsupported(action.verb())),
    }
}

fn plan_table(
    entity: &Entity,
    table: &Table,
    action: Action,
    scene: &Scene,
    rules: &Rules,
) -> Result<Outcome, IllegalAction> {
    let label = entity.label();
    match action {
        Action::Look => {
            if !table.displaced && !table.concealed.is_empty() {
                return Ok(Outcome::message_only(
                    Message::new(keys::TABLE_LOOK_WOBBLY).with_param(label),
                ));
            }
            let items = table
                .items_on_top
                .iter()
                .filter_map(|id| scene.find_entity(*id))
                .filter(|item| item.is_hit_testable())
                .map(|item| item.label().to_string())
                .collect::<Vec<_>>();
            let message = if items.is_empty() {
                Message::new(keys::TABLE_LOOK).with_param(label)
            } else {
                Message::new(keys::TABLE_LOOK_WITH_ITEMS)
                    .with_param(label)
                    .with_params(items)
            };
            Ok(Outcome::message_only(message))
        }
        Action::Push | Action::Pull => {
            if table.displaced {
                return Ok(Outcome::message_only(
                    Message::new(keys::TABLE_ALREADY_MOVED).with_param(label),
                ));
            }
            let pushing = action == Action::Push;
            let shift = if pushing {
                rules.table_shift_px
            } else {
                -rules.table_shift_px
            };
            let from = entity.position();
            let to = Vec2::new(from.x + shift, from.y);

            let revealed = table
                .concealed
                .iter()
                .filter_map(|id| scene.find_entity(*id))
                .filter(|item| !item.is_visible())
                .collect::<Vec<_>>();

            let mut effects = vec![
                Effect::TableDisplaced { table: entity.id() },
                Effect::Moved {
                    entity: entity.id(),
                    from,
                    to,
                },
            ];
            effects.extend(
                revealed
                    .iter()
                    .map(|item| Effect::Revealed { entity: item.id() }),
            );

            let message = if revealed.is_empty() {
                let key = if pushing {
                    keys::TABLE_PUSHED
                } else {
                    keys::TABLE_PULLED
                };
                Message::new(key).with_param(label)
            } else {
                Message::new(keys::TABLE_MOVED_REVEALING)
                    .with_param(label)
                    .with_params(revealed.iter().map(|item| item.label().to_string()))
            };
            Ok(Outcome { message, effects })
        }
        Action::Use { .. } | Action::Unlock { .. } => Err(IllegalAction::CannotCombine),
        Action::Take
        | Action::Open
        | Action::Close
        | Action::Lock
        | Action::TalkTo
        | Action::Give
        | Action::Enter => Err(IllegalAction::Unsupported(action.verb())),
    }
}

fn commit(
    outcome: Outcome,
    scene: &mut Scene,
    inventory: &mut Inventory,
) -> Result<Outcome, ActionError> {
    // The inventory transfer is the only step that can refuse; it runs before
    // any scene mutation. Every id below was looked up while planning.
    for effect in &outcome.effects {
        if let Effect::KeyTaken { key } = effect {
            if inventory.add(*key).is_err() {
                let label = scene
                    .find_entity(*key)
                    .map(|entity| entity.label().to_string())
                    .unwrap_or_default();
                return Err(ActionError::illegal(IllegalAction::NotOnGround, &label));
            }
        }
    }

    for effect in &outcome.effects {
        apply_effect(effect, scene)?;
    }
    Ok(outcome)
}

fn apply_effect(effect: &Effect, scene: &mut Scene) -> Result<(), NotFound> {
    match effect {
        Effect::DoorChanged { door, to, .. } => {
            let entity = scene
                .find_entity_mut(*door)
                .ok_or(NotFound::Entity(*door))?;
            if let EntityState::Door(state) = entity.state_mut() {
                state.state = *to;
            }
        }
        Effect::KeyTaken { key } => {
            let entity = scene.find_entity_mut(*key).ok_or(NotFound::Entity(*key))?;
            if let EntityState::Key(state) = entity.state_mut() {
                state.location = KeyLocation::InInventory;
            }
            entity.set_visible(false);
        }
        Effect::TableDisplaced { table } => {
            let entity = scene
                .find_entity_mut(*table)
                .ok_or(NotFound::Entity(*table))?;
            if let EntityState::Table(state) = entity.state_mut() {
                state.displaced = true;
            }
        }
        Effect::Revealed { entity } => {
            scene.reveal(*entity)?;
        }
        Effect::Moved { entity, to, .. } => {
            scene.move_entity(*entity, *to)?;
        }
        Effect::Transition { .. } => {}
    }
    Ok(())
}
