use thiserror::Error;

use crate::world::{DoorState, EntityId, NotFound, Vec2};

use super::action::Verb;
use super::message::{keys, Message};

/// A state change the resolver applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    DoorChanged {
        door: EntityId,
        from: DoorState,
        to: DoorState,
    },
    KeyTaken {
        key: EntityId,
    },
    TableDisplaced {
        table: EntityId,
    },
    Revealed {
        entity: EntityId,
    },
    Moved {
        entity: EntityId,
        from: Vec2,
        to: Vec2,
    },
    /// Requests a scene change; the caller applies it through the scene
    /// manager.
    Transition {
        scene_id: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub message: Message,
    pub effects: Vec<Effect>,
}

impl Outcome {
    pub(crate) fn message_only(message: Message) -> Self {
        Self {
            message,
            effects: Vec::new(),
        }
    }

    pub fn changed_state(&self) -> bool {
        self.effects
            .iter()
            .any(|effect| !matches!(effect, Effect::Transition { .. }))
    }

    pub fn transition_target(&self) -> Option<&str> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::Transition { scene_id } => Some(scene_id.as_str()),
            _ => None,
        })
    }

    pub fn revealed(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Revealed { entity } => Some(*entity),
            _ => None,
        })
    }
}

/// Precondition failures. Each one maps to its own message key, which is
/// also its `Display` text; player-facing prose lives in the string table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IllegalAction {
    #[error("door.already_open")]
    AlreadyOpen,
    #[error("door.already_closed")]
    AlreadyClosed,
    #[error("door.is_locked")]
    Locked,
    #[error("door.wrong_key")]
    WrongKey,
    #[error("door.not_locked")]
    NotLocked,
    #[error("door.must_be_closed")]
    MustBeClosed,
    #[error("door.already_locked")]
    AlreadyLocked,
    #[error("door.is_closed")]
    DoorClosed,
    #[error("door.no_exit")]
    NoExit,
    #[error("key.not_on_ground")]
    NotOnGround,
    #[error("item.not_held")]
    ItemNotHeld,
    #[error("action.cannot_combine")]
    CannotCombine,
    #[error("action.unsupported (verb={0})")]
    Unsupported(Verb),
    #[error("action.not_interactive")]
    NotInteractive,
}

impl IllegalAction {
    pub fn message_key(self) -> &'static str {
        match self {
            Self::AlreadyOpen => keys::DOOR_ALREADY_OPEN,
            Self::AlreadyClosed => keys::DOOR_ALREADY_CLOSED,
            Self::Locked => keys::DOOR_IS_LOCKED,
            Self::WrongKey => keys::DOOR_WRONG_KEY,
            Self::NotLocked => keys::DOOR_NOT_LOCKED,
            Self::MustBeClosed => keys::DOOR_MUST_BE_CLOSED,
            Self::AlreadyLocked => keys::DOOR_ALREADY_LOCKED,
            Self::DoorClosed => keys::DOOR_IS_CLOSED,
            Self::NoExit => keys::DOOR_NO_EXIT,
            Self::NotOnGround => keys::KEY_NOT_ON_GROUND,
            Self::ItemNotHeld => keys::ITEM_NOT_HELD,
            Self::CannotCombine => keys::ACTION_CANNOT_COMBINE,
            Self::Unsupported(_) => keys::ACTION_UNSUPPORTED,
            Self::NotInteractive => keys::ACTION_NOT_INTERACTIVE,
        }
    }

    /// Player-facing message; `target_label` is the display-name key of the
    /// entity the action was aimed at.
    pub fn message(self, target_label: &str) -> Message {
        let message = Message::new(self.message_key());
        match self {
            Self::Unsupported(verb) => message
                .with_param(verb.label_key())
                .with_param(target_label),
            _ => message.with_param(target_label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{reason}")]
    Illegal {
        reason: IllegalAction,
        message: Message,
    },
    #[error(transparent)]
    NotFound(#[from] NotFound),
}

impl ActionError {
    pub(crate) fn illegal(reason: IllegalAction, target_label: &str) -> Self {
        Self::Illegal {
            reason,
            message: reason.message(target_label),
        }
    }

    pub fn illegal_reason(&self) -> Option<IllegalAction> {
        match self {
            Self::Illegal { reason, .. } => Some(*reason),
            Self::NotFound(_) => None,
        }
    }

    pub fn message(&self) -> Message {
        match self {
            Self::Illegal { message, .. } => message.clone(),
            Self::NotFound(_) => Message::new(keys::TARGET_NOT_FOUND),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_message_names_verb_then_target() {
        let message = IllegalAction::Unsupported(Verb::TalkTo).message("object.door");
        assert_eq!(message.key(), "action.unsupported");
        assert_eq!(message.params(), &["verb.talk", "object.door"]);
    }

    #[test]
    fn display_names_the_message_key() {
        for reason in [
            IllegalAction::AlreadyOpen,
            IllegalAction::WrongKey,
            IllegalAction::MustBeClosed,
            IllegalAction::NotOnGround,
            IllegalAction::NotInteractive,
        ] {
            assert_eq!(reason.to_string(), reason.message_key());
        }
        assert_eq!(
            IllegalAction::Unsupported(Verb::Give).to_string(),
            "action.unsupported (verb=give)"
        );
    }

    #[test]
    fn not_found_has_its_own_message_key() {
        let err = ActionError::from(NotFound::Entity(EntityId(7)));
        assert_eq!(err.illegal_reason(), None);
        assert_eq!(err.message().key(), "target.not_found");
    }

    #[test]
    fn transition_is_not_a_state_change() {
        let outcome = Outcome {
            message: Message::new(keys::DOOR_ENTERED),
            effects: vec![Effect::Transition {
                scene_id: "garden".to_string(),
            }],
        };
        assert!(!outcome.changed_state());
        assert_eq!(outcome.transition_target(), Some("garden"));
    }
}
