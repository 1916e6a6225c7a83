use std::borrow::Cow;

/// A player-facing message: a stable key plus ordered substitution
/// parameters. Parameters are message keys themselves (entity labels, verb
/// names); rendering them to text is up to the caller's string table.
///
/// Keys are usually the constants in [`keys`]; scripts may supply their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    key: Cow<'static, str>,
    params: Vec<String>,
}

impl Message {
    pub fn new(key: impl Into<Cow<'static, str>>) -> Self {
        Self {
            key: key.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.extend(params.into_iter().map(Into::into));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }
}

pub mod keys {
    pub const DOOR_LOOK_OPEN: &str = "door.look_open";
    pub const DOOR_LOOK_CLOSED: &str = "door.look_closed";
    pub const DOOR_LOOK_LOCKED: &str = "door.look_locked";
    pub const DOOR_OPENED: &str = "door.opened";
    pub const DOOR_CLOSED: &str = "door.closed";
    pub const DOOR_UNLOCKED: &str = "door.unlocked";
    pub const DOOR_UNLOCKED_AND_OPENED: &str = "door.unlocked_and_opened";
    pub const DOOR_LOCKED: &str = "door.locked";
    pub const DOOR_ENTERED: &str = "door.entered";
    pub const DOOR_PUSH_RESISTS: &str = "door.push_resists";
    pub const DOOR_PULL_NOTHING: &str = "door.pull_nothing";
    pub const DOOR_ALREADY_OPEN: &str = "door.already_open";
    pub const DOOR_ALREADY_CLOSED: &str = "door.already_closed";
    pub const DOOR_IS_LOCKED: &str = "door.is_locked";
    pub const DOOR_WRONG_KEY: &str = "door.wrong_key";
    pub const DOOR_NOT_LOCKED: &str = "door.not_locked";
    pub const DOOR_MUST_BE_CLOSED: &str = "door.must_be_closed";
    pub const DOOR_ALREADY_LOCKED: &str = "door.already_locked";
    pub const DOOR_IS_CLOSED: &str = "door.is_closed";
    pub const DOOR_NO_EXIT: &str = "door.no_exit";

    pub const KEY_LOOK: &str = "key.look";
    pub const KEY_LOOK_HELD: &str = "key.look_held";
    pub const KEY_LOOK_CONCEALED: &str = "key.look_concealed";
    pub const KEY_TAKEN: &str = "key.taken";
    pub const KEY_NOT_ON_GROUND: &str = "key.not_on_ground";

    pub const TABLE_LOOK: &str = "table.look";
    pub const TABLE_LOOK_WOBBLY: &str = "table.look_wobbly";
    pub const TABLE_LOOK_WITH_ITEMS: &str = "table.look_with_items";
    pub const TABLE_PUSHED: &str = "table.pushed";
    pub const TABLE_PULLED: &str = "table.pulled";
    pub const TABLE_MOVED_REVEALING: &str = "table.moved_revealing";
    pub const TABLE_ALREADY_MOVED: &str = "table.already_moved";

    pub const ACTION_UNSUPPORTED: &str = "action.unsupported";
    pub const ACTION_CANNOT_COMBINE: &str = "action.cannot_combine";
    pub const ACTION_NOT_INTERACTIVE: &str = "action.not_interactive";
    pub const ITEM_NOT_HELD: &str = "item.not_held";
    pub const TARGET_NOT_FOUND: &str = "target.not_found";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_keep_insertion_order() {
        let message = Message::new(keys::TABLE_LOOK_WITH_ITEMS)
            .with_param("object.cup")
            .with_params(["object.key", "object.book"]);
        assert_eq!(message.key(), "table.look_with_items");
        assert_eq!(message.params(), &["object.cup", "object.key", "object.book"]);
    }
}
