use std::fmt;

use crate::world::EntityId;

/// Action verbs offered by the verb bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Look,
    Take,
    Open,
    Close,
    Push,
    Pull,
    TalkTo,
    Give,
    Use,
    Unlock,
    Lock,
    Enter,
}

impl Verb {
    pub const ALL: [Verb; 12] = [
        Verb::Look,
        Verb::Take,
        Verb::Open,
        Verb::Close,
        Verb::Push,
        Verb::Pull,
        Verb::TalkTo,
        Verb::Give,
        Verb::Use,
        Verb::Unlock,
        Verb::Lock,
        Verb::Enter,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Self::Look => "look",
            Self::Take => "take",
            Self::Open => "open",
            Self::Close => "close",
            Self::Push => "push",
            Self::Pull => "pull",
            Self::TalkTo => "talk",
            Self::Give => "give",
            Self::Use => "use",
            Self::Unlock => "unlock",
            Self::Lock => "lock",
            Self::Enter => "enter",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|verb| verb.token().eq_ignore_ascii_case(token))
    }

    /// Message key naming the verb, passed as a substitution parameter.
    pub fn label_key(self) -> &'static str {
        match self {
            Self::Look => "verb.look",
            Self::Take => "verb.take",
            Self::Open => "verb.open",
            Self::Close => "verb.close",
            Self::Push => "verb.push",
            Self::Pull => "verb.pull",
            Self::TalkTo => "verb.talk",
            Self::Give => "verb.give",
            Self::Use => "verb.use",
            Self::Unlock => "verb.unlock",
            Self::Lock => "verb.lock",
            Self::Enter => "verb.enter",
        }
    }

    /// Verbs that need a held item in addition to the target.
    pub fn needs_item(self) -> bool {
        matches!(self, Self::Use | Self::Unlock)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Look,
    Take,
    Open,
    Close,
    Push,
    Pull,
    TalkTo,
    Give,
    Enter,
    /// "Use [item] on target".
    Use { item: EntityId },
    Unlock { key: EntityId },
    Lock,
}

impl Action {
    pub fn verb(&self) -> Verb {
        match self {
            Self::Look => Verb::Look,
            Self::Take => Verb::Take,
            Self::Open => Verb::Open,
            Self::Close => Verb::Close,
            Self::Push => Verb::Push,
            Self::Pull => Verb::Pull,
            Self::TalkTo => Verb::TalkTo,
            Self::Give => Verb::Give,
            Self::Enter => Verb::Enter,
            Self::Use { .. } => Verb::Use,
            Self::Unlock { .. } => Verb::Unlock,
            Self::Lock => Verb::Lock,
        }
    }

    /// Builds an action from a verb, filling in the held item for verbs that
    /// need one. Returns `None` when the item is missing or not expected.
    pub fn from_verb(verb: Verb, item: Option<EntityId>) -> Option<Self> {
        match (verb, item) {
            (Verb::Look, None) => Some(Self::Look),
            (Verb::Take, None) => Some(Self::Take),
            (Verb::Open, None) => Some(Self::Open),
            (Verb::Close, None) => Some(Self::Close),
            (Verb::Push, None) => Some(Self::Push),
            (Verb::Pull, None) => Some(Self::Pull),
            (Verb::TalkTo, None) => Some(Self::TalkTo),
            (Verb::Give, None) => Some(Self::Give),
            (Verb::Enter, None) => Some(Self::Enter),
            (Verb::Lock, None) => Some(Self::Lock),
            (Verb::Use, Some(item)) => Some(Self::Use { item }),
            (Verb::Unlock, Some(key)) => Some(Self::Unlock { key }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_tokens_are_unique_and_parse_back() {
        for verb in Verb::ALL {
            assert_eq!(Verb::from_token(verb.token()), Some(verb));
        }
        assert_eq!(Verb::from_token("PUSH"), Some(Verb::Push));
        assert_eq!(Verb::from_token("dance"), None);
    }

    #[test]
    fn from_verb_requires_item_only_where_needed() {
        for verb in Verb::ALL {
            let without = Action::from_verb(verb, None);
            let with = Action::from_verb(verb, Some(EntityId(4)));
            assert_eq!(without.is_some(), !verb.needs_item(), "verb={verb}");
            assert_eq!(with.is_some(), verb.needs_item(), "verb={verb}");
            if let Some(action) = without.or(with) {
                assert_eq!(action.verb(), verb);
            }
        }
    }
}
