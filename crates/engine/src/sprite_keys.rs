use thiserror::Error;

pub const MAX_SPRITE_KEY_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key is longer than {MAX_SPRITE_KEY_LEN} characters")]
    TooLong,
    #[error("sprite key must be relative and must not contain empty segments")]
    EmptySegment,
    #[error("sprite key must not contain '..'")]
    ParentTraversal,
    #[error("sprite key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Sprite keys name art assets relative to the asset root, e.g.
/// `props/oak_table`. Only lowercase ASCII, digits, `_`, `-` and `/` are
/// accepted.
pub(crate) fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    if key.len() > MAX_SPRITE_KEY_LEN {
        return Err(SpriteKeyError::TooLong);
    }
    if key.contains("..") {
        return Err(SpriteKeyError::ParentTraversal);
    }
    if let Some(character) = key
        .chars()
        .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-')))
    {
        return Err(SpriteKeyError::InvalidCharacter { character });
    }
    if key.split('/').any(str::is_empty) {
        return Err(SpriteKeyError::EmptySegment);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_asset_paths() {
        for key in ["door", "props/oak_table", "items/key-brass_2"] {
            assert!(validate_sprite_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_bad_keys() {
        assert_eq!(validate_sprite_key(""), Err(SpriteKeyError::Empty));
        assert_eq!(validate_sprite_key("/door"), Err(SpriteKeyError::EmptySegment));
        assert_eq!(validate_sprite_key("props//table"), Err(SpriteKeyError::EmptySegment));
        assert_eq!(validate_sprite_key("../up"), Err(SpriteKeyError::ParentTraversal));
        assert_eq!(
            validate_sprite_key("Door.png"),
            Err(SpriteKeyError::InvalidCharacter { character: 'D' })
        );
        assert_eq!(
            validate_sprite_key(&"a".repeat(MAX_SPRITE_KEY_LEN + 1)),
            Err(SpriteKeyError::TooLong)
        );
    }
}
