use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use engine::Message;
use thiserror::Error;

pub(crate) const DEFAULT_LANGUAGE: &str = "en";

/// Tables compiled into the binary, by language code.
const EMBEDDED: [(&str, &str); 2] = [
    ("en", include_str!("../../assets/locale/en.json")),
    ("fr", include_str!("../../assets/locale/fr.json")),
];

#[derive(Debug, Error)]
pub(crate) enum LocaleError {
    #[error("read locale '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Parse(String),
    #[error("unknown language '{code}'; available: {available}")]
    UnknownLanguage { code: String, available: String },
}

pub(crate) fn available_languages() -> impl Iterator<Item = &'static str> {
    EMBEDDED.iter().map(|(code, _)| *code)
}

/// Message-key to template table. Templates use `{0}`, `{1}` for single
/// parameters and `{1..}` for "parameter 1 onward, comma separated".
#[derive(Debug, Clone)]
pub(crate) struct Locale {
    templates: HashMap<String, String>,
}

impl Locale {
    /// The built-in table for `code` (`en`, `fr`).
    pub(crate) fn embedded(code: &str) -> Result<Self, LocaleError> {
        let Some((_, raw)) = EMBEDDED
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(code))
        else {
            return Err(LocaleError::UnknownLanguage {
                code: code.to_string(),
                available: available_languages().collect::<Vec<_>>().join(", "),
            });
        };
        Self::from_json(raw)
    }

    pub(crate) fn load(path: &Path) -> Result<Self, LocaleError> {
        let raw = fs::read_to_string(path).map_err(|source| LocaleError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub(crate) fn from_json(raw: &str) -> Result<Self, LocaleError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        match serde_path_to_error::deserialize::<_, HashMap<String, String>>(&mut deserializer) {
            Ok(templates) => Ok(Self { templates }),
            Err(error) => {
                let path = error.path().to_string();
                let source = error.into_inner();
                if path.is_empty() || path == "." {
                    Err(LocaleError::Parse(format!("parse locale json: {source}")))
                } else {
                    Err(LocaleError::Parse(format!(
                        "parse locale json at {path}: {source}"
                    )))
                }
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.templates.len()
    }

    pub(crate) fn render(&self, message: &Message) -> String {
        let Some(template) = self.templates.get(message.key()) else {
            return format!("[{}]", message.key());
        };
        let params = message
            .params()
            .iter()
            .map(|param| self.param_text(param))
            .collect::<Vec<_>>();
        fill_template(template, &params)
    }

    fn param_text(&self, param: &str) -> String {
        match self.templates.get(param) {
            Some(text) => text.clone(),
            None if looks_like_key(param) => format!("[{param}]"),
            None => param.to_string(),
        }
    }
}

/// Dotted lowercase identifiers such as `object.key` are message keys; file
/// paths, numbers and free text pass through verbatim.
fn looks_like_key(value: &str) -> bool {
    value.contains('.')
        && value.starts_with(|ch: char| ch.is_ascii_lowercase())
        && value
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '.' | '_'))
}

fn fill_template(template: &str, params: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let placeholder = &after[..close];
        match expand_placeholder(placeholder, params) {
            Some(text) => out.push_str(&text),
            None => {
                out.push('{');
                out.push_str(placeholder);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

fn expand_placeholder(placeholder: &str, params: &[String]) -> Option<String> {
    if let Some(start) = placeholder.strip_suffix("..") {
        let start = start.parse::<usize>().ok()?;
        return Some(params.get(start..).unwrap_or_default().join(", "));
    }
    let index = placeholder.parse::<usize>().ok()?;
    Some(params.get(index).cloned().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use engine::keys;

    use super::*;

    #[test]
    fn embedded_table_parses_and_covers_core_keys() {
        let locale = Locale::embedded(DEFAULT_LANGUAGE).expect("embedded");
        assert!(locale.len() > 50);
        for key in [
            keys::DOOR_IS_LOCKED,
            keys::KEY_TAKEN,
            keys::TABLE_LOOK_WOBBLY,
            keys::TABLE_MOVED_REVEALING,
            keys::ACTION_UNSUPPORTED,
            keys::TARGET_NOT_FOUND,
        ] {
            assert!(
                !locale.render(&Message::new(key)).starts_with('['),
                "missing {key}"
            );
        }
    }

    #[test]
    fn embedded_tables_share_every_key() {
        let english = Locale::embedded("en").expect("en");
        for code in available_languages() {
            let other = Locale::embedded(code).expect("embedded");
            assert_eq!(other.len(), english.len(), "{code}");
            for key in english.templates.keys() {
                assert!(other.templates.contains_key(key), "{code} is missing {key}");
            }
        }
    }

    #[test]
    fn same_message_renders_per_language() {
        let message = Message::new(keys::TABLE_MOVED_REVEALING)
            .with_params(["object.table", "object.key"]);
        let english = Locale::embedded("en").expect("en");
        let french = Locale::embedded("FR").expect("fr");
        assert_eq!(
            english.render(&message),
            "You move the table, revealing the brass key."
        );
        assert_eq!(
            french.render(&message),
            "Vous déplacez la table et découvrez la clé en laiton."
        );
    }

    #[test]
    fn unknown_language_lists_available_codes() {
        let err = Locale::embedded("de").expect_err("no german");
        assert_eq!(err.to_string(), "unknown language 'de'; available: en, fr");
    }

    #[test]
    fn params_are_translated() {
        let locale = Locale::embedded(DEFAULT_LANGUAGE).expect("embedded");
        let text = locale.render(&Message::new(keys::DOOR_IS_LOCKED).with_param("object.door"));
        assert_eq!(text, "the oak door is locked.");
    }

    #[test]
    fn trailing_params_are_joined() {
        let locale = Locale::embedded(DEFAULT_LANGUAGE).expect("embedded");
        let message = Message::new(keys::TABLE_MOVED_REVEALING)
            .with_params(["object.table", "object.key", "object.iron_key"]);
        assert_eq!(
            locale.render(&message),
            "You move the table, revealing the brass key, the iron key."
        );

        let text = fill_template("{0}: {2..}/{9}", &["T".into(), "A".into()]);
        assert_eq!(text, "T: /");
    }

    #[test]
    fn missing_keys_render_bracketed() {
        let locale = Locale::from_json(r#"{"door.is_locked": "{0} is locked"}"#).expect("locale");
        let text = locale.render(&Message::new(keys::DOOR_IS_LOCKED).with_param("object.vault"));
        assert_eq!(text, "[object.vault] is locked");
        assert_eq!(locale.render(&Message::new(keys::KEY_TAKEN)), "[key.taken]");
    }

    #[test]
    fn non_key_params_pass_through() {
        let locale = Locale::from_json(r#"{"ui.saved": "Saved to {0}."}"#).expect("locale");
        let message = Message::new("ui.saved").with_param("/tmp/saves/slot.json");
        assert_eq!(locale.render(&message), "Saved to /tmp/saves/slot.json.");
        assert!(!looks_like_key("12.5"));
        assert!(!looks_like_key("door_001"));
        assert!(looks_like_key("object.key"));
    }

    #[test]
    fn parse_errors_carry_json_path() {
        let err = Locale::from_json(r#"{"door.opened": 7}"#).expect_err("bad value");
        assert!(err.to_string().contains("door.opened"), "{err}");
    }
}
