use std::path::{Path, PathBuf};

use engine::{
    load_or_default, resolve_game_paths, GamePaths, NotFound, Rules, StartupError, UseKeyRule,
};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::locale::{Locale, LocaleError, DEFAULT_LANGUAGE};
use super::session::Session;

const SCRIPT_ENV_VAR: &str = "ADVENTURE_SCRIPT";
const USE_KEY_OPENS_ENV_VAR: &str = "ADVENTURE_USE_KEY_OPENS";
const LOCALE_FILE_ENV_VAR: &str = "ADVENTURE_LOCALE_FILE";
const LANGUAGE_ENV_VAR: &str = "ADVENTURE_LANG";
const DEFAULT_SCRIPT_FILE: &str = "hall.xml";
const SAVE_FILE: &str = "slot_1.json";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("script start scene is missing: {0}")]
    StartScene(#[from] NotFound),
    #[error("embedded locale is unusable: {0}")]
    Locale(#[from] LocaleError),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GameConfig {
    pub(crate) script_path: PathBuf,
    pub(crate) save_path: PathBuf,
    pub(crate) locale_file: Option<PathBuf>,
    pub(crate) language: String,
    pub(crate) rules: Rules,
}

impl GameConfig {
    /// Builds the config from `lookup`, which stands in for the process
    /// environment. Relative paths resolve against the game root.
    pub(crate) fn from_lookup(paths: &GamePaths, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let script_path = lookup(SCRIPT_ENV_VAR)
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| under_root(&paths.root, raw.trim()))
            .unwrap_or_else(|| paths.scripts_dir.join(DEFAULT_SCRIPT_FILE));
        let locale_file = lookup(LOCALE_FILE_ENV_VAR)
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| under_root(&paths.root, raw.trim()));
        let language = lookup(LANGUAGE_ENV_VAR)
            .map(|raw| raw.trim().to_ascii_lowercase())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let use_key_rule = if lookup(USE_KEY_OPENS_ENV_VAR).is_some_and(|raw| parse_flag(&raw)) {
            UseKeyRule::UnlockAndOpen
        } else {
            UseKeyRule::UnlockOnly
        };

        Self {
            script_path,
            save_path: paths.saves_dir.join(SAVE_FILE),
            locale_file,
            language,
            rules: Rules {
                use_key_rule,
                ..Rules::default()
            },
        }
    }
}

pub(crate) struct AppWiring {
    pub(crate) session: Session,
    pub(crate) locale: Locale,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Adventure Startup ===");

    let paths = resolve_game_paths()?;
    let config = GameConfig::from_lookup(&paths, |var| std::env::var(var).ok());
    info!(
        root = %paths.root.display(),
        script = %config.script_path.display(),
        language = %config.language,
        use_key_rule = ?config.rules.use_key_rule,
        "config_resolved"
    );
    wire(config)
}

pub(crate) fn wire(config: GameConfig) -> Result<AppWiring, BootstrapError> {
    let script = load_or_default(Some(&config.script_path));
    let fingerprint = script.fingerprint.clone();
    let scenes = script.into_scene_manager()?;
    info!(
        scene_count = scenes.scenes().len(),
        active_scene = %scenes.active_id(),
        "scenes_ready"
    );

    let locale = match &config.locale_file {
        Some(path) => Locale::load(path).or_else(|error| {
            warn!(error = %error, "locale_load_failed_using_embedded");
            embedded_locale(&config.language)
        })?,
        None => embedded_locale(&config.language)?,
    };
    info!(entries = locale.len(), "locale_ready");

    Ok(AppWiring {
        session: Session::new(scenes, config.rules, fingerprint, config.save_path),
        locale,
    })
}

fn embedded_locale(language: &str) -> Result<Locale, LocaleError> {
    Locale::embedded(language).or_else(|error| {
        warn!(error = %error, "language_unknown_using_default");
        Locale::embedded(DEFAULT_LANGUAGE)
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn under_root(root: &Path, raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
