use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod content;
pub mod interaction;
pub mod persistence;
mod sprite_keys;
pub mod world;

pub use content::{
    default_script, load_or_default, load_script_file, parse_script, LoadedScript,
    MalformedScript, ScriptErrorCode, SourceLocation, DEFAULT_SCENE_ID,
};
pub use interaction::{
    keys, resolve, resolve_at, Action, ActionError, DiagnosticEvent, DiagnosticSink, Effect,
    IllegalAction, InteractionContext, Message, Outcome, RecordingSink, Rules, TracingSink,
    UseKeyRule, Verb, DEFAULT_TABLE_SHIFT_PX,
};
pub use persistence::{
    load_snapshot, parse_snapshot_json, save_snapshot, GameSnapshot, PersistenceError,
    SNAPSHOT_VERSION,
};
pub use sprite_keys::{SpriteKeyError, MAX_SPRITE_KEY_LEN};
pub use world::{
    DebugEntityInfo, Door, DoorState, Entity, EntityId, EntityKind, EntityState, Inventory,
    InventoryError, InventoryWindow, Key, KeyLocation, NotFound, Rect, RenderView, Scene,
    SceneManager, ScriptedRefusal, Table, Vec2, DEFAULT_INVENTORY_WINDOW_SLOTS,
};

pub const ROOT_ENV_VAR: &str = "ADVENTURE_ROOT";

#[derive(Debug, Clone)]
pub struct GamePaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub scripts_dir: PathBuf,
    pub saves_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("failed to create saves directory at {path}: {source}")]
    CreateSavesDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "ADVENTURE_ROOT is set but does not point to a valid game root: {path}\n\
A valid root must contain an assets/ directory or a Cargo.toml next to crates/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect the game root by walking upward from {start_dir}\n\
Expected a directory containing assets/ or Cargo.toml with crates/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/adventure\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_game_paths() -> Result<GamePaths, StartupError> {
    let root = resolve_root()?;
    game_paths_at(root)
}

/// Lays out the standard directories under `root`, creating the saves
/// directory if needed.
pub fn game_paths_at(root: PathBuf) -> Result<GamePaths, StartupError> {
    let assets_dir = root.join("assets");
    let scripts_dir = assets_dir.join("scripts");
    let saves_dir = root.join("saves");

    fs::create_dir_all(&saves_dir).map_err(|source| StartupError::CreateSavesDir {
        path: saves_dir.clone(),
        source,
    })?;

    Ok(GamePaths {
        root,
        assets_dir,
        scripts_dir,
        saves_dir,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(Path::new(&value));
            if is_root_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe.parent().map(Path::to_path_buf).unwrap_or_default();
            if let Some(root) = find_root_above(&exe_dir) {
                return Ok(root);
            }
            // `cargo run` from a checkout, or a binary copied elsewhere.
            let cwd = env::current_dir().map_err(StartupError::CurrentExe)?;
            find_root_above(&cwd).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_above(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_root_marker(candidate))
        .map(normalize_path)
}

fn is_root_marker(path: &Path) -> bool {
    let has_assets = path.join("assets").is_dir();
    let is_checkout = path.join("Cargo.toml").is_file() && path.join("crates").is_dir();
    has_assets || is_checkout
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
