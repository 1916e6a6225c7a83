mod compiler;
mod default_scene;
mod hashing;

pub use compiler::{
    load_or_default, load_script_file, parse_script, LoadedScript, MalformedScript,
    ScriptErrorCode, SourceLocation,
};
pub use default_scene::{default_script, DEFAULT_SCENE_ID};
