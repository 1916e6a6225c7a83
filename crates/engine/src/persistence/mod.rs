mod atomic_io;
mod snapshot;

pub use snapshot::{
    load_snapshot, parse_snapshot_json, save_snapshot, GameSnapshot, PersistenceError,
    SavedDoorState, SavedEntity, SavedEntityState, SavedVec2, SNAPSHOT_VERSION,
};
