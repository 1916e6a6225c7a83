use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Writes `text` next to `path` first and renames it into place, so a crash
/// mid-write never leaves a truncated save behind.
pub(crate) fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let staging = staging_path_for(path);
    let written = File::create(&staging).and_then(|mut file| {
        file.write_all(text.as_bytes())?;
        file.sync_all()
    });
    if let Err(error) = written.and_then(|()| replace(&staging, path)) {
        let _ = fs::remove_file(&staging);
        return Err(error);
    }
    Ok(())
}

fn replace(staging: &Path, path: &Path) -> io::Result<()> {
    // rename() refuses to overwrite on some platforms.
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => return Err(error),
    }
    fs::rename(staging, path)
}

fn staging_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("snapshot");
    path.with_file_name(format!(".{file_name}.{}.partial", std::process::id()))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn overwrites_and_leaves_no_staging_file() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("saves").join("slot.json");
        write_text_atomic(&path, "first").expect("first");
        write_text_atomic(&path, "second").expect("second");
        assert_eq!(fs::read_to_string(&path).expect("read"), "second");

        let leftovers = fs::read_dir(path.parent().expect("parent"))
            .expect("dir")
            .count();
        assert_eq!(leftovers, 1);
    }
}
