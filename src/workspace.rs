use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Creates every configured directory that does not exist yet and returns the
/// ones that were created.
pub fn ensure_directories(dirs: &BTreeMap<String, PathBuf>) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    for (name, path) in dirs {
        if path.is_dir() {
            continue;
        }
        fs::create_dir_all(path).with_context(|| {
            format!("Failed to create directory '{}' ({name})", path.display())
        })?;
        debug!(name = %name, path = %path.display(), "created directory");
        created.push(path.clone());
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;

    use super::ensure_directories;

    #[test]
    fn creates_missing_directories_once() {
        let root = tempfile::tempdir().expect("temp dir");
        let dirs = BTreeMap::from([
            ("input_dir".to_string(), root.path().join("chat/input")),
            ("logs_dir".to_string(), root.path().join("chat/logs")),
        ]);

        let created = ensure_directories(&dirs).expect("first pass should succeed");
        assert_eq!(created.len(), 2);
        assert!(root.path().join("chat/input").is_dir());
        assert!(root.path().join("chat/logs").is_dir());

        let again = ensure_directories(&dirs).expect("second pass should succeed");
        assert!(again.is_empty());
    }

    #[test]
    fn fails_when_a_file_is_in_the_way() {
        let root = tempfile::tempdir().expect("temp dir");
        let blocker = root.path().join("blocker");
        fs::write(&blocker, "x").expect("write blocker");
        let dirs = BTreeMap::from([("logs_dir".to_string(), blocker.join("logs"))]);

        let err = ensure_directories(&dirs).expect_err("should fail");
        assert!(format!("{err:#}").contains("logs_dir"));
    }
}
