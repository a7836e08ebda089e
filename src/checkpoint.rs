//! Checkpoint store
//!
//! Persists two durable artifacts inside the working directory:
//!
//! - `processed.txt` - an ordered, append-only list of processed version
//!   tokens; appended (never rewritten) so partial writes cannot corrupt
//!   prior entries.
//! - `hashes.txt` - the set of seen content hashes, rewritten wholesale per
//!   save. The rewrite is safe because it is the last step of a version's
//!   processing and only runs after all prior steps succeeded.

use crate::dedup::HashRegistry;
use crate::error::{Error, Result};
use crate::types::VersionToken;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Name of the processed-version list file
const PROCESSED_FILE: &str = "processed.txt";
/// Name of the seen-hash set file
const HASHES_FILE: &str = "hashes.txt";

/// File-backed checkpoint for incremental processing
///
/// Read at the start of a run to compute the resume point; mutated only at
/// the end of each successful per-version pipeline run. There is never a
/// concurrent writer, so no locking is needed.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Create a store rooted at the given directory (created if missing)
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Path of the processed-version list
    pub fn processed_path(&self) -> PathBuf {
        self.dir.join(PROCESSED_FILE)
    }

    /// Path of the hash-set file
    pub fn hashes_path(&self) -> PathBuf {
        self.dir.join(HASHES_FILE)
    }

    /// Load the ordered list of processed version tokens
    ///
    /// A missing file means nothing has been processed yet.
    pub fn load_processed(&self) -> Result<Vec<VersionToken>> {
        let path = self.processed_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(checkpoint_error(&path, e)),
        };

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(VersionToken::from)
            .collect())
    }

    /// Load the persisted hash set, preserving file order
    pub fn load_hashes(&self) -> Result<HashRegistry> {
        let path = self.hashes_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(HashRegistry::new());
            }
            Err(e) => return Err(checkpoint_error(&path, e)),
        };

        Ok(HashRegistry::from_lines(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        ))
    }

    /// Durably append a version token to the processed list
    ///
    /// Opens the file in append mode and syncs to disk, so prior entries are
    /// never rewritten and a crash mid-append cannot corrupt them.
    pub fn append_processed(&self, token: &VersionToken) -> Result<()> {
        let path = self.processed_path();
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| checkpoint_error(&path, e))?;

        writeln!(file, "{token}").map_err(|e| checkpoint_error(&path, e))?;
        file.sync_all().map_err(|e| checkpoint_error(&path, e))?;
        Ok(())
    }

    /// Rewrite the hash-set file from the registry, in first-seen order
    pub fn save_hashes(&self, registry: &HashRegistry) -> Result<()> {
        let path = self.hashes_path();
        let mut content = String::new();
        for digest in registry.iter() {
            content.push_str(digest);
            content.push('\n');
        }
        std::fs::write(&path, content).map_err(|e| checkpoint_error(&path, e))
    }
}

fn checkpoint_error(path: &Path, e: std::io::Error) -> Error {
    Error::Checkpoint {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn fresh_store_loads_empty_state() {
        let temp_dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(temp_dir.path().join("current")).unwrap();

        assert!(store.load_processed().unwrap().is_empty());
        assert!(store.load_hashes().unwrap().is_empty());
    }

    #[test]
    fn append_processed_is_ordered_and_monotonic() {
        let temp_dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(temp_dir.path()).unwrap();

        store.append_processed(&VersionToken::from("1.0")).unwrap();
        store.append_processed(&VersionToken::from("1.1")).unwrap();
        store.append_processed(&VersionToken::from("1.2")).unwrap();

        assert_eq!(
            store.load_processed().unwrap(),
            vec![
                VersionToken::from("1.0"),
                VersionToken::from("1.1"),
                VersionToken::from("1.2"),
            ]
        );

        // Appending never rewrites prior entries
        let raw = fs::read_to_string(store.processed_path()).unwrap();
        assert_eq!(raw, "1.0\n1.1\n1.2\n");
    }

    #[test]
    fn processed_list_survives_store_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = CheckpointStore::new(temp_dir.path()).unwrap();
            store.append_processed(&VersionToken::from("1.0")).unwrap();
        }
        let store = CheckpointStore::new(temp_dir.path()).unwrap();
        assert_eq!(
            store.load_processed().unwrap(),
            vec![VersionToken::from("1.0")]
        );
    }

    #[test]
    fn save_hashes_rewrites_in_first_seen_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(temp_dir.path()).unwrap();

        let registry = HashRegistry::from_lines(["zz", "aa", "mm"]);
        store.save_hashes(&registry).unwrap();

        let raw = fs::read_to_string(store.hashes_path()).unwrap();
        assert_eq!(raw, "zz\naa\nmm\n");

        let loaded = store.load_hashes().unwrap();
        let order: Vec<&str> = loaded.iter().collect();
        assert_eq!(order, vec!["zz", "aa", "mm"]);
    }

    #[test]
    fn save_hashes_replaces_previous_content_wholesale() {
        let temp_dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(temp_dir.path()).unwrap();

        store
            .save_hashes(&HashRegistry::from_lines(["old1", "old2"]))
            .unwrap();
        store.save_hashes(&HashRegistry::from_lines(["new1"])).unwrap();

        let raw = fs::read_to_string(store.hashes_path()).unwrap();
        assert_eq!(raw, "new1\n");
    }

    #[test]
    fn blank_lines_in_checkpoint_files_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(temp_dir.path()).unwrap();

        fs::write(store.processed_path(), "1.0\n\n1.1\n").unwrap();
        fs::write(store.hashes_path(), "\nabc\n\n").unwrap();

        assert_eq!(store.load_processed().unwrap().len(), 2);
        assert_eq!(store.load_hashes().unwrap().len(), 1);
    }
}
