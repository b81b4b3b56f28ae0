//! Temporary sequence files for blackbox tests.
//!
//! ```
//! use sqlstress_test::sequences::SequenceFile;
//!
//! let file = SequenceFile::new(serde_json::json!([
//!     { "sequence": ["INSERT INTO t VALUES (1)"], "weight": 1 }
//! ]));
//! assert!(file.path().exists());
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A sequence file in a temporary directory, deleted when dropped.
#[derive(Debug)]
pub struct SequenceFile {
    path: PathBuf,
    _tempdir: TempDir,
}

impl SequenceFile {
    /// Writes `entries` as JSON to a fresh `queries.json`.
    pub fn new(entries: serde_json::Value) -> Self {
        Self::with_contents(&serde_json::to_string_pretty(&entries).unwrap())
    }

    /// Writes raw `contents` to a fresh `queries.json`, which need not be valid.
    pub fn with_contents(contents: &str) -> Self {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("queries.json");
        fs::write(&path, contents).unwrap();

        Self {
            path,
            _tempdir: tempdir,
        }
    }

    /// Points to a `queries.json` that does not exist.
    pub fn missing() -> Self {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("queries.json");

        Self {
            path,
            _tempdir: tempdir,
        }
    }

    /// Returns the path of the sequence file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
