//! Shared JSON persistence codec used by all four managers.
//!
//! Each manager owns exactly one document under the data directory and goes
//! through `read_document`/`write_document`. Reads distinguish a missing file
//! from a malformed one so callers can log which recovery they applied.
//! Writes go through an exclusively-locked temp file and an atomic rename so
//! a crash mid-save never leaves a truncated document behind.

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

use super::errors::StateError;

/// Create the data directory (and parents) if it does not exist.
pub async fn ensure_data_dir(data_dir: &Path) -> Result<(), StateError> {
    fs::create_dir_all(data_dir).await.map_err(|e| StateError::Io {
        path: data_dir.to_path_buf(),
        source: e,
    })
}

/// Read and deserialize one state document.
///
/// Returns `StateError::Missing` when the file does not exist and
/// `StateError::Malformed` when it exists but fails to parse. The empty-state
/// fallback lives in the managers' `load_or_reset`, not here.
pub async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, StateError> {
    match fs::read_to_string(path).await {
        Ok(data) => {
            // Guard against any accidental leading NULs
            let cleaned = data.trim_start_matches('\0');
            serde_json::from_str(cleaned).map_err(|e| StateError::Malformed {
                path: path.to_path_buf(),
                source: e,
            })
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(StateError::Missing(path.to_path_buf()))
        }
        Err(e) => Err(StateError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Serialize and write one state document atomically.
///
/// The destination is opened first to take an exclusive fs2 lock, the payload
/// goes to a unique temp file in the same directory, and the temp file is
/// renamed over the destination. Synchronous I/O is used for the locked
/// section since fs2 has no async API.
pub async fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<(), StateError> {
    let content = serde_json::to_string_pretty(value).map_err(|e| StateError::Malformed {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_atomic(path, &content).await
}

async fn write_atomic(path: &Path, content: &str) -> Result<(), StateError> {
    let path_buf = path.to_path_buf();
    let content = content.to_string();
    let result = tokio::task::spawn_blocking(move || write_atomic_sync(&path_buf, &content)).await;
    match result {
        Ok(inner) => inner,
        Err(join_err) => Err(StateError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(ErrorKind::Other, join_err),
        }),
    }
}

fn write_atomic_sync(path: &Path, content: &str) -> Result<(), StateError> {
    use std::fs::{self, OpenOptions};
    use std::io::Write;

    let io_err = |e: std::io::Error| StateError::Io {
        path: path.to_path_buf(),
        source: e,
    };

    // Open (or create) the destination to hold an exclusive lock for the
    // whole temp-write-and-rename sequence.
    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(path)
        .map_err(io_err)?;
    lock_file.lock_exclusive().map_err(io_err)?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("state.json");
    let tmp_path = dir.join(format!(".{}.tmp-{}", base, std::process::id()));

    let write_result = (|| {
        let mut tmp = fs::File::create(&tmp_path)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    let outcome = write_result.map_err(io_err);
    if outcome.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    let _ = lock_file.unlock();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Doc {
        entries: HashMap<String, i64>,
    }

    #[tokio::test]
    async fn missing_file_is_distinct_from_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        let err = read_document::<Doc>(&path).await.unwrap_err();
        assert!(err.is_missing());

        tokio::fs::write(&path, "{not json").await.unwrap();
        let err = read_document::<Doc>(&path).await.unwrap_err();
        assert!(matches!(err, StateError::Malformed { .. }));
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        let mut doc = Doc::default();
        doc.entries.insert("alpha".into(), 42);
        write_document(&path, &doc).await.unwrap();

        let loaded: Doc = read_document(&path).await.unwrap();
        assert_eq!(loaded, doc);
    }
}
