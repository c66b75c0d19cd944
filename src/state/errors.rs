use std::path::PathBuf;
use thiserror::Error;

/// Errors that can arise while loading or saving a manager's state document.
///
/// Manager *operations* never produce these: validation rejections and
/// precondition failures are reported through their return values. Only the
/// persistence edge is fallible.
#[derive(Debug, Error)]
pub enum StateError {
    /// The document does not exist yet. First run, or the file was removed.
    #[error("state file not found: {0}")]
    Missing(PathBuf),

    /// The document exists but is not valid JSON for the expected schema.
    #[error("malformed state file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Any other filesystem failure (permissions, disk full, rename).
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StateError {
    /// True when the failure is the benign missing-file case.
    pub fn is_missing(&self) -> bool {
        matches!(self, StateError::Missing(_))
    }
}
