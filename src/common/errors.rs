use std::path::PathBuf;

/// Typed errors for reclaim operations.
/// The binary uses `anyhow` at the top level, but the library reports
/// precise failures so callers can tell fatal input errors from I/O noise.
#[derive(Debug, thiserror::Error)]
pub enum ReclaimError {
    /// File system operation failed
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Concurrency must allow at least one task in flight
    #[error("Invalid concurrency {0}: must be at least 1")]
    InvalidConcurrency(usize),

    /// Category id does not name a registered scanner
    #[error("Unknown category '{0}'")]
    UnknownCategory(String),

    /// Scan options are malformed
    #[error("Invalid scan options: {0}")]
    InvalidOptions(String),

    /// Configuration file is invalid
    #[error("Config error in '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// Path must never be deleted
    #[error("Refusing to touch protected path: '{}'", path.display())]
    Protected { path: PathBuf },
}

impl ReclaimError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReclaimError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReclaimError>;
