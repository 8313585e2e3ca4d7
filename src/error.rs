use std::path::PathBuf;

/// Fatal errors: anything here aborts the run before or between problems.
/// Shot-local failures live next to the traits that produce them.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    #[error("failed to load dataset {path}: {message}")]
    Dataset { path: PathBuf, message: String },

    #[error("run log I/O on {path}: {source}")]
    LogIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("run log {path} is corrupt: {source}")]
    LogCorrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to set up workspace: {0}")]
    Workspace(std::io::Error),
}
