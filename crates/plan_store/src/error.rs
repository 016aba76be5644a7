use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not a valid planner state file: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("task `{0}` not found")]
    TaskNotFound(String),

    #[error("task `{0}` already exists")]
    DuplicateTask(String),

    #[error("unable to watch state file: {0}")]
    Watch(#[from] notify::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
