//! Error types for deck-storage

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Folder {folder} belongs to batch {owner}")]
    FolderClaimed { folder: String, owner: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
