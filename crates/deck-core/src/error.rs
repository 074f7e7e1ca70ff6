use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A content unit could not be turned into an artifact. Fatal for the batch.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Render failed for slide {ordinal}: {message}")]
pub struct RenderError {
    pub ordinal: u32,
    pub message: String,
}

impl RenderError {
    pub fn new(ordinal: u32, message: impl Into<String>) -> Self {
        Self {
            ordinal,
            message: message.into(),
        }
    }
}

/// Transport-level upload failure. Retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Upload failed: {0}")]
pub struct UploadError(pub String);

/// The destination folder could not be reached or read.
///
/// Kept apart from content mismatches so callers can re-authenticate
/// instead of re-uploading.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Folder {folder} is not accessible: {message}")]
pub struct AccessError {
    pub folder: String,
    pub message: String,
}

impl AccessError {
    pub fn new(folder: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            message: message.into(),
        }
    }
}

/// Notification failures never roll back a delivery.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyError {
    #[error("No recipients configured")]
    NoRecipients,

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}
