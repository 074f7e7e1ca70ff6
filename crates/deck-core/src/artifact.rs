use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// File extension every rendered slide carries
pub const ARTIFACT_EXTENSION: &str = "png";

/// Deterministic artifact file name for an ordinal
pub fn artifact_file_name(ordinal: u32) -> String {
    format!("slide_{}.{}", ordinal, ARTIFACT_EXTENSION)
}

/// A rendered slide image, 1:1 with a content unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub ordinal: u32,
    pub path: PathBuf,
}

impl Artifact {
    pub fn new(ordinal: u32, path: impl Into<PathBuf>) -> Self {
        Self {
            ordinal,
            path: path.into(),
        }
    }

    /// Name the artifact gets in the destination folder
    pub fn file_name(&self) -> String {
        artifact_file_name(self.ordinal)
    }
}
