use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Artifact, Error, Manifest, Result};

/// Opaque identifier of a destination folder
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderRef(pub String);

impl FolderRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Link to a delivered folder, handed back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderLink(pub String);

impl fmt::Display for FolderLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of a destination folder listing.
///
/// Remote stores may hold several entries with the same name, so a listing
/// is a plain list rather than a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub size_bytes: u64,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size_bytes,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size_bytes: 0,
        }
    }
}

/// Every artifact of a batch plus its manifest, transferred in one call
#[derive(Debug, Clone)]
pub struct UploadBatch {
    batch_id: String,
    artifacts: Vec<Artifact>,
    manifest: Manifest,
}

impl UploadBatch {
    pub fn new(
        batch_id: impl Into<String>,
        mut artifacts: Vec<Artifact>,
        manifest: Manifest,
    ) -> Result<Self> {
        artifacts.sort_by_key(|a| a.ordinal);

        let ordinals: Vec<u32> = artifacts.iter().map(|a| a.ordinal).collect();
        if ordinals != manifest.ordinals {
            return Err(Error::InvalidBatch(format!(
                "artifact ordinals {:?} do not match manifest ordinals {:?}",
                ordinals, manifest.ordinals
            )));
        }

        Ok(Self {
            batch_id: batch_id.into(),
            artifacts,
            manifest,
        })
    }

    /// Batch that owns the destination folder
    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn slide_count(&self) -> u32 {
        self.manifest.slide_count()
    }
}
