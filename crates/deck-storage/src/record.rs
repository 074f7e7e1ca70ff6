//! Batch record persistence
//!
//! Records are JSON documents under `<root>/.records/<batch_id>.json`,
//! written through a temp file and a rename.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Result, StorageError};

pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn new(root: &Path) -> Result<Self> {
        let dir = root.join(".records");
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(StorageError::InvalidName(id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    pub async fn save<T: Serialize>(&self, id: &str, record: &T) -> Result<PathBuf> {
        let path = self.path_for(id)?;
        let tmp = path.with_extension("json.tmp");

        let content = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;

        Ok(path)
    }

    pub async fn load<T: DeserializeOwned>(&self, id: &str) -> Result<T> {
        let path = self.path_for(id)?;
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::RecordNotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&content)?)
    }

    /// Ids of all stored records, sorted
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(id) = name.strip_suffix(".json") {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::RecordNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
