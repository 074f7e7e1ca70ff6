//! Filesystem destination folders
//!
//! A [`FolderStore`] root stands in for the remote drive: every
//! [`FolderRef`] names a directory directly below it. Uploads are staged in a
//! hidden sibling directory and swapped into place with a rename, so a
//! folder never holds half of a batch.
//!
//! Each delivered folder is owned by one batch. The owner's id is kept in
//! `<root>/.claims/<folder>`, outside the folder itself, and an upload from
//! any other batch is refused while the folder exists.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use deck_core::{
    AccessError, Discrepancy, FolderInspector, FolderLink, FolderRef, Manifest, RemoteEntry,
    UploadBatch, UploadError, Uploader, VerificationResult,
};
use deck_verify::Verifier;
use tracing::{debug, info, warn};

use crate::{Result, StorageError};

const CLAIMS_DIR: &str = ".claims";

#[derive(Debug, Clone)]
pub struct FolderStore {
    root: PathBuf,
}

impl FolderStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory backing a folder reference
    pub fn folder_path(&self, folder: &FolderRef) -> Result<PathBuf> {
        let name = folder.as_str();
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
            || name.contains('\0')
        {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    pub fn link_for(&self, folder: &FolderRef) -> Result<FolderLink> {
        let path = self.folder_path(folder)?;
        let absolute = std::path::absolute(&path).unwrap_or(path);
        Ok(FolderLink(format!("file://{}", absolute.display())))
    }

    /// Batch that owns `folder`, if any batch has delivered there
    pub async fn owner_of(&self, folder: &FolderRef) -> Result<Option<String>> {
        let path = self.claim_path(folder)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(owner) => Ok(Some(owner.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn claim_path(&self, folder: &FolderRef) -> Result<PathBuf> {
        self.folder_path(folder)?;
        Ok(self.root.join(CLAIMS_DIR).join(folder.as_str()))
    }

    /// Take ownership of `folder` for `batch_id`, refusing folders that
    /// exist on behalf of another batch or of nobody known
    async fn claim(&self, folder: &FolderRef, batch_id: &str, destination: &Path) -> Result<()> {
        if tokio::fs::try_exists(destination).await? {
            match self.owner_of(folder).await? {
                Some(owner) if owner == batch_id => return Ok(()),
                owner => {
                    return Err(StorageError::FolderClaimed {
                        folder: folder.to_string(),
                        owner: owner.unwrap_or_else(|| "unknown".to_string()),
                    });
                }
            }
        }

        let path = self.claim_path(folder)?;
        let dir = self.root.join(CLAIMS_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        let tmp = dir.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, batch_id).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn transfer(&self, batch: &UploadBatch, destination: &Path) -> std::io::Result<()> {
        let staging = self
            .root
            .join(format!(".staging-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir(&staging).await?;

        if let Err(e) = fill_staging(batch, &staging).await {
            let _ = tokio::fs::remove_dir_all(&staging).await;
            return Err(e);
        }

        // Swap the previous delivery out before moving the new one in
        let retired = if tokio::fs::try_exists(destination).await? {
            let retired = self
                .root
                .join(format!(".retired-{}", uuid::Uuid::new_v4()));
            tokio::fs::rename(destination, &retired).await?;
            Some(retired)
        } else {
            None
        };

        if let Err(e) = tokio::fs::rename(&staging, destination).await {
            if let Some(retired) = &retired {
                let _ = tokio::fs::rename(retired, destination).await;
            }
            let _ = tokio::fs::remove_dir_all(&staging).await;
            return Err(e);
        }

        if let Some(retired) = retired
            && let Err(e) = tokio::fs::remove_dir_all(&retired).await
        {
            warn!("Could not remove retired delivery {}: {}", retired.display(), e);
        }

        Ok(())
    }
}

async fn fill_staging(batch: &UploadBatch, staging: &Path) -> std::io::Result<()> {
    for artifact in batch.artifacts() {
        tokio::fs::copy(&artifact.path, staging.join(artifact.file_name()))
            .await
            .map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!("copying {}: {}", artifact.path.display(), e),
                )
            })?;
    }

    let manifest = batch
        .manifest()
        .to_bytes()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    tokio::fs::write(staging.join(Manifest::FILE_NAME), manifest).await
}

/// Write the local copy of a manifest next to the rendered artifacts
pub async fn write_manifest(dir: &Path, manifest: &Manifest) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(Manifest::FILE_NAME);
    let bytes = manifest.to_bytes().map_err(|e| anyhow::anyhow!(e))?;
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

#[async_trait]
impl Uploader for FolderStore {
    async fn upload(
        &self,
        batch: &UploadBatch,
        folder: &FolderRef,
        feedback: &[Discrepancy],
    ) -> std::result::Result<FolderLink, UploadError> {
        if !feedback.is_empty() {
            info!(
                "Re-transmitting {} after {} discrepancies",
                folder,
                feedback.len()
            );
            for discrepancy in feedback {
                debug!("  {}", discrepancy);
            }
        }

        let destination = self
            .folder_path(folder)
            .map_err(|e| UploadError(e.to_string()))?;

        self.claim(folder, batch.batch_id(), &destination)
            .await
            .map_err(|e| UploadError(e.to_string()))?;

        self.transfer(batch, &destination)
            .await
            .map_err(|e| UploadError(format!("{}: {}", destination.display(), e)))?;

        info!(
            "Uploaded {} artifacts + manifest to {}",
            batch.artifacts().len(),
            destination.display()
        );

        self.link_for(folder).map_err(|e| UploadError(e.to_string()))
    }

    async fn self_check(&self, folder: &FolderRef, expected_count: u32) -> VerificationResult {
        Verifier::new(Arc::new(self.clone()))
            .verify(folder, expected_count)
            .await
    }
}

#[async_trait]
impl FolderInspector for FolderStore {
    async fn list(&self, folder: &FolderRef) -> std::result::Result<Vec<RemoteEntry>, AccessError> {
        let path = self
            .folder_path(folder)
            .map_err(|e| AccessError::new(folder.as_str(), e.to_string()))?;

        let access = |e: std::io::Error| AccessError::new(folder.as_str(), e.to_string());

        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&path).await.map_err(access)?;
        while let Some(entry) = dir.next_entry().await.map_err(access)? {
            let metadata = entry.metadata().await.map_err(access)?;
            entries.push(RemoteEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir: metadata.is_dir(),
                size_bytes: metadata.len(),
            });
        }

        Ok(entries)
    }

    async fn read(&self, folder: &FolderRef, name: &str) -> std::result::Result<Vec<u8>, AccessError> {
        let path = self
            .folder_path(folder)
            .map_err(|e| AccessError::new(folder.as_str(), e.to_string()))?;

        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            return Err(AccessError::new(
                folder.as_str(),
                format!("invalid file name {}", name),
            ));
        }

        tokio::fs::read(path.join(name))
            .await
            .map_err(|e| AccessError::new(folder.as_str(), format!("{}: {}", name, e)))
    }
}
