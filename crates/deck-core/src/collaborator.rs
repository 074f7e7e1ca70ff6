//! Collaborator traits
//!
//! Each external service the publisher talks to sits behind one of these
//! traits with a fixed, typed contract.

use async_trait::async_trait;

use crate::{
    AccessError, Approval, Artifact, BatchPlan, ContentUnit, Discrepancy, FolderLink, FolderRef,
    NotifyError, RemoteEntry, RenderError, UploadBatch, UploadError, VerificationResult,
};

/// Turns an approved content unit into a slide image
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, unit: &ContentUnit) -> Result<Artifact, RenderError>;
}

/// Transfers a whole batch to a destination folder
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload every artifact and the manifest in one call.
    ///
    /// `feedback` carries the discrepancies of the previous failed attempt
    /// (empty on the first attempt).
    async fn upload(
        &self,
        batch: &UploadBatch,
        folder: &FolderRef,
        feedback: &[Discrepancy],
    ) -> Result<FolderLink, UploadError>;

    /// Uploader-side verification of its own delivery
    async fn self_check(&self, folder: &FolderRef, expected_count: u32) -> VerificationResult;
}

/// Read-only view of a destination folder
#[async_trait]
pub trait FolderInspector: Send + Sync {
    /// Entries at the folder root
    async fn list(&self, folder: &FolderRef) -> Result<Vec<RemoteEntry>, AccessError>;

    /// Contents of one file at the folder root
    async fn read(&self, folder: &FolderRef, name: &str) -> Result<Vec<u8>, AccessError>;
}

/// Sends the completion message
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipients: &[String], subject: &str, body: &str)
    -> Result<(), NotifyError>;
}

/// Human review gate between content approval and rendering
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    async fn request_approval(&self, plan: &BatchPlan) -> Approval;
}
