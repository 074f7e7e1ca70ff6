//! Core domain models for deck
//!
//! This crate contains:
//! - Batch models (ContentUnit, Artifact, Manifest, UploadBatch)
//! - Verification results and the retry budget
//! - Collaborator traits (render, upload, inspect, notify, approve)
//! - The error taxonomy shared by every stage

pub mod approval;
pub mod artifact;
pub mod batch;
pub mod collaborator;
pub mod error;
pub mod manifest;
pub mod retry;
pub mod unit;
pub mod verification;

pub use approval::Approval;
pub use artifact::{Artifact, artifact_file_name};
pub use batch::{FolderLink, FolderRef, RemoteEntry, UploadBatch};
pub use collaborator::{ApprovalGate, FolderInspector, Notifier, Renderer, Uploader};
pub use error::{AccessError, Error, NotifyError, RenderError, Result, UploadError};
pub use manifest::{Manifest, digest_bytes};
pub use retry::RetryState;
pub use unit::{BatchPlan, ContentUnit, SourceRef};
pub use verification::{Discrepancy, VerificationResult};
