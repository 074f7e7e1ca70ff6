//! Batch record: the whole state of one publish run
//!
//! The record is a plain value. Every controller transition takes it and
//! hands back the updated copy, and it serializes so a paused run can be
//! persisted and resumed later.

use std::fmt;

use deck_core::{
    Artifact, BatchPlan, Discrepancy, FolderLink, FolderRef, RetryState, UploadError,
    VerificationResult,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AwaitingApproval,
    RenderPending,
    UploadPending,
    #[serde(rename = "verify_1")]
    Verify1,
    #[serde(rename = "verify_2")]
    Verify2,
    Notify,
    Done,
    Failed,
    Rejected,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed | Stage::Rejected)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::AwaitingApproval => "awaiting_approval",
            Stage::RenderPending => "render_pending",
            Stage::UploadPending => "upload_pending",
            Stage::Verify1 => "verify_1",
            Stage::Verify2 => "verify_2",
            Stage::Notify => "notify",
            Stage::Done => "done",
            Stage::Failed => "failed",
            Stage::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Ordered log of what the controller did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    ApprovalRequested,
    Approved,
    Rejected { reason: String },
    Rendered { ordinal: u32 },
    RenderFailed { ordinal: u32 },
    UploadRequested { attempt: u32 },
    UploadFailed { attempt: u32 },
    #[serde(rename = "verify_1")]
    Verify1 { attempt: u32, ok: bool },
    #[serde(rename = "verify_2")]
    Verify2 { attempt: u32, ok: bool },
    /// Written before the notifier is called
    NotifyRequested,
    Notified { ok: bool },
}

/// Why one upload attempt did not lead to a verified delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum AttemptFailure {
    Transport {
        attempt: u32,
        error: UploadError,
    },
    #[serde(rename = "verify_1")]
    Verify1 {
        attempt: u32,
        result: VerificationResult,
    },
    #[serde(rename = "verify_2")]
    Verify2 {
        attempt: u32,
        result: VerificationResult,
    },
}

impl AttemptFailure {
    pub fn attempt(&self) -> u32 {
        match self {
            AttemptFailure::Transport { attempt, .. }
            | AttemptFailure::Verify1 { attempt, .. }
            | AttemptFailure::Verify2 { attempt, .. } => *attempt,
        }
    }

    /// Discrepancies handed to the uploader on the next attempt
    pub fn discrepancies(&self) -> &[Discrepancy] {
        match self {
            AttemptFailure::Transport { .. } => &[],
            AttemptFailure::Verify1 { result, .. } | AttemptFailure::Verify2 { result, .. } => {
                &result.discrepancies
            }
        }
    }

    /// Folder could not be reached, as opposed to wrong content
    pub fn is_access_failure(&self) -> bool {
        match self {
            AttemptFailure::Transport { .. } => false,
            AttemptFailure::Verify1 { result, .. } | AttemptFailure::Verify2 { result, .. } => {
                result.is_access_failure()
            }
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Transport { attempt, error } => {
                write!(f, "attempt {}: {}", attempt, error)
            }
            AttemptFailure::Verify1 { attempt, result } => write!(
                f,
                "attempt {}: uploader verification failed: {}",
                attempt,
                result.messages().join("; ")
            ),
            AttemptFailure::Verify2 { attempt, result } => write!(
                f,
                "attempt {}: independent verification failed: {}",
                attempt,
                result.messages().join("; ")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub plan: BatchPlan,
    pub folder: FolderRef,
    pub stage: Stage,
    pub retry: RetryState,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<FolderLink>,
    #[serde(default)]
    pub history: Vec<AttemptFailure>,
    #[serde(default)]
    pub trace: Vec<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_warning: Option<String>,
    /// Terminal failure or rejection reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl BatchRecord {
    pub fn new(plan: BatchPlan, folder: FolderRef, max_attempts: u32, require_approval: bool) -> Self {
        Self {
            plan,
            folder,
            stage: if require_approval {
                Stage::AwaitingApproval
            } else {
                Stage::RenderPending
            },
            retry: RetryState::new(max_attempts),
            artifacts: Vec::new(),
            link: None,
            history: Vec::new(),
            trace: Vec::new(),
            notify_warning: None,
            failure: None,
        }
    }

    pub fn batch_id(&self) -> &str {
        &self.plan.batch_id
    }

    pub(crate) fn enter(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub(crate) fn log(mut self, event: Event) -> Self {
        self.trace.push(event);
        self
    }

    pub(crate) fn fail(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self.stage = Stage::Failed;
        self
    }
}
