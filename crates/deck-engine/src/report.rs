use deck_core::FolderLink;
use serde::Serialize;

use crate::record::{AttemptFailure, BatchRecord, Event, Stage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Delivered {
        link: FolderLink,
        #[serde(skip_serializing_if = "Option::is_none")]
        notify_warning: Option<String>,
    },
    Failed {
        reason: String,
    },
    Rejected {
        reason: String,
    },
    /// Paused at the review gate; resume once a decision exists
    AwaitingApproval,
}

/// What the caller gets back from a publish run
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub outcome: Outcome,
    pub record: BatchRecord,
}

impl PublishReport {
    pub(crate) fn from_record(record: BatchRecord) -> Self {
        let outcome = match record.stage {
            Stage::Done => match &record.link {
                Some(link) => Outcome::Delivered {
                    link: link.clone(),
                    notify_warning: record.notify_warning.clone(),
                },
                None => Outcome::Failed {
                    reason: "delivered without a folder link".to_string(),
                },
            },
            Stage::Rejected => Outcome::Rejected {
                reason: record.failure.clone().unwrap_or_default(),
            },
            Stage::AwaitingApproval => Outcome::AwaitingApproval,
            _ => Outcome::Failed {
                reason: record
                    .failure
                    .clone()
                    .unwrap_or_else(|| format!("stopped at {}", record.stage)),
            },
        };

        Self { outcome, record }
    }

    pub fn batch_id(&self) -> &str {
        self.record.batch_id()
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self.outcome, Outcome::Delivered { .. })
    }

    /// Upload attempts consumed
    pub fn attempts(&self) -> u32 {
        self.record.retry.attempts
    }

    pub fn history(&self) -> &[AttemptFailure] {
        &self.record.history
    }

    pub fn trace(&self) -> &[Event] {
        &self.record.trace
    }

    pub fn notify_count(&self) -> usize {
        self.record
            .trace
            .iter()
            .filter(|e| matches!(e, Event::Notified { .. }))
            .count()
    }
}
