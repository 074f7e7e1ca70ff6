//! Publish controller
//!
//! Runs one batch through render → upload → uploader verification →
//! independent verification → notify. Both verification passes draw from
//! the same attempt budget, and the notifier is only reached from a
//! successful independent pass.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use deck_core::{
    AccessError, Approval, ApprovalGate, Artifact, BatchPlan, FolderRef, Manifest, Notifier,
    RenderError, Renderer, UploadBatch, UploadError, Uploader, VerificationResult,
};
use deck_notify::compose_delivery_message;
use deck_storage::RecordStore;
use deck_verify::Verifier;
use tracing::{debug, info, warn};

use crate::record::{AttemptFailure, BatchRecord, Event, Stage};
use crate::report::PublishReport;

#[derive(Debug, Clone)]
pub struct PublisherSettings {
    pub max_attempts: u32,
    pub render_timeout: Duration,
    pub upload_timeout: Duration,
    pub verify_timeout: Duration,
    pub notify_timeout: Duration,
    pub recipients: Vec<String>,
    pub require_approval: bool,
}

impl Default for PublisherSettings {
    fn default() -> Self {
        Self {
            max_attempts: deck_core::retry::DEFAULT_MAX_ATTEMPTS,
            render_timeout: Duration::from_secs(90),
            upload_timeout: Duration::from_secs(60),
            verify_timeout: Duration::from_secs(30),
            notify_timeout: Duration::from_secs(30),
            recipients: Vec::new(),
            require_approval: false,
        }
    }
}

pub struct Publisher {
    renderer: Arc<dyn Renderer>,
    uploader: Arc<dyn Uploader>,
    verifier: Verifier,
    notifier: Arc<dyn Notifier>,
    gate: Option<Arc<dyn ApprovalGate>>,
    records: Option<Arc<RecordStore>>,
    settings: PublisherSettings,
}

impl Publisher {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        uploader: Arc<dyn Uploader>,
        verifier: Verifier,
        notifier: Arc<dyn Notifier>,
        settings: PublisherSettings,
    ) -> Self {
        Self {
            renderer,
            uploader,
            verifier,
            notifier,
            gate: None,
            records: None,
            settings,
        }
    }

    /// Review gate consulted while a batch awaits approval
    pub fn with_gate(mut self, gate: Arc<dyn ApprovalGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Persist the batch record after every transition
    pub fn with_records(mut self, records: Arc<RecordStore>) -> Self {
        self.records = Some(records);
        self
    }

    pub fn settings(&self) -> &PublisherSettings {
        &self.settings
    }

    /// Fresh record for a plan, validated
    pub fn prepare(&self, plan: BatchPlan, folder: FolderRef) -> deck_core::Result<BatchRecord> {
        plan.validate()?;
        Ok(BatchRecord::new(
            plan,
            folder,
            self.settings.max_attempts,
            self.settings.require_approval,
        ))
    }

    pub async fn run(&self, plan: BatchPlan, folder: FolderRef) -> deck_core::Result<PublishReport> {
        let record = self.prepare(plan, folder)?;
        self.ensure_folder_free(&record).await?;
        info!(
            "Publishing batch {} ({} slides) to {}",
            record.batch_id(),
            record.plan.slide_count(),
            record.folder
        );
        Ok(self.resume(record).await)
    }

    /// Drive a record until it is terminal or waiting for a review decision
    pub async fn resume(&self, mut record: BatchRecord) -> PublishReport {
        if record.stage == Stage::Notify {
            if matches!(record.trace.last(), Some(Event::NotifyRequested)) {
                // The notifier may already have been reached; at most once
                warn!(
                    "Batch {}: stopped while notifying, not notifying again",
                    record.batch_id()
                );
                record.notify_warning =
                    Some("notification outcome unknown after restart; not repeated".to_string());
                record = record.enter(Stage::Done);
                self.persist(&record).await;
            } else {
                // A stored pass result is never trusted; re-check before notifying
                record = record.enter(Stage::Verify2);
            }
        }

        while !record.stage.is_terminal() {
            if record.stage == Stage::AwaitingApproval && self.gate.is_none() {
                info!("Batch {} is waiting for approval", record.batch_id());
                self.persist(&record).await;
                break;
            }

            let from = record.stage;
            record = self.step(record).await;
            debug!("Batch {}: {} -> {}", record.batch_id(), from, record.stage);
            self.persist(&record).await;
        }

        match record.stage {
            Stage::Done => info!("Batch {} delivered", record.batch_id()),
            Stage::Failed => warn!(
                "Batch {} failed: {}",
                record.batch_id(),
                record.failure.as_deref().unwrap_or("unknown")
            ),
            _ => {}
        }

        PublishReport::from_record(record)
    }

    /// Record a review decision for a batch awaiting approval
    pub fn apply_approval(&self, record: BatchRecord, approval: Approval) -> BatchRecord {
        if record.stage != Stage::AwaitingApproval {
            return record;
        }

        match approval {
            Approval::Approved => record.log(Event::Approved).enter(Stage::RenderPending),
            Approval::Rejected { reason } => {
                info!("Batch {} rejected: {}", record.batch_id(), reason);
                let mut record = record
                    .log(Event::Rejected {
                        reason: reason.clone(),
                    })
                    .enter(Stage::Rejected);
                record.failure = Some(reason);
                record
            }
        }
    }

    async fn step(&self, record: BatchRecord) -> BatchRecord {
        match record.stage {
            Stage::AwaitingApproval => self.await_approval(record).await,
            Stage::RenderPending => self.render(record).await,
            Stage::UploadPending => self.upload(record).await,
            Stage::Verify1 => self.verify_uploader_side(record).await,
            Stage::Verify2 => self.verify_independently(record).await,
            Stage::Notify => self.notify(record).await,
            Stage::Done | Stage::Failed | Stage::Rejected => record,
        }
    }

    async fn await_approval(&self, record: BatchRecord) -> BatchRecord {
        let Some(gate) = &self.gate else {
            return record;
        };

        let record = record.log(Event::ApprovalRequested);
        // No timeout: the review may take as long as it takes
        let approval = gate.request_approval(&record.plan).await;
        self.apply_approval(record, approval)
    }

    async fn render(&self, mut record: BatchRecord) -> BatchRecord {
        let units: Vec<_> = record.plan.ordered_units().into_iter().cloned().collect();
        let mut artifacts: Vec<Artifact> = Vec::with_capacity(units.len());

        for unit in &units {
            let rendered = with_timeout(self.settings.render_timeout, self.renderer.render(unit))
                .await
                .unwrap_or_else(|elapsed| {
                    Err(RenderError::new(
                        unit.ordinal,
                        format!("render timed out after {}", elapsed),
                    ))
                })
                .and_then(|artifact| {
                    if artifact.ordinal == unit.ordinal {
                        Ok(artifact)
                    } else {
                        Err(RenderError::new(
                            unit.ordinal,
                            format!("renderer returned ordinal {}", artifact.ordinal),
                        ))
                    }
                });

            match rendered {
                Ok(artifact) => {
                    record = record.log(Event::Rendered {
                        ordinal: unit.ordinal,
                    });
                    artifacts.push(artifact);
                }
                Err(e) => {
                    warn!("Batch {}: {}", record.batch_id(), e);
                    return record
                        .log(Event::RenderFailed {
                            ordinal: unit.ordinal,
                        })
                        .fail(e.to_string());
                }
            }
        }

        record.artifacts = artifacts;
        record.enter(Stage::UploadPending)
    }

    async fn upload(&self, mut record: BatchRecord) -> BatchRecord {
        if record.artifacts.len() != record.plan.units.len() {
            debug!("Batch {}: artifacts missing, rendering again", record.batch_id());
            return record.enter(Stage::RenderPending);
        }

        let manifest = Manifest::from_units(&record.plan.units);
        let batch = match UploadBatch::new(record.batch_id(), record.artifacts.clone(), manifest) {
            Ok(batch) => batch,
            Err(e) => return record.fail(e.to_string()),
        };

        record.retry = record.retry.record_attempt();
        let attempt = record.retry.attempts;
        let feedback = record
            .history
            .last()
            .map(|f| f.discrepancies().to_vec())
            .unwrap_or_default();

        record = record.log(Event::UploadRequested { attempt });
        info!(
            "Batch {}: upload attempt {}/{}",
            record.batch_id(),
            attempt,
            record.retry.ceiling
        );

        let uploaded = with_timeout(
            self.settings.upload_timeout,
            self.uploader.upload(&batch, &record.folder, &feedback),
        )
        .await
        .unwrap_or_else(|elapsed| Err(UploadError(format!("upload timed out after {}", elapsed))));

        match uploaded {
            Ok(link) => {
                record.link = Some(link);
                record.enter(Stage::Verify1)
            }
            Err(error) => {
                let record = record.log(Event::UploadFailed { attempt });
                self.attempt_failed(record, AttemptFailure::Transport { attempt, error })
            }
        }
    }

    async fn verify_uploader_side(&self, record: BatchRecord) -> BatchRecord {
        let attempt = record.retry.attempts;
        let result = self
            .timed_verification(
                &record.folder,
                self.uploader
                    .self_check(&record.folder, record.plan.slide_count()),
            )
            .await;

        let record = record.log(Event::Verify1 {
            attempt,
            ok: result.ok,
        });

        if result.ok {
            record.enter(Stage::Verify2)
        } else {
            self.attempt_failed(record, AttemptFailure::Verify1 { attempt, result })
        }
    }

    async fn verify_independently(&self, record: BatchRecord) -> BatchRecord {
        let attempt = record.retry.attempts;
        // Expected contents come from our own plan, not from the uploader
        let manifest = Manifest::from_units(&record.plan.units);
        let result = self
            .timed_verification(
                &record.folder,
                self.verifier.verify_manifest(&record.folder, &manifest),
            )
            .await;

        let record = record.log(Event::Verify2 {
            attempt,
            ok: result.ok,
        });

        if result.ok {
            record.enter(Stage::Notify)
        } else {
            self.attempt_failed(record, AttemptFailure::Verify2 { attempt, result })
        }
    }

    async fn notify(&self, mut record: BatchRecord) -> BatchRecord {
        // Only reachable from a passing independent verification
        debug_assert!(matches!(
            record.trace.last(),
            Some(Event::Verify2 { ok: true, .. })
        ));

        let Some(link) = record.link.clone() else {
            return record.fail("verified delivery has no folder link");
        };

        if self.settings.recipients.is_empty() {
            warn!("Batch {}: no recipients configured, skipping notification", record.batch_id());
            record.notify_warning = Some(deck_core::NotifyError::NoRecipients.to_string());
            return record.enter(Stage::Done);
        }

        let (subject, body) =
            compose_delivery_message(&record.plan.topic, record.plan.slide_count(), &link);

        record = record.log(Event::NotifyRequested);
        self.persist(&record).await;

        let sent = with_timeout(
            self.settings.notify_timeout,
            self.notifier.notify(&self.settings.recipients, &subject, &body),
        )
        .await
        .unwrap_or_else(|elapsed| {
            Err(deck_core::NotifyError::Delivery(format!(
                "notification timed out after {}",
                elapsed
            )))
        });

        record = record.log(Event::Notified { ok: sent.is_ok() });
        if let Err(e) = sent {
            // Delivery stands; the warning goes back to the caller
            warn!("Batch {}: {}", record.batch_id(), e);
            record.notify_warning = Some(e.to_string());
        }

        record.enter(Stage::Done)
    }

    fn attempt_failed(&self, mut record: BatchRecord, failure: AttemptFailure) -> BatchRecord {
        warn!("Batch {}: {}", record.batch_id(), failure);
        if failure.is_access_failure() {
            warn!(
                "Batch {}: destination {} is not accessible; check credentials",
                record.batch_id(),
                record.folder
            );
        }

        record.history.push(failure);
        record.link = None;

        if record.retry.can_retry() {
            record.enter(Stage::UploadPending)
        } else {
            let attempts = record.retry.attempts;
            record.fail(format!(
                "delivery not verified after {} attempt{}",
                attempts,
                if attempts == 1 { "" } else { "s" }
            ))
        }
    }

    /// Refuse a folder that another live or delivered batch already owns
    async fn ensure_folder_free(&self, record: &BatchRecord) -> deck_core::Result<()> {
        let Some(records) = &self.records else {
            return Ok(());
        };

        let ids = records
            .list()
            .await
            .map_err(|e| deck_core::Error::Other(e.into()))?;

        for id in ids {
            if id == record.batch_id() {
                continue;
            }
            let other: BatchRecord = match records.load(&id).await {
                Ok(other) => other,
                Err(e) => {
                    warn!("Skipping unreadable batch record {}: {}", id, e);
                    continue;
                }
            };
            if other.folder == record.folder
                && (other.stage == Stage::Done || !other.stage.is_terminal())
            {
                return Err(deck_core::Error::InvalidBatch(format!(
                    "folder {} is already claimed by batch {} ({})",
                    record.folder,
                    other.batch_id(),
                    other.stage
                )));
            }
        }

        Ok(())
    }

    async fn timed_verification(
        &self,
        folder: &FolderRef,
        pass: impl Future<Output = VerificationResult>,
    ) -> VerificationResult {
        with_timeout(self.settings.verify_timeout, pass)
            .await
            .unwrap_or_else(|elapsed| {
                VerificationResult::access_failure(&AccessError::new(
                    folder.as_str(),
                    format!("verification timed out after {}", elapsed),
                ))
            })
    }

    async fn persist(&self, record: &BatchRecord) {
        if let Some(records) = &self.records
            && let Err(e) = records.save(record.batch_id(), record).await
        {
            warn!("Could not persist batch {}: {}", record.batch_id(), e);
        }
    }
}

/// Run `fut` with a deadline; the error is a printable duration
async fn with_timeout<F: Future>(limit: Duration, fut: F) -> Result<F::Output, String> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| format!("{:.1}s", limit.as_secs_f32()))
}
