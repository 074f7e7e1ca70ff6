pub mod config;
pub mod gate;
pub mod publish;
pub mod resume;
pub mod status;
pub mod verify;

use std::sync::Arc;

use anyhow::{Context, Result};
use deck_config::Config;
use deck_core::{Notifier, Renderer};
use deck_engine::{Outcome, Publisher, PublisherSettings, PublishReport};
use deck_notify::{OutboxNotifier, WebhookNotifier, merge_recipients};
use deck_render::{CommandRenderer, CopyRenderer};
use deck_storage::{FolderStore, RecordStore};
use deck_verify::Verifier;
use tracing::warn;

/// Wire the configured adapters into a publisher
pub fn build_publisher(config: &Config, require_approval: bool) -> Result<Publisher> {
    let store = Arc::new(FolderStore::new(&config.storage.root)?);
    let records = Arc::new(RecordStore::new(store.root())?);

    let renderer: Arc<dyn Renderer> = match &config.render.worker {
        Some(command) => Arc::new(
            CommandRenderer::new(command, &config.render.output_dir)
                .context("render.worker must name a program")?
                .with_timeout(config.timeouts.render()),
        ),
        None => Arc::new(CopyRenderer::new(&config.render.output_dir)),
    };

    let notifier: Arc<dyn Notifier> = match &config.notify.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url)?),
        None => Arc::new(OutboxNotifier::new(
            &config.notify.outbox_dir,
            &config.notify.sender,
        )),
    };

    let recipients =
        merge_recipients(config.notify.admin.as_deref(), &config.notify.recipients)
            .unwrap_or_else(|e| {
                warn!("{}; deliveries will not be announced", e);
                Vec::new()
            });

    let settings = PublisherSettings {
        max_attempts: config.retry.max_attempts,
        render_timeout: config.timeouts.render(),
        upload_timeout: config.timeouts.upload(),
        verify_timeout: config.timeouts.verify(),
        notify_timeout: config.timeouts.notify(),
        recipients,
        require_approval,
    };

    Ok(
        Publisher::new(renderer, store.clone(), Verifier::new(store), notifier, settings)
            .with_records(records),
    )
}

pub fn record_store(config: &Config) -> Result<RecordStore> {
    Ok(RecordStore::new(&config.storage.root)?)
}

/// Print a report and turn a failed outcome into an error exit
pub fn finish(report: &PublishReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_report(report);
    }

    if let Outcome::Failed { reason } = &report.outcome {
        anyhow::bail!("batch {} was not delivered: {}", report.batch_id(), reason);
    }
    Ok(())
}

fn print_report(report: &PublishReport) {
    match &report.outcome {
        Outcome::Delivered {
            link,
            notify_warning,
        } => {
            println!(
                "✓ Delivered batch {} ({} slides)",
                report.batch_id(),
                report.record.plan.slide_count()
            );
            println!("  Folder: {}", link.0);
            println!("  Attempts: {}/{}", report.attempts(), report.record.retry.ceiling);
            match notify_warning {
                Some(warning) => println!("  Notification: not sent ({})", warning),
                None => println!("  Notification: sent"),
            }
        }
        Outcome::Failed { reason } => {
            println!("✗ Batch {} failed: {}", report.batch_id(), reason);
        }
        Outcome::Rejected { reason } => {
            println!("✗ Batch {} rejected: {}", report.batch_id(), reason);
        }
        Outcome::AwaitingApproval => {
            println!("Batch {} is awaiting approval", report.batch_id());
            println!(
                "  Approve with: deck resume {} --approve",
                report.batch_id()
            );
            println!(
                "  Reject with:  deck resume {} --reject \"<feedback>\"",
                report.batch_id()
            );
        }
    }

    if !report.history().is_empty() {
        println!("\nFailed attempts:");
        for failure in report.history() {
            println!("  {}", failure);
        }
    }
}
