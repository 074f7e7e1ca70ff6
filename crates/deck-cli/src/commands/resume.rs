use anyhow::{Context, Result};
use deck_config::Config;
use deck_core::Approval;
use deck_engine::{BatchRecord, Stage};

pub async fn handle(
    config: &Config,
    batch: String,
    approve: bool,
    reject: Option<String>,
    json: bool,
) -> Result<()> {
    let records = super::record_store(config)?;
    let record: BatchRecord = records
        .load(&batch)
        .await
        .with_context(|| format!("loading batch {}", batch))?;

    if record.stage.is_terminal() {
        println!("Batch {} already finished ({})", batch, record.stage);
        return Ok(());
    }

    let decision = match (approve, reject) {
        (true, _) => Some(Approval::Approved),
        (false, Some(reason)) => Some(Approval::parse(&format!("reject: {}", reason))),
        (false, None) => None,
    };

    if record.stage == Stage::AwaitingApproval && decision.is_none() {
        anyhow::bail!(
            "batch {} is awaiting approval; pass --approve or --reject <reason>",
            batch
        );
    }

    let publisher = super::build_publisher(config, false)?;
    let record = match decision {
        Some(approval) => publisher.apply_approval(record, approval),
        None => record,
    };

    let report = publisher.resume(record).await;
    super::finish(&report, json)
}
