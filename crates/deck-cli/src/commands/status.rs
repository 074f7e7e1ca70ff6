use anyhow::Result;
use deck_config::Config;
use deck_engine::BatchRecord;

pub async fn handle(config: &Config, batch: Option<String>) -> Result<()> {
    let records = super::record_store(config)?;

    if let Some(batch) = batch {
        let record: BatchRecord = records.load(&batch).await?;
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    let ids = records.list().await?;
    if ids.is_empty() {
        println!("No batches found.");
        return Ok(());
    }

    println!("Batches:");
    for id in ids {
        match records.load::<BatchRecord>(&id).await {
            Ok(record) => println!(
                "  {} [{}] {} -> {} (attempts {}/{})",
                id,
                record.stage,
                record.plan.topic,
                record.folder,
                record.retry.attempts,
                record.retry.ceiling
            ),
            Err(e) => println!("  {} (unreadable: {})", id, e),
        }
    }

    Ok(())
}
