use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use deck_config::Config;
use deck_core::{BatchPlan, FolderRef, Manifest};
use deck_storage::{project_folder_name, write_manifest};
use time::OffsetDateTime;

use super::gate::StdinGate;

pub async fn handle(
    config: &Config,
    plan_path: PathBuf,
    folder: Option<String>,
    review: bool,
    json: bool,
) -> Result<()> {
    let plan = load_plan(&plan_path).await?;
    plan.validate()?;

    let folder = folder.unwrap_or_else(|| project_folder_name(&plan.topic, OffsetDateTime::now_utc()));

    // Interactive review prompts now; configured review without --review pauses
    let mut publisher = super::build_publisher(config, review || config.review.required)?;
    if review {
        publisher = publisher.with_gate(Arc::new(StdinGate));
    }

    let local = write_manifest(&config.render.output_dir, &Manifest::from_units(&plan.units)).await?;
    tracing::debug!("Local manifest at {}", local.display());

    let report = publisher.run(plan, FolderRef::new(folder)).await?;
    super::finish(&report, json)
}

async fn load_plan(path: &Path) -> Result<BatchPlan> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading plan {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing plan {}", path.display()))
}
