use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use deck_config::Config;
use deck_core::{FolderRef, Manifest};
use deck_storage::FolderStore;
use deck_verify::Verifier;

pub async fn handle(
    config: &Config,
    folder: String,
    count: Option<u32>,
    manifest: Option<PathBuf>,
) -> Result<()> {
    let store = Arc::new(FolderStore::new(&config.storage.root)?);
    let verifier = Verifier::new(store);
    let folder = FolderRef::new(folder);

    let result = match manifest {
        Some(path) => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading manifest {}", path.display()))?;
            let manifest = Manifest::from_bytes(&bytes)?;
            if let Some(count) = count
                && count != manifest.slide_count()
            {
                anyhow::bail!(
                    "--count {} disagrees with manifest ({} slides)",
                    count,
                    manifest.slide_count()
                );
            }
            verifier.verify_manifest(&folder, &manifest).await
        }
        None => {
            let count = count.context("--count is required without --manifest")?;
            verifier.verify(&folder, count).await
        }
    };

    if result.ok {
        println!("✓ {} is complete", folder);
        return Ok(());
    }

    println!("✗ {} does not match:", folder);
    for message in result.messages() {
        println!("  {}", message);
    }
    anyhow::bail!("verification failed for {}", folder)
}
