use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use deck_core::{Artifact, ContentUnit, RenderError, Renderer, SourceRef, artifact_file_name};
use tracing::debug;

pub struct CopyRenderer {
    output_dir: PathBuf,
}

impl CopyRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    async fn download(url: &str) -> Result<Vec<u8>, String> {
        let client = reqwest::Client::builder()
            .user_agent("deck/0.1 (slide renderer)")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("Failed to fetch {}: {}", url, e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP error {}: {}", response.status().as_u16(), url));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("Failed to read response: {}", e))?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Renderer for CopyRenderer {
    async fn render(&self, unit: &ContentUnit) -> Result<Artifact, RenderError> {
        let fail = |message: String| RenderError::new(unit.ordinal, message);

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| fail(format!("{}: {}", self.output_dir.display(), e)))?;
        let target = self.output_dir.join(artifact_file_name(unit.ordinal));

        match &unit.source {
            SourceRef::Local(path) => {
                tokio::fs::copy(path, &target)
                    .await
                    .map_err(|e| fail(format!("source image {}: {}", path.display(), e)))?;
            }
            SourceRef::Remote(url) => {
                let bytes = Self::download(url).await.map_err(fail)?;
                tokio::fs::write(&target, bytes)
                    .await
                    .map_err(|e| fail(format!("{}: {}", target.display(), e)))?;
            }
        }

        debug!("Rendered slide {} -> {}", unit.ordinal, target.display());
        Ok(Artifact::new(unit.ordinal, target))
    }
}
