//! External render worker
//!
//! The worker is invoked as `<program> <args..> <slide json> <output path>`.
//! It must exit 0 and print `SUCCESS:<path>` on stdout, naming the file it
//! wrote.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use deck_core::{Artifact, ContentUnit, RenderError, Renderer, artifact_file_name};
use tracing::debug;

const SUCCESS_PREFIX: &str = "SUCCESS:";

pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
    output_dir: PathBuf,
    timeout: Duration,
}

impl CommandRenderer {
    /// `command` is the program followed by its fixed arguments
    pub fn new(command: &[String], output_dir: impl Into<PathBuf>) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            output_dir: output_dir.into(),
            timeout: Duration::from_secs(90),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run_worker(&self, unit: &ContentUnit, output_path: &Path) -> Result<PathBuf, String> {
        let payload = serde_json::json!({
            "text": unit.text,
            "image_path": unit.source.to_string(),
            "slide_number": unit.ordinal,
        });

        let child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(payload.to_string())
            .arg(output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| format!("render worker timed out after {}s", self.timeout.as_secs_f32()))?
            .map_err(|e| format!("failed to start render worker {}: {}", self.program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "render worker failed ({}): {}",
                output.status,
                stderr.trim()
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let rendered = stdout
            .lines()
            .rev()
            .find_map(|line| line.trim().strip_prefix(SUCCESS_PREFIX))
            .ok_or_else(|| format!("unexpected render worker output: {}", stdout.trim()))?;

        let rendered = PathBuf::from(rendered.trim());
        if !tokio::fs::try_exists(&rendered).await.unwrap_or(false) {
            return Err(format!("rendered file not found: {}", rendered.display()));
        }

        Ok(rendered)
    }
}

#[async_trait]
impl Renderer for CommandRenderer {
    async fn render(&self, unit: &ContentUnit) -> Result<Artifact, RenderError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| RenderError::new(unit.ordinal, e.to_string()))?;

        let output_path = self.output_dir.join(artifact_file_name(unit.ordinal));
        let rendered = self
            .run_worker(unit, &output_path)
            .await
            .map_err(|message| RenderError::new(unit.ordinal, message))?;

        debug!("Worker rendered slide {} -> {}", unit.ordinal, rendered.display());
        Ok(Artifact::new(unit.ordinal, rendered))
    }
}
