use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for deck
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub notify: NotifyConfig,

    #[serde(default)]
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Upload attempts per batch, shared by both verification passes
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Per-call timeouts, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_render_secs")]
    pub render_secs: u64,

    #[serde(default = "default_upload_secs")]
    pub upload_secs: u64,

    #[serde(default = "default_verify_secs")]
    pub verify_secs: u64,

    #[serde(default = "default_notify_secs")]
    pub notify_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding destination folders and batch records
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Render worker command; slides are copied from their source when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<String>,

    #[serde(default)]
    pub recipients: Vec<String>,

    /// When set, notifications are POSTed here instead of the outbox
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    #[serde(default = "default_outbox_dir")]
    pub outbox_dir: PathBuf,

    #[serde(default = "default_sender")]
    pub sender: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReviewConfig {
    /// Pause for human approval before rendering
    #[serde(default)]
    pub required: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            timeouts: TimeoutConfig::default(),
            storage: StorageConfig::default(),
            render: RenderConfig::default(),
            notify: NotifyConfig::default(),
            review: ReviewConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            render_secs: default_render_secs(),
            upload_secs: default_upload_secs(),
            verify_secs: default_verify_secs(),
            notify_secs: default_notify_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            worker: None,
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            admin: None,
            recipients: Vec::new(),
            webhook_url: None,
            outbox_dir: default_outbox_dir(),
            sender: default_sender(),
        }
    }
}

impl TimeoutConfig {
    pub fn render(&self) -> Duration {
        Duration::from_secs(self.render_secs)
    }

    pub fn upload(&self) -> Duration {
        Duration::from_secs(self.upload_secs)
    }

    pub fn verify(&self) -> Duration {
        Duration::from_secs(self.verify_secs)
    }

    pub fn notify(&self) -> Duration {
        Duration::from_secs(self.notify_secs)
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_render_secs() -> u64 {
    90
}

fn default_upload_secs() -> u64 {
    60
}

fn default_verify_secs() -> u64 {
    30
}

fn default_notify_secs() -> u64 {
    30
}

fn default_storage_root() -> PathBuf {
    data_dir().join("drive")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_outbox_dir() -> PathBuf {
    data_dir().join("outbox")
}

fn default_sender() -> String {
    "deck@localhost".to_string()
}

fn data_dir() -> PathBuf {
    if let Some(dirs) = directories::ProjectDirs::from("com", "deck", "deck") {
        dirs.data_dir().to_path_buf()
    } else {
        PathBuf::from("~/.deck")
    }
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            Self::load_from(&path)
        } else {
            // Create default config file
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(&path, content)?;
            Ok(config)
        }
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        if let Some(worker) = &self.render.worker
            && worker.is_empty()
        {
            anyhow::bail!("render.worker must name a program");
        }
        Ok(())
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "deck", "deck") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.deck/config.toml")
        }
    }
}
