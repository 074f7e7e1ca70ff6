//! Content units and the batch plan handed to the publisher

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Where a slide's source image lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceRef {
    Local(PathBuf),
    Remote(String),
}

impl SourceRef {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            SourceRef::Remote(raw.to_string())
        } else {
            SourceRef::Local(PathBuf::from(raw.strip_prefix("file://").unwrap_or(raw)))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SourceRef::Remote(_))
    }
}

impl From<String> for SourceRef {
    fn from(raw: String) -> Self {
        SourceRef::parse(&raw)
    }
}

impl From<SourceRef> for String {
    fn from(source: SourceRef) -> Self {
        source.to_string()
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRef::Local(path) => write!(f, "{}", path.display()),
            SourceRef::Remote(url) => f.write_str(url),
        }
    }
}

/// One slide's worth of approved content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUnit {
    /// 1-based position in the batch
    pub ordinal: u32,
    pub text: String,
    pub source: SourceRef,
}

impl ContentUnit {
    pub fn new(ordinal: u32, text: impl Into<String>, source: impl AsRef<str>) -> Self {
        Self {
            ordinal,
            text: text.into(),
            source: SourceRef::parse(source.as_ref()),
        }
    }
}

/// The full set of content units for one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPlan {
    #[serde(default = "new_batch_id")]
    pub batch_id: String,
    #[serde(default)]
    pub topic: String,
    pub units: Vec<ContentUnit>,
}

fn new_batch_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl BatchPlan {
    pub fn new(topic: impl Into<String>, units: Vec<ContentUnit>) -> Self {
        Self {
            batch_id: new_batch_id(),
            topic: topic.into(),
            units,
        }
    }

    pub fn with_batch_id(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = batch_id.into();
        self
    }

    /// Declared slide count (N)
    pub fn slide_count(&self) -> u32 {
        self.units.len() as u32
    }

    /// Check that ordinals are unique and form 1..N
    pub fn validate(&self) -> Result<()> {
        if self.units.is_empty() {
            return Err(Error::InvalidBatch(format!(
                "batch {} has no content units",
                self.batch_id
            )));
        }

        let n = self.slide_count();
        let mut seen = vec![false; n as usize];
        for unit in &self.units {
            if unit.ordinal == 0 || unit.ordinal > n {
                return Err(Error::InvalidBatch(format!(
                    "ordinal {} outside 1..{}",
                    unit.ordinal, n
                )));
            }
            let slot = &mut seen[(unit.ordinal - 1) as usize];
            if *slot {
                return Err(Error::InvalidBatch(format!(
                    "ordinal {} appears more than once",
                    unit.ordinal
                )));
            }
            *slot = true;
        }

        Ok(())
    }

    /// Units sorted by ordinal
    pub fn ordered_units(&self) -> Vec<&ContentUnit> {
        let mut units: Vec<&ContentUnit> = self.units.iter().collect();
        units.sort_by_key(|u| u.ordinal);
        units
    }
}
