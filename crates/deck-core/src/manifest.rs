//! The per-batch manifest record
//!
//! The manifest is written locally before upload and copied verbatim into
//! the destination folder. Serialization is deterministic so both copies
//! hash the same.

use serde::{Deserialize, Serialize};

use crate::{ContentUnit, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub ordinals: Vec<u32>,
    pub text: Vec<String>,
    pub source_ref: Vec<String>,
}

impl Manifest {
    /// File name at the destination folder root
    pub const FILE_NAME: &'static str = "manifest.json";

    pub fn from_units<'a>(units: impl IntoIterator<Item = &'a ContentUnit>) -> Self {
        let mut units: Vec<&ContentUnit> = units.into_iter().collect();
        units.sort_by_key(|u| u.ordinal);

        Self {
            ordinals: units.iter().map(|u| u.ordinal).collect(),
            text: units.iter().map(|u| u.text.clone()).collect(),
            source_ref: units.iter().map(|u| u.source.to_string()).collect(),
        }
    }

    pub fn slide_count(&self) -> u32 {
        self.ordinals.len() as u32
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// BLAKE3 digest of the serialized manifest
    pub fn digest(&self) -> Result<String> {
        Ok(digest_bytes(&self.to_bytes()?))
    }
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
