//! Verification results
//!
//! A result is produced fresh by every verification pass and never cached.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::AccessError;

/// One way a delivered folder differs from what the batch expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    ManifestMissing,
    ManifestDuplicated { copies: usize },
    ManifestMismatch { expected: String, found: String },
    MissingOrdinal { ordinal: u32 },
    DuplicateOrdinal { ordinal: u32, files: Vec<String> },
    UnexpectedOrdinal { ordinal: u32, file: String },
    UnexpectedFile { name: String },
    Access { message: String },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::ManifestMissing => write!(f, "manifest missing"),
            Discrepancy::ManifestDuplicated { copies } => {
                write!(f, "manifest present {} times", copies)
            }
            Discrepancy::ManifestMismatch { expected, found } => write!(
                f,
                "manifest differs from local copy (expected {}, found {})",
                short(expected),
                short(found)
            ),
            Discrepancy::MissingOrdinal { ordinal } => write!(f, "missing ordinal {}", ordinal),
            Discrepancy::DuplicateOrdinal { ordinal, files } => {
                write!(f, "duplicate ordinal {}: {}", ordinal, files.join(", "))
            }
            Discrepancy::UnexpectedOrdinal { ordinal, file } => {
                write!(f, "unexpected ordinal {}: {}", ordinal, file)
            }
            Discrepancy::UnexpectedFile { name } => write!(f, "unexpected file {}", name),
            Discrepancy::Access { message } => write!(f, "folder access error: {}", message),
        }
    }
}

fn short(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub ok: bool,
    pub discrepancies: Vec<Discrepancy>,
}

impl VerificationResult {
    pub fn passed() -> Self {
        Self {
            ok: true,
            discrepancies: Vec::new(),
        }
    }

    /// Passes only when no discrepancy was found
    pub fn from_discrepancies(discrepancies: Vec<Discrepancy>) -> Self {
        Self {
            ok: discrepancies.is_empty(),
            discrepancies,
        }
    }

    pub fn access_failure(error: &AccessError) -> Self {
        Self {
            ok: false,
            discrepancies: vec![Discrepancy::Access {
                message: error.to_string(),
            }],
        }
    }

    /// The folder could not be inspected at all, as opposed to a content mismatch
    pub fn is_access_failure(&self) -> bool {
        self.discrepancies
            .iter()
            .any(|d| matches!(d, Discrepancy::Access { .. }))
    }

    pub fn messages(&self) -> Vec<String> {
        self.discrepancies.iter().map(ToString::to_string).collect()
    }
}
