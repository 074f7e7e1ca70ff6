//! Upload verification for deck
//!
//! Inspects a destination folder and reports every way it differs from the
//! batch that should be there. All checks run on every call so the
//! discrepancy list is complete, and the list order is stable so repeated
//! calls on an unmodified folder are identical.

mod listing;

use std::sync::Arc;

use deck_core::{Discrepancy, FolderInspector, FolderRef, Manifest, VerificationResult, digest_bytes};
use tracing::debug;

pub use listing::{check_listing, parse_artifact_ordinal};

/// Verifies delivered folders through a [`FolderInspector`]
#[derive(Clone)]
pub struct Verifier {
    inspector: Arc<dyn FolderInspector>,
}

impl Verifier {
    pub fn new(inspector: Arc<dyn FolderInspector>) -> Self {
        Self { inspector }
    }

    /// Check that `folder` holds exactly one manifest and one artifact per
    /// ordinal in `1..=expected_count`, and nothing else
    pub async fn verify(&self, folder: &FolderRef, expected_count: u32) -> VerificationResult {
        let entries = match self.inspector.list(folder).await {
            Ok(entries) => entries,
            Err(e) => return VerificationResult::access_failure(&e),
        };

        let discrepancies = check_listing(&entries, expected_count);
        debug!(
            "Verified {} ({} entries, expected {}): {} discrepancies",
            folder,
            entries.len(),
            expected_count,
            discrepancies.len()
        );

        VerificationResult::from_discrepancies(discrepancies)
    }

    /// [`Verifier::verify`] plus a byte comparison of the remote manifest
    /// against the local one
    pub async fn verify_manifest(&self, folder: &FolderRef, manifest: &Manifest) -> VerificationResult {
        let entries = match self.inspector.list(folder).await {
            Ok(entries) => entries,
            Err(e) => return VerificationResult::access_failure(&e),
        };

        let mut discrepancies = check_listing(&entries, manifest.slide_count());

        let manifest_copies = entries
            .iter()
            .filter(|e| !e.is_dir && e.name == Manifest::FILE_NAME)
            .count();

        if manifest_copies == 1 {
            let remote = match self.inspector.read(folder, Manifest::FILE_NAME).await {
                Ok(bytes) => bytes,
                Err(e) => return VerificationResult::access_failure(&e),
            };

            let expected = manifest
                .to_bytes()
                .map(|bytes| digest_bytes(&bytes))
                .unwrap_or_default();
            let found = digest_bytes(&remote);

            if expected != found {
                // Only one manifest copy exists here, so this leads the list
                discrepancies.insert(0, Discrepancy::ManifestMismatch { expected, found });
            }
        }

        VerificationResult::from_discrepancies(discrepancies)
    }
}
