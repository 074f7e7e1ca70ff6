use std::collections::BTreeMap;

use deck_core::{Discrepancy, Manifest, RemoteEntry};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ARTIFACT_NAME: Regex =
        Regex::new(r"(?i)^slide_(\d+)\.(png|jpe?g|webp)$").unwrap();
}

/// Ordinal encoded in an artifact file name (`slide_3.png`, `slide_03.jpg`)
pub fn parse_artifact_ordinal(name: &str) -> Option<u32> {
    ARTIFACT_NAME
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Compare a folder listing with the expected batch shape.
///
/// Checks, in order: manifest exactly once, one artifact per ordinal in
/// `1..=expected_count`, no artifact outside that range, no other entry.
pub fn check_listing(entries: &[RemoteEntry], expected_count: u32) -> Vec<Discrepancy> {
    let mut manifest_copies = 0;
    let mut by_ordinal: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    let mut extra: Vec<String> = Vec::new();

    for entry in entries {
        if entry.is_dir {
            extra.push(format!("{}/", entry.name));
        } else if entry.name == Manifest::FILE_NAME {
            manifest_copies += 1;
        } else if let Some(ordinal) = parse_artifact_ordinal(&entry.name) {
            by_ordinal.entry(ordinal).or_default().push(entry.name.clone());
        } else {
            extra.push(entry.name.clone());
        }
    }

    let mut discrepancies = Vec::new();

    match manifest_copies {
        0 => discrepancies.push(Discrepancy::ManifestMissing),
        1 => {}
        copies => discrepancies.push(Discrepancy::ManifestDuplicated { copies }),
    }

    for ordinal in 1..=expected_count {
        match by_ordinal.get(&ordinal) {
            None => discrepancies.push(Discrepancy::MissingOrdinal { ordinal }),
            Some(files) if files.len() > 1 => {
                let mut files = files.clone();
                files.sort();
                discrepancies.push(Discrepancy::DuplicateOrdinal { ordinal, files });
            }
            Some(_) => {}
        }
    }

    for (&ordinal, files) in &by_ordinal {
        if ordinal == 0 || ordinal > expected_count {
            let mut files = files.clone();
            files.sort();
            for file in files {
                discrepancies.push(Discrepancy::UnexpectedOrdinal { ordinal, file });
            }
        }
    }

    extra.sort();
    discrepancies.extend(extra.into_iter().map(|name| Discrepancy::UnexpectedFile { name }));

    discrepancies
}
