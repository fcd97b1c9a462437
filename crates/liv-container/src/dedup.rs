//! Content-addressed deduplication of a [`NamedContent`] collection.
//!
//! Entries are grouped by digest. The canonical entry of each group is the
//! lexicographically smallest path, so the selection does not depend on
//! insertion order and repeated runs pick the same names.

use crate::digest::{digest, Digest};
use crate::NamedContent;
use std::collections::BTreeMap;

/// Result of [`deduplicate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deduplicated {
    /// One entry per distinct content.
    pub content: NamedContent,
    /// Dropped path -> canonical path that holds the same bytes.
    pub duplicates: BTreeMap<String, String>,
}

/// Keep one path per distinct content.
pub fn deduplicate(files: &NamedContent) -> Deduplicated {
    let mut groups: BTreeMap<Digest, Vec<&str>> = BTreeMap::new();
    for (path, bytes) in files {
        groups.entry(digest(bytes)).or_default().push(path);
    }

    let mut out = Deduplicated::default();
    for paths in groups.values() {
        let Some(canonical) = paths.iter().min() else {
            continue;
        };
        out.content
            .insert((*canonical).to_string(), files[*canonical].clone());

        for path in paths.iter().filter(|p| *p != canonical) {
            tracing::debug!(duplicate = %path, canonical = %canonical, "deduplicated entry");
            out.duplicates
                .insert((*path).to_string(), (*canonical).to_string());
        }
    }

    out
}
