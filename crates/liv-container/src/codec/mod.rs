//! ZIP archive codec for `.liv` documents.
//!
//! Output is byte-stable: entries are emitted in a fixed order with a fixed
//! timestamp and fixed permissions, and the compression method depends only on
//! the entry name. Input is treated as untrusted: every entry name passes the
//! path policy and reads are bounded by [`ReadLimits`].

mod limits;
mod read;
mod structure;
mod write;

pub use limits::{ReadLimits, ReadLimitsOverrides};
pub use read::{extract_to_dir, list_entries, read, read_bytes, read_path, EntryInfo, EntryMethod};
pub(crate) use structure::extension as extension_of;
pub use structure::{
    check_writable, validate_structure, validate_structure_with, StructureIssue,
    DEFAULT_LARGE_DOCUMENT_BYTES, RECOMMENDED_ENTRIES, REQUIRED_ENTRIES, SUSPICIOUS_EXTENSIONS,
};
pub use write::{
    compression_stats, pack_directory, write, write_path, write_to_vec, CompressionStats,
    WriteOptions, DEFAULT_COMPRESSION_LEVEL,
};

use crate::layout;

/// Extensions stored without compression (already compressed formats).
pub const STORED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "mp3", "mp4", "webm", "ogg", "woff", "woff2", "ttf",
    "zip", "gz", "bz2", "wasm",
];

/// Entries written ahead of everything else, in this order.
pub const PRIORITY_ENTRIES: &[&str] = &[layout::MANIFEST, layout::CONTENT_HTML, layout::CONTENT_FALLBACK];

/// Whether an entry should be deflated.
pub fn should_compress(path: &str) -> bool {
    match extension_of(path) {
        Some(ext) => !STORED_EXTENSIONS.contains(&ext.as_str()),
        None => true,
    }
}

/// Write order: priority entries that exist, then the rest ascending.
pub fn ordered_paths(files: &crate::NamedContent) -> Vec<&str> {
    let mut out: Vec<&str> = PRIORITY_ENTRIES
        .iter()
        .copied()
        .filter(|p| files.contains_key(*p))
        .collect();
    // NamedContent iterates in ascending key order.
    out.extend(
        files
            .keys()
            .map(String::as_str)
            .filter(|p| !PRIORITY_ENTRIES.contains(p)),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NamedContent;

    #[test]
    fn priority_entries_come_first() {
        let files: NamedContent = [
            "assets/images/a.png",
            "content/static/fallback.html",
            "manifest.json",
            "content/index.html",
            "content/styles/main.css",
            "a.txt",
        ]
        .iter()
        .map(|p| (p.to_string(), Vec::new()))
        .collect();

        assert_eq!(
            ordered_paths(&files),
            vec![
                "manifest.json",
                "content/index.html",
                "content/static/fallback.html",
                "a.txt",
                "assets/images/a.png",
                "content/styles/main.css",
            ]
        );
    }

    #[test]
    fn missing_priority_entries_are_skipped() {
        let files: NamedContent = [("z".to_string(), Vec::new()), ("content/index.html".to_string(), Vec::new())]
            .into_iter()
            .collect();
        assert_eq!(ordered_paths(&files), vec!["content/index.html", "z"]);
    }

    #[test]
    fn compression_choice_by_extension() {
        assert!(!should_compress("assets/images/photo.JPG"));
        assert!(!should_compress("wasm/chart.wasm"));
        assert!(!should_compress("assets/fonts/inter.woff2"));
        assert!(should_compress("content/index.html"));
        assert!(should_compress("manifest.json"));
        assert!(should_compress("LICENSE"));
    }
}
