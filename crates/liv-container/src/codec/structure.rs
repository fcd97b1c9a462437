//! Codec-level structure checks.
//!
//! [`validate_structure`] is advisory and collects everything. [`check_writable`]
//! is the hard gate used before writing and stops at the first problem.

use crate::layout;
use crate::validation::ValidationResult;
use crate::NamedContent;
use std::fmt;

/// Default aggregate size above which a document is flagged as large.
pub const DEFAULT_LARGE_DOCUMENT_BYTES: u64 = 100 * 1024 * 1024;

/// Entries the reader must find.
pub const REQUIRED_ENTRIES: &[&str] = &[layout::MANIFEST, layout::CONTENT_HTML];

/// Entries a well-formed document should carry.
pub const RECOMMENDED_ENTRIES: &[&str] = &[layout::CONTENT_FALLBACK];

/// Executable-looking extensions.
pub const SUSPICIOUS_EXTENSIONS: &[&str] = &["exe", "bat", "sh", "cmd", "scr"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureIssue {
    RequiredMissing { path: &'static str },
    RecommendedMissing { path: &'static str },
    SuspiciousFile { path: String },
    LargeDocument { total_bytes: u64, threshold: u64 },
}

impl fmt::Display for StructureIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequiredMissing { path } => write!(f, "required file missing: {path}"),
            Self::RecommendedMissing { path } => write!(f, "recommended file missing: {path}"),
            Self::SuspiciousFile { path } => write!(f, "suspicious file type: {path}"),
            Self::LargeDocument {
                total_bytes,
                threshold,
            } => write!(
                f,
                "document is very large ({total_bytes} bytes, threshold {threshold})"
            ),
        }
    }
}

/// Lower-cased extension of the last path segment, without the dot.
pub(crate) fn extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = name.rsplit_once('.')?;
    (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

/// Advisory check using the default large-document threshold.
pub fn validate_structure(files: &NamedContent) -> ValidationResult<StructureIssue> {
    validate_structure_with(files, DEFAULT_LARGE_DOCUMENT_BYTES)
}

pub fn validate_structure_with(
    files: &NamedContent,
    large_document_bytes: u64,
) -> ValidationResult<StructureIssue> {
    let mut result = ValidationResult::new();

    for &path in REQUIRED_ENTRIES {
        if !files.contains_key(path) {
            result.fail(StructureIssue::RequiredMissing { path });
        }
    }

    for &path in RECOMMENDED_ENTRIES {
        if !files.contains_key(path) {
            result.warn(StructureIssue::RecommendedMissing { path });
        }
    }

    let mut total_bytes = 0_u64;
    for (path, bytes) in files {
        total_bytes = total_bytes.saturating_add(bytes.len() as u64);
        if extension(path).is_some_and(|ext| SUSPICIOUS_EXTENSIONS.contains(&ext.as_str())) {
            result.warn(StructureIssue::SuspiciousFile { path: path.clone() });
        }
    }

    if total_bytes > large_document_bytes {
        result.warn(StructureIssue::LargeDocument {
            total_bytes,
            threshold: large_document_bytes,
        });
    }

    result
}

/// Pre-write gate: manifest present and at least one entry under `content/`.
pub fn check_writable(files: &NamedContent) -> Result<(), String> {
    if !files.contains_key(layout::MANIFEST) {
        return Err(format!("required file missing: {}", layout::MANIFEST));
    }
    if !files.keys().any(|p| p.starts_with(layout::CONTENT_PREFIX)) {
        return Err(format!(
            "required directory missing or empty: {}",
            layout::CONTENT_PREFIX
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(paths: &[&str]) -> NamedContent {
        paths
            .iter()
            .map(|p| (p.to_string(), b"x".to_vec()))
            .collect()
    }

    #[test]
    fn manifest_and_index_only_warns_about_fallback() {
        let r = validate_structure(&named(&["manifest.json", "content/index.html"]));
        assert!(r.is_valid());
        assert_eq!(r.errors.len(), 0);
        assert_eq!(
            r.warnings,
            vec![StructureIssue::RecommendedMissing {
                path: "content/static/fallback.html"
            }]
        );
    }

    #[test]
    fn missing_required_entries_are_errors() {
        let r = validate_structure(&NamedContent::new());
        assert_eq!(
            r.error_messages(),
            vec![
                "required file missing: manifest.json",
                "required file missing: content/index.html"
            ]
        );
    }

    #[test]
    fn suspicious_extensions_warn() {
        let r = validate_structure(&named(&[
            "manifest.json",
            "content/index.html",
            "content/static/fallback.html",
            "assets/data/run.SH",
            "assets/data/tool.exe",
            "assets/data/shell.txt",
        ]));
        assert!(r.is_valid());
        assert_eq!(
            r.warning_messages(),
            vec![
                "suspicious file type: assets/data/run.SH",
                "suspicious file type: assets/data/tool.exe"
            ]
        );
    }

    #[test]
    fn large_document_threshold_is_configurable() {
        let files = named(&["manifest.json", "content/index.html", "content/static/fallback.html"]);
        assert!(validate_structure_with(&files, 3).warnings.is_empty());
        let r = validate_structure_with(&files, 2);
        assert_eq!(
            r.warnings,
            vec![StructureIssue::LargeDocument {
                total_bytes: 3,
                threshold: 2
            }]
        );
    }

    #[test]
    fn writable_gate() {
        assert!(check_writable(&named(&["manifest.json", "content/x.html"])).is_ok());
        assert_eq!(
            check_writable(&named(&["content/index.html"])).unwrap_err(),
            "required file missing: manifest.json"
        );
        assert_eq!(
            check_writable(&named(&["manifest.json", "assets/data/a"])).unwrap_err(),
            "required directory missing or empty: content/"
        );
    }

    #[test]
    fn extension_parsing() {
        assert_eq!(extension("a/b.PNG").as_deref(), Some("png"));
        assert_eq!(extension("a.b/c"), None);
        assert_eq!(extension(".hidden"), None);
        assert_eq!(extension("x.tar.gz").as_deref(), Some("gz"));
    }
}
