//! Error types for archive packaging, unpacking and hashing.
//!
//! Every terminating error names the offending archive path or module so a
//! caller can locate the defect without re-running.

use std::path::PathBuf;
use thiserror::Error;

/// Archive-safety violation for a relative entry path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Path contains a `..` sequence.
    #[error("path contains directory traversal: {path}")]
    Traversal { path: String },

    /// Path starts at the filesystem root.
    #[error("absolute paths not allowed: {path}")]
    Absolute { path: String },

    /// Path contains one of `< > : " | ? *`.
    #[error("path contains invalid character '{character}': {path}")]
    InvalidCharacter { path: String, character: char },

    /// Path is longer than the archive limit.
    #[error("path too long ({length} characters, max {max}): {path}")]
    TooLong {
        path: String,
        length: usize,
        max: usize,
    },
}

impl PathError {
    /// The rejected path.
    pub fn path(&self) -> &str {
        match self {
            Self::Traversal { path }
            | Self::Absolute { path }
            | Self::InvalidCharacter { path, .. }
            | Self::TooLong { path, .. } => path,
        }
    }
}

/// Header check failure for an embedded WebAssembly module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModuleFormatError {
    /// Fewer than 4 bytes, or the first 4 bytes are not `\0asm`.
    #[error("invalid WASM magic number")]
    InvalidMagic,

    /// Magic is correct but bytes 4..8 are missing or not version 1.
    #[error("unsupported WASM version")]
    UnsupportedVersion,
}

/// Failure while writing or reading an archive.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An entry name failed the path policy.
    #[error("invalid archive path: {0}")]
    Path(#[from] PathError),

    /// Pre-write structural check failed.
    #[error("structure validation failed: {reason}")]
    Structure { reason: String },

    /// An entry would land outside the extraction root.
    #[error("entry escapes extraction root: {path}")]
    EscapesRoot { path: String },

    /// The same entry name appears twice in an archive.
    #[error("duplicate archive entry: {path}")]
    DuplicateEntry { path: String },

    /// A read limit was exceeded.
    #[error("archive limit exceeded at {path}: {limit}")]
    LimitExceeded { path: String, limit: String },

    /// The zip layer rejected the archive or an entry.
    #[error("zip error at {path}: {source}")]
    Zip {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// I/O failure on a file or stream.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CodecError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn zip(path: impl Into<String>, source: zip::result::ZipError) -> Self {
        Self::Zip {
            path: path.into(),
            source,
        }
    }
}

/// Failure while turning entries into a [`crate::Document`] or back.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// No `manifest.json` entry.
    #[error("manifest.json not found in package")]
    MissingManifest,

    /// `manifest.json` is not a valid manifest document.
    #[error("failed to parse manifest.json: {0}")]
    ManifestParse(#[source] serde_json::Error),

    /// Manifest could not be serialized.
    #[error("failed to serialize manifest.json: {0}")]
    ManifestSerialize(#[source] serde_json::Error),

    /// A text slot holds bytes that are not UTF-8.
    #[error("content entry {path} is not valid UTF-8")]
    NonUtf8Content { path: String },

    /// Two archive entries map to the same module name.
    #[error("module '{name}' appears more than once ({first} and {second})")]
    DuplicateModule {
        name: String,
        first: String,
        second: String,
    },

    /// Two document slots flatten to the same archive path.
    #[error("archive path {path} is claimed by more than one document entry")]
    PathCollision { path: String },

    /// Structural validation reported errors.
    #[error("document validation failed: {}", errors.join("; "))]
    Invalid { errors: Vec<String> },

    /// Archive layer failure.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Failure hashing a single file or stream.
#[derive(Debug, Error)]
#[error("failed to hash {}: {source}", path.display())]
pub struct HashError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Aggregate failure of a batch hash run.
///
/// `partial` still carries every digest that was computed successfully, keyed
/// the way the successful result would have been.
#[derive(Debug, Error)]
#[error("hashing failed for {} of {} files: {}", failures.len(), failures.len() + partial.len(), summarize(failures))]
pub struct BatchHashError {
    pub partial: std::collections::BTreeMap<PathBuf, crate::digest::Digest>,
    pub failures: Vec<HashError>,
}

fn summarize(failures: &[HashError]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
