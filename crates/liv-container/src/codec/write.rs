use super::{ordered_paths, should_compress, structure};
use crate::batch::relative_slash_path;
use crate::error::CodecError;
use crate::path_policy;
use crate::NamedContent;
use serde::Serialize;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Default deflate level.
pub const DEFAULT_COMPRESSION_LEVEL: u8 = 6;

/// Knobs for [`write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// 0 stores every entry; 1-9 are deflate levels.
    pub compression_level: u8,
    /// Refuse collections without a manifest or any `content/` entry.
    pub validate_structure: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            validate_structure: true,
        }
    }
}

impl WriteOptions {
    fn entry_options(&self, path: &str) -> SimpleFileOptions {
        let base = SimpleFileOptions::default()
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);

        if self.compression_level == 0 || !should_compress(path) {
            base.compression_method(CompressionMethod::Stored)
        } else {
            base.compression_method(CompressionMethod::Deflated)
                .compression_level(Some(i64::from(self.compression_level.min(9))))
        }
    }
}

/// Size summary for a collection written with given options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompressionStats {
    pub file_count: usize,
    pub original_bytes: u64,
    pub archive_bytes: u64,
    /// `archive_bytes / original_bytes`, 0 for empty input.
    pub ratio: f64,
}

/// Encode `files` into an in-memory archive.
///
/// Every name is checked before anything is encoded, so a bad name never
/// produces a partial archive.
pub fn write_to_vec(files: &NamedContent, options: &WriteOptions) -> Result<Vec<u8>, CodecError> {
    if options.validate_structure {
        structure::check_writable(files).map_err(|reason| CodecError::Structure { reason })?;
    }
    for path in files.keys() {
        path_policy::validate(path)?;
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for path in ordered_paths(files) {
        let bytes = &files[path];
        zip.start_file(path, options.entry_options(path))
            .map_err(|e| CodecError::zip(path, e))?;
        zip.write_all(bytes).map_err(|e| CodecError::io(path, e))?;
        tracing::debug!(path, bytes = bytes.len(), compressed = should_compress(path), "wrote entry");
    }
    let cursor = zip.finish().map_err(|e| CodecError::zip("<archive>", e))?;
    let out = cursor.into_inner();

    tracing::info!(entries = files.len(), bytes = out.len(), "archive written");
    Ok(out)
}

/// Encode `files` and copy the finished archive into `sink`.
pub fn write<W: Write>(files: &NamedContent, mut sink: W, options: &WriteOptions) -> Result<(), CodecError> {
    let bytes = write_to_vec(files, options)?;
    sink.write_all(&bytes)
        .and_then(|()| sink.flush())
        .map_err(|e| CodecError::io("<sink>", e))
}

/// Encode `files` into a file at `path`. Nothing is created if encoding fails.
pub fn write_path(files: &NamedContent, path: &Path, options: &WriteOptions) -> Result<(), CodecError> {
    let bytes = write_to_vec(files, options)?;
    std::fs::write(path, bytes).map_err(|e| CodecError::io(path, e))
}

/// Collect every regular file under `dir` as a collection.
pub fn pack_directory(dir: &Path) -> Result<NamedContent, CodecError> {
    let mut files = NamedContent::new();
    for entry in walkdir::WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            CodecError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = relative_slash_path(dir, entry.path());
        path_policy::validate(&name)?;
        let bytes = std::fs::read(entry.path()).map_err(|e| CodecError::io(entry.path(), e))?;
        files.insert(name, bytes);
    }
    tracing::debug!(dir = %dir.display(), files = files.len(), "packed directory");
    Ok(files)
}

/// Write `files` to memory and report the size change.
pub fn compression_stats(files: &NamedContent, options: &WriteOptions) -> Result<CompressionStats, CodecError> {
    let opts = WriteOptions {
        validate_structure: false,
        ..*options
    };
    let archive = write_to_vec(files, &opts)?;
    let original_bytes: u64 = files.values().map(|b| b.len() as u64).sum();
    let archive_bytes = archive.len() as u64;
    let ratio = if original_bytes == 0 {
        0.0
    } else {
        archive_bytes as f64 / original_bytes as f64
    };
    Ok(CompressionStats {
        file_count: files.len(),
        original_bytes,
        archive_bytes,
        ratio,
    })
}
