use super::limits::{ByteBudget, ReadLimits};
use crate::error::CodecError;
use crate::path_policy;
use crate::NamedContent;
use serde::Serialize;
use std::io::{Cursor, Read, Seek};
use std::path::{Component, Path, PathBuf};
use zip::{CompressionMethod, ZipArchive};

const ARCHIVE: &str = "<archive>";

/// One archive entry as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub path: String,
    pub size: u64,
    pub compressed_size: u64,
    pub method: EntryMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryMethod {
    Stored,
    Deflated,
    Other(String),
}

impl From<CompressionMethod> for EntryMethod {
    fn from(m: CompressionMethod) -> Self {
        match m {
            CompressionMethod::Stored => Self::Stored,
            CompressionMethod::Deflated => Self::Deflated,
            other => Self::Other(format!("{other:?}")),
        }
    }
}

fn open<R: Read + Seek>(source: R, limits: &ReadLimits) -> Result<ZipArchive<R>, CodecError> {
    let archive = ZipArchive::new(source).map_err(|e| CodecError::zip(ARCHIVE, e))?;
    if archive.len() > limits.max_entries {
        return Err(CodecError::LimitExceeded {
            path: ARCHIVE.to_string(),
            limit: format!(
                "{} entries, at most {} allowed",
                archive.len(),
                limits.max_entries
            ),
        });
    }
    Ok(archive)
}

/// Decode an archive into a collection.
///
/// Directory entries are skipped. Every other entry name must pass the path
/// policy; a single bad name fails the whole read.
pub fn read<R: Read + Seek>(source: R, limits: &ReadLimits) -> Result<NamedContent, CodecError> {
    let mut archive = open(source, limits)?;
    let mut budget = ByteBudget::new(limits.max_total_bytes);
    let mut files = NamedContent::new();

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| CodecError::zip(format!("entry #{i}"), e))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        path_policy::validate(&name)?;

        let mut bytes = Vec::new();
        (&mut entry)
            .take(budget.probe())
            .read_to_end(&mut bytes)
            .map_err(|e| CodecError::io(&name, e))?;
        budget
            .charge(bytes.len() as u64)
            .map_err(|limit| CodecError::LimitExceeded {
                path: name.clone(),
                limit,
            })?;

        tracing::debug!(path = %name, bytes = bytes.len(), "read entry");
        if files.insert(name.clone(), bytes).is_some() {
            return Err(CodecError::DuplicateEntry { path: name });
        }
    }

    tracing::info!(entries = files.len(), "archive read");
    Ok(files)
}

pub fn read_bytes(bytes: &[u8], limits: &ReadLimits) -> Result<NamedContent, CodecError> {
    read(Cursor::new(bytes), limits)
}

pub fn read_path(path: &Path, limits: &ReadLimits) -> Result<NamedContent, CodecError> {
    let file = std::fs::File::open(path).map_err(|e| CodecError::io(path, e))?;
    read(std::io::BufReader::new(file), limits)
}

/// Destination of `name` under `root`, or an error if it would leave `root`.
fn contained_destination(root: &Path, name: &str) -> Result<PathBuf, CodecError> {
    let mut dest = root.to_path_buf();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => dest.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(CodecError::EscapesRoot {
                    path: name.to_string(),
                });
            }
        }
    }
    if dest == root || !dest.starts_with(root) {
        return Err(CodecError::EscapesRoot {
            path: name.to_string(),
        });
    }
    Ok(dest)
}

/// Decode an archive and write each entry below `root`.
///
/// The whole archive is decoded and every destination derived before the
/// first file is written.
pub fn extract_to_dir<R: Read + Seek>(
    source: R,
    root: &Path,
    limits: &ReadLimits,
) -> Result<Vec<PathBuf>, CodecError> {
    let files = read(source, limits)?;

    let mut planned = Vec::with_capacity(files.len());
    for (name, bytes) in &files {
        planned.push((contained_destination(root, name)?, bytes));
    }

    std::fs::create_dir_all(root).map_err(|e| CodecError::io(root, e))?;
    let mut written = Vec::with_capacity(planned.len());
    for (dest, bytes) in planned {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CodecError::io(parent, e))?;
        }
        std::fs::write(&dest, bytes).map_err(|e| CodecError::io(&dest, e))?;
        written.push(dest);
    }

    tracing::info!(root = %root.display(), files = written.len(), "archive extracted");
    Ok(written)
}

/// Entry metadata in archive order, without decompressing.
pub fn list_entries<R: Read + Seek>(source: R, limits: &ReadLimits) -> Result<Vec<EntryInfo>, CodecError> {
    let mut archive = open(source, limits)?;
    let mut out = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive
            .by_index_raw(i)
            .map_err(|e| CodecError::zip(format!("entry #{i}"), e))?;
        if entry.is_dir() {
            continue;
        }
        out.push(EntryInfo {
            path: entry.name().to_string(),
            size: entry.size(),
            compressed_size: entry.compressed_size(),
            method: entry.compression().into(),
        });
    }
    Ok(out)
}
