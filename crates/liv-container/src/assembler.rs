//! Document assembly: entry collection <-> [`Document`].
//!
//! Partitioning goes through the slot table in [`crate::layout`], so reading
//! and writing agree on every path. `validate_structure` reconciles the
//! manifest's module declarations with the binaries and signatures actually
//! present; `read_document` and `write_document` run it on every pass.

use crate::codec::{self, ReadLimits, WriteOptions};
use crate::config::PackConfig;
use crate::dedup::deduplicate;
use crate::document::{AssetBundle, Document};
use crate::error::{AssemblyError, CodecError};
use crate::layout::{self, Slot};
use crate::manifest::Manifest;
use crate::validation::ValidationResult;
use crate::NamedContent;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{Read, Seek, Write};
use std::path::Path;
use std::sync::Arc;

/// Field-level manifest rules provided by another component.
pub trait ManifestValidator: Send + Sync {
    fn validate(&self, manifest: &Manifest) -> ValidationResult<String>;
}

/// Validator that accepts every manifest.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAllManifests;

impl ManifestValidator for AcceptAllManifests {
    fn validate(&self, _manifest: &Manifest) -> ValidationResult<String> {
        ValidationResult::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentIssue {
    MissingManifest,
    MissingContent,
    NoRenderableBody,
    ModuleNotFound { name: String },
    ModuleNotReferenced { name: String },
    SignatureWithoutModule { name: String },
    /// Module name whose archive path lands in another slot.
    ReservedModuleName { name: String, path: String },
    NoAssets,
    UnknownEntry { path: String },
    /// Reported by the [`ManifestValidator`].
    Manifest(String),
}

impl fmt::Display for DocumentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingManifest => f.write_str("document has no manifest"),
            Self::MissingContent => f.write_str("document has no content"),
            Self::NoRenderableBody => {
                f.write_str("document must have either HTML content or static fallback")
            }
            Self::ModuleNotFound { name } => {
                write!(f, "WASM module '{name}' referenced in manifest but not found")
            }
            Self::ModuleNotReferenced { name } => {
                write!(f, "WASM module '{name}' found but not referenced in manifest")
            }
            Self::SignatureWithoutModule { name } => {
                write!(f, "signature for WASM module '{name}' but module not found")
            }
            Self::ReservedModuleName { name, path } => {
                write!(f, "WASM module name '{name}' maps to reserved path {path}")
            }
            Self::NoAssets => f.write_str("document has no assets"),
            Self::UnknownEntry { path } => write!(f, "unrecognized entry kept as-is: {path}"),
            Self::Manifest(msg) => write!(f, "manifest: {msg}"),
        }
    }
}

impl From<String> for DocumentIssue {
    fn from(msg: String) -> Self {
        Self::Manifest(msg)
    }
}

fn insert_unique(
    files: &mut NamedContent,
    path: String,
    bytes: Vec<u8>,
) -> Result<(), AssemblyError> {
    match files.entry(path) {
        Entry::Occupied(e) => Err(AssemblyError::PathCollision {
            path: e.key().clone(),
        }),
        Entry::Vacant(e) => {
            e.insert(bytes);
            Ok(())
        }
    }
}

/// Archive path of a module slot entry, or `Err(path)` when that path would be
/// read back as something else.
fn module_slot_path(slot: Slot, name: &str) -> Result<String, String> {
    let path = layout::path_for(slot, name);
    match layout::classify(&path) {
        Some(found) if found.slot == slot && found.name == name => Ok(path),
        _ => Err(path),
    }
}

fn utf8(path: &str, bytes: Vec<u8>) -> Result<String, AssemblyError> {
    String::from_utf8(bytes).map_err(|_| AssemblyError::NonUtf8Content {
        path: path.to_string(),
    })
}

/// Orchestrates codec, assembly and validation.
#[derive(Clone)]
pub struct PackageManager {
    manifest_validator: Arc<dyn ManifestValidator>,
    write_options: WriteOptions,
    read_limits: ReadLimits,
    large_document_bytes: u64,
}

impl fmt::Debug for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageManager")
            .field("write_options", &self.write_options)
            .field("read_limits", &self.read_limits)
            .field("large_document_bytes", &self.large_document_bytes)
            .finish_non_exhaustive()
    }
}

impl Default for PackageManager {
    fn default() -> Self {
        Self::from_config(&PackConfig::default())
    }
}

impl PackageManager {
    pub fn from_config(config: &PackConfig) -> Self {
        Self {
            manifest_validator: Arc::new(AcceptAllManifests),
            write_options: config.write_options(),
            read_limits: config.read_limits,
            large_document_bytes: config.large_document_bytes,
        }
    }

    pub fn with_manifest_validator(mut self, validator: Arc<dyn ManifestValidator>) -> Self {
        self.manifest_validator = validator;
        self
    }

    pub fn write_options(&self) -> &WriteOptions {
        &self.write_options
    }

    pub fn read_limits(&self) -> &ReadLimits {
        &self.read_limits
    }

    /// Build a document from archive entries.
    pub fn assemble(&self, mut files: NamedContent) -> Result<Document, AssemblyError> {
        let manifest_bytes = files
            .remove(layout::MANIFEST)
            .ok_or(AssemblyError::MissingManifest)?;
        let mut doc = Document::new(Manifest::from_json(&manifest_bytes)?);
        let mut module_paths: BTreeMap<String, String> = BTreeMap::new();

        for (path, bytes) in files {
            let Some(found) = layout::classify(&path) else {
                tracing::debug!(path = %path, "entry outside known slots");
                doc.extra.insert(path, bytes);
                continue;
            };
            let name = found.name.to_string();
            match found.slot {
                // Removed above.
                Slot::Manifest => {}
                Slot::Html => doc.content.html = utf8(&path, bytes)?,
                Slot::Css => doc.content.css = utf8(&path, bytes)?,
                Slot::Script => doc.content.script = utf8(&path, bytes)?,
                Slot::Fallback => doc.content.fallback = utf8(&path, bytes)?,
                Slot::ContentSignature => doc.signatures.content = utf8(&path, bytes)?,
                Slot::ManifestSignature => doc.signatures.manifest = utf8(&path, bytes)?,
                Slot::ModuleSignature => {
                    let sig = utf8(&path, bytes)?;
                    doc.signatures.modules.insert(name, sig);
                }
                Slot::Image => {
                    doc.assets.images.insert(name, bytes);
                }
                Slot::Font => {
                    doc.assets.fonts.insert(name, bytes);
                }
                Slot::Data => {
                    doc.assets.data.insert(name, bytes);
                }
                Slot::Module => {
                    if let Some(first) = module_paths.get(&name) {
                        return Err(AssemblyError::DuplicateModule {
                            name,
                            first: first.clone(),
                            second: path,
                        });
                    }
                    module_paths.insert(name.clone(), path);
                    doc.modules.insert(name, bytes);
                }
            }
        }

        tracing::debug!(
            assets = doc.assets.len(),
            modules = doc.modules.len(),
            extra = doc.extra.len(),
            "document assembled"
        );
        Ok(doc)
    }

    /// Flatten a document into archive entries. Empty text slots are omitted.
    pub fn disassemble(&self, doc: &Document) -> Result<NamedContent, AssemblyError> {
        let mut files = NamedContent::new();

        if let Some(manifest) = &doc.manifest {
            files.insert(layout::MANIFEST.to_string(), manifest.to_json_pretty()?);
        }

        let text_slots = [
            (Slot::Html, &doc.content.html),
            (Slot::Css, &doc.content.css),
            (Slot::Script, &doc.content.script),
            (Slot::Fallback, &doc.content.fallback),
            (Slot::ContentSignature, &doc.signatures.content),
            (Slot::ManifestSignature, &doc.signatures.manifest),
        ];
        for (slot, text) in text_slots {
            if !text.is_empty() {
                insert_unique(&mut files, layout::path_for(slot, ""), text.as_bytes().to_vec())?;
            }
        }

        for (slot, group) in [
            (Slot::Image, &doc.assets.images),
            (Slot::Font, &doc.assets.fonts),
            (Slot::Data, &doc.assets.data),
            (Slot::Module, &doc.modules),
        ] {
            for (name, bytes) in group {
                insert_unique(&mut files, layout::path_for(slot, name), bytes.clone())?;
            }
        }

        for (name, sig) in &doc.signatures.modules {
            insert_unique(
                &mut files,
                layout::path_for(Slot::ModuleSignature, name),
                sig.as_bytes().to_vec(),
            )?;
        }

        for (path, bytes) in &doc.extra {
            files.entry(path.clone()).or_insert_with(|| bytes.clone());
        }

        Ok(files)
    }

    /// Reconcile manifest, content, modules and signatures.
    pub fn validate_structure(&self, doc: &Document) -> ValidationResult<DocumentIssue> {
        let mut result = ValidationResult::new();

        match &doc.manifest {
            None => result.fail(DocumentIssue::MissingManifest),
            Some(manifest) => {
                result.merge(self.manifest_validator.validate(manifest));

                for name in manifest.module_names() {
                    if !doc.modules.contains_key(name) {
                        result.fail(DocumentIssue::ModuleNotFound {
                            name: name.to_string(),
                        });
                    }
                }

                let declared = |name: &str| {
                    manifest
                        .modules
                        .as_ref()
                        .is_some_and(|c| c.modules.contains_key(name))
                };
                for name in doc.modules.keys().filter(|n| !declared(n.as_str())) {
                    tracing::warn!(module = %name, "module binary not referenced in manifest");
                    result.warn(DocumentIssue::ModuleNotReferenced { name: name.clone() });
                }
            }
        }

        if doc.content.is_empty() {
            result.fail(DocumentIssue::MissingContent);
        } else if !doc.content.has_renderable_body() {
            result.fail(DocumentIssue::NoRenderableBody);
        }

        let module_names: BTreeSet<&String> = doc
            .modules
            .keys()
            .chain(doc.signatures.modules.keys())
            .collect();
        for name in module_names {
            for slot in [Slot::Module, Slot::ModuleSignature] {
                if let Err(path) = module_slot_path(slot, name) {
                    result.fail(DocumentIssue::ReservedModuleName {
                        name: name.clone(),
                        path,
                    });
                }
            }
        }

        for name in doc.signatures.modules.keys() {
            if !doc.modules.contains_key(name) {
                result.warn(DocumentIssue::SignatureWithoutModule { name: name.clone() });
            }
        }

        if doc.assets.is_empty() {
            result.warn(DocumentIssue::NoAssets);
        }

        for path in doc.extra.keys() {
            result.warn(DocumentIssue::UnknownEntry { path: path.clone() });
        }

        result
    }

    /// Decode, check and assemble an archive. Any validation error is fatal.
    pub fn read_document<R: Read + Seek>(&self, source: R) -> Result<Document, AssemblyError> {
        let files = codec::read(source, &self.read_limits)?;

        let structure = codec::validate_structure_with(&files, self.large_document_bytes);
        log_warnings(&structure);
        if !structure.is_valid() {
            return Err(AssemblyError::Invalid {
                errors: structure.error_messages(),
            });
        }

        let doc = self.assemble(files)?;
        self.ensure_valid(&doc)?;
        Ok(doc)
    }

    pub fn read_document_path(&self, path: &Path) -> Result<Document, AssemblyError> {
        let file = std::fs::File::open(path).map_err(|e| CodecError::io(path, e))?;
        self.read_document(std::io::BufReader::new(file))
    }

    /// Validate, flatten and encode a document into `sink`.
    pub fn write_document<W: Write>(&self, doc: &Document, sink: W) -> Result<(), AssemblyError> {
        let files = self.prepare(doc)?;
        codec::write(&files, sink, &self.write_options)?;
        Ok(())
    }

    pub fn write_document_path(&self, doc: &Document, path: &Path) -> Result<(), AssemblyError> {
        let files = self.prepare(doc)?;
        codec::write_path(&files, path, &self.write_options)?;
        Ok(())
    }

    fn prepare(&self, doc: &Document) -> Result<NamedContent, AssemblyError> {
        self.ensure_valid(doc)?;
        self.disassemble(doc)
    }

    fn ensure_valid(&self, doc: &Document) -> Result<(), AssemblyError> {
        let result = self.validate_structure(doc);
        log_warnings(&result);
        if result.is_valid() {
            Ok(())
        } else {
            Err(AssemblyError::Invalid {
                errors: result.error_messages(),
            })
        }
    }
}

fn log_warnings<K: fmt::Display>(result: &ValidationResult<K>) {
    for w in &result.warnings {
        tracing::warn!(warning = %w, "validation warning");
    }
}

/// Deduplicate assets across all three categories.
///
/// Returned duplicate map is keyed by full archive path.
pub fn deduplicate_assets(assets: &AssetBundle) -> (AssetBundle, BTreeMap<String, String>) {
    let mut flat = NamedContent::new();
    for (slot, group) in [
        (Slot::Image, &assets.images),
        (Slot::Font, &assets.fonts),
        (Slot::Data, &assets.data),
    ] {
        for (name, bytes) in group {
            flat.insert(layout::path_for(slot, name), bytes.clone());
        }
    }

    let deduped = deduplicate(&flat);
    let mut out = AssetBundle::default();
    for (path, bytes) in deduped.content {
        let Some(found) = layout::classify(&path) else {
            continue;
        };
        let name = found.name.to_string();
        match found.slot {
            Slot::Image => out.images.insert(name, bytes),
            Slot::Font => out.fonts.insert(name, bytes),
            _ => out.data.insert(name, bytes),
        };
    }
    (out, deduped.duplicates)
}
