//! `.liv` document container: packaging, unpacking and integrity checks.
//!
//! The archive is a ZIP file with a `manifest.json`, content bodies, assets,
//! optional WebAssembly modules and opaque signatures. Writing is
//! deterministic; reading treats the archive as untrusted input.
//!
//! - [`path_policy`]: archive-safe entry names
//! - [`digest`], [`batch`]: content hashing, single and parallel
//! - [`dedup`]: content-addressed deduplication
//! - [`codec`]: ZIP encoding and decoding
//! - [`module_format`]: WebAssembly header check
//! - [`assembler`]: entries <-> [`Document`]
//! - [`integrity`]: resource and module verification

use std::collections::BTreeMap;

pub mod assembler;
pub mod batch;
pub mod codec;
pub mod config;
pub mod dedup;
pub mod digest;
pub mod document;
pub mod error;
pub mod integrity;
pub mod layout;
pub mod manifest;
pub mod media_type;
pub mod module_format;
pub mod path_policy;
pub mod validation;

/// Archive-relative path -> bytes. Iterates in ascending path order.
pub type NamedContent = BTreeMap<String, Vec<u8>>;

pub use assembler::{deduplicate_assets, AcceptAllManifests, DocumentIssue, ManifestValidator, PackageManager};
pub use batch::BatchHasher;
pub use codec::{ReadLimits, StructureIssue, WriteOptions};
pub use config::{PackConfig, PackConfigOverrides};
pub use dedup::{deduplicate, Deduplicated};
pub use digest::{ContentHasher, Digest, HashCache, NoCache, SharedHashCache};
pub use document::{AssetBundle, Document, DocumentContent, SignatureBundle};
pub use error::{
    AssemblyError, BatchHashError, CodecError, ConfigError, HashError, ModuleFormatError, PathError,
};
pub use integrity::{IntegrityReport, IntegrityValidator, ModuleIssue, ResourceIssue};
pub use manifest::{Manifest, ModuleConfig, ModuleDescriptor, Resource};
pub use validation::ValidationResult;
