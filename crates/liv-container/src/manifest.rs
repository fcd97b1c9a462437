//! Document manifest (`manifest.json` at archive root).
//!
//! The security policy is carried through untouched; its rules live with the
//! permission engine. Resource paths use forward slashes relative to the root.

use crate::error::AssemblyError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Manifest format version written by this crate.
pub const MANIFEST_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,

    #[serde(default)]
    pub metadata: DocumentMetadata,

    #[serde(default)]
    pub security: SecurityPolicy,

    /// Declared resources keyed by archive path.
    #[serde(default)]
    pub resources: BTreeMap<String, Resource>,

    #[serde(
        default,
        rename = "wasmConfig",
        alias = "wasm_config",
        skip_serializing_if = "Option::is_none"
    )]
    pub modules: Option<ModuleConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureFlags>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            metadata: DocumentMetadata::default(),
            security: SecurityPolicy::default(),
            resources: BTreeMap::new(),
            modules: None,
            features: None,
        }
    }
}

impl Manifest {
    pub fn from_json(bytes: &[u8]) -> Result<Self, AssemblyError> {
        serde_json::from_slice(bytes).map_err(AssemblyError::ManifestParse)
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, AssemblyError> {
        let mut out = serde_json::to_vec_pretty(self).map_err(AssemblyError::ManifestSerialize)?;
        out.push(b'\n');
        Ok(out)
    }

    /// Names of configured modules, empty when there is no module section.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules
            .iter()
            .flat_map(|c| c.modules.keys().map(String::as_str))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    /// ISO 8601 UTC.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub language: String,
}

/// Opaque security section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityPolicy(pub serde_json::Value);

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self(serde_json::Value::Object(serde_json::Map::new()))
    }
}

/// One declared file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Hex SHA-256 of the content.
    #[serde(rename = "hash")]
    pub digest: String,
    pub size: u64,
    #[serde(rename = "type", default)]
    pub media_type: String,
    pub path: String,
}

/// Module section of the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModuleConfig {
    pub modules: BTreeMap<String, ModuleDescriptor>,
    /// Ceiling applied to every module.
    pub permissions: ModulePermissions,
    #[serde(alias = "memory_limit")]
    pub memory_limit: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModuleDescriptor {
    pub name: String,
    pub version: String,
    #[serde(alias = "entry_point")]
    pub entry_point: String,
    pub exports: Vec<String>,
    pub imports: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<ModulePermissions>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModulePermissions {
    #[serde(alias = "memory_limit")]
    pub memory_limit: u64,
    #[serde(alias = "allowed_imports")]
    pub allowed_imports: Vec<String>,
    /// Milliseconds.
    #[serde(alias = "cpu_time_limit")]
    pub cpu_time_limit: u64,
    #[serde(alias = "allow_networking")]
    pub allow_networking: bool,
    #[serde(alias = "allow_file_system")]
    pub allow_file_system: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureFlags {
    pub animations: bool,
    pub interactivity: bool,
    pub charts: bool,
    pub forms: bool,
    pub audio: bool,
    pub video: bool,
    pub webgl: bool,
    pub webassembly: bool,
}
