//! In-memory document aggregate.

use crate::manifest::Manifest;
use crate::NamedContent;
use std::collections::BTreeMap;

/// A whole document: manifest, bodies, assets, modules and signatures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub manifest: Option<Manifest>,
    pub content: DocumentContent,
    pub assets: AssetBundle,
    pub signatures: SignatureBundle,
    /// Module name -> raw module bytes.
    pub modules: BTreeMap<String, Vec<u8>>,
    /// Entries outside every known slot, kept as-is.
    pub extra: NamedContent,
}

impl Document {
    pub fn new(manifest: Manifest) -> Self {
        Self {
            manifest: Some(manifest),
            ..Self::default()
        }
    }
}

/// Text bodies. An empty string means the slot is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentContent {
    pub html: String,
    pub css: String,
    pub script: String,
    pub fallback: String,
}

impl DocumentContent {
    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
            && self.css.is_empty()
            && self.script.is_empty()
            && self.fallback.is_empty()
    }

    /// A primary body or a fallback body is present.
    pub fn has_renderable_body(&self) -> bool {
        !self.html.is_empty() || !self.fallback.is_empty()
    }
}

/// Assets by category; names are relative to the category directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetBundle {
    pub images: NamedContent,
    pub fonts: NamedContent,
    pub data: NamedContent,
}

impl AssetBundle {
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.fonts.is_empty() && self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.fonts.len() + self.data.len()
    }
}

/// Opaque signature strings. Empty means absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureBundle {
    pub content: String,
    pub manifest: String,
    pub modules: BTreeMap<String, String>,
}

impl SignatureBundle {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.manifest.is_empty() && self.modules.is_empty()
    }
}
