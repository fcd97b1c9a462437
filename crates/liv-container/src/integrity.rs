//! Resource and module integrity checks.
//!
//! Declared digests and sizes are recomputed from the archive content, never
//! trusted. Undeclared files are reported but never make a document invalid.

use crate::digest::{digest, Digest};
use crate::error::ModuleFormatError;
use crate::layout;
use crate::manifest::{Manifest, ModuleConfig, Resource};
use crate::media_type;
use crate::module_format;
use crate::validation::ValidationResult;
use crate::NamedContent;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Default module size above which a warning is raised.
pub const DEFAULT_LARGE_MODULE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceIssue {
    Missing { path: String },
    HashMismatch(HashMismatch),
    SizeMismatch(SizeMismatch),
    Undeclared { path: String },
}

impl fmt::Display for ResourceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { path } => write!(
                f,
                "resource {path} referenced in manifest but not found in files"
            ),
            Self::HashMismatch(m) => write!(
                f,
                "hash mismatch for {}: expected {}, got {}",
                m.path, m.expected_hash, m.actual_hash
            ),
            Self::SizeMismatch(m) => write!(
                f,
                "size mismatch for {}: expected {}, got {}",
                m.path, m.expected_size, m.actual_size
            ),
            Self::Undeclared { path } => {
                write!(f, "file {path} found but not referenced in manifest")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleIssue {
    Format {
        name: String,
        error: ModuleFormatError,
    },
    Missing { name: String },
    NameMismatch { key: String, declared: String },
    Large { name: String, size: u64 },
    Unconfigured { name: String },
}

impl fmt::Display for ModuleIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format { name, error } => write!(f, "WASM module {name}: {error}"),
            Self::Missing { name } => write!(f, "WASM module {name} configured but not found"),
            Self::NameMismatch { key, declared } => write!(
                f,
                "WASM module name mismatch: config says {declared}, key is {key}"
            ),
            Self::Large { name, size } => {
                write!(f, "WASM module {name} is very large ({size} bytes)")
            }
            Self::Unconfigured { name } => {
                write!(f, "WASM module {name} found but not configured")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashMismatch {
    pub path: String,
    pub expected_hash: String,
    pub actual_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeMismatch {
    pub path: String,
    pub expected_size: u64,
    pub actual_size: u64,
}

/// Structured outcome of [`IntegrityValidator::generate_report`].
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub valid: bool,
    pub total_resources: usize,
    pub validated_resources: usize,
    pub hash_mismatches: Vec<HashMismatch>,
    pub size_mismatches: Vec<SizeMismatch>,
    pub missing_resources: Vec<String>,
    pub orphaned_files: Vec<String>,
    pub module_validation: ValidationResult<ModuleIssue>,
}

/// Cross-checks declared resources and modules against actual content.
#[derive(Debug, Clone, Copy)]
pub struct IntegrityValidator {
    pub large_module_bytes: u64,
}

impl Default for IntegrityValidator {
    fn default() -> Self {
        Self {
            large_module_bytes: DEFAULT_LARGE_MODULE_BYTES,
        }
    }
}

/// Per-resource comparison shared by the string and structured reports.
enum Check {
    Missing,
    Present {
        hash: Option<HashMismatch>,
        size: Option<SizeMismatch>,
    },
}

fn check_resource(path: &str, resource: &Resource, files: &NamedContent) -> Check {
    let Some(bytes) = files.get(path) else {
        return Check::Missing;
    };
    let actual: Digest = digest(bytes);
    let hash = (!actual.matches(&resource.digest)).then(|| HashMismatch {
        path: path.to_string(),
        expected_hash: resource.digest.clone(),
        actual_hash: actual.into_string(),
    });
    let actual_size = bytes.len() as u64;
    let size = (actual_size != resource.size).then(|| SizeMismatch {
        path: path.to_string(),
        expected_size: resource.size,
        actual_size,
    });
    Check::Present { hash, size }
}

/// Files that should be declared: everything except the manifest itself.
fn orphans<'a>(
    resources: &'a BTreeMap<String, Resource>,
    files: &'a NamedContent,
) -> impl Iterator<Item = &'a String> {
    files
        .keys()
        .filter(move |p| p.as_str() != layout::MANIFEST && !resources.contains_key(*p))
}

impl IntegrityValidator {
    pub fn new(large_module_bytes: u64) -> Self {
        Self { large_module_bytes }
    }

    pub fn validate_resources(
        &self,
        resources: &BTreeMap<String, Resource>,
        files: &NamedContent,
    ) -> ValidationResult<ResourceIssue> {
        let mut result = ValidationResult::new();

        for (path, resource) in resources {
            match check_resource(path, resource, files) {
                Check::Missing => result.fail(ResourceIssue::Missing { path: path.clone() }),
                Check::Present { hash, size } => {
                    if let Some(m) = hash {
                        result.fail(ResourceIssue::HashMismatch(m));
                    }
                    if let Some(m) = size {
                        result.fail(ResourceIssue::SizeMismatch(m));
                    }
                }
            }
        }

        for path in orphans(resources, files) {
            result.warn(ResourceIssue::Undeclared { path: path.clone() });
        }

        result
    }

    pub fn validate_modules(
        &self,
        config: Option<&ModuleConfig>,
        binaries: &BTreeMap<String, Vec<u8>>,
    ) -> ValidationResult<ModuleIssue> {
        let mut result = ValidationResult::new();
        let Some(config) = config else {
            return result;
        };

        for (name, descriptor) in &config.modules {
            match binaries.get(name) {
                Some(bytes) => {
                    if let Err(error) = module_format::sniff(bytes) {
                        result.fail(ModuleIssue::Format {
                            name: name.clone(),
                            error,
                        });
                    }
                    let size = bytes.len() as u64;
                    if size > self.large_module_bytes {
                        result.warn(ModuleIssue::Large {
                            name: name.clone(),
                            size,
                        });
                    }
                }
                None => result.fail(ModuleIssue::Missing { name: name.clone() }),
            }

            if descriptor.name != *name {
                result.fail(ModuleIssue::NameMismatch {
                    key: name.clone(),
                    declared: descriptor.name.clone(),
                });
            }
        }

        for name in binaries.keys().filter(|n| !config.modules.contains_key(*n)) {
            tracing::warn!(module = %name, "module binary without configuration");
            result.warn(ModuleIssue::Unconfigured { name: name.clone() });
        }

        result
    }

    pub fn generate_report(
        &self,
        manifest: &Manifest,
        files: &NamedContent,
        binaries: &BTreeMap<String, Vec<u8>>,
    ) -> IntegrityReport {
        let mut report = IntegrityReport {
            valid: true,
            total_resources: manifest.resources.len(),
            validated_resources: 0,
            hash_mismatches: Vec::new(),
            size_mismatches: Vec::new(),
            missing_resources: Vec::new(),
            orphaned_files: Vec::new(),
            module_validation: ValidationResult::new(),
        };

        for (path, resource) in &manifest.resources {
            match check_resource(path, resource, files) {
                Check::Missing => report.missing_resources.push(path.clone()),
                Check::Present { hash, size } => {
                    report.validated_resources += 1;
                    report.hash_mismatches.extend(hash);
                    report.size_mismatches.extend(size);
                }
            }
        }

        report.orphaned_files = orphans(&manifest.resources, files).cloned().collect();
        report.module_validation = self.validate_modules(manifest.modules.as_ref(), binaries);

        report.valid = report.hash_mismatches.is_empty()
            && report.size_mismatches.is_empty()
            && report.missing_resources.is_empty()
            && report.module_validation.is_valid();

        tracing::info!(
            valid = report.valid,
            total = report.total_resources,
            validated = report.validated_resources,
            orphaned = report.orphaned_files.len(),
            "integrity report"
        );
        report
    }
}

/// Declare every entry except the manifest as a resource.
pub fn generate_resource_map(files: &NamedContent) -> BTreeMap<String, Resource> {
    files
        .iter()
        .filter(|(path, _)| path.as_str() != layout::MANIFEST)
        .map(|(path, bytes)| {
            let resource = Resource {
                digest: digest(bytes).into_string(),
                size: bytes.len() as u64,
                media_type: media_type::detect(path).to_string(),
                path: path.clone(),
            };
            (path.clone(), resource)
        })
        .collect()
}

/// Refresh digest and size of already-declared resources; fill empty media types.
pub fn update_resource_map(resources: &mut BTreeMap<String, Resource>, files: &NamedContent) {
    for (path, resource) in resources.iter_mut() {
        let Some(bytes) = files.get(path) else {
            continue;
        };
        resource.digest = digest(bytes).into_string();
        resource.size = bytes.len() as u64;
        if resource.media_type.is_empty() {
            resource.media_type = media_type::detect(path).to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ModuleDescriptor;
    use crate::module_format::{WASM_MAGIC, WASM_VERSION};

    fn files() -> NamedContent {
        let mut f = NamedContent::new();
        f.insert("manifest.json".into(), b"{}".to_vec());
        f.insert("content/index.html".into(), b"<html></html>".to_vec());
        f.insert("assets/data/table.csv".into(), b"a,b\n1,2\n".to_vec());
        f
    }

    fn wasm() -> Vec<u8> {
        let mut w = WASM_MAGIC.to_vec();
        w.extend_from_slice(&WASM_VERSION);
        w
    }

    fn config(names: &[&str]) -> ModuleConfig {
        let mut cfg = ModuleConfig::default();
        for n in names {
            cfg.modules.insert(
                n.to_string(),
                ModuleDescriptor {
                    name: n.to_string(),
                    ..Default::default()
                },
            );
        }
        cfg
    }

    #[test]
    fn generated_map_validates_cleanly() {
        let f = files();
        let resources = generate_resource_map(&f);
        assert_eq!(resources.len(), 2);
        assert_eq!(resources["assets/data/table.csv"].media_type, "text/csv");

        let r = IntegrityValidator::default().validate_resources(&resources, &f);
        assert!(r.is_valid());
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn upper_case_digest_is_accepted() {
        let f = files();
        let mut resources = generate_resource_map(&f);
        for r in resources.values_mut() {
            r.digest = r.digest.to_ascii_uppercase();
        }
        assert!(IntegrityValidator::default()
            .validate_resources(&resources, &f)
            .is_valid());
    }

    #[test]
    fn missing_mismatched_and_undeclared() {
        let mut f = files();
        let mut resources = generate_resource_map(&f);
        resources.insert(
            "assets/images/gone.png".into(),
            Resource {
                digest: "00".into(),
                size: 1,
                media_type: "image/png".into(),
                path: "assets/images/gone.png".into(),
            },
        );
        f.insert("content/index.html".into(), b"<html>changed</html>".to_vec());
        f.insert("extra.txt".into(), b"x".to_vec());

        let r = IntegrityValidator::default().validate_resources(&resources, &f);
        let errors = r.error_messages();
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors.contains(
            &"resource assets/images/gone.png referenced in manifest but not found in files".to_string()
        ));
        assert!(errors.iter().any(|e| e.starts_with("hash mismatch for content/index.html")));
        assert!(errors.contains(&"size mismatch for content/index.html: expected 13, got 20".to_string()));
        assert_eq!(
            r.warning_messages(),
            vec!["file extra.txt found but not referenced in manifest"]
        );
    }

    #[test]
    fn modules_without_config_are_trivially_valid() {
        let mut bins = BTreeMap::new();
        bins.insert("x".to_string(), b"junk".to_vec());
        let r = IntegrityValidator::default().validate_modules(None, &bins);
        assert!(r.is_valid());
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn module_checks() {
        let mut cfg = config(&["chart", "bad", "gone"]);
        if let Some(d) = cfg.modules.get_mut("chart") {
            d.name = "graph".into();
        }
        let mut bins = BTreeMap::new();
        bins.insert("chart".to_string(), wasm());
        bins.insert("bad".to_string(), b"\x00asm\x02\x00\x00\x00".to_vec());
        bins.insert("stray".to_string(), wasm());

        let r = IntegrityValidator::default().validate_modules(Some(&cfg), &bins);
        assert_eq!(
            r.errors,
            vec![
                ModuleIssue::Format {
                    name: "bad".into(),
                    error: ModuleFormatError::UnsupportedVersion
                },
                ModuleIssue::NameMismatch {
                    key: "chart".into(),
                    declared: "graph".into()
                },
                ModuleIssue::Missing { name: "gone".into() },
            ]
        );
        assert_eq!(r.warnings, vec![ModuleIssue::Unconfigured { name: "stray".into() }]);
        assert_eq!(
            r.errors[0].to_string(),
            "WASM module bad: unsupported WASM version"
        );
    }

    #[test]
    fn large_module_warns_with_configured_threshold() {
        let cfg = config(&["big"]);
        let mut bins = BTreeMap::new();
        let mut big = wasm();
        big.extend_from_slice(&[0; 32]);
        bins.insert("big".to_string(), big);

        let r = IntegrityValidator::new(16).validate_modules(Some(&cfg), &bins);
        assert!(r.is_valid());
        assert_eq!(r.warnings, vec![ModuleIssue::Large { name: "big".into(), size: 40 }]);
    }

    #[test]
    fn size_mismatch_report() {
        let mut f = files();
        f.insert("assets/data/blob.bin".into(), vec![0; 900]);
        let mut manifest = Manifest::default();
        manifest.resources = generate_resource_map(&f);
        if let Some(r) = manifest.resources.get_mut("assets/data/blob.bin") {
            r.size = 1024;
        }
        f.insert("orphan.txt".into(), b"o".to_vec());

        let report = IntegrityValidator::default().generate_report(&manifest, &f, &BTreeMap::new());
        assert!(!report.valid);
        assert_eq!(
            report.size_mismatches,
            vec![SizeMismatch {
                path: "assets/data/blob.bin".into(),
                expected_size: 1024,
                actual_size: 900
            }]
        );
        assert!(report.hash_mismatches.is_empty());
        assert_eq!(report.orphaned_files, vec!["orphan.txt"]);
        assert_eq!(report.total_resources, 3);
        assert_eq!(report.validated_resources, 3);
    }

    #[test]
    fn orphans_alone_keep_report_valid() {
        let mut f = files();
        let mut manifest = Manifest::default();
        manifest.resources = generate_resource_map(&f);
        f.insert("notes/readme.txt".into(), b"hi".to_vec());

        let report = IntegrityValidator::default().generate_report(&manifest, &f, &BTreeMap::new());
        assert!(report.valid);
        assert_eq!(report.orphaned_files, vec!["notes/readme.txt"]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["module_validation"]["valid"], true);
        assert_eq!(json["orphaned_files"][0], "notes/readme.txt");
    }

    #[test]
    fn update_refreshes_declared_entries_only() {
        let f = files();
        let mut resources = BTreeMap::new();
        resources.insert(
            "content/index.html".to_string(),
            Resource {
                digest: "stale".into(),
                size: 0,
                media_type: String::new(),
                path: "content/index.html".into(),
            },
        );
        update_resource_map(&mut resources, &f);
        let r = &resources["content/index.html"];
        assert_eq!(r.digest, digest(b"<html></html>").into_string());
        assert_eq!(r.size, 13);
        assert_eq!(r.media_type, "text/html");
        assert_eq!(resources.len(), 1);
    }
}
