use super::{print_issues, print_json};
use crate::cli::args::{OutputFormat, VerifyArgs};
use crate::exit_codes;
use anyhow::Context;
use liv_container::codec;
use liv_container::{IntegrityValidator, PackConfig, PackageManager};

/// Integrity report plus the document structure check; either failing fails
/// the run.
pub fn run(args: VerifyArgs, config: &PackConfig) -> anyhow::Result<i32> {
    let files = codec::read_path(&args.archive, &config.read_limits)
        .with_context(|| format!("failed to read archive: {}", args.archive.display()))?;

    let pm = PackageManager::from_config(config);
    let doc = pm
        .assemble(files.clone())
        .with_context(|| format!("failed to assemble {}", args.archive.display()))?;
    let document = pm.validate_structure(&doc);
    let manifest = doc
        .manifest
        .as_ref()
        .context("archive has no manifest")?;

    let report = IntegrityValidator::new(config.large_module_bytes).generate_report(
        manifest,
        &files,
        &doc.modules,
    );
    let valid = report.valid && document.is_valid();

    match args.format {
        OutputFormat::Json => {
            let mut out = serde_json::to_value(&report)?;
            out["valid"] = valid.into();
            out["document"] = serde_json::to_value(&document)?;
            print_json(&out)?
        }
        OutputFormat::Text => {
            for m in &report.hash_mismatches {
                eprintln!(
                    "error: hash mismatch for {}: expected {}, got {}",
                    m.path, m.expected_hash, m.actual_hash
                );
            }
            for m in &report.size_mismatches {
                eprintln!(
                    "error: size mismatch for {}: expected {}, got {}",
                    m.path, m.expected_size, m.actual_size
                );
            }
            for p in &report.missing_resources {
                eprintln!("error: resource {p} referenced in manifest but not found in files");
            }
            for p in &report.orphaned_files {
                eprintln!("warning: file {p} found but not referenced in manifest");
            }
            print_issues("modules", &report.module_validation);
            print_issues("document", &document);
            println!(
                "{}: {} ({}/{} resources verified)",
                args.archive.display(),
                if valid { "OK" } else { "FAILED" },
                report.validated_resources,
                report.total_resources
            );
        }
    }

    Ok(if valid {
        exit_codes::EXIT_SUCCESS
    } else {
        exit_codes::EXIT_INVALID
    })
}
