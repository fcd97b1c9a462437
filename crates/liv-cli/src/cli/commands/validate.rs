use super::{print_issues, print_json};
use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::exit_codes;
use anyhow::Context;
use liv_container::codec;
use liv_container::{PackConfig, PackageManager};
use serde_json::json;

/// Codec structure check, then document structure check when the archive
/// assembles. Both results are always reported.
pub fn run(args: ValidateArgs, config: &PackConfig) -> anyhow::Result<i32> {
    let files = codec::read_path(&args.archive, &config.read_limits)
        .with_context(|| format!("failed to read archive: {}", args.archive.display()))?;

    let structure = codec::validate_structure_with(&files, config.large_document_bytes);

    let pm = PackageManager::from_config(config);
    let (document, assembly_error) = match pm.assemble(files) {
        Ok(doc) => (Some(pm.validate_structure(&doc)), None),
        Err(e) => (None, Some(e.to_string())),
    };

    let valid = structure.is_valid()
        && assembly_error.is_none()
        && document.as_ref().is_some_and(|d| d.is_valid());

    match args.format {
        OutputFormat::Json => print_json(&json!({
            "valid": valid,
            "structure": structure,
            "document": document,
            "assembly_error": assembly_error,
        }))?,
        OutputFormat::Text => {
            print_issues("structure", &structure);
            if let Some(d) = &document {
                print_issues("document", d);
            }
            if let Some(e) = &assembly_error {
                eprintln!("error: document: {e}");
            }
            if valid {
                println!("{}: valid", args.archive.display());
            } else {
                println!("{}: invalid", args.archive.display());
            }
        }
    }

    Ok(if valid {
        exit_codes::EXIT_SUCCESS
    } else {
        exit_codes::EXIT_INVALID
    })
}
