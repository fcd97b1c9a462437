use crate::cli::args::PackArgs;
use crate::exit_codes;
use anyhow::Context;
use liv_container::codec::{self, WriteOptions};
use liv_container::integrity::generate_resource_map;
use liv_container::layout::MANIFEST;
use liv_container::{Manifest, NamedContent, PackConfig};

pub fn run(args: PackArgs, config: &PackConfig) -> anyhow::Result<i32> {
    let mut files = codec::pack_directory(&args.dir)
        .with_context(|| format!("failed to read directory: {}", args.dir.display()))?;

    if !args.keep_resources {
        declare_resources(&mut files)?;
    }

    let level = args.level.unwrap_or(config.compression_level);
    if level > liv_container::config::MAX_COMPRESSION_LEVEL {
        anyhow::bail!("compression level {level} is out of range 0-9");
    }
    let options = WriteOptions {
        compression_level: level,
        validate_structure: config.validate_structure && !args.no_validate,
    };

    codec::write_path(&files, &args.output, &options)
        .with_context(|| format!("failed to write archive: {}", args.output.display()))?;

    eprintln!(
        "packed {} entries into {}",
        files.len(),
        args.output.display()
    );
    Ok(exit_codes::EXIT_SUCCESS)
}

/// Rewrite `manifest.json` with a resource map covering every other entry.
fn declare_resources(files: &mut NamedContent) -> anyhow::Result<()> {
    let Some(raw) = files.get(MANIFEST) else {
        return Ok(());
    };
    let mut manifest = Manifest::from_json(raw).context("failed to parse manifest.json")?;
    manifest.resources = generate_resource_map(files);
    let bytes = manifest.to_json_pretty()?;
    files.insert(MANIFEST.to_string(), bytes);
    tracing::debug!(resources = manifest.resources.len(), "declared resources");
    Ok(())
}
