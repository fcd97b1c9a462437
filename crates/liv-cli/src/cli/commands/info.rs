use super::{print_issues, print_json};
use crate::cli::args::{InfoArgs, OutputFormat};
use crate::exit_codes;
use anyhow::Context;
use liv_container::codec;
use liv_container::{PackConfig, PackageManager};
use serde_json::json;

pub fn run(args: InfoArgs, config: &PackConfig) -> anyhow::Result<i32> {
    let files = codec::read_path(&args.archive, &config.read_limits)
        .with_context(|| format!("failed to read archive: {}", args.archive.display()))?;
    let stats = codec::compression_stats(&files, &config.write_options())
        .context("failed to compute compression stats")?;
    let pm = PackageManager::from_config(config);
    let doc = pm
        .assemble(files)
        .with_context(|| format!("failed to assemble {}", args.archive.display()))?;
    let document = pm.validate_structure(&doc);
    let manifest = doc.manifest.as_ref().context("archive has no manifest")?;
    let modules: Vec<&str> = doc.modules.keys().map(String::as_str).collect();

    match args.format {
        OutputFormat::Json => print_json(&json!({
            "version": manifest.version,
            "metadata": manifest.metadata,
            "resources": manifest.resources.len(),
            "assets": {
                "images": doc.assets.images.len(),
                "fonts": doc.assets.fonts.len(),
                "data": doc.assets.data.len(),
            },
            "modules": modules,
            "signed": !doc.signatures.is_empty(),
            "compression": stats,
            "document": document,
        }))?,
        OutputFormat::Text => {
            print_issues("document", &document);
            println!("title:      {}", manifest.metadata.title);
            println!("author:     {}", manifest.metadata.author);
            println!("version:    {}", manifest.version);
            println!("resources:  {}", manifest.resources.len());
            println!(
                "assets:     {} images, {} fonts, {} data",
                doc.assets.images.len(),
                doc.assets.fonts.len(),
                doc.assets.data.len()
            );
            println!("modules:    {}", modules.join(", "));
            println!("signed:     {}", !doc.signatures.is_empty());
            println!(
                "size:       {} bytes in {} files, {} bytes packed ({:.1}%)",
                stats.original_bytes,
                stats.file_count,
                stats.archive_bytes,
                stats.ratio * 100.0
            );
        }
    }
    Ok(exit_codes::EXIT_SUCCESS)
}
