use super::print_json;
use crate::cli::args::{ListArgs, OutputFormat};
use crate::exit_codes;
use anyhow::Context;
use liv_container::codec::{self, EntryMethod};
use liv_container::PackConfig;

pub fn run(args: ListArgs, config: &PackConfig) -> anyhow::Result<i32> {
    let file = std::fs::File::open(&args.archive)
        .with_context(|| format!("failed to open archive: {}", args.archive.display()))?;
    let entries = codec::list_entries(std::io::BufReader::new(file), &config.read_limits)
        .with_context(|| format!("failed to list {}", args.archive.display()))?;

    match args.format {
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Text => {
            for e in &entries {
                let method = match &e.method {
                    EntryMethod::Stored => "stored",
                    EntryMethod::Deflated => "deflated",
                    EntryMethod::Other(m) => m.as_str(),
                };
                println!("{:>10} {:>10} {:<8} {}", e.size, e.compressed_size, method, e.path);
            }
        }
    }
    Ok(exit_codes::EXIT_SUCCESS)
}
