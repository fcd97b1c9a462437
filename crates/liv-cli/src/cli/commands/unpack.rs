use crate::cli::args::UnpackArgs;
use crate::exit_codes;
use anyhow::Context;
use liv_container::codec;
use liv_container::PackConfig;

pub fn run(args: UnpackArgs, config: &PackConfig) -> anyhow::Result<i32> {
    let file = std::fs::File::open(&args.archive)
        .with_context(|| format!("failed to open archive: {}", args.archive.display()))?;
    let written = codec::extract_to_dir(
        std::io::BufReader::new(file),
        &args.output,
        &config.read_limits,
    )
    .with_context(|| format!("failed to extract {}", args.archive.display()))?;

    eprintln!(
        "extracted {} files into {}",
        written.len(),
        args.output.display()
    );
    Ok(exit_codes::EXIT_SUCCESS)
}
