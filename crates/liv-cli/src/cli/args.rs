use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "liv",
    version,
    about = "Pack, unpack and verify .liv document archives"
)]
pub struct Cli {
    /// YAML or JSON file overriding packaging defaults
    #[arg(long, global = true, env = "LIV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build an archive from a directory tree
    Pack(PackArgs),
    /// Extract an archive into a directory
    Unpack(UnpackArgs),
    /// List archive entries
    List(ListArgs),
    /// Check archive and document structure
    Validate(ValidateArgs),
    /// Print SHA-256 digests of files or directory trees
    Hash(HashArgs),
    /// Verify declared resources and modules against archive content
    Verify(VerifyArgs),
    /// Summarize a document
    Info(InfoArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args, Clone)]
pub struct PackArgs {
    /// Directory containing manifest.json and content/
    pub dir: PathBuf,

    #[arg(short, long)]
    pub output: PathBuf,

    /// Deflate level 0-9 (0 stores everything)
    #[arg(long)]
    pub level: Option<u8>,

    /// Skip the manifest/content pre-write check
    #[arg(long)]
    pub no_validate: bool,

    /// Keep the manifest's resource map as-is instead of regenerating it
    #[arg(long)]
    pub keep_resources: bool,
}

#[derive(clap::Args, Clone)]
pub struct UnpackArgs {
    pub archive: PathBuf,

    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(clap::Args, Clone)]
pub struct ListArgs {
    pub archive: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Clone)]
pub struct ValidateArgs {
    pub archive: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Clone)]
pub struct HashArgs {
    /// Files or directories
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Parallel workers (default from config)
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(clap::Args, Clone)]
pub struct VerifyArgs {
    pub archive: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(clap::Args, Clone)]
pub struct InfoArgs {
    pub archive: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["liv", "verify", "doc.liv", "--format", "json", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.cmd {
            Command::Verify(args) => assert_eq!(args.format, OutputFormat::Json),
            _ => panic!("expected verify"),
        }
    }

    #[test]
    fn hash_requires_a_path() {
        assert!(Cli::try_parse_from(["liv", "hash"]).is_err());
    }
}
