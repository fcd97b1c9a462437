use super::args::{Cli, Command};
use anyhow::Context;
use liv_container::{PackConfig, ValidationResult};
use std::fmt::Display;
use std::path::Path;

pub mod hash;
pub mod info;
pub mod list;
pub mod pack;
pub mod unpack;
pub mod validate;
pub mod verify;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let config = load_config(cli.config.as_deref())?;
    match cli.cmd {
        Command::Pack(args) => pack::run(args, &config),
        Command::Unpack(args) => unpack::run(args, &config),
        Command::List(args) => list::run(args, &config),
        Command::Validate(args) => validate::run(args, &config),
        Command::Hash(args) => hash::run(args, &config),
        Command::Verify(args) => verify::run(args, &config),
        Command::Info(args) => info::run(args, &config),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PackConfig> {
    PackConfig::load(path).context("failed to load configuration")
}

/// Print a validation result to stderr, errors first.
pub(crate) fn print_issues<K: Display>(label: &str, result: &ValidationResult<K>) {
    for e in &result.errors {
        eprintln!("error: {label}: {e}");
    }
    for w in &result.warnings {
        eprintln!("warning: {label}: {w}");
    }
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
