//! Command-line app taking glyph inventory of TrueType fonts and checking text coverage.

use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;

mod cli;

fn main() -> anyhow::Result<ExitCode> {
    let env = env_logger::Env::default().default_filter_or("warn");
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .init();
    Cli::parse().run()
}
