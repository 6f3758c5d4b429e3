//! `fieldmap` command line tool.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use fieldmap_cli::config::FieldmapConfig;
use fieldmap_cli::logging::{LogConfig, init_logging};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command};
use crate::commands::{run_apply, run_check, run_kinds, run_preview, run_store};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(2);
    }

    let exit_code = match run(&cli) {
        Ok(outcome) => outcome.exit_code(),
        Err(error) => {
            eprintln!("error: {error:#}");
            2
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> anyhow::Result<commands::Outcome> {
    let cwd = std::env::current_dir()?;
    let config = FieldmapConfig::discover(cli.config.as_deref(), &cwd)?;
    let options = &config.transform;

    match &cli.command {
        Command::Kinds => run_kinds(),
        Command::Preview(args) => run_preview(args, options),
        Command::Check(args) => run_check(args, options),
        Command::Apply(args) => run_apply(args, options),
        Command::Store(command) => run_store(command, &config.store_dir(cli.store_dir.as_deref())),
    }
}

/// Logging configuration from CLI flags. An explicit `--log-level` beats
/// `-v/-q`, and either one disables `RUST_LOG`.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    LogConfig {
        level_filter: cli
            .log_level
            .map_or_else(|| cli.verbosity.tracing_level_filter(), LevelFilter::from),
        use_env_filter: !(cli.verbosity.is_present() || cli.log_level.is_some()),
        with_ansi,
        format: cli.log_format.into(),
        log_file: cli.log_file.clone(),
        log_data: cli.log_data,
        ..LogConfig::default()
    }
}
