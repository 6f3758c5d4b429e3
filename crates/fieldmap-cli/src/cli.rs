//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use fieldmap_cli::logging::LogFormat;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(
    name = "fieldmap",
    version,
    about = "Preview, check and apply field transformation rules",
    long_about = "Preview, check and apply field transformation rules.\n\n\
                  A rule maps source fields of an integration endpoint to target fields,\n\
                  each through an ordered pipeline of transformation steps."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Include field values in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Configuration file (default: ./fieldmap.toml when present).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Rule store directory (overrides the config file).
    #[arg(long = "store-dir", value_name = "DIR", global = true)]
    pub store_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the available step kinds.
    Kinds,

    /// Run one mapping's pipeline on a sample value.
    Preview(PreviewArgs),

    /// Check a rule file for problems without running it.
    Check(CheckArgs),

    /// Transform the rows of a CSV file with a rule.
    Apply(ApplyArgs),

    /// Manage stored rules.
    #[command(subcommand)]
    Store(StoreCommand),
}

#[derive(Args)]
pub struct PreviewArgs {
    /// Rule file (JSON).
    #[arg(value_name = "RULE_FILE")]
    pub rule_file: PathBuf,

    /// Source field whose mapping to run.
    #[arg(value_name = "SOURCE_FIELD")]
    pub source_field: String,

    /// Sample input value.
    #[arg(value_name = "SAMPLE", allow_hyphen_values = true)]
    pub sample: String,

    /// Show the output of every step.
    #[arg(long = "trace")]
    pub trace: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Rule file (JSON).
    #[arg(value_name = "RULE_FILE")]
    pub rule_file: PathBuf,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Rule file (JSON).
    #[arg(value_name = "RULE_FILE")]
    pub rule_file: PathBuf,

    /// Input CSV with a header row.
    #[arg(value_name = "INPUT_CSV")]
    pub input: PathBuf,

    /// Write transformed CSV here instead of stdout.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Validate transformed records against field rules (JSON array).
    #[arg(long = "validate", value_name = "RULES_JSON")]
    pub validate: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum StoreCommand {
    /// List stored rules.
    List,

    /// Show the mappings of a stored rule.
    Show {
        #[arg(value_name = "ENDPOINT")]
        endpoint_id: String,
    },

    /// Save a rule file into the store, replacing any rule for its endpoint.
    Import {
        #[arg(value_name = "RULE_FILE")]
        rule_file: PathBuf,
    },

    /// Write a stored rule as JSON.
    Export {
        #[arg(value_name = "ENDPOINT")]
        endpoint_id: String,

        /// Write to a file instead of stdout.
        #[arg(long = "output", short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Delete a stored rule.
    Remove {
        #[arg(value_name = "ENDPOINT")]
        endpoint_id: String,
    },
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => Self::ERROR,
            LogLevelArg::Warn => Self::WARN,
            LogLevelArg::Info => Self::INFO,
            LogLevelArg::Debug => Self::DEBUG,
            LogLevelArg::Trace => Self::TRACE,
        }
    }
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Json => Self::Json,
        }
    }
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
    fn parses_preview_with_global_flags() {
        let cli = Cli::try_parse_from([
            "fieldmap",
            "preview",
            "rule.json",
            "email",
            "-x@y",
            "--trace",
            "--store-dir",
            "rules",
        ])
        .unwrap();
        assert_eq!(cli.store_dir, Some(PathBuf::from("rules")));
        match cli.command {
            Command::Preview(args) => {
                assert_eq!(args.sample, "-x@y");
                assert!(args.trace);
            }
            _ => panic!("expected preview"),
        }
    }
}
