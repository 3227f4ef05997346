//! CLI argument definitions for `deweather`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use dew_cli::config::ConfigArgs;

#[derive(Parser)]
#[command(
    name = "deweather",
    version,
    about = "Weather-normalise a time series by resampling its covariates",
    long_about = "Train a regression model of an observed quantity on date and covariate\n\
                  features, then average its predictions over many resamples of the\n\
                  covariates with the trend held fixed."
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
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Prepare, train and normalise; write the deweathered series.
    Run(RunArgs),

    /// Prepare only; write the table with derived columns and set labels.
    Prepare(PrepareArgs),

    /// Print the effective configuration as TOML.
    Config(ConfigCommandArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// CSV file with a `date` column, the target and covariates.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output CSV (default: <INPUT>_deweathered.csv next to the input).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Also write a JSON run report.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Log progress instead of drawing a progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Number of output rows to preview.
    #[arg(long = "preview", value_name = "N", default_value_t = 10)]
    pub preview: usize,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Parser)]
pub struct PrepareArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output CSV (default: <INPUT>_prepared.csv next to the input).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Parser)]
pub struct ConfigCommandArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
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

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
