//! CLI argument definitions for the Mission Impact uploader.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "impact",
    version,
    about = "Mission Impact ETL - validate and shape program records for upload",
    long_about = "Validate member program records against the Mission Impact schema.\n\n\
                  Maps local columns and values onto the schema, drops invalid rows and values,\n\
                  and writes a delivery CSV plus a JSON run report."
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

    /// Include participant values (case numbers, raw cells) in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate, map and shape datasets into a delivery CSV.
    Run(RunArgs),

    /// Check a schema descriptor for internal consistency.
    CheckSchema(CheckSchemaArgs),

    /// Remove rows the upstream service rejected for lacking an intake record.
    FilterIntake(FilterIntakeArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Dataset CSV files or directories of CSV files.
    #[arg(value_name = "DATASET")]
    pub datasets: Vec<PathBuf>,

    /// TOML run configuration; flags override its values.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Schema descriptor (JSON).
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: Option<PathBuf>,

    /// Column mapping CSV.
    #[arg(long = "column-mapping", value_name = "PATH")]
    pub column_mapping: Option<PathBuf>,

    /// Directory holding one `<Field>.csv` mapping per field.
    #[arg(long = "field-mappings", value_name = "DIR")]
    pub field_mappings: Option<PathBuf>,

    /// Member organization stamped on every record.
    #[arg(long = "member-id", value_name = "ID")]
    pub member_id: Option<String>,

    /// Datasets hold one row per case with milestone-prefixed columns.
    #[arg(long = "column-format")]
    pub column_format: bool,

    /// Separator for multi-value cells.
    #[arg(long = "delimiter", value_name = "SEP")]
    pub delimiter: Option<String>,

    /// Keep only rows modified on or after this date (YYYY-MM-DD).
    #[arg(long = "modified-since", value_name = "DATE")]
    pub modified_since: Option<NaiveDate>,

    /// Keep only rows modified on or before this date (YYYY-MM-DD).
    #[arg(long = "modified-until", value_name = "DATE")]
    pub modified_until: Option<NaiveDate>,

    /// Delivery CSV path.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// JSON run report (or gate failure) path.
    #[arg(long = "report", value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Persist the resolved field mappings back to the mapping directory.
    #[arg(long = "write-mappings")]
    pub write_mappings: bool,

    /// Let generated guesses replace stored mapping entries.
    #[arg(long = "overwrite-mappings")]
    pub overwrite_mappings: bool,

    /// Keep stored entries that are not approved.
    #[arg(long = "keep-unapproved")]
    pub keep_unapproved: bool,
}

#[derive(Args)]
pub struct CheckSchemaArgs {
    /// Schema descriptor (JSON).
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,
}

#[derive(Args)]
pub struct FilterIntakeArgs {
    /// Delivery CSV to filter.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// File holding the upstream rejection response text.
    #[arg(long = "response", value_name = "PATH")]
    pub response: PathBuf,

    /// Filtered CSV path (defaults to overwriting INPUT).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
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
