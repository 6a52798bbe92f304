//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cdr",
    version,
    about = "Call-record pipeline - list calls and fetch recordings from a file store",
    long_about = "Ingest call-record files (CSV, XLS/XLSX) from a file store, normalize them\n\
                  into a date-ordered call list, and resolve call ids to their recordings.\n\n\
                  Parsed files are cached by content fingerprint; pass --cache-file to reuse\n\
                  parses across invocations."
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

    /// Allow phone numbers in trace-level logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List calls in a date range.
    Calls(CallsArgs),

    /// Save the recording of one call to a file.
    Recording(RecordingArgs),

    /// List the operator directory.
    Operators(OperatorsArgs),

    /// Inspect or reset a cache snapshot file.
    #[command(subcommand)]
    Cache(CacheCommand),
}

/// Where the files live and how the pipeline runs.
#[derive(Args, Clone)]
pub struct StoreArgs {
    /// Root directory standing in for the remote store.
    #[arg(long = "root", value_name = "DIR")]
    pub root: PathBuf,

    /// JSON settings file (data_folder, audio_folder, workers, failure_policy).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Folder holding call-record sources (overrides config).
    #[arg(long = "data-folder", value_name = "PATH")]
    pub data_folder: Option<String>,

    /// Folder holding recordings (overrides config).
    #[arg(long = "audio-folder", value_name = "PATH")]
    pub audio_folder: Option<String>,

    /// Number of files resolved concurrently (overrides config).
    #[arg(long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Leave out unreadable files instead of failing the run.
    #[arg(long = "skip-failed")]
    pub skip_failed: bool,

    /// Cache snapshot to load before and save after the run.
    #[arg(long = "cache-file", value_name = "PATH")]
    pub cache_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct CallsArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Earliest call date, epoch seconds (inclusive).
    #[arg(long = "from", value_name = "EPOCH")]
    pub from: Option<i64>,

    /// Latest call date, epoch seconds (inclusive).
    #[arg(long = "to", value_name = "EPOCH")]
    pub to: Option<i64>,

    /// Output format for the call list.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,

    /// Also write the call index (id to filename and url) as JSON.
    #[arg(long = "index-out", value_name = "PATH")]
    pub index_out: Option<PathBuf>,
}

#[derive(Args)]
pub struct RecordingArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Call id as printed by `calls`.
    #[arg(long = "id", value_name = "ID")]
    pub id: String,

    /// Destination file (default: the recording's filename in the current directory).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct OperatorsArgs {
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Show entry count and cached files.
    Stats(CacheFileArgs),

    /// Remove every entry from the snapshot.
    Clear(CacheFileArgs),
}

#[derive(Args)]
pub struct CacheFileArgs {
    #[arg(long = "cache-file", value_name = "PATH")]
    pub cache_file: PathBuf,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Table,
    Json,
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
