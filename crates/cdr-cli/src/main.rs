//! Call-record pipeline CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use cdr_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg, OutputFormatArg};
use cdr_cli::commands::{run_cache, run_calls, run_recording};
use cdr_cli::logging::{LogConfig, LogFormat, init_logging};
use cdr_cli::summary::{cache_table, calls_table, operators_table, print_report};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match cli.command {
        Command::Calls(args) => match run_calls(&args) {
            Ok(output) => match args.format {
                OutputFormatArg::Table => {
                    println!("{}", calls_table(&output));
                    print_report(&output.report);
                    0
                }
                OutputFormatArg::Json => print_json(&output.calls),
            },
            Err(error) => report_error(&error),
        },
        Command::Recording(args) => match run_recording(&args) {
            Ok(saved) => {
                println!(
                    "Saved recording for call {} to {} ({} bytes)",
                    saved.id,
                    saved.path.display(),
                    saved.bytes
                );
                0
            }
            Err(error) => report_error(&error),
        },
        Command::Operators(args) => {
            let operators = cdr_core::operators();
            match args.format {
                OutputFormatArg::Table => {
                    println!("{}", operators_table(&operators));
                    0
                }
                OutputFormatArg::Json => print_json(&operators),
            }
        }
        Command::Cache(command) => match run_cache(&command) {
            Ok(summary) => {
                println!("{}", cache_table(&summary.stats, &summary.filenames));
                0
            }
            Err(error) => report_error(&error),
        },
    };
    std::process::exit(exit_code);
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            0
        }
        Err(error) => {
            eprintln!("error: serialize output: {error}");
            1
        }
    }
}

fn report_error(error: &anyhow::Error) -> i32 {
    eprintln!("error: {error:#}");
    if let Some(core) = error.downcast_ref::<cdr_core::CoreError>() {
        eprintln!("{}", core.user_message());
    }
    1
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
