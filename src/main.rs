use clap::Parser;
use env_logger::{Builder, WriteStyle};
use log::LevelFilter;
use owo_colors::OwoColorize;
use std::process::ExitCode;
use syslogger::cli::Cli;
use syslogger::config::AppConfig;
use syslogger::error::SamplerError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration first (without logging)
    let config = AppConfig::from_file(&cli.config).unwrap_or_else(|e| {
        eprintln!("{} {:#}", "warning:".yellow().bold(), e);
        AppConfig::default()
    });

    // Initialise logger with a configured log level
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        config.get_log_level()
    };
    Builder::new()
        .filter_level(level)
        .write_style(WriteStyle::Always)
        .format_timestamp_secs()
        .init();

    let settings = match config.resolve(&cli.overrides()) {
        Ok(settings) => settings,
        Err(e) => return report(&e),
    };

    match syslogger::run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<SamplerError>() {
            Some(err) => report(err),
            None => {
                eprintln!("{} {:#}", "error:".red().bold(), e);
                ExitCode::FAILURE
            }
        },
    }
}

/// Prints a startup failure, red when fatal and yellow when informational,
/// and maps it to the exit code.
fn report(err: &SamplerError) -> ExitCode {
    match err {
        SamplerError::MissingDependencies(tools) => {
            eprintln!("{}", "error: missing required tools".red().bold());
            for tool in tools {
                eprintln!("  {} (install package {})", tool.program.red(), tool.package);
            }
        }
        SamplerError::UnknownBattery { .. } => {
            eprintln!("{} {}", "info:".yellow().bold(), err);
        }
        _ => {
            eprintln!("{} {}", "error:".red().bold(), err);
        }
    }
    ExitCode::from(err.exit_code() as u8)
}
