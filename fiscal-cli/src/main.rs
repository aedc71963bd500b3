use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, warn};

use fiscal_cli::logging::{enable_file_logging, init_logging, set_console_enabled, set_log_level};
use fiscal_cli::settings::Settings;
use fiscal_cli::{Cli, execute};
use fiscal_core::CalculationError;

// ─── settings and logging ────────────────────────────────────────────────────

/// Loads `--config` and applies its logging entries that no flag overrides.
fn prepare(cli: &Cli) -> Result<Settings> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    if cli.log_level.is_none()
        && std::env::var_os("RUST_LOG").is_none()
        && let Some(level) = &settings.log_level
    {
        set_log_level(level)?;
    }
    if let Some(path) = cli.log_file.as_ref().or(settings.log_file.as_ref()) {
        enable_file_logging(path)?;
        debug!(path = %path.display(), "logging to file");
    }
    Ok(settings)
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<CalculationError>() {
        Some(CalculationError::InvalidInput { .. }) => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.log_level.as_deref().unwrap_or("warn"));
    if cli.quiet
        && let Err(err) = set_console_enabled(false)
    {
        warn!("{err:#}");
    }

    match prepare(&cli).and_then(|settings| execute(&cli, settings)) {
        Ok(output) => {
            println!("{}", output.trim_end());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            exit_code(&err)
        }
    }
}
