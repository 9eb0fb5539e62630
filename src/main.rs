//! Gentoo Updater - automated maintenance runs for Gentoo Linux
//!
//! Main entry point for the command-line tool.
//!
//! # Execution Flow
//!
//! 1. Parse the command line ([`Cli`])
//! 2. `--create-config`: write the default configuration and exit
//! 3. Initialize logging → /var/log/gentoo-updater/update-<timestamp>.log
//! 4. Load the JSON configuration and apply command-line overrides
//! 5. Build a single-threaded tokio runtime
//! 6. Run the pipeline, racing it against Ctrl-C
//! 7. Exit with 0, 1, or 130 after an interrupt
//!
//! The summary and notifications are produced inside [`Updater::run`], so
//! they happen exactly once whatever the outcome.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use gentoo_updater::cli::Cli;
use gentoo_updater::services::{HostSystem, SystemExecutor};
use gentoo_updater::{APP_NAME, ConfigManager, Console, Msg, SystemPaths, Updater, VERSION};
use std::io::IsTerminal;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    let console = Console::new(cli.language(), color);
    let config_manager = ConfigManager::new(&cli.config);

    if cli.create_config {
        config_manager.save_default()?;
        console.success(&Msg::ConfigCreated {
            path: cli.config.as_str(),
        });
        return Ok(0);
    }

    let paths = SystemPaths::default();
    let started = Local::now();

    // A dry run without root usually cannot write the log directory; the
    // console output is still complete in that case.
    let _guard = match gentoo_updater::logging::setup_logging(
        &paths.log_file(started),
        cli.log_directive(),
        cli.verbose,
    ) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e:#}");
            None
        }
    };

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let loaded = config_manager.load();
    let mut config = loaded.config;
    config.apply_overrides(cli.overrides());

    let updater = Updater::new(
        SystemExecutor,
        HostSystem,
        config,
        cli.run_options(),
        paths,
        console,
    )
    .with_start_time(started)
    .with_startup_warnings(loaded.warning);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let mode = cli.mode();
    let report = runtime.block_on(updater.run(mode, interrupted()));

    tracing::info!(
        "Run finished: success={}, duration={:.1}s",
        report.success,
        report.duration.as_secs_f64()
    );

    Ok(u8::try_from(report.exit_code()).unwrap_or(1))
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
