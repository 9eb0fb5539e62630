use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use tracing::Level;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Layer, filter::filter_fn, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup logging into a single per-run log file.
///
/// The console is handled by [`crate::console::Console`], which emits a
/// tracing event for every line it prints, so the file mirrors the terminal.
/// With `echo_debug` the debug-level events (full command lines, probe
/// details) are echoed to stderr as well.
///
/// # Arguments
/// * `log_file` - Full path of the log file, e.g. `/var/log/gentoo-updater/update-20250101-120000.log`
/// * `directive` - `EnvFilter` directive such as `"info"` or `"debug"`
/// * `echo_debug` - Also print debug events on stderr
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging active
pub fn setup_logging(
    log_file: &Utf8Path,
    directive: &str,
    echo_debug: bool,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = log_file.parent().unwrap_or(Utf8Path::new("."));
    if !log_dir.as_str().is_empty() && !log_dir.exists() {
        fs::create_dir_all(log_dir).with_context(|| format!("Failed to create log directory: {}", log_dir))?;
    }
    let file_name = log_file
        .file_name()
        .with_context(|| format!("Log path has no file name: {}", log_file))?;

    // One file per run, never rotated mid-run
    let file_appender = rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_new(directive)
        .with_context(|| format!("Invalid log level: {}", directive))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // No ANSI codes in log files
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let debug_layer = echo_debug.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter_fn(|meta| *meta.level() == Level::DEBUG))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(debug_layer)
        .try_init()
        .context("Logging was already initialised")?;

    tracing::info!(
        "Logging initialized: file={}, level={}, echo_debug={}",
        log_file,
        directive,
        echo_debug
    );

    Ok(guard)
}
