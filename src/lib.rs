// Gentoo Updater - automated maintenance runs for Gentoo Linux
//
// This is the library crate holding the pipeline and its collaborators.
// The binary crate (main.rs) parses the command line and drives one run.

pub mod cli;
pub mod config;
pub mod console;
pub mod logging;
pub mod messages;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod summary;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use console::Console;
pub use messages::{Language, Msg};
pub use models::{RunConfig, RunMode, RunOptions, RunStatistics, SystemPaths};
pub use pipeline::{PipelineError, RunReport, Updater};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
