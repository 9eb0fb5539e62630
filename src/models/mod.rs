//! Data carried through a run.
//!
//! - [`RunConfig`]: persisted settings, loaded once and overridden from the CLI
//! - [`RunOptions`] and [`RunMode`]: per-invocation switches
//! - [`SystemPaths`]: every file and directory the pipeline touches
//! - [`RunStatistics`]: the run-scoped accumulator behind the summary

pub mod config;
pub mod options;
pub mod run_stats;

pub use config::{ConfigOverrides, EtcUpdateMode, JobsPolicy, LoadPolicy, RunConfig};
pub use options::{RunMode, RunOptions, SystemPaths, run_stamp};
pub use run_stats::RunStatistics;
