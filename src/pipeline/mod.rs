//! The maintenance pipeline: which stages run, in what order, and how a run
//! ends.
//!
//! - [`StagePlan`] is computed once per run from the mode, the skip flags and
//!   the config toggles.
//! - [`preflight`] holds the gates that run before any stage.
//! - [`stages`] implements each stage on [`Updater`].
//! - [`driver`] owns the run: interrupt handling, the single summary, the
//!   notification and the exit status.

pub mod driver;
pub mod preflight;
pub mod stages;

pub use driver::{RunReport, Updater};

use std::fmt;
use thiserror::Error;

use crate::models::{RunConfig, RunMode, RunOptions};

/// Fatal outcomes. Anything not listed here is absorbed by the stage that hit
/// it and only shows up as a warning or error line.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("root privileges are required")]
    NotRoot,

    #[error("no internet connection")]
    NoConnectivity,

    #[error("only {free_gb:.2} GB free, {required_gb} GB required")]
    InsufficientDiskSpace { free_gb: f64, required_gb: u64 },

    #[error("repository sync failed after {attempts} attempts")]
    SyncFailed { attempts: u32 },

    #[error("blocked packages need manual resolution")]
    BlockedPackages,

    #[error("system update failed")]
    UpdateFailed,

    #[error("interrupted by operator")]
    Interrupted,
}

impl PipelineError {
    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Interrupted => 130,
            _ => 1,
        }
    }
}

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Sync,
    Index,
    Probe,
    Update,
    Modules,
    Depclean,
    Revdep,
    KernelAdvisory,
    ConfigDrift,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::Sync,
        Stage::Index,
        Stage::Probe,
        Stage::Update,
        Stage::Modules,
        Stage::Depclean,
        Stage::Revdep,
        Stage::KernelAdvisory,
        Stage::ConfigDrift,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Sync => "repository synchronisation",
            Stage::Index => "eix update",
            Stage::Probe => "update check",
            Stage::Update => "system update",
            Stage::Modules => "kernel module rebuild",
            Stage::Depclean => "depclean",
            Stage::Revdep => "revdep-rebuild",
            Stage::KernelAdvisory => "kernel check",
            Stage::ConfigDrift => "configuration update",
        };
        f.write_str(name)
    }
}

/// Why a stage does or does not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageDecision {
    Run,
    /// Turned off on the command line; carries the flag for the notice.
    SkippedByFlag(&'static str),
    DisabledInConfig,
    /// Not part of the selected run mode.
    NotInMode,
}

/// Per-stage decisions for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    decisions: [StageDecision; 9],
}

impl StagePlan {
    pub fn new(mode: RunMode, options: &RunOptions, config: &RunConfig) -> Self {
        let mut decisions = [StageDecision::NotInMode; 9];
        for (slot, stage) in decisions.iter_mut().zip(Stage::ALL) {
            *slot = if in_mode(mode, stage) {
                decide(stage, options, config)
            } else {
                StageDecision::NotInMode
            };
        }
        Self { decisions }
    }

    pub fn decision(&self, stage: Stage) -> StageDecision {
        self.decisions[stage as usize]
    }

    pub fn should_run(&self, stage: Stage) -> bool {
        self.decision(stage) == StageDecision::Run
    }
}

fn in_mode(mode: RunMode, stage: Stage) -> bool {
    match mode {
        RunMode::Full => true,
        RunMode::ModulesOnly => stage == Stage::Modules,
        RunMode::SyncOnly => stage == Stage::Sync,
        RunMode::UpdateOnly => matches!(stage, Stage::Probe | Stage::Update),
        RunMode::CleanupOnly => matches!(stage, Stage::Depclean | Stage::Revdep),
    }
}

fn decide(stage: Stage, options: &RunOptions, config: &RunConfig) -> StageDecision {
    use StageDecision::*;
    match stage {
        Stage::Sync if options.skip_sync => SkippedByFlag("--skip-sync"),
        Stage::Index if options.skip_eix => SkippedByFlag("--skip-eix"),
        Stage::Probe | Stage::Update if options.skip_update => SkippedByFlag("--skip-update"),
        Stage::Depclean if options.skip_cleanup => SkippedByFlag("--skip-cleanup"),
        Stage::Depclean if !config.auto_depclean => DisabledInConfig,
        Stage::Revdep if options.skip_revdep => SkippedByFlag("--skip-revdep"),
        Stage::Revdep if !config.auto_revdep_rebuild => DisabledInConfig,
        _ => Run,
    }
}
