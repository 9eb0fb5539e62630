//! Gates that run before the first stage.

use camino::Utf8Path;
use std::fs;

use super::{PipelineError, Stage, StagePlan, Updater};
use crate::messages::Msg;
use crate::models::{RunMode, RunStatistics, run_stamp};
use crate::services::backup::BackupManager;
use crate::services::runner::CommandExecutor;
use crate::services::system::{CONNECT_TIMEOUT, CONNECTIVITY_TARGETS, SystemProbe, has_connectivity};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootCheck {
    Root,
    /// Not root, tolerated because nothing will be changed.
    DryRunWithoutRoot,
    Denied,
}

pub fn check_root<P: SystemProbe + ?Sized>(probe: &P, dry_run: bool) -> RootCheck {
    match (probe.is_root(), dry_run) {
        (true, _) => RootCheck::Root,
        (false, true) => RootCheck::DryRunWithoutRoot,
        (false, false) => RootCheck::Denied,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiskCheck {
    Sufficient { free_gb: f64 },
    Insufficient { free_gb: f64 },
    /// The check itself failed; the run treats this as enough space.
    Unknown(String),
}

pub fn check_disk_space<P: SystemProbe + ?Sized>(probe: &P, path: &Utf8Path, min_free_gb: u64) -> DiskCheck {
    match probe.free_space_bytes(path) {
        Ok(bytes) => {
            let free_gb = bytes as f64 / BYTES_PER_GB;
            if free_gb < min_free_gb as f64 {
                DiskCheck::Insufficient { free_gb }
            } else {
                DiskCheck::Sufficient { free_gb }
            }
        }
        Err(e) => DiskCheck::Unknown(format!("{}: {}", path, e)),
    }
}

impl<E: CommandExecutor, P: SystemProbe> Updater<E, P> {
    /// Banner, advisories and every gate that must pass before a stage runs.
    pub(super) async fn preflight(
        &self,
        mode: RunMode,
        plan: &StagePlan,
        stats: &mut RunStatistics,
    ) -> Result<(), PipelineError> {
        self.console().banner(crate::VERSION);
        self.announce_limits();

        if plan.should_run(Stage::Sync) {
            self.announce_mirrorselect();
        }
        if mode != RunMode::ModulesOnly && !self.options.skip_internet_check {
            self.require_connectivity(stats).await?;
        }

        self.require_root(stats)?;
        if mode == RunMode::ModulesOnly {
            return Ok(());
        }

        self.require_disk_space(stats)?;
        self.backup_configuration(stats);
        if plan.should_run(Stage::Sync) {
            self.cleanup_quarantine(stats);
        }
        Ok(())
    }

    fn announce_limits(&self) {
        let console = self.console();
        if let Some(seconds) = self.config.timeout {
            console.info(&Msg::TimeoutAdvisory { seconds });
        }
        if self.config.retry_count > 1 {
            console.info(&Msg::RetryAdvisory {
                count: self.config.retry_count,
            });
        }
        if let Some(max) = self.config.max_packages {
            console.info(&Msg::MaxPackagesAdvisory { max });
        }
    }

    fn announce_mirrorselect(&self) {
        let console = self.console();
        if self.probe.has_tool("mirrorselect") {
            console.info(&Msg::MirrorselectAvailable);
        } else {
            console.notice(&Msg::MirrorselectMissing);
            console.info(&Msg::MirrorselectTip);
        }
    }

    async fn require_connectivity(&self, stats: &mut RunStatistics) -> Result<(), PipelineError> {
        let console = self.console();
        console.info(&Msg::CheckingConnectivity);
        if has_connectivity(&CONNECTIVITY_TARGETS, CONNECT_TIMEOUT).await {
            console.success(&Msg::ConnectivityOk);
            Ok(())
        } else {
            console.error(stats, &Msg::NoConnectivity);
            console.info(&Msg::ConnectivityHint);
            Err(PipelineError::NoConnectivity)
        }
    }

    fn require_root(&self, stats: &mut RunStatistics) -> Result<(), PipelineError> {
        let console = self.console();
        match check_root(&self.probe, self.options.dry_run) {
            RootCheck::Root => Ok(()),
            RootCheck::DryRunWithoutRoot => {
                console.warning(stats, &Msg::RootSkippedForDryRun);
                Ok(())
            }
            RootCheck::Denied => {
                console.error(stats, &Msg::RootRequired);
                console.info(&Msg::RootHint);
                Err(PipelineError::NotRoot)
            }
        }
    }

    fn require_disk_space(&self, stats: &mut RunStatistics) -> Result<(), PipelineError> {
        let console = self.console();
        let required_gb = self.config.min_free_space_gb;
        match check_disk_space(&self.probe, &self.paths.disk_check, required_gb) {
            DiskCheck::Sufficient { free_gb } => {
                console.info(&Msg::DiskSpace { free_gb });
                Ok(())
            }
            DiskCheck::Insufficient { free_gb } => {
                console.info(&Msg::DiskSpace { free_gb });
                console.error(stats, &Msg::DiskSpaceLow { required_gb });
                Err(PipelineError::InsufficientDiskSpace { free_gb, required_gb })
            }
            DiskCheck::Unknown(error) => {
                console.warning(stats, &Msg::DiskCheckFailed { error: &error });
                Ok(())
            }
        }
    }

    fn backup_configuration(&self, stats: &mut RunStatistics) {
        if !self.config.enable_backups {
            tracing::debug!("Backups disabled in config");
            return;
        }
        let console = self.console();
        if self.options.dry_run {
            console.notice(&Msg::BackupSkippedDryRun);
            return;
        }

        let manager = BackupManager::new(self.config.backup_dir.as_str(), self.paths.backup_sources.clone());
        let stamp = run_stamp(self.started_at);
        match manager.backup_critical_files(&stamp) {
            Ok(snapshot) => console.success(&Msg::BackupCreated {
                path: snapshot.as_str(),
            }),
            Err(e) => {
                let error = format!("{e:#}");
                console.warning(stats, &Msg::BackupFailed { error: &error });
            }
        }

        match manager.prune_older_than(self.config.log_retention_days, &stamp) {
            Ok(removed) => {
                for name in &removed {
                    console.info(&Msg::BackupPruned { name });
                }
            }
            Err(e) => {
                let error = format!("{e:#}");
                console.warning(stats, &Msg::BackupPruneFailed { error: &error });
            }
        }
    }

    /// Remove portage's quarantine of downloads that failed verification, so
    /// the next sync starts clean.
    pub(super) fn cleanup_quarantine(&self, stats: &mut RunStatistics) {
        let quarantine = &self.paths.quarantine;
        if !quarantine.exists() {
            return;
        }

        let console = self.console();
        if self.options.dry_run {
            let command = format!("rm -rf {}", quarantine);
            console.warning(stats, &Msg::DryRun { command: &command });
            return;
        }

        console.info(&Msg::QuarantineCleanup {
            path: quarantine.as_str(),
        });
        match fs::remove_dir_all(quarantine) {
            Ok(()) => console.success(&Msg::QuarantineRemoved),
            Err(e) => {
                let error = e.to_string();
                console.warning(stats, &Msg::QuarantineRemoveFailed { error: &error });
            }
        }
    }
}
