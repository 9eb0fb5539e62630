//! Stage implementations and the decisions between them.
//!
//! Each stage reads tool output through [`OutputClassifier`] and branches on
//! what it finds. Only sync, blockers and the system update can end a run;
//! every other stage absorbs its failures as warnings.
//!
//! [`OutputClassifier`]: crate::services::classifier::OutputClassifier

use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use walkdir::WalkDir;

use super::{PipelineError, Stage, StageDecision, StagePlan, Updater};
use crate::messages::Msg;
use crate::models::{EtcUpdateMode, RunStatistics};
use crate::services::emerge::{self, MergeTool};
use crate::services::kernel::KernelModuleGuard;
use crate::services::mirrors::MirrorResolver;
use crate::services::runner::{CommandExecutor, Invocation};
use crate::services::system::SystemProbe;

/// Repository sync makes at most this many attempts.
pub const SYNC_ATTEMPTS: u32 = 2;

/// Prefix portage gives to proposed configuration updates.
pub const CONFIG_UPDATE_PREFIX: &str = "._cfg";

const KERNEL_STEPS: [&str; 7] = [
    "eselect kernel list",
    "eselect kernel set <number>",
    "cd /usr/src/linux",
    "make oldconfig",
    "make && make modules_install",
    "make install",
    "grub-mkconfig -o /boot/grub/grub.cfg",
];

/// What the availability probe found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    UpToDate,
    Pending,
    /// The probe itself could not run; the update proceeds anyway.
    Unknown,
}

/// Every `._cfg*` file below `root`, sorted.
///
/// Unreadable subdirectories are skipped; only an unreadable `root` is an
/// error.
pub fn find_config_updates(root: &Utf8Path) -> io::Result<Vec<Utf8PathBuf>> {
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", root),
        ));
    }

    let mut found: Vec<Utf8PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry during config scan: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(CONFIG_UPDATE_PREFIX))
        })
        .filter_map(|entry| Utf8PathBuf::from_path_buf(entry.into_path()).ok())
        .collect();
    found.sort();
    Ok(found)
}

impl<E: CommandExecutor, P: SystemProbe> Updater<E, P> {
    /// Full, sync-only, update-only and cleanup-only runs.
    pub(super) async fn run_stages(&self, plan: &StagePlan, stats: &mut RunStatistics) -> Result<(), PipelineError> {
        if self.gate(plan, Stage::Sync) {
            self.sync_repositories(stats).await?;
        }
        if self.gate(plan, Stage::Index) {
            self.update_index(stats).await;
        }

        if self.gate(plan, Stage::Probe) && self.check_updates(stats).await? == ProbeOutcome::UpToDate {
            if plan.should_run(Stage::ConfigDrift) {
                self.reconcile_config(stats).await;
            }
            return Ok(());
        }

        let mut kernel_updated = false;
        if self.gate(plan, Stage::Update) {
            kernel_updated = self.update_system(stats).await?;
        }
        if self.gate(plan, Stage::Modules) {
            self.rebuild_modules_if_needed(stats, kernel_updated).await;
        }
        if self.gate(plan, Stage::Depclean) {
            self.depclean(stats).await;
        }
        if self.gate(plan, Stage::Revdep) {
            self.revdep_rebuild(stats).await;
        }
        if self.gate(plan, Stage::KernelAdvisory) {
            self.kernel_advisory(stats).await;
        }
        if self.gate(plan, Stage::ConfigDrift) {
            self.reconcile_config(stats).await;
        }
        Ok(())
    }

    /// `--rebuild-modules`: the guard result is reported, the rebuild always runs.
    pub(super) async fn run_modules_only(&self, stats: &mut RunStatistics) {
        let console = self.console();
        console.section(&Msg::StageModules);

        KernelModuleGuard::new(&self.runner).needs_rebuild(stats).await;
        self.rebuild_modules(stats).await;
        console.section(&Msg::ModulesOnlyDone);
    }

    /// Whether `stage` runs, printing a notice when a flag or the config
    /// turned it off.
    fn gate(&self, plan: &StagePlan, stage: Stage) -> bool {
        let console = self.console();
        match plan.decision(stage) {
            StageDecision::Run => true,
            StageDecision::SkippedByFlag(flag) => {
                let label = format!("{stage} ({flag})");
                console.notice(&Msg::SkippingStage { stage: &label });
                false
            }
            StageDecision::DisabledInConfig => {
                match stage {
                    Stage::Depclean => console.info(&Msg::DepcleanSkipped),
                    Stage::Revdep => console.info(&Msg::RevdepSkipped),
                    _ => tracing::debug!("{} disabled in config", stage),
                }
                false
            }
            StageDecision::NotInMode => false,
        }
    }

    async fn sync_repositories(&self, stats: &mut RunStatistics) -> Result<(), PipelineError> {
        let console = self.console();

        for attempt in 1..=SYNC_ATTEMPTS {
            console.section(&Msg::StageSync {
                attempt,
                max: SYNC_ATTEMPTS,
            });
            self.prepare_mirrors(stats, attempt == 1).await;

            let result = self
                .runner
                .run_allow_fail(stats, emerge::sync(), "Synchronising portage repositories")
                .await;
            if result.success {
                return Ok(());
            }

            if attempt < SYNC_ATTEMPTS {
                console.warning(stats, &Msg::SyncRetry);
                self.cleanup_quarantine(stats);
                tokio::time::sleep(self.options.retry_delay).await;
            }
        }

        console.error(stats, &Msg::SyncFailed {
            attempts: SYNC_ATTEMPTS,
        });
        Err(PipelineError::SyncFailed {
            attempts: SYNC_ATTEMPTS,
        })
    }

    /// Resolve, write and re-read the mirror configuration before a sync.
    async fn prepare_mirrors(&self, stats: &mut RunStatistics, first_attempt: bool) {
        let interactive = first_attempt
            && self.options.use_mirrorselect
            && !self.options.dry_run
            && self.config.mirrors.is_empty()
            && self.probe.has_tool("mirrorselect");

        let resolver = MirrorResolver::new(
            &self.runner,
            &self.paths.make_conf,
            &self.paths.repos_conf,
            &self.config.mirrors,
            interactive,
        );
        let selected = resolver.select_mirrors(stats).await;
        resolver.configure_distfile_mirrors(stats, &selected.distfiles);
        resolver.configure_sync_mirror(stats, &selected.sync);
        stats.set_sync_mirror(selected.sync.as_str());

        let configured = resolver.read_configured_mirrors(stats);
        let console = self.console();
        if configured.is_empty() {
            console.warning(stats, &Msg::NoMirrors);
        } else {
            console.info(&Msg::ConfiguredMirrors);
            for mirror in &configured {
                console.item(mirror);
            }
            console.info(&Msg::PrimaryMirror { mirror: &configured[0] });
        }
        stats.set_mirrors(&configured);
    }

    async fn update_index(&self, stats: &mut RunStatistics) {
        let console = self.console();
        console.section(&Msg::StageIndex);

        if !self.probe.has_tool("eix-update") {
            console.warning(stats, &Msg::IndexToolMissing);
            return;
        }
        if let Err(e) = self.runner.run(stats, emerge::eix_update(), "Updating the eix database").await {
            tracing::debug!("eix-update failed: {}", e);
            console.notice(&Msg::IndexRefreshFailed);
        }
    }

    async fn check_updates(&self, stats: &mut RunStatistics) -> Result<ProbeOutcome, PipelineError> {
        let console = self.console();
        console.section(&Msg::StageProbe);
        console.info(&Msg::CheckingBlockers);

        let output = match self.runner.probe(emerge::world_pretend()).await {
            Ok(out) => out.output,
            Err(e) => {
                let error = e.to_string();
                console.warning(stats, &Msg::ProbeFailed { error: &error });
                return Ok(ProbeOutcome::Unknown);
            }
        };
        let classifier = &self.classifier;

        if classifier.has_blockers(&output) {
            console.error(stats, &Msg::BlockedPackages);
            console.raw(&output);
            console.info(&Msg::BlockedHint);
            return Err(PipelineError::BlockedPackages);
        }

        if classifier.is_up_to_date(&output) {
            console.success(&Msg::NoUpdates);
            return Ok(ProbeOutcome::UpToDate);
        }

        console.info(&Msg::UpdatesAvailable);
        console.raw(&output);

        let critical = classifier.critical_matches(&output, &self.config.critical_packages);
        if !critical.is_empty() {
            console.warning(stats, &Msg::CriticalPackages);
            for name in critical {
                console.warning(stats, &Msg::CriticalPackage { name });
            }
            console.info(&Msg::CriticalHint);
        }

        if let (Some(max), Some(pending)) = (self.config.max_packages, classifier.pending_count(&output)) {
            if pending > max {
                console.warning(stats, &Msg::MaxPackagesExceeded { pending, max });
            }
        }

        stats.add_updated(classifier.extract_packages(&output));
        Ok(ProbeOutcome::Pending)
    }

    /// Returns whether a kernel sources package is part of the update.
    async fn update_system(&self, stats: &mut RunStatistics) -> Result<bool, PipelineError> {
        let console = self.console();
        console.section(&Msg::StageUpdate);
        console.info(&Msg::AnalyzingUpdate);

        let kernel_updated = match self.runner.probe(emerge::world_pretend_with_bdeps()).await {
            Ok(out) => self.classifier.kernel_sources_pending(&out.output),
            Err(e) => {
                tracing::debug!("Kernel pre-check failed: {}", e);
                false
            }
        };
        if kernel_updated {
            console.warning(stats, &Msg::KernelUpdateDetected);
            stats.mark_kernel_updated();
        }

        let cpus = self.probe.cpu_count();
        let jobs = self.config.emerge_jobs(cpus);
        let load = self.config.load_average(cpus);
        console.info(&Msg::Performance { jobs, load });

        let update = emerge::world_update(jobs, load);
        let mut result = self
            .runner
            .run_allow_fail(stats, update.clone(), "Updating system packages")
            .await;

        if !result.success && self.classifier.needs_autounmask(&result.output) {
            if !self.config.auto_autounmask {
                console.warning(stats, &Msg::AutounmaskDisabled);
            } else if self.autounmask_recovery(stats, &update).await {
                console.info(&Msg::AutounmaskRetry);
                result = self
                    .runner
                    .run_allow_fail(stats, update, "Updating system packages (retry after autounmask)")
                    .await;
            }
        }

        if !result.success {
            console.error(stats, &Msg::UpdateFailed);
            return Err(PipelineError::UpdateFailed);
        }
        Ok(kernel_updated)
    }

    /// One pass: write the unmask changes, merge them, report whether the
    /// caller should retry the update.
    async fn autounmask_recovery(&self, stats: &mut RunStatistics, update: &Invocation) -> bool {
        let console = self.console();
        console.warning(stats, &Msg::AutounmaskStart);

        let written = self
            .runner
            .run_allow_fail(stats, emerge::with_autounmask(update), "Applying autounmask changes")
            .await;
        if !written.success {
            console.warning(stats, &Msg::AutounmaskWriteFailed);
            return false;
        }

        let tool = [MergeTool::EtcUpdate, MergeTool::DispatchConf]
            .into_iter()
            .find(|tool| self.probe.has_tool(tool.program()));
        let Some(tool) = tool else {
            console.warning(stats, &Msg::AutounmaskNoMergeTool);
            return false;
        };

        let description = format!("Merging configuration changes with {}", tool.program());
        let merged = self.runner.run_allow_fail(stats, tool.merge_all(), &description).await;
        if !merged.success {
            console.warning(stats, &Msg::AutounmaskMergeFailed);
            return false;
        }

        console.success(&Msg::AutounmaskRecovered);
        true
    }

    async fn rebuild_modules_if_needed(&self, stats: &mut RunStatistics, kernel_updated: bool) {
        self.console().section(&Msg::StageModules);

        let needed = kernel_updated
            || self.options.force_module_rebuild
            || KernelModuleGuard::new(&self.runner).needs_rebuild(stats).await;
        if needed {
            self.rebuild_modules(stats).await;
        } else {
            self.console().success(&Msg::ModulesUpToDate);
        }
    }

    async fn rebuild_modules(&self, stats: &mut RunStatistics) {
        let console = self.console();

        match self.runner.probe(emerge::module_rebuild_pretend()).await {
            Ok(out) if self.classifier.is_up_to_date(&out.output) => {
                console.success(&Msg::NoExternalModules);
                return;
            }
            Ok(out) => {
                console.info(&Msg::ModulesToRebuild);
                console.raw(&out.output);
            }
            Err(e) => {
                let error = e.to_string();
                console.warning(stats, &Msg::ModulesCheckFailed { error: &error });
            }
        }

        let result = self
            .runner
            .run_allow_fail(stats, emerge::module_rebuild(), "Rebuilding kernel modules")
            .await;
        if !result.success {
            console.warning(stats, &Msg::ModulesRebuildFailed);
            return;
        }

        if !self.options.dry_run {
            stats.mark_modules_rebuilt();
        }
        console.success(&Msg::ModulesRebuilt);
        console.info(&Msg::ModulesRebuildTip);
    }

    async fn depclean(&self, stats: &mut RunStatistics) {
        let console = self.console();
        console.section(&Msg::StageDepclean);

        let pretend = self
            .runner
            .run_allow_fail(stats, emerge::depclean_pretend(), "Checking packages to remove")
            .await;
        if !pretend.success {
            console.warning(stats, &Msg::DepcleanFailed);
            return;
        }
        stats.add_removed(self.classifier.extract_removals(&pretend.output));
        console.raw(&pretend.output);

        let result = self
            .runner
            .run_allow_fail(stats, emerge::depclean(), "Removing packages that are no longer needed")
            .await;
        if !result.success {
            console.warning(stats, &Msg::DepcleanFailed);
        }
    }

    async fn revdep_rebuild(&self, stats: &mut RunStatistics) {
        let console = self.console();
        console.section(&Msg::StageRevdep);

        if !self.probe.has_tool("revdep-rebuild") {
            console.warning(stats, &Msg::RevdepMissing);
            return;
        }
        let result = self
            .runner
            .run_allow_fail(stats, emerge::revdep_rebuild(), "Repairing broken reverse dependencies")
            .await;
        if !result.success {
            console.warning(stats, &Msg::RevdepFailed);
        }
    }

    async fn kernel_advisory(&self, stats: &mut RunStatistics) {
        let console = self.console();
        console.section(&Msg::StageKernel);

        match self.runner.probe(emerge::kernel_list()).await {
            Ok(out) => {
                console.info(&Msg::AvailableKernels);
                console.raw(&out.output);
                console.warning(stats, &Msg::KernelManual);
                console.info(&Msg::KernelSteps);
                for (index, step) in KERNEL_STEPS.iter().enumerate() {
                    console.raw(&format!("  {}. {}", index + 1, step));
                }
            }
            Err(e) => {
                let error = e.to_string();
                console.warning(stats, &Msg::KernelCheckFailed { error: &error });
            }
        }
    }

    async fn reconcile_config(&self, stats: &mut RunStatistics) {
        let console = self.console();
        console.section(&Msg::StageConfig);

        let pending = match find_config_updates(&self.paths.etc_dir) {
            Ok(pending) => pending,
            Err(e) => {
                let error = e.to_string();
                console.warning(stats, &Msg::ConfigCheckFailed { error: &error });
                return;
            }
        };
        if pending.is_empty() {
            console.success(&Msg::NoConfigUpdates);
            return;
        }

        console.warning(stats, &Msg::ConfigUpdatesFound);
        console.info(&Msg::ConfigUpdateFiles);
        for path in &pending {
            console.item(path.as_str());
        }

        let mode = self.config.etc_update_mode;
        let Some(merge) = emerge::config_merge(mode) else {
            console.info(&Msg::ConfigModeSkip);
            return;
        };

        match mode {
            EtcUpdateMode::Auto => {
                console.info(&Msg::ConfigModeAuto);
                let result = self
                    .runner
                    .run_allow_fail(stats, merge, "Updating configuration files automatically")
                    .await;
                if result.success {
                    console.success(&Msg::ConfigAutoDone);
                } else {
                    console.warning(stats, &Msg::ConfigAutoFailed);
                }
            }
            EtcUpdateMode::Interactive => {
                console.info(&Msg::ConfigModeInteractive);
                console.info(&Msg::ConfigInteractiveHint);
                let result = self
                    .runner
                    .run_allow_fail(stats, merge, "Updating configuration files interactively")
                    .await;
                if result.success {
                    console.success(&Msg::ConfigInteractiveDone);
                } else {
                    console.warning(stats, &Msg::ConfigInteractiveFailed);
                }
            }
            EtcUpdateMode::Skip => {}
        }
    }
}
