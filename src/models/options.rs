use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Local};
use std::time::Duration;

use crate::messages::Language;

/// Which slice of the maintenance pipeline a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Sync, probe, update, modules, cleanup, advisory and config drift.
    #[default]
    Full,
    /// Rebuild kernel modules unconditionally and stop.
    ModulesOnly,
    SyncOnly,
    /// Availability probe plus system update.
    UpdateOnly,
    /// Depclean plus reverse-dependency repair.
    CleanupOnly,
}

/// Per-invocation switches that are not persisted in the config file.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub dry_run: bool,
    pub verbose: bool,

    pub skip_sync: bool,
    pub skip_update: bool,
    pub skip_eix: bool,
    pub skip_cleanup: bool,
    pub skip_revdep: bool,
    pub skip_internet_check: bool,

    /// Open `mirrorselect` before the first sync attempt.
    pub use_mirrorselect: bool,
    /// Rebuild modules even when the guard reports the running kernel as current.
    pub force_module_rebuild: bool,

    pub webhook: Option<String>,
    pub language: Language,

    /// Pause between the two repository sync attempts.
    pub retry_delay: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            verbose: false,
            skip_sync: false,
            skip_update: false,
            skip_eix: false,
            skip_cleanup: false,
            skip_revdep: false,
            skip_internet_check: false,
            use_mirrorselect: false,
            force_module_rebuild: false,
            webhook: None,
            language: Language::En,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Every filesystem location the pipeline reads or writes.
///
/// Production runs use [`SystemPaths::default`]; tests point the whole set at
/// a temporary directory.
#[derive(Debug, Clone)]
pub struct SystemPaths {
    /// Holds `GENTOO_MIRRORS` (distfile mirrors).
    pub make_conf: Utf8PathBuf,
    /// Holds `sync-uri` for the gentoo repository.
    pub repos_conf: Utf8PathBuf,
    /// Where portage parks downloads that failed verification during sync.
    pub quarantine: Utf8PathBuf,
    pub log_dir: Utf8PathBuf,
    /// Mount point whose free space gates the run.
    pub disk_check: Utf8PathBuf,
    /// Root of the `._cfg*` drift scan.
    pub etc_dir: Utf8PathBuf,
    /// Files and directories copied into each backup snapshot.
    pub backup_sources: Vec<Utf8PathBuf>,
}

impl Default for SystemPaths {
    fn default() -> Self {
        Self {
            make_conf: "/etc/portage/make.conf".into(),
            repos_conf: "/etc/portage/repos.conf/gentoo.conf".into(),
            quarantine: "/var/db/repos/gentoo/.tmp-unverified-download-quarantine".into(),
            log_dir: "/var/log/gentoo-updater".into(),
            disk_check: "/usr".into(),
            etc_dir: "/etc".into(),
            backup_sources: vec![
                "/etc/portage/make.conf".into(),
                "/etc/portage/package.use".into(),
                "/etc/portage/package.accept_keywords".into(),
                "/var/lib/portage/world".into(),
            ],
        }
    }
}

impl SystemPaths {
    /// Re-root every path under `root`, keeping the absolute layout.
    ///
    /// `/etc/portage/make.conf` becomes `<root>/etc/portage/make.conf`.
    pub fn rooted_at(root: &Utf8Path) -> Self {
        let reroot = |path: &Utf8Path| root.join(path.as_str().trim_start_matches('/'));
        let defaults = Self::default();
        Self {
            make_conf: reroot(&defaults.make_conf),
            repos_conf: reroot(&defaults.repos_conf),
            quarantine: reroot(&defaults.quarantine),
            log_dir: reroot(&defaults.log_dir),
            disk_check: reroot(&defaults.disk_check),
            etc_dir: reroot(&defaults.etc_dir),
            backup_sources: defaults.backup_sources.iter().map(|p| reroot(p)).collect(),
        }
    }

    /// Per-run log file: `<log_dir>/update-YYYYMMDD-HHMMSS.log`.
    pub fn log_file(&self, started: DateTime<Local>) -> Utf8PathBuf {
        self.log_dir.join(format!("update-{}.log", run_stamp(started)))
    }

    /// Structured summary written next to the log file.
    pub fn summary_file(&self, started: DateTime<Local>) -> Utf8PathBuf {
        self.log_dir.join(format!("update-{}.json", run_stamp(started)))
    }
}

/// Timestamp used in log, summary and backup names.
pub fn run_stamp(at: DateTime<Local>) -> String {
    at.format("%Y%m%d-%H%M%S").to_string()
}
