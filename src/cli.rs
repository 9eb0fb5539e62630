//! Command-line surface.
//!
//! Most switches also read a `GENTOO_UPDATER_*` environment variable as a
//! fallback, so cron jobs and systemd units can configure a run.

use camino::Utf8PathBuf;
use clap::builder::BoolishValueParser;
use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::messages::Language;
use crate::models::{ConfigOverrides, EtcUpdateMode, RunMode, RunOptions};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/gentoo-updater.conf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// `EnvFilter` directive for this level.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EtcUpdateArg {
    Interactive,
    Auto,
    Skip,
}

impl From<EtcUpdateArg> for EtcUpdateMode {
    fn from(arg: EtcUpdateArg) -> Self {
        match arg {
            EtcUpdateArg::Interactive => EtcUpdateMode::Interactive,
            EtcUpdateArg::Auto => EtcUpdateMode::Auto,
            EtcUpdateArg::Skip => EtcUpdateMode::Skip,
        }
    }
}

/// Automated maintenance for Gentoo Linux: sync, update, module rebuild,
/// cleanup and configuration reconciliation.
#[derive(Parser, Debug, Clone)]
#[command(name = "gentoo-updater", version, about, long_about = None)]
pub struct Cli {
    /// Show debug output
    #[arg(short, long, env = "GENTOO_UPDATER_VERBOSE", value_parser = BoolishValueParser::new())]
    pub verbose: bool,

    /// Show what would be done without changing anything
    #[arg(short = 'n', long, env = "GENTOO_UPDATER_DRY_RUN", value_parser = BoolishValueParser::new())]
    pub dry_run: bool,

    /// Log file verbosity
    #[arg(long, value_enum, ignore_case = true, env = "GENTOO_UPDATER_LOG_LEVEL", default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Configuration file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: Utf8PathBuf,

    /// Write the default configuration file and exit
    #[arg(long)]
    pub create_config: bool,

    /// Only rebuild kernel modules
    #[arg(long, conflicts_with_all = ["only_sync", "only_update", "only_cleanup"])]
    pub rebuild_modules: bool,

    /// Only synchronise the repositories
    #[arg(long, conflicts_with_all = ["only_update", "only_cleanup"])]
    pub only_sync: bool,

    /// Only check for and apply package updates
    #[arg(long, conflicts_with = "only_cleanup")]
    pub only_update: bool,

    /// Only run depclean and revdep-rebuild
    #[arg(long)]
    pub only_cleanup: bool,

    /// Skip repository synchronisation
    #[arg(long)]
    pub skip_sync: bool,

    /// Skip the update check and system update
    #[arg(long)]
    pub skip_update: bool,

    /// Skip the eix database update
    #[arg(long)]
    pub skip_eix: bool,

    /// Skip depclean
    #[arg(long)]
    pub skip_cleanup: bool,

    /// Skip revdep-rebuild
    #[arg(long)]
    pub skip_revdep: bool,

    /// Skip the internet connectivity check
    #[arg(long, env = "GENTOO_UPDATER_SKIP_INTERNET_CHECK", value_parser = BoolishValueParser::new())]
    pub skip_internet_check: bool,

    /// Declared package-count cap (advisory)
    #[arg(long, value_name = "N")]
    pub max_packages: Option<usize>,

    /// Declared per-run timeout in seconds (advisory)
    #[arg(long, value_name = "SECONDS", env = "GENTOO_UPDATER_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Declared retry count (advisory)
    #[arg(long, value_name = "N", env = "GENTOO_UPDATER_RETRY_COUNT")]
    pub retry_count: Option<u32>,

    /// POST the JSON summary to this URL when the run ends
    #[arg(long, value_name = "URL", env = "GENTOO_UPDATER_WEBHOOK")]
    pub notification_webhook: Option<String>,

    /// Parallel emerge jobs instead of one per CPU core
    #[arg(
        long,
        value_name = "N",
        env = "GENTOO_UPDATER_PARALLEL_JOBS",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub parallel_jobs: Option<u32>,

    /// Output language (defaults to the locale)
    #[arg(long, value_name = "de|en")]
    pub lang: Option<Language>,

    /// Comma separated distfile mirrors
    #[arg(long, value_name = "URLS", env = "GENTOO_UPDATER_MIRRORS", value_delimiter = ',')]
    pub mirrors: Vec<String>,

    /// Choose mirrors interactively with mirrorselect
    #[arg(long)]
    pub use_mirrorselect: bool,

    /// How pending ._cfg files are handled
    #[arg(long, value_enum, ignore_case = true)]
    pub etc_update_mode: Option<EtcUpdateArg>,

    /// Recover from masked packages and USE conflicts with autounmask
    #[arg(
        long,
        env = "GENTOO_UPDATER_AUTO_AUTOUNMASK",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub auto_autounmask: Option<bool>,

    /// Never attempt autounmask recovery
    #[arg(long)]
    pub no_auto_autounmask: bool,
}

impl Cli {
    pub fn mode(&self) -> RunMode {
        if self.rebuild_modules {
            RunMode::ModulesOnly
        } else if self.only_sync {
            RunMode::SyncOnly
        } else if self.only_update {
            RunMode::UpdateOnly
        } else if self.only_cleanup {
            RunMode::CleanupOnly
        } else {
            RunMode::Full
        }
    }

    pub fn language(&self) -> Language {
        self.lang.unwrap_or_else(Language::detect)
    }

    /// The effective log filter: `--verbose` wins over `--log-level`.
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            LogLevel::Debug.directive()
        } else {
            self.log_level.directive()
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            verbose: self.verbose,
            skip_sync: self.skip_sync,
            skip_update: self.skip_update,
            skip_eix: self.skip_eix,
            skip_cleanup: self.skip_cleanup,
            skip_revdep: self.skip_revdep,
            skip_internet_check: self.skip_internet_check,
            use_mirrorselect: self.use_mirrorselect,
            force_module_rebuild: self.rebuild_modules,
            webhook: self.notification_webhook.clone().filter(|url| !url.trim().is_empty()),
            language: self.language(),
            retry_delay: Duration::from_secs(2),
        }
    }

    pub fn overrides(&self) -> ConfigOverrides {
        let auto_autounmask = if self.no_auto_autounmask {
            Some(false)
        } else {
            self.auto_autounmask
        };
        ConfigOverrides {
            parallel_jobs: self.parallel_jobs,
            mirrors: (!self.mirrors.is_empty()).then(|| self.mirrors.clone()),
            etc_update_mode: self.etc_update_mode.map(Into::into),
            auto_autounmask,
            retry_count: self.retry_count,
            timeout: self.timeout,
            max_packages: self.max_packages,
        }
    }
}
