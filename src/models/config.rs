use serde::{Deserialize, Serialize};
use std::fmt;

/// Parallelism policy for `emerge --jobs`.
///
/// Persisted either as the string `"auto"` (one job per CPU core) or as an
/// explicit number. Numeric strings such as `"4"` are accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "RawPolicy", into = "RawPolicy")]
pub enum JobsPolicy {
    #[default]
    Auto,
    Fixed(u32),
}

/// Load-average ceiling policy for `emerge --load-average`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(try_from = "RawPolicy", into = "RawPolicy")]
pub enum LoadPolicy {
    #[default]
    Auto,
    Fixed(f64),
}

/// On-disk shape shared by both policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawPolicy {
    Integer(u64),
    Number(f64),
    Text(String),
}

impl RawPolicy {
    /// `None` for "auto", otherwise the numeric value.
    fn value(self) -> Result<Option<f64>, String> {
        match self {
            RawPolicy::Integer(n) => Ok(Some(n as f64)),
            RawPolicy::Number(n) => Ok(Some(n)),
            RawPolicy::Text(text) if text.trim().eq_ignore_ascii_case("auto") => Ok(None),
            RawPolicy::Text(text) => text
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| format!("expected \"auto\" or a number, got {text:?}")),
        }
    }
}

impl TryFrom<RawPolicy> for JobsPolicy {
    type Error = String;

    fn try_from(raw: RawPolicy) -> Result<Self, Self::Error> {
        match raw.value()? {
            None => Ok(JobsPolicy::Auto),
            Some(n) if n >= 1.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => {
                Ok(JobsPolicy::Fixed(n as u32))
            }
            Some(n) => Err(format!("emerge_jobs must be a positive integer, got {n}")),
        }
    }
}

impl From<JobsPolicy> for RawPolicy {
    fn from(policy: JobsPolicy) -> Self {
        match policy {
            JobsPolicy::Auto => RawPolicy::Text("auto".to_string()),
            JobsPolicy::Fixed(jobs) => RawPolicy::Integer(u64::from(jobs)),
        }
    }
}

impl TryFrom<RawPolicy> for LoadPolicy {
    type Error = String;

    fn try_from(raw: RawPolicy) -> Result<Self, Self::Error> {
        match raw.value()? {
            None => Ok(LoadPolicy::Auto),
            Some(n) if n > 0.0 => Ok(LoadPolicy::Fixed(n)),
            Some(n) => Err(format!("emerge_load_average must be positive, got {n}")),
        }
    }
}

impl From<LoadPolicy> for RawPolicy {
    fn from(policy: LoadPolicy) -> Self {
        match policy {
            LoadPolicy::Auto => RawPolicy::Text("auto".to_string()),
            LoadPolicy::Fixed(load) => RawPolicy::Number(load),
        }
    }
}

/// How pending `._cfg` configuration updates are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EtcUpdateMode {
    #[default]
    Interactive,
    Auto,
    Skip,
}

impl fmt::Display for EtcUpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EtcUpdateMode::Interactive => "interactive",
            EtcUpdateMode::Auto => "auto",
            EtcUpdateMode::Skip => "skip",
        };
        f.write_str(name)
    }
}

/// Settings for one maintenance run.
///
/// Loaded once from `/etc/gentoo-updater.conf` (JSON). Every field has a
/// serde default, so a partial file shallow-merges over the built-in
/// defaults and unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub emerge_jobs: JobsPolicy,
    pub emerge_load_average: LoadPolicy,

    pub enable_backups: bool,
    pub backup_dir: String,
    pub log_retention_days: u64,

    pub enable_notifications: bool,
    pub notification_email: String,

    pub min_free_space_gb: u64,

    pub auto_depclean: bool,
    pub auto_revdep_rebuild: bool,

    pub critical_packages: Vec<String>,

    /// Distfile mirrors; empty means the built-in preference list.
    pub mirrors: Vec<String>,
    pub etc_update_mode: EtcUpdateMode,
    pub auto_autounmask: bool,

    // Advisory only: recorded and displayed, never enforced.
    pub retry_count: u32,
    pub timeout: Option<u64>,
    pub max_packages: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            emerge_jobs: JobsPolicy::Auto,
            emerge_load_average: LoadPolicy::Auto,
            enable_backups: true,
            backup_dir: "/var/backups/gentoo-updater".to_string(),
            log_retention_days: 30,
            enable_notifications: false,
            notification_email: String::new(),
            min_free_space_gb: 5,
            auto_depclean: true,
            auto_revdep_rebuild: true,
            critical_packages: vec![
                "sys-devel/gcc".to_string(),
                "sys-libs/glibc".to_string(),
                "dev-lang/python".to_string(),
            ],
            mirrors: Vec::new(),
            etc_update_mode: EtcUpdateMode::Interactive,
            auto_autounmask: true,
            retry_count: 1,
            timeout: None,
            max_packages: None,
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub parallel_jobs: Option<u32>,
    pub mirrors: Option<Vec<String>>,
    pub etc_update_mode: Option<EtcUpdateMode>,
    pub auto_autounmask: Option<bool>,
    pub retry_count: Option<u32>,
    pub timeout: Option<u64>,
    pub max_packages: Option<usize>,
}

impl RunConfig {
    /// Apply command-line overrides. Called once, before the run starts.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(jobs) = overrides.parallel_jobs {
            self.emerge_jobs = JobsPolicy::Fixed(jobs.max(1));
        }
        if let Some(mirrors) = overrides.mirrors {
            self.mirrors = mirrors
                .into_iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
        }
        if let Some(mode) = overrides.etc_update_mode {
            self.etc_update_mode = mode;
        }
        if let Some(enabled) = overrides.auto_autounmask {
            self.auto_autounmask = enabled;
        }
        if let Some(count) = overrides.retry_count {
            self.retry_count = count;
        }
        if overrides.timeout.is_some() {
            self.timeout = overrides.timeout;
        }
        if overrides.max_packages.is_some() {
            self.max_packages = overrides.max_packages;
        }
    }

    /// Number of parallel emerge jobs for a machine with `cpu_count` cores.
    pub fn emerge_jobs(&self, cpu_count: usize) -> u32 {
        match self.emerge_jobs {
            JobsPolicy::Auto => cpu_count.max(1) as u32,
            JobsPolicy::Fixed(jobs) => jobs.max(1),
        }
    }

    /// Load-average ceiling for a machine with `cpu_count` cores.
    pub fn load_average(&self, cpu_count: usize) -> f64 {
        match self.emerge_load_average {
            LoadPolicy::Auto => cpu_count.max(1) as f64,
            LoadPolicy::Fixed(load) => load,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_config_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.min_free_space_gb, 5);
        assert_eq!(config.log_retention_days, 30);
        assert!(config.enable_backups);
        assert!(!config.enable_notifications);
        assert_eq!(config.etc_update_mode, EtcUpdateMode::Interactive);
        assert_eq!(config.critical_packages.len(), 3);
    }

    #[test]
    fn test_jobs_policy_parses_auto_and_integer() {
        let auto: JobsPolicy = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(auto, JobsPolicy::Auto);

        let fixed: JobsPolicy = serde_json::from_str("6").unwrap();
        assert_eq!(fixed, JobsPolicy::Fixed(6));

        let quoted: JobsPolicy = serde_json::from_str("\"4\"").unwrap();
        assert_eq!(quoted, JobsPolicy::Fixed(4));

        assert!(serde_json::from_str::<JobsPolicy>("\"many\"").is_err());
        assert!(serde_json::from_str::<JobsPolicy>("0").is_err());
    }

    #[test]
    fn test_load_policy_parses_float() {
        let load: LoadPolicy = serde_json::from_str("3.5").unwrap();
        assert_eq!(load, LoadPolicy::Fixed(3.5));
        assert_eq!(serde_json::to_string(&LoadPolicy::Auto).unwrap(), "\"auto\"");
    }

    #[test]
    fn test_partial_document_merges_over_defaults() {
        let config: RunConfig =
            serde_json::from_str(r#"{"emerge_jobs": 2, "auto_depclean": false, "bogus": 1}"#)
                .unwrap();

        assert_eq!(config.emerge_jobs(16), 2);
        assert!(!config.auto_depclean);
        // Untouched keys keep their defaults
        assert!(config.auto_revdep_rebuild);
        assert_eq!(config.backup_dir, "/var/backups/gentoo-updater");
    }

    #[test]
    fn test_auto_policies_follow_cpu_count() {
        let config = RunConfig::default();
        assert_eq!(config.emerge_jobs(8), 8);
        assert_eq!(config.load_average(8), 8.0);
        assert_eq!(config.emerge_jobs(0), 1);
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = RunConfig::default();
        config.apply_overrides(ConfigOverrides {
            parallel_jobs: Some(3),
            mirrors: Some(vec!["https://a/".to_string(), " ".to_string()]),
            etc_update_mode: Some(EtcUpdateMode::Skip),
            auto_autounmask: Some(false),
            max_packages: Some(10),
            ..Default::default()
        });

        assert_eq!(config.emerge_jobs(32), 3);
        assert_eq!(config.mirrors, vec!["https://a/".to_string()]);
        assert_eq!(config.etc_update_mode, EtcUpdateMode::Skip);
        assert!(!config.auto_autounmask);
        assert_eq!(config.max_packages, Some(10));
        assert_eq!(config.timeout, None);
    }
}
