use crate::models::RunConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;

/// Result of reading the configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: RunConfig,
    /// Set when the file existed but could not be used.
    pub warning: Option<String>,
}

/// Configuration manager for the JSON configuration file.
///
/// Loading never fails: a missing file yields the built-in defaults, and an
/// unreadable or malformed file yields the defaults plus one warning.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    pub fn new<P: AsRef<Utf8Path>>(config_path: P) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }

    /// Load the configuration file.
    ///
    /// # Returns
    /// The loaded RunConfig, or defaults (with a warning) if it cannot be used
    pub fn load(&self) -> LoadedConfig {
        let contents = match fs::read_to_string(&self.config_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("Config file not found at {}, using defaults", self.config_path);
                return LoadedConfig {
                    config: RunConfig::default(),
                    warning: None,
                };
            }
            Err(e) => return self.fallback(format!("Failed to read config {}: {}", self.config_path, e)),
        };

        match serde_json::from_str::<RunConfig>(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", self.config_path);
                LoadedConfig { config, warning: None }
            }
            Err(e) => self.fallback(format!("Failed to parse config {}: {}", self.config_path, e)),
        }
    }

    /// The caller records `warning` on the run, which logs it; only a debug
    /// event is emitted here.
    fn fallback(&self, warning: String) -> LoadedConfig {
        tracing::debug!("{}, using defaults", warning);
        LoadedConfig {
            config: RunConfig::default(),
            warning: Some(warning),
        }
    }

    /// Save a configuration as pretty-printed JSON.
    pub fn save(&self, config: &RunConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {}", parent))?;
            }
        }

        let json = serde_json::to_string_pretty(config).context("Failed to serialize config to JSON")?;
        fs::write(&self.config_path, json + "\n")
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::info!("Saved config to {}", self.config_path);
        Ok(())
    }

    /// Write the built-in defaults, for `--create-config`.
    pub fn save_default(&self) -> Result<()> {
        self.save(&RunConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn manager_in(temp: &TempDir) -> ConfigManager {
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        ConfigManager::new(root.join("gentoo-updater.conf"))
    }

    #[test]
    fn test_missing_file_gives_defaults_silently() {
        let temp = TempDir::new().unwrap();
        let loaded = manager_in(&temp).load();
        assert_eq!(loaded.config, RunConfig::default());
        assert!(loaded.warning.is_none());
    }

    #[test]
    fn test_malformed_file_gives_defaults_and_one_warning() {
        let temp = TempDir::new().unwrap();
        let manager = manager_in(&temp);
        fs::write(manager.config_path(), "{ not json").unwrap();

        let loaded = manager.load();

        assert_eq!(loaded.config, RunConfig::default());
        assert!(loaded.warning.unwrap().contains("Failed to parse config"));
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_malformed_file_logs_no_warning_of_its_own() {
        let temp = TempDir::new().unwrap();
        let manager = manager_in(&temp);
        fs::write(manager.config_path(), "{ not json").unwrap();

        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let loaded = tracing::subscriber::with_default(subscriber, || manager.load());

        let text = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(loaded.warning.is_some());
        assert!(text.contains("Failed to parse config"));
        assert!(!text.contains("WARN"), "unexpected warning event: {text}");
    }

    #[test]
    fn test_wrong_value_type_falls_back() {
        let temp = TempDir::new().unwrap();
        let manager = manager_in(&temp);
        fs::write(manager.config_path(), r#"{"emerge_jobs": -3}"#).unwrap();

        let loaded = manager.load();

        assert_eq!(loaded.config, RunConfig::default());
        assert!(loaded.warning.is_some());
    }

    #[test]
    fn test_save_default_round_trips() {
        let temp = TempDir::new().unwrap();
        let manager = manager_in(&temp);

        manager.save_default().unwrap();
        let loaded = manager.load();

        assert_eq!(loaded.config, RunConfig::default());
        assert!(loaded.warning.is_none());
    }
}
