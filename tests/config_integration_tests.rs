//! Integration tests for ConfigManager and the configuration file
//!
//! These tests verify:
//! - Partial files merge over the built-in defaults
//! - "auto" and numeric job/load policies
//! - Malformed files fall back to defaults with a warning
//! - Command-line overrides win over the file

use camino::Utf8PathBuf;
use gentoo_updater::ConfigManager;
use gentoo_updater::models::{ConfigOverrides, EtcUpdateMode, JobsPolicy, LoadPolicy, RunConfig};
use std::fs;
use tempfile::TempDir;

fn create_test_config() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    let manager = ConfigManager::new(root.join("etc/gentoo-updater.conf"));
    (temp_dir, manager)
}

fn write(manager: &ConfigManager, body: &str) {
    fs::create_dir_all(manager.config_path().parent().unwrap()).unwrap();
    fs::write(manager.config_path(), body).unwrap();
}

#[test]
fn test_partial_file_keeps_remaining_defaults() {
    let (_temp_dir, manager) = create_test_config();
    write(
        &manager,
        r#"{
            "emerge_jobs": 8,
            "etc_update_mode": "auto",
            "critical_packages": ["sys-kernel/gentoo-sources"],
            "some_future_key": true
        }"#,
    );

    let loaded = manager.load();

    assert!(loaded.warning.is_none());
    let config = loaded.config;
    assert_eq!(config.emerge_jobs, JobsPolicy::Fixed(8));
    assert_eq!(config.etc_update_mode, EtcUpdateMode::Auto);
    assert_eq!(config.critical_packages, vec!["sys-kernel/gentoo-sources".to_string()]);
    assert_eq!(config.emerge_load_average, LoadPolicy::Auto);
    assert_eq!(config.min_free_space_gb, 5);
    assert!(config.auto_depclean);
}

#[test]
fn test_policies_accept_auto_and_numbers() {
    let (_temp_dir, manager) = create_test_config();
    write(&manager, r#"{"emerge_jobs": "auto", "emerge_load_average": 6.5}"#);

    let config = manager.load().config;

    assert_eq!(config.emerge_jobs(12), 12);
    assert_eq!(config.load_average(12), 6.5);
}

#[test]
fn test_invalid_job_count_falls_back_to_defaults() {
    let (_temp_dir, manager) = create_test_config();
    write(&manager, r#"{"emerge_jobs": 0, "min_free_space_gb": 50}"#);

    let loaded = manager.load();

    assert_eq!(loaded.config, RunConfig::default());
    let warning = loaded.warning.unwrap();
    assert!(warning.contains(manager.config_path().as_str()));
}

#[test]
fn test_saved_file_is_pretty_json_and_reloads() {
    let (_temp_dir, manager) = create_test_config();
    let config = RunConfig {
        emerge_jobs: JobsPolicy::Fixed(3),
        notification_email: "root@localhost".to_string(),
        mirrors: vec!["https://mirror.example/gentoo/".to_string()],
        ..RunConfig::default()
    };

    manager.save(&config).unwrap();
    let text = fs::read_to_string(manager.config_path()).unwrap();

    assert!(text.contains("\n  \"emerge_jobs\": 3"));
    assert!(text.ends_with("}\n"));
    assert_eq!(manager.load().config, config);
}

#[test]
fn test_default_file_spells_out_auto_policies() {
    let (_temp_dir, manager) = create_test_config();
    manager.save_default().unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(manager.config_path()).unwrap()).unwrap();

    assert_eq!(value["emerge_jobs"], "auto");
    assert_eq!(value["emerge_load_average"], "auto");
    assert_eq!(value["etc_update_mode"], "interactive");
}

#[test]
fn test_overrides_win_over_file() {
    let (_temp_dir, manager) = create_test_config();
    write(
        &manager,
        r#"{"emerge_jobs": 2, "mirrors": ["https://a.example/"], "auto_autounmask": true}"#,
    );

    let mut config = manager.load().config;
    config.apply_overrides(ConfigOverrides {
        parallel_jobs: Some(16),
        mirrors: Some(vec!["https://b.example/".to_string()]),
        auto_autounmask: Some(false),
        retry_count: Some(3),
        ..ConfigOverrides::default()
    });

    assert_eq!(config.emerge_jobs(4), 16);
    assert_eq!(config.mirrors, vec!["https://b.example/".to_string()]);
    assert!(!config.auto_autounmask);
    assert_eq!(config.retry_count, 3);
    // Not overridden.
    assert_eq!(config.etc_update_mode, EtcUpdateMode::Interactive);
}
