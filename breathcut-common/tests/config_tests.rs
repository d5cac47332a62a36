//! Configuration loading and graceful degradation tests
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate BREATHCUT_CONFIG are marked with #[serial].

use breathcut_common::config::{
    load_config, load_config_file, resolve_config_path, write_toml_config, TomlConfig,
    CONFIG_ENV_VAR,
};
use serial_test::serial;
use std::env;
use tempfile::TempDir;

#[test]
#[serial]
fn test_env_var_used_when_no_cli_arg() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("from_env.toml");
    std::fs::write(&path, "[detection]\nsensitivity = 80\n").unwrap();

    env::set_var(CONFIG_ENV_VAR, &path);
    let resolved = resolve_config_path(None);
    let config = load_config(None);
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(path));
    assert_eq!(config.unwrap().detection.sensitivity, 80);
}

#[test]
#[serial]
fn test_cli_arg_beats_env_var() {
    let temp_dir = TempDir::new().unwrap();
    let env_path = temp_dir.path().join("env.toml");
    let cli_path = temp_dir.path().join("cli.toml");
    std::fs::write(&env_path, "[removal]\npause_seconds = 0.5\n").unwrap();
    std::fs::write(&cli_path, "[removal]\npause_seconds = 0.1\n").unwrap();

    env::set_var(CONFIG_ENV_VAR, &env_path);
    let config = load_config(Some(&cli_path));
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config.unwrap().removal.pause_seconds, 0.1);
}

#[test]
#[serial]
fn test_missing_explicit_file_degrades_to_defaults() {
    env::remove_var(CONFIG_ENV_VAR);
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("does_not_exist.toml");

    let config = load_config(Some(&missing)).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_malformed_file_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "[detection\nsensitivity = ").unwrap();

    let err = load_config_file(&path).unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}

#[test]
fn test_out_of_range_value_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("range.toml");
    std::fs::write(&path, "[detection]\nsensitivity = 150\n").unwrap();

    let err = load_config_file(&path).unwrap_err();
    assert!(err.to_string().contains("sensitivity"));
}

#[test]
fn test_write_then_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    let mut config = TomlConfig::default();
    config.logging.level = "debug".to_string();
    config.detection.min_duration_ms = 450;
    config.analysis.merge_gap_ms = 80;

    write_toml_config(&config, &path).unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("toml.tmp").exists());

    let loaded = load_config_file(&path).unwrap();
    assert_eq!(loaded, config);
}
