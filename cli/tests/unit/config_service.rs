//! Unit tests for the config service.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use ecsbase_cli::application::services::config_service;
use ecsbase_cli::domain::config::StackConfig;
use ecsbase_cli::domain::error::ConfigError;

use crate::mocks::MemoryConfigStore;

#[test]
fn test_set_value_persists_and_returns_new_config() {
    let store = MemoryConfigStore::default();
    let config = config_service::set_value(&store, "mesh.enabled", "false").unwrap();

    assert!(!config.mesh.enabled);
    assert_eq!(store.saves.get(), 1);
    assert!(!store.current().mesh.enabled);
}

#[test]
fn test_set_value_keeps_other_settings() {
    let mut initial = StackConfig::default();
    initial.cluster.name = "my-cluster".to_string();
    let store = MemoryConfigStore::new(initial);

    config_service::set_value(&store, "network.max_azs", "3").unwrap();
    let saved = store.current();
    assert_eq!(saved.network.max_azs, 3);
    assert_eq!(saved.cluster.name, "my-cluster");
}

#[test]
fn test_set_value_unknown_key_is_not_saved() {
    let store = MemoryConfigStore::default();
    let err = config_service::set_value(&store, "capacity.spot", "true").unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::UnknownKey { .. })
    ));
    assert_eq!(store.saves.get(), 0);
}

#[test]
fn test_set_value_invalid_value_is_not_saved() {
    let store = MemoryConfigStore::default();
    let err = config_service::set_value(&store, "network.cidr", "10.0.0.0/8").unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::InvalidValue { .. })
    ));
    assert_eq!(store.saves.get(), 0);
    assert_eq!(store.current(), StackConfig::default());
}

#[test]
fn test_load_config_returns_store_contents() {
    let mut initial = StackConfig::default();
    initial.stack.name = "other-stack".to_string();
    let store = MemoryConfigStore::new(initial.clone());
    assert_eq!(config_service::load_config(&store).unwrap(), initial);
}

#[test]
fn test_user_data_path_is_relative_to_config_directory() {
    let store = MemoryConfigStore::default();
    let path = config_service::user_data_path(&store, &StackConfig::default()).unwrap();
    assert_eq!(path, Path::new("/project/stresstool_user_data.sh"));
}

#[test]
fn test_user_data_path_absolute_is_unchanged() {
    let store = MemoryConfigStore::default();
    let mut config = StackConfig::default();
    config.bastion.user_data = "/etc/boot.sh".to_string();
    let path = config_service::user_data_path(&store, &config).unwrap();
    assert_eq!(path, Path::new("/etc/boot.sh"));
}

#[test]
fn test_set_value_keeps_unknown_sections() {
    let initial: StackConfig = serde_yaml::from_str("capacity:\n  spot: true\n").unwrap();
    let store = MemoryConfigStore::new(initial);

    config_service::set_value(&store, "cluster.name", "other").unwrap();
    let saved = store.current();
    assert_eq!(saved.cluster.name, "other");
    assert_eq!(
        saved.extra.get("capacity"),
        Some(&serde_yaml::from_str::<serde_yaml::Value>("spot: true\n").unwrap())
    );
}
