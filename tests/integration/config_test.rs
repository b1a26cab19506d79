use std::fs;
use std::path::PathBuf;

use sysglance::core::config::{GroupConfig, InfoColumn, MemberConfig, MemoryMode};
use sysglance::core::monitor::SortKey;
use sysglance::Config;
use tempfile::TempDir;

#[test]
fn test_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    let config = Config {
        delay: 1.5,
        sort: SortKey::ResidentSize,
        info: InfoColumn::Wchan,
        memory: MemoryMode::Used,
        map_file: Some(PathBuf::from("/boot/System.map")),
        top: 20,
        groups: vec![GroupConfig {
            name: "ops".to_string(),
            members: vec![MemberConfig { id: 'r', user: "root".to_string() }],
        }],
        ..Config::default()
    };
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_missing_file_gives_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let loaded = Config::load_from(&temp_dir.path().join("absent.toml")).unwrap();
    assert_eq!(loaded, Config::default());
}

#[test]
fn test_empty_file_gives_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "   \n").unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), Config::default());
}

#[test]
fn test_corrupt_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "delay = [oops\n").unwrap();
    assert_eq!(Config::load_from(&path).unwrap(), Config::default());
}

#[test]
fn test_invalid_values_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");

    fs::write(&path, "delay = -2.0\n").unwrap();
    assert!(Config::load_from(&path).is_err());

    fs::write(
        &path,
        "[[groups]]\nname = \"dup\"\nmembers = [{ id = \"x\", user = \"a\" }, { id = \"x\", user = \"b\" }]\n",
    )
    .unwrap();
    let err = Config::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("dup"));
}
