//! Configuration loading and validation against real files.

use assert_fs::prelude::*;
use std::path::Path;

use repomirror::Config;

#[test]
fn test_load_yaml_config_from_disk() {
    let dir = assert_fs::TempDir::new().unwrap();
    let file = dir.child("config.yml");
    file.write_str(
        "source: github/octocat\n\
         destination: gitee/mirror\n\
         dest_token: t0ken\n\
         black_list:\n\
         \x20 - skip-me\n",
    )
    .unwrap();

    let config = Config::load(file.path()).expect("load failed");
    assert_eq!(config.source, "github/octocat");
    assert_eq!(config.black_list, vec!["skip-me"]);

    let spec = config.resolve().expect("resolve failed");
    assert_eq!(spec.dest_account, "mirror");
    assert_eq!(spec.deny_list, vec!["skip-me"]);
}

#[test]
fn test_load_missing_config_file_fails() {
    assert!(Config::load(Path::new("/nonexistent/config.yml")).is_err());
}

#[test]
fn test_load_malformed_yaml_fails() {
    let dir = assert_fs::TempDir::new().unwrap();
    let file = dir.child("config.yml");
    file.write_str("source: [unterminated\n").unwrap();

    assert!(Config::load(file.path()).is_err());
}

#[test]
fn test_ssh_key_must_exist_on_disk() {
    let dir = assert_fs::TempDir::new().unwrap();
    let key = dir.child("id_ed25519");

    let config = Config {
        source: "github/octocat".to_string(),
        destination: "gitee/mirror".to_string(),
        dest_ssh_key: Some(key.path().display().to_string()),
        ..Default::default()
    };

    let err = config.resolve().unwrap_err();
    assert!(err.to_string().contains("does not exist"));

    key.touch().unwrap();
    let spec = config.resolve().expect("resolve failed");
    assert_eq!(spec.dest_ssh_key.as_deref(), Some(key.path()));
}
