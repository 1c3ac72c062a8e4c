//! Tests for client options and settings file handling

use ovpnctl_core::config::toml_config::{
    config_exists, get_config_path, load_options, load_options_from_path, save_options,
};
use ovpnctl_core::config::ClientOptions;
use ovpnctl_core::error::{ConfigError, OvpnError};
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_default_options() {
    let options = ClientOptions::default();

    assert_eq!(options.executable, PathBuf::from("openvpn"));
    assert_eq!(options.config_file, PathBuf::from("./config.ovpn"));
    assert!(!options.verbose);
    assert_eq!(options.device, "tun0");
    assert!(options.extra_args.is_empty());
    assert_eq!(options.retry.max_attempts, 3);
    assert!(options.validate().is_ok());
}

#[test]
fn test_load_partial_settings_file() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
config_file = "/etc/openvpn/office.ovpn"
verbose = true

[retry]
connect_timeout_ms = 45000
"#,
    )
    .unwrap();

    let options = load_options_from_path(&path).unwrap();

    assert_eq!(options.config_file, PathBuf::from("/etc/openvpn/office.ovpn"));
    assert_eq!(options.executable, PathBuf::from("openvpn"));
    assert!(options.verbose);
    assert_eq!(options.retry.connect_timeout_ms, 45_000);
    assert_eq!(options.retry.max_attempts, 3);
}

#[test]
fn test_load_missing_file() {
    let temp_dir = tempdir().unwrap();
    let result = load_options_from_path(temp_dir.path().join("missing.toml"));

    assert!(matches!(
        result,
        Err(OvpnError::Config(ConfigError::LoadFailed { .. }))
    ));
}

#[test]
fn test_load_rejects_invalid_policy() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[retry]\nmax_attempts = 0\n").unwrap();

    let result = load_options_from_path(&path);

    assert!(matches!(
        result,
        Err(OvpnError::Config(ConfigError::ValidationError { .. }))
    ));
}

#[test]
fn test_load_rejects_malformed_toml() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "verbose = maybe").unwrap();

    assert!(matches!(
        load_options_from_path(&path),
        Err(OvpnError::Toml(_))
    ));
}

// Only test touching OVPNCTL_CONFIG_DIR, so no other test races on it
#[test]
fn test_default_settings_location() {
    let temp_dir = tempdir().unwrap();
    std::env::set_var("OVPNCTL_CONFIG_DIR", temp_dir.path());

    assert_eq!(get_config_path().unwrap(), temp_dir.path().join("config.toml"));
    assert!(!config_exists().unwrap());
    assert_eq!(load_options().unwrap(), ClientOptions::default());

    let options = ClientOptions::new("/usr/sbin/openvpn", "/etc/openvpn/home.ovpn");
    save_options(&options).unwrap();

    assert!(config_exists().unwrap());
    assert_eq!(load_options().unwrap(), options);

    std::env::remove_var("OVPNCTL_CONFIG_DIR");
}
