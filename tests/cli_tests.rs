//! Integration tests for the ovpnctl binary

use std::process::Command;
use tempfile::tempdir;

const OVPNCTL_BINARY: &str = env!("CARGO_BIN_EXE_ovpnctl");

#[test]
fn test_help_lists_subcommands() {
    let output = Command::new(OVPNCTL_BINARY)
        .arg("--help")
        .output()
        .expect("Failed to run ovpnctl --help");

    assert!(output.status.success(), "Help command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("connect"));
    assert!(stdout.contains("default-path"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_default_path_on_linux() {
    let output = Command::new(OVPNCTL_BINARY)
        .arg("default-path")
        .output()
        .expect("Failed to run ovpnctl default-path");

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "/usr/local/opt/openvpn/sbin/openvpn"
    );
}

#[test]
fn test_connect_with_invalid_settings_exits_with_config_code() {
    let temp_dir = tempdir().unwrap();
    let settings = temp_dir.path().join("config.toml");
    std::fs::write(&settings, "[retry]\nmax_attempts = 99\n").unwrap();

    let output = Command::new(OVPNCTL_BINARY)
        .args(["connect", "--settings"])
        .arg(&settings)
        .output()
        .expect("Failed to run ovpnctl connect");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("max_attempts"), "stderr: {}", stderr);
}

#[test]
fn test_connect_with_missing_executable_exits_with_config_code() {
    let temp_dir = tempdir().unwrap();

    let output = Command::new(OVPNCTL_BINARY)
        .args(["connect", "--executable", "no-such-openvpn-binary", "--config"])
        .arg(temp_dir.path().join("office.ovpn"))
        .env("OVPNCTL_CONFIG_DIR", temp_dir.path())
        .output()
        .expect("Failed to run ovpnctl connect");

    assert_eq!(output.status.code(), Some(2));
}
