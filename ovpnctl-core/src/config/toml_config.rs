//! TOML settings file I/O
//!
//! Handles loading and saving client options to/from TOML files
//! in the user's configuration directory.

use crate::config::ClientOptions;
use crate::error::{ConfigError, OvpnError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default settings file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Get the default configuration directory
///
/// Returns ~/.config/ovpnctl, or OVPNCTL_CONFIG_DIR environment variable if set
pub fn get_config_dir() -> Result<PathBuf, OvpnError> {
    // Allow tests to override config directory via environment variable
    if let Ok(config_dir) = std::env::var("OVPNCTL_CONFIG_DIR") {
        return Ok(PathBuf::from(config_dir));
    }

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| {
            OvpnError::Config(ConfigError::IoError {
                message: "HOME environment variable not set".to_string(),
            })
        })?;

    Ok(PathBuf::from(home).join(".config").join("ovpnctl"))
}

/// Get the default settings file path
pub fn get_config_path() -> Result<PathBuf, OvpnError> {
    let config_dir = get_config_dir()?;
    Ok(config_dir.join(CONFIG_FILE_NAME))
}

/// Check if a settings file exists
pub fn config_exists() -> Result<bool, OvpnError> {
    let config_path = get_config_path()?;
    Ok(config_path.exists())
}

/// Load client options from the default settings file
///
/// Falls back to defaults when no settings file exists.
pub fn load_options() -> Result<ClientOptions, OvpnError> {
    let config_path = get_config_path()?;
    if !config_path.exists() {
        debug!("No settings file at {:?}, using defaults", config_path);
        return Ok(ClientOptions::default());
    }
    load_options_from_path(&config_path)
}

/// Load client options from a specific TOML file
pub fn load_options_from_path<P: AsRef<Path>>(path: P) -> Result<ClientOptions, OvpnError> {
    let contents = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => OvpnError::Config(ConfigError::LoadFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        }),
        _ => OvpnError::Config(ConfigError::IoError {
            message: format!("Failed to read config file: {}", e),
        }),
    })?;

    let options: ClientOptions = toml::from_str(&contents)?;

    options
        .validate()
        .map_err(|e| OvpnError::Config(ConfigError::ValidationError { message: e }))?;

    debug!(
        "Loaded settings: executable={:?}, config_file={:?}, max_attempts={}, timeout={}ms",
        options.executable,
        options.config_file,
        options.retry.max_attempts,
        options.retry.connect_timeout_ms
    );

    Ok(options)
}

/// Save client options to the default settings file
pub fn save_options(options: &ClientOptions) -> Result<(), OvpnError> {
    let config_path = get_config_path()?;
    save_options_to_path(options, &config_path)
}

/// Save client options to a specific TOML file
pub fn save_options_to_path<P: AsRef<Path>>(
    options: &ClientOptions,
    path: P,
) -> Result<(), OvpnError> {
    options
        .validate()
        .map_err(|e| OvpnError::Config(ConfigError::ValidationError { message: e }))?;

    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            OvpnError::Config(ConfigError::IoError {
                message: format!("Failed to create config directory: {}", e),
            })
        })?;
    }

    let contents = toml::to_string_pretty(options)?;

    std::fs::write(&path, contents).map_err(|_| {
        OvpnError::Config(ConfigError::SaveFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        })
    })?;

    info!("Saved settings to {:?}", path.as_ref());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_options_roundtrip() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("settings.toml");

        let mut original = ClientOptions::new("/usr/sbin/openvpn", "/etc/openvpn/office.ovpn");
        original.verbose = true;
        original.extra_args = vec!["--verb".to_string(), "4".to_string()];
        original.retry.max_attempts = 5;

        save_options_to_path(&original, &path).unwrap();
        let loaded = load_options_from_path(&path).unwrap();

        assert_eq!(original, loaded);
    }

    #[test]
    fn test_save_rejects_invalid_options() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("settings.toml");

        let mut options = ClientOptions::default();
        options.device = String::new();

        assert!(save_options_to_path(&options, &path).is_err());
        assert!(!path.exists());
    }
}
