//! Configuration module
//!
//! Client options for the supervised OpenVPN daemon and TOML settings I/O.

use crate::vpn::reconnection::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod toml_config;

/// Client options
///
/// Only locates the daemon and its `.ovpn` file. The contents of the
/// `.ovpn` file are never read by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Path to the OpenVPN executable, or a bare name looked up on `PATH`
    #[serde(default = "default_executable")]
    pub executable: PathBuf,

    /// Path to the OpenVPN config file, resolved against the working directory
    #[serde(default = "default_config_file")]
    pub config_file: PathBuf,

    /// Echo every daemon output line
    #[serde(default)]
    pub verbose: bool,

    /// Virtual interface passed with `--dev` on Linux
    #[serde(default = "default_device")]
    pub device: String,

    /// Extra arguments appended after the platform flags
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Retry and timeout policy
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_executable() -> PathBuf {
    PathBuf::from("openvpn")
}

fn default_config_file() -> PathBuf {
    PathBuf::from("./config.ovpn")
}

fn default_device() -> String {
    "tun0".to_string()
}

impl ClientOptions {
    /// Create options for the given executable and config file
    pub fn new(executable: impl Into<PathBuf>, config_file: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            config_file: config_file.into(),
            ..Self::default()
        }
    }

    /// Validate the options
    pub fn validate(&self) -> Result<(), String> {
        if self.executable.as_os_str().is_empty() {
            return Err("Executable cannot be empty".to_string());
        }

        if self.config_file.as_os_str().is_empty() {
            return Err("Config file cannot be empty".to_string());
        }

        if self.device.is_empty() || self.device.chars().any(char::is_whitespace) {
            return Err(format!("Invalid device name: {:?}", self.device));
        }

        self.retry.validate().map_err(|e| e.to_string())
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            config_file: default_config_file(),
            verbose: false,
            device: default_device(),
            extra_args: Vec::new(),
            retry: RetryPolicy::default(),
        }
    }
}
