//! OpenVPN argument construction and executable lookup
//!
//! Builds the daemon argument vector for the host platform. Unsupported
//! platforms fail here, before any process is spawned.

use crate::error::VpnError;
use std::path::{Component, Path, PathBuf};

/// Host platforms with known OpenVPN flag sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    Unsupported(String),
}

impl Platform {
    /// Platform this binary is running on
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` value to a platform
    pub fn from_os(os: &str) -> Self {
        match os {
            "windows" => Platform::Windows,
            "linux" => Platform::Linux,
            other => Platform::Unsupported(other.to_string()),
        }
    }

    /// Install location of the OpenVPN client on this platform
    pub fn default_executable_path(&self) -> Result<PathBuf, VpnError> {
        match self {
            Platform::Windows => Ok(PathBuf::from(
                r"C:\Program Files\OpenVPN\bin\openvpn.exe",
            )),
            Platform::Linux => Ok(PathBuf::from("/usr/local/opt/openvpn/sbin/openvpn")),
            Platform::Unsupported(os) => Err(VpnError::UnsupportedPlatform {
                platform: os.clone(),
            }),
        }
    }
}

/// Default OpenVPN executable path for the host platform
pub fn default_executable_path() -> Result<PathBuf, VpnError> {
    Platform::current().default_executable_path()
}

/// Build the OpenVPN argument vector
///
/// Linux additionally daemonizes and names the tun device; Windows needs
/// no extra flags.
pub fn build_args(
    config_file: &Path,
    working_dir: &Path,
    platform: &Platform,
    device: &str,
) -> Result<Vec<String>, VpnError> {
    let mut args = vec![
        "--config".to_string(),
        config_file.to_string_lossy().to_string(),
        "--cd".to_string(),
        working_dir.to_string_lossy().to_string(),
        "--errors-to-stderr".to_string(),
    ];

    match platform {
        Platform::Windows => {}
        Platform::Linux => {
            args.push("--daemon".to_string());
            args.push("--dev".to_string());
            args.push(device.to_string());
        }
        Platform::Unsupported(os) => {
            return Err(VpnError::UnsupportedPlatform {
                platform: os.clone(),
            })
        }
    }

    Ok(args)
}

/// Resolve a path against `working_dir` unless it is already absolute
pub fn absolutize(path: &Path, working_dir: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        let relative: PathBuf = path
            .components()
            .filter(|component| !matches!(component, Component::CurDir))
            .collect();
        working_dir.join(relative)
    }
}

/// Resolve the executable, searching `PATH` for bare names
pub fn resolve_executable(executable: &Path) -> Result<PathBuf, VpnError> {
    if executable.components().count() > 1 || executable.is_absolute() {
        return Ok(executable.to_path_buf());
    }

    which::which(executable).map_err(|e| {
        tracing::debug!("Lookup of {:?} on PATH failed: {}", executable, e);
        VpnError::ExecutableNotFound {
            name: executable.to_string_lossy().to_string(),
        }
    })
}
