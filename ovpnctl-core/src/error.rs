//! Error types for the ovpnctl supervisor
//!
//! This module defines all error types used throughout the application,
//! providing consistent error handling and user-friendly error messages.

use std::time::Duration;
use thiserror::Error;

/// Main error type for the ovpnctl application
#[derive(Error, Debug)]
pub enum OvpnError {
    /// Errors related to configuration loading/parsing
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors related to supervising the VPN daemon
    #[error("VPN error: {0}")]
    Vpn(#[from] VpnError),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {path}")]
    LoadFailed { path: String },

    #[error("Failed to save configuration file: {path}")]
    SaveFailed { path: String },

    #[error("Configuration validation error: {message}")]
    ValidationError { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// Daemon supervision and connection errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VpnError {
    /// A supervised daemon already occupies the single-instance slot
    #[error("{name} is already running")]
    AlreadyRunning { name: String },

    #[error("Unsupported platform: {platform}")]
    UnsupportedPlatform { platform: String },

    #[error("Executable not found: {name}")]
    ExecutableNotFound { name: String },

    #[error("Failed to spawn {name}: {reason}")]
    ProcessSpawnError { name: String, reason: String },

    #[error("Timeout error after {timeout:?}")]
    ConnectionTimeout { timeout: Duration },

    /// Daemon exited with a non-zero code or was killed by a signal
    #[error("{message}")]
    ProcessExit { code: Option<i32>, message: String },

    #[error("Connection failed: {}", errors.join("; "))]
    ConnectionFailed { errors: Vec<String> },

    #[error("Init failed")]
    InitFailed { attempts: u32 },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, OvpnError>;
