//! Value types flowing between the drain, the supervisor and the connector

use crate::error::VpnError;
use std::fmt;

/// Output channel a line was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamSource::Stdout => write!(f, "stdout"),
            StreamSource::Stderr => write!(f, "stderr"),
        }
    }
}

/// One trimmed line of daemon output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub source: StreamSource,
    pub text: String,
}

impl OutputLine {
    pub fn new(source: StreamSource, text: impl Into<String>) -> Self {
        Self {
            source,
            text: text.into(),
        }
    }
}

/// Meaning of a single output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSignal {
    /// Daemon finished initialization, the tunnel is up
    Success,
    /// Line reports a failure condition
    Error,
    /// Anything else
    Informational,
}

/// Terminal outcome of one connection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionResult {
    /// A success line arrived; carries that line
    Established { line: String },

    /// Attempt failed; carries the collected error lines in arrival order
    Failed { errors: Vec<String> },
}

impl ConnectionResult {
    pub fn is_established(&self) -> bool {
        matches!(self, ConnectionResult::Established { .. })
    }

    /// Convert into a `Result`, folding the error list into `ConnectionFailed`
    pub fn into_result(self) -> Result<String, VpnError> {
        match self {
            ConnectionResult::Established { line } => Ok(line),
            ConnectionResult::Failed { errors } => Err(VpnError::ConnectionFailed { errors }),
        }
    }
}
