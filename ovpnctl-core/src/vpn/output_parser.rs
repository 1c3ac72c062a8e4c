//! Pattern-based classifier for OpenVPN output lines
//!
//! Maps each daemon output line to a [`LineSignal`] using regex patterns.
//! The success pattern is checked before the error pattern, so a line that
//! matches both counts as success.

use crate::vpn::LineSignal;
use regex::Regex;

/// Classifier for OpenVPN output
pub struct OutputParser {
    /// Pattern for "Initialization Sequence Completed" (case-sensitive)
    init_completed_pattern: Regex,
    /// Pattern for failure keywords (case-insensitive)
    error_pattern: Regex,
}

impl OutputParser {
    /// Create a new OutputParser with compiled regex patterns
    pub fn new() -> Self {
        Self {
            init_completed_pattern: Regex::new(r"Initialization Sequence Completed")
                .expect("Failed to compile init_completed pattern"),
            error_pattern: Regex::new(r"(?i)failed|denied|error|not found")
                .expect("Failed to compile error pattern"),
        }
    }

    /// Classify a single output line
    pub fn classify(&self, line: &str) -> LineSignal {
        if self.init_completed_pattern.is_match(line) {
            return LineSignal::Success;
        }

        if self.error_pattern.is_match(line) {
            return LineSignal::Error;
        }

        LineSignal::Informational
    }
}

impl Default for OutputParser {
    fn default() -> Self {
        Self::new()
    }
}
