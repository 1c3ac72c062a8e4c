//! Connection establishment for one daemon run
//!
//! [`Connector::establish`] starts the daemon and races its output against
//! a timeout. Error lines are collected without ending the race, since a
//! warning can precede a successful initialization. The first success line
//! wins; a timeout or an exit before success fails the attempt.

use crate::error::VpnError;
use crate::vpn::process::{DaemonCommand, ProcessSupervisor};
use crate::vpn::{ConnectionResult, LineSignal, OutputParser};
use std::time::Duration;
use tracing::{debug, info};

/// Runs single connection attempts against a shared supervisor
pub struct Connector {
    supervisor: ProcessSupervisor,
    parser: OutputParser,
    timeout: Duration,
    verbose: bool,
}

impl Connector {
    /// Create a connector using `supervisor` for the daemon slot
    pub fn new(supervisor: ProcessSupervisor, timeout: Duration, verbose: bool) -> Self {
        Self {
            supervisor,
            parser: OutputParser::new(),
            timeout,
            verbose,
        }
    }

    /// Run one attempt
    ///
    /// Only `AlreadyRunning` escapes as an error. Every other failure,
    /// including spawn errors, timeouts and daemon exits, ends up in the
    /// error list of [`ConnectionResult::Failed`]. After success the daemon
    /// keeps running in the supervisor slot as the live connection.
    pub async fn establish(&self, command: &DaemonCommand) -> Result<ConnectionResult, VpnError> {
        let mut process = match self.supervisor.start(command, self.verbose) {
            Ok(process) => process,
            Err(e @ VpnError::AlreadyRunning { .. }) => return Err(e),
            Err(e) => {
                debug!("{}", e);
                return Ok(ConnectionResult::Failed {
                    errors: vec![e.to_string()],
                });
            }
        };

        let mut errors = Vec::new();
        let mut lines_open = true;
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        loop {
            // The deadline is polled first so a daemon that never stops
            // printing still times out. Lines come before the exit event,
            // which is only sent after both streams are drained, so no line
            // is lost to an exit.
            tokio::select! {
                biased;

                _ = &mut deadline => {
                    debug!(
                        "{} did not complete initialization within {:?}",
                        process.name, self.timeout
                    );
                    self.supervisor.terminate();
                    errors.push(VpnError::ConnectionTimeout { timeout: self.timeout }.to_string());
                    return Ok(ConnectionResult::Failed { errors });
                }

                line = process.lines.recv(), if lines_open => match line {
                    Some(line) => match self.parser.classify(&line.text) {
                        LineSignal::Success => {
                            info!("{} connection established: {}", process.name, line.text);
                            return Ok(ConnectionResult::Established { line: line.text });
                        }
                        LineSignal::Error => {
                            debug!("{} {}: {}", process.name, line.source, line.text);
                            errors.push(line.text);
                        }
                        LineSignal::Informational => {}
                    },
                    None => lines_open = false,
                },

                exit = &mut process.exit => {
                    let message = match exit {
                        Ok(Ok(last_line)) => {
                            debug!("{} last output before exit: {:?}", process.name, last_line);
                            format!("{} daemon exited with code 0", process.name)
                        }
                        Ok(Err(e)) => e.to_string(),
                        Err(_) => format!("{} daemon exit watcher stopped", process.name),
                    };
                    errors.push(message);
                    return Ok(ConnectionResult::Failed { errors });
                }
            }
        }
    }
}
