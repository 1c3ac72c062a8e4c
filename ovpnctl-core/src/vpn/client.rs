//! OpenVPN client with bounded retries
//!
//! [`VpnClient`] is the public surface: `connect` resolves the options into
//! a daemon command and retries failed attempts with a growing delay,
//! `disconnect` kills the live daemon.

use crate::config::ClientOptions;
use crate::error::VpnError;
use crate::vpn::args::{absolutize, build_args, resolve_executable, Platform};
use crate::vpn::connector::Connector;
use crate::vpn::process::{DaemonCommand, ProcessSupervisor};
use crate::vpn::reconnection::RetryPolicy;
use crate::vpn::ConnectionResult;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Supervised OpenVPN client
pub struct VpnClient {
    options: ClientOptions,
    policy: RetryPolicy,
    supervisor: ProcessSupervisor,
    connector: Connector,
    /// Consecutive failed attempts, reset on success
    attempts: AtomicU32,
}

impl VpnClient {
    /// Client on the process-wide supervisor
    ///
    /// Every client built this way shares one daemon slot, so a second
    /// client cannot start a daemon while another one is live.
    pub fn new(options: ClientOptions) -> Self {
        Self::with_supervisor(options, ProcessSupervisor::shared())
    }

    /// Client on the given supervisor
    pub fn with_supervisor(options: ClientOptions, supervisor: ProcessSupervisor) -> Self {
        let policy = options.retry.clone();
        let connector = Connector::new(
            supervisor.clone(),
            policy.connect_timeout(),
            options.verbose,
        );

        Self {
            options,
            policy,
            supervisor,
            connector,
            attempts: AtomicU32::new(0),
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Consecutive failed attempts recorded so far
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Whether the daemon is still running
    pub fn is_running(&self) -> bool {
        self.supervisor.is_running()
    }

    /// PID of the running daemon
    pub fn pid(&self) -> Option<u32> {
        self.supervisor.pid()
    }

    /// Build the daemon command for the host platform
    ///
    /// Fails on unsupported platforms and missing executables, before
    /// anything is spawned.
    pub fn daemon_command(&self) -> Result<DaemonCommand, VpnError> {
        let working_dir = std::env::current_dir().map_err(|e| VpnError::ProcessSpawnError {
            name: self.options.executable.to_string_lossy().to_string(),
            reason: format!("Failed to get current directory: {}", e),
        })?;

        let config_file = absolutize(&self.options.config_file, &working_dir);
        let mut args = build_args(
            &config_file,
            &working_dir,
            &Platform::current(),
            &self.options.device,
        )?;
        args.extend(self.options.extra_args.iter().cloned());

        let program = resolve_executable(&self.options.executable)?;
        Ok(DaemonCommand::new(program, args))
    }

    /// Connect using the configured options
    ///
    /// Returns the daemon's success line.
    pub async fn connect(&self) -> Result<String, VpnError> {
        let command = self.daemon_command()?;
        self.connect_with(&command).await
    }

    /// Connect by running `command`, retrying failed attempts
    ///
    /// Each failed attempt logs its errors and bumps the attempt count.
    /// While the count stays below `max_attempts` the same command is retried
    /// after `count * backoff_step`. Reaching the bound returns `InitFailed`
    /// and leaves the count in place; with `carry_over_attempts` the next
    /// call continues from it.
    #[tracing::instrument(
        skip(self, command),
        fields(daemon = %command.name(), max_attempts = self.policy.max_attempts)
    )]
    pub async fn connect_with(&self, command: &DaemonCommand) -> Result<String, VpnError> {
        if !self.policy.carry_over_attempts {
            self.attempts.store(0, Ordering::SeqCst);
        }

        loop {
            let errors = match self.connector.establish(command).await? {
                ConnectionResult::Established { line } => {
                    self.attempts.store(0, Ordering::SeqCst);
                    info!("Connected");
                    return Ok(line);
                }
                ConnectionResult::Failed { errors } => errors,
            };

            for error in &errors {
                warn!("{}", error);
            }

            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt >= self.policy.max_attempts {
                tracing::error!(
                    attempts = attempt,
                    "Giving up: {}",
                    VpnError::ConnectionFailed { errors }
                );
                return Err(VpnError::InitFailed { attempts: attempt });
            }

            let delay = self.policy.backoff(attempt);
            info!(
                "Attempt {}/{} failed, retrying in {:?}",
                attempt, self.policy.max_attempts, delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Kill the daemon immediately
    ///
    /// A no-op when nothing is running.
    pub fn disconnect(&self) {
        self.supervisor.terminate();
    }

    /// Ask the daemon to exit, killing it if it is still alive after `grace`
    pub async fn shutdown(&self, grace: Duration) {
        self.supervisor.shutdown(grace).await;
    }
}
