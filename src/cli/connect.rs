//! Connect command
//!
//! Runs the retrying connect on a tokio runtime, then keeps the daemon
//! alive until Ctrl+C or until it exits on its own.

use colored::Colorize;
use ovpnctl_core::config::toml_config::{load_options, load_options_from_path};
use ovpnctl_core::config::ClientOptions;
use ovpnctl_core::error::{ConfigError, OvpnError};
use ovpnctl_core::vpn::VpnClient;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Time the daemon gets to exit after SIGTERM
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// How often the held connection is checked for a dead daemon
const LIVENESS_INTERVAL: Duration = Duration::from_secs(1);

/// Command-line overrides for the settings file
pub struct ConnectArgs {
    pub config: Option<PathBuf>,
    pub executable: Option<PathBuf>,
    pub settings: Option<PathBuf>,
    pub verbose: bool,
}

fn resolve_options(args: ConnectArgs) -> Result<ClientOptions, OvpnError> {
    let mut options = match args.settings {
        Some(path) => load_options_from_path(path)?,
        None => load_options()?,
    };

    if let Some(config) = args.config {
        options.config_file = config;
    }
    if let Some(executable) = args.executable {
        options.executable = executable;
    }
    options.verbose |= args.verbose;

    options
        .validate()
        .map_err(|e| OvpnError::Config(ConfigError::ValidationError { message: e }))?;

    Ok(options)
}

/// Run the connect command
pub fn run_connect(args: ConnectArgs) -> Result<(), OvpnError> {
    let options = resolve_options(args)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(connect_and_hold(options))
}

async fn connect_and_hold(options: ClientOptions) -> Result<(), OvpnError> {
    let client = VpnClient::new(options);
    info!("Using OpenVPN config {:?}", client.options().config_file);

    let line = client.connect().await?;
    println!("{} {}", "✓".green(), "Connected".bold());
    info!("Daemon reported: {}", line);
    println!("Press Ctrl+C to disconnect");

    let mut liveness = tokio::time::interval(LIVENESS_INTERVAL);
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                }
                break;
            }
            _ = liveness.tick() => {
                if !client.is_running() {
                    println!("{} {}", "✗".red(), "OpenVPN daemon exited".bold());
                    return Ok(());
                }
            }
        }
    }

    println!("Disconnecting...");
    client.shutdown(SHUTDOWN_GRACE).await;
    println!("{} {}", "✓".green(), "Disconnected".bold());
    Ok(())
}
