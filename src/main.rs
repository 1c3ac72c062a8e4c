//! ovpnctl - OpenVPN client supervisor
//!
//! Starts the OpenVPN daemon, waits for it to report a completed
//! initialization, retries failed attempts and holds the connection
//! until interrupted.

use clap::{Parser, Subcommand};
use ovpnctl_core::error::{OvpnError, VpnError};
use ovpnctl_core::init_logging;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "ovpnctl")]
#[command(about = "Supervise an OpenVPN client connection with automatic retries")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and hold the connection until Ctrl+C
    Connect {
        /// OpenVPN config file (.ovpn)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// OpenVPN executable path or name
        #[arg(short, long)]
        executable: Option<PathBuf>,

        /// Settings file (defaults to ~/.config/ovpnctl/config.toml)
        #[arg(long)]
        settings: Option<PathBuf>,
    },
    /// Print the default OpenVPN executable path for this platform
    DefaultPath,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    let result = match cli.command {
        Commands::Connect {
            config,
            executable,
            settings,
        } => cli::connect::run_connect(cli::connect::ConnectArgs {
            config,
            executable,
            settings,
            verbose: cli.verbose,
        }),
        Commands::DefaultPath => cli::default_path::run_default_path(),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            let exit_code = match e {
                // Configuration errors (exit code 2)
                OvpnError::Config(_) | OvpnError::Toml(_) | OvpnError::TomlSerialize(_) => 2,
                // Setup problems found before anything was spawned
                OvpnError::Vpn(ref vpn_error) => match vpn_error {
                    VpnError::UnsupportedPlatform { .. } | VpnError::ExecutableNotFound { .. } => 2,
                    _ => 1,
                },
                OvpnError::Io(_) => 1,
            };

            eprintln!("{}", e);
            std::process::exit(exit_code);
        }
    }
}
