//! VPN connection module
//!
//! Supervises the OpenVPN client daemon and drives connection attempts.

pub mod args;
pub mod client;
pub mod connection_event;
pub mod connector;
pub mod output_parser;
pub mod process;
pub mod reconnection;
pub mod stream_drain;

// Public re-exports
pub use args::{default_executable_path, Platform};
pub use client::VpnClient;
pub use connection_event::{ConnectionResult, LineSignal, OutputLine, StreamSource};
pub use connector::Connector;
pub use output_parser::OutputParser;
pub use process::{DaemonCommand, ProcessSupervisor, SupervisedProcess};
pub use reconnection::RetryPolicy;
pub use stream_drain::TrailingBuffer;
