//! Default executable path command

use ovpnctl_core::error::OvpnError;
use ovpnctl_core::vpn::default_executable_path;

/// Print the platform's default OpenVPN executable path
pub fn run_default_path() -> Result<(), OvpnError> {
    let path = default_executable_path()?;
    println!("{}", path.display());
    Ok(())
}
