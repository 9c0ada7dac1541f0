//! systemd service activation.

use crate::host::HostCommand;

/// Templated unit instance reading `/etc/openvpn/server.conf`
pub const SERVICE_UNIT: &str = "openvpn@server";

/// `systemctl enable <unit>`: start on boot
pub fn enable_command(unit: &str) -> HostCommand {
    HostCommand::new("systemctl", ["enable", unit])
}

/// `systemctl start <unit>`: start now
pub fn start_command(unit: &str) -> HostCommand {
    HostCommand::new("systemctl", ["start", unit])
}
