//! Fixed locations on the target host.

/// OpenVPN configuration directory; must already exist (the package creates it)
pub const OPENVPN_DIR: &str = "/etc/openvpn";

/// Client-config-directory holding per-client overrides
pub const CCD_DIR: &str = "/etc/openvpn/ccd";

/// Override file for the single client this server routes through
pub const CLIENT_ROUTE_FILE: &str = "/etc/openvpn/ccd/client";

/// Runtime state left behind by a previous server instance
pub const STALE_FILES: &[&str] = &["/etc/openvpn/ipp.txt", "/etc/openvpn/openvpn-status.log"];

/// Kernel IPv4 forwarding switch
pub const IP_FORWARD_PATH: &str = "/proc/sys/net/ipv4/ip_forward";
