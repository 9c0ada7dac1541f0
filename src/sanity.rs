//! Pre-flight sanity checks for the target host
//!
//! This module verifies the environment before provisioning starts:
//! - The package manager and `systemctl` are present
//! - Running with root privileges (EUID 0)
//!
//! If any check fails, the program exits with a clear error message
//! before anything on the host is touched.

use std::os::unix::fs::PermissionsExt;

use tracing::{debug, info, warn};

use crate::packages::PackageManager;

/// Result of environment verification
#[derive(Debug)]
pub struct SanityCheckResult {
    pub missing_binaries: Vec<String>,
    pub is_root: bool,
}

impl SanityCheckResult {
    /// Returns true if all checks passed
    pub fn is_ok(&self) -> bool {
        self.missing_binaries.is_empty() && self.is_root
    }
}

/// Binaries needed besides the package manager
const REQUIRED_BINARIES: &[&str] = &[
    "systemctl", // Service activation
];

/// Check if a binary is available in PATH
fn binary_exists(name: &str) -> bool {
    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|dir| {
        let candidate = dir.join(name);
        candidate
            .metadata()
            .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    })
}

/// Check if running as root (EUID 0)
fn is_running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// Perform all sanity checks and return the result
pub fn verify_environment(package_manager: PackageManager) -> SanityCheckResult {
    let mut missing = Vec::new();

    let binaries =
        std::iter::once(package_manager.binary()).chain(REQUIRED_BINARIES.iter().copied());
    for binary in binaries {
        if !binary_exists(binary) {
            debug!("Required binary not found: {}", binary);
            missing.push(binary.to_string());
        }
    }

    SanityCheckResult {
        missing_binaries: missing,
        is_root: is_running_as_root(),
    }
}

/// Print a pretty error message to stderr and exit
pub fn print_error_and_exit(result: &SanityCheckResult) -> ! {
    eprintln!();
    eprintln!("╔══════════════════════════════════════════════════════════════════╗");
    eprintln!("║              ovpn-bootstrap - Pre-flight Check Failed            ║");
    eprintln!("╚══════════════════════════════════════════════════════════════════╝");
    eprintln!();

    if !result.is_root {
        eprintln!("❌ ERROR: Root privileges required");
        eprintln!("   Installing packages and writing /etc/openvpn requires root.");
        eprintln!();
        eprintln!("   Solution: Run with sudo or as root user:");
        eprintln!("     sudo ovpn-bootstrap provision --config <FILE>");
        eprintln!();
    }

    if !result.missing_binaries.is_empty() {
        eprintln!("❌ ERROR: Missing required binaries");
        eprintln!();
        for binary in &result.missing_binaries {
            eprintln!("   • {}", binary);
        }
        eprintln!();
        eprintln!("   This tool targets RHEL-family hosts with yum/dnf and systemd.");
        eprintln!();
    }

    eprintln!("╔══════════════════════════════════════════════════════════════════╗");
    eprintln!("║  Fix the above issues and try again.                             ║");
    eprintln!("╚══════════════════════════════════════════════════════════════════╝");
    eprintln!();

    std::process::exit(1);
}

/// Skip root check (for development/testing)
/// Set OVPN_BOOTSTRAP_SKIP_ROOT_CHECK=1 to skip
pub fn should_skip_root_check() -> bool {
    std::env::var("OVPN_BOOTSTRAP_SKIP_ROOT_CHECK")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Run pre-flight checks, exiting the process if any fails
pub fn run_preflight_checks(package_manager: PackageManager, skip_root: bool) {
    debug!("Running pre-flight sanity checks (skip_root={})...", skip_root);

    let mut result = verify_environment(package_manager);

    if skip_root || should_skip_root_check() {
        warn!("Root check skipped");
        result.is_root = true;
    }

    if !result.is_ok() {
        print_error_and_exit(&result);
    }

    info!("Pre-flight checks passed");
}
