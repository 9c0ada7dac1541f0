use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::packages::PackageManager;

/// ovpn-bootstrap - Provision an OpenVPN server on a fresh host
#[derive(Parser)]
#[command(name = "ovpn-bootstrap")]
#[command(about = "Installs OpenVPN, writes embedded PKI material and starts the server")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: show what would be done without changing the host.
    ///
    /// Existence checks still run against the real filesystem; file
    /// writes, permission changes, directory creation and external
    /// commands are logged and skipped.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision the OpenVPN server on this host
    Provision {
        /// Path to the bootstrap configuration file (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Override LOCAL_NETWORK from the configuration
        #[arg(long)]
        local_network: Option<String>,

        /// Override LOCAL_NETMASK from the configuration
        #[arg(long)]
        local_netmask: Option<String>,

        /// Override the package manager (yum, dnf)
        #[arg(long)]
        package_manager: Option<PackageManager>,

        /// Skip root and binary checks before provisioning
        #[arg(long)]
        skip_preflight: bool,
    },
    /// Validate a bootstrap configuration file
    Validate {
        /// Path to configuration file to validate
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
