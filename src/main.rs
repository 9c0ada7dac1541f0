//! ovpn-bootstrap - Main entry point
//!
//! Loads the bootstrap configuration and provisions the OpenVPN server.

use std::path::Path;
use std::process::ExitCode;

use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use ovpn_bootstrap::cli::{Cli, Commands};
use ovpn_bootstrap::{
    BootstrapConfig, ConsoleProgress, PackageManager, Provisioner, SystemHost, sanity,
};

/// Initialize the logger with appropriate settings
fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    // RUST_LOG overrides the default
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main application entry point
fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logger(cli.verbose);
    debug!("CLI arguments parsed");

    match cli.command {
        Commands::Validate { config } => validate(&config),
        Commands::Provision {
            config,
            local_network,
            local_netmask,
            package_manager,
            skip_preflight,
        } => provision(
            &config,
            local_network,
            local_netmask,
            package_manager,
            skip_preflight,
            cli.dry_run,
        ),
    }
}

fn validate(config_path: &Path) -> ExitCode {
    info!("Validating configuration file: {:?}", config_path);
    let result = BootstrapConfig::load_from_file(config_path).and_then(|config| config.validate());
    match result {
        Ok(()) => {
            info!("Configuration validation successful");
            println!("✓ Configuration file is valid: {}", config_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Configuration validation failed: {:#}", e);
            eprintln!("✗ Configuration validation failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn provision(
    config_path: &Path,
    local_network: Option<String>,
    local_netmask: Option<String>,
    package_manager: Option<PackageManager>,
    skip_preflight: bool,
    dry_run: bool,
) -> ExitCode {
    info!("Loading configuration from: {:?}", config_path);
    let mut config = match BootstrapConfig::load_from_file(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(network) = local_network {
        config.local_network = network;
    }
    if let Some(netmask) = local_netmask {
        config.local_netmask = netmask;
    }
    if let Some(manager) = package_manager {
        config.package_manager = manager;
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {:#}", e);
        eprintln!("✗ Configuration validation failed: {:#}", e);
        return ExitCode::FAILURE;
    }

    if skip_preflight {
        info!("Pre-flight checks skipped");
    } else {
        sanity::run_preflight_checks(config.package_manager, dry_run);
    }

    if dry_run {
        info!("Dry run: no changes will be made to this host");
    }

    let host = SystemHost::new().dry_run(dry_run);
    let mut provisioner = Provisioner::new(host).with_package_manager(config.package_manager);
    match provisioner.run(&config.to_inputs(), &mut ConsoleProgress) {
        Ok(report) => {
            info!(
                "Provisioning finished: {} steps, {} files written",
                report.completed.len(),
                report.files_written.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Provisioning failed: {}", e);
            eprintln!("{}", e);
            exit_code(e.exit_code())
        }
    }
}

/// Map a process status onto `ExitCode`, which only carries the low byte.
fn exit_code(status: i32) -> ExitCode {
    match u8::try_from(status) {
        Ok(0) | Err(_) => ExitCode::FAILURE,
        Ok(code) => ExitCode::from(code),
    }
}
