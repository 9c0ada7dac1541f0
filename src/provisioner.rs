//! The OpenVPN server bootstrap procedure.
//!
//! Eight steps run strictly in order against a [`Host`]:
//!
//! 1. install `epel-release` and `openvpn`
//! 2. require `/etc/openvpn` to exist
//! 3. remove stale `ipp.txt` / `openvpn-status.log`
//! 4. decode and write the key, certificates, config and DH parameters
//! 5. create `/etc/openvpn/ccd`
//! 6. write the `iroute` directive to `ccd/client`
//! 7. turn on IPv4 forwarding
//! 8. enable and start `openvpn@server`
//!
//! The first failure aborts the run. Nothing already written is undone.

use std::io;
use std::path::{Path, PathBuf};

use strum::{Display, EnumIter};
use tracing::{debug, error, info, warn};

use crate::error::{ProvisionError, Result};
use crate::host::{CommandOutput, Host, HostCommand};
use crate::layout::{CCD_DIR, CLIENT_ROUTE_FILE, IP_FORWARD_PATH, OPENVPN_DIR, STALE_FILES};
use crate::materials::{MaterialFile, PkiMaterials};
use crate::packages::{PackageManager, REQUIRED_PACKAGES};
use crate::progress::ProgressSink;
use crate::routing::ClientRoute;
use crate::service::{self, SERVICE_UNIT};

/// Provisioning steps in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Step {
    #[strum(serialize = "install packages")]
    InstallPackages,
    #[strum(serialize = "check /etc/openvpn")]
    CheckPrecondition,
    #[strum(serialize = "remove stale state")]
    Cleanup,
    #[strum(serialize = "write PKI material and config")]
    Materialize,
    #[strum(serialize = "create client config directory")]
    CreateClientConfigDir,
    #[strum(serialize = "write routing directive")]
    WriteRoutingDirective,
    #[strum(serialize = "enable IP forwarding")]
    EnableIpForwarding,
    #[strum(serialize = "activate service")]
    ActivateService,
}

/// Everything the procedure needs, resolved before it starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionInputs {
    pub route: ClientRoute,
    pub materials: PkiMaterials,
}

/// What a successful run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub completed: Vec<Step>,
    pub files_written: Vec<PathBuf>,
}

pub struct Provisioner<H: Host> {
    host: H,
    package_manager: PackageManager,
}

impl<H: Host> Provisioner<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            package_manager: PackageManager::default(),
        }
    }

    pub fn with_package_manager(mut self, package_manager: PackageManager) -> Self {
        self.package_manager = package_manager;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Run every step in order, stopping at the first failure.
    pub fn run(
        &mut self,
        inputs: &ProvisionInputs,
        progress: &mut dyn ProgressSink,
    ) -> Result<ProvisionReport> {
        let mut report = ProvisionReport::default();

        self.install_packages(progress)?;
        report.completed.push(Step::InstallPackages);

        self.check_precondition()?;
        report.completed.push(Step::CheckPrecondition);

        self.cleanup();
        report.completed.push(Step::Cleanup);

        let written = self.materialize(&inputs.materials, progress)?;
        report.files_written.extend(written);
        report.completed.push(Step::Materialize);

        self.create_client_config_dir(progress)?;
        report.completed.push(Step::CreateClientConfigDir);

        self.write_routing_directive(&inputs.route, progress)?;
        report.files_written.push(PathBuf::from(CLIENT_ROUTE_FILE));
        report.completed.push(Step::WriteRoutingDirective);

        self.enable_ip_forwarding(progress)?;
        report.completed.push(Step::EnableIpForwarding);

        self.activate_service(progress)?;
        report.completed.push(Step::ActivateService);

        info!("OpenVPN server provisioned");
        Ok(report)
    }

    /// Install `epel-release` then `openvpn`, one command each.
    pub fn install_packages(&mut self, progress: &mut dyn ProgressSink) -> Result<()> {
        info!(step = %Step::InstallPackages, manager = %self.package_manager, "Starting step");
        for package in REQUIRED_PACKAGES {
            progress.message(&format!("Installing {}", package));
            let command = self.package_manager.install_command(package);
            self.run_checked(&command)?;
            progress.message("done.");
        }
        Ok(())
    }

    /// Fail unless `/etc/openvpn` exists. Never creates it.
    pub fn check_precondition(&self) -> Result<()> {
        info!(step = %Step::CheckPrecondition, "Starting step");
        let dir = Path::new(OPENVPN_DIR);
        if !self.host.is_dir(dir) {
            error!("{} does not exist", OPENVPN_DIR);
            return Err(ProvisionError::MissingDirectory {
                path: dir.to_path_buf(),
            });
        }
        Ok(())
    }

    /// Remove leftovers from a previous server instance. Never fails.
    pub fn cleanup(&mut self) {
        info!(step = %Step::Cleanup, "Starting step");
        for stale in STALE_FILES {
            let path = Path::new(stale);
            match self.host.remove_file(path) {
                Ok(()) => debug!("Removed {}", stale),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove {}: {}", stale, e),
            }
        }
    }

    /// Decode each blob and write it to its fixed path, overwriting.
    ///
    /// `server.key` is chmod'ed to 0400 immediately after it is written.
    /// Returns the paths written, in order.
    pub fn materialize(
        &mut self,
        materials: &PkiMaterials,
        progress: &mut dyn ProgressSink,
    ) -> Result<Vec<PathBuf>> {
        info!(step = %Step::Materialize, "Starting step");
        let mut written = Vec::new();
        for file in MaterialFile::all() {
            let path = file.path();
            progress.message(&format!("Creating {}", path.display()));
            let contents = materials.decode(file)?;
            self.host
                .write_file(&path, &contents)
                .map_err(|e| ProvisionError::filesystem("write", &path, e))?;
            if let Some(mode) = file.mode() {
                self.host
                    .set_mode(&path, mode)
                    .map_err(|e| ProvisionError::filesystem("set permissions on", &path, e))?;
            }
            debug!("Wrote {} ({} bytes)", path.display(), contents.len());
            progress.message("done.");
            written.push(path);
        }
        Ok(written)
    }

    /// Create `/etc/openvpn/ccd`. An existing directory is fatal.
    pub fn create_client_config_dir(&mut self, progress: &mut dyn ProgressSink) -> Result<()> {
        info!(step = %Step::CreateClientConfigDir, "Starting step");
        progress.message(&format!("Creating {}", CCD_DIR));
        self.host
            .create_dir(Path::new(CCD_DIR))
            .map_err(|e| ProvisionError::filesystem("create directory", CCD_DIR, e))?;
        progress.message("done.");
        Ok(())
    }

    /// Write `iroute <network> <netmask>` to `ccd/client`.
    pub fn write_routing_directive(
        &mut self,
        route: &ClientRoute,
        progress: &mut dyn ProgressSink,
    ) -> Result<()> {
        info!(
            step = %Step::WriteRoutingDirective,
            network = %route.network,
            netmask = %route.netmask,
            "Starting step"
        );
        progress.message(&format!("Creating {}", CLIENT_ROUTE_FILE));
        self.host
            .write_file(Path::new(CLIENT_ROUTE_FILE), route.directive().as_bytes())
            .map_err(|e| ProvisionError::filesystem("write", CLIENT_ROUTE_FILE, e))?;
        progress.message("done.");
        Ok(())
    }

    /// Set `net.ipv4.ip_forward` for the running kernel only.
    pub fn enable_ip_forwarding(&mut self, progress: &mut dyn ProgressSink) -> Result<()> {
        info!(step = %Step::EnableIpForwarding, "Starting step");
        progress.message("Enabling IP forwarding");
        self.host
            .write_file(Path::new(IP_FORWARD_PATH), b"1\n")
            .map_err(|e| ProvisionError::filesystem("write", IP_FORWARD_PATH, e))?;
        progress.message("done.");
        Ok(())
    }

    /// Enable the unit for boot, then start it. No retries.
    pub fn activate_service(&mut self, progress: &mut dyn ProgressSink) -> Result<()> {
        info!(step = %Step::ActivateService, unit = SERVICE_UNIT, "Starting step");

        progress.message(&format!("Enabling {}", SERVICE_UNIT));
        self.run_checked(&service::enable_command(SERVICE_UNIT))?;
        progress.message("done.");

        progress.message(&format!("Starting {}", SERVICE_UNIT));
        self.run_checked(&service::start_command(SERVICE_UNIT))?;
        progress.message("done.");
        Ok(())
    }

    fn run_checked(&mut self, command: &HostCommand) -> Result<CommandOutput> {
        let output = self.host.run(command).map_err(|source| {
            error!("Failed to launch `{}`: {}", command, source);
            ProvisionError::Spawn {
                command: command.to_string(),
                source,
            }
        })?;

        if !output.success {
            error!(
                "`{}` failed with exit code {:?}",
                command, output.exit_code
            );
            return Err(ProvisionError::CommandFailed {
                command: command.to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }
}
