//! The real machine.
//!
//! `SystemHost` maps host paths onto a root directory (`/` in production, a
//! scratch directory in tests) and runs commands with `std::process`.
//!
//! In dry-run mode, existence checks still hit the real filesystem so the
//! preview is realistic, but every mutation is logged and skipped.

use std::fs::{self, Permissions};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use super::{CommandOutput, Host, HostCommand};

#[derive(Debug, Clone)]
pub struct SystemHost {
    root: PathBuf,
    dry_run: bool,
}

impl Default for SystemHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemHost {
    /// Host rooted at `/`.
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/"),
            dry_run: false,
        }
    }

    /// Host whose filesystem operations are confined under `root`.
    ///
    /// Commands still run on the real machine.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Translate an absolute host path to a path under `root`.
    ///
    /// `..` components are dropped so nothing resolves outside the root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        let mut resolved = self.root.clone();
        for component in path.components() {
            if let Component::Normal(part) = component {
                resolved.push(part);
            }
        }
        resolved
    }
}

impl Host for SystemHost {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.resolve(path).is_dir()
    }

    fn remove_file(&mut self, path: &Path) -> io::Result<()> {
        let target = self.resolve(path);
        if self.dry_run {
            info!("[DRY RUN] Would remove {}", target.display());
            return Ok(());
        }
        debug!("Removing {}", target.display());
        fs::remove_file(&target)
    }

    fn write_file(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let target = self.resolve(path);
        if self.dry_run {
            info!(
                "[DRY RUN] Would write {} bytes to {}",
                contents.len(),
                target.display()
            );
            return Ok(());
        }
        debug!("Writing {} bytes to {}", contents.len(), target.display());
        fs::write(&target, contents)
    }

    fn set_mode(&mut self, path: &Path, mode: u32) -> io::Result<()> {
        let target = self.resolve(path);
        if self.dry_run {
            info!("[DRY RUN] Would chmod {:o} {}", mode, target.display());
            return Ok(());
        }
        debug!("chmod {:o} {}", mode, target.display());
        fs::set_permissions(&target, Permissions::from_mode(mode))
    }

    fn create_dir(&mut self, path: &Path) -> io::Result<()> {
        let target = self.resolve(path);
        if self.dry_run {
            // Report the collision a real run would hit
            if target.exists() {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} already exists", target.display()),
                ));
            }
            info!("[DRY RUN] Would create directory {}", target.display());
            return Ok(());
        }
        debug!("Creating directory {}", target.display());
        fs::create_dir(&target)
    }

    fn run(&mut self, command: &HostCommand) -> io::Result<CommandOutput> {
        if self.dry_run {
            info!("[DRY RUN] Would run: {}", command);
            return Ok(CommandOutput::ok());
        }

        info!("Running: {}", command);
        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !stdout.is_empty() {
            debug!("{} stdout:\n{}", command.program, stdout.trim_end());
        }
        if !stderr.is_empty() {
            debug!("{} stderr:\n{}", command.program, stderr.trim_end());
        }

        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code: output.status.code(),
            success: output.status.success(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_default_root_is_identity() {
        let host = SystemHost::new();
        assert_eq!(
            host.resolve(Path::new("/etc/openvpn/server.key")),
            PathBuf::from("/etc/openvpn/server.key")
        );
    }

    #[test]
    fn test_resolve_under_custom_root() {
        let host = SystemHost::with_root("/srv/image");
        assert_eq!(
            host.resolve(Path::new("/etc/openvpn/ccd/client")),
            PathBuf::from("/srv/image/etc/openvpn/ccd/client")
        );
    }

    #[test]
    fn test_resolve_drops_parent_components() {
        let host = SystemHost::with_root("/srv/image");
        assert_eq!(
            host.resolve(Path::new("/etc/../../shadow")),
            PathBuf::from("/srv/image/etc/shadow")
        );
    }

    #[test]
    fn test_dry_run_flag() {
        assert!(!SystemHost::new().is_dry_run());
        assert!(SystemHost::new().dry_run(true).is_dry_run());
    }

    #[test]
    fn test_dry_run_command_is_not_executed() {
        let mut host = SystemHost::new().dry_run(true);
        let output = host
            .run(&HostCommand::new("this_binary_definitely_does_not_exist_12345", ["x"]))
            .expect("dry run should not spawn");
        assert!(output.success);
    }

    #[test]
    fn test_run_reports_missing_binary_as_error() {
        let mut host = SystemHost::new();
        let result = host.run(&HostCommand::new(
            "this_binary_definitely_does_not_exist_12345",
            Vec::<String>::new(),
        ));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
