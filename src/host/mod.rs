//! Host boundary: the filesystem and process-execution surface the
//! provisioner acts on.
//!
//! All provisioning side effects go through the [`Host`] trait so each step
//! can be exercised against [`MemoryHost`] instead of the real machine.
//! [`SystemHost`] is the implementation used by the CLI.
//!
//! Paths passed to a `Host` are absolute paths as they appear on the target
//! machine (e.g. `/etc/openvpn/server.key`).

pub mod memory;
pub mod system;

use std::fmt;
use std::io;
use std::path::Path;

pub use memory::{Entry, MemoryHost};
pub use system::SystemHost;

/// An external command to run on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl HostCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub success: bool,
}

impl CommandOutput {
    /// Output of a command that exited 0 with nothing captured
    pub fn ok() -> Self {
        Self {
            exit_code: Some(0),
            success: true,
            ..Self::default()
        }
    }

    /// Output of a command that exited with `code`
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(code),
            success: code == 0,
        }
    }
}

/// Filesystem and process operations the provisioner needs.
///
/// # Contract
///
/// - `write_file` creates or truncates; the parent directory must exist.
/// - `create_dir` creates exactly one level and fails with
///   `AlreadyExists` if anything is already at `path`.
/// - `remove_file` fails with `NotFound` if nothing is at `path`.
/// - `run` returns `Err` only if the command could not be launched; a
///   command that ran and failed is reported through [`CommandOutput`].
pub trait Host {
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn remove_file(&mut self, path: &Path) -> io::Result<()>;

    fn write_file(&mut self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Set Unix permission bits (e.g. `0o400`).
    fn set_mode(&mut self, path: &Path, mode: u32) -> io::Result<()>;

    fn create_dir(&mut self, path: &Path) -> io::Result<()>;

    fn run(&mut self, command: &HostCommand) -> io::Result<CommandOutput>;
}
