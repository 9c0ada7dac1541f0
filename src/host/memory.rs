//! In-memory host used to verify provisioning without touching the machine.
//!
//! Models just enough of a Unix filesystem to hold the provisioning
//! invariants: parents must exist before children, directories are created
//! one level at a time, overwriting a file keeps its mode. Every command is
//! recorded; individual commands and paths can be made to fail.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use super::{CommandOutput, Host, HostCommand};

/// Mode given to files created through `write_file`
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// A node in the in-memory filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Dir,
    File { contents: Vec<u8>, mode: u32 },
}

#[derive(Debug, Clone)]
pub struct MemoryHost {
    entries: BTreeMap<PathBuf, Entry>,
    commands: Vec<HostCommand>,
    command_failures: Vec<(HostCommand, CommandOutput)>,
    missing_binaries: BTreeSet<String>,
    denied_paths: BTreeSet<PathBuf>,
    mutations: usize,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// A host containing only `/`.
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(PathBuf::from("/"), Entry::Dir);
        Self {
            entries,
            commands: Vec::new(),
            command_failures: Vec::new(),
            missing_binaries: BTreeSet::new(),
            denied_paths: BTreeSet::new(),
            mutations: 0,
        }
    }

    /// Seed a directory and all its ancestors.
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        for ancestor in path.as_ref().ancestors() {
            self.entries
                .entry(ancestor.to_path_buf())
                .or_insert(Entry::Dir);
        }
        self
    }

    /// Seed a file (and its parent directories).
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self = self.with_dir(parent);
        }
        self.entries.insert(
            path.to_path_buf(),
            Entry::File {
                contents: contents.into(),
                mode: DEFAULT_FILE_MODE,
            },
        );
        self
    }

    /// Make `command` run but exit with `exit_code`.
    pub fn with_failing_command(
        mut self,
        command: HostCommand,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        self.command_failures
            .push((command, CommandOutput::failed(exit_code, stderr)));
        self
    }

    /// Make every command naming `program` fail to launch.
    pub fn with_missing_binary(mut self, program: impl Into<String>) -> Self {
        self.missing_binaries.insert(program.into());
        self
    }

    /// Make writes, removals, chmods and mkdirs at `path` fail with
    /// `PermissionDenied`.
    pub fn with_denied_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.denied_paths.insert(path.into());
        self
    }

    pub fn entry(&self, path: impl AsRef<Path>) -> Option<&Entry> {
        self.entries.get(path.as_ref())
    }

    /// Contents of the file at `path`, if it is a file.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<&[u8]> {
        match self.entries.get(path.as_ref()) {
            Some(Entry::File { contents, .. }) => Some(contents),
            _ => None,
        }
    }

    pub fn mode(&self, path: impl AsRef<Path>) -> Option<u32> {
        match self.entries.get(path.as_ref()) {
            Some(Entry::File { mode, .. }) => Some(*mode),
            _ => None,
        }
    }

    /// Commands issued so far, in order (including ones that failed).
    pub fn commands(&self) -> &[HostCommand] {
        &self.commands
    }

    /// Number of successful filesystem mutations.
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    fn check_denied(&self, path: &Path) -> io::Result<()> {
        if self.denied_paths.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{}: Permission denied", path.display()),
            ));
        }
        Ok(())
    }

    fn check_parent(&self, path: &Path) -> io::Result<()> {
        let parent_is_dir = path
            .parent()
            .is_some_and(|parent| matches!(self.entries.get(parent), Some(Entry::Dir)));
        if parent_is_dir {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: No such file or directory", path.display()),
            ))
        }
    }
}

impl Host for MemoryHost {
    fn exists(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.entries.get(path), Some(Entry::Dir))
    }

    fn remove_file(&mut self, path: &Path) -> io::Result<()> {
        self.check_denied(path)?;
        match self.entries.get(path) {
            Some(Entry::File { .. }) => {
                self.entries.remove(path);
                self.mutations += 1;
                Ok(())
            }
            Some(Entry::Dir) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{}: Is a directory", path.display()),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: No such file or directory", path.display()),
            )),
        }
    }

    fn write_file(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.check_denied(path)?;
        self.check_parent(path)?;
        let mode = match self.entries.get(path) {
            Some(Entry::Dir) => {
                return Err(io::Error::new(
                    io::ErrorKind::IsADirectory,
                    format!("{}: Is a directory", path.display()),
                ));
            }
            Some(Entry::File { mode, .. }) => *mode,
            None => DEFAULT_FILE_MODE,
        };
        self.entries.insert(
            path.to_path_buf(),
            Entry::File {
                contents: contents.to_vec(),
                mode,
            },
        );
        self.mutations += 1;
        Ok(())
    }

    fn set_mode(&mut self, path: &Path, new_mode: u32) -> io::Result<()> {
        self.check_denied(path)?;
        match self.entries.get_mut(path) {
            Some(Entry::File { mode, .. }) => {
                *mode = new_mode;
                self.mutations += 1;
                Ok(())
            }
            Some(Entry::Dir) => Ok(()),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: No such file or directory", path.display()),
            )),
        }
    }

    fn create_dir(&mut self, path: &Path) -> io::Result<()> {
        self.check_denied(path)?;
        if self.entries.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{}: File exists", path.display()),
            ));
        }
        self.check_parent(path)?;
        self.entries.insert(path.to_path_buf(), Entry::Dir);
        self.mutations += 1;
        Ok(())
    }

    fn run(&mut self, command: &HostCommand) -> io::Result<CommandOutput> {
        self.commands.push(command.clone());
        if self.missing_binaries.contains(&command.program) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: command not found", command.program),
            ));
        }
        let failure = self
            .command_failures
            .iter()
            .find(|(failing, _)| failing == command)
            .map(|(_, output)| output.clone());
        Ok(failure.unwrap_or_else(CommandOutput::ok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_host_has_only_root() {
        let host = MemoryHost::new();
        assert!(host.is_dir(Path::new("/")));
        assert!(!host.exists(Path::new("/etc")));
    }

    #[test]
    fn test_with_dir_creates_ancestors() {
        let host = MemoryHost::new().with_dir("/etc/openvpn");
        assert!(host.is_dir(Path::new("/etc")));
        assert!(host.is_dir(Path::new("/etc/openvpn")));
    }

    #[test]
    fn test_write_requires_parent() {
        let mut host = MemoryHost::new();
        let err = host
            .write_file(Path::new("/etc/openvpn/server.crt"), b"x")
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(host.mutations(), 0);
    }

    #[test]
    fn test_overwrite_keeps_mode() {
        let mut host = MemoryHost::new().with_dir("/etc/openvpn");
        let path = Path::new("/etc/openvpn/server.key");
        host.write_file(path, b"old").unwrap();
        host.set_mode(path, 0o400).unwrap();
        host.write_file(path, b"new").unwrap();
        assert_eq!(host.file(path), Some(&b"new"[..]));
        assert_eq!(host.mode(path), Some(0o400));
    }

    #[test]
    fn test_create_dir_fails_when_present() {
        let mut host = MemoryHost::new().with_dir("/etc/openvpn/ccd");
        let err = host.create_dir(Path::new("/etc/openvpn/ccd")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_remove_missing_file_is_not_found() {
        let mut host = MemoryHost::new().with_dir("/etc/openvpn");
        let err = host
            .remove_file(Path::new("/etc/openvpn/ipp.txt"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_denied_path() {
        let mut host = MemoryHost::new()
            .with_dir("/proc/sys/net/ipv4")
            .with_denied_path("/proc/sys/net/ipv4/ip_forward");
        let err = host
            .write_file(Path::new("/proc/sys/net/ipv4/ip_forward"), b"1\n")
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_commands_are_recorded_and_can_fail() {
        let failing = HostCommand::new("systemctl", ["start", "openvpn@server"]);
        let mut host = MemoryHost::new().with_failing_command(failing.clone(), 1, "boom");

        let ok = host
            .run(&HostCommand::new("systemctl", ["enable", "openvpn@server"]))
            .unwrap();
        assert!(ok.success);

        let failed = host.run(&failing).unwrap();
        assert!(!failed.success);
        assert_eq!(failed.exit_code, Some(1));
        assert_eq!(host.commands().len(), 2);
    }

    #[test]
    fn test_missing_binary_fails_to_launch() {
        let mut host = MemoryHost::new().with_missing_binary("dnf");
        let err = host
            .run(&HostCommand::new("dnf", ["-y", "install", "openvpn"]))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
