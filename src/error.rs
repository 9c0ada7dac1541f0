//! Error handling module for ovpn-bootstrap
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Every failure surfaces to the process exit status; nothing here is retried.

use std::path::PathBuf;

use thiserror::Error;

/// Exit status used when a required binary cannot be launched, as a shell would.
pub const EXIT_COMMAND_NOT_FOUND: i32 = 127;

/// Main error type for provisioning
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// A required directory is missing before any write happened
    #[error("Precondition failed: {} does not exist (is the openvpn package installed?)", .path.display())]
    MissingDirectory { path: PathBuf },

    /// A filesystem operation on the host failed
    #[error("Failed to {action} {}: {source}", .path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An embedded blob is not valid base64
    #[error("Invalid base64 payload for {file}: {source}")]
    Decode {
        file: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    /// An external command ran and exited unsuccessfully
    #[error("Command `{command}` failed with exit code {}{}", .exit_code.map_or("none (killed by signal)".to_string(), |c| c.to_string()), stderr_suffix(.stderr))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// An external command could not be launched at all
    #[error("Failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Validation errors (template parameters)
    #[error("Validation error: {0}")]
    Validation(String),
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

/// Result type alias for provisioning operations
pub type Result<T> = std::result::Result<T, ProvisionError>;

impl ProvisionError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Wrap an IO error from a host filesystem operation
    pub fn filesystem(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this error.
    ///
    /// A failed external command propagates its own status; a binary that
    /// cannot be found maps to 127; everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed {
                exit_code: Some(code),
                ..
            } if *code != 0 => *code,
            Self::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                EXIT_COMMAND_NOT_FOUND
            }
            _ => 1,
        }
    }

    /// True for the precondition class of errors
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::MissingDirectory { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProvisionError::validation("netmask must be contiguous");
        assert_eq!(err.to_string(), "Validation error: netmask must be contiguous");

        let err = ProvisionError::MissingDirectory {
            path: PathBuf::from("/etc/openvpn"),
        };
        assert!(err.to_string().contains("/etc/openvpn does not exist"));
        assert!(err.is_precondition());
    }

    #[test]
    fn test_command_failed_display_includes_stderr() {
        let err = ProvisionError::CommandFailed {
            command: "yum -y install openvpn".to_string(),
            exit_code: Some(1),
            stderr: "No package openvpn available.\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Command `yum -y install openvpn` failed with exit code 1: No package openvpn available."
        );
    }

    #[test]
    fn test_exit_code_propagates_command_status() {
        let err = ProvisionError::CommandFailed {
            command: "systemctl start openvpn@server".to_string(),
            exit_code: Some(5),
            stderr: String::new(),
        };
        assert_eq!(err.exit_code(), 5);

        let killed = ProvisionError::CommandFailed {
            command: "systemctl start openvpn@server".to_string(),
            exit_code: None,
            stderr: String::new(),
        };
        assert_eq!(killed.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_for_missing_binary() {
        let err = ProvisionError::Spawn {
            command: "dnf -y install openvpn".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file"),
        };
        assert_eq!(err.exit_code(), EXIT_COMMAND_NOT_FOUND);
    }

    #[test]
    fn test_precondition_exit_code_is_one() {
        let err = ProvisionError::MissingDirectory {
            path: PathBuf::from("/etc/openvpn"),
        };
        assert_eq!(err.exit_code(), 1);
    }
}
