//! OS package installation.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::host::HostCommand;

/// Packages installed before anything else, in order.
///
/// `openvpn` lives in EPEL on RHEL-family images, so the repository
/// package goes first.
pub const REQUIRED_PACKAGES: &[&str] = &["epel-release", "openvpn"];

/// Package manager front end used for installs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Yum,
    Dnf,
}

impl PackageManager {
    /// Binary name on `PATH`
    pub fn binary(&self) -> &'static str {
        match self {
            Self::Yum => "yum",
            Self::Dnf => "dnf",
        }
    }

    /// Non-interactive install of a single package.
    pub fn install_command(&self, package: &str) -> HostCommand {
        HostCommand::new(self.binary(), ["-y", "install", package])
    }
}
