//! ovpn-bootstrap Library
//!
//! This library provides the provisioning procedure that turns a freshly
//! booted host into a running OpenVPN server, plus the host boundary it
//! runs against.

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod layout;
pub mod materials;
pub mod packages;
pub mod progress;
pub mod provisioner;
pub mod routing;
pub mod sanity;
pub mod service;

// Re-export main types for convenience
pub use config::BootstrapConfig;
pub use error::{ProvisionError, Result};
pub use host::{CommandOutput, Host, HostCommand, MemoryHost, SystemHost};
pub use materials::{EncodedBlob, MaterialFile, PkiMaterials};
pub use packages::PackageManager;
pub use progress::{ConsoleProgress, ProgressSink};
pub use provisioner::{ProvisionInputs, ProvisionReport, Provisioner, Step};
pub use routing::ClientRoute;
