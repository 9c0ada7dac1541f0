//! Bootstrap input document.
//!
//! The template parameters (`LOCAL_NETWORK`, `LOCAL_NETMASK` and the five
//! base64 blobs) are delivered as a JSON file, rendered upstream. This module
//! loads, overrides and validates it, then hands a [`ProvisionInputs`] to the
//! provisioner.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::materials::{EncodedBlob, PkiMaterials};
use crate::packages::PackageManager;
use crate::provisioner::ProvisionInputs;
use crate::routing::ClientRoute;

/// Bootstrap configuration loaded from a JSON file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    // Routing
    pub local_network: String,
    pub local_netmask: String,

    // PKI and server configuration, base64
    pub server_key: EncodedBlob,
    pub server_crt: EncodedBlob,
    pub ca_crt: EncodedBlob,
    pub server_conf: EncodedBlob,
    pub dh2048_pem: EncodedBlob,

    #[serde(default)]
    pub package_manager: PackageManager,
}

impl BootstrapConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.route().validate()?;
        self.materials().validate()?;
        Ok(())
    }

    pub fn route(&self) -> ClientRoute {
        ClientRoute::new(&self.local_network, &self.local_netmask)
    }

    pub fn materials(&self) -> PkiMaterials {
        PkiMaterials {
            server_key: self.server_key.clone(),
            server_crt: self.server_crt.clone(),
            ca_crt: self.ca_crt.clone(),
            server_conf: self.server_conf.clone(),
            dh2048_pem: self.dh2048_pem.clone(),
        }
    }

    pub fn to_inputs(&self) -> ProvisionInputs {
        ProvisionInputs {
            route: self.route(),
            materials: self.materials(),
        }
    }
}
