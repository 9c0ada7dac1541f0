//! Client routing directive written into the client-config-directory.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::error::{ProvisionError, Result};

/// Network reachable through the VPN client, advertised with `iroute`.
///
/// Values are embedded verbatim; [`ClientRoute::validate`] is the only
/// place they are interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRoute {
    pub network: String,
    pub netmask: String,
}

impl ClientRoute {
    pub fn new(network: impl Into<String>, netmask: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            netmask: netmask.into(),
        }
    }

    /// The `ccd/client` file body: a single `iroute` line.
    pub fn directive(&self) -> String {
        format!("iroute {} {}\n", self.network, self.netmask)
    }

    /// Both values must be dotted-quad IPv4 and the mask contiguous.
    pub fn validate(&self) -> Result<()> {
        parse_dotted_quad("local_network", &self.network)?;
        let mask = parse_dotted_quad("local_netmask", &self.netmask)?;
        let bits = u32::from(mask);
        // Contiguous masks are a run of ones followed by zeros
        if bits.leading_ones() + bits.trailing_zeros() != 32 {
            return Err(ProvisionError::validation(format!(
                "local_netmask {} is not a contiguous netmask",
                self.netmask
            )));
        }
        Ok(())
    }
}

fn parse_dotted_quad(field: &str, value: &str) -> Result<Ipv4Addr> {
    value.parse::<Ipv4Addr>().map_err(|_| {
        ProvisionError::validation(format!(
            "{} must be a dotted-quad IPv4 address, got {:?}",
            field, value
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_content() {
        let route = ClientRoute::new("10.8.0.0", "255.255.255.0");
        assert_eq!(route.directive(), "iroute 10.8.0.0 255.255.255.0\n");
    }

    #[test]
    fn test_validate_accepts_common_masks() {
        let masks = [
            "255.255.255.0",
            "255.255.0.0",
            "255.255.255.255",
            "0.0.0.0",
            "255.255.255.252",
        ];
        for mask in masks {
            assert!(ClientRoute::new("192.168.50.0", mask).validate().is_ok(), "{}", mask);
        }
    }

    #[test]
    fn test_validate_rejects_non_contiguous_mask() {
        let err = ClientRoute::new("192.168.50.0", "255.0.255.0")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("not a contiguous netmask"));
    }

    #[test]
    fn test_validate_rejects_cidr_and_hostnames() {
        assert!(ClientRoute::new("192.168.50.0/24", "255.255.255.0").validate().is_err());
        assert!(ClientRoute::new("vpn.example.com", "255.255.255.0").validate().is_err());
        assert!(ClientRoute::new("192.168.50.0", "24").validate().is_err());
    }
}
