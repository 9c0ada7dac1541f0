//! Base64-embedded PKI material and OpenVPN configuration.
//!
//! The five blobs arrive as opaque base64 text and are written to fixed
//! files under `/etc/openvpn` byte-for-byte after decoding.

use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::warn;

use crate::error::{ProvisionError, Result};
use crate::layout::OPENVPN_DIR;

/// The files materialized from embedded blobs, in write order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum MaterialFile {
    #[strum(serialize = "server.key")]
    ServerKey,
    #[strum(serialize = "server.crt")]
    ServerCert,
    #[strum(serialize = "ca.crt")]
    CaCert,
    #[strum(serialize = "server.conf")]
    ServerConfig,
    #[strum(serialize = "dh2048.pem")]
    DhParams,
}

impl MaterialFile {
    /// All material files in the order they are written
    pub fn all() -> impl Iterator<Item = MaterialFile> {
        Self::iter()
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::ServerKey => "server.key",
            Self::ServerCert => "server.crt",
            Self::CaCert => "ca.crt",
            Self::ServerConfig => "server.conf",
            Self::DhParams => "dh2048.pem",
        }
    }

    /// Name of the input field carrying this file's blob
    pub fn input_name(&self) -> &'static str {
        match self {
            Self::ServerKey => "server_key",
            Self::ServerCert => "server_crt",
            Self::CaCert => "ca_crt",
            Self::ServerConfig => "server_conf",
            Self::DhParams => "dh2048_pem",
        }
    }

    pub fn path(&self) -> PathBuf {
        PathBuf::from(OPENVPN_DIR).join(self.file_name())
    }

    /// Explicit permission bits applied right after writing.
    ///
    /// Only the private key is restricted; the rest keep creation defaults.
    pub fn mode(&self) -> Option<u32> {
        match self {
            Self::ServerKey => Some(0o400),
            _ => None,
        }
    }
}

/// Base64 text as embedded in the bootstrap inputs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedBlob(String);

impl EncodedBlob {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Encode raw bytes (no line wrapping)
    pub fn encode(bytes: impl AsRef<[u8]>) -> Self {
        Self(STANDARD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Decode to raw bytes.
    ///
    /// ASCII whitespace is ignored so line-wrapped base64 decodes the same
    /// as `base64 -d` would.
    pub fn decode(&self) -> std::result::Result<Vec<u8>, base64::DecodeError> {
        let compact: String = self
            .0
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        STANDARD.decode(compact)
    }
}

// Blobs carry private keys; keep them out of logs
impl std::fmt::Debug for EncodedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncodedBlob({} chars)", self.0.len())
    }
}

/// The five blobs making up a server's PKI and configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkiMaterials {
    pub server_key: EncodedBlob,
    pub server_crt: EncodedBlob,
    pub ca_crt: EncodedBlob,
    pub server_conf: EncodedBlob,
    pub dh2048_pem: EncodedBlob,
}

impl PkiMaterials {
    pub fn blob(&self, file: MaterialFile) -> &EncodedBlob {
        match file {
            MaterialFile::ServerKey => &self.server_key,
            MaterialFile::ServerCert => &self.server_crt,
            MaterialFile::CaCert => &self.ca_crt,
            MaterialFile::ServerConfig => &self.server_conf,
            MaterialFile::DhParams => &self.dh2048_pem,
        }
    }

    /// Decode the blob for `file`.
    pub fn decode(&self, file: MaterialFile) -> Result<Vec<u8>> {
        self.blob(file)
            .decode()
            .map_err(|source| ProvisionError::Decode {
                file: file.file_name(),
                source,
            })
    }

    /// Check every blob decodes. An empty blob is valid and yields an empty file.
    pub fn validate(&self) -> Result<()> {
        for file in MaterialFile::all() {
            if self.blob(file).is_empty() {
                warn!("{} is empty; {} will be written as 0 bytes", file.input_name(), file);
            }
            self.decode(file)?;
        }
        Ok(())
    }
}
