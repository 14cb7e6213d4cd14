use std::{fs, num::ParseIntError, path::Path, result::Result, str::FromStr};

use crate::error::Error;

use super::{DecodeError, Endpoint, Key, parse_host_port};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WgConfig {
    pub peers: Vec<WgConfigPeer>,
}

/// Raw `[Peer]` values; validated only when an endpoint is requested.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WgConfigPeer {
    // PublicKey
    pub public_key: Option<String>,

    // Endpoint
    pub endpoint: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("key parse error: {0}")]
    KeyParseError(#[from] DecodeError),

    #[error("key must be 32 bytes, got {0}")]
    KeyLength(usize),

    #[error("expected char: {0}")]
    Expected(char),

    #[error("int parse error: {0}")]
    ParseIntError(#[from] ParseIntError),

    #[error("port must not be zero")]
    ZeroPort,

    #[error("empty host")]
    EmptyHost,

    #[error("empty interface name")]
    EmptyInterfaceName,
}

enum Section {
    Peer,
    Other,
}

enum WgPropKind {
    PublicKey,
    Endpoint,
    Unknown,
}

impl FromStr for WgPropKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "publickey" => WgPropKind::PublicKey,
            "endpoint" => WgPropKind::Endpoint,
            _ => WgPropKind::Unknown,
        })
    }
}

impl WgConfig {
    pub fn parse_config(input: &str) -> Self {
        let mut peers: Vec<WgConfigPeer> = Vec::new();
        let mut section = Section::Other;

        for line in input.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header.split(']').next().unwrap_or_default().trim();
                section = if name == "Peer" {
                    peers.push(WgConfigPeer::default());
                    Section::Peer
                } else {
                    Section::Other
                };
                continue;
            }

            let (Section::Peer, Some(peer)) = (&section, peers.last_mut()) else {
                continue;
            };
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().to_string();

            match key.trim().parse() {
                Ok(WgPropKind::PublicKey) => peer.public_key = Some(value),
                Ok(WgPropKind::Endpoint) => peer.endpoint = Some(value),
                _ => {}
            }
        }

        WgConfig { peers }
    }

    pub fn read(path: &Path) -> Result<Self, Error> {
        let data = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::parse_config(&data))
    }

    /// Endpoint of the first peer that declares one.
    ///
    /// `Ok(None)` means a server-style interface without a fixed remote peer,
    /// or a peer endpoint lacking its `PublicKey`.
    pub fn endpoint(&self) -> Result<Option<Endpoint>, ParseError> {
        let Some(peer) = self.peers.iter().find(|p| p.endpoint.is_some()) else {
            return Ok(None);
        };
        let Some(endpoint) = peer.endpoint.as_deref() else {
            return Ok(None);
        };
        let (host, port) = parse_host_port(endpoint)?;

        let Some(public_key) = peer.public_key.as_deref() else {
            log::warn!("peer endpoint {endpoint} has no PublicKey");
            return Ok(None);
        };
        let public_key: Key = public_key.parse()?;

        Ok(Some(Endpoint {
            host,
            port,
            public_key,
        }))
    }
}

/// Reads the peer endpoint of a WireGuard interface config file.
pub fn read_endpoint(path: &Path) -> Result<Option<Endpoint>, Error> {
    WgConfig::read(path)?
        .endpoint()
        .map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
}
