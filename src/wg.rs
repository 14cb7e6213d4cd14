use base64::prelude::*;
use config::ParseError;
use std::{str::FromStr, time::Duration};

pub mod cmd;
pub mod config;

pub type DecodeError = base64::DecodeSliceError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key([u8; 32]);

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Key {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut inner = [0u8; 32];
        let len = BASE64_STANDARD.decode_slice(s, &mut inner)?;
        if len != inner.len() {
            return Err(ParseError::KeyLength(len));
        }
        Ok(Key(inner))
    }
}

#[cfg(test)]
impl Key {
    pub fn random() -> Key {
        Key(rand::random())
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", BASE64_STANDARD.encode(self.0))
    }
}

/// Remote peer a client interface is supposed to talk to.
///
/// Read once from the interface config and never updated afterwards, even
/// when the tunnel is re-pointed at a freshly resolved address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub public_key: Key,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", HostPort(&self.host, self.port))
    }
}

/// `host:port` with IPv6 hosts wrapped in brackets.
pub struct HostPort<'a>(pub &'a str, pub u16);

impl std::fmt::Display for HostPort<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.contains(':') {
            write!(f, "[{}]:{}", self.0, self.1)
        } else {
            write!(f, "{}:{}", self.0, self.1)
        }
    }
}

/// Splits a config `Endpoint` value into host and port.
pub fn parse_host_port(s: &str) -> Result<(String, u16), ParseError> {
    let (host, port) = s.trim().rsplit_once(':').ok_or(ParseError::Expected(':'))?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    if host.is_empty() {
        return Err(ParseError::EmptyHost);
    }

    let port: u16 = port.parse()?;
    if port == 0 {
        return Err(ParseError::ZeroPort);
    }

    Ok((host.to_string(), port))
}

/// Interface reference in the form `[namespace]:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceSpec {
    pub namespace: Option<String>,
    pub name: String,
}

impl FromStr for InterfaceSpec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, name) = s.split_once(':').unwrap_or(("", s));
        if name.is_empty() {
            return Err(ParseError::EmptyInterfaceName);
        }

        Ok(InterfaceSpec {
            namespace: (!namespace.is_empty()).then(|| namespace.to_string()),
            name: name.to_string(),
        })
    }
}

impl std::fmt::Display for InterfaceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}",
            self.namespace.as_deref().unwrap_or_default(),
            self.name
        )
    }
}

pub trait WireguardApi {
    type Error;

    /// Time elapsed since the latest handshake of `iface`, `None` when the
    /// interface does not show up at all.
    fn latest_handshake(&self, iface: &InterfaceSpec) -> Result<Option<Duration>, Self::Error>;

    fn set_peer_endpoint(
        &self,
        iface: &InterfaceSpec,
        peer: &Key,
        host: &str,
        port: u16,
    ) -> Result<(), Self::Error>;
}
