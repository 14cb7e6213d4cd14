//! Detects WireGuard tunnels whose peer stopped answering, typically because
//! the endpoint's address changed, and re-points them at a freshly resolved
//! address.

use std::{fmt::Display, path::Path, time::Duration};

use crate::{
    error::Error,
    resolve::{DnsResolver, Resolve},
    wg::{Endpoint, HostPort, InterfaceSpec, WireguardApi, cmd::WgCmdBackend, config::read_endpoint},
};

use super::Monitor;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(150);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireguardInterface {
    pub spec: InterfaceSpec,

    // None for server interfaces without a fixed peer
    pub endpoint: Option<Endpoint>,
}

pub struct WireguardMonitor<W = WgCmdBackend, R = DnsResolver> {
    interfaces: Vec<WireguardInterface>,
    timeout: Duration,
    wg: W,
    resolver: R,
}

impl WireguardMonitor {
    pub fn new<I, S, P>(interfaces: I, timeout: Duration) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (S, P)>,
        S: AsRef<str>,
        P: AsRef<Path>,
    {
        Self::with_backend(interfaces, timeout, WgCmdBackend::new(), DnsResolver::default())
    }
}

impl<W, R> WireguardMonitor<W, R>
where
    W: WireguardApi,
    W::Error: Display,
    R: Resolve,
{
    /// Reads the endpoint of every `interface spec → config file` entry.
    ///
    /// Fails as a whole when any config is unreadable or malformed.
    pub fn with_backend<I, S, P>(
        interfaces: I,
        timeout: Duration,
        wg: W,
        resolver: R,
    ) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (S, P)>,
        S: AsRef<str>,
        P: AsRef<Path>,
    {
        let interfaces = interfaces
            .into_iter()
            .map(|(spec, path)| -> Result<_, Error> {
                let spec = spec.as_ref();
                Ok(WireguardInterface {
                    spec: spec.parse().map_err(|source| Error::InterfaceSpec {
                        spec: spec.to_string(),
                        source,
                    })?,
                    endpoint: read_endpoint(path.as_ref())?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self {
            interfaces,
            timeout,
            wg,
            resolver,
        })
    }

    pub fn interfaces(&self) -> &[WireguardInterface] {
        &self.interfaces
    }

    fn is_alive(&self, spec: &InterfaceSpec) -> bool {
        match self.wg.latest_handshake(spec) {
            Ok(Some(age)) => age <= self.timeout,
            Ok(None) => false,
            Err(err) => {
                log::warn!("cannot query wireguard interface {spec}: {err}");
                false
            }
        }
    }

    fn reconnect(&self, spec: &InterfaceSpec, endpoint: &Endpoint) {
        let Some(host) = self.resolver.resolve(&endpoint.host) else {
            log::warn!("not reconnecting {spec}: {} did not resolve", endpoint.host);
            return;
        };

        log::info!(
            "reconnecting {spec} to {} ({})",
            endpoint,
            HostPort(&host, endpoint.port)
        );
        if let Err(err) = self
            .wg
            .set_peer_endpoint(spec, &endpoint.public_key, &host, endpoint.port)
        {
            log::warn!("reconnect of {spec} failed: {err}");
        }
    }

    fn check(&self, iface: &WireguardInterface, msg: &mut Vec<String>) {
        let spec = &iface.spec;

        let age = match self.wg.latest_handshake(spec) {
            Ok(Some(age)) => age,
            Ok(None) => {
                log::warn!("wireguard interface {spec} is not up");
                msg.push(format!("Wireguard interface {spec} is not up."));
                return;
            }
            Err(err) => {
                log::error!("cannot query wireguard interface {spec}: {err}");
                msg.push(format!(
                    "Error: Cannot query wireguard interface {spec}: {err}"
                ));
                return;
            }
        };

        if age <= self.timeout {
            log::debug!("wireguard interface {spec} is alive, last handshake {age:?} ago");
            return;
        }

        log::warn!("wireguard interface {spec} is stale, last handshake {age:?} ago");
        msg.push(format!(
            "Wireguard interface {spec} hasn't responded for {} minutes.",
            minutes(age)
        ));

        let Some(endpoint) = &iface.endpoint else {
            msg.push("Cannot reconnect. No endpoint for interface specified.".to_string());
            return;
        };

        self.reconnect(spec, endpoint);

        if self.is_alive(spec) {
            log::info!("wireguard interface {spec} reconnected to {endpoint}");
            msg.push(format!("Successfully reconnected to endpoint {endpoint}."));
        } else {
            log::error!("wireguard interface {spec} still stale after reconnect");
            msg.push(format!("Critical: Reconnect to endpoint {endpoint} failed."));
        }
    }
}

fn minutes(age: Duration) -> u64 {
    (age.as_secs_f64() / 60.0).round() as u64
}

impl<W, R> Monitor for WireguardMonitor<W, R>
where
    W: WireguardApi,
    W::Error: Display,
    R: Resolve,
{
    fn name(&self) -> &str {
        "wireguard"
    }

    // Tunnel health has no status report, so `force` is ignored.
    fn notify(&self, _force: bool) -> Result<String, Error> {
        let mut msg = Vec::new();
        for iface in &self.interfaces {
            self.check(iface, &mut msg);
        }

        Ok(msg.join("\n"))
    }
}
