use std::{net::IpAddr, time::Duration};

pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);


pub trait Resolve {
    /// Address to reconnect `host` to. Failures are logged and yield `None`.
    fn resolve(&self, host: &str) -> Option<String>;
}

/// Numeric hosts are handed back untouched, including short dotted forms
/// such as `127.0.01` that the system resolver accepts.
fn is_address_literal(host: &str) -> bool {
    if host.parse::<IpAddr>().is_ok() {
        return true;
    }

    let parts = host.split('.').collect::<Vec<_>>();
    parts.len() <= 4
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

#[derive(Debug, Clone)]
pub struct DnsResolver {
    timeout: Duration,
}

impl Default for DnsResolver {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLVE_TIMEOUT)
    }
}

impl DnsResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Resolve for DnsResolver {
    fn resolve(&self, host: &str) -> Option<String> {
        if is_address_literal(host) {
            return Some(host.to_string());
        }

        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                log::warn!("cannot resolve {host}: {err}");
                return None;
            }
        };

        let timeout = self.timeout;
        let res = runtime.block_on(async move {
            tokio::time::timeout(timeout, tokio::net::lookup_host((host, 0))).await
        });
        // a lookup stuck past the timeout must not hold up the run
        runtime.shutdown_background();

        match res {
            Ok(Ok(mut addrs)) => {
                let addr = addrs.next().map(|addr| addr.ip().to_string());
                if addr.is_none() {
                    log::warn!("cannot resolve {host}: no addresses");
                }
                addr
            }
            Ok(Err(err)) => {
                log::warn!("cannot resolve {host}: {err}");
                None
            }
            Err(_) => {
                log::warn!("cannot resolve {host}: timed out after {timeout:?}");
                None
            }
        }
    }
}
