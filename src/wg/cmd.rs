use std::{
    process::{Command, Output},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use crate::error::Error;

use super::{HostPort, InterfaceSpec, Key, WireguardApi, config::ParseError};

/// Drives interfaces through the `wg` tool, entering the interface's network
/// namespace with `ip netns exec` when it has one.
#[derive(Debug, Default)]
pub struct WgCmdBackend;

impl WgCmdBackend {
    pub(crate) fn new() -> Self {
        Self
    }

    fn wg(namespace: Option<&str>) -> Command {
        match namespace {
            Some(ns) => {
                let mut cmd = Command::new("ip");
                cmd.arg("netns").arg("exec").arg(ns).arg("wg");
                cmd
            }
            None => Command::new("wg"),
        }
    }

    pub(crate) fn latest_handshakes_command(namespace: Option<&str>) -> Command {
        let mut cmd = Self::wg(namespace);
        cmd.arg("show").arg("all").arg("latest-handshakes");
        cmd
    }

    pub(crate) fn set_endpoint_command(
        iface: &InterfaceSpec,
        key: &Key,
        host: &str,
        port: u16,
    ) -> Command {
        let mut cmd = Self::wg(iface.namespace.as_deref());
        cmd.arg("set")
            .arg(&iface.name)
            .arg("peer")
            .arg(key.to_string())
            .arg("endpoint")
            .arg(HostPort(host, port).to_string());
        cmd
    }

    fn run(mut cmd: Command) -> Result<Output, Error> {
        log::debug!("running {cmd:?}");
        let out = cmd.output()?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            return Err(Error::WgCommandFail(out.status.code(), stderr));
        }

        Ok(out)
    }
}

/// Picks the handshake timestamp of `iface` out of
/// `wg show all latest-handshakes` output (`iface key timestamp` per line).
///
/// Multiple peers of one interface yield several lines; the first wins.
pub(crate) fn parse_latest_handshakes(
    output: &str,
    iface: &str,
    now: Duration,
) -> Result<Option<Duration>, ParseError> {
    for line in output.lines() {
        let mut fields = line.split_whitespace();
        let (Some(name), Some(_peer), Some(timestamp)) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };

        if name == iface {
            let timestamp = Duration::from_secs(timestamp.parse()?);
            return Ok(Some(now.saturating_sub(timestamp)));
        }
    }

    Ok(None)
}

impl WireguardApi for WgCmdBackend {
    type Error = Error;

    fn latest_handshake(&self, iface: &InterfaceSpec) -> Result<Option<Duration>, Self::Error> {
        let out = Self::run(Self::latest_handshakes_command(iface.namespace.as_deref()))?;
        let table = String::from_utf8_lossy(&out.stdout);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();

        Ok(parse_latest_handshakes(&table, &iface.name, now)?)
    }

    fn set_peer_endpoint(
        &self,
        iface: &InterfaceSpec,
        key: &Key,
        host: &str,
        port: u16,
    ) -> Result<(), Self::Error> {
        Self::run(Self::set_endpoint_command(iface, key, host, port))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use super::*;

    const WG_SHOW_OUTPUT: &str = "wg-server\tbmXOC+F1FxEMF9dyiK2H5/1SUtzH0JuVo51h2wPfgyo=\t1708807000
wg-server\tRYhFhj3tbtDyMr+gU0vsXdu7z9GWT4YpLGC8JDIm9Ww=\t0
wg-client\tw8wZ6VNAA5uVoVrxDNbmkXTR9f5GRxYKcpebF3QXtBE=\t1708807507
wg-client\tHIgo9xNzJMWLKASShiTqIybxZ0U3wGLiUeJ1PC8ixnY=\t1708800000
";

    fn args(cmd: &Command) -> Vec<&OsStr> {
        cmd.get_args().collect()
    }

    #[test]
    fn test_parse_latest_handshakes() {
        let now = Duration::from_secs(1708807507 + 1200);

        assert_eq!(
            parse_latest_handshakes(WG_SHOW_OUTPUT, "wg-client", now).unwrap(),
            Some(Duration::from_secs(1200))
        );
        assert_eq!(
            parse_latest_handshakes(WG_SHOW_OUTPUT, "wg-server", now).unwrap(),
            Some(Duration::from_secs(1200 + 507))
        );
        assert_eq!(
            parse_latest_handshakes(WG_SHOW_OUTPUT, "wg-missing", now).unwrap(),
            None
        );
    }

    #[test]
    fn test_parse_latest_handshakes_skips_garbage() {
        let output = "\nwg0\n\nwg0 key 42\n";

        assert_eq!(
            parse_latest_handshakes(output, "wg0", Duration::from_secs(100)).unwrap(),
            Some(Duration::from_secs(58))
        );
        assert!(matches!(
            parse_latest_handshakes("wg0 key never", "wg0", Duration::ZERO),
            Err(ParseError::ParseIntError(_))
        ));
    }

    #[test]
    fn test_failing_command() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo nope >&2; exit 3"]);

        match WgCmdBackend::run(cmd) {
            Err(Error::WgCommandFail(code, stderr)) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "nope");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_command() {
        let cmd = Command::new("/nonexistent/wg");

        assert!(matches!(WgCmdBackend::run(cmd), Err(Error::IoError(_))));
    }

    #[test]
    fn test_latest_handshakes_command() {
        let cmd = WgCmdBackend::latest_handshakes_command(None);
        assert_eq!(cmd.get_program(), "wg");
        assert_eq!(args(&cmd), ["show", "all", "latest-handshakes"]);

        let cmd = WgCmdBackend::latest_handshakes_command(Some("ns2"));
        assert_eq!(cmd.get_program(), "ip");
        assert_eq!(
            args(&cmd),
            ["netns", "exec", "ns2", "wg", "show", "all", "latest-handshakes"]
        );
    }

    #[test]
    fn test_set_endpoint_command() {
        let key = Key::random();
        let key_str = key.to_string();

        let iface: InterfaceSpec = ":client1".parse().unwrap();
        let cmd = WgCmdBackend::set_endpoint_command(&iface, &key, "127.0.0.1", 8888);
        assert_eq!(cmd.get_program(), "wg");
        assert_eq!(
            args(&cmd),
            ["set", "client1", "peer", key_str.as_str(), "endpoint", "127.0.0.1:8888"]
        );

        let iface: InterfaceSpec = "ns2:client2".parse().unwrap();
        let cmd = WgCmdBackend::set_endpoint_command(&iface, &key, "2001:db8::1", 51820);
        assert_eq!(cmd.get_program(), "ip");
        assert_eq!(
            args(&cmd),
            [
                "netns",
                "exec",
                "ns2",
                "wg",
                "set",
                "client2",
                "peer",
                key_str.as_str(),
                "endpoint",
                "[2001:db8::1]:51820"
            ]
        );
    }
}
