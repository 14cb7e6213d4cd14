use std::{fmt, fs, path::Path, path::PathBuf, time::Duration};

use serde::{
    Deserialize, Deserializer,
    de::{self, MapAccess, Visitor},
};

use crate::{error::Error, monitor::wireguard::DEFAULT_TIMEOUT, notifier::matrix::MatrixConfig};

pub const DEFAULT_CONFIG_PATH: &str = "cronvisio.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub wireguard: Option<WireguardSettings>,
    pub matrix: Option<MatrixConfig>,
    #[serde(default = "default_stdout")]
    pub stdout: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireguardSettings {
    pub interfaces: Interfaces,

    // seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl WireguardSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn default_stdout() -> bool {
    true
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

/// `interface spec → config file` entries in document order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Interfaces(pub Vec<(String, PathBuf)>);

impl<'de> Deserialize<'de> for Interfaces {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct InterfacesVisitor;

        impl<'de> Visitor<'de> for InterfacesVisitor {
            type Value = Interfaces;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of interface specs to config file paths")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, PathBuf)> = Vec::new();
                while let Some((spec, path)) = map.next_entry::<String, PathBuf>()? {
                    if entries.iter().any(|(s, _)| *s == spec) {
                        return Err(de::Error::custom(format!("duplicate interface {spec}")));
                    }
                    entries.push((spec, path));
                }
                Ok(Interfaces(entries))
            }
        }

        deserializer.deserialize_map(InterfacesVisitor)
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let data = fs::read_to_string(path)
            .map_err(|err| Error::Settings(format!("cannot read {}: {err}", path.display())))?;

        data.parse()
    }
}

impl std::str::FromStr for Settings {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let settings: Settings =
            serde_json::from_str(s).map_err(|err| Error::Settings(err.to_string()))?;

        if !settings.stdout && settings.matrix.is_none() {
            return Err(Error::Settings("no notifier configured".to_string()));
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_settings() {
        let settings: Settings = r#"{
            "wireguard": {
                "interfaces": {
                    "ns2:client2": "/etc/wireguard/client2.conf",
                    ":client1": "/etc/wireguard/client1.conf"
                },
                "timeout": 300
            },
            "matrix": {
                "homeserver": "https://matrix.example.org",
                "user_id": "@cronvisio:example.org",
                "access_token": "secret",
                "room_id": "!updates:example.org"
            }
        }"#
        .parse()
        .unwrap();

        let wireguard = settings.wireguard.unwrap();
        assert_eq!(
            wireguard.interfaces,
            Interfaces(vec![
                ("ns2:client2".to_string(), "/etc/wireguard/client2.conf".into()),
                (":client1".to_string(), "/etc/wireguard/client1.conf".into()),
            ])
        );
        assert_eq!(wireguard.timeout(), Duration::from_secs(300));
        assert_eq!(settings.matrix.unwrap().room_id, "!updates:example.org");
        assert!(settings.stdout);
    }

    #[test]
    fn test_defaults() {
        let settings: Settings = r#"{"wireguard": {"interfaces": {}}}"#.parse().unwrap();

        assert_eq!(settings.wireguard.unwrap().timeout(), DEFAULT_TIMEOUT);
        assert_eq!(settings.matrix, None);
        assert!(settings.stdout);
    }

    #[test]
    fn test_invalid_settings() {
        assert!(matches!(
            r#"{"stdout": false}"#.parse::<Settings>(),
            Err(Error::Settings(_))
        ));
        assert!(matches!(
            r#"{"wireguard": {"interfaces": {"wg0": "a.conf", "wg0": "b.conf"}}}"#.parse::<Settings>(),
            Err(Error::Settings(_))
        ));
        assert!(matches!(
            r#"{"wireguard": {"interfaces": {}, "timout": 10}}"#.parse::<Settings>(),
            Err(Error::Settings(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        match Settings::load(&dir.path().join(DEFAULT_CONFIG_PATH)) {
            Err(Error::Settings(msg)) => {
                assert!(msg.starts_with("cannot read "), "{msg}");
                assert!(msg.contains(DEFAULT_CONFIG_PATH), "{msg}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
