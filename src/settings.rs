use anyhow::{Context, Result};
use config::{builder::DefaultState, ConfigBuilder, Environment, File};
use serde::{de::Visitor, Deserialize, Deserializer};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::Path,
    str::FromStr,
};
use tracing::Level;

use crate::ash::AshConfig;

const LOG_LEVELS: [&'static str; 5] = ["DEBUG", "ERROR", "INFO", "TRACE", "WARN"];

struct LevelVistor;

impl<'de> Visitor<'de> for LevelVistor {
    type Value = Level;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter
            .write_str("Expecting one of ")
            .and(formatter.write_str(&LOG_LEVELS.join(",")))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        FromStr::from_str(v).map_err(|_| E::unknown_variant(v, &LOG_LEVELS))
    }
}

pub fn deserialize_level<'de, D>(de: D) -> Result<Level, D::Error>
where
    D: Deserializer<'de>,
{
    de.deserialize_string(LevelVistor)
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ncp {
    /// TCP endpoint exposing the NCP's serial port, e.g. a ser2net socket.
    pub address: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub address: IpAddr,
    pub port: u16,
    pub ncp: Ncp,
    pub ash: AshConfig,
    #[serde(deserialize_with = "deserialize_level")]
    pub loglevel: Level,
    /// Emit JSON log lines instead of plain text.
    pub json_logs: bool,
}

impl Settings {
    /// Load settings from `path`, or from an optional `config.*` file in the
    /// working directory, then from `BRIDGE_*` environment variables.
    pub fn new(path: Option<&Path>) -> Result<Settings> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("config").required(false),
        };
        let reader = ConfigBuilder::<DefaultState>::default()
            .add_source(file)
            .add_source(
                Environment::with_prefix("BRIDGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = reader.try_deserialize()?;
        settings
            .ash
            .validate()
            .context("Invalid ASH settings")?;
        Ok(settings)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5555,
            ncp: Default::default(),
            ash: Default::default(),
            loglevel: Level::INFO,
            json_logs: true,
        }
    }
}

impl Default for Ncp {
    fn default() -> Self {
        Ncp {
            address: String::from("127.0.0.1:4901"),
        }
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(source: &str) -> Settings {
        ConfigBuilder::<DefaultState>::default()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .expect("valid source")
            .try_deserialize()
            .expect("valid settings")
    }

    #[test]
    fn it_falls_back_to_defaults() {
        let settings = parse("");

        assert_eq!(settings.port, 5555);
        assert_eq!(settings.ncp.address, "127.0.0.1:4901");
        assert_eq!(settings.ash, AshConfig::default());
        assert_eq!(settings.loglevel, Level::INFO);
    }

    #[test]
    fn it_reads_nested_ash_settings() {
        let settings = parse(
            r#"
            port = 6000
            loglevel = "DEBUG"

            [ncp]
            address = "10.0.0.2:4901"

            [ash]
            tx_k = 5
            randomize = false
            ack_time_max = 3200
            "#,
        );

        assert_eq!(settings.port, 6000);
        assert_eq!(settings.loglevel, Level::DEBUG);
        assert_eq!(settings.ncp.address, "10.0.0.2:4901");
        assert_eq!(settings.ash.tx_k, 5);
        assert!(!settings.ash.randomize);
        assert_eq!(settings.ash.ack_time_max, 3200);
        assert_eq!(settings.ash.ack_time_init, 800);
    }
}
