use std::{fs::read_to_string, str::FromStr, time::Duration};

use anyhow::Result;
use clap::Parser;
use serde::{Deserialize, Deserializer};

fn seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}

#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" => Self::Warn,
            "error" => Self::Error,
            _ => return Err(format!("unknown log level: {value}")),
        })
    }
}

impl LogLevel {
    pub fn as_level(&self) -> log::Level {
        match *self {
            Self::Error => log::Level::Error,
            Self::Debug => log::Level::Debug,
            Self::Trace => log::Level::Trace,
            Self::Warn => log::Level::Warn,
            Self::Info => log::Level::Info,
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Log {
    ///
    /// log level
    ///
    /// An enum representing the available verbosity levels of the logger.
    ///
    #[serde(default)]
    pub level: LogLevel,
}

/// Server configuration, durations are given in seconds.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    ///
    /// listen address
    ///
    #[serde(default = "Config::address")]
    pub address: String,
    ///
    /// listen port
    ///
    #[serde(default = "Config::port")]
    pub port: u16,
    ///
    /// max clients
    ///
    /// The number of connections served at the same time, a new client is
    /// turned away while all slots are taken.
    ///
    #[serde(default = "Config::max_clients")]
    pub max_clients: usize,
    ///
    /// handshake timeout
    ///
    /// Time from accept until the upgrade request must be complete,
    /// the socket is dropped without a response afterwards.
    ///
    #[serde(default = "Config::handshake_timeout", deserialize_with = "seconds")]
    pub handshake_timeout: Duration,
    ///
    /// heartbeat interval
    ///
    /// If nothing is received within this time, a ping is sent.
    ///
    #[serde(default = "Config::heartbeat_interval", deserialize_with = "seconds")]
    pub heartbeat_interval: Duration,
    ///
    /// client timeout
    ///
    /// Time a client has to answer a ping before it is dropped.
    ///
    #[serde(default = "Config::client_timeout", deserialize_with = "seconds")]
    pub client_timeout: Duration,
    ///
    /// send timeout
    ///
    /// Upper bound of a single write to a client.
    ///
    #[serde(default = "Config::send_timeout", deserialize_with = "seconds")]
    pub send_timeout: Duration,
    ///
    /// supervise interval
    ///
    /// How often closed connections are reclaimed.
    ///
    #[serde(default = "Config::supervise_interval", deserialize_with = "seconds")]
    pub supervise_interval: Duration,
    ///
    /// max payload size
    ///
    /// Frames declaring a larger payload are rejected. Values above
    /// `u32::MAX` are capped.
    ///
    #[serde(default = "Config::max_payload_size")]
    pub max_payload_size: u64,
    #[serde(default)]
    pub log: Log,
}

impl Config {
    fn address() -> String { "127.0.0.1".to_string() }

    fn port() -> u16 { 1234 }

    fn max_clients() -> usize { 8 }

    fn handshake_timeout() -> Duration { Duration::from_secs(10) }

    fn heartbeat_interval() -> Duration { Duration::from_secs(60) }

    fn client_timeout() -> Duration { Duration::from_secs(10) }

    fn send_timeout() -> Duration { Duration::from_secs(30) }

    fn supervise_interval() -> Duration { Duration::from_secs(5) }

    fn max_payload_size() -> u64 { 16 * 1024 * 1024 }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: Self::address(),
            port: Self::port(),
            max_clients: Self::max_clients(),
            handshake_timeout: Self::handshake_timeout(),
            heartbeat_interval: Self::heartbeat_interval(),
            client_timeout: Self::client_timeout(),
            send_timeout: Self::send_timeout(),
            supervise_interval: Self::supervise_interval(),
            max_payload_size: Self::max_payload_size(),
            log: Log::default(),
        }
    }
}

impl Config {
    /// Payload limit, never above `u32::MAX`.
    pub fn payload_limit(&self) -> u64 {
        self.max_payload_size.min(u32::MAX as u64)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json5::from_str::<Self>(text)?)
    }
}

#[derive(Parser, Debug)]
#[command(
    about = env!("CARGO_PKG_DESCRIPTION"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
)]
struct Cli {
    ///
    /// Specify the configuration file path
    ///
    /// Example: beatws --config /etc/beatws/config.json5
    ///
    #[arg(long, short)]
    config: Option<String>,
}

impl Config {
    ///
    /// Load configure from config file and command line parameters.
    ///
    /// If the configuration file path is specified, the configuration is
    /// read from the configuration file, otherwise the default
    /// configuration is used.
    ///
    pub fn load() -> Result<Self> {
        Ok(match Cli::parse().config {
            Some(path) => Self::parse(&read_to_string(path)?)?,
            None => Self::default(),
        })
    }
}
