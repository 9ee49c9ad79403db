//! Configuration management for the Pipeline Inspector.
//!
//! Settings are layered, later sources overriding earlier ones:
//! 1. Default configuration (embedded in binary)
//! 2. System-wide configuration file (`/etc/pipeline-inspector/config.toml`)
//! 3. User-specified configuration file (`--config`)
//! 4. Environment variables (`PIPELINE_INSPECTOR__SERVER__ADDRESS`, ...)
//! 5. Command-line arguments
//!
//! Command-line overrides are applied by the CLI on the loaded [`Settings`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::listener::{ListenAddress, ListenerConfig};
use crate::render::RenderMode;

const SYSTEM_CONFIG: &str = "/etc/pipeline-inspector/config.toml";
const ENV_PREFIX: &str = "PIPELINE_INSPECTOR";

/// Effective configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Debug logging
    #[serde(default)]
    pub debug: bool,
    pub server: ServerSettings,
    pub output: OutputSettings,
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Socket path or `tcp://host:port`
    pub address: String,
    /// Maximum inbound message size in bytes
    pub max_recv_msg_size: usize,
    /// Time allowed for in-flight calls on shutdown
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub shutdown_timeout: Duration,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: RenderMode,
}

impl Settings {
    /// Load configuration from the default, system, user and environment
    /// sources.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .add_source(config::File::with_name(SYSTEM_CONFIG).required(false));

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Listener configuration derived from the server section.
    pub fn listener_config(&self) -> Result<ListenerConfig> {
        let address: ListenAddress = self.server.address.parse()?;
        if self.server.max_recv_msg_size == 0 {
            return Err(Error::Config(
                "server.max_recv_msg_size must be greater than zero".to_string(),
            ));
        }
        Ok(ListenerConfig {
            address,
            max_recv_msg_size: self.server.max_recv_msg_size,
            shutdown_timeout: self.server.shutdown_timeout,
        })
    }
}

/// Parse durations like `500ms`, `5s`, `1m` or a bare number of seconds.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        return Err(format!("invalid duration '{}'", s));
    }
    let value: u64 = digits
        .parse()
        .map_err(|e| format!("invalid duration '{}': {}", s, e))?;
    match unit.trim() {
        "" | "s" => Ok(Duration::from_secs(value)),
        "ms" => Ok(Duration::from_millis(value)),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("invalid duration '{}': out of range", s)),
        other => Err(format!("invalid duration '{}': unknown unit '{}'", s, other)),
    }
}

/// Inverse of [`parse_duration`] for whole seconds and milliseconds.
pub fn format_duration(d: Duration) -> String {
    if d.subsec_millis() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}

fn serialize_duration<S>(d: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_duration(*d))
}
