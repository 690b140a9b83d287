//! Client configuration (`hget.toml`).
//!
//! Every field is optional. The defaults read 1 KiB at a time and never
//! time out, so a peer that stops sending without closing blocks the read.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

/// Bytes requested per read when none is configured.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub transport: TransportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransportConfig {
    pub recv_buffer_size: Option<usize>,
    pub connect_timeout: Option<String>,
    pub read_timeout: Option<String>,
    pub write_timeout: Option<String>,
}

/// Transport settings with defaults applied and durations parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSettings {
    pub recv_buffer_size: usize,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: ClientConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.transport_settings()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the transport section and apply defaults.
    pub fn transport_settings(&self) -> anyhow::Result<TransportSettings> {
        let t = &self.transport;
        let recv_buffer_size = t.recv_buffer_size.unwrap_or(DEFAULT_RECV_BUFFER_SIZE);
        if recv_buffer_size == 0 {
            bail!("transport.recv_buffer_size must be > 0");
        }

        Ok(TransportSettings {
            recv_buffer_size,
            connect_timeout: optional_duration("connect_timeout", t.connect_timeout.as_deref())?,
            read_timeout: optional_duration("read_timeout", t.read_timeout.as_deref())?,
            write_timeout: optional_duration("write_timeout", t.write_timeout.as_deref())?,
        })
    }
}

fn optional_duration(field: &str, value: Option<&str>) -> anyhow::Result<Option<Duration>> {
    let Some(value) = value else {
        return Ok(None);
    };
    match parse_duration(value) {
        // A zero timeout is rejected by std::net; treat it as "no timeout".
        Some(d) if d.is_zero() => Ok(None),
        Some(d) => Ok(Some(d)),
        None => bail!("transport.{field}: invalid duration {value:?}"),
    }
}

/// Parse `500ms`, `5s`, `2m`, or a plain number of seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
