//! Connection configuration.
//!
//! [`ClientConfig`] holds everything the engine needs to reach one server:
//! where it is, the RCON password, and the three timings that drive the
//! connection state machine.  It can be built in code, parsed from TOML, or
//! assembled by the CLI from flags and environment variables.
//!
//! # TOML format
//!
//! Durations are written in seconds and may be fractional:
//!
//! ```toml
//! host = "203.0.113.10"
//! port = 47200
//! password = "secret"
//! connect_timeout = 20
//! heartbeat_interval = 10
//! retry_delay = 5
//! game = "bf4"
//! events_enabled = true
//! ```
//!
//! Every field is optional; missing fields take the values from
//! [`ClientConfig::default`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// All runtime configuration for one server connection.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use battlecon_client::domain::ClientConfig;
///
/// let cfg = ClientConfig::default();
/// assert_eq!(cfg.port, 47200);
/// assert_eq!(cfg.heartbeat_interval, Duration::from_secs(10));
/// ```
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Hostname or IP address of the game server.
    pub host: String,
    /// RCON TCP port.
    pub port: u16,
    /// RCON password, passed to the game module's login verbatim.
    pub password: String,
    /// How long a TCP connect may take before the recovery path runs.
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,
    /// Period of the `version` heartbeat.
    #[serde(with = "duration_secs")]
    pub heartbeat_interval: Duration,
    /// Fixed delay between a teardown and the reconnect attempt.
    #[serde(with = "duration_secs")]
    pub retry_delay: Duration,
    /// Game module to load by name (`bf3`, `bf4`, `bfh`, `frostbite`), or
    /// `None` for a bare connection with no login.
    pub game: Option<String>,
    /// Whether the game module should ask the server to push events.
    pub events_enabled: bool,
}

impl Default for ClientConfig {
    /// | Field              | Default       |
    /// |--------------------|---------------|
    /// | host               | `127.0.0.1`   |
    /// | port               | `47200`       |
    /// | password           | empty         |
    /// | connect_timeout    | 20 seconds    |
    /// | heartbeat_interval | 10 seconds    |
    /// | retry_delay        | 5 seconds     |
    /// | game               | `frostbite`   |
    /// | events_enabled     | `true`        |
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 47200,
            password: String::new(),
            connect_timeout: Duration::from_secs(20),
            heartbeat_interval: Duration::from_secs(10),
            retry_delay: Duration::from_secs(5),
            game: Some("frostbite".to_string()),
            events_enabled: true,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for `host:port` with the given password and
    /// default timings.
    pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            password: password.into(),
            ..Self::default()
        }
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid TOML or a
    /// field has the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if its content is invalid.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// `host:port`, for log lines.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("connect_timeout", &self.connect_timeout)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("retry_delay", &self.retry_delay)
            .field("game", &self.game)
            .field("events_enabled", &self.events_enabled)
            .finish()
    }
}

/// Serde adapter storing a [`Duration`] as (possibly fractional) seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(D::Error::custom(format!(
                "duration must be a non-negative number of seconds, got {secs}"
            )));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
