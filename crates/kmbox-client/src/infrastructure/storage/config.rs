//! TOML-based configuration for one KMBox device.
//!
//! A config file names the device and how long to wait for its replies:
//!
//! ```toml
//! device_addr = "192.168.2.188"
//! port = 8888
//! device_uuid = "417F0CD3"
//! response_timeout_ms = 500
//! monitor_bind_addr = "0.0.0.0"
//! ```
//!
//! `response_timeout_ms` may be omitted, in which case every exchange waits
//! for its reply indefinitely.  `monitor_bind_addr` defaults to all
//! interfaces.
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` take the value of
//! `some_fn()` when absent from the file, so older files keep loading when a
//! field is added.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::time::Duration;

use kmbox_core::{DeviceId, DeviceIdError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid device uuid: {0}")]
    InvalidDeviceId(#[from] DeviceIdError),

    /// The command port must leave room for the monitor port above it.
    #[error("command port must be between 1 and 65534, got {0}")]
    InvalidPort(u16),
}

// ── Config schema ─────────────────────────────────────────────────────────────

/// Connection settings for one device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Address of the device on the LAN.
    pub device_addr: Ipv4Addr,
    /// UDP command port shown on the device display.
    pub port: u16,
    /// 8-hex-digit identifier shown on the device display.
    pub device_uuid: String,
    /// Upper bound on each reply wait.  `None` waits forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_timeout_ms: Option<u64>,
    /// Local address the monitor listener binds to (port is `port + 1`).
    #[serde(default = "default_monitor_bind_addr")]
    pub monitor_bind_addr: Ipv4Addr,
}

fn default_monitor_bind_addr() -> Ipv4Addr {
    Ipv4Addr::UNSPECIFIED
}

impl ClientConfig {
    /// Creates a config with no response timeout and the default monitor bind address.
    pub fn new(device_addr: Ipv4Addr, port: u16, device_uuid: impl Into<String>) -> Self {
        Self {
            device_addr,
            port,
            device_uuid: device_uuid.into(),
            response_timeout_ms: None,
            monitor_bind_addr: default_monitor_bind_addr(),
        }
    }

    /// Sets the response timeout.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Sets the local address the monitor listener binds to.
    pub fn with_monitor_bind_addr(mut self, addr: Ipv4Addr) -> Self {
        self.monitor_bind_addr = addr;
        self
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout_ms.map(Duration::from_millis)
    }

    /// Socket address commands are sent to.
    pub fn remote_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.device_addr, self.port))
    }

    /// Port the device streams monitor reports to.
    pub fn monitor_port(&self) -> u16 {
        self.port.wrapping_add(1)
    }

    /// Local socket address the monitor listener binds to.
    pub fn monitor_bind_socket(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.monitor_bind_addr, self.monitor_port()))
    }

    /// Checks the port range and parses the device uuid.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPort`] for port 0 or 65535, and
    /// [`ConfigError::InvalidDeviceId`] if the uuid is malformed.
    pub fn validate(&self) -> Result<DeviceId, ConfigError> {
        if self.port == 0 || self.port == u16::MAX {
            return Err(ConfigError::InvalidPort(self.port));
        }
        Ok(DeviceId::parse(&self.device_uuid)?)
    }

    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and the
    /// [`ClientConfig::validate`] errors for bad values.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// errors of [`ClientConfig::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Writes the config to `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] for file-system failures or
    /// [`ConfigError::Serialize`] if serialization fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
