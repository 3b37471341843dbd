//! Configuration management for the RAX FTPS server
//!
//! Values come from `config.toml` overlaid by `RAX_FTPS_*` environment
//! variables. Every field has a default, so the file is optional.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::auth::Credential;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// IP address the control listener binds to
    pub bind_address: String,

    /// Port for the control connection
    pub control_port: u16,

    /// IPv4 address announced in 227 replies; defaults to `bind_address`
    pub passive_address: Option<String>,

    /// Root directory for FTP operations
    pub server_root: String,

    /// Destination directory for STOR when the client names none
    pub upload_dir: String,

    /// PEM certificate chain and private key for TLS
    pub cert_file: String,
    pub key_file: String,

    /// Chunk size for data transfers
    pub buffer_size: usize,

    /// How long a passive listener waits for its client
    pub data_accept_timeout_secs: u64,

    /// Maximum FTP command length
    pub max_command_length: usize,

    /// Maximum concurrent clients
    pub max_clients: usize,

    /// Accounts; empty means the built-in table
    pub users: Vec<Credential>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            control_port: 2121,
            passive_address: None,
            server_root: "./server_root".to_string(),
            upload_dir: "Uploads".to_string(),
            cert_file: "cert.pem".to_string(),
            key_file: "private.key".to_string(),
            buffer_size: 1024,
            data_accept_timeout_secs: 30,
            max_command_length: 512,
            max_clients: 10,
            users: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            // Docker production: /app/rax-ftps-server/config.toml
            .add_source(File::with_name("rax-ftps-server/config").required(false))
            // Local development: ./config.toml
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("RAX_FTPS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control_port == 0 {
            return Err(ConfigError::Message("Control port cannot be 0".into()));
        }

        let Ok(bind_ip) = self.bind_address.parse::<IpAddr>() else {
            return Err(ConfigError::Message(format!(
                "bind_address '{}' is not an IP address",
                self.bind_address
            )));
        };

        // 227 replies can only announce a concrete IPv4 address.
        if self.passive_address.is_none() && (bind_ip.is_unspecified() || bind_ip.is_ipv6()) {
            return Err(ConfigError::Message(format!(
                "passive_address must be set to an IPv4 address when binding to {bind_ip}"
            )));
        }

        if let Some(passive) = &self.passive_address {
            match passive.parse::<IpAddr>() {
                Ok(IpAddr::V4(_)) => {}
                _ => {
                    return Err(ConfigError::Message(format!(
                        "passive_address '{passive}' is not an IPv4 address"
                    )));
                }
            }
        }

        if self.server_root.trim().is_empty() {
            return Err(ConfigError::Message("server_root cannot be empty".into()));
        }

        if self.buffer_size == 0 {
            return Err(ConfigError::Message(
                "buffer_size must be greater than 0".into(),
            ));
        }

        if self.data_accept_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "data_accept_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.max_command_length == 0 {
            return Err(ConfigError::Message(
                "max_command_length must be greater than 0".into(),
            ));
        }

        if self.max_clients == 0 {
            return Err(ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        let mut seen = HashSet::new();
        for user in &self.users {
            if !seen.insert(user.username.as_str()) {
                return Err(ConfigError::Message(format!(
                    "duplicate user '{}'",
                    user.username
                )));
            }
        }

        Ok(())
    }

    /// Address of the control listener.
    pub fn control_socket(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.bind_address.parse().map_err(|_| {
            ConfigError::Message(format!(
                "bind_address '{}' is not an IP address",
                self.bind_address
            ))
        })?;
        Ok(SocketAddr::new(ip, self.control_port))
    }

    /// Address announced in 227 replies.
    pub fn passive_ip(&self) -> Result<IpAddr, ConfigError> {
        let raw = self.passive_address.as_deref().unwrap_or(&self.bind_address);
        raw.parse().map_err(|_| {
            ConfigError::Message(format!("passive address '{raw}' is not an IP address"))
        })
    }

    pub fn data_accept_timeout(&self) -> Duration {
        Duration::from_secs(self.data_accept_timeout_secs)
    }

    pub fn server_root_path(&self) -> PathBuf {
        PathBuf::from(&self.server_root)
    }
}
