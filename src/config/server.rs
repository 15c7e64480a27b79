//! Server configuration types
//!
//! Defines the root configuration and the listener/SOCKS sections.

use super::{TcpConfig, UplinkConfig};
use crate::error::DispatchError;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddrV4};

/// Default listen host
fn default_listen_host() -> String {
    "127.0.0.1".to_string()
}

/// Default listen port
fn default_listen_port() -> u16 {
    8080
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// SOCKS5 negotiation options
    #[serde(default)]
    pub socks: SocksConfig,

    /// Socket options for client and outbound connections
    #[serde(default)]
    pub tcp: TcpConfig,

    /// Configured uplinks, in rotation order
    #[serde(default)]
    pub uplinks: Vec<UplinkConfig>,
}

/// Operating mode
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Full SOCKS5 proxy; uplinks are local addresses
    #[default]
    Socks,
    /// Raw forwarding; uplinks are fixed backends
    Tunnel,
}

/// Listener configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// IPv4 address to listen on
    #[serde(default = "default_listen_host")]
    pub listen_host: String,

    /// Port to listen on
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// SOCKS or tunnel behavior
    #[serde(default)]
    pub mode: Mode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_host: default_listen_host(),
            listen_port: default_listen_port(),
            mode: Mode::default(),
        }
    }
}

impl ServerConfig {
    /// Parse and check the listen address
    pub fn listen_addr(&self) -> Result<SocketAddrV4, DispatchError> {
        let host: Ipv4Addr = self
            .listen_host
            .parse()
            .map_err(|_| DispatchError::Config(format!("Invalid host {}", self.listen_host)))?;

        if self.listen_port == 0 {
            return Err(DispatchError::Config(format!(
                "Invalid port {}",
                self.listen_port
            )));
        }

        Ok(SocketAddrV4::new(host, self.listen_port))
    }
}

/// SOCKS5 negotiation options
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SocksConfig {
    /// Also accept the RFC 1928 domain address type (0x03)
    #[serde(default)]
    pub accept_rfc_domain: bool,
}

impl Config {
    /// Check everything that does not need the host's interfaces
    pub fn validate(&self) -> Result<(), DispatchError> {
        self.server.listen_addr()?;

        if self.uplinks.is_empty() {
            return Err(DispatchError::Config(
                "Please specify one or more uplinks".to_string(),
            ));
        }

        for uplink in &self.uplinks {
            uplink.validate(self.server.mode)?;
        }

        Ok(())
    }
}
