//! Configuration module for Sockdispatch
//!
//! Configuration comes from an optional TOML file, then environment
//! variables, then command-line overrides. Any error here is fatal: the
//! dispatcher never starts listening with a partial configuration.

mod env;
mod server;
mod tcp;
mod uplink;

pub use env::{connect_uplinks_from_env, ENV_CONNECT_PREFIX, ENV_SERVER_HOST, ENV_SERVER_PORT};
pub use server::{Config, Mode, ServerConfig, SocksConfig};
pub use tcp::TcpConfig;
pub use uplink::UplinkConfig;

use crate::error::DispatchError;
use crate::pool::{Uplink, UplinkPool};
use crate::transport::interface_for_ip;
use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    parse_config(&content)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse configuration")
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Listen host
    pub listen_host: Option<String>,
    /// Listen port
    pub listen_port: Option<u16>,
    /// Force tunnel mode
    pub tunnel: bool,
    /// Positional uplink arguments; replace file uplinks when non-empty
    pub uplinks: Vec<String>,
}

impl ConfigOverrides {
    /// Merge into `config`
    pub fn apply(self, config: &mut Config) -> Result<(), DispatchError> {
        if let Some(host) = self.listen_host {
            config.server.listen_host = host;
        }
        if let Some(port) = self.listen_port {
            config.server.listen_port = port;
        }
        if self.tunnel {
            config.server.mode = Mode::Tunnel;
        }

        if !self.uplinks.is_empty() {
            config.uplinks = self
                .uplinks
                .iter()
                .map(|arg| UplinkConfig::parse_arg(arg, config.server.mode))
                .collect::<Result<Vec<_>, _>>()?;
        }

        Ok(())
    }
}

impl Config {
    /// Fall back to `SOCKS_CONNECT*` backends in tunnel mode
    pub fn fill_from_env<I>(&mut self, vars: I) -> Result<(), DispatchError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        if self.server.mode == Mode::Tunnel && self.uplinks.is_empty() {
            self.uplinks = connect_uplinks_from_env(vars)?;
        }
        Ok(())
    }

    /// Resolve every uplink against the host's interfaces
    pub fn build_uplinks(&self) -> Result<Vec<Uplink>, DispatchError> {
        self.uplinks
            .iter()
            .map(|u| u.to_uplink(self.server.mode, interface_for_ip))
            .collect()
    }
}

/// Validate `config` and build the uplink pool
pub fn build_pool(config: &Config) -> Result<UplinkPool, DispatchError> {
    config.validate()?;
    UplinkPool::new(config.build_uplinks()?)
}
