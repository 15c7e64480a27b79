//! Uplink configuration
//!
//! Parses uplinks from TOML entries or `address[:port][@weight]` arguments
//! and turns them into pool entries.

use super::Mode;
use crate::error::DispatchError;
use crate::pool::Uplink;
use crate::socks::TargetAddr;
use serde::{Deserialize, Serialize};
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use tracing::warn;

/// Default contention ratio
fn default_weight() -> u32 {
    1
}

/// One configured uplink
///
/// In SOCKS mode `address` is a local IPv4 address and `port` an optional
/// local port. In tunnel mode `address` is the backend host and `port` is
/// required.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UplinkConfig {
    /// Local IPv4 address (SOCKS) or backend host (tunnel)
    pub address: String,

    /// Local port (SOCKS, default 0) or backend port (tunnel)
    #[serde(default)]
    pub port: Option<u16>,

    /// Contention ratio
    #[serde(default = "default_weight")]
    pub weight: u32,

    /// Network device to bind to
    #[serde(default)]
    pub interface: Option<String>,
}

impl UplinkConfig {
    /// Parse a command-line uplink
    ///
    /// SOCKS mode accepts `IPv4[:port][@weight]`, tunnel mode requires
    /// `IPv4:port[@weight]`.
    pub fn parse_arg(arg: &str, mode: Mode) -> Result<Self, DispatchError> {
        let (addr_part, weight_part) = match arg.split_once('@') {
            Some((addr, weight)) => (addr, Some(weight)),
            None => (arg, None),
        };

        let (host, port) = match (addr_part.split_once(':'), mode) {
            (Some((host, port)), _) => (host, Some(parse_port(port, addr_part)?)),
            (None, Mode::Socks) => (addr_part, None),
            (None, Mode::Tunnel) => {
                return Err(DispatchError::Config(format!(
                    "Invalid address specification {}",
                    addr_part
                )))
            }
        };

        if host.parse::<Ipv4Addr>().is_err() {
            return Err(DispatchError::Config(format!("Invalid address {}", host)));
        }

        let weight = match weight_part {
            Some(w) => w
                .parse::<u32>()
                .ok()
                .filter(|w| *w > 0)
                .ok_or_else(|| {
                    DispatchError::Config(format!("Invalid contention ratio for {}", host))
                })?,
            None => default_weight(),
        };

        Ok(UplinkConfig {
            address: host.to_string(),
            port,
            weight,
            interface: None,
        })
    }

    /// Check the entry against the operating mode
    pub fn validate(&self, mode: Mode) -> Result<(), DispatchError> {
        if self.weight == 0 {
            return Err(DispatchError::Config(format!(
                "Invalid contention ratio for {}",
                self.address
            )));
        }

        match mode {
            Mode::Socks => {
                self.address.parse::<Ipv4Addr>().map_err(|_| {
                    DispatchError::Config(format!("Invalid address {}", self.address))
                })?;
            }
            Mode::Tunnel => {
                if self.address.is_empty() {
                    return Err(DispatchError::Config("Empty backend host".to_string()));
                }
                if matches!(self.port, None | Some(0)) {
                    return Err(DispatchError::Config(format!(
                        "Invalid port for {}",
                        self.address
                    )));
                }
            }
        }

        Ok(())
    }

    /// Build the pool entry
    ///
    /// In SOCKS mode the address must be carried by a local interface found
    /// through `lookup`; that interface is used unless one is named
    /// explicitly. An address on no interface is fatal. A platform without
    /// interface enumeration falls back to the named interface, if any.
    pub fn to_uplink<F>(&self, mode: Mode, lookup: F) -> Result<Uplink, DispatchError>
    where
        F: Fn(Ipv4Addr) -> io::Result<Option<String>>,
    {
        self.validate(mode)?;

        let uplink = match mode {
            Mode::Socks => {
                let ip: Ipv4Addr = self.address.parse().map_err(|_| {
                    DispatchError::Config(format!("Invalid address {}", self.address))
                })?;
                let local = SocketAddrV4::new(ip, self.port.unwrap_or(0));
                let uplink = Uplink::bind(local, self.weight);

                let interface = match lookup(ip) {
                    Ok(Some(found)) => Some(self.interface.clone().unwrap_or(found)),
                    Ok(None) => {
                        return Err(DispatchError::Config(format!(
                            "IP address not associated with an interface {}",
                            ip
                        )))
                    }
                    Err(e) if e.kind() == io::ErrorKind::Unsupported => {
                        warn!("Cannot look up the interface for {}: {}", ip, e);
                        self.interface.clone()
                    }
                    Err(e) => {
                        return Err(DispatchError::Config(format!(
                            "Failed to enumerate interfaces: {}",
                            e
                        )))
                    }
                };

                match interface {
                    Some(name) => uplink.with_interface(name),
                    None => uplink,
                }
            }
            Mode::Tunnel => {
                let port = self.port.unwrap_or_default();
                let uplink =
                    Uplink::backend(TargetAddr::from_host_port(&self.address, port), self.weight);
                match &self.interface {
                    Some(name) => uplink.with_interface(name.clone()),
                    None => uplink,
                }
            }
        };

        Ok(uplink)
    }
}

fn parse_port(port: &str, arg: &str) -> Result<u16, DispatchError> {
    port.parse::<u16>()
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| DispatchError::Config(format!("Invalid port {}", arg)))
}
