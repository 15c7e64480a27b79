//! Uplink definition
//!
//! An uplink is one outbound path: a pinned local address (optionally bound
//! to a network device) for SOCKS mode, or a fixed backend for tunnel mode.

use crate::socks::TargetAddr;
use std::fmt;
use std::net::{SocketAddr, SocketAddrV4};

/// One configured outbound path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uplink {
    /// Local endpoint pinned on outbound sockets
    local_addr: Option<SocketAddr>,
    /// Network device to bind outbound sockets to
    interface: Option<String>,
    /// Fixed destination used in tunnel mode
    remote: Option<TargetAddr>,
    /// Consecutive selections before rotating to the next uplink
    weight: u32,
}

impl Uplink {
    /// Create an uplink that pins outbound sockets to `local_addr`
    pub fn bind(local_addr: SocketAddrV4, weight: u32) -> Self {
        Uplink {
            local_addr: Some(SocketAddr::V4(local_addr)),
            interface: None,
            remote: None,
            weight,
        }
    }

    /// Create an uplink that always connects to `remote`
    pub fn backend(remote: TargetAddr, weight: u32) -> Self {
        Uplink {
            local_addr: None,
            interface: None,
            remote: Some(remote),
            weight,
        }
    }

    /// Also bind outbound sockets to the named network device
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    /// Local endpoint, if pinned
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Network device name, if any
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    /// Fixed tunnel destination, if any
    pub fn remote(&self) -> Option<&TargetAddr> {
        self.remote.as_ref()
    }

    /// Contention ratio
    pub fn weight(&self) -> u32 {
        self.weight
    }
}

impl fmt::Display for Uplink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.remote, &self.local_addr) {
            (Some(remote), _) => write!(f, "{}", remote),
            (None, Some(local)) => write!(f, "{}", local),
            (None, None) => write!(f, "<unbound>"),
        }
    }
}
