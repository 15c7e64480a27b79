//! SOCKS5 type definitions
//!
//! Defines the destination address produced by the negotiator and consumed
//! by the dialer.

use crate::error::DialError;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Target address for CONNECT requests and tunnel backends
///
/// Only IPv4 literals and domain names are representable; IPv6 targets are
/// not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    /// IPv4 address with port
    Ipv4(SocketAddrV4),
    /// Domain name with port
    Domain(String, u16),
}

impl TargetAddr {
    /// Create a new TargetAddr from an IPv4 address and port
    pub fn ipv4(ip: Ipv4Addr, port: u16) -> Self {
        TargetAddr::Ipv4(SocketAddrV4::new(ip, port))
    }

    /// Create a new TargetAddr from a domain name and port
    pub fn domain(domain: String, port: u16) -> Self {
        TargetAddr::Domain(domain, port)
    }

    /// Build from a host that may be an IPv4 literal or a name
    pub fn from_host_port(host: &str, port: u16) -> Self {
        match host.parse::<Ipv4Addr>() {
            Ok(ip) => TargetAddr::ipv4(ip, port),
            Err(_) => TargetAddr::domain(host.to_string(), port),
        }
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        match self {
            TargetAddr::Ipv4(addr) => addr.port(),
            TargetAddr::Domain(_, port) => *port,
        }
    }

    /// Resolve to the IPv4 socket addresses to try, in resolver order
    ///
    /// IPv4 literals resolve to themselves without touching the resolver.
    pub async fn resolve_ipv4(&self) -> Result<Vec<SocketAddrV4>, DialError> {
        match self {
            TargetAddr::Ipv4(addr) => Ok(vec![*addr]),
            TargetAddr::Domain(domain, port) => {
                let resolved = tokio::net::lookup_host((domain.as_str(), *port))
                    .await
                    .map_err(|source| DialError::Resolve {
                        target: self.to_string(),
                        source,
                    })?;

                let addrs: Vec<SocketAddrV4> = resolved
                    .filter_map(|addr| match addr {
                        SocketAddr::V4(v4) => Some(v4),
                        SocketAddr::V6(_) => None,
                    })
                    .collect();

                if addrs.is_empty() {
                    return Err(DialError::NoIpv4Address(self.to_string()));
                }
                Ok(addrs)
            }
        }
    }
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::Ipv4(addr) => write!(f, "{}", addr),
            TargetAddr::Domain(domain, port) => write!(f, "{}:{}", domain, port),
        }
    }
}

impl From<SocketAddrV4> for TargetAddr {
    fn from(addr: SocketAddrV4) -> Self {
        TargetAddr::Ipv4(addr)
    }
}
