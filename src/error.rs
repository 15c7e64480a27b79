//! Error types for Sockdispatch
//!
//! This module defines the error taxonomy shared by the dispatcher: fatal
//! configuration errors, per-session SOCKS5 protocol errors and per-session
//! dial errors.

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Main error type for Sockdispatch operations
#[derive(Error, Debug)]
pub enum DispatchError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SOCKS5 protocol error
    #[error("SOCKS5 error: {0}")]
    Protocol(#[from] Socks5Error),

    /// Outbound dial error
    #[error("Dial error: {0}")]
    Dial(#[from] DialError),
}

/// SOCKS5 negotiation errors
///
/// Every variant is local to one session.
#[derive(Error, Debug)]
pub enum Socks5Error {
    /// The client greeting was truncated
    #[error("client greeting failed: {0}")]
    Greeting(#[source] io::Error),

    /// The method selection could not be written back
    #[error("servers choice failed: {0}")]
    MethodSelection(#[source] io::Error),

    /// The connection request was truncated
    #[error("client connection request failed: {0}")]
    Request(#[source] io::Error),

    /// Unsupported SOCKS version in the connection request
    #[error("unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// Command other than CONNECT
    #[error("unsupported command code: {0}")]
    CommandNotSupported(u8),

    /// Unknown address type
    #[error("unsupported address type: {0}")]
    AddressTypeNotSupported(u8),

    /// Domain name is not valid UTF-8
    #[error("invalid domain name: {0}")]
    InvalidDomain(String),
}

impl Socks5Error {
    /// Reply owed to the client for this failure.
    ///
    /// `None` means the method selection was never sent, so the connection is
    /// closed without a reply.
    pub fn reply_status(&self) -> Option<ReplyStatus> {
        match self {
            Socks5Error::Greeting(_) | Socks5Error::MethodSelection(_) => None,
            Socks5Error::Request(_)
            | Socks5Error::UnsupportedVersion(_)
            | Socks5Error::InvalidDomain(_) => Some(ReplyStatus::ServerFailure),
            Socks5Error::CommandNotSupported(_) => Some(ReplyStatus::CommandNotSupported),
            Socks5Error::AddressTypeNotSupported(_) => Some(ReplyStatus::AddrTypeNotSupported),
        }
    }
}

/// Outbound connection errors
#[derive(Error, Debug)]
pub enum DialError {
    /// Neither the request nor the uplink supplied a destination
    #[error("no target address for uplink")]
    NoTarget,

    /// Name resolution failed
    #[error("failed to resolve {target}: {source}")]
    Resolve {
        /// Target as requested
        target: String,
        /// Resolver error
        #[source]
        source: io::Error,
    },

    /// Resolution produced no IPv4 address
    #[error("no IPv4 address found for {0}")]
    NoIpv4Address(String),

    /// Socket creation failed
    #[error("failed to create socket: {0}")]
    Socket(#[source] io::Error),

    /// Pinning the local endpoint failed
    #[error("failed to bind local address {addr}: {source}")]
    Bind {
        /// Local address of the uplink
        addr: SocketAddr,
        /// OS error
        #[source]
        source: io::Error,
    },

    /// TCP connect failed
    #[error("failed to connect to {target}: {source}")]
    Connect {
        /// Resolved destination
        target: SocketAddr,
        /// OS error
        #[source]
        source: io::Error,
    },
}

/// Reply status codes sent in the fixed 10-byte SOCKS5 reply
///
/// These values are the dispatcher's own numbering, not the RFC 1928 table:
/// clients only distinguish success from failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyStatus {
    /// Connection established
    Success = 0x00,
    /// Malformed request or general failure
    ServerFailure = 0x01,
    /// Outbound dial failed
    NetworkUnreachable = 0x02,
    /// Command other than CONNECT
    CommandNotSupported = 0x03,
    /// Unknown address type
    AddrTypeNotSupported = 0x04,
}

impl From<ReplyStatus> for u8 {
    fn from(status: ReplyStatus) -> Self {
        status as u8
    }
}

impl TryFrom<u8> for ReplyStatus {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(ReplyStatus::Success),
            0x01 => Ok(ReplyStatus::ServerFailure),
            0x02 => Ok(ReplyStatus::NetworkUnreachable),
            0x03 => Ok(ReplyStatus::CommandNotSupported),
            0x04 => Ok(ReplyStatus::AddrTypeNotSupported),
            other => Err(other),
        }
    }
}
