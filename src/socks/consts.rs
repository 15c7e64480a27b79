//! SOCKS5 protocol constants
//!
//! Defines the wire values understood by the negotiator.

/// SOCKS5 protocol version
pub const SOCKS5_VERSION: u8 = 0x05;

// Authentication methods
/// No authentication required
pub const SOCKS5_AUTH_METHOD_NONE: u8 = 0x00;

// Commands
/// TCP CONNECT command
pub const SOCKS5_CMD_TCP_CONNECT: u8 = 0x01;
/// TCP BIND command (rejected)
pub const SOCKS5_CMD_TCP_BIND: u8 = 0x02;
/// UDP ASSOCIATE command (rejected)
pub const SOCKS5_CMD_UDP_ASSOCIATE: u8 = 0x03;

// Address types
/// IPv4 address
pub const SOCKS5_ADDR_TYPE_IPV4: u8 = 0x01;
/// Domain name as understood by this dispatcher.
///
/// RFC 1928 assigns `0x03` to domain names; standard clients sending `0x03`
/// are rejected unless `accept_rfc_domain` is enabled.
pub const SOCKS5_ADDR_TYPE_DOMAIN: u8 = 0x02;
/// Domain name as assigned by RFC 1928
pub const SOCKS5_ADDR_TYPE_DOMAIN_RFC: u8 = 0x03;

// Reserved byte
/// Reserved byte value (always 0x00)
pub const SOCKS5_RESERVED: u8 = 0x00;

/// Length of every reply sent by the negotiator
pub const SOCKS5_REPLY_LEN: usize = 10;
