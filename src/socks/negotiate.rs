//! SOCKS5 negotiation
//!
//! Drives one client through greeting, method selection and the CONNECT
//! request. On success the target is returned and nothing has been replied
//! yet: the success reply is owed only once the outbound dial succeeds.
//!
//! # Request Format
//!
//! ```text
//! +----+-----+-------+------+----------+----------+
//! |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
//! +----+-----+-------+------+----------+----------+
//! | 1  |  1  | X'00' |  1   | Variable |    2     |
//! +----+-----+-------+------+----------+----------+
//! ```

use super::consts::*;
use super::reply::send_reply;
use super::types::TargetAddr;
use crate::config::SocksConfig;
use crate::error::Socks5Error;
use std::net::Ipv4Addr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Run the full negotiation on `stream`
///
/// On failure the matching reply (if any is owed) has already been written;
/// the caller only has to drop the stream.
pub async fn negotiate<S>(stream: &mut S, config: &SocksConfig) -> Result<TargetAddr, Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let methods = read_greeting(stream).await?;
    debug!("Client offered authentication methods: {:?}", methods);

    send_method_selection(stream).await?;

    match read_request(stream, config).await {
        Ok(target) => Ok(target),
        Err(e) => {
            if let Some(status) = e.reply_status() {
                if let Err(write_err) = send_reply(stream, status).await {
                    debug!("Failed to send {:?} reply: {}", status, write_err);
                }
            }
            Err(e)
        }
    }
}

/// Read the greeting and return the declared authentication methods
///
/// The version byte is not checked here; a non-5 client is caught by the
/// request header.
pub async fn read_greeting<S>(stream: &mut S) -> Result<Vec<u8>, Socks5Error>
where
    S: AsyncRead + Unpin,
{
    let mut buf = [0u8; 2];
    stream
        .read_exact(&mut buf)
        .await
        .map_err(Socks5Error::Greeting)?;

    let num_methods = buf[1];
    let mut methods = vec![0u8; num_methods as usize];
    stream
        .read_exact(&mut methods)
        .await
        .map_err(Socks5Error::Greeting)?;

    Ok(methods)
}

/// Select "no authentication" regardless of what the client offered
pub async fn send_method_selection<S>(stream: &mut S) -> Result<(), Socks5Error>
where
    S: AsyncWrite + Unpin,
{
    stream
        .write_all(&[SOCKS5_VERSION, SOCKS5_AUTH_METHOD_NONE])
        .await
        .map_err(Socks5Error::MethodSelection)?;
    stream.flush().await.map_err(Socks5Error::MethodSelection)
}

/// Read the CONNECT request and return its target
///
/// Address bytes are not read when the version or command is rejected.
pub async fn read_request<S>(
    stream: &mut S,
    config: &SocksConfig,
) -> Result<TargetAddr, Socks5Error>
where
    S: AsyncRead + Unpin,
{
    // Read: VER CMD RSV ATYP
    let mut header = [0u8; 4];
    stream
        .read_exact(&mut header)
        .await
        .map_err(Socks5Error::Request)?;

    let version = header[0];
    let command = header[1];
    let addr_type = header[3];

    if version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(version));
    }

    if command != SOCKS5_CMD_TCP_CONNECT {
        return Err(Socks5Error::CommandNotSupported(command));
    }

    match addr_type {
        SOCKS5_ADDR_TYPE_IPV4 => {
            let mut addr = [0u8; 4];
            stream
                .read_exact(&mut addr)
                .await
                .map_err(Socks5Error::Request)?;
            let port = read_port(stream).await?;

            Ok(TargetAddr::ipv4(Ipv4Addr::from(addr), port))
        }
        SOCKS5_ADDR_TYPE_DOMAIN => read_domain(stream).await,
        SOCKS5_ADDR_TYPE_DOMAIN_RFC if config.accept_rfc_domain => read_domain(stream).await,
        other => Err(Socks5Error::AddressTypeNotSupported(other)),
    }
}

async fn read_domain<S>(stream: &mut S) -> Result<TargetAddr, Socks5Error>
where
    S: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 1];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(Socks5Error::Request)?;

    let mut domain_buf = vec![0u8; len_buf[0] as usize];
    stream
        .read_exact(&mut domain_buf)
        .await
        .map_err(Socks5Error::Request)?;

    let port = read_port(stream).await?;

    let domain = String::from_utf8(domain_buf).map_err(|e| {
        Socks5Error::InvalidDomain(String::from_utf8_lossy(e.as_bytes()).into_owned())
    })?;

    Ok(TargetAddr::domain(domain, port))
}

async fn read_port<S>(stream: &mut S) -> Result<u16, Socks5Error>
where
    S: AsyncRead + Unpin,
{
    let mut port_buf = [0u8; 2];
    stream
        .read_exact(&mut port_buf)
        .await
        .map_err(Socks5Error::Request)?;
    Ok(u16::from_be_bytes(port_buf))
}
