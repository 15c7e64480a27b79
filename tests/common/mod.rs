//! Test utilities for Sockdispatch
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use sockdispatch::config::{Mode, SocksConfig};
use sockdispatch::server::{Server, SessionController};
use sockdispatch::transport::{Dialer, SocketOpts};
use sockdispatch::{Uplink, UplinkPool};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

/// Create a test TCP listener on an available loopback port
pub async fn create_test_listener() -> (TcpListener, SocketAddrV4) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = match listener.local_addr().unwrap() {
        SocketAddr::V4(v4) => v4,
        SocketAddr::V6(_) => unreachable!(),
    };
    (listener, addr)
}

/// Start a server that echoes every connection back to itself
pub async fn start_echo_server() -> SocketAddrV4 {
    let (listener, addr) = create_test_listener().await;
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut reader, mut writer) = stream.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });
    addr
}

/// Start a server that greets every connection with `tag` and closes it
pub async fn start_tag_server(tag: &'static [u8]) -> SocketAddrV4 {
    let (listener, addr) = create_test_listener().await;
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let _ = stream.write_all(tag).await;
        }
    });
    addr
}

/// Start a server that tells every connection the last octet of its source
/// address and closes it
pub async fn start_peer_server() -> SocketAddrV4 {
    let (listener, addr) = create_test_listener().await;
    tokio::spawn(async move {
        while let Ok((mut stream, peer)) = listener.accept().await {
            if let SocketAddr::V4(peer) = peer {
                let _ = stream.write_all(&[peer.ip().octets()[3]]).await;
            }
        }
    });
    addr
}

/// A reserved port with nothing listening on it
pub async fn closed_port() -> SocketAddrV4 {
    let (_listener, addr) = create_test_listener().await;
    addr
}

/// Uplink pinned to the loopback address
pub fn loopback_uplink(weight: u32) -> Uplink {
    Uplink::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0), weight)
}

/// Running dispatcher under test
pub struct TestServer {
    /// Listen address
    pub addr: SocketAddr,
    /// Dropping or sending stops the accept loop
    pub shutdown_tx: broadcast::Sender<bool>,
}

/// Start a dispatcher on an ephemeral loopback port
pub async fn start_server(mode: Mode, uplinks: Vec<Uplink>, socks: SocksConfig) -> TestServer {
    let controller = SessionController::new(
        mode,
        Arc::new(UplinkPool::new(uplinks).unwrap()),
        Dialer::default(),
        socks,
    );
    let server = Server::bind("127.0.0.1:0".parse().unwrap(), controller, SocketOpts::default())
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(server.run(shutdown_rx));

    TestServer { addr, shutdown_tx }
}

/// Connect and read everything the server sends until it closes
pub async fn read_until_close(addr: SocketAddr) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut received = Vec::new();
    stream.read_to_end(&mut received).await.unwrap();
    received
}

/// Raw SOCKS5 request bytes
pub mod socks5_mock {
    use sockdispatch::socks::*;

    /// Greeting offering only "no authentication"
    pub fn create_greeting_no_auth() -> Vec<u8> {
        vec![SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_NONE]
    }

    /// CONNECT to an IPv4 address
    pub fn create_connect_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV4,
        ];
        cmd.extend_from_slice(&ip);
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// CONNECT to a domain name using address type `atyp`
    pub fn create_connect_domain(atyp: u8, domain: &str, port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            atyp,
            domain.len() as u8,
        ];
        cmd.extend_from_slice(domain.as_bytes());
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// Reply the dispatcher sends for `status`
    pub fn expected_reply(status: u8) -> [u8; SOCKS5_REPLY_LEN] {
        [SOCKS5_VERSION, status, 0, 1, 0, 0, 0, 0, 0, 0]
    }
}
