//! End-to-end tunnel dispatching through a running server

mod common;

use common::*;
use sockdispatch::config::{Mode, SocksConfig};
use sockdispatch::socks::TargetAddr;
use sockdispatch::Uplink;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[tokio::test]
async fn test_weighted_rotation_across_backends() {
    let a = start_tag_server(b"A").await;
    let b = start_tag_server(b"B").await;
    let server = start_server(
        Mode::Tunnel,
        vec![
            Uplink::backend(TargetAddr::from(a), 2),
            Uplink::backend(TargetAddr::from(b), 1),
        ],
        SocksConfig::default(),
    )
    .await;

    let mut sequence = Vec::new();
    for _ in 0..6 {
        sequence.extend(read_until_close(server.addr).await);
    }
    assert_eq!(sequence, b"AABAAB");
}

#[tokio::test]
async fn test_tunnel_relays_without_handshake() {
    let backend = start_echo_server().await;
    let server = start_server(
        Mode::Tunnel,
        vec![Uplink::backend(TargetAddr::from(backend), 1)],
        SocksConfig::default(),
    )
    .await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(&[5, 1, 0, 0xff]).await.unwrap();
    let mut echoed = [0u8; 4];
    stream.read_exact(&mut echoed).await.unwrap();
    assert_eq!(echoed, [5, 1, 0, 0xff]);
}

#[tokio::test]
async fn test_unreachable_backend_closes_client() {
    let backend = closed_port().await;
    let server = start_server(
        Mode::Tunnel,
        vec![Uplink::backend(TargetAddr::from(backend), 1)],
        SocksConfig::default(),
    )
    .await;

    assert!(read_until_close(server.addr).await.is_empty());
}

#[tokio::test]
async fn test_failed_dial_still_advances_rotation() {
    let dead = closed_port().await;
    let live = start_tag_server(b"L").await;
    let server = start_server(
        Mode::Tunnel,
        vec![
            Uplink::backend(TargetAddr::from(dead), 1),
            Uplink::backend(TargetAddr::from(live), 1),
        ],
        SocksConfig::default(),
    )
    .await;

    assert!(read_until_close(server.addr).await.is_empty());
    assert_eq!(read_until_close(server.addr).await, b"L");
    assert!(read_until_close(server.addr).await.is_empty());
}

#[tokio::test]
async fn test_shutdown_keeps_in_flight_sessions() {
    let backend = start_echo_server().await;
    let server = start_server(
        Mode::Tunnel,
        vec![Uplink::backend(TargetAddr::from(backend), 1)],
        SocksConfig::default(),
    )
    .await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let mut buf = [0u8; 1];
    stream.write_all(b"a").await.unwrap();
    stream.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"a");

    server.shutdown_tx.send(true).unwrap();

    // The listener is dropped once the accept loop sees the signal
    let mut refused = false;
    for _ in 0..100 {
        if TcpStream::connect(server.addr).await.is_err() {
            refused = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(refused, "listener still accepting after shutdown");

    stream.write_all(b"z").await.unwrap();
    stream.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"z");
}
