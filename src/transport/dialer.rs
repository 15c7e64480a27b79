//! Outbound dialer
//!
//! Opens a TCP connection to a destination through one uplink: the socket
//! is bound to the uplink's device and local address before connecting.

use super::{InterfaceBinder, SocketOpts, SystemBinder};
use crate::error::DialError;
use crate::pool::Uplink;
use crate::socks::TargetAddr;
use std::net::{SocketAddr, SocketAddrV4};
use std::sync::Arc;
use tokio::net::{TcpSocket, TcpStream};
use tracing::{debug, warn};

/// Connects through uplinks
#[derive(Debug, Clone)]
pub struct Dialer {
    /// Device binding strategy
    binder: Arc<dyn InterfaceBinder>,
    /// Options applied to established connections
    socket_opts: SocketOpts,
}

impl Default for Dialer {
    fn default() -> Self {
        Dialer::new(SocketOpts::default())
    }
}

impl Dialer {
    /// Create a dialer using the system device binder
    pub fn new(socket_opts: SocketOpts) -> Self {
        Dialer {
            binder: Arc::new(SystemBinder),
            socket_opts,
        }
    }

    /// Replace the device binder
    pub fn with_binder(mut self, binder: Arc<dyn InterfaceBinder>) -> Self {
        self.binder = binder;
        self
    }

    /// Connect to `target` through `uplink`
    ///
    /// With no explicit target the uplink's fixed backend is used. Every
    /// resolved IPv4 address is tried in order and the last error is
    /// returned when all of them fail.
    pub async fn dial(
        &self,
        target: Option<&TargetAddr>,
        uplink: &Uplink,
    ) -> Result<TcpStream, DialError> {
        let target = target.or_else(|| uplink.remote()).ok_or(DialError::NoTarget)?;
        let addrs = target.resolve_ipv4().await?;

        let mut last_err = DialError::NoIpv4Address(target.to_string());
        for addr in addrs {
            match self.connect_one(addr, uplink).await {
                Ok(stream) => {
                    debug!("Connected to {} via {}", addr, uplink);
                    return Ok(stream);
                }
                Err(e) => {
                    debug!("Attempt to {} via {} failed: {}", addr, uplink, e);
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }

    async fn connect_one(
        &self,
        addr: SocketAddrV4,
        uplink: &Uplink,
    ) -> Result<TcpStream, DialError> {
        let socket = TcpSocket::new_v4().map_err(DialError::Socket)?;

        if let Some(interface) = uplink.interface() {
            if let Err(e) = self.binder.bind_to_interface(&socket, interface) {
                warn!("Couldn't bind to interface {}: {}", interface, e);
            }
        }

        if let Some(local) = uplink.local_addr() {
            socket
                .bind(local)
                .map_err(|source| DialError::Bind { addr: local, source })?;
        }

        let target = SocketAddr::V4(addr);
        let stream = socket
            .connect(target)
            .await
            .map_err(|source| DialError::Connect { target, source })?;

        self.socket_opts.hint(&stream);

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::net::Ipv4Addr;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[derive(Debug, Default)]
    struct RecordingBinder {
        calls: Mutex<Vec<String>>,
    }

    impl InterfaceBinder for RecordingBinder {
        fn bind_to_interface(&self, _socket: &TcpSocket, interface: &str) -> io::Result<()> {
            self.calls.lock().unwrap().push(interface.to_string());
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "not permitted"))
        }
    }

    fn loopback_uplink() -> Uplink {
        Uplink::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0), 1)
    }

    async fn listener() -> (TcpListener, SocketAddrV4) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = match listener.local_addr().unwrap() {
            SocketAddr::V4(v4) => v4,
            SocketAddr::V6(_) => unreachable!(),
        };
        (listener, addr)
    }

    #[tokio::test]
    async fn test_dial_binds_local_address() {
        let (listener, addr) = listener().await;
        let dialer = Dialer::default();

        let target = TargetAddr::from(addr);
        let uplink = loopback_uplink();
        let (stream, accepted) =
            tokio::join!(dialer.dial(Some(&target), &uplink), listener.accept());

        let stream = stream.unwrap();
        let (_, peer) = accepted.unwrap();
        assert_eq!(stream.local_addr().unwrap(), peer);
        assert_eq!(peer.ip(), Ipv4Addr::LOCALHOST);
    }

    #[tokio::test]
    async fn test_dial_interface_failure_is_not_fatal() {
        let (listener, addr) = listener().await;
        let binder = Arc::new(RecordingBinder::default());
        let dialer = Dialer::default().with_binder(binder.clone());
        let uplink = loopback_uplink().with_interface("wwan0");

        let target = TargetAddr::from(addr);
        let (stream, accepted) =
            tokio::join!(dialer.dial(Some(&target), &uplink), listener.accept());

        let mut stream = stream.unwrap();
        let (mut server, _) = accepted.unwrap();
        assert_eq!(*binder.calls.lock().unwrap(), vec!["wwan0".to_string()]);

        stream.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
    }

    #[tokio::test]
    async fn test_dial_uses_uplink_backend() {
        let (listener, addr) = listener().await;
        let uplink = Uplink::backend(TargetAddr::from(addr), 1);

        let dialer = Dialer::default();
        let (stream, accepted) = tokio::join!(dialer.dial(None, &uplink), listener.accept());
        assert!(stream.is_ok());
        assert!(accepted.is_ok());
    }

    #[tokio::test]
    async fn test_dial_connection_refused() {
        let (listener, addr) = listener().await;
        drop(listener);

        let target = TargetAddr::from(addr);
        let result = Dialer::default().dial(Some(&target), &loopback_uplink()).await;
        match result {
            Err(DialError::Connect { target, .. }) => assert_eq!(target, SocketAddr::V4(addr)),
            other => panic!("Expected connect error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_dial_without_target() {
        let result = Dialer::default().dial(None, &loopback_uplink()).await;
        assert!(matches!(result, Err(DialError::NoTarget)));
    }

    #[tokio::test]
    async fn test_dial_bind_failure() {
        let (_listener, addr) = listener().await;
        let uplink = Uplink::bind(SocketAddrV4::new(Ipv4Addr::new(192, 0, 2, 1), 0), 1);

        let target = TargetAddr::from(addr);
        let result = Dialer::default().dial(Some(&target), &uplink).await;
        assert!(matches!(result, Err(DialError::Bind { .. })));
    }
}
