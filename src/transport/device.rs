//! Network device binding
//!
//! Pins an outbound socket to a named interface before it connects, so
//! traffic leaves through that device regardless of the routing table.

use std::fmt::Debug;
use std::io;
use tokio::net::TcpSocket;

/// Binds sockets to a network device
///
/// The dialer treats a failure as non-fatal, so implementations only report
/// what went wrong.
pub trait InterfaceBinder: Debug + Send + Sync {
    /// Bind `socket` to the device called `interface`
    fn bind_to_interface(&self, socket: &TcpSocket, interface: &str) -> io::Result<()>;
}

/// Binder backed by `SO_BINDTODEVICE`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBinder;

impl InterfaceBinder for SystemBinder {
    #[cfg(any(target_os = "linux", target_os = "android", target_os = "fuchsia"))]
    fn bind_to_interface(&self, socket: &TcpSocket, interface: &str) -> io::Result<()> {
        socket2::SockRef::from(socket).bind_device(Some(interface.as_bytes()))
    }

    #[cfg(not(any(target_os = "linux", target_os = "android", target_os = "fuchsia")))]
    fn bind_to_interface(&self, _socket: &TcpSocket, interface: &str) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("binding to device {} is not supported on this platform", interface),
        ))
    }
}
