//! Listener and accept loop
//!
//! Accepts client connections and spawns one session task per connection
//! until shutdown is signalled.

use super::SessionController;
use crate::error::DispatchError;
use crate::transport::SocketOpts;
use anyhow::Result;
use backoff::ExponentialBackoff;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Retry policy for failed accepts
///
/// Unbounded in elapsed time, so the accept loop only ends on shutdown.
fn accept_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        max_interval: Duration::from_millis(100),
        max_elapsed_time: None,
        ..Default::default()
    }
}

/// Accept loop for one listening socket
#[derive(Debug)]
pub struct Server {
    /// Bound listener
    listener: TcpListener,
    /// Per-session handler
    controller: SessionController,
    /// Options applied to accepted client sockets
    socket_opts: SocketOpts,
}

impl Server {
    /// Create a server on an already-bound listener
    pub fn new(
        listener: TcpListener,
        controller: SessionController,
        socket_opts: SocketOpts,
    ) -> Self {
        Server {
            listener,
            controller,
            socket_opts,
        }
    }

    /// Bind `addr` and create a server on it
    pub async fn bind(
        addr: SocketAddr,
        controller: SessionController,
        socket_opts: SocketOpts,
    ) -> Result<Self, DispatchError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Server::new(listener, controller, socket_opts))
    }

    /// Local address of the listener
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until shutdown
    ///
    /// Accept errors are retried with a short exponential backoff. In-flight
    /// sessions keep running after shutdown until their connections close.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
        let backoff = accept_backoff();

        loop {
            tokio::select! {
                ret = backoff::future::retry_notify(
                    backoff.clone(),
                    || async { self.listener.accept().await.map_err(backoff::Error::transient) },
                    |e, duration| {
                        warn!("Failed to accept: {}. Retry in {:?}", e, duration);
                    },
                ) => {
                    match ret {
                        Ok((stream, peer)) => {
                            debug!("Accepted connection from {}", peer);
                            self.socket_opts.hint(&stream);

                            let controller = self.controller.clone();
                            tokio::spawn(async move {
                                match controller.handle(stream).await {
                                    Ok(()) => debug!("Session from {} closed", peer),
                                    Err(DispatchError::Dial(_)) => {}
                                    Err(e) => warn!("Session from {} failed: {}", peer, e),
                                }
                            });
                        }
                        // Every accept error is transient and the policy has no
                        // elapsed-time bound, so retries never give up.
                        Err(e) => {
                            error!("Giving up accepting connections: {}", e);
                            return Err(e.into());
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping listener");
                    break;
                }
            }
        }

        Ok(())
    }
}
