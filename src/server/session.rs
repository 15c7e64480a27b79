//! Per-connection session handling
//!
//! A session owns one accepted client connection. In SOCKS mode it runs
//! negotiation, picks an uplink, dials the requested target and forwards.
//! In tunnel mode it skips negotiation and dials the uplink's own backend.

use crate::config::{Mode, SocksConfig};
use crate::error::{DispatchError, ReplyStatus};
use crate::pool::UplinkPool;
use crate::relay::forward;
use crate::socks::{negotiate, send_reply};
use crate::transport::Dialer;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

/// Shared state every session needs
#[derive(Debug, Clone)]
pub struct SessionController {
    mode: Mode,
    pool: Arc<UplinkPool>,
    dialer: Dialer,
    socks: SocksConfig,
}

impl SessionController {
    /// Create a controller for `mode`
    pub fn new(mode: Mode, pool: Arc<UplinkPool>, dialer: Dialer, socks: SocksConfig) -> Self {
        SessionController {
            mode,
            pool,
            dialer,
            socks,
        }
    }

    /// Uplink pool shared by all sessions
    pub fn pool(&self) -> &Arc<UplinkPool> {
        &self.pool
    }

    /// Run one session to completion
    pub async fn handle<S>(&self, stream: S) -> Result<(), DispatchError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        match self.mode {
            Mode::Socks => self.handle_socks(stream).await,
            Mode::Tunnel => self.handle_tunnel(stream).await,
        }
    }

    /// SOCKS5 session: negotiate, dial through the next uplink, reply, forward
    ///
    /// The uplink is selected only after negotiation succeeds, so malformed
    /// clients never advance the rotation.
    pub async fn handle_socks<S>(&self, mut stream: S) -> Result<(), DispatchError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let target = negotiate(&mut stream, &self.socks).await?;

        let uplink = self.pool.select();
        let outbound = match self.dialer.dial(Some(&target), &uplink).await {
            Ok(outbound) => outbound,
            Err(e) => {
                warn!("{} -> {} {}", target, uplink, e);
                let reply = send_reply(&mut stream, ReplyStatus::NetworkUnreachable).await;
                if let Err(write_err) = reply {
                    debug!("Failed to send failure reply: {}", write_err);
                }
                return Err(e.into());
            }
        };

        send_reply(&mut stream, ReplyStatus::Success).await?;
        debug!("{} -> {}", target, uplink);

        forward(stream, outbound).await;
        Ok(())
    }

    /// Tunnel session: dial the next uplink's backend and forward raw bytes
    pub async fn handle_tunnel<S>(&self, stream: S) -> Result<(), DispatchError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let uplink = self.pool.select();
        let outbound = match self.dialer.dial(None, &uplink).await {
            Ok(outbound) => outbound,
            Err(e) => {
                warn!("{} {}", uplink, e);
                return Err(e.into());
            }
        };

        debug!("Tunnelled to {}", uplink);

        forward(stream, outbound).await;
        Ok(())
    }
}
