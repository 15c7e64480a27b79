//! Server module for Sockdispatch
//!
//! This module wires the configuration into a listener, an uplink pool and
//! a session controller, then runs the accept loop.

#[allow(clippy::module_inception)]
mod server;
mod session;

pub use server::Server;
pub use session::SessionController;

use crate::config::{build_pool, Config, Mode};
use crate::transport::{Dialer, SocketOpts};
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Run the dispatcher with the given configuration
///
/// Configuration errors are returned before the listener is bound.
pub async fn run_server(config: Config, shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
    let listen_addr = config
        .server
        .listen_addr()
        .with_context(|| "Invalid listen address")?;
    let pool = build_pool(&config).with_context(|| "Invalid uplink configuration")?;

    for (index, uplink) in pool.iter().enumerate() {
        info!(
            "Uplink {}: {} ({}) with contention ratio {}",
            index + 1,
            uplink,
            uplink.interface().unwrap_or("no interface"),
            uplink.weight()
        );
    }

    let socket_opts = SocketOpts::from_tcp_config(&config.tcp);
    let controller = SessionController::new(
        config.server.mode,
        Arc::new(pool),
        Dialer::new(socket_opts.clone()),
        config.socks.clone(),
    );

    let server = Server::bind(SocketAddr::V4(listen_addr), controller, socket_opts)
        .await
        .with_context(|| format!("Failed to listen on {}", listen_addr))?;

    info!(
        "{} server listening on {}",
        match config.server.mode {
            Mode::Socks => "SOCKS5",
            Mode::Tunnel => "Tunnel",
        },
        listen_addr
    );

    server.run(shutdown_rx).await
}
