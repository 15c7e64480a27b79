//! # Sockdispatch - SOCKS5 Connection Dispatcher
//!
//! Sockdispatch accepts client connections and spreads their outbound
//! traffic across several uplinks with a deterministic weighted round-robin,
//! for bandwidth bonding across network interfaces or load distribution
//! across backend servers.
//!
//! ## Features
//!
//! - **SOCKS5 Mode**: Negotiates CONNECT requests and dials the target from
//!   the next uplink's local address and network device
//! - **Tunnel Mode**: Skips negotiation and forwards raw connections to the
//!   next uplink's fixed backend
//! - **Contention Ratios**: Each uplink receives `weight` consecutive sessions
//!   before the rotation moves on
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sockdispatch::config::load_config;
//! use sockdispatch::server::run_server;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("sockdispatch.toml")?;
//!     let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     run_server(config, shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Client -> Listener -> Session -> UplinkPool::select -> Dialer -> Target
//!                          \______________ forward ______________/
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod pool;
pub mod relay;
pub mod server;
pub mod socks;
pub mod transport;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use error::{DialError, DispatchError, Socks5Error};
pub use pool::{Uplink, UplinkPool};
pub use server::run_server;

/// Version of the Sockdispatch library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
