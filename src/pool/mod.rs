//! Uplink pool module for Sockdispatch
//!
//! This module holds the configured uplinks and the shared rotation cursor
//! that spreads sessions across them by weighted round robin.

mod selector;
mod uplink;

pub use selector::UplinkPool;
pub use uplink::Uplink;
