//! SOCKS5 module for Sockdispatch
//!
//! This module implements the server side of the SOCKS5 handshake: the
//! greeting, the method selection, the CONNECT request and the fixed-size
//! replies. Only the "no authentication" method and the CONNECT command are
//! supported.

mod consts;
mod negotiate;
mod reply;
mod types;

pub use consts::*;
pub use negotiate::{negotiate, read_greeting, read_request, send_method_selection};
pub use reply::{reply_bytes, send_reply};
pub use types::TargetAddr;
