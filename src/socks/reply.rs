//! SOCKS5 reply builder
//!
//! Every reply has the same 10-byte shape. The bound address is always
//! reported as `0.0.0.0:0`.
//!
//! ```text
//! +----+-----+-------+------+----------+----------+
//! |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
//! +----+-----+-------+------+----------+----------+
//! | 5  |  1  | X'00' |  1   | 0.0.0.0  |    0     |
//! +----+-----+-------+------+----------+----------+
//! ```

use super::consts::*;
use crate::error::ReplyStatus;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Encode the reply for `status`
pub fn reply_bytes(status: ReplyStatus) -> [u8; SOCKS5_REPLY_LEN] {
    [
        SOCKS5_VERSION,
        status.into(),
        SOCKS5_RESERVED,
        SOCKS5_ADDR_TYPE_IPV4,
        0,
        0,
        0,
        0,
        0,
        0,
    ]
}

/// Write the reply for `status` and flush
pub async fn send_reply<S>(stream: &mut S, status: ReplyStatus) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(&reply_bytes(status)).await?;
    stream.flush().await
}
