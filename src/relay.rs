//! Bidirectional forwarding
//!
//! Copies bytes between a client connection and its outbound connection
//! until either direction ends, then closes both.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Relay data bidirectionally between two streams
///
/// Returns as soon as either direction reaches EOF or fails. Both write
/// halves are shut down before returning and both streams are dropped, so
/// the peer of each side observes the close.
pub async fn forward<A, B>(a: A, b: B)
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let (mut a_read, mut a_write) = tokio::io::split(a);
    let (mut b_read, mut b_write) = tokio::io::split(b);

    {
        let a_to_b = tokio::io::copy(&mut a_read, &mut b_write);
        let b_to_a = tokio::io::copy(&mut b_read, &mut a_write);

        tokio::select! {
            result = a_to_b => {
                match result {
                    Ok(bytes) => debug!("Client->uplink finished: {} bytes", bytes),
                    Err(e) => debug!("Client->uplink error: {}", e),
                }
            }
            result = b_to_a => {
                match result {
                    Ok(bytes) => debug!("Uplink->client finished: {} bytes", bytes),
                    Err(e) => debug!("Uplink->client error: {}", e),
                }
            }
        }
    }

    let _ = a_write.shutdown().await;
    let _ = b_write.shutdown().await;
}
