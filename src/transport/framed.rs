//! Delimiter-framed message transport
//!
//! Wraps any bidirectional async byte stream and delivers discrete messages
//! terminated by [`DELIMITER`](crate::protocol::DELIMITER), enforcing a
//! per-call maximum length and a read timeout. This is the lowest layer of
//! the protocol stack; everything above it (recharge handling,
//! authentication, navigation) goes through [`FramedTransport::receive`] and
//! [`FramedTransport::send`].

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::error::SessionError;
use crate::protocol::DELIMITER;

/// Size of each chunk read from the stream while searching for the delimiter.
const READ_CHUNK: usize = 64;

/// A framed message transport over an arbitrary async byte stream.
///
/// `remainder` holds bytes already read past the previous message's
/// delimiter; it never itself contains the delimiter (if it did, the prior
/// `receive` would have split on it and consumed it).
pub struct FramedTransport<S> {
    stream: S,
    remainder: Vec<u8>,
    read_timeout: Duration,
}

impl<S> FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        FramedTransport {
            stream,
            remainder: Vec::new(),
            read_timeout: Duration::from_secs(crate::protocol::NORMAL_TIMEOUT_SECS),
        }
    }

    pub fn set_read_timeout(&mut self, d: Duration) {
        self.read_timeout = d;
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Returns the next complete message, without the delimiter.
    ///
    /// Reads in [`READ_CHUNK`]-sized pieces, appending to a buffer seeded
    /// with `remainder`, searching for the delimiter after each read.
    /// Fails with [`SessionError::Syntax`] if the buffer reaches `max_len`
    /// bytes without finding one; fails with [`SessionError::Transport`] if
    /// the peer closes the stream or the read times out.
    pub async fn receive(&mut self, max_len: usize) -> Result<Vec<u8>, SessionError> {
        let mut buf = std::mem::take(&mut self.remainder);

        loop {
            if let Some(pos) = find_delimiter(&buf) {
                let message = buf[..pos].to_vec();
                self.remainder = buf[pos + DELIMITER.len()..].to_vec();
                return Ok(message);
            }

            if buf.len() >= max_len {
                // Put back what we read so a caller that extends max_len
                // (recharge prefix handling) doesn't lose bytes.
                self.remainder = buf;
                return Err(SessionError::syntax(
                    "message too long or missing delimiter",
                ));
            }

            let mut chunk = vec![0u8; READ_CHUNK.min(max_len - buf.len())];
            let n = match timeout(self.read_timeout, self.stream.read(&mut chunk)).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(SessionError::from(e)),
                Err(_) => return Err(SessionError::transport("read timed out")),
            };

            if n == 0 {
                return Err(SessionError::transport("peer closed the connection"));
            }

            buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Writes all bytes of `payload`, retrying on short writes.
    pub async fn send(&mut self, payload: &[u8]) -> Result<(), SessionError> {
        let mut sent = 0;
        while sent < payload.len() {
            let n = self
                .stream
                .write(&payload[sent..])
                .await
                .map_err(SessionError::from)?;
            if n == 0 {
                return Err(SessionError::transport("write returned zero bytes"));
            }
            sent += n;
        }
        self.stream.flush().await.map_err(SessionError::from)
    }

    /// True if `buf` is a proper prefix of the `RECHARGING` literal plus
    /// delimiter bytes seen so far — used by the recharge-aware reader to
    /// decide whether to widen the cap before giving up on a short read.
    pub(crate) fn remainder_is_prefix_of_recharging(&self) -> bool {
        is_proper_prefix_of_recharging(&self.remainder)
    }
}

fn find_delimiter(buf: &[u8]) -> Option<usize> {
    buf.windows(DELIMITER.len()).position(|w| w == DELIMITER)
}

pub(crate) fn is_proper_prefix_of_recharging(buf: &[u8]) -> bool {
    if buf.is_empty() || buf.len() >= crate::protocol::RECHARGING.as_bytes().len() {
        return false;
    }
    crate::protocol::RECHARGING.as_bytes().starts_with(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn receives_messages_in_order_with_empty_final_remainder() {
        let (mut client, server) = duplex(4096);
        let mut transport = FramedTransport::new(server);

        client.write_all(b"hello\x07\x08world\x07\x08").await.unwrap();

        let m1 = transport.receive(64).await.unwrap();
        assert_eq!(m1, b"hello");
        let m2 = transport.receive(64).await.unwrap();
        assert_eq!(m2, b"world");
        assert!(transport.remainder.is_empty());
    }

    #[tokio::test]
    async fn receive_splits_across_partial_reads() {
        let (mut client, server) = duplex(4096);
        let mut transport = FramedTransport::new(server);

        tokio::spawn(async move {
            client.write_all(b"ab").await.unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
            client.write_all(b"c\x07\x08").await.unwrap();
        });

        let m = transport.receive(64).await.unwrap();
        assert_eq!(m, b"abc");
    }

    #[tokio::test]
    async fn receive_fails_when_too_long_without_delimiter() {
        let (mut client, server) = duplex(4096);
        let mut transport = FramedTransport::new(server);

        client.write_all(&[b'x'; 25]).await.unwrap();

        let err = transport.receive(20).await.unwrap_err();
        assert!(matches!(err, SessionError::Syntax(_)));
    }

    #[tokio::test]
    async fn receive_fails_when_peer_closes() {
        let (client, server) = duplex(4096);
        drop(client);
        let mut transport = FramedTransport::new(server);

        let err = transport.receive(20).await.unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
    }

    #[tokio::test]
    async fn receive_times_out_when_no_data_arrives() {
        let (_client, server) = duplex(4096);
        let mut transport = FramedTransport::new(server);
        transport.set_read_timeout(Duration::from_millis(20));

        let err = transport.receive(20).await.unwrap_err();
        assert!(matches!(err, SessionError::Transport(_)));
    }
}
