//! Recharge-aware reader
//!
//! Interposes handling of the `RECHARGING` / `FULL POWER` bracket that a
//! robot may emit before *any* expected message. Centralizing this here
//! means every higher layer (authentication, navigation) calls
//! [`RechargeAwareReader::read_expected`] instead of re-checking for the
//! token at each call site.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::SessionError;
use crate::protocol::{self, FULL_POWER, MAX_FULL_POWER, MAX_RECHARGING_TOKEN, RECHARGING};
use crate::transport::framed::FramedTransport;

pub struct RechargeAwareReader<S> {
    inner: FramedTransport<S>,
    normal_timeout: Duration,
    recharge_timeout: Duration,
}

impl<S> RechargeAwareReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Builds a reader using the protocol's default timeouts.
    pub fn new(stream: S) -> Self {
        Self::with_timeouts(
            stream,
            Duration::from_secs(protocol::NORMAL_TIMEOUT_SECS),
            Duration::from_secs(protocol::RECHARGE_TIMEOUT_SECS),
        )
    }

    /// Builds a reader using caller-supplied timeouts, e.g. from
    /// [`crate::config::Config`].
    pub fn with_timeouts(stream: S, normal_timeout: Duration, recharge_timeout: Duration) -> Self {
        let mut inner = FramedTransport::new(stream);
        inner.set_read_timeout(normal_timeout);
        RechargeAwareReader {
            inner,
            normal_timeout,
            recharge_timeout,
        }
    }

    pub async fn send(&mut self, payload: &[u8]) -> Result<(), SessionError> {
        self.inner.send(payload).await
    }

    /// Reads the next message the caller expects, transparently handling an
    /// interposed recharge bracket.
    ///
    /// 1. Performs a framed `receive(max_len)`.
    /// 2. If the payload is exactly `RECHARGING`, switches to the recharge
    ///    timeout, reads the next message capped at [`MAX_FULL_POWER`], and
    ///    requires it to be exactly `FULL POWER` (else [`SessionError::Logic`]).
    ///    Then restores the normal timeout and recurses to read the
    ///    originally expected message.
    /// 3. If the payload is `FULL POWER` outside a recharge window, that is
    ///    a [`SessionError::Logic`] too.
    /// 4. Otherwise returns the payload.
    pub async fn read_expected(&mut self, max_len: usize) -> Result<Vec<u8>, SessionError> {
        let payload = self.receive_possibly_widened(max_len).await?;

        if payload == RECHARGING.as_bytes() {
            self.inner.set_read_timeout(self.recharge_timeout);
            let reply = self.inner.receive(MAX_FULL_POWER).await;
            self.inner.set_read_timeout(self.normal_timeout);

            let reply = reply?;
            if reply != FULL_POWER.as_bytes() {
                return Err(SessionError::logic(
                    "expected FULL POWER to end a recharge window",
                ));
            }

            return Box::pin(self.read_expected(max_len)).await;
        }

        if payload == FULL_POWER.as_bytes() {
            return Err(SessionError::logic(
                "received FULL POWER outside a recharge window",
            ));
        }

        Ok(payload)
    }

    /// Reads a single framed message, widening the cap to
    /// [`MAX_RECHARGING_TOKEN`] if a short `max_len` would otherwise cut off
    /// a buffered proper prefix of `RECHARGING` before its delimiter.
    async fn receive_possibly_widened(&mut self, max_len: usize) -> Result<Vec<u8>, SessionError> {
        match self.inner.receive(max_len).await {
            Err(SessionError::Syntax(_))
                if max_len < MAX_RECHARGING_TOKEN
                    && self.inner.remainder_is_prefix_of_recharging() =>
            {
                self.inner.receive(MAX_RECHARGING_TOKEN).await
            }
            other => other,
        }
    }

    pub fn read_timeout(&self) -> Duration {
        self.inner.read_timeout()
    }
}

/// Builds the `OK <x> <y>` etc. literal message constants from
/// [`protocol`] into framed bytes, re-exported here for convenience of
/// callers that only import the reader.
pub use protocol::framed;
