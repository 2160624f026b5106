//! Session orchestrator
//!
//! Composes authentication, localization, goal-seeking navigation, and
//! message pickup/logout into a single per-connection flow. This is the
//! only layer that translates a raised [`SessionError`] into a wire reply —
//! lower layers never write an error reply to the socket themselves.

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::auth::{authenticate, AuthOutcome};
use crate::error::{AuthFailureKind, SessionError};
use crate::metrics::Metrics;
use crate::navigator::{find_position_info, get_to_goal, Robot};
use crate::protocol::{
    self, MAX_SECRET_MESSAGE, MSG_GET_MESSAGE, MSG_LOGIC_ERROR, MSG_LOGOUT, MSG_SYNTAX_ERROR,
    NORMAL_TIMEOUT_SECS, RECHARGE_TIMEOUT_SECS,
};
use crate::transport::recharge::RechargeAwareReader;

/// Timeouts applied to every session's transport. Defaults to the protocol's
/// own constants; [`crate::server::serve`] overrides these from
/// [`crate::config::Config`].
#[derive(Debug, Clone, Copy)]
pub struct SessionTimeouts {
    pub normal: Duration,
    pub recharge: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        SessionTimeouts {
            normal: Duration::from_secs(NORMAL_TIMEOUT_SECS),
            recharge: Duration::from_secs(RECHARGE_TIMEOUT_SECS),
        }
    }
}

/// Drives one accepted connection end to end, mapping any error to its wire
/// reply (or to silence, for transport failures) and always returning —
/// the caller is responsible for letting the socket drop afterward.
pub async fn run_session<S>(
    stream: S,
    peer: SocketAddr,
    metrics: Arc<Metrics>,
    timeouts: SessionTimeouts,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    Metrics::inc(&metrics.sessions_accepted);
    let mut reader = RechargeAwareReader::with_timeouts(stream, timeouts.normal, timeouts.recharge);

    match drive_session(&mut reader, &metrics).await {
        Ok(()) => {
            info!(%peer, "session completed");
        }
        Err(SessionError::Syntax(reason)) => {
            Metrics::inc(&metrics.syntax_errors);
            warn!(%peer, %reason, "syntax error, replying and closing");
            let _ = reader.send(&protocol::framed(MSG_SYNTAX_ERROR)).await;
        }
        Err(SessionError::Logic(reason)) => {
            Metrics::inc(&metrics.logic_errors);
            warn!(%peer, %reason, "logic error, replying and closing");
            let _ = reader.send(&protocol::framed(MSG_LOGIC_ERROR)).await;
        }
        Err(SessionError::Auth(_)) => {
            // authenticate() already sent the inline reply (300/303) and
            // drive_session() turns AuthOutcome::Failed into Ok(()) before
            // it ever becomes this variant; this arm exists only to keep
            // the match exhaustive against future AuthFailureKind growth.
            debug!(%peer, "auth failure surfaced as an error unexpectedly");
        }
        Err(SessionError::Transport(reason)) => {
            Metrics::inc(&metrics.transport_errors);
            debug!(%peer, %reason, "transport error, closing without reply");
        }
    }
}

async fn drive_session<S>(
    reader: &mut RechargeAwareReader<S>,
    metrics: &Metrics,
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match authenticate(reader).await? {
        AuthOutcome::Failed(AuthFailureKind::KeyOutOfRange) => {
            Metrics::inc(&metrics.auth_failed_key_out_of_range);
            return Ok(());
        }
        AuthOutcome::Failed(AuthFailureKind::LoginFailed) => {
            Metrics::inc(&metrics.auth_failed_login);
            return Ok(());
        }
        AuthOutcome::Success => {
            Metrics::inc(&metrics.sessions_authenticated);
        }
    }

    let (position, direction, localization_moves) = find_position_info(reader).await?;
    let mut robot = Robot::new(position, direction);

    get_to_goal(reader, &mut robot).await?;

    metrics
        .moves_issued
        .fetch_add(localization_moves + robot.moves_issued, Ordering::Relaxed);
    metrics
        .collisions_recorded
        .fetch_add(robot.collisions.len() as u64, Ordering::Relaxed);
    Metrics::inc(&metrics.sessions_reached_goal);

    reader.send(&protocol::framed(MSG_GET_MESSAGE)).await?;
    let _secret = reader.read_expected(MAX_SECRET_MESSAGE).await?;
    reader.send(&protocol::framed(MSG_LOGOUT)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

    fn test_addr() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[tokio::test]
    async fn full_session_happy_path() {
        let (mut client, server) = duplex(8192);
        let metrics = Arc::new(Metrics::new());

        let handle = tokio::spawn(run_session(
            server,
            test_addr(),
            Arc::clone(&metrics),
            SessionTimeouts::default(),
        ));

        // Auth (scenario S1).
        client.write_all(b"Oompa Loompa\x07\x08").await.unwrap();
        let mut buf = vec![0u8; 64];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"107 KEY REQUEST\x07\x08");

        client.write_all(b"0\x07\x08").await.unwrap();
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"64907\x07\x08");

        client.write_all(b"8389\x07\x08").await.unwrap();
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"200 OK\x07\x08");

        // Localization: two MOVEs straight to the goal.
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"102 MOVE\x07\x08");
        client.write_all(b"OK 1 0\x07\x08").await.unwrap();

        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"102 MOVE\x07\x08");
        client.write_all(b"OK 0 0\x07\x08").await.unwrap();

        // Already at goal: pickup + logout.
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"105 GET MESSAGE\x07\x08");
        client.write_all(b"the secret\x07\x08").await.unwrap();

        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"106 LOGOUT\x07\x08");

        handle.await.unwrap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.sessions_authenticated, 1);
        assert_eq!(snapshot.sessions_reached_goal, 1);
    }

    #[tokio::test]
    async fn key_out_of_range_ends_session_without_escalation() {
        let (mut client, server) = duplex(4096);
        let metrics = Arc::new(Metrics::new());

        let handle = tokio::spawn(run_session(
            server,
            test_addr(),
            Arc::clone(&metrics),
            SessionTimeouts::default(),
        ));

        client.write_all(b"somebot\x07\x08").await.unwrap();
        let mut buf = vec![0u8; 64];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"107 KEY REQUEST\x07\x08");

        client.write_all(b"5\x07\x08").await.unwrap();
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"303 KEY OUT OF RANGE\x07\x08");

        handle.await.unwrap();
        assert_eq!(metrics.snapshot().auth_failed_key_out_of_range, 1);
    }

    #[tokio::test]
    async fn oversized_username_yields_syntax_error() {
        let (mut client, server) = duplex(4096);
        let metrics = Arc::new(Metrics::new());

        let handle = tokio::spawn(run_session(
            server,
            test_addr(),
            Arc::clone(&metrics),
            SessionTimeouts::default(),
        ));

        client.write_all(&[b'x'; 25]).await.unwrap();
        let mut buf = vec![0u8; 64];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"301 SYNTAX ERROR\x07\x08");

        handle.await.unwrap();
        assert_eq!(metrics.snapshot().syntax_errors, 1);
    }

    #[tokio::test]
    async fn navigation_routes_around_a_collision() {
        let (mut client, server) = duplex(8192);
        let metrics = Arc::new(Metrics::new());

        let handle = tokio::spawn(run_session(
            server,
            test_addr(),
            Arc::clone(&metrics),
            SessionTimeouts::default(),
        ));

        // Auth.
        client.write_all(b"bot\x07\x08").await.unwrap();
        let mut buf = vec![0u8; 128];
        client.read(&mut buf).await.unwrap();
        client.write_all(b"1\x07\x08").await.unwrap();
        client.read(&mut buf).await.unwrap();
        let hash = crate::auth::hash(b"bot");
        let client_key = (hash + crate::auth::KEYS[1].client) % 65536;
        client
            .write_all(format!("{client_key}\x07\x08").as_bytes())
            .await
            .unwrap();
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"200 OK\x07\x08");

        // Localization: blocked in front, turn left, then move to (-2, 1)
        // facing (0,1) — scenario S5's setup.
        client.read(&mut buf).await.unwrap(); // MOVE
        client.write_all(b"OK -2 0\x07\x08").await.unwrap();
        client.read(&mut buf).await.unwrap(); // MOVE
        client.write_all(b"OK -2 0\x07\x08").await.unwrap(); // blocked: same pos
        client.read(&mut buf).await.unwrap(); // TURN LEFT
        client.write_all(b"OK\x07\x08").await.unwrap();
        client.read(&mut buf).await.unwrap(); // MOVE
        client.write_all(b"OK -2 1\x07\x08").await.unwrap();

        // Planner wants (-1,1) next; 3 lefts to turn from (0,1) to (1,0).
        for _ in 0..3 {
            let n = client.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"103 TURN LEFT\x07\x08");
            client.write_all(b"OK\x07\x08").await.unwrap();
        }
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"102 MOVE\x07\x08");
        // Blocked: (-1,1) is an obstacle, robot stays at (-2,1).
        client.write_all(b"OK -2 1\x07\x08").await.unwrap();

        // Replans to (-2,0): already facing (1,0), needs 3 more lefts to
        // face (0,-1).
        for _ in 0..3 {
            let n = client.read(&mut buf).await.unwrap();
            assert_eq!(&buf[..n], b"103 TURN LEFT\x07\x08");
            client.write_all(b"OK\x07\x08").await.unwrap();
        }
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"102 MOVE\x07\x08");
        client.write_all(b"OK -2 0\x07\x08").await.unwrap();

        // From (-2,0), the closest neighbour is (-1,0); currently facing
        // (0,-1), needs 1 left to face (1,0).
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"103 TURN LEFT\x07\x08");
        client.write_all(b"OK\x07\x08").await.unwrap();
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"102 MOVE\x07\x08");
        client.write_all(b"OK -1 0\x07\x08").await.unwrap();

        // From (-1,0) straight to goal.
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"102 MOVE\x07\x08");
        client.write_all(b"OK 0 0\x07\x08").await.unwrap();

        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"105 GET MESSAGE\x07\x08");
        client.write_all(b"msg\x07\x08").await.unwrap();
        client.read(&mut buf).await.unwrap(); // LOGOUT

        handle.await.unwrap();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.sessions_reached_goal, 1);
        assert_eq!(snapshot.collisions_recorded, 1);
    }
}
