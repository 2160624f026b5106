//! Connection acceptor
//!
//! Binds a `TcpListener` and hands each accepted socket to an independently
//! spawned task running the [`session`](crate::session) orchestrator. The
//! acceptor loop itself never blocks on session I/O; it is the one
//! long-running task `main` awaits. A second, short-lived task logs a
//! metrics snapshot on a fixed interval for the lifetime of the listener.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::{TcpListener, TcpStream};
use tracing::info;

use crate::config::Config;
use crate::metrics::Metrics;
use crate::session::{run_session, SessionTimeouts};

/// How often [`serve`] logs a metrics snapshot.
const METRICS_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Binds to `addr` and serves connections until an unrecoverable listener
/// error occurs, applying `config`'s timeouts to every accepted session.
pub async fn serve(config: &Config, metrics: Arc<Metrics>) -> Result<()> {
    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    let timeouts = SessionTimeouts {
        normal: Duration::from_secs(config.read_timeout_secs),
        recharge: Duration::from_secs(config.recharge_timeout_secs),
    };

    info!("wayfarer listening on {addr}");

    tokio::spawn(log_metrics_periodically(Arc::clone(&metrics)));

    loop {
        let (socket, peer) = listener.accept().await?;
        socket.set_nodelay(true).ok();
        let metrics = Arc::clone(&metrics);

        tokio::spawn(async move {
            handle_connection(socket, peer, metrics, timeouts).await;
        });
    }
}

/// Logs a [`Metrics::snapshot`] every [`METRICS_LOG_INTERVAL`] for as long
/// as the caller (and thus this task) stays alive.
async fn log_metrics_periodically(metrics: Arc<Metrics>) {
    let mut ticker = tokio::time::interval(METRICS_LOG_INTERVAL);
    ticker.tick().await; // first tick fires immediately; skip it

    loop {
        ticker.tick().await;
        let snapshot = metrics.snapshot();
        info!(
            sessions_accepted = snapshot.sessions_accepted,
            sessions_authenticated = snapshot.sessions_authenticated,
            sessions_reached_goal = snapshot.sessions_reached_goal,
            moves_issued = snapshot.moves_issued,
            collisions_recorded = snapshot.collisions_recorded,
            syntax_errors = snapshot.syntax_errors,
            logic_errors = snapshot.logic_errors,
            transport_errors = snapshot.transport_errors,
            "metrics snapshot",
        );
    }
}

async fn handle_connection(
    socket: TcpStream,
    peer: std::net::SocketAddr,
    metrics: Arc<Metrics>,
    timeouts: SessionTimeouts,
) {
    info!(%peer, "accepted connection");
    run_session(socket, peer, metrics, timeouts).await;
    info!(%peer, "connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream as ClientStream;

    #[tokio::test]
    async fn serve_accepts_and_drives_a_connection() {
        let metrics = Arc::new(Metrics::new());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = Config {
            host: addr.ip().to_string(),
            port: addr.port(),
            read_timeout_secs: 1,
            recharge_timeout_secs: 5,
            log_level: "info".to_string(),
        };
        let metrics_clone = Arc::clone(&metrics);
        tokio::spawn(async move {
            let _ = serve(&config, metrics_clone).await;
        });

        // Give the acceptor a moment to bind.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut client = ClientStream::connect(addr).await.unwrap();
        client.write_all(&[b'x'; 25]).await.unwrap();

        let mut buf = vec![0u8; 64];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"301 SYNTAX ERROR\x07\x08");
    }
}
