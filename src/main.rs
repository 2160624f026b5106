//! Wayfarer - authenticates and navigates remote robot clients
//!
//! This binary accepts TCP connections speaking the robot control
//! protocol: each connecting robot is authenticated against a fixed key
//! table, localized on an integer grid, and driven to the origin before
//! its secret message is retrieved and it is logged out.
//!
//! # Configuration
//!
//! The server can be configured via command-line arguments or environment
//! variables. See [`wayfarer::config::Config`] for all available options.
//!
//! # Example
//!
//! ```bash
//! wayfarer --port 3999 --log-level info
//! ```

use std::sync::Arc;

use anyhow::Result;

use wayfarer::config::Config;
use wayfarer::metrics::Metrics;
use wayfarer::server;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env_and_args()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("wayfarer={}", config.log_level).parse()?),
        )
        .init();

    let metrics = Arc::new(Metrics::new());

    tracing::info!(
        "starting wayfarer on {} (read timeout {}s, recharge timeout {}s)",
        config.addr(),
        config.read_timeout_secs,
        config.recharge_timeout_secs,
    );

    server::serve(&config, metrics).await
}
