//! Server configuration and CLI argument parsing
//!
//! Configuration is built from CLI arguments with environment-variable
//! fallback (`ROBOTD_` prefix), following the usual precedence: CLI
//! arguments, then environment variables, then defaults.
//!
//! # Example
//!
//! ```bash
//! wayfarer --port 4000 --log-level debug
//! # or
//! export ROBOTD_PORT=4000
//! wayfarer
//! ```

use anyhow::Result;
use clap::Parser;

use crate::protocol::{DEFAULT_HOST, DEFAULT_PORT, NORMAL_TIMEOUT_SECS, RECHARGE_TIMEOUT_SECS};

/// Runtime configuration for the server.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub read_timeout_secs: u64,
    pub recharge_timeout_secs: u64,
    pub log_level: String,
}

/// Command-line arguments, each with a matching `ROBOTD_*` environment
/// variable. CLI arguments take precedence over environment variables.
#[derive(Parser, Debug)]
#[command(
    name = "wayfarer",
    about = "Authenticates and navigates remote robot clients to the origin",
    long_about = "A concurrent TCP server speaking a small text-line protocol: it authenticates \
a connecting robot against a fixed key table, then drives it to the origin via MOVE/TURN \
commands, routing around obstacles discovered as collisions."
)]
pub struct Args {
    #[arg(
        long,
        value_name = "HOST",
        default_value = DEFAULT_HOST,
        env = "ROBOTD_HOST"
    )]
    pub host: String,

    #[arg(
        long,
        value_name = "PORT",
        default_value_t = DEFAULT_PORT,
        env = "ROBOTD_PORT"
    )]
    pub port: u16,

    #[arg(
        long,
        value_name = "SECS",
        help = "Read timeout for ordinary exchanges",
        default_value_t = NORMAL_TIMEOUT_SECS,
        env = "ROBOTD_READ_TIMEOUT_SECS"
    )]
    pub read_timeout_secs: u64,

    #[arg(
        long,
        value_name = "SECS",
        help = "Read timeout while a recharge window is open",
        default_value_t = RECHARGE_TIMEOUT_SECS,
        env = "ROBOTD_RECHARGE_TIMEOUT_SECS"
    )]
    pub recharge_timeout_secs: u64,

    #[arg(
        long,
        value_name = "LEVEL",
        help = "Log level: error, warn, info, debug, trace",
        default_value = "info",
        env = "ROBOTD_LOG_LEVEL"
    )]
    pub log_level: String,
}

impl Config {
    /// Parses CLI arguments (with environment-variable fallback) into a
    /// [`Config`].
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        Ok(Config {
            host: args.host,
            port: args.port,
            read_timeout_secs: args.read_timeout_secs,
            recharge_timeout_secs: args.recharge_timeout_secs,
            log_level: args.log_level,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
