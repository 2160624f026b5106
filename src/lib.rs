//! # Wayfarer
//!
//! A concurrent TCP server that authenticates remote "robot" clients and
//! navigates them across an integer grid to the origin.
//!
//! ## Protocol shape
//!
//! Each connection is a single session:
//!
//! 1. **Authenticate** ([`auth`]) — a hash-based mutual key exchange
//!    against a fixed, read-only key table.
//! 2. **Localize and navigate** ([`navigator`], built on [`geometry`]) —
//!    two probe moves establish position and facing, then an online
//!    planner drives the robot to `(0, 0)`, discovering obstacles as moves
//!    that don't change position.
//! 3. **Pick up and log out** ([`session`]) — retrieve a secret message and
//!    close the connection.
//!
//! Every read a session performs may be preceded by the robot announcing
//! `RECHARGING`, in which case the server extends its read timeout until
//! `FULL POWER` arrives ([`transport::recharge`]).
//!
//! ## Layering
//!
//! [`transport::framed`] (delimiter framing) underlies
//! [`transport::recharge`] (the recharge bracket) underlies [`auth`] and
//! [`navigator`], which [`session`] composes into a full connection
//! lifecycle. [`server`] is the only layer that touches a real TCP socket;
//! everything else is generic over any `AsyncRead + AsyncWrite` stream,
//! which is what lets the test suite drive full sessions over in-memory
//! `tokio::io::duplex` pairs.

pub mod auth;
pub mod config;
pub mod error;
pub mod geometry;
pub mod metrics;
pub mod navigator;
pub mod protocol;
pub mod server;
pub mod session;
pub mod transport;
