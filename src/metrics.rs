//! Lightweight in-process metrics
//!
//! Plain atomic counters, no network export surface —
//! [`crate::server::serve`] logs a [`Metrics::snapshot`] on a fixed
//! interval, and tests read the same snapshot directly. Mirrors the
//! counter style of a typical connection-oriented service: one counter
//! per outcome, incremented exactly where that outcome is decided.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counters, shared via `Arc` and mutated with atomics only.
#[derive(Default)]
pub struct Metrics {
    pub sessions_accepted: AtomicU64,
    pub sessions_authenticated: AtomicU64,
    pub auth_failed_key_out_of_range: AtomicU64,
    pub auth_failed_login: AtomicU64,
    pub sessions_reached_goal: AtomicU64,
    pub moves_issued: AtomicU64,
    pub collisions_recorded: AtomicU64,
    pub syntax_errors: AtomicU64,
    pub logic_errors: AtomicU64,
    pub transport_errors: AtomicU64,
}

/// Point-in-time readout of [`Metrics`], used by tests and log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub sessions_accepted: u64,
    pub sessions_authenticated: u64,
    pub auth_failed_key_out_of_range: u64,
    pub auth_failed_login: u64,
    pub sessions_reached_goal: u64,
    pub moves_issued: u64,
    pub collisions_recorded: u64,
    pub syntax_errors: u64,
    pub logic_errors: u64,
    pub transport_errors: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            sessions_accepted: self.sessions_accepted.load(Ordering::Relaxed),
            sessions_authenticated: self.sessions_authenticated.load(Ordering::Relaxed),
            auth_failed_key_out_of_range: self
                .auth_failed_key_out_of_range
                .load(Ordering::Relaxed),
            auth_failed_login: self.auth_failed_login.load(Ordering::Relaxed),
            sessions_reached_goal: self.sessions_reached_goal.load(Ordering::Relaxed),
            moves_issued: self.moves_issued.load(Ordering::Relaxed),
            collisions_recorded: self.collisions_recorded.load(Ordering::Relaxed),
            syntax_errors: self.syntax_errors.load(Ordering::Relaxed),
            logic_errors: self.logic_errors.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
        }
    }
}
