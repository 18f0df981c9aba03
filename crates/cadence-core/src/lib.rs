//! # cadence-core
//!
//! Quantum-paced strict-priority egress scheduling.
//!
//! Outbound packets are partitioned into up to eight ordered priority
//! bands. Each band is granted a byte budget per fixed wall-clock quantum;
//! admission debits the budget, and a lazy refill restores it when the
//! quantum rolls over. Service is strict priority: a higher band's backlog
//! is always drained before any lower band is inspected, except when the
//! higher band's transmit path is stalled. A rejected packet may be
//! retried at successively lower bands (auto-downgrade) instead of being
//! dropped outright.
//!
//! ## Crate structure
//!
//! - [`clock`] — Monotonic tick sources and quantum arithmetic
//! - [`packet`] — The packet unit handed to the dispatcher
//! - [`config`] — TOML input and the resolved immutable configuration
//! - [`rates`] — Multiplier slots → per-band byte budgets
//! - [`band`] — Per-band admission queue with lazy quantum refill
//! - [`dispatch`] — Strict-priority dispatcher and downgrade ladder
//! - [`stats`] — Serializable diagnostic snapshots
//! - [`error`] — Fatal initialization errors

pub mod band;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod packet;
pub mod rates;
pub mod stats;
