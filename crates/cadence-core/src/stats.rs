//! # Scheduler Diagnostics
//!
//! Serializable snapshots of per-band and aggregate scheduler state,
//! drained by the host at teardown (or mid-flight) and reported however it
//! sees fit. The core performs no I/O of its own.

use serde::Serialize;

use crate::clock::Tick;

// ─── Per-Band Report ────────────────────────────────────────────────────────

/// Diagnostic snapshot of a single band.
#[derive(Debug, Clone, Serialize)]
pub struct BandReport {
    /// Band index; 0 is the lowest priority.
    pub band: usize,
    /// Byte budget granted per quantum.
    pub capacity_bytes: u64,
    /// Bytes still admittable in the current quantum.
    pub remaining_bytes: u64,
    /// Admitted, not-yet-dequeued packets.
    pub backlog_len: usize,
    /// Rejected admissions since initialization.
    pub drops: u64,
    /// Whether any packet was rejected in the current quantum.
    pub had_drop_since_refill: bool,
    /// Recent per-admission processing durations, in clock ticks. Ring
    /// order, not arrival order, once the ring has wrapped.
    pub cost_samples: Vec<Tick>,
}

impl BandReport {
    /// Mean admission processing cost over the recorded window.
    pub fn mean_cost_ticks(&self) -> f64 {
        if self.cost_samples.is_empty() {
            0.0
        } else {
            self.cost_samples.iter().sum::<u64>() as f64 / self.cost_samples.len() as f64
        }
    }
}

// ─── Aggregate Report ───────────────────────────────────────────────────────

/// Aggregate dispatcher snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherReport {
    pub band_count: usize,
    /// Total backlog across bands.
    pub qlen: usize,
    /// Rejected admissions summed over bands.
    pub total_drops: u64,
    /// Enqueues that succeeded only after downgrading.
    pub downgrades: u64,
    /// Quantum length in clock ticks.
    pub ticks_per_quantum: Tick,
    pub bands: Vec<BandReport>,
}
