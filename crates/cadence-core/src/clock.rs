//! # Quantum Clock
//!
//! Monotonic tick abstraction behind the refill machinery. Production code
//! reads a `quanta`-calibrated clock; tests and simulations inject a
//! settable [`ManualClock`] so refill boundaries can be crossed
//! deterministically.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::SchedulerError;

/// A monotonic clock reading, in source-defined ticks.
pub type Tick = u64;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A monotonic, non-decreasing tick source with a calibrated frequency.
///
/// Wraparound is out of scope: a source must not wrap within a process
/// lifetime.
pub trait TickSource {
    /// Current reading.
    fn now(&self) -> Tick;
    /// Ticks per second. Zero means the source failed calibration and is
    /// rejected at initialization.
    fn ticks_per_second(&self) -> u64;
}

// ─── MonotonicClock ─────────────────────────────────────────────────────────

/// Production tick source backed by `quanta`'s calibrated monotonic clock.
///
/// Ticks are nanoseconds since construction; `quanta` owns the cycle
/// counter calibration and scaling.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    clock: quanta::Clock,
    origin: u64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        let clock = quanta::Clock::new();
        let origin = clock.raw();
        MonotonicClock { clock, origin }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for MonotonicClock {
    fn now(&self) -> Tick {
        self.clock.delta_as_nanos(self.origin, self.clock.raw())
    }

    fn ticks_per_second(&self) -> u64 {
        NANOS_PER_SEC
    }
}

// ─── ManualClock ────────────────────────────────────────────────────────────

/// Settable tick source for deterministic tests and simulations.
///
/// Clones share one underlying counter, so a test can keep a handle and
/// advance time while the dispatcher owns another handle.
#[derive(Debug, Clone)]
pub struct ManualClock {
    ticks: Arc<AtomicU64>,
    tps: u64,
}

impl ManualClock {
    pub fn new(ticks_per_second: u64) -> Self {
        ManualClock {
            ticks: Arc::new(AtomicU64::new(0)),
            tps: ticks_per_second,
        }
    }

    pub fn advance(&self, ticks: Tick) {
        self.ticks.fetch_add(ticks, Ordering::SeqCst);
    }

    pub fn set(&self, tick: Tick) {
        self.ticks.store(tick, Ordering::SeqCst);
    }
}

impl TickSource for ManualClock {
    fn now(&self) -> Tick {
        self.ticks.load(Ordering::SeqCst)
    }

    fn ticks_per_second(&self) -> u64 {
        self.tps
    }
}

// ─── QuantumClock ───────────────────────────────────────────────────────────

/// Converts the configured quantum duration into ticks once at
/// initialization, then answers "now" and deadline queries for the refill
/// machinery.
#[derive(Debug)]
pub struct QuantumClock<C> {
    source: C,
    ticks_per_quantum: Tick,
}

impl<C: TickSource> QuantumClock<C> {
    /// Fails if the source is uncalibrated or the quantum resolves to zero
    /// ticks at the source's resolution.
    pub fn new(quantum: Duration, source: C) -> Result<Self, SchedulerError> {
        let tps = source.ticks_per_second();
        if tps == 0 {
            return Err(SchedulerError::UncalibratedClock);
        }
        let ticks = quantum.as_nanos().saturating_mul(tps as u128) / NANOS_PER_SEC as u128;
        if ticks == 0 || ticks > Tick::MAX as u128 {
            return Err(SchedulerError::InvalidQuantum(quantum));
        }
        Ok(QuantumClock {
            source,
            ticks_per_quantum: ticks as Tick,
        })
    }

    pub fn now(&self) -> Tick {
        self.source.now()
    }

    /// True iff the current reading is at or past `deadline`.
    pub fn due(&self, deadline: Tick) -> bool {
        self.now() >= deadline
    }

    pub fn ticks_per_quantum(&self) -> Tick {
        self.ticks_per_quantum
    }

    /// Deadline one quantum from now.
    pub fn next_deadline(&self) -> Tick {
        self.now().saturating_add(self.ticks_per_quantum)
    }
}
