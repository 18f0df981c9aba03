//! # Band Queue
//!
//! One priority band's admission queue: a FIFO backlog gated by a byte
//! budget that refills lazily on a fixed time quantum. The refill check
//! runs at the start of every admission attempt rather than on a timer,
//! so an idle band catches up the first time traffic returns — an idle
//! band has no backlog to penalize, so nothing is lost by the laziness.

use std::collections::VecDeque;

use tracing::trace;

use crate::clock::{QuantumClock, Tick, TickSource};
use crate::packet::Packet;
use crate::stats::BandReport;

/// Slots in the per-band cost sample ring.
pub const COST_RING_LEN: usize = 128;

// ─── CostRing ───────────────────────────────────────────────────────────────

/// Bounded ring of recent per-admission processing durations, in ticks.
///
/// Diagnostic only — admission decisions never read it. Once full, new
/// samples overwrite the oldest slot.
#[derive(Debug, Clone, Default)]
pub struct CostRing {
    samples: Vec<Tick>,
    index: usize,
}

impl CostRing {
    fn record(&mut self, cost: Tick) {
        if self.samples.len() < COST_RING_LEN {
            self.samples.push(cost);
        } else {
            self.samples[self.index] = cost;
        }
        self.index = (self.index + 1) % COST_RING_LEN;
    }

    /// Raw ring contents, in slot order.
    pub fn snapshot(&self) -> Vec<Tick> {
        self.samples.clone()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// ─── Admission ──────────────────────────────────────────────────────────────

/// Outcome of an admission attempt.
///
/// Rejection is an ordinary outcome, never an error: the packet is handed
/// back so the caller can retry it at another band or drop it.
#[derive(Debug)]
pub enum Admission {
    Admitted,
    Rejected(Packet),
}

// ─── BandQueue ──────────────────────────────────────────────────────────────

/// One priority band: a FIFO backlog plus the quantum byte budget that
/// gates admission.
#[derive(Debug)]
pub struct BandQueue {
    /// Budget granted per quantum; fixed after initialization.
    capacity_bytes: u64,
    /// Bytes still admittable in the current quantum.
    remaining_bytes: u64,
    next_refill_deadline: Tick,
    had_drop_since_refill: bool,
    drops: u64,
    backlog: VecDeque<Packet>,
    cost_samples: CostRing,
}

impl BandQueue {
    pub(crate) fn new(capacity_bytes: u64, next_refill_deadline: Tick) -> Self {
        BandQueue {
            capacity_bytes,
            remaining_bytes: capacity_bytes,
            next_refill_deadline,
            had_drop_since_refill: false,
            drops: 0,
            backlog: VecDeque::new(),
            cost_samples: CostRing::default(),
        }
    }

    /// Admit or reject `packet` against the current quantum's budget.
    ///
    /// The refill check runs first, so a packet arriving at or after the
    /// deadline always sees a fresh budget.
    pub fn admit<C: TickSource>(&mut self, packet: Packet, clock: &QuantumClock<C>) -> Admission {
        let start = clock.now();
        self.refill_if_due(clock, start);

        let len = packet.wire_len() as u64;
        if len <= self.remaining_bytes {
            self.backlog.push_back(packet);
            self.remaining_bytes -= len;
            debug_assert!(self.remaining_bytes <= self.capacity_bytes);
            self.cost_samples.record(clock.now().saturating_sub(start));
            return Admission::Admitted;
        }

        self.had_drop_since_refill = true;
        self.drops += 1;
        trace!(
            len,
            remaining = self.remaining_bytes,
            capacity = self.capacity_bytes,
            "admission rejected"
        );
        self.cost_samples.record(clock.now().saturating_sub(start));
        Admission::Rejected(packet)
    }

    fn refill_if_due<C: TickSource>(&mut self, clock: &QuantumClock<C>, now: Tick) {
        if now >= self.next_refill_deadline {
            self.remaining_bytes = self.capacity_bytes;
            self.next_refill_deadline = now.saturating_add(clock.ticks_per_quantum());
            self.had_drop_since_refill = false;
            trace!(
                capacity = self.capacity_bytes,
                deadline = self.next_refill_deadline,
                "budget refilled"
            );
        }
    }

    /// Oldest admitted packet. The budget is untouched: it gates
    /// admission, not service.
    pub fn pop_head(&mut self) -> Option<Packet> {
        self.backlog.pop_front()
    }

    pub fn peek_head(&self) -> Option<&Packet> {
        self.backlog.front()
    }

    /// Remove the most recently admitted packet under external
    /// backpressure and return its length. Tail drop bounds the latency
    /// added to packets already near the head.
    pub fn drop_tail(&mut self) -> Option<usize> {
        self.backlog.pop_back().map(|p| p.wire_len())
    }

    pub fn len(&self) -> usize {
        self.backlog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backlog.is_empty()
    }

    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    pub fn remaining_bytes(&self) -> u64 {
        self.remaining_bytes
    }

    pub fn drops(&self) -> u64 {
        self.drops
    }

    pub(crate) fn clear_backlog(&mut self) {
        self.backlog.clear();
    }

    pub(crate) fn report(&self, band: usize) -> BandReport {
        BandReport {
            band,
            capacity_bytes: self.capacity_bytes,
            remaining_bytes: self.remaining_bytes,
            backlog_len: self.backlog.len(),
            drops: self.drops,
            had_drop_since_refill: self.had_drop_since_refill,
            cost_samples: self.cost_samples.snapshot(),
        }
    }
}
