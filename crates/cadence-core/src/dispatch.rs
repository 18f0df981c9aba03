//! # Priority Dispatcher
//!
//! Strict-priority service over an ordered array of band queues. Enqueue
//! classifies by clamped priority and runs the admission/downgrade
//! protocol; dequeue drains the highest available non-empty band before
//! inspecting any lower one. All operations are synchronous and bounded —
//! the dispatcher is built for a single dispatch path per device queue and
//! takes `&mut self` throughout. A host driving ingress and egress from
//! different threads wraps the dispatcher in its own mutex.

use tracing::{debug, trace};

use crate::band::{Admission, BandQueue};
use crate::clock::{QuantumClock, TickSource};
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::packet::Packet;
use crate::rates::{RateTable, MAX_BANDS};
use crate::stats::DispatcherReport;

// ─── Availability ───────────────────────────────────────────────────────────

/// Per-band transmit-path backpressure signal, supplied by the host.
///
/// An unavailable band is skipped entirely during dequeue and peek, so a
/// stalled path cannot starve otherwise-ready lower-priority traffic
/// behind it.
pub trait BandAvailability {
    fn band_available(&self, band: usize) -> bool;
}

/// Availability predicate for hosts without per-band backpressure.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAvailable;

impl BandAvailability for AlwaysAvailable {
    fn band_available(&self, _band: usize) -> bool {
        true
    }
}

// ─── Enqueue Outcome ────────────────────────────────────────────────────────

/// Outcome of an enqueue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Admitted to `band`. When admission succeeded only after
    /// downgrading, `reclassify_to` carries the lowered priority the host
    /// should apply to future packets of the same flow, so a persistently
    /// congested flow stops re-attempting a failing high band.
    Queued {
        band: usize,
        reclassify_to: Option<u8>,
    },
    /// Rejected everywhere it was tried; the packet is gone.
    Dropped,
}

/// Next band in the downgrade ladder. Band 3 steps to band 1, skipping 2;
/// every other band steps down by one.
fn next_band_down(band: usize) -> usize {
    if band == 3 {
        1
    } else {
        band - 1
    }
}

// ─── PriorityDispatcher ─────────────────────────────────────────────────────

/// Strict-priority, quantum-rate-limited egress dispatcher.
///
/// Band index 0 is the lowest priority, `band_count - 1` the highest. The
/// band count and per-band budgets are fixed at construction; only band
/// budgets, backlogs, and diagnostics mutate during packet processing.
#[derive(Debug)]
pub struct PriorityDispatcher<C: TickSource, A: BandAvailability> {
    bands: Vec<BandQueue>,
    clock: QuantumClock<C>,
    avail: A,
    downgrade_enabled: bool,
    qlen: usize,
    downgrades: u64,
}

impl<C: TickSource, A: BandAvailability> PriorityDispatcher<C, A> {
    /// Build a dispatcher with one band per device transmit queue, capped
    /// at [`MAX_BANDS`]. Fails before any packet is processed if the
    /// configuration or clock calibration is invalid.
    pub fn new(
        config: &SchedulerConfig,
        source: C,
        avail: A,
        device_queues: usize,
    ) -> Result<Self, SchedulerError> {
        if device_queues == 0 {
            return Err(SchedulerError::NoBands);
        }
        let band_count = device_queues.min(MAX_BANDS);
        let rates = RateTable::resolve(&config.rate_multipliers, config.byte_quantum)?;
        let clock = QuantumClock::new(config.quantum, source)?;

        let first_deadline = clock.next_deadline();
        let bands: Vec<BandQueue> = (0..band_count)
            .map(|band| {
                let capacity = rates.capacity_for_band(band, band_count);
                debug!(band, capacity, "band initialized");
                BandQueue::new(capacity, first_deadline)
            })
            .collect();

        Ok(PriorityDispatcher {
            bands,
            clock,
            avail,
            downgrade_enabled: config.auto_downgrade,
            qlen: 0,
            downgrades: 0,
        })
    }

    /// Number of configured bands.
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Total backlog across all bands.
    pub fn len(&self) -> usize {
        self.qlen
    }

    pub fn is_empty(&self) -> bool {
        self.qlen == 0
    }

    /// Clamp a requested priority into the configured band range.
    pub fn classify(&self, packet: &Packet) -> usize {
        (packet.priority as usize).min(self.bands.len() - 1)
    }

    /// Admit `packet` to its classified band, retrying at successively
    /// lower bands when auto-downgrade is enabled. Performs at most one
    /// admission attempt per band.
    pub fn enqueue(&mut self, packet: Packet) -> EnqueueOutcome {
        let mut band = self.classify(&packet);
        trace!(priority = packet.priority, band, "classified");

        let mut packet = match self.bands[band].admit(packet, &self.clock) {
            Admission::Admitted => {
                self.qlen += 1;
                self.assert_conserved();
                return EnqueueOutcome::Queued {
                    band,
                    reclassify_to: None,
                };
            }
            Admission::Rejected(p) => p,
        };

        while self.downgrade_enabled && band > 0 {
            let from = band;
            band = next_band_down(band);
            debug!(from, to = band, len = packet.wire_len(), "downgrading");

            packet = match self.bands[band].admit(packet, &self.clock) {
                Admission::Admitted => {
                    self.qlen += 1;
                    self.downgrades += 1;
                    self.assert_conserved();
                    return EnqueueOutcome::Queued {
                        band,
                        reclassify_to: Some(band as u8),
                    };
                }
                Admission::Rejected(p) => p,
            };
        }

        self.assert_conserved();
        EnqueueOutcome::Dropped
    }

    /// Remove and return the head of the highest available non-empty band.
    pub fn dequeue(&mut self) -> Option<Packet> {
        for band in (0..self.bands.len()).rev() {
            if !self.avail.band_available(band) {
                continue;
            }
            if self.bands[band].peek_head().is_none() {
                continue;
            }
            let packet = self.bands[band].pop_head();
            self.qlen -= 1;
            trace!(band, qlen = self.qlen, "dequeued");
            self.assert_conserved();
            return packet;
        }
        None
    }

    /// Head of the highest available non-empty band, without removal.
    pub fn peek(&self) -> Option<&Packet> {
        self.bands
            .iter()
            .enumerate()
            .rev()
            .filter(|(band, _)| self.avail.band_available(*band))
            .find_map(|(_, queue)| queue.peek_head())
    }

    /// Shed one packet under global backpressure, lowest band first so
    /// bulk backlog is sacrificed before priority traffic. Returns the
    /// bytes removed, or 0 when every band is empty.
    pub fn drop_one(&mut self) -> usize {
        for band in 0..self.bands.len() {
            if let Some(bytes) = self.bands[band].drop_tail() {
                self.qlen -= 1;
                debug!(band, bytes, "backpressure drop");
                self.assert_conserved();
                return bytes;
            }
        }
        0
    }

    /// Clear every band's backlog. Budgets and refill deadlines are left
    /// untouched.
    pub fn reset(&mut self) {
        for band in &mut self.bands {
            band.clear_backlog();
        }
        self.qlen = 0;
        self.assert_conserved();
    }

    /// Current diagnostic view of every band.
    pub fn snapshot(&self) -> DispatcherReport {
        DispatcherReport {
            band_count: self.bands.len(),
            qlen: self.qlen,
            total_drops: self.bands.iter().map(|b| b.drops()).sum(),
            downgrades: self.downgrades,
            ticks_per_quantum: self.clock.ticks_per_quantum(),
            bands: self
                .bands
                .iter()
                .enumerate()
                .map(|(i, b)| b.report(i))
                .collect(),
        }
    }

    /// Consume the dispatcher and return the final diagnostics for the
    /// host to report. The core performs no I/O.
    pub fn teardown(self) -> DispatcherReport {
        debug!(qlen = self.qlen, "tearing down");
        self.snapshot()
    }

    #[inline]
    fn assert_conserved(&self) {
        debug_assert_eq!(
            self.qlen,
            self.bands.iter().map(|b| b.len()).sum::<usize>()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::SchedulerConfigInput;
    use bytes::Bytes;

    const TPS: u64 = 1_000_000_000;

    fn config(mults: &[f64], byte_quantum: u64, downgrade: bool) -> SchedulerConfig {
        SchedulerConfigInput {
            quantum_us: Some(100),
            byte_quantum: Some(byte_quantum),
            rate_multipliers: mults.to_vec(),
            auto_downgrade: Some(downgrade),
            verbosity: None,
        }
        .resolve()
        .unwrap()
    }

    fn dispatcher(
        mults: &[f64],
        byte_quantum: u64,
        downgrade: bool,
        queues: usize,
    ) -> (PriorityDispatcher<ManualClock, AlwaysAvailable>, ManualClock) {
        let source = ManualClock::new(TPS);
        let handle = source.clone();
        let d = PriorityDispatcher::new(
            &config(mults, byte_quantum, downgrade),
            source,
            AlwaysAvailable,
            queues,
        )
        .unwrap();
        (d, handle)
    }

    fn packet(len: usize, priority: u8) -> Packet {
        Packet::new(Bytes::from(vec![0u8; len]), priority)
    }

    #[test]
    fn band_count_is_capped_at_eight() {
        let (d, _) = dispatcher(&[1.0; 8], 128, false, 64);
        assert_eq!(d.band_count(), MAX_BANDS);
    }

    #[test]
    fn zero_device_queues_is_fatal() {
        let err = PriorityDispatcher::new(
            &config(&[1.0], 128, false),
            ManualClock::new(TPS),
            AlwaysAvailable,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, SchedulerError::NoBands));
    }

    #[test]
    fn classify_clamps_out_of_range_priority() {
        let (d, _) = dispatcher(&[1.0; 4], 128, false, 4);
        assert_eq!(d.classify(&packet(10, 200)), 3);
        assert_eq!(d.classify(&packet(10, 3)), 3);
        assert_eq!(d.classify(&packet(10, 0)), 0);
    }

    #[test]
    fn downgrade_disabled_drops_on_rejection() {
        let (mut d, _) = dispatcher(&[1.0, 100.0], 10, false, 2);
        // Band 1 capacity 10; band 0 capacity 1000 and would have room.
        assert_eq!(d.enqueue(packet(50, 1)), EnqueueOutcome::Dropped);
        assert_eq!(d.len(), 0);
        assert_eq!(d.snapshot().total_drops, 1);
    }

    #[test]
    fn downgrade_ladder_skips_band_two_from_above() {
        // Only band 2 (slot 5) has capacity. Starting above band 3, the
        // ladder runs ...4 → 3 → 1 → 0 and never lands on band 2.
        let mut mults = [0.0; 8];
        mults[5] = 100.0;
        let (mut d, _) = dispatcher(&mults, 128, true, 8);

        assert_eq!(d.enqueue(packet(10, 5)), EnqueueOutcome::Dropped);
        // Direct classification at band 2 still works.
        assert_eq!(
            d.enqueue(packet(10, 2)),
            EnqueueOutcome::Queued {
                band: 2,
                reclassify_to: None
            }
        );
    }

    #[test]
    fn downgrade_lands_on_first_band_with_room() {
        // Band 3 full after one packet; band 2 has plenty.
        let (mut d, _) = dispatcher(&[1.0, 2.0, 4.0, 8.0], 100, true, 4);

        assert_eq!(
            d.enqueue(packet(90, 3)),
            EnqueueOutcome::Queued {
                band: 3,
                reclassify_to: None
            }
        );
        assert_eq!(
            d.enqueue(packet(20, 3)),
            EnqueueOutcome::Queued {
                band: 2,
                reclassify_to: Some(2)
            }
        );
        assert_eq!(d.snapshot().downgrades, 1);
    }

    #[test]
    fn downgrade_exhausting_every_band_drops() {
        let (mut d, _) = dispatcher(&[0.0; 8], 128, true, 8);
        assert_eq!(d.enqueue(packet(1, 7)), EnqueueOutcome::Dropped);
        assert_eq!(d.len(), 0);
        // One rejected attempt per band on the ladder: 7,6,5,4,3,1,0.
        assert_eq!(d.snapshot().total_drops, 7);
    }

    #[test]
    fn reset_clears_backlog_but_not_budgets() {
        let (mut d, _) = dispatcher(&[1.0, 2.0], 100, false, 2);
        let _ = d.enqueue(packet(30, 1));
        let _ = d.enqueue(packet(30, 0));
        assert_eq!(d.len(), 2);

        let remaining_before: Vec<u64> = d
            .snapshot()
            .bands
            .iter()
            .map(|b| b.remaining_bytes)
            .collect();

        d.reset();
        assert!(d.is_empty());
        assert!(d.dequeue().is_none());
        let remaining_after: Vec<u64> = d
            .snapshot()
            .bands
            .iter()
            .map(|b| b.remaining_bytes)
            .collect();
        assert_eq!(remaining_before, remaining_after);
    }

    #[test]
    fn teardown_reports_band_diagnostics() {
        let (mut d, _) = dispatcher(&[1.0, 2.0], 100, false, 2);
        let _ = d.enqueue(packet(30, 1));
        let _ = d.enqueue(packet(500, 1)); // rejected

        let report = d.teardown();
        assert_eq!(report.band_count, 2);
        assert_eq!(report.qlen, 1);
        assert_eq!(report.total_drops, 1);
        assert_eq!(report.bands[1].backlog_len, 1);
        assert!(report.bands[1].had_drop_since_refill);
        assert_eq!(report.bands[1].cost_samples.len(), 2);
    }
}
