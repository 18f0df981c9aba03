//! # Rate Table
//!
//! Immutable per-slot byte budgets, derived once from the multiplier table
//! and the byte quantum. Slot 0 carries the smallest multiplier and
//! applies to the highest band: the bounded-latency band trades throughput
//! for latency, and bulk bands do the reverse.

use crate::error::SchedulerError;

/// Hard cap on the number of priority bands.
pub const MAX_BANDS: usize = 8;

/// Immutable mapping from multiplier slot to byte budget per quantum.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    capacities: [u64; MAX_BANDS],
}

impl RateTable {
    /// `capacity[slot] = multipliers[slot] * byte_quantum`, computed once.
    ///
    /// Non-finite or negative multipliers and a zero byte quantum are
    /// fatal. A zero multiplier is valid: the band exists but admits
    /// nothing.
    pub fn resolve(
        multipliers: &[f64; MAX_BANDS],
        byte_quantum: u64,
    ) -> Result<Self, SchedulerError> {
        if byte_quantum == 0 {
            return Err(SchedulerError::ZeroByteQuantum);
        }
        let mut capacities = [0u64; MAX_BANDS];
        for (slot, &value) in multipliers.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(SchedulerError::InvalidRateMultiplier { slot, value });
            }
            let capacity = value * byte_quantum as f64;
            if capacity >= u64::MAX as f64 {
                return Err(SchedulerError::InvalidRateMultiplier { slot, value });
            }
            capacities[slot] = capacity as u64;
        }
        Ok(RateTable { capacities })
    }

    /// Budget for a multiplier slot.
    pub fn capacity_for_slot(&self, slot: usize) -> u64 {
        self.capacities[slot]
    }

    /// Budget for a band index. Slot 0 maps to the highest band, so band
    /// `band_count - 1` is granted the first multiplier's budget.
    pub fn capacity_for_band(&self, band: usize, band_count: usize) -> u64 {
        debug_assert!(band < band_count && band_count <= MAX_BANDS);
        self.capacities[band_count - 1 - band]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_BYTE_QUANTUM, DEFAULT_RATE_MULTIPLIERS};

    #[test]
    fn default_table_scales_by_byte_quantum() {
        let table = RateTable::resolve(&DEFAULT_RATE_MULTIPLIERS, DEFAULT_BYTE_QUANTUM).unwrap();
        assert_eq!(table.capacity_for_slot(0), 128);
        assert_eq!(table.capacity_for_slot(1), 640);
        assert_eq!(table.capacity_for_slot(4), 128_000);
        assert_eq!(table.capacity_for_slot(5), 0);
        assert_eq!(table.capacity_for_slot(7), 1_280_000);
    }

    #[test]
    fn highest_band_gets_first_slot() {
        let mults = [1.0, 2.0, 4.0, 8.0, 0.0, 0.0, 0.0, 0.0];
        let table = RateTable::resolve(&mults, 100).unwrap();
        assert_eq!(table.capacity_for_band(3, 4), 100);
        assert_eq!(table.capacity_for_band(2, 4), 200);
        assert_eq!(table.capacity_for_band(1, 4), 400);
        assert_eq!(table.capacity_for_band(0, 4), 800);
    }

    #[test]
    fn zero_byte_quantum_is_fatal() {
        let err = RateTable::resolve(&DEFAULT_RATE_MULTIPLIERS, 0).unwrap_err();
        assert!(matches!(err, SchedulerError::ZeroByteQuantum));
    }

    #[test]
    fn non_finite_multiplier_is_fatal() {
        let mut mults = DEFAULT_RATE_MULTIPLIERS;
        mults[2] = f64::NAN;
        let err = RateTable::resolve(&mults, 128).unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::InvalidRateMultiplier { slot: 2, .. }
        ));
    }

    #[test]
    fn negative_multiplier_is_fatal() {
        let mut mults = DEFAULT_RATE_MULTIPLIERS;
        mults[0] = -1.0;
        assert!(RateTable::resolve(&mults, 128).is_err());
    }
}
