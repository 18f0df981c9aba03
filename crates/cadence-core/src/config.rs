//! # Configuration
//!
//! TOML-facing input structs and the resolved, immutable runtime
//! configuration. The dispatcher consumes only the resolved form —
//! ingestion and validation happen here, once, before any packet is
//! processed.

use std::time::Duration;

use serde::Deserialize;

use crate::error::SchedulerError;
use crate::rates::MAX_BANDS;

/// Default per-slot rate multipliers. Slot 0 applies to the highest band.
pub const DEFAULT_RATE_MULTIPLIERS: [f64; MAX_BANDS] =
    [1.0, 5.0, 10.0, 100.0, 1000.0, 0.0, 0.0, 10000.0];

/// Default byte quantum: bytes granted per multiplier unit per quantum.
pub const DEFAULT_BYTE_QUANTUM: u64 = 128;

/// Default quantum length.
pub const DEFAULT_QUANTUM: Duration = Duration::from_micros(100);

/// Raw TOML-facing configuration. Missing fields take the defaults above.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchedulerConfigInput {
    /// Quantum length in microseconds.
    pub quantum_us: Option<u64>,
    /// Bytes granted per multiplier unit per quantum.
    pub byte_quantum: Option<u64>,
    /// Per-slot rate multipliers, slot 0 = highest band. Up to 8 entries;
    /// unspecified slots keep their defaults.
    pub rate_multipliers: Vec<f64>,
    /// Retry rejected packets at lower bands instead of dropping.
    pub auto_downgrade: Option<bool>,
    /// Diagnostic verbosity (0 = quiet). The host maps this onto its
    /// tracing filter; the core itself emits unconditionally and lets the
    /// subscriber filter.
    pub verbosity: Option<u8>,
}

/// Resolved, immutable scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub quantum: Duration,
    pub byte_quantum: u64,
    pub rate_multipliers: [f64; MAX_BANDS],
    pub auto_downgrade: bool,
    pub verbosity: u8,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            quantum: DEFAULT_QUANTUM,
            byte_quantum: DEFAULT_BYTE_QUANTUM,
            rate_multipliers: DEFAULT_RATE_MULTIPLIERS,
            auto_downgrade: false,
            verbosity: 0,
        }
    }
}

impl SchedulerConfigInput {
    pub fn resolve(self) -> Result<SchedulerConfig, SchedulerError> {
        if self.rate_multipliers.len() > MAX_BANDS {
            return Err(SchedulerError::TooManyRateSlots(self.rate_multipliers.len()));
        }

        let quantum = Duration::from_micros(
            self.quantum_us
                .unwrap_or(DEFAULT_QUANTUM.as_micros() as u64),
        );
        if quantum.is_zero() {
            return Err(SchedulerError::InvalidQuantum(quantum));
        }

        let byte_quantum = self.byte_quantum.unwrap_or(DEFAULT_BYTE_QUANTUM);
        if byte_quantum == 0 {
            return Err(SchedulerError::ZeroByteQuantum);
        }

        let mut rate_multipliers = DEFAULT_RATE_MULTIPLIERS;
        for (slot, value) in self.rate_multipliers.into_iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(SchedulerError::InvalidRateMultiplier { slot, value });
            }
            rate_multipliers[slot] = value;
        }

        Ok(SchedulerConfig {
            quantum,
            byte_quantum,
            rate_multipliers,
            auto_downgrade: self.auto_downgrade.unwrap_or(false),
            verbosity: self.verbosity.unwrap_or(0),
        })
    }
}

impl SchedulerConfig {
    /// Parse and resolve a TOML document. Empty input yields the defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, SchedulerError> {
        if input.trim().is_empty() {
            return Ok(SchedulerConfig::default());
        }
        let parsed: SchedulerConfigInput =
            toml::from_str(input).map_err(|e| SchedulerError::InvalidConfig(e.to_string()))?;
        parsed.resolve()
    }
}
