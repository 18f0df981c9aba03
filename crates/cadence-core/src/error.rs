//! Fatal initialization errors.
//!
//! Everything here aborts construction before any packet is processed —
//! there is no partial or degraded startup. Per-packet outcomes (rejected
//! admissions, backpressure drops) are ordinary enum results on the hot
//! path and never appear in this taxonomy.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("clock reports zero ticks per second")]
    UncalibratedClock,

    #[error("quantum {0:?} resolves to zero clock ticks")]
    InvalidQuantum(Duration),

    #[error("byte quantum must be non-zero")]
    ZeroByteQuantum,

    #[error("rate multiplier slot {slot} is invalid: {value}")]
    InvalidRateMultiplier { slot: usize, value: f64 },

    #[error("too many rate multiplier slots: {0} (max 8)")]
    TooManyRateSlots(usize),

    #[error("at least one band is required")]
    NoBands,

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
