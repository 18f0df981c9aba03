//! # Packet
//!
//! The unit of work flowing through the dispatcher. The payload is opaque
//! to the scheduler; only its length and the requested priority influence
//! admission and service decisions.

use bytes::Bytes;

/// Opaque host-assigned flow handle.
///
/// The dispatcher never interprets this — it exists so the host can
/// correlate a downgrade notice back to the flow that should start
/// classification at the lowered priority.
pub type FlowId = u64;

/// An outbound packet handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Serialized wire bytes.
    pub payload: Bytes,
    /// Requested priority ordinal. Clamped into the configured band range
    /// at classification; never an error.
    pub priority: u8,
    /// Flow handle, if the host tracks flows.
    pub flow: Option<FlowId>,
}

impl Packet {
    pub fn new(payload: Bytes, priority: u8) -> Self {
        Packet {
            payload,
            priority,
            flow: None,
        }
    }

    pub fn with_flow(mut self, flow: FlowId) -> Self {
        self.flow = Some(flow);
        self
    }

    /// On-wire length used for budget accounting.
    pub fn wire_len(&self) -> usize {
        self.payload.len()
    }
}
