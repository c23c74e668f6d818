//! Packed signal words.
//!
//! Wire format (32-bit word, MSB first): bit 31 token marker, bits 24-30
//! signal id, bits 16-23 source task id, bits 0-15 payload. The token bit
//! is what distinguished a signal word from a message pointer in firmware
//! images; it is kept so encoded words stay binary-compatible.

use core_types::{PowerState, Status, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token marker distinguishing a signal word from a message pointer.
pub const SIGNAL_TOKEN_BIT: u32 = 1 << 31;

/// A 7-bit signal identifier.
///
/// Ids up to [`SignalId::STANDARD_LAST`] are reserved for the system;
/// application signals are allocated above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalId(u8);

impl SignalId {
    /// Power-change request; payload is the target [`PowerState`]
    pub const POWER: SignalId = SignalId(1);
    /// Power-change acknowledgment; payload is a [`Status`] wire code (0 = ok)
    pub const POWER_ACK: SignalId = SignalId(2);
    /// Heartbeat probe
    pub const PULSE: SignalId = SignalId(3);
    /// Heartbeat reply
    pub const PULSE_ACK: SignalId = SignalId(4);
    /// Timer expiry; payload is the timer id
    pub const TIMER: SignalId = SignalId(5);
    /// A peer task is going away
    pub const TASK_DISCONNECT: SignalId = SignalId(6);

    /// Last reserved id; application signals start above this.
    pub const STANDARD_LAST: u8 = 0x0F;

    /// Creates a signal id, masking to the 7 bits the wire can carry.
    pub const fn new(raw: u8) -> Self {
        Self(raw & 0x7F)
    }

    /// Returns the raw id value
    pub const fn as_raw(&self) -> u8 {
        self.0
    }

    /// Returns true for ids in the reserved range
    pub const fn is_reserved(&self) -> bool {
        self.0 <= Self::STANDARD_LAST
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SignalId::POWER => write!(f, "Power"),
            SignalId::POWER_ACK => write!(f, "PowerAck"),
            SignalId::PULSE => write!(f, "Pulse"),
            SignalId::PULSE_ACK => write!(f, "PulseAck"),
            SignalId::TIMER => write!(f, "Timer"),
            SignalId::TASK_DISCONNECT => write!(f, "TaskDisconnect"),
            SignalId(raw) => write!(f, "Signal({})", raw),
        }
    }
}

/// A fixed-size packed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// What this signal means
    pub id: SignalId,
    /// Task that sent it
    pub source: TaskId,
    /// 16 bits of payload, meaning depends on `id`
    pub payload: u16,
}

impl Signal {
    /// Creates a signal
    pub const fn new(id: SignalId, source: TaskId, payload: u16) -> Self {
        Self { id, source, payload }
    }

    /// Creates a power-change request carrying the target state
    pub const fn power(source: TaskId, target: PowerState) -> Self {
        Self::new(SignalId::POWER, source, target.to_wire())
    }

    /// Creates a power acknowledgment carrying a callback outcome
    pub fn power_ack(source: TaskId, outcome: Result<(), Status>) -> Self {
        let payload = match outcome {
            Ok(()) => 0,
            Err(status) => status.code(),
        };
        Self::new(SignalId::POWER_ACK, source, payload)
    }

    /// Creates a heartbeat probe
    pub const fn pulse(source: TaskId) -> Self {
        Self::new(SignalId::PULSE, source, 0)
    }

    /// Decodes an acknowledgment payload back into a callback outcome.
    ///
    /// Zero means success; an unallocated code is reported as `NoAck`
    /// rather than silently succeeding.
    pub fn ack_outcome(&self) -> Result<(), Status> {
        if self.payload == 0 {
            return Ok(());
        }
        Err(Status::from_code(self.payload).unwrap_or(Status::NoAck))
    }

    /// Packs this signal into its 32-bit wire word.
    pub const fn encode(&self) -> u32 {
        SIGNAL_TOKEN_BIT
            | ((self.id.as_raw() as u32) << 24)
            | ((self.source.as_raw() as u32) << 16)
            | (self.payload as u32)
    }

    /// Unpacks a wire word.
    ///
    /// Returns `None` when the token bit is clear, i.e. the word was not a
    /// signal.
    pub const fn decode(word: u32) -> Option<Signal> {
        if word & SIGNAL_TOKEN_BIT == 0 {
            return None;
        }
        Some(Signal {
            id: SignalId::new(((word >> 24) & 0x7F) as u8),
            source: TaskId::from_raw(((word >> 16) & 0xFF) as u8),
            payload: (word & 0xFFFF) as u16,
        })
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{} -> {:#06x}]", self.id, self.source, self.payload)
    }
}
