//! # IPC
//!
//! Signal and message types carried on task input queues.
//!
//! ## Philosophy
//!
//! The original firmware multiplexed scalars and heap pointers through one
//! word, using the top bit to tell them apart. Here the split is an explicit
//! sum type: [`Envelope`] is either a packed [`Signal`] or a heap
//! [`Message`]. The bit-packed wire form survives only inside `Signal`,
//! where it is an honest wire format with a lossless encode/decode pair.
//!
//! ## Key Types
//!
//! - [`Signal`]: fixed-size notification (id + source + 16-bit payload)
//! - [`Message`]: heap envelope with a typed, serialized payload
//! - [`Envelope`]: what actually travels on a task queue

pub mod message;
pub mod signal;

pub use message::{Message, MESSAGE_ID_USER_BASE};
pub use signal::{Signal, SignalId, SIGNAL_TOKEN_BIT};

use core_types::TaskId;
use serde::{Deserialize, Serialize};

/// One unit of traffic on a task input queue.
///
/// Every task owns exactly one input queue, and both notification styles
/// share it; consumers match on the variant instead of testing a tag bit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Envelope {
    /// Packed scalar notification
    Signal(Signal),
    /// Heap message, owned by whoever holds the envelope
    Message(Message),
}

impl Envelope {
    /// Returns the task that sent this envelope
    pub fn source(&self) -> TaskId {
        match self {
            Envelope::Signal(signal) => signal.source,
            Envelope::Message(message) => message.source,
        }
    }

    /// Returns true for the signal variant
    pub fn is_signal(&self) -> bool {
        matches!(self, Envelope::Signal(_))
    }
}
