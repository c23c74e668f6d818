//! Heap message envelopes.

use core_types::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// First message id available to application code; everything below is
/// reserved for the system.
pub const MESSAGE_ID_USER_BASE: u32 = 32;

/// A heap-allocated message.
///
/// Ownership follows Rust rules: the envelope is moved onto the queue and
/// moved out to the consumer, which replaces the original's free-exactly-once
/// discipline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Task that sent the message
    pub source: TaskId,
    /// Application message id, `MESSAGE_ID_USER_BASE` and up
    pub id: u32,
    /// Serialized payload bytes
    pub payload: Vec<u8>,
}

impl Message {
    /// Creates a message from raw payload bytes
    pub fn new(source: TaskId, id: u32, payload: Vec<u8>) -> Self {
        debug_assert!(id >= MESSAGE_ID_USER_BASE, "ids below 32 are reserved");
        Self { source, id, payload }
    }

    /// Creates a message by serializing a typed payload
    pub fn encode<T: Serialize>(
        source: TaskId,
        id: u32,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(source, id, serde_json::to_vec(payload)?))
    }

    /// Deserializes the payload into a typed value
    pub fn decode<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    /// Returns the payload size in bytes
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Msg({} from {}, {} bytes)", self.id, self.source, self.size())
    }
}
