//! Unique identifiers for system entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a kernel task.
///
/// Task ids are deliberately one byte wide: the packed signal word reserves
/// exactly eight bits for the source task, so anything wider could not be
/// carried on the wire. The kernel allocates them sequentially.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(u8);

impl TaskId {
    /// Creates a task id from its raw wire value
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Returns the raw wire value
    pub const fn as_raw(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task({})", self.0)
    }
}

/// Generation-checked handle into the driver registry.
///
/// A handle names a slot plus the generation the slot had when the driver
/// was registered. Unregistering bumps the slot generation, so a retained
/// handle goes stale instead of aliasing whatever driver reuses the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DriverHandle {
    index: u32,
    generation: u32,
}

impl DriverHandle {
    /// Creates a handle for a slot at a specific generation
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the slot index
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Returns the slot generation this handle was issued for
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for DriverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Driver({}.{})", self.index, self.generation)
    }
}
