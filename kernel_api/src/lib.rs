//! # Kernel API
//!
//! The contract between the abstraction layer and the underlying kernel.
//!
//! ## Philosophy
//!
//! The kernel is a collaborator, not part of this codebase. The core needs
//! a narrow slice of it: enumerate tasks, put envelopes on their input
//! queues, perform a synchronous signal round-trip, account CPU time, and
//! create/delete execution contexts. [`TaskControl`] captures exactly that
//! slice, so the coordinator can be driven by a simulated kernel in tests
//! and a real one on hardware.
//!
//! ## Non-Goals
//!
//! This is NOT a scheduler interface: quantum, preemption, and context
//! switching stay on the kernel side of the seam.

pub mod error;
pub mod task;
pub mod time;

pub use error::KernelError;
pub use task::{PowerHook, TaskConfig, TaskControl, TaskInfo};
pub use time::{Duration, Instant};
