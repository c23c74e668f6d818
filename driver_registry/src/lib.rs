//! # Driver Registry
//!
//! Uniform lifecycle for every peripheral driver in the system.
//!
//! ## Philosophy
//!
//! - **One lifecycle, many drivers**: every driver moves through
//!   registered → initialized → open, with refcounted ownership and
//!   idempotent init, regardless of what hardware sits underneath.
//! - **Handles cannot dangle**: registry handles carry a slot generation;
//!   a handle to an unregistered driver fails with `InvalidRef` instead of
//!   reaching freed state.
//! - **Two-level locking**: one registry mutex serializes structural
//!   changes, one mutex per record serializes that driver's state. Two
//!   unrelated drivers never contend.
//!
//! ## Key Types
//!
//! - [`DriverOps`]: the capability set a concrete driver implements
//! - [`DriverRegistry`]: the mutex-protected record collection
//! - [`DriverStats`]: per-driver statistics, the error-observability surface

pub mod ops;
pub mod record;
pub mod registry;

pub use ops::{DriverOps, IoRequest};
pub use record::{DriverStats, InitOutcome, LifecycleFlags};
pub use registry::{DriverRegistry, SortOrder};
