//! # Core Types
//!
//! This crate defines the fundamental types shared by every layer of Osprey.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: handles carry generations, statuses carry
//!   codes; nothing is a bare pointer or a magic integer.
//! - **Type safety first**: a task id cannot be confused with a driver
//!   handle, a power state cannot be confused with a status.
//! - **Wire honesty**: types that travel inside a packed signal word are
//!   sized for the bits the wire actually reserves for them.
//!
//! ## Key Types
//!
//! - [`TaskId`]: wire-width identifier for a kernel task
//! - [`DriverHandle`]: generation-checked handle into the driver registry
//! - [`Status`]: the flat, module-offset status enumeration
//! - [`PowerState`]: the system/driver power level carried in power signals

pub mod ids;
pub mod power;
pub mod status;

pub use ids::{DriverHandle, TaskId};
pub use power::PowerState;
pub use status::Status;
