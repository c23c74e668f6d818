//! # Power Manager
//!
//! System-wide power transition coordination and the deadlock monitor
//! that rides its heartbeat.
//!
//! ## Philosophy
//!
//! - **Order is the contract**: powering up walks drivers before tasks,
//!   high power priority first; powering down walks tasks before drivers,
//!   low priority first. Every consumer can rely on its dependencies being
//!   awake before it is told to wake.
//! - **Acknowledged, not broadcast**: each task is notified through a
//!   bounded synchronous round-trip and the sweep stops at the first
//!   refusal or timeout. A transition either completes or rolls back.
//! - **The monitor is a heuristic**: CPU-delta sampling cannot prove a
//!   livelock, it can only break the most likely offender. It errs on the
//!   side of a countdown and exactly one kill.
//!
//! ## Key Types
//!
//! - [`PowerCoordinator`]: drives transitions and the heartbeat
//! - [`SystemHealth`]: `Nominal` until a rollback fails
//! - [`DeadlockMonitor`]: the busy-task breaker

pub mod coordinator;
pub mod monitor;

pub use coordinator::{CoordinatorConfig, PowerCoordinator, SystemHealth};
pub use monitor::{DeadlockMonitor, MonitorConfig};
