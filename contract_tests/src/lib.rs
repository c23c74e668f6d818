//! Cross-crate scenario test utilities.
//!
//! The scenarios in `tests/` exercise the registry, the coordinator, and
//! the simulated kernel together; this crate holds the shared bootstrap
//! and recording helpers they all use.
//!
//! ## Test Philosophy
//!
//! - **Observable order**: drivers and tasks append to one shared event
//!   log, so sweep ordering is asserted directly instead of inferred.
//! - **Deterministic time**: everything runs on the simulated kernel's
//!   virtual clock; no test sleeps or spawns threads.

use core_types::{DriverHandle, PowerState, Status, TaskId};
use driver_registry::{DriverOps, DriverRegistry, IoRequest};
use kernel_api::{TaskConfig, TaskControl};
use power_manager::PowerCoordinator;
use sim_kernel::SimulatedKernel;
use std::sync::{Arc, Mutex};

/// Shared event log: who saw which power state, in order.
pub type EventLog = Arc<Mutex<Vec<(String, PowerState)>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Snapshot of the log for assertions
pub fn events(log: &EventLog) -> Vec<(String, PowerState)> {
    log.lock().expect("event log poisoned").clone()
}

pub fn clear(log: &EventLog) {
    log.lock().expect("event log poisoned").clear();
}

/// A driver that records every `SetPower` it is asked to perform and
/// supplies no read/write capabilities at all.
pub struct RecordingDriver {
    name: String,
    log: EventLog,
}

impl RecordingDriver {
    pub fn new(name: &str, log: EventLog) -> Self {
        Self {
            name: name.to_string(),
            log,
        }
    }
}

impl DriverOps for RecordingDriver {
    fn init(&mut self) -> Result<(), Status> {
        Ok(())
    }
    fn deinit(&mut self) -> Result<(), Status> {
        Ok(())
    }
    fn open(&mut self) -> Result<(), Status> {
        Ok(())
    }
    fn close(&mut self) -> Result<(), Status> {
        Ok(())
    }
    fn ioctl(&mut self, request: IoRequest) -> Result<(), Status> {
        if let IoRequest::SetPower(state) = request {
            self.log
                .lock()
                .expect("event log poisoned")
                .push((self.name.clone(), state));
        }
        Ok(())
    }
}

/// Creates a kernel with a coordinator task, an empty registry, and the
/// coordinator wired to both.
pub fn bootstrap() -> (SimulatedKernel, Arc<DriverRegistry>, PowerCoordinator) {
    let mut kernel = SimulatedKernel::new();
    let coordinator_task = kernel
        .spawn_task(TaskConfig::new("power_coordinator"))
        .expect("failed to spawn coordinator task");
    let registry = Arc::new(DriverRegistry::new());
    let coordinator = PowerCoordinator::new(Arc::clone(&registry), coordinator_task);
    (kernel, registry, coordinator)
}

/// The coordinator's own task id, recovered from the kernel by name
pub fn coordinator_task(kernel: &SimulatedKernel) -> TaskId {
    kernel
        .tasks()
        .into_iter()
        .find(|info| info.name == "power_coordinator")
        .expect("coordinator task missing")
        .id
}

/// Spawns a worker task whose power callback appends to the log and acks
pub fn spawn_worker(
    kernel: &mut SimulatedKernel,
    parent: TaskId,
    name: &str,
    power_priority: u8,
    log: EventLog,
) -> TaskId {
    let hook_name = name.to_string();
    kernel
        .spawn_task(
            TaskConfig::new(name)
                .with_parent(parent)
                .with_power_priority(power_priority)
                .with_power_hook(Arc::new(move |state| {
                    log.lock().expect("event log poisoned").push((hook_name.clone(), state));
                    Ok(())
                })),
        )
        .expect("failed to spawn worker")
}

/// Spawns a worker that refuses one specific power state with `Busy`
pub fn spawn_refusing_worker(
    kernel: &mut SimulatedKernel,
    parent: TaskId,
    name: &str,
    power_priority: u8,
    refused: PowerState,
    log: EventLog,
) -> TaskId {
    let hook_name = name.to_string();
    kernel
        .spawn_task(
            TaskConfig::new(name)
                .with_parent(parent)
                .with_power_priority(power_priority)
                .with_power_hook(Arc::new(move |state| {
                    if state == refused {
                        return Err(Status::Busy);
                    }
                    log.lock().expect("event log poisoned").push((hook_name.clone(), state));
                    Ok(())
                })),
        )
        .expect("failed to spawn worker")
}

/// Registers, initializes, and opens a recording driver, then parks it at
/// `Off` so the next power-up sweep is observable.
pub fn register_driver(
    registry: &DriverRegistry,
    name: &str,
    power_priority: u8,
    log: EventLog,
) -> DriverHandle {
    let handle = registry.register(
        Box::new(RecordingDriver::new(name, log.clone())),
        name,
        power_priority,
    );
    registry.init(handle).expect("driver init failed");
    registry.open(handle).expect("driver open failed");
    registry
        .control(handle, IoRequest::SetPower(PowerState::Off))
        .expect("driver park failed");
    clear(&log);
    handle
}
