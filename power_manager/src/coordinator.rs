//! The system-wide power transition coordinator.

use core_types::{PowerState, Status, TaskId};
use driver_registry::{DriverRegistry, IoRequest, SortOrder};
use ipc::Signal;
use kernel_api::{Duration, TaskControl, TaskInfo};
use std::sync::Arc;

use crate::monitor::{DeadlockMonitor, MonitorConfig};

/// Coordinator tuning knobs.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long one task gets to acknowledge a power notification
    pub ack_timeout: Duration,
    /// Warnings logged before a shutdown teardown begins
    pub shutdown_countdown: u32,
    /// Ticks between shutdown countdown warnings
    pub countdown_interval_ticks: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_millis(100),
            shutdown_countdown: 3,
            countdown_interval_ticks: 100,
        }
    }
}

/// Coarse system condition after transitions.
///
/// `Degraded` means a transition failed and the rollback to the previous
/// state also failed, so parts of the system may be at mixed power levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemHealth {
    Nominal,
    Degraded,
}

/// Drives system-wide power transitions.
///
/// The coordinator owns the current power state and the deadlock monitor.
/// It is itself a task (so its notifications carry a source id) and is
/// excluded from its own sweeps, as are parentless kernel-internal tasks.
pub struct PowerCoordinator {
    registry: Arc<DriverRegistry>,
    task: TaskId,
    config: CoordinatorConfig,
    monitor: DeadlockMonitor,
    current: PowerState,
    health: SystemHealth,
}

impl PowerCoordinator {
    /// Creates a coordinator with default configuration
    pub fn new(registry: Arc<DriverRegistry>, task: TaskId) -> Self {
        Self::with_config(
            registry,
            task,
            CoordinatorConfig::default(),
            MonitorConfig::default(),
        )
    }

    /// Creates a coordinator with custom tuning
    pub fn with_config(
        registry: Arc<DriverRegistry>,
        task: TaskId,
        config: CoordinatorConfig,
        monitor: MonitorConfig,
    ) -> Self {
        Self {
            registry,
            task,
            config,
            monitor: DeadlockMonitor::new(monitor),
            current: PowerState::Undefined,
            health: SystemHealth::Nominal,
        }
    }

    /// The power state the last successful transition reached
    pub fn current_state(&self) -> PowerState {
        self.current
    }

    pub fn health(&self) -> SystemHealth {
        self.health
    }

    /// The monitor riding this coordinator's heartbeat
    pub fn monitor(&self) -> &DeadlockMonitor {
        &self.monitor
    }

    /// Tasks the coordinator notifies: everything except itself and
    /// parentless kernel-internal tasks.
    fn eligible_tasks(&self, kernel: &dyn TaskControl) -> Vec<TaskInfo> {
        kernel
            .tasks()
            .into_iter()
            .filter(|info| info.id != self.task && info.parent.is_some())
            .collect()
    }

    fn sweep_drivers(&self, target: PowerState) -> Result<(), Status> {
        let order = if target.powers_up() {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        };
        for handle in self.registry.sweep_order(order) {
            match self.registry.control(handle, IoRequest::SetPower(target)) {
                Ok(()) => {}
                // A closed driver or one without power control is simply
                // not part of the sweep.
                Err(Status::NotOpen) | Err(Status::UnsupportedOperation) => {
                    log::debug!("driver {} skipped in {:?} sweep", handle, target);
                }
                Err(status) => {
                    log::warn!(
                        "driver {} refused {:?}: {}, aborting sweep",
                        handle,
                        target,
                        status
                    );
                    return Err(status);
                }
            }
        }
        Ok(())
    }

    fn sweep_tasks(
        &self,
        kernel: &mut dyn TaskControl,
        target: PowerState,
    ) -> Result<(), Status> {
        let mut tasks = self.eligible_tasks(kernel);
        if target.powers_up() {
            // Ties keep id order either way, so repeated sweeps are stable.
            tasks.sort_by_key(|info| (std::cmp::Reverse(info.power_priority), info.id));
        } else {
            tasks.sort_by_key(|info| (info.power_priority, info.id));
        }

        for info in tasks {
            let signal = Signal::power(self.task, target);
            let ack = kernel
                .request(info.id, signal, self.config.ack_timeout)
                .map_err(|err| {
                    log::warn!("{} ({}) did not acknowledge {:?}: {}", info.id, info.name, target, err);
                    err.to_status()
                })?;
            ack.ack_outcome().map_err(|status| {
                log::warn!("{} ({}) refused {:?}: {}", info.id, info.name, target, status);
                status
            })?;

            if target == PowerState::Shutdown {
                // Teardown is immediate once the task has agreed to it.
                if let Err(err) = kernel.delete_task(info.id) {
                    log::warn!("deleting {} after shutdown ack failed: {}", info.id, err);
                }
            }
        }
        Ok(())
    }

    fn run_sweeps(
        &self,
        kernel: &mut dyn TaskControl,
        target: PowerState,
    ) -> Result<(), Status> {
        if target.powers_up() {
            // Dependencies first: hardware must be awake before the tasks
            // that drive it are told to resume.
            self.sweep_drivers(target)?;
            self.sweep_tasks(kernel, target)
        } else {
            if target == PowerState::Shutdown {
                for remaining in (1..=self.config.shutdown_countdown).rev() {
                    log::warn!("shutdown in {}", remaining);
                    kernel.wait_ticks(self.config.countdown_interval_ticks);
                }
            }
            self.sweep_tasks(kernel, target)?;
            self.sweep_drivers(target)
        }
    }

    /// Moves the whole system to `target`.
    ///
    /// On any failure the sweep stops where it is and one rollback to the
    /// previous state is attempted. The original failure is returned; a
    /// rollback that itself fails returns `RollbackFailed` and marks the
    /// system [`SystemHealth::Degraded`].
    pub fn transition(
        &mut self,
        kernel: &mut dyn TaskControl,
        target: PowerState,
    ) -> Result<(), Status> {
        if target == self.current {
            return Ok(());
        }
        log::debug!("power transition {:?} -> {:?}", self.current, target);

        match self.run_sweeps(kernel, target) {
            Ok(()) => {
                self.current = target;
                Ok(())
            }
            Err(status) => {
                if self.current == PowerState::Undefined {
                    // No state was ever established, so there is nothing
                    // coherent to roll back to.
                    log::warn!("initial transition to {:?} failed ({})", target, status);
                    return Err(status);
                }
                log::warn!(
                    "transition to {:?} failed ({}), rolling back to {:?}",
                    target,
                    status,
                    self.current
                );
                match self.run_sweeps(kernel, self.current) {
                    Ok(()) => Err(status),
                    Err(rollback_status) => {
                        self.health = SystemHealth::Degraded;
                        log::error!(
                            "rollback to {:?} failed ({}); system degraded",
                            self.current,
                            rollback_status
                        );
                        Err(Status::RollbackFailed)
                    }
                }
            }
        }
    }

    /// One heartbeat: pulse every eligible task, then let the monitor take
    /// a CPU sample. Returns the task the monitor killed, if any.
    ///
    /// Pulse failures mean a task's queue is not being drained; they are
    /// logged and left for the monitor's CPU evidence to judge.
    pub fn heartbeat(&mut self, kernel: &mut dyn TaskControl) -> Option<TaskId> {
        for info in self.eligible_tasks(kernel) {
            match kernel.request(info.id, Signal::pulse(self.task), self.config.ack_timeout) {
                Ok(_) => {}
                Err(err) => {
                    log::warn!("{} ({}) missed heartbeat: {}", info.id, info.name, err);
                }
            }
        }
        self.monitor.observe(kernel, self.task)
    }
}
