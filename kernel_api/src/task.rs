//! Task descriptors and the kernel control trait.

use crate::{Duration, Instant, KernelError};
use core_types::{PowerState, Status, TaskId};
use ipc::{Envelope, Signal};
use std::fmt;
use std::sync::Arc;

/// Per-task power callback.
///
/// Invoked transparently by the kernel's receive path when a power-change
/// signal arrives, before ordinary task logic ever sees the queue. Must
/// tolerate being invoked with the same state more than once. Held behind
/// an `Arc` so a task's original configuration stays cloneable for
/// auto-recreate.
pub type PowerHook = Arc<dyn Fn(PowerState) -> Result<(), Status> + Send + Sync>;

/// Descriptor for creating a task.
///
/// Task creation is explicit construction: the caller names the task,
/// places it in the parent tree, and assigns both priorities up front.
/// Scheduling priority orders CPU access; power priority only orders
/// power-sweep notification and is deliberately a separate value.
#[derive(Clone)]
pub struct TaskConfig {
    /// Human-readable name for introspection
    pub name: String,
    /// Parent task; `None` marks a kernel-internal task that power sweeps skip
    pub parent: Option<TaskId>,
    /// Scheduling priority (kernel's concern)
    pub priority: u8,
    /// Power-sweep ordering value (coordinator's concern)
    pub power_priority: u8,
    /// Recreate this task from its config if the deadlock monitor kills it
    pub auto_recreate: bool,
    /// Power callback run by the receive path; `None` acks unconditionally
    pub power_hook: Option<PowerHook>,
}

impl TaskConfig {
    /// Creates a config with default priorities and no hook
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            priority: 0,
            power_priority: 0,
            auto_recreate: false,
            power_hook: None,
        }
    }

    /// Sets the parent task
    pub fn with_parent(mut self, parent: TaskId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets the scheduling priority
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the power-sweep ordering value
    pub fn with_power_priority(mut self, power_priority: u8) -> Self {
        self.power_priority = power_priority;
        self
    }

    /// Marks the task for recreation after a forced delete
    pub fn with_auto_recreate(mut self) -> Self {
        self.auto_recreate = true;
        self
    }

    /// Installs the power callback
    pub fn with_power_hook(mut self, hook: PowerHook) -> Self {
        self.power_hook = Some(hook);
        self
    }
}

impl fmt::Debug for TaskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskConfig")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("priority", &self.priority)
            .field("power_priority", &self.power_priority)
            .field("auto_recreate", &self.auto_recreate)
            .field("power_hook", &self.power_hook.is_some())
            .finish()
    }
}

/// Read-mostly view of a registered task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    /// Task identity
    pub id: TaskId,
    /// Human-readable name
    pub name: String,
    /// Parent task, `None` for kernel-internal tasks
    pub parent: Option<TaskId>,
    /// Scheduling priority
    pub priority: u8,
    /// Power-sweep ordering value
    pub power_priority: u8,
    /// Whether the deadlock monitor recreates the task after a kill
    pub auto_recreate: bool,
}

/// The slice of the kernel the abstraction layer drives.
///
/// Implementations: the simulated kernel (tests, host runs) and a thin
/// shim over the real kernel on hardware.
pub trait TaskControl {
    /// Creates a task and returns its id
    fn spawn_task(&mut self, config: TaskConfig) -> Result<TaskId, KernelError>;

    /// Deletes a task's execution context immediately
    fn delete_task(&mut self, task: TaskId) -> Result<(), KernelError>;

    /// Returns every registered task, in id order
    fn tasks(&self) -> Vec<TaskInfo>;

    /// Returns one task's info
    fn task_info(&self, task: TaskId) -> Option<TaskInfo>;

    /// Returns the original configuration a task was spawned from
    fn task_config(&self, task: TaskId) -> Option<TaskConfig>;

    /// Puts an envelope on a task's input queue without waiting
    fn send(&mut self, target: TaskId, envelope: Envelope) -> Result<(), KernelError>;

    /// Synchronous signal round-trip: deliver `signal` to `target` and wait
    /// up to `timeout` for the reply on the caller's own queue.
    ///
    /// This is the canonical cross-task RPC. The target's receive path
    /// intercepts power and pulse signals, runs the power callback where
    /// applicable, and replies before ordinary task logic observes anything.
    fn request(
        &mut self,
        target: TaskId,
        signal: Signal,
        timeout: Duration,
    ) -> Result<Signal, KernelError>;

    /// Takes the next envelope from a task's input queue, waiting up to
    /// `timeout` (`None` = wait forever). Power and pulse signals are
    /// intercepted and acknowledged before this returns.
    fn receive(
        &mut self,
        task: TaskId,
        timeout: Option<Duration>,
    ) -> Result<Envelope, KernelError>;

    /// Cumulative CPU time a task has consumed, in ticks
    fn cpu_time(&self, task: TaskId) -> Option<u64>;

    /// Blocks the caller for a fixed number of scheduler ticks
    fn wait_ticks(&mut self, ticks: u64);

    /// Current scheduler tick count
    fn current_ticks(&self) -> u64;

    /// Current virtual time
    fn now(&self) -> Instant;

    /// Reads and clears the scheduler idle hook: true when the system went
    /// idle since the last call
    fn take_idle(&mut self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_config_builder() {
        let parent = TaskId::from_raw(1);
        let config = TaskConfig::new("sensor")
            .with_parent(parent)
            .with_priority(5)
            .with_power_priority(20)
            .with_auto_recreate();

        assert_eq!(config.name, "sensor");
        assert_eq!(config.parent, Some(parent));
        assert_eq!(config.priority, 5);
        assert_eq!(config.power_priority, 20);
        assert!(config.auto_recreate);
        assert!(config.power_hook.is_none());
    }

    #[test]
    fn test_task_config_clone_shares_hook() {
        let hook: PowerHook = Arc::new(|_| Ok(()));
        let config = TaskConfig::new("worker").with_power_hook(hook);
        let cloned = config.clone();
        assert!(cloned.power_hook.is_some());
    }

    #[test]
    fn test_task_config_debug_hides_hook_body() {
        let config = TaskConfig::new("worker").with_power_hook(Arc::new(|_| Ok(())));
        let debug = format!("{:?}", config);
        assert!(debug.contains("power_hook: true"));
    }
}
