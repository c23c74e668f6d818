//! # Simulated Kernel
//!
//! Deterministic in-memory implementation of [`TaskControl`].
//!
//! ## Philosophy
//!
//! - **Determinism first**: time only moves when someone waits; the same
//!   calls always produce the same interleaving.
//! - **No hidden concurrency**: tasks are records, not threads. A "busy"
//!   task is modeled by a CPU burn rate, an unresponsive one by a flag.
//! - **The receive path owns the handshake**: power and pulse signals are
//!   intercepted and acknowledged inside [`TaskControl::receive`] and
//!   [`TaskControl::request`], exactly as the real kernel's receive
//!   primitive does, so ordinary task logic never sees them.
//!
//! ## Test Knobs
//!
//! [`SimulatedKernel::set_burn_rate`] makes a task accrue CPU during waits
//! (feeding the deadlock monitor), [`SimulatedKernel::set_responsive`]
//! makes a task stop acknowledging (driving the coordinator's timeout
//! path), and [`SimulatedKernel::force_idle`] raises the scheduler idle
//! hook.

use core_types::{PowerState, Status, TaskId};
use ipc::{Envelope, Signal, SignalId};
use kernel_api::{Duration, Instant, KernelError, TaskConfig, TaskControl, TaskInfo};
use std::collections::{BTreeMap, VecDeque};

/// Simulated kernel configuration.
#[derive(Debug, Clone)]
pub struct SimKernelConfig {
    /// Capacity of every task input queue
    pub queue_capacity: usize,
    /// Ticks charged to a target task for handling one intercepted signal
    pub dispatch_cost_ticks: u64,
}

impl Default for SimKernelConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            dispatch_cost_ticks: 1,
        }
    }
}

struct SimTask {
    config: TaskConfig,
    queue: VecDeque<Envelope>,
    cpu_time: u64,
    /// CPU ticks accrued per scheduler tick while anyone waits
    burn_rate: u64,
    /// When false the task never acknowledges; requests to it time out
    responsive: bool,
}

/// Deterministic kernel for tests and host runs.
pub struct SimulatedKernel {
    config: SimKernelConfig,
    tasks: BTreeMap<TaskId, SimTask>,
    ticks: u64,
    idle: bool,
}

impl SimulatedKernel {
    /// Creates a kernel with default configuration
    pub fn new() -> Self {
        Self::with_config(SimKernelConfig::default())
    }

    /// Creates a kernel with custom configuration
    pub fn with_config(config: SimKernelConfig) -> Self {
        Self {
            config,
            tasks: BTreeMap::new(),
            ticks: 0,
            idle: false,
        }
    }

    /// Makes a task accrue `per_tick` CPU ticks for every scheduler tick
    /// that elapses in a wait. Zero models a blocked task.
    pub fn set_burn_rate(&mut self, task: TaskId, per_tick: u64) {
        if let Some(record) = self.tasks.get_mut(&task) {
            record.burn_rate = per_tick;
        }
    }

    /// Controls whether a task acknowledges signals delivered to it
    pub fn set_responsive(&mut self, task: TaskId, responsive: bool) {
        if let Some(record) = self.tasks.get_mut(&task) {
            record.responsive = responsive;
        }
    }

    /// Raises the scheduler idle hook for the next [`TaskControl::take_idle`]
    pub fn force_idle(&mut self) {
        self.idle = true;
    }

    /// Number of envelopes sitting on a task's input queue
    pub fn queue_len(&self, task: TaskId) -> usize {
        self.tasks.get(&task).map(|t| t.queue.len()).unwrap_or(0)
    }

    fn allocate_id(&self) -> Option<TaskId> {
        (0..=u8::MAX)
            .map(TaskId::from_raw)
            .find(|id| !self.tasks.contains_key(id))
    }

    fn info_of(id: TaskId, task: &SimTask) -> TaskInfo {
        TaskInfo {
            id,
            name: task.config.name.clone(),
            parent: task.config.parent,
            priority: task.config.priority,
            power_priority: task.config.power_priority,
            auto_recreate: task.config.auto_recreate,
        }
    }

    /// Runs the receive-path interception for one signal aimed at `target`.
    ///
    /// Returns the acknowledgment the target produces, or `None` when the
    /// signal is not one the receive primitive handles itself.
    fn intercept(&mut self, target: TaskId, signal: Signal) -> Option<Signal> {
        let record = self.tasks.get(&target)?;
        match signal.id {
            SignalId::POWER => {
                let outcome = match PowerState::from_wire(signal.payload) {
                    Some(state) => match &record.config.power_hook {
                        Some(hook) => hook(state),
                        None => Ok(()),
                    },
                    None => Err(Status::InvalidRef),
                };
                Some(Signal::power_ack(target, outcome))
            }
            SignalId::PULSE => Some(Signal::new(SignalId::PULSE_ACK, target, signal.payload)),
            _ => None,
        }
    }

    fn charge(&mut self, target: TaskId) {
        let cost = self.config.dispatch_cost_ticks;
        self.ticks += cost;
        if let Some(record) = self.tasks.get_mut(&target) {
            record.cpu_time += cost;
        }
    }
}

impl Default for SimulatedKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskControl for SimulatedKernel {
    fn spawn_task(&mut self, config: TaskConfig) -> Result<TaskId, KernelError> {
        let id = self
            .allocate_id()
            .ok_or_else(|| KernelError::SpawnFailed("task id space exhausted".to_string()))?;
        self.tasks.insert(
            id,
            SimTask {
                config,
                queue: VecDeque::new(),
                cpu_time: 0,
                burn_rate: 0,
                responsive: true,
            },
        );
        Ok(id)
    }

    fn delete_task(&mut self, task: TaskId) -> Result<(), KernelError> {
        self.tasks
            .remove(&task)
            .map(|_| ())
            .ok_or(KernelError::TaskNotFound(task))
    }

    fn tasks(&self) -> Vec<TaskInfo> {
        self.tasks
            .iter()
            .map(|(id, task)| Self::info_of(*id, task))
            .collect()
    }

    fn task_info(&self, task: TaskId) -> Option<TaskInfo> {
        self.tasks.get(&task).map(|t| Self::info_of(task, t))
    }

    fn task_config(&self, task: TaskId) -> Option<TaskConfig> {
        self.tasks.get(&task).map(|t| t.config.clone())
    }

    fn send(&mut self, target: TaskId, envelope: Envelope) -> Result<(), KernelError> {
        let capacity = self.config.queue_capacity;
        let record = self
            .tasks
            .get_mut(&target)
            .ok_or(KernelError::TaskNotFound(target))?;
        if record.queue.len() >= capacity {
            return Err(KernelError::QueueFull(target));
        }
        record.queue.push_back(envelope);
        Ok(())
    }

    fn request(
        &mut self,
        target: TaskId,
        signal: Signal,
        timeout: Duration,
    ) -> Result<Signal, KernelError> {
        let record = self
            .tasks
            .get(&target)
            .ok_or(KernelError::TaskNotFound(target))?;

        if !record.responsive {
            // The target never runs its receive path; the bounded wait
            // elapses in full.
            self.wait_ticks(timeout.as_ticks());
            return Err(KernelError::Timeout);
        }

        match self.intercept(target, signal) {
            Some(ack) => {
                self.charge(target);
                Ok(ack)
            }
            None => {
                // Not a receive-path signal: deliver it and let the bounded
                // wait run out, since no simulated task runs on its own.
                self.send(target, Envelope::Signal(signal))?;
                self.wait_ticks(timeout.as_ticks());
                Err(KernelError::Timeout)
            }
        }
    }

    fn receive(
        &mut self,
        task: TaskId,
        timeout: Option<Duration>,
    ) -> Result<Envelope, KernelError> {
        loop {
            let record = self
                .tasks
                .get_mut(&task)
                .ok_or(KernelError::TaskNotFound(task))?;
            let Some(envelope) = record.queue.pop_front() else {
                // Nothing queued and no other task can run to produce more;
                // the wait elapses whether bounded or not.
                if let Some(timeout) = timeout {
                    self.wait_ticks(timeout.as_ticks());
                }
                return Err(KernelError::Timeout);
            };

            match envelope {
                Envelope::Signal(signal) => match self.intercept(task, signal) {
                    Some(ack) => {
                        // Handshake: reply to the source before the caller
                        // observes anything.
                        self.charge(task);
                        let source = signal.source;
                        self.send(source, Envelope::Signal(ack))?;
                    }
                    None => return Ok(Envelope::Signal(signal)),
                },
                message => return Ok(message),
            }
        }
    }

    fn cpu_time(&self, task: TaskId) -> Option<u64> {
        self.tasks.get(&task).map(|t| t.cpu_time)
    }

    fn wait_ticks(&mut self, ticks: u64) {
        self.ticks += ticks;
        let mut any_busy = false;
        for record in self.tasks.values_mut() {
            if record.burn_rate > 0 {
                record.cpu_time += record.burn_rate * ticks;
                any_busy = true;
            }
        }
        if !any_busy && ticks > 0 {
            self.idle = true;
        }
    }

    fn current_ticks(&self) -> u64 {
        self.ticks
    }

    fn now(&self) -> Instant {
        Instant::from_ticks(self.ticks)
    }

    fn take_idle(&mut self) -> bool {
        std::mem::take(&mut self.idle)
    }
}
