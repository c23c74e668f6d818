//! CPU-delta deadlock and livelock monitor.
//!
//! A heuristic, not a proof: between two heartbeats the task that burned
//! the most CPU while the system failed to go idle is the suspect. Only a
//! suspect that stays on top through a full countdown is killed, and each
//! kill happens exactly once.

use core_types::TaskId;
use kernel_api::TaskControl;

/// Monitor tuning knobs.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Ticks between the two CPU snapshots of one observation
    pub sample_ticks: u64,
    /// Heartbeats an unchanged suspect survives before the kill
    pub countdown: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_ticks: 10,
            countdown: 3,
        }
    }
}

/// Watches for a task that monopolizes the CPU while the system never
/// goes idle, and breaks it after a sustained countdown.
pub struct DeadlockMonitor {
    config: MonitorConfig,
    suspect: Option<TaskId>,
    remaining: u32,
    kills: u64,
}

impl DeadlockMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        let remaining = config.countdown;
        Self {
            config,
            suspect: None,
            remaining,
            kills: 0,
        }
    }

    /// The task currently under suspicion, if any
    pub fn suspect(&self) -> Option<TaskId> {
        self.suspect
    }

    /// Tasks killed since the monitor started
    pub fn kill_count(&self) -> u64 {
        self.kills
    }

    fn clear(&mut self) {
        self.suspect = None;
        self.remaining = self.config.countdown;
    }

    /// Picks the task (excluding the coordinator) with the largest positive
    /// CPU delta across one sample window. Ties go to the lower id so
    /// repeated observations are stable.
    fn sample_suspect(
        &self,
        kernel: &mut dyn TaskControl,
        coordinator: TaskId,
    ) -> Option<TaskId> {
        let before: Vec<(TaskId, u64)> = kernel
            .tasks()
            .into_iter()
            .filter(|info| info.id != coordinator)
            .filter_map(|info| kernel.cpu_time(info.id).map(|cpu| (info.id, cpu)))
            .collect();

        kernel.wait_ticks(self.config.sample_ticks);

        let mut top: Option<(TaskId, u64)> = None;
        for (id, cpu_before) in before {
            let Some(cpu_after) = kernel.cpu_time(id) else {
                continue;
            };
            let delta = cpu_after.saturating_sub(cpu_before);
            if delta == 0 {
                continue;
            }
            match top {
                Some((_, best)) if best >= delta => {}
                _ => top = Some((id, delta)),
            }
        }
        top.map(|(id, _)| id)
    }

    /// One heartbeat's worth of observation. Returns the task killed this
    /// beat, if the countdown ran out.
    pub fn observe(
        &mut self,
        kernel: &mut dyn TaskControl,
        coordinator: TaskId,
    ) -> Option<TaskId> {
        if kernel.take_idle() {
            // The scheduler ran out of work since the last beat, so nobody
            // is livelocked no matter what the deltas say.
            self.clear();
            return None;
        }

        let Some(suspect) = self.sample_suspect(kernel, coordinator) else {
            self.clear();
            return None;
        };

        if self.suspect != Some(suspect) {
            log::debug!("{} is the new livelock suspect", suspect);
            self.suspect = Some(suspect);
            self.remaining = self.config.countdown;
            return None;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            log::debug!("{} still suspect, {} beats to kill", suspect, self.remaining);
            return None;
        }

        self.kill(kernel, suspect);
        Some(suspect)
    }

    fn kill(&mut self, kernel: &mut dyn TaskControl, task: TaskId) {
        let config = kernel.task_config(task);
        let name = config
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "?".to_string());
        log::error!("killing livelocked task {} ({})", task, name);

        if let Err(err) = kernel.delete_task(task) {
            log::warn!("deleting {} failed: {}", task, err);
            self.clear();
            return;
        }
        self.kills += 1;

        if let Some(config) = config {
            if config.auto_recreate {
                match kernel.spawn_task(config) {
                    Ok(new_id) => log::info!("recreated {} as {}", name, new_id),
                    Err(err) => log::error!("recreating {} failed: {}", name, err),
                }
            }
        }
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_api::TaskConfig;
    use sim_kernel::SimulatedKernel;

    fn setup() -> (SimulatedKernel, TaskId, DeadlockMonitor) {
        let mut kernel = SimulatedKernel::new();
        let coordinator = kernel
            .spawn_task(TaskConfig::new("power_coordinator"))
            .unwrap();
        (kernel, coordinator, DeadlockMonitor::new(MonitorConfig::default()))
    }

    /// Runs enough beats to exhaust the default countdown: one beat to
    /// become suspect, three more to count down to the kill.
    fn beats_to_kill() -> u32 {
        MonitorConfig::default().countdown + 1
    }

    #[test]
    fn test_busy_task_killed_after_sustained_countdown() {
        let (mut kernel, coordinator, mut monitor) = setup();
        let spinner = kernel
            .spawn_task(TaskConfig::new("spinner").with_parent(coordinator))
            .unwrap();
        kernel.set_burn_rate(spinner, 5);

        let mut killed = None;
        for _ in 0..beats_to_kill() {
            assert_eq!(killed, None);
            killed = monitor.observe(&mut kernel, coordinator);
        }
        assert_eq!(killed, Some(spinner));
        assert!(kernel.task_info(spinner).is_none());
        assert_eq!(monitor.kill_count(), 1);
        assert_eq!(monitor.suspect(), None);
    }

    #[test]
    fn test_kill_happens_exactly_once() {
        let (mut kernel, coordinator, mut monitor) = setup();
        let spinner = kernel
            .spawn_task(TaskConfig::new("spinner").with_parent(coordinator))
            .unwrap();
        kernel.set_burn_rate(spinner, 5);

        for _ in 0..beats_to_kill() {
            monitor.observe(&mut kernel, coordinator);
        }
        assert_eq!(monitor.kill_count(), 1);

        // The dead task burns no more CPU; further beats find nothing.
        for _ in 0..beats_to_kill() {
            assert_eq!(monitor.observe(&mut kernel, coordinator), None);
        }
        assert_eq!(monitor.kill_count(), 1);
    }

    #[test]
    fn test_auto_recreate_respawns_from_original_config() {
        let (mut kernel, coordinator, mut monitor) = setup();
        let spinner = kernel
            .spawn_task(
                TaskConfig::new("spinner")
                    .with_parent(coordinator)
                    .with_power_priority(20)
                    .with_auto_recreate(),
            )
            .unwrap();
        kernel.set_burn_rate(spinner, 5);

        for _ in 0..beats_to_kill() {
            monitor.observe(&mut kernel, coordinator);
        }

        // The freed id is the lowest available, so the respawn reuses it,
        // but with a fresh execution context.
        let info = kernel.task_info(spinner).expect("task recreated");
        assert_eq!(info.name, "spinner");
        assert_eq!(info.power_priority, 20);
        assert_eq!(kernel.cpu_time(spinner), Some(0));
    }

    #[test]
    fn test_task_without_auto_recreate_stays_dead() {
        let (mut kernel, coordinator, mut monitor) = setup();
        let spinner = kernel
            .spawn_task(TaskConfig::new("spinner").with_parent(coordinator))
            .unwrap();
        kernel.set_burn_rate(spinner, 5);

        for _ in 0..beats_to_kill() {
            monitor.observe(&mut kernel, coordinator);
        }
        assert!(kernel.task_info(spinner).is_none());
    }

    #[test]
    fn test_idle_system_clears_the_suspect() {
        let (mut kernel, coordinator, mut monitor) = setup();
        let spinner = kernel
            .spawn_task(TaskConfig::new("spinner").with_parent(coordinator))
            .unwrap();
        kernel.set_burn_rate(spinner, 5);

        monitor.observe(&mut kernel, coordinator);
        assert_eq!(monitor.suspect(), Some(spinner));

        // The task blocks; the next wait latches the idle hook and the
        // beat after that forgives the suspect.
        kernel.set_burn_rate(spinner, 0);
        kernel.wait_ticks(1);
        assert_eq!(monitor.observe(&mut kernel, coordinator), None);
        assert_eq!(monitor.suspect(), None);
        assert!(kernel.task_info(spinner).is_some());
    }

    #[test]
    fn test_coordinator_is_never_the_suspect() {
        let (mut kernel, coordinator, mut monitor) = setup();
        kernel.set_burn_rate(coordinator, 50);
        let worker = kernel
            .spawn_task(TaskConfig::new("worker").with_parent(coordinator))
            .unwrap();
        kernel.set_burn_rate(worker, 1);

        monitor.observe(&mut kernel, coordinator);
        assert_eq!(monitor.suspect(), Some(worker));
    }

    #[test]
    fn test_suspect_change_restarts_the_countdown() {
        let (mut kernel, coordinator, mut monitor) = setup();
        let first = kernel
            .spawn_task(TaskConfig::new("first").with_parent(coordinator))
            .unwrap();
        let second = kernel
            .spawn_task(TaskConfig::new("second").with_parent(coordinator))
            .unwrap();

        kernel.set_burn_rate(first, 5);
        monitor.observe(&mut kernel, coordinator);
        monitor.observe(&mut kernel, coordinator);
        assert_eq!(monitor.suspect(), Some(first));

        // The hot task changes; nobody dies on the old countdown.
        kernel.set_burn_rate(first, 1);
        kernel.set_burn_rate(second, 10);
        for _ in 0..beats_to_kill() - 1 {
            assert_eq!(monitor.observe(&mut kernel, coordinator), None);
        }
        assert_eq!(monitor.suspect(), Some(second));
        assert!(kernel.task_info(first).is_some());
    }
}
