//! Livelock Recovery Tests
//!
//! Drives the coordinator heartbeat against the simulated kernel and
//! validates the monitor's kill-exactly-once and auto-recreate contract.

use contract_tests::{bootstrap, coordinator_task};
use kernel_api::{TaskConfig, TaskControl};

/// Heartbeats needed to exhaust the default countdown: one to become the
/// suspect, three more to count down.
const BEATS_TO_KILL: usize = 4;

/// Test: a spinning task is killed exactly once and recreated from its
/// original configuration
///
/// This validates that:
/// 1. Sustained CPU monopoly through the countdown leads to a kill
/// 2. The kill happens exactly once
/// 3. An auto-recreate task comes back with its original descriptor
/// 4. The recreated task starts with a fresh execution context
#[test]
fn test_spinning_task_is_killed_once_and_recreated() {
    let (mut kernel, _registry, mut coordinator) = bootstrap();
    let root = coordinator_task(&kernel);

    let spinner = kernel
        .spawn_task(
            TaskConfig::new("spinner")
                .with_parent(root)
                .with_power_priority(20)
                .with_auto_recreate(),
        )
        .expect("failed to spawn spinner");
    kernel.set_burn_rate(spinner, 5);

    let mut killed = None;
    for _ in 0..BEATS_TO_KILL {
        assert_eq!(killed, None, "killed before the countdown ran out");
        killed = coordinator.heartbeat(&mut kernel);
    }
    assert_eq!(killed, Some(spinner));
    assert_eq!(coordinator.monitor().kill_count(), 1);

    // Recreated under the freed id, original descriptor, fresh context.
    let info = kernel.task_info(spinner).expect("spinner not recreated");
    assert_eq!(info.name, "spinner");
    assert_eq!(info.power_priority, 20);
    assert!(info.auto_recreate);
    assert_eq!(kernel.cpu_time(spinner), Some(0));

    // The replacement behaves, so nothing else dies.
    for _ in 0..BEATS_TO_KILL * 2 {
        assert_eq!(coordinator.heartbeat(&mut kernel), None);
    }
    assert_eq!(coordinator.monitor().kill_count(), 1);
}

/// Test: a blocked task burns no CPU and is never killed, because the
/// system keeps going idle between heartbeats
#[test]
fn test_blocked_task_is_never_killed() {
    let (mut kernel, _registry, mut coordinator) = bootstrap();
    let root = coordinator_task(&kernel);

    let sleeper = kernel
        .spawn_task(TaskConfig::new("sleeper").with_parent(root))
        .expect("failed to spawn sleeper");

    for _ in 0..BEATS_TO_KILL * 3 {
        assert_eq!(coordinator.heartbeat(&mut kernel), None);
    }
    assert!(kernel.task_info(sleeper).is_some());
    assert_eq!(coordinator.monitor().kill_count(), 0);
    assert_eq!(coordinator.monitor().suspect(), None);
}

/// Test: a task that stops draining its queue misses the heartbeat pulse
/// but survives as long as it burns no CPU
#[test]
fn test_unresponsive_but_idle_task_survives_the_pulse() {
    let (mut kernel, _registry, mut coordinator) = bootstrap();
    let root = coordinator_task(&kernel);

    let wedged = kernel
        .spawn_task(TaskConfig::new("wedged").with_parent(root))
        .expect("failed to spawn wedged task");
    kernel.set_responsive(wedged, false);

    for _ in 0..BEATS_TO_KILL {
        assert_eq!(coordinator.heartbeat(&mut kernel), None);
    }
    assert!(kernel.task_info(wedged).is_some());
}
