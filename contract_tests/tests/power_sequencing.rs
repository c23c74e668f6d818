//! Power Transition Sequencing Tests
//!
//! Validates the system-wide ordering contract: who is notified, in what
//! order, and what happens when someone in the middle refuses.

use contract_tests::{
    bootstrap, clear, coordinator_task, event_log, events, register_driver, spawn_refusing_worker,
    spawn_worker,
};
use core_types::{PowerState, Status};
use driver_registry::IoRequest;
use kernel_api::TaskControl;
use power_manager::SystemHealth;

/// Test: powering up walks drivers before tasks, high priority first
///
/// This validates that:
/// 1. Every driver reaches its power state before any task is notified
/// 2. Drivers are swept in descending power priority
/// 3. Tasks are notified in descending power priority
#[test]
fn test_power_up_orders_drivers_then_tasks() {
    let (mut kernel, registry, mut coordinator) = bootstrap();
    let root = coordinator_task(&kernel);
    let log = event_log();

    register_driver(&registry, "bus", 30, log.clone());
    register_driver(&registry, "disk", 10, log.clone());
    spawn_worker(&mut kernel, root, "logger", 10, log.clone());
    spawn_worker(&mut kernel, root, "storage", 30, log.clone());
    spawn_worker(&mut kernel, root, "ui", 20, log.clone());

    coordinator
        .transition(&mut kernel, PowerState::On)
        .expect("power up failed");

    assert_eq!(
        events(&log),
        vec![
            ("bus".to_string(), PowerState::On),
            ("disk".to_string(), PowerState::On),
            ("storage".to_string(), PowerState::On),
            ("ui".to_string(), PowerState::On),
            ("logger".to_string(), PowerState::On),
        ]
    );
}

/// Test: powering down reverses the ordering, tasks before drivers
#[test]
fn test_power_down_orders_tasks_then_drivers() {
    let (mut kernel, registry, mut coordinator) = bootstrap();
    let root = coordinator_task(&kernel);
    let log = event_log();

    register_driver(&registry, "bus", 30, log.clone());
    register_driver(&registry, "disk", 10, log.clone());
    spawn_worker(&mut kernel, root, "storage", 30, log.clone());
    spawn_worker(&mut kernel, root, "logger", 10, log.clone());
    spawn_worker(&mut kernel, root, "ui", 20, log.clone());

    coordinator
        .transition(&mut kernel, PowerState::On)
        .expect("power up failed");
    clear(&log);

    coordinator
        .transition(&mut kernel, PowerState::Sleep)
        .expect("power down failed");

    assert_eq!(
        events(&log),
        vec![
            ("logger".to_string(), PowerState::Sleep),
            ("ui".to_string(), PowerState::Sleep),
            ("storage".to_string(), PowerState::Sleep),
            ("disk".to_string(), PowerState::Sleep),
            ("bus".to_string(), PowerState::Sleep),
        ]
    );
}

/// Test: a refusal mid-sweep stops later tasks and triggers one rollback
///
/// The refusing task sits at priority 20 so the down sweep reaches it
/// after priority 10 and before priority 30. Priority 30 must never see
/// the down state, and everyone must be re-raised to the previous state.
#[test]
fn test_mid_sweep_refusal_stops_later_tasks_and_rolls_back() {
    let (mut kernel, registry, mut coordinator) = bootstrap();
    let root = coordinator_task(&kernel);
    let log = event_log();

    register_driver(&registry, "disk", 10, log.clone());
    spawn_worker(&mut kernel, root, "logger", 10, log.clone());
    spawn_refusing_worker(&mut kernel, root, "busy", 20, PowerState::Sleep, log.clone());
    spawn_worker(&mut kernel, root, "storage", 30, log.clone());

    coordinator
        .transition(&mut kernel, PowerState::On)
        .expect("power up failed");
    clear(&log);

    let result = coordinator.transition(&mut kernel, PowerState::Sleep);
    assert_eq!(result, Err(Status::Busy));
    assert_eq!(coordinator.current_state(), PowerState::On);
    assert_eq!(coordinator.health(), SystemHealth::Nominal);

    // Down sweep: logger acked Sleep, busy refused, storage and the driver
    // were never reached. Rollback: drivers first, then tasks high-to-low.
    assert_eq!(
        events(&log),
        vec![
            ("logger".to_string(), PowerState::Sleep),
            ("storage".to_string(), PowerState::On),
            ("busy".to_string(), PowerState::On),
            ("logger".to_string(), PowerState::On),
        ]
    );
}

/// Test: the power-state cache is shared between direct driver control and
/// coordinator sweeps, so two identical requests reach hardware once
#[test]
fn test_set_power_elision_across_coordinator_calls() {
    let (mut kernel, registry, mut coordinator) = bootstrap();
    let log = event_log();
    let handle = register_driver(&registry, "disk", 10, log.clone());

    registry
        .control(handle, IoRequest::SetPower(PowerState::On))
        .expect("direct control failed");
    coordinator
        .transition(&mut kernel, PowerState::On)
        .expect("power up failed");

    // One hardware call despite two requests for the same state.
    assert_eq!(events(&log), vec![("disk".to_string(), PowerState::On)]);
}

/// Test: shutdown deletes each task right after its ack and powers the
/// drivers down last
#[test]
fn test_shutdown_tears_down_tasks_then_drivers() {
    let (mut kernel, registry, mut coordinator) = bootstrap();
    let root = coordinator_task(&kernel);
    let log = event_log();

    register_driver(&registry, "disk", 10, log.clone());
    let logger = spawn_worker(&mut kernel, root, "logger", 10, log.clone());
    let storage = spawn_worker(&mut kernel, root, "storage", 30, log.clone());

    coordinator
        .transition(&mut kernel, PowerState::On)
        .expect("power up failed");
    clear(&log);

    coordinator
        .transition(&mut kernel, PowerState::Shutdown)
        .expect("shutdown failed");

    assert_eq!(
        events(&log),
        vec![
            ("logger".to_string(), PowerState::Shutdown),
            ("storage".to_string(), PowerState::Shutdown),
            ("disk".to_string(), PowerState::Shutdown),
        ]
    );
    assert!(kernel.task_info(logger).is_none());
    assert!(kernel.task_info(storage).is_none());
    assert!(kernel.task_info(root).is_some());
    assert_eq!(coordinator.current_state(), PowerState::Shutdown);
}
