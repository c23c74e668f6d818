//! Per-driver records: lifecycle state, ownership, statistics.

use crate::ops::{DriverOps, IoRequest};
use bitflags::bitflags;
use core_types::{PowerState, Status};
use std::sync::Mutex;

bitflags! {
    /// Driver lifecycle flag bitset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LifecycleFlags: u8 {
        /// `init` has succeeded
        const INITIALIZED = 0b01;
        /// `open` has succeeded and not been fully closed
        const OPEN = 0b10;
    }
}

/// Outcome of an init request.
///
/// Initializing twice is a contract, not a bug: the second call reports
/// `AlreadyInitialized` on the success path so callers can `?` through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// The driver's init callback ran and succeeded
    Initialized,
    /// Init had already run; nothing was touched
    AlreadyInitialized,
}

/// Snapshot of one driver's statistics.
///
/// This is the system's error-observability surface: operation failures
/// land here (last status + error counter) in addition to being returned
/// to the immediate caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverStats {
    /// Display name given at registration
    pub name: String,
    /// Power-sweep ordering value
    pub power_priority: u8,
    /// Lifecycle flag bitset
    pub flags: LifecycleFlags,
    /// Cached power level, used to elide redundant `SetPower` calls
    pub power_state: PowerState,
    /// Current number of owners holding the driver open
    pub owners: u32,
    /// Bytes successfully written
    pub bytes_sent: u64,
    /// Bytes successfully read
    pub bytes_received: u64,
    /// Failed operations since registration
    pub error_count: u64,
    /// Status of the most recent failed operation
    pub last_status: Option<Status>,
}

pub(crate) struct DriverState {
    ops: Box<dyn DriverOps>,
    flags: LifecycleFlags,
    power_state: PowerState,
    owners: u32,
    bytes_sent: u64,
    bytes_received: u64,
    error_count: u64,
    last_status: Option<Status>,
}

impl DriverState {
    fn fail(&mut self, status: Status) -> Status {
        self.last_status = Some(status);
        self.error_count += 1;
        status
    }

    fn set_power(&mut self, target: PowerState) -> Result<(), Status> {
        if self.power_state == target {
            return Ok(());
        }
        match self.ops.ioctl(IoRequest::SetPower(target)) {
            Ok(()) => {
                self.power_state = target;
                Ok(())
            }
            // No ioctl capability: the driver has no power control, which
            // is not a fault.
            Err(Status::UnsupportedOperation) => Ok(()),
            Err(status) => Err(self.fail(status)),
        }
    }

    fn do_init(&mut self) -> Result<InitOutcome, Status> {
        if self.flags.contains(LifecycleFlags::INITIALIZED) {
            return Ok(InitOutcome::AlreadyInitialized);
        }
        self.ops.init().map_err(|status| self.fail(status))?;
        self.flags.insert(LifecycleFlags::INITIALIZED);
        Ok(InitOutcome::Initialized)
    }

    fn do_deinit(&mut self) -> Result<(), Status> {
        if !self.flags.contains(LifecycleFlags::INITIALIZED) {
            return Err(Status::NotInitialized);
        }
        if self.flags.contains(LifecycleFlags::OPEN) {
            self.force_close()?;
        }
        self.ops.deinit().map_err(|status| self.fail(status))?;
        self.flags.remove(LifecycleFlags::INITIALIZED);
        Ok(())
    }

    fn do_open(&mut self) -> Result<(), Status> {
        if !self.flags.contains(LifecycleFlags::INITIALIZED) {
            return Err(Status::NotInitialized);
        }
        if self.owners > 0 {
            // Later acquirers only take a reference; the driver callback
            // ran for the first one.
            self.owners += 1;
            return Ok(());
        }
        self.ops.open().map_err(|status| self.fail(status))?;
        self.flags.insert(LifecycleFlags::OPEN);
        self.owners = 1;
        // Lazy power-up on the first acquirer.
        if let Err(status) = self.set_power(PowerState::On) {
            let _ = self.ops.close();
            self.flags.remove(LifecycleFlags::OPEN);
            self.owners = 0;
            return Err(status);
        }
        Ok(())
    }

    fn do_close(&mut self) -> Result<(), Status> {
        if !self.flags.contains(LifecycleFlags::OPEN) {
            return Err(Status::NotOpen);
        }
        self.owners -= 1;
        if self.owners > 0 {
            return Ok(());
        }
        self.ops.close().map_err(|status| {
            self.owners = 1;
            self.fail(status)
        })?;
        // Best-effort power-down once the last owner is gone.
        let _ = self.set_power(PowerState::Off);
        self.flags.remove(LifecycleFlags::OPEN);
        Ok(())
    }

    /// Close regardless of owner count; used by deinit's auto-close.
    fn force_close(&mut self) -> Result<(), Status> {
        self.ops.close().map_err(|status| self.fail(status))?;
        let _ = self.set_power(PowerState::Off);
        self.owners = 0;
        self.flags.remove(LifecycleFlags::OPEN);
        Ok(())
    }

    fn do_read(&mut self, buf: &mut [u8]) -> Result<usize, Status> {
        if !self.flags.contains(LifecycleFlags::OPEN) {
            return Err(Status::NotOpen);
        }
        match self.ops.read(buf) {
            Ok(count) => {
                self.bytes_received += count as u64;
                Ok(count)
            }
            Err(status) => Err(self.fail(status)),
        }
    }

    fn do_write(&mut self, buf: &[u8]) -> Result<usize, Status> {
        if !self.flags.contains(LifecycleFlags::OPEN) {
            return Err(Status::NotOpen);
        }
        match self.ops.write(buf) {
            Ok(count) => {
                self.bytes_sent += count as u64;
                Ok(count)
            }
            Err(status) => Err(self.fail(status)),
        }
    }

    fn do_control(&mut self, request: IoRequest) -> Result<(), Status> {
        if !self.flags.contains(LifecycleFlags::OPEN) {
            return Err(Status::NotOpen);
        }
        if let IoRequest::SetPower(target) = request {
            // Redundant-call elision happens here, including the failure
            // path of a driver with no ioctl capability at all.
            if self.power_state == target {
                return Ok(());
            }
            return match self.ops.ioctl(request) {
                Ok(()) => {
                    self.power_state = target;
                    Ok(())
                }
                Err(status) => Err(self.fail(status)),
            };
        }
        self.ops.ioctl(request).map_err(|status| self.fail(status))
    }
}

/// One registered driver: capability set, identity, and guarded state.
pub(crate) struct DriverRecord {
    name: String,
    power_priority: u8,
    state: Mutex<DriverState>,
}

impl DriverRecord {
    pub(crate) fn new(ops: Box<dyn DriverOps>, name: String, power_priority: u8) -> Self {
        Self {
            name,
            power_priority,
            state: Mutex::new(DriverState {
                ops,
                flags: LifecycleFlags::empty(),
                power_state: PowerState::Undefined,
                owners: 0,
                bytes_sent: 0,
                bytes_received: 0,
                error_count: 0,
                last_status: None,
            }),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn power_priority(&self) -> u8 {
        self.power_priority
    }

    /// Blocking per-record lock. A poisoned mutex means a driver callback
    /// panicked mid-update; that is structural corruption and we halt.
    fn with_state<R>(&self, f: impl FnOnce(&mut DriverState) -> R) -> R {
        let mut state = self.state.lock().expect("driver record mutex poisoned");
        f(&mut state)
    }

    /// Non-blocking variant for interrupt context: contention is a hard
    /// `Busy` failure because an ISR may never suspend.
    fn try_with_state<R>(
        &self,
        f: impl FnOnce(&mut DriverState) -> Result<R, Status>,
    ) -> Result<R, Status> {
        match self.state.try_lock() {
            Ok(mut state) => f(&mut state),
            Err(std::sync::TryLockError::WouldBlock) => Err(Status::Busy),
            Err(std::sync::TryLockError::Poisoned(_)) => {
                panic!("driver record mutex poisoned")
            }
        }
    }

    pub(crate) fn init(&self) -> Result<InitOutcome, Status> {
        self.with_state(DriverState::do_init)
    }

    pub(crate) fn deinit(&self) -> Result<(), Status> {
        self.with_state(DriverState::do_deinit)
    }

    pub(crate) fn open(&self) -> Result<(), Status> {
        self.with_state(DriverState::do_open)
    }

    pub(crate) fn close(&self) -> Result<(), Status> {
        self.with_state(DriverState::do_close)
    }

    pub(crate) fn read(&self, buf: &mut [u8]) -> Result<usize, Status> {
        self.with_state(|state| state.do_read(buf))
    }

    pub(crate) fn write(&self, buf: &[u8]) -> Result<usize, Status> {
        self.with_state(|state| state.do_write(buf))
    }

    pub(crate) fn control(&self, request: IoRequest) -> Result<(), Status> {
        self.with_state(|state| state.do_control(request))
    }

    pub(crate) fn read_from_isr(&self, buf: &mut [u8]) -> Result<usize, Status> {
        self.try_with_state(|state| state.do_read(buf))
    }

    pub(crate) fn write_from_isr(&self, buf: &[u8]) -> Result<usize, Status> {
        self.try_with_state(|state| state.do_write(buf))
    }

    pub(crate) fn control_from_isr(&self, request: IoRequest) -> Result<(), Status> {
        self.try_with_state(|state| state.do_control(request))
    }

    pub(crate) fn is_open(&self) -> bool {
        self.with_state(|state| state.flags.contains(LifecycleFlags::OPEN))
    }

    pub(crate) fn stats(&self) -> DriverStats {
        self.with_state(|state| DriverStats {
            name: self.name.clone(),
            power_priority: self.power_priority,
            flags: state.flags,
            power_state: state.power_state,
            owners: state.owners,
            bytes_sent: state.bytes_sent,
            bytes_received: state.bytes_received,
            error_count: state.error_count,
            last_status: state.last_status,
        })
    }
}
