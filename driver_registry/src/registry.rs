//! The registry proper: slot arena, handle validation, operation dispatch.

use crate::ops::{DriverOps, IoRequest};
use crate::record::{DriverRecord, DriverStats, InitOutcome};
use core_types::{DriverHandle, Status};
use std::sync::{Arc, Mutex, TryLockError};

/// Direction of a power-priority sorted view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Lowest power priority first; the tear-down direction
    Ascending,
    /// Highest power priority first; the bring-up direction
    Descending,
}

struct Slot {
    /// Bumped every time the slot's occupant is unregistered, so handles
    /// to the old occupant stop validating.
    generation: u32,
    record: Option<Arc<DriverRecord>>,
}

struct RegistryInner {
    slots: Vec<Slot>,
    /// Slot indices in registration order.
    order: Vec<u32>,
}

impl RegistryInner {
    fn resolve(&self, handle: DriverHandle) -> Result<Arc<DriverRecord>, Status> {
        let slot = self
            .slots
            .get(handle.index() as usize)
            .ok_or(Status::InvalidRef)?;
        if slot.generation != handle.generation() {
            return Err(Status::InvalidRef);
        }
        slot.record.clone().ok_or(Status::InvalidRef)
    }
}

/// The mutex-protected driver record collection.
///
/// The registry mutex only guards structure (which slots are occupied);
/// each record carries its own lock for lifecycle state. Resolving a
/// handle clones the record's `Arc` and drops the registry lock before
/// any driver callback runs, so a slow driver never stalls the registry.
pub struct DriverRegistry {
    inner: Mutex<RegistryInner>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                slots: Vec::new(),
                order: Vec::new(),
            }),
        }
    }

    /// Structural lock. Poisoning here means the registry's own bookkeeping
    /// panicked mid-update, which is unrecoverable.
    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryInner> {
        self.inner.lock().expect("driver registry mutex poisoned")
    }

    fn resolve(&self, handle: DriverHandle) -> Result<Arc<DriverRecord>, Status> {
        self.lock().resolve(handle)
    }

    /// Non-blocking resolve for interrupt context.
    fn resolve_from_isr(&self, handle: DriverHandle) -> Result<Arc<DriverRecord>, Status> {
        match self.inner.try_lock() {
            Ok(inner) => inner.resolve(handle),
            Err(TryLockError::WouldBlock) => Err(Status::Busy),
            Err(TryLockError::Poisoned(_)) => panic!("driver registry mutex poisoned"),
        }
    }

    /// Add a driver under `name`. Returns the handle used for every later
    /// operation. Slots freed by unregistration are reused with a fresh
    /// generation.
    pub fn register(
        &self,
        ops: Box<dyn DriverOps>,
        name: &str,
        power_priority: u8,
    ) -> DriverHandle {
        let record = Arc::new(DriverRecord::new(ops, name.to_string(), power_priority));
        let mut inner = self.lock();
        let index = match inner.slots.iter().position(|slot| slot.record.is_none()) {
            Some(free) => {
                inner.slots[free].record = Some(record);
                free as u32
            }
            None => {
                inner.slots.push(Slot {
                    generation: 0,
                    record: Some(record),
                });
                (inner.slots.len() - 1) as u32
            }
        };
        inner.order.push(index);
        let handle = DriverHandle::new(index, inner.slots[index as usize].generation);
        log::debug!("registered driver '{}' as {}", name, handle);
        handle
    }

    /// Remove a driver. Fails with `StillOpen` while any owner holds it
    /// open; the caller must drive it closed first.
    pub fn unregister(&self, handle: DriverHandle) -> Result<(), Status> {
        let mut inner = self.lock();
        let record = inner.resolve(handle)?;
        if record.is_open() {
            return Err(Status::StillOpen);
        }
        let index = handle.index() as usize;
        inner.slots[index].record = None;
        inner.slots[index].generation = inner.slots[index].generation.wrapping_add(1);
        inner.order.retain(|&slot| slot != handle.index());
        log::debug!("unregistered driver '{}' at {}", record.name(), handle);
        Ok(())
    }

    pub fn init(&self, handle: DriverHandle) -> Result<InitOutcome, Status> {
        self.resolve(handle)?.init()
    }

    pub fn deinit(&self, handle: DriverHandle) -> Result<(), Status> {
        self.resolve(handle)?.deinit()
    }

    pub fn open(&self, handle: DriverHandle) -> Result<(), Status> {
        self.resolve(handle)?.open()
    }

    pub fn close(&self, handle: DriverHandle) -> Result<(), Status> {
        self.resolve(handle)?.close()
    }

    pub fn read(&self, handle: DriverHandle, buf: &mut [u8]) -> Result<usize, Status> {
        self.resolve(handle)?.read(buf)
    }

    pub fn write(&self, handle: DriverHandle, buf: &[u8]) -> Result<usize, Status> {
        self.resolve(handle)?.write(buf)
    }

    pub fn control(&self, handle: DriverHandle, request: IoRequest) -> Result<(), Status> {
        self.resolve(handle)?.control(request)
    }

    pub fn read_from_isr(&self, handle: DriverHandle, buf: &mut [u8]) -> Result<usize, Status> {
        self.resolve_from_isr(handle)?.read_from_isr(buf)
    }

    pub fn write_from_isr(&self, handle: DriverHandle, buf: &[u8]) -> Result<usize, Status> {
        self.resolve_from_isr(handle)?.write_from_isr(buf)
    }

    pub fn control_from_isr(
        &self,
        handle: DriverHandle,
        request: IoRequest,
    ) -> Result<(), Status> {
        self.resolve_from_isr(handle)?.control_from_isr(request)
    }

    /// Handles of every registered driver, in registration order.
    pub fn handles(&self) -> Vec<DriverHandle> {
        let inner = self.lock();
        inner
            .order
            .iter()
            .map(|&index| DriverHandle::new(index, inner.slots[index as usize].generation))
            .collect()
    }

    /// Handles sorted by power priority. Drivers of equal priority keep
    /// their registration order.
    pub fn sweep_order(&self, order: SortOrder) -> Vec<DriverHandle> {
        let inner = self.lock();
        let mut entries: Vec<(u8, DriverHandle)> = inner
            .order
            .iter()
            .filter_map(|&index| {
                let slot = &inner.slots[index as usize];
                let record = slot.record.as_ref()?;
                Some((
                    record.power_priority(),
                    DriverHandle::new(index, slot.generation),
                ))
            })
            .collect();
        match order {
            SortOrder::Ascending => entries.sort_by_key(|&(priority, _)| priority),
            SortOrder::Descending => {
                entries.sort_by_key(|&(priority, _)| std::cmp::Reverse(priority))
            }
        }
        entries.into_iter().map(|(_, handle)| handle).collect()
    }

    pub fn stats(&self, handle: DriverHandle) -> Result<DriverStats, Status> {
        Ok(self.resolve(handle)?.stats())
    }

    pub fn name(&self, handle: DriverHandle) -> Result<String, Status> {
        Ok(self.resolve(handle)?.name().to_string())
    }

    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
