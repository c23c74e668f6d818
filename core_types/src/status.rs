//! The flat status enumeration shared by every module.
//!
//! Status codes are grouped by module-scoped base offsets so that a bare
//! numeric code is attributable to the module that produced it: general
//! codes at 0x000, driver lifecycle at 0x100, power coordination at 0x200,
//! kernel interaction at 0x300. Acknowledgment signals carry the 16-bit
//! code on the wire, so [`Status::code`] and [`Status::from_code`] must
//! round-trip every variant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base offset for general/reference statuses.
pub const STATUS_BASE_GENERAL: u16 = 0x000;
/// Base offset for driver lifecycle statuses.
pub const STATUS_BASE_DRIVER: u16 = 0x100;
/// Base offset for power coordination statuses.
pub const STATUS_BASE_POWER: u16 = 0x200;
/// Base offset for kernel interaction statuses.
pub const STATUS_BASE_KERNEL: u16 = 0x300;

/// Non-OK outcome of a core operation.
///
/// One flat enumeration rather than per-crate error types: statuses cross
/// task boundaries inside acknowledgment signals, and a single code space
/// keeps that wire form unambiguous. `AlreadyInitialized` is an idempotence
/// signal, not a failure; callers treat it as success.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Handle or reference does not name a live object
    #[error("invalid reference")]
    InvalidRef,

    /// Allocation failed
    #[error("out of memory")]
    OutOfMemory,

    /// The driver does not implement the requested capability
    #[error("unsupported operation")]
    UnsupportedOperation,

    /// A non-blocking lock acquisition found the lock held
    #[error("resource busy")]
    Busy,

    /// A bounded wait elapsed without completion
    #[error("operation timed out")]
    Timeout,

    /// A bounded queue rejected a send
    #[error("queue full")]
    QueueFull,

    /// Operation requires a prior successful init
    #[error("driver not initialized")]
    NotInitialized,

    /// Init was already performed; state is unchanged
    #[error("driver already initialized")]
    AlreadyInitialized,

    /// Operation requires a prior successful open
    #[error("driver not open")]
    NotOpen,

    /// Driver is already open
    #[error("driver already open")]
    AlreadyOpen,

    /// Driver still has owners; close them before unregistering
    #[error("driver still open")]
    StillOpen,

    /// A power sweep aborted before reaching the target state
    #[error("power transition failed")]
    TransitionFailed,

    /// The single rollback attempt also failed
    #[error("power rollback failed")]
    RollbackFailed,

    /// A task's acknowledgment reported failure or never arrived
    #[error("no acknowledgment from task")]
    NoAck,

    /// The named task is not registered with the kernel
    #[error("task not found")]
    TaskNotFound,
}

impl Status {
    /// Returns the 16-bit wire code for this status.
    pub const fn code(&self) -> u16 {
        match self {
            Status::InvalidRef => STATUS_BASE_GENERAL + 0x01,
            Status::OutOfMemory => STATUS_BASE_GENERAL + 0x02,
            Status::UnsupportedOperation => STATUS_BASE_GENERAL + 0x03,
            Status::Busy => STATUS_BASE_GENERAL + 0x04,
            Status::Timeout => STATUS_BASE_GENERAL + 0x05,
            Status::QueueFull => STATUS_BASE_GENERAL + 0x06,
            Status::NotInitialized => STATUS_BASE_DRIVER + 0x01,
            Status::AlreadyInitialized => STATUS_BASE_DRIVER + 0x02,
            Status::NotOpen => STATUS_BASE_DRIVER + 0x03,
            Status::AlreadyOpen => STATUS_BASE_DRIVER + 0x04,
            Status::StillOpen => STATUS_BASE_DRIVER + 0x05,
            Status::TransitionFailed => STATUS_BASE_POWER + 0x01,
            Status::RollbackFailed => STATUS_BASE_POWER + 0x02,
            Status::NoAck => STATUS_BASE_POWER + 0x03,
            Status::TaskNotFound => STATUS_BASE_KERNEL + 0x01,
        }
    }

    /// Decodes a 16-bit wire code back into a status.
    ///
    /// Returns `None` for codes no module has allocated.
    pub const fn from_code(code: u16) -> Option<Status> {
        Some(match code {
            0x001 => Status::InvalidRef,
            0x002 => Status::OutOfMemory,
            0x003 => Status::UnsupportedOperation,
            0x004 => Status::Busy,
            0x005 => Status::Timeout,
            0x006 => Status::QueueFull,
            0x101 => Status::NotInitialized,
            0x102 => Status::AlreadyInitialized,
            0x103 => Status::NotOpen,
            0x104 => Status::AlreadyOpen,
            0x105 => Status::StillOpen,
            0x201 => Status::TransitionFailed,
            0x202 => Status::RollbackFailed,
            0x203 => Status::NoAck,
            0x301 => Status::TaskNotFound,
            _ => return None,
        })
    }

    /// All statuses, in code order. Used for exhaustive wire checks.
    pub const ALL: [Status; 15] = [
        Status::InvalidRef,
        Status::OutOfMemory,
        Status::UnsupportedOperation,
        Status::Busy,
        Status::Timeout,
        Status::QueueFull,
        Status::NotInitialized,
        Status::AlreadyInitialized,
        Status::NotOpen,
        Status::AlreadyOpen,
        Status::StillOpen,
        Status::TransitionFailed,
        Status::RollbackFailed,
        Status::NoAck,
        Status::TaskNotFound,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip_all_variants() {
        for status in Status::ALL {
            assert_eq!(Status::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn test_codes_are_unique() {
        for (i, a) in Status::ALL.iter().enumerate() {
            for b in &Status::ALL[i + 1..] {
                assert_ne!(a.code(), b.code());
            }
        }
    }

    #[test]
    fn test_unallocated_code_decodes_to_none() {
        assert_eq!(Status::from_code(0x0FF), None);
        assert_eq!(Status::from_code(0xFFFF), None);
        assert_eq!(Status::from_code(0), None);
    }

    #[test]
    fn test_module_base_grouping() {
        assert_eq!(Status::InvalidRef.code() & 0xF00, STATUS_BASE_GENERAL);
        assert_eq!(Status::NotOpen.code() & 0xF00, STATUS_BASE_DRIVER);
        assert_eq!(Status::NoAck.code() & 0xF00, STATUS_BASE_POWER);
        assert_eq!(Status::TaskNotFound.code() & 0xF00, STATUS_BASE_KERNEL);
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(Status::NotOpen.to_string(), "driver not open");
        assert_eq!(Status::Timeout.to_string(), "operation timed out");
    }
}
