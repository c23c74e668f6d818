//! Kernel error types

use core_types::{Status, TaskId};
use thiserror::Error;

/// Errors that can occur when interacting with the kernel
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Task spawn failed
    #[error("failed to spawn task: {0}")]
    SpawnFailed(String),

    /// No task with this id is registered
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The target task's input queue is full
    #[error("input queue full for {0}")]
    QueueFull(TaskId),

    /// A bounded wait elapsed without a reply
    #[error("operation timed out")]
    Timeout,
}

impl KernelError {
    /// Maps this error onto the flat status space for acknowledgment wires
    /// and driver statistics.
    pub fn to_status(&self) -> Status {
        match self {
            KernelError::SpawnFailed(_) => Status::OutOfMemory,
            KernelError::TaskNotFound(_) => Status::TaskNotFound,
            KernelError::QueueFull(_) => Status::QueueFull,
            KernelError::Timeout => Status::Timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(KernelError::Timeout.to_status(), Status::Timeout);
        assert_eq!(
            KernelError::TaskNotFound(TaskId::from_raw(1)).to_status(),
            Status::TaskNotFound
        );
        assert_eq!(
            KernelError::QueueFull(TaskId::from_raw(2)).to_status(),
            Status::QueueFull
        );
    }

    #[test]
    fn test_display() {
        let error = KernelError::TaskNotFound(TaskId::from_raw(9));
        assert_eq!(error.to_string(), "task not found: Task(9)");
    }
}
