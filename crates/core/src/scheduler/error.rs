//! Scheduler error types

use core::fmt;

/// Result type for scheduler operations
pub type Result<T> = core::result::Result<T, SchedulerError>;

/// Errors from scheduler operations
///
/// Both are permanent: retrying the same call gives the same answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// Task table is full; the table was left unchanged
    CapacityExceeded {
        /// Configured table size
        capacity: usize,
    },
    /// No replacement job was given; the running job is kept
    NullFunction,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::CapacityExceeded { capacity } => {
                write!(f, "task table full ({} tasks)", capacity)
            }
            SchedulerError::NullFunction => write!(f, "no task function given"),
        }
    }
}
