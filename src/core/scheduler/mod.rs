//! Cooperative task scheduler
//!
//! Re-exports the scheduling engine from `ttdelay_core` and adds the tasks
//! that need logging, which the engine itself stays free of.

pub mod monitor;

pub use monitor::{CpuLoadReport, DEFAULT_BUSY_WARN_THRESHOLD};
pub use ttdelay_core::scheduler::*;
