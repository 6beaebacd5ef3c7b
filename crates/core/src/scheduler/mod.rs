//! Cooperative task scheduler
//!
//! Tasks are registered once with a priority and run to completion when
//! due. Each call to [`Scheduler::run`] performs one pass:
//!
//! 1. [`scan`](Scheduler::scan) classifies every task as due or not and
//!    selects the due task with the smallest priority value
//! 2. [`age_waiting_tasks`](Scheduler::age_waiting_tasks) raises the
//!    priority of due tasks that lost the selection
//! 3. [`run_task`](Scheduler::run_task) executes the selected task and
//!    applies its rescheduling
//!
//! # Components
//!
//! - [`types`]: Ids, flags, configuration and snapshots
//! - [`timestamp`]: Wrapping tick timestamps
//! - [`task`]: Jobs and the execution context
//! - [`registry`]: Task registration and lookup
//! - [`scan`]: Due-set scan and priority aging
//! - [`executor`]: Scheduler instance and task execution
//! - [`stats`]: CPU load accounting
//!
//! # Example
//!
//! ```rust
//! use ttdelay_core::scheduler::{RunStatus, Scheduler, SchedulerConfig, TaskContext};
//! use ttdelay_core::traits::MockTime;
//!
//! let time = MockTime::new();
//! let mut sched: Scheduler<MockTime> = Scheduler::new(time.clone(), SchedulerConfig::default());
//!
//! sched.register(|ctx: &mut TaskContext<'_, u32>| ctx.from_last(20), 3).unwrap();
//! sched.register(|ctx: &mut TaskContext<'_, u32>| ctx.from_now(50), 1).unwrap();
//!
//! assert_eq!(sched.run(), RunStatus::MoreTasksPending);
//! assert_eq!(sched.run(), RunStatus::Done);
//! assert_eq!(sched.next_schedule_time(0).unwrap().ticks(), 20);
//! assert_eq!(sched.next_schedule_time(1).unwrap().ticks(), 50);
//! ```

pub mod error;
pub mod executor;
pub mod registry;
pub mod scan;
pub mod stats;
pub mod task;
pub mod timestamp;
pub mod types;

pub use error::{Result, SchedulerError};
pub use executor::Scheduler;
pub use stats::{CpuLoadMonitor, LoadAccounting};
pub use task::{BoxedJob, Job, TaskContext};
pub use timestamp::Timestamp;
pub use types::*;
