#![cfg_attr(not(test), no_std)]

//! ttdelay - Cooperative, non-blocking task scheduler for bare-metal main loops
//!
//! The scheduling engine lives in the `ttdelay_core` crate and is re-exported
//! from [`core::scheduler`]. This crate adds the logging macros, a CPU load
//! report task and interrupt-safe tick counters.
//!
//! # Example
//!
//! ```
//! use ttdelay::core::scheduler::{RunStatus, Scheduler, SchedulerConfig, TaskContext};
//! use ttdelay::platform::{InterruptClock, SharedTickCounter};
//!
//! static SYSTEM_TICKS: SharedTickCounter = SharedTickCounter::new();
//!
//! let mut sched: Scheduler<InterruptClock<'static>> =
//!     Scheduler::new(InterruptClock::new(&SYSTEM_TICKS), SchedulerConfig::default());
//! sched
//!     .register_periodic(|_ctx: &mut TaskContext<'_, u32>| { /* blink */ }, 10, 500)
//!     .unwrap();
//!
//! loop {
//!     if sched.run() == RunStatus::Done {
//!         // nothing else due: sleep until the next interrupt
//!         break;
//!     }
//! }
//! ```

// Scheduler, logging and re-exported engine
pub mod core;

// Interrupt-driven time sources
pub mod platform;
