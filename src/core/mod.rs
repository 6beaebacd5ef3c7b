//! Core scheduling functionality
//!
//! This module contains the task scheduler, its logging tasks and the
//! logging macros used throughout the crate.

pub mod logging;
pub mod scheduler;

pub use ttdelay_core::traits;
