//! Platform glue
//!
//! Everything that touches interrupt context lives here. The scheduling
//! engine only sees the [`TimeSource`](ttdelay_core::traits::TimeSource)
//! implemented on top of it.

pub mod tick;

pub use tick::{InterruptClock, SharedTickCounter};
