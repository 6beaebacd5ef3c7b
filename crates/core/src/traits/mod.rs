//! Core traits for platform-agnostic scheduling.
//!
//! This module provides trait abstractions that decouple the scheduling
//! engine from platform-specific tick counters.
//!
//! # Design
//!
//! - Trait definitions are pure and have no feature gates
//! - Mock implementations are always available for host testing
//! - Interrupt-driven implementations live in the root crate

pub mod time;

pub use time::{MockTime, Tick, TimeSource};
