//! ttdelay_core - Pure no_std cooperative task scheduling engine
//!
//! This crate contains the platform-agnostic scheduler that can be tested
//! on host without any feature flags or hardware timers.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` directives allowed
//! - **Pure no_std**: Only `core` and `alloc`
//! - **Trait abstractions**: The tick counter is injected via [`traits::TimeSource`]
//!
//! # Modules
//!
//! - [`traits`]: Platform-agnostic trait abstractions (TimeSource)
//! - [`scheduler`]: Task registry, due scan, aging, execution and CPU load

#![no_std]

extern crate alloc;

pub mod scheduler;
pub mod traits;
