//! Core types for the task scheduler
//!
//! This module defines the fundamental types used by the scheduler:
//! - Task identity and flags
//! - Scheduler configuration (aging bounds, load update interval)
//! - Per-task snapshots for diagnostics
//! - CPU usage fractions

use bitflags::bitflags;
use heapless::Vec;

use super::timestamp::Timestamp;
use crate::traits::Tick;

/// Default task table capacity
pub const DEFAULT_MAX_TASKS: usize = 7;

/// Default maximum priority improvement reachable through aging
pub const DEFAULT_PRIORITY_MAX_CHANGE: u8 = 0xFF;

/// Default lowest priority value reachable through aging
pub const DEFAULT_PRIORITY_THRESHOLD: u8 = 15;

/// Default CPU load update interval in ticks
pub const DEFAULT_CPU_LOAD_UPDATE_INTERVAL: u32 = 1000;

bitflags! {
    /// Task state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TaskFlags: u8 {
        /// Task has made its first `from_last` scheduling decision
        const EVER_RUN = 0b0000_0001;
        /// Task is rescheduled by its period after every run
        const PERIODIC = 0b0000_0010;
    }
}

/// Index of a task in the registry, in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
    /// Creates an id for the task registered at `index`.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Registry index
    pub const fn index(self) -> usize {
        self.0
    }
}

impl core::fmt::Display for TaskId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Result of one scheduling pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// No further task is due in this pass
    Done,
    /// More tasks were due; call `run` again to drain them
    MoreTasksPending,
}

/// Priority aging bounds
///
/// Aging lowers the priority value (raising the priority) of tasks that are
/// due but were not selected. A task never ages below `priority_threshold`
/// and never improves by more than `max_change`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgingConfig {
    /// Apply aging at all
    pub enabled: bool,
    /// Maximum improvement relative to the initial priority
    pub max_change: u8,
    /// Lowest priority value aging may reach
    pub priority_threshold: u8,
}

impl AgingConfig {
    /// Aging switched off
    pub const DISABLED: Self = Self {
        enabled: false,
        max_change: 0,
        priority_threshold: 0,
    };

    /// Lowest priority value reachable from `initial_priority` by `max_change`.
    #[inline]
    pub const fn floor(&self, initial_priority: u8) -> u8 {
        initial_priority.saturating_sub(self.max_change)
    }

    /// Whether a task at `current` with baseline `initial` may age one step.
    #[inline]
    pub const fn can_age(&self, current: u8, initial: u8) -> bool {
        current > self.priority_threshold && current > self.floor(initial)
    }
}

impl Default for AgingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_change: DEFAULT_PRIORITY_MAX_CHANGE,
            priority_threshold: DEFAULT_PRIORITY_THRESHOLD,
        }
    }
}

/// Initialization-time scheduler configuration
///
/// Task table capacity is the `N` const parameter of the scheduler and the
/// tick width is the `Tick` type of its time source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Priority aging bounds
    pub aging: AgingConfig,
    /// Interval between CPU usage updates, in ticks
    pub cpu_load_update_interval: u32,
}

impl SchedulerConfig {
    /// Configuration with the library defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the aging bounds
    pub const fn with_aging(mut self, aging: AgingConfig) -> Self {
        self.aging = aging;
        self
    }

    /// Disable aging
    pub const fn without_aging(mut self) -> Self {
        self.aging = AgingConfig::DISABLED;
        self
    }

    /// Replace the CPU usage update interval
    pub const fn with_cpu_load_update_interval(mut self, ticks: u32) -> Self {
        self.cpu_load_update_interval = ticks;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            aging: AgingConfig::default(),
            cpu_load_update_interval: DEFAULT_CPU_LOAD_UPDATE_INTERVAL,
        }
    }
}

/// Copy of a task's scheduling state for diagnostics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskSnapshot<T: Tick> {
    /// Registry position
    pub id: TaskId,
    /// Priority the task was registered with
    pub initial_priority: u8,
    /// Priority after aging
    pub current_priority: u8,
    /// Next time the task becomes due
    pub next_execute: Timestamp<T>,
    /// Scan time of the last execution
    pub last_execute: Timestamp<T>,
    /// Period for periodic tasks
    pub period: T,
    /// State flags
    pub flags: TaskFlags,
    /// Next execution time wrapped past the counter maximum
    pub overflow_pending: bool,
    /// Due in the last scan
    pub due: bool,
    /// Running time accumulated in the current load window
    pub run_time: T,
    /// Longest single execution observed
    pub longest_run: T,
    /// Share of the last completed load window
    pub usage: f32,
}

impl<T: Tick> TaskSnapshot<T> {
    /// Task is rescheduled by its period after each run
    pub fn is_periodic(&self) -> bool {
        self.flags.contains(TaskFlags::PERIODIC)
    }
}

/// CPU usage fractions from the last completed load window
///
/// All fractions are in `0.0..=1.0` and sum to 1.0 after an update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CpuUsage<const N: usize> {
    /// Per task, in registration order
    pub tasks: Vec<f32, N>,
    /// Time spent outside the scheduler between passes
    pub idle: f32,
    /// Time spent in the scheduler itself
    pub scheduler: f32,
}

impl<const N: usize> CpuUsage<N> {
    /// Share of time spent running tasks
    pub fn busy(&self) -> f32 {
        self.tasks.iter().sum()
    }

    /// Sum of every fraction
    pub fn total(&self) -> f32 {
        self.busy() + self.idle + self.scheduler
    }
}
