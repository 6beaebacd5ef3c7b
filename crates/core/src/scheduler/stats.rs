//! CPU load accounting
//!
//! The scheduler reads and resets the platform load counter at three
//! points of every pass, splitting elapsed ticks into:
//! - idle: time spent outside `run` since the previous pass
//! - scheduler: time spent scanning and aging before the task starts
//! - per task: time spent inside the task's job
//!
//! A [`CpuLoadMonitor`] task periodically turns the accumulated ticks into
//! usage fractions and starts a new measurement window.

use super::registry::TaskRecord;
use super::task::{Job, TaskContext};
use super::types::SchedulerConfig;
use crate::traits::Tick;

/// Idle and scheduler tick accumulators plus their last computed fractions
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadAccounting<T: Tick> {
    /// Idle ticks in the current window
    pub idle_ticks: T,
    /// Scheduler overhead ticks in the current window
    pub scheduler_ticks: T,
    /// Idle share of the last completed window
    pub idle_usage: f32,
    /// Scheduler share of the last completed window
    pub scheduler_usage: f32,
}

impl<T: Tick> LoadAccounting<T> {
    /// Add idle ticks, wrapping at the counter width.
    pub fn add_idle(&mut self, ticks: T) {
        self.idle_ticks = self.idle_ticks.wrapping_add(ticks);
    }

    /// Add scheduler overhead ticks, wrapping at the counter width.
    pub fn add_scheduler(&mut self, ticks: T) {
        self.scheduler_ticks = self.scheduler_ticks.wrapping_add(ticks);
    }

    /// Sum of all accumulators, or `None` if it does not fit the counter width.
    pub(crate) fn total_ticks(&self, tasks: &[TaskRecord<T>]) -> Option<T> {
        let mut total = self.idle_ticks;
        for ticks in core::iter::once(self.scheduler_ticks).chain(tasks.iter().map(|t| t.run_time)) {
            let (sum, wrapped) = total.overflowing_add(ticks);
            if wrapped {
                return None;
            }
            total = sum;
        }
        Some(total)
    }

    /// Recompute usage fractions from the current window.
    ///
    /// Returns `false` and keeps the previous fractions when the window
    /// total overflowed or is zero.
    pub(crate) fn calculate(&mut self, tasks: &mut [TaskRecord<T>]) -> bool {
        let Some(total) = self.total_ticks(tasks) else {
            return false;
        };
        if total == T::ZERO {
            return false;
        }

        let total = total.as_f32();
        for task in tasks.iter_mut() {
            task.usage = task.run_time.as_f32() / total;
        }
        self.idle_usage = self.idle_ticks.as_f32() / total;
        self.scheduler_usage = self.scheduler_ticks.as_f32() / total;
        true
    }

    /// Start a new measurement window.
    pub(crate) fn reset_window(&mut self, tasks: &mut [TaskRecord<T>]) {
        for task in tasks.iter_mut() {
            task.run_time = T::ZERO;
        }
        self.idle_ticks = T::ZERO;
        self.scheduler_ticks = T::ZERO;
    }
}

/// Task that periodically updates CPU usage fractions
///
/// Register it like any other task; it reschedules itself every
/// `update_interval` ticks.
///
/// # Example
///
/// ```
/// use ttdelay_core::scheduler::{CpuLoadMonitor, Scheduler, SchedulerConfig};
/// use ttdelay_core::traits::MockTime;
///
/// let config = SchedulerConfig::default();
/// let mut sched: Scheduler<MockTime, 4> = Scheduler::new(MockTime::new(), config);
/// sched.register(CpuLoadMonitor::from_config(&config), 50).unwrap();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuLoadMonitor<T: Tick> {
    update_interval: T,
}

impl<T: Tick> CpuLoadMonitor<T> {
    /// Monitor updating every `update_interval` ticks
    pub const fn new(update_interval: T) -> Self {
        Self { update_interval }
    }

    /// Monitor using the configured update interval
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(T::saturating_from_u32(config.cpu_load_update_interval))
    }

    /// Ticks between updates
    pub fn update_interval(&self) -> T {
        self.update_interval
    }
}

impl<T: Tick> Job<T> for CpuLoadMonitor<T> {
    fn execute(&mut self, ctx: &mut TaskContext<'_, T>) {
        ctx.refresh_cpu_usage();
        ctx.from_last(self.update_interval);
    }
}
