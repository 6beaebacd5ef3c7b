//! Task jobs and the execution context
//!
//! A task's work is a [`Job`]: anything with an `execute` method, including
//! plain closures. The job closes over its own input and output state, so
//! the scheduler never sees it.
//!
//! While a job runs it receives a [`TaskContext`] for the task being
//! executed. The rescheduling primitives live on the context, so a job
//! never needs to know its own id and cannot touch any other task.

use alloc::boxed::Box;

use super::error::{Result, SchedulerError};
use super::registry::TaskRecord;
use super::stats::LoadAccounting;
use super::timestamp::Timestamp;
use super::types::TaskId;
use crate::traits::Tick;

/// Boxed, type-erased job as stored in the task table
pub type BoxedJob<T> = Box<dyn Job<T>>;

/// Unit of work run by the scheduler
///
/// Jobs run to completion and must not block.
///
/// # Example
///
/// ```
/// use ttdelay_core::scheduler::{Job, TaskContext};
///
/// struct Blink {
///     led_on: bool,
/// }
///
/// impl Job<u32> for Blink {
///     fn execute(&mut self, ctx: &mut TaskContext<'_, u32>) {
///         self.led_on = !self.led_on;
///         ctx.from_last(500);
///     }
/// }
/// ```
pub trait Job<T: Tick> {
    /// Run the task once.
    fn execute(&mut self, ctx: &mut TaskContext<'_, T>);
}

impl<T, F> Job<T> for F
where
    T: Tick,
    F: FnMut(&mut TaskContext<'_, T>),
{
    fn execute(&mut self, ctx: &mut TaskContext<'_, T>) {
        self(ctx)
    }
}

/// Execution context handed to the running job
pub struct TaskContext<'s, T: Tick> {
    tasks: &'s mut [TaskRecord<T>],
    load: &'s mut LoadAccounting<T>,
    index: usize,
    now: Timestamp<T>,
    rescheduled: bool,
    next_job: Option<BoxedJob<T>>,
}

impl<'s, T: Tick> TaskContext<'s, T> {
    pub(crate) fn new(
        tasks: &'s mut [TaskRecord<T>],
        load: &'s mut LoadAccounting<T>,
        index: usize,
        now: Timestamp<T>,
    ) -> Self {
        Self {
            tasks,
            load,
            index,
            now,
            rescheduled: false,
            next_job: None,
        }
    }

    /// Id of the running task
    pub fn task_id(&self) -> TaskId {
        TaskId(self.index)
    }

    /// Scan time of the current pass
    pub fn now(&self) -> Timestamp<T> {
        self.now
    }

    /// Schedule the next run `delay` ticks after the previous scheduled time.
    ///
    /// Anchoring to the scheduled time keeps the average period stable
    /// under jitter. On a periodic task's first call, a result already in
    /// the past is moved to `now + period` instead, so a late start does
    /// not trigger a burst of catch-up runs.
    pub fn from_last(&mut self, delay: T) {
        self.rescheduled = true;
        let now = self.now;
        self.tasks[self.index].from_last(delay, now);
    }

    /// Schedule the next run `delay` ticks after the current scan time.
    pub fn from_now(&mut self, delay: T) {
        self.rescheduled = true;
        let now = self.now;
        self.tasks[self.index].from_now(delay, now);
    }

    /// Replace the job run on this task's next invocation.
    ///
    /// Lets a task alternate between behaviours like a small state machine.
    /// `None` is rejected and the current job stays installed.
    pub fn set_next_function(&mut self, job: Option<BoxedJob<T>>) -> Result<()> {
        let job = job.ok_or(SchedulerError::NullFunction)?;
        self.next_job = Some(job);
        Ok(())
    }

    /// Close the current load window and recompute CPU usage fractions.
    ///
    /// Returns `false` when the window's tick total overflowed the counter
    /// width; the previous fractions are kept. Accumulators are reset in
    /// both cases.
    pub fn refresh_cpu_usage(&mut self) -> bool {
        let updated = self.load.calculate(self.tasks);
        self.load.reset_window(self.tasks);
        updated
    }

    /// Number of registered tasks
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Share of the last load window used by the task at `index`
    pub fn task_usage(&self, index: usize) -> f32 {
        self.tasks.get(index).map_or(0.0, |task| task.usage)
    }

    /// Share of the last load window spent idle
    pub fn idle_usage(&self) -> f32 {
        self.load.idle_usage
    }

    /// Share of the last load window spent in the scheduler
    pub fn scheduler_usage(&self) -> f32 {
        self.load.scheduler_usage
    }

    pub(crate) fn finish(self) -> (bool, Option<BoxedJob<T>>) {
        (self.rescheduled, self.next_job)
    }
}
