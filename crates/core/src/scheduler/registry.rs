//! Task registry
//!
//! The registry is a fixed-capacity table held by the [`Scheduler`].
//! Tasks are appended during initialization, keep their insertion order for
//! the life of the scheduler and are only removed by a full reset.

use alloc::boxed::Box;

use super::error::{Result, SchedulerError};
use super::executor::Scheduler;
use super::task::{BoxedJob, Job};
use super::timestamp::Timestamp;
use super::types::{AgingConfig, TaskFlags, TaskId, TaskSnapshot};
use crate::traits::{Tick, TimeSource};

/// One registered task
pub(crate) struct TaskRecord<T: Tick> {
    /// `None` only while the job is executing
    pub(crate) job: Option<BoxedJob<T>>,
    pub(crate) initial_priority: u8,
    pub(crate) current_priority: u8,
    pub(crate) next_execute: Timestamp<T>,
    pub(crate) last_execute: Timestamp<T>,
    pub(crate) period: T,
    pub(crate) flags: TaskFlags,
    pub(crate) overflow_pending: bool,
    pub(crate) due: bool,
    pub(crate) run_time: T,
    pub(crate) longest_run: T,
    pub(crate) usage: f32,
}

impl<T: Tick> TaskRecord<T> {
    pub(crate) fn new(job: BoxedJob<T>, priority: u8, now: Timestamp<T>) -> Self {
        Self {
            job: Some(job),
            initial_priority: priority,
            current_priority: priority,
            next_execute: now,
            last_execute: Timestamp::default(),
            period: T::ZERO,
            flags: TaskFlags::empty(),
            overflow_pending: false,
            due: false,
            run_time: T::ZERO,
            longest_run: T::ZERO,
            usage: 0.0,
        }
    }

    pub(crate) fn is_periodic(&self) -> bool {
        self.flags.contains(TaskFlags::PERIODIC)
    }

    pub(crate) fn from_last(&mut self, delay: T, now: Timestamp<T>) {
        let (next, wrapped) = self.next_execute.offset(delay);
        if wrapped {
            self.overflow_pending = true;
        }
        self.next_execute = next;

        if !self.flags.contains(TaskFlags::EVER_RUN) {
            self.flags.insert(TaskFlags::EVER_RUN);
            if self.is_periodic() && next.is_before(now) {
                let (snapped, wrapped) = now.offset(self.period);
                self.next_execute = snapped;
                self.overflow_pending = wrapped;
            }
        }
    }

    pub(crate) fn from_now(&mut self, delay: T, now: Timestamp<T>) {
        let (next, _) = now.offset(delay);
        self.next_execute = next;
        if next.is_before(self.last_execute) {
            self.overflow_pending = true;
        }
    }

    /// One aging step toward higher priority, within `aging` bounds.
    pub(crate) fn age(&mut self, aging: &AgingConfig) {
        if aging.can_age(self.current_priority, self.initial_priority) {
            self.current_priority -= 1;
        }
    }

    pub(crate) fn record_run(&mut self, elapsed: T) {
        self.run_time = self.run_time.wrapping_add(elapsed);
        if elapsed > self.longest_run {
            self.longest_run = elapsed;
        }
    }

    pub(crate) fn snapshot(&self, id: TaskId) -> TaskSnapshot<T> {
        TaskSnapshot {
            id,
            initial_priority: self.initial_priority,
            current_priority: self.current_priority,
            next_execute: self.next_execute,
            last_execute: self.last_execute,
            period: self.period,
            flags: self.flags,
            overflow_pending: self.overflow_pending,
            due: self.due,
            run_time: self.run_time,
            longest_run: self.longest_run,
            usage: self.usage,
        }
    }
}

impl<C: TimeSource, const N: usize> Scheduler<C, N> {
    /// Register a task that reschedules itself.
    ///
    /// The task is due immediately: its first execution time is the
    /// current tick. Smaller `priority` values run first.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::CapacityExceeded`] if `N` tasks are already
    /// registered. The table is not modified.
    pub fn register<J>(&mut self, job: J, priority: u8) -> Result<TaskId>
    where
        J: Job<C::Tick> + 'static,
    {
        self.push_task(Box::new(job), priority, None)
    }

    /// Register a task that is rescheduled `period` ticks after each run.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::CapacityExceeded`] if `N` tasks are already
    /// registered. The table is not modified.
    pub fn register_periodic<J>(&mut self, job: J, priority: u8, period: C::Tick) -> Result<TaskId>
    where
        J: Job<C::Tick> + 'static,
    {
        self.push_task(Box::new(job), priority, Some(period))
    }

    fn push_task(
        &mut self,
        job: BoxedJob<C::Tick>,
        priority: u8,
        period: Option<C::Tick>,
    ) -> Result<TaskId> {
        let capacity = SchedulerError::CapacityExceeded { capacity: N };
        if self.tasks.is_full() {
            return Err(capacity);
        }

        let now = Timestamp::new(self.time.now());
        let mut task = TaskRecord::new(job, priority, now);
        if let Some(period) = period {
            task.period = period;
            task.flags.insert(TaskFlags::PERIODIC);
        }

        let id = TaskId(self.tasks.len());
        self.tasks.push(task).map_err(|_| capacity)?;
        Ok(id)
    }

    /// Number of registered tasks
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Maximum number of tasks
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Snapshot of the task at `index`, or `None` if out of range
    pub fn task(&self, index: usize) -> Option<TaskSnapshot<C::Tick>> {
        self.tasks
            .get(index)
            .map(|task| task.snapshot(TaskId(index)))
    }

    /// Iterate over snapshots of all tasks in registration order
    pub fn tasks(&self) -> impl Iterator<Item = TaskSnapshot<C::Tick>> + '_ {
        self.tasks
            .iter()
            .enumerate()
            .map(|(index, task)| task.snapshot(TaskId(index)))
    }

    /// Whether the task at `index` was due in the last scan
    ///
    /// Out-of-range indices are never due.
    pub fn is_due(&self, index: usize) -> bool {
        self.tasks.get(index).is_some_and(|task| task.due)
    }

    /// Next execution time of the task at `index`
    pub fn next_schedule_time(&self, index: usize) -> Option<Timestamp<C::Tick>> {
        self.tasks.get(index).map(|task| task.next_execute)
    }
}
