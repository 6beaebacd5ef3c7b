//! Due-set scan and priority aging
//!
//! Every pass starts with a scan: each task is classified as due or not,
//! and the due task with the numerically smallest priority is selected.
//! When more than one task is due, the waiting ones age one step toward
//! higher priority so they cannot starve.

use super::executor::Scheduler;
use super::timestamp::Timestamp;
use super::types::TaskId;
use crate::traits::TimeSource;

impl<C: TimeSource, const N: usize> Scheduler<C, N> {
    /// Classify every task as due or not due at the current tick.
    ///
    /// Reads the time source once. If the reading is below the previous
    /// scan's, the counter has wrapped and every task's overflow-pending
    /// flag is cleared first. A task is due when the scan time has reached
    /// its next execution time and no overflow is pending.
    ///
    /// Returns the selected task: the due task with the smallest priority
    /// value, the earliest registered one on ties.
    pub fn scan(&mut self) -> Option<TaskId> {
        let now = Timestamp::new(self.time.now());
        let clock_wrapped = now.wrapped_since(self.previous_scan);
        self.current_time = now;
        self.previous_scan = now;
        self.due_count = 0;

        let mut selected: Option<(usize, u8)> = None;
        for (index, task) in self.tasks.iter_mut().enumerate() {
            if clock_wrapped {
                task.overflow_pending = false;
            }

            task.due = now.has_reached(task.next_execute) && !task.overflow_pending;
            if !task.due {
                continue;
            }
            self.due_count += 1;

            // strict improvement keeps the first registered task on ties
            match selected {
                Some((_, best)) if task.current_priority >= best => {}
                _ => selected = Some((index, task.current_priority)),
            }
        }

        self.selected = selected.map(|(index, _)| index);
        self.next_scheduled()
    }

    /// Age every due task that was not selected by the last scan.
    ///
    /// Does nothing when aging is disabled or fewer than two tasks are due.
    pub fn age_waiting_tasks(&mut self) {
        let aging = self.config.aging;
        if !aging.enabled || self.due_count < 2 {
            return;
        }

        for (index, task) in self.tasks.iter_mut().enumerate() {
            if task.due && self.selected != Some(index) {
                task.age(&aging);
            }
        }
    }

    /// Task selected by the last scan
    pub fn next_scheduled(&self) -> Option<TaskId> {
        self.selected.map(TaskId)
    }

    /// Number of tasks due in the last scan
    pub fn due_count(&self) -> usize {
        self.due_count
    }
}
