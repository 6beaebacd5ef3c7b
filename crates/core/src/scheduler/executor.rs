//! Scheduler instance and task execution
//!
//! The [`Scheduler`] owns the task table, the time source and all scan
//! and accounting state. The surrounding main loop calls
//! [`Scheduler::run`] repeatedly; each call runs at most one task.

use heapless::Vec;

use super::registry::TaskRecord;
use super::stats::LoadAccounting;
use super::task::TaskContext;
use super::timestamp::Timestamp;
use super::types::{CpuUsage, RunStatus, SchedulerConfig, TaskId, DEFAULT_MAX_TASKS};
use crate::traits::TimeSource;

/// Cooperative task scheduler with room for `N` tasks
///
/// # Example
///
/// ```
/// use ttdelay_core::scheduler::{RunStatus, Scheduler, SchedulerConfig, TaskContext};
/// use ttdelay_core::traits::MockTime;
///
/// let time = MockTime::new();
/// let mut sched: Scheduler<MockTime> = Scheduler::new(time.clone(), SchedulerConfig::default());
///
/// sched
///     .register_periodic(|_ctx: &mut TaskContext<'_, u32>| { /* sample sensor */ }, 10, 100)
///     .unwrap();
///
/// assert_eq!(sched.run(), RunStatus::Done);
/// assert_eq!(sched.next_schedule_time(0).unwrap().ticks(), 100);
/// ```
pub struct Scheduler<C: TimeSource, const N: usize = DEFAULT_MAX_TASKS> {
    pub(crate) time: C,
    pub(crate) config: SchedulerConfig,
    pub(crate) tasks: Vec<TaskRecord<C::Tick>, N>,
    pub(crate) load: LoadAccounting<C::Tick>,
    pub(crate) current_time: Timestamp<C::Tick>,
    pub(crate) previous_scan: Timestamp<C::Tick>,
    pub(crate) last_run_time: Timestamp<C::Tick>,
    pub(crate) selected: Option<usize>,
    pub(crate) due_count: usize,
}

impl<C: TimeSource, const N: usize> Scheduler<C, N> {
    /// Create an empty scheduler reading time from `time`.
    pub fn new(time: C, config: SchedulerConfig) -> Self {
        Self {
            time,
            config,
            tasks: Vec::new(),
            load: LoadAccounting::default(),
            current_time: Timestamp::default(),
            previous_scan: Timestamp::default(),
            last_run_time: Timestamp::default(),
            selected: None,
            due_count: 0,
        }
    }

    /// Run one scheduling pass.
    ///
    /// Charges the ticks since the previous pass to idle time, scans for
    /// due tasks, ages the waiting ones and runs the selected task.
    /// Returns [`RunStatus::MoreTasksPending`] when other tasks were due as
    /// well; the caller should call `run` again to drain them.
    pub fn run(&mut self) -> RunStatus {
        let idle = self.time.read_reset_load_ticks();
        self.load.add_idle(idle);

        let Some(id) = self.scan() else {
            return RunStatus::Done;
        };
        self.age_waiting_tasks();
        self.run_task(id);

        if self.due_count > 1 {
            RunStatus::MoreTasksPending
        } else {
            RunStatus::Done
        }
    }

    /// Execute one task at the current scan time.
    ///
    /// Resets the task's priority, applies its period when the job did not
    /// reschedule itself, and records the execution duration. Unknown ids
    /// are ignored.
    pub fn run_task(&mut self, id: TaskId) {
        let index = id.index();
        let now = self.current_time;
        let Some(task) = self.tasks.get_mut(index) else {
            return;
        };
        task.last_execute = now;
        let Some(mut job) = task.job.take() else {
            return;
        };

        let overhead = self.time.read_reset_load_ticks();
        self.load.add_scheduler(overhead);

        let mut ctx = TaskContext::new(&mut self.tasks, &mut self.load, index, now);
        job.execute(&mut ctx);
        let (rescheduled, next_job) = ctx.finish();

        let task = &mut self.tasks[index];
        task.current_priority = task.initial_priority;
        if task.is_periodic() && !rescheduled {
            task.from_last(task.period, now);
        }
        task.job = Some(next_job.unwrap_or(job));

        self.last_run_time = now;
        let elapsed = self.time.read_reset_load_ticks();
        task.record_run(elapsed);
    }

    /// Remove every task and clear all scan and accounting state.
    pub fn reset(&mut self) {
        self.tasks.clear();
        self.load = LoadAccounting::default();
        self.current_time = Timestamp::default();
        self.previous_scan = Timestamp::default();
        self.last_run_time = Timestamp::default();
        self.selected = None;
        self.due_count = 0;
    }

    /// Active configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The time source
    pub fn time_source(&self) -> &C {
        &self.time
    }

    /// Time read by the last scan
    pub fn current_time(&self) -> Timestamp<C::Tick> {
        self.current_time
    }

    /// Scan time of the last executed task
    pub fn last_run_time(&self) -> Timestamp<C::Tick> {
        self.last_run_time
    }

    /// Usage fractions of the last completed load window
    pub fn cpu_usage(&self) -> CpuUsage<N> {
        let mut usage = CpuUsage {
            idle: self.load.idle_usage,
            scheduler: self.load.scheduler_usage,
            ..CpuUsage::default()
        };
        for task in &self.tasks {
            // same capacity as the task table
            let _ = usage.tasks.push(task.usage);
        }
        usage
    }

    /// Usage fraction of the task at `index`, 0.0 if out of range
    pub fn task_usage(&self, index: usize) -> f32 {
        self.tasks.get(index).map_or(0.0, |task| task.usage)
    }

    /// Idle fraction of the last completed load window
    pub fn idle_usage(&self) -> f32 {
        self.load.idle_usage
    }

    /// Scheduler overhead fraction of the last completed load window
    pub fn scheduler_usage(&self) -> f32 {
        self.load.scheduler_usage
    }

    /// Idle and scheduler tick accumulators of the current window
    pub fn load(&self) -> &LoadAccounting<C::Tick> {
        &self.load
    }

    /// Overwrite the idle tick accumulator.
    pub fn set_idle_ticks(&mut self, ticks: C::Tick) {
        self.load.idle_ticks = ticks;
    }

    /// Overwrite the scheduler overhead tick accumulator.
    pub fn set_scheduler_ticks(&mut self, ticks: C::Tick) {
        self.load.scheduler_ticks = ticks;
    }

    /// Overwrite the running time accumulated by the task at `index`.
    ///
    /// Returns `false` if `index` is out of range.
    pub fn set_task_run_time(&mut self, index: usize, ticks: C::Tick) -> bool {
        match self.tasks.get_mut(index) {
            Some(task) => {
                task.run_time = ticks;
                true
            }
            None => false,
        }
    }
}

impl<C: TimeSource, const N: usize> core::fmt::Debug for Scheduler<C, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scheduler")
            .field("tasks", &self.tasks.len())
            .field("capacity", &N)
            .field("current_time", &self.current_time)
            .field("selected", &self.selected)
            .field("due_count", &self.due_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{AgingConfig, CpuLoadMonitor, SchedulerError};
    use crate::traits::MockTime;
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use core::cell::Cell;

    type Ctx<'a> = TaskContext<'a, u32>;

    fn sched<const M: usize>(time: &MockTime) -> Scheduler<MockTime, M> {
        Scheduler::new(time.clone(), SchedulerConfig::default())
    }

    #[test]
    fn run_with_no_tasks_is_done() {
        let time = MockTime::with_initial(3);
        let mut s = sched::<4>(&time);
        assert_eq!(s.run(), RunStatus::Done);
        assert_eq!(s.next_scheduled(), None);
    }

    #[test]
    fn run_reports_more_pending_tasks() {
        let time = MockTime::new();
        let mut s = sched::<4>(&time);
        s.register(|ctx: &mut Ctx<'_>| ctx.from_last(50), 1).unwrap();
        s.register(|ctx: &mut Ctx<'_>| ctx.from_last(50), 2).unwrap();

        time.set(1);
        assert_eq!(s.run(), RunStatus::MoreTasksPending);
        assert_eq!(s.run(), RunStatus::Done);
        assert_eq!(s.run(), RunStatus::Done);
        assert_eq!(s.due_count(), 0);
    }

    #[test]
    fn priority_resets_after_execution() {
        let time = MockTime::new();
        let config = SchedulerConfig::default().with_aging(AgingConfig {
            enabled: true,
            max_change: 0xFF,
            priority_threshold: 0,
        });
        let mut s: Scheduler<MockTime, 4> = Scheduler::new(time.clone(), config);
        for priority in [1, 20, 30] {
            s.register(|ctx: &mut Ctx<'_>| ctx.from_last(100), priority).unwrap();
        }

        time.set(1);
        s.run();
        assert_eq!(s.task(1).unwrap().current_priority, 19);
        assert_eq!(s.task(2).unwrap().current_priority, 29);
        s.run();
        assert_eq!(s.task(1).unwrap().current_priority, 20);
        assert_eq!(s.task(2).unwrap().current_priority, 28);
        s.run();
        assert_eq!(s.task(2).unwrap().current_priority, 30);
    }

    #[test]
    fn run_task_records_last_execute_and_last_run_time() {
        let time = MockTime::new();
        let mut s = sched::<2>(&time);
        s.register(|ctx: &mut Ctx<'_>| ctx.from_now(10), 1).unwrap();

        time.set(77);
        s.run();
        let task = s.task(0).unwrap();
        assert_eq!(task.last_execute.ticks(), 77);
        assert_eq!(task.next_execute.ticks(), 87);
        assert_eq!(s.last_run_time().ticks(), 77);
    }

    #[test]
    fn periodic_task_rescheduled_automatically() {
        let time = MockTime::new();
        let mut s = sched::<2>(&time);
        s.register_periodic(|_ctx: &mut Ctx<'_>| {}, 1, 40).unwrap();

        time.set(0);
        s.run();
        assert_eq!(s.next_schedule_time(0).unwrap().ticks(), 40);
        assert!(s.task(0).unwrap().flags.contains(crate::scheduler::TaskFlags::EVER_RUN));
    }

    #[test]
    fn job_reschedule_takes_precedence_over_period() {
        let time = MockTime::new();
        let mut s = sched::<2>(&time);
        s.register_periodic(|ctx: &mut Ctx<'_>| ctx.from_now(5), 1, 40).unwrap();

        time.set(10);
        s.run();
        assert_eq!(s.next_schedule_time(0).unwrap().ticks(), 15);
    }

    #[test]
    fn task_without_reschedule_stays_due() {
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let time = MockTime::new();
        let mut s = sched::<2>(&time);
        s.register(move |_ctx: &mut Ctx<'_>| counter.set(counter.get() + 1), 1).unwrap();

        for _ in 0..3 {
            s.run();
        }
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn set_next_function_swaps_job() {
        let output = Rc::new(Cell::new(0));
        let out = output.clone();
        let time = MockTime::new();
        let mut s = sched::<2>(&time);
        s.register(
            move |ctx: &mut Ctx<'_>| {
                out.set(1);
                let next = out.clone();
                ctx.set_next_function(Some(Box::new(move |ctx: &mut Ctx<'_>| {
                    next.set(2);
                    ctx.from_now(10);
                })))
                .unwrap();
                ctx.from_now(10);
            },
            1,
        )
        .unwrap();

        s.run();
        assert_eq!(output.get(), 1);
        time.set(10);
        s.run();
        assert_eq!(output.get(), 2);
        time.set(20);
        s.run();
        assert_eq!(output.get(), 2);
    }

    #[test]
    fn set_next_function_rejects_none() {
        let result = Rc::new(Cell::new(None));
        let seen = result.clone();
        let runs = Rc::new(Cell::new(0));
        let count = runs.clone();
        let time = MockTime::new();
        let mut s = sched::<2>(&time);
        s.register(
            move |ctx: &mut Ctx<'_>| {
                count.set(count.get() + 1);
                seen.set(Some(ctx.set_next_function(None)));
            },
            1,
        )
        .unwrap();

        s.run();
        s.run();
        assert_eq!(result.get(), Some(Err(SchedulerError::NullFunction)));
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn execution_duration_is_accounted() {
        let time = MockTime::new();
        let work = time.clone();
        let mut s = sched::<2>(&time);
        s.register(
            move |ctx: &mut Ctx<'_>| {
                work.add_load_ticks(120);
                ctx.from_now(10);
            },
            1,
        )
        .unwrap();

        time.add_load_ticks(30); // idle before the pass
        s.run();
        time.set(10);
        time.script_load_ticks(&[0, 5, 60]);
        s.run();

        let task = s.task(0).unwrap();
        assert_eq!(task.run_time, 180);
        assert_eq!(task.longest_run, 120);
        assert_eq!(s.load().idle_ticks, 30);
        assert_eq!(s.load().scheduler_ticks, 5);
        // the scripted reads replaced the job's own load ticks
        assert_eq!(time.read_reset_load_ticks(), 120);
    }

    #[test]
    fn cpu_load_monitor_updates_usage() {
        let time = MockTime::new();
        let mut s = sched::<4>(&time);
        for priority in [10, 5, 2] {
            s.register(|ctx: &mut Ctx<'_>| ctx.from_last(50), priority).unwrap();
        }
        let monitor = s.register_periodic(CpuLoadMonitor::new(1000), 50, 1000).unwrap();

        s.set_task_run_time(0, 100);
        s.set_task_run_time(1, 200);
        s.set_task_run_time(2, 400);
        s.set_idle_ticks(200);
        s.set_scheduler_ticks(50);

        s.run_task(monitor);

        let usage = s.cpu_usage();
        let expected = [100.0 / 950.0, 200.0 / 950.0, 400.0 / 950.0, 0.0];
        for (actual, expected) in usage.tasks.iter().zip(expected) {
            assert!((actual - expected).abs() < 0.001);
        }
        assert!((usage.idle - 200.0 / 950.0).abs() < 0.001);
        assert!((usage.scheduler - 50.0 / 950.0).abs() < 0.001);
        assert!((usage.total() - 1.0).abs() < 0.001);

        // a new window has started
        assert_eq!(s.task(0).unwrap().run_time, 0);
        assert_eq!(s.load().idle_ticks, 0);
        assert_eq!(s.next_schedule_time(monitor.index()).unwrap().ticks(), 1000);
    }

    #[test]
    fn reset_clears_everything() {
        let time = MockTime::new();
        let mut s = sched::<2>(&time);
        s.register(|ctx: &mut Ctx<'_>| ctx.from_last(1), 1).unwrap();
        s.set_idle_ticks(9);
        s.run();

        s.reset();

        assert_eq!(s.task_count(), 0);
        assert_eq!(s.next_scheduled(), None);
        assert_eq!(s.due_count(), 0);
        assert_eq!(*s.load(), LoadAccounting::default());
        assert!(s.register(|_ctx: &mut Ctx<'_>| {}, 1).is_ok());
    }

    #[test]
    fn run_task_ignores_unknown_id() {
        let time = MockTime::new();
        let mut s = sched::<2>(&time);
        s.run_task(TaskId::new(5));
        assert_eq!(s.last_run_time().ticks(), 0);
    }

    #[test]
    fn narrow_tick_width_wraps() {
        let time: MockTime<u8> = MockTime::new();
        let mut s: Scheduler<MockTime<u8>, 2> = Scheduler::new(time.clone(), SchedulerConfig::default());
        s.register(|ctx: &mut TaskContext<'_, u8>| ctx.from_now(20), 1).unwrap();

        time.set(250);
        s.run();
        assert!(s.task(0).unwrap().overflow_pending);
        assert_eq!(s.next_schedule_time(0).unwrap().ticks(), 14);

        time.set(255);
        assert_eq!(s.run(), RunStatus::Done);
        assert_eq!(s.last_run_time().ticks(), 250);

        time.set(14);
        s.run();
        assert_eq!(s.last_run_time().ticks(), 14);
    }
}
