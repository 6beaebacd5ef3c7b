//! Interrupt-driven tick counters
//!
//! A hardware timer interrupt advances a [`SharedTickCounter`] while the
//! main loop reads it. The load counter is additionally read and reset by
//! the scheduler, so both the increment and the read-and-reset run inside
//! a critical section.
//!
//! # Example
//!
//! ```
//! use ttdelay::platform::{InterruptClock, SharedTickCounter};
//! use ttdelay::core::scheduler::{Scheduler, SchedulerConfig};
//!
//! static SYSTEM_TICKS: SharedTickCounter = SharedTickCounter::new();
//! static LOAD_TICKS: SharedTickCounter = SharedTickCounter::new();
//!
//! // from the timer interrupt handler
//! fn on_timer_interrupt() {
//!     SYSTEM_TICKS.tick();
//!     LOAD_TICKS.tick();
//! }
//!
//! let clock = InterruptClock::with_load_counter(&SYSTEM_TICKS, &LOAD_TICKS);
//! let mut sched: Scheduler<InterruptClock<'static>> = Scheduler::new(clock, SchedulerConfig::default());
//! on_timer_interrupt();
//! sched.run();
//! ```

use core::cell::Cell;

use critical_section::Mutex;
use ttdelay_core::traits::TimeSource;

/// Wrapping `u32` counter shared between an interrupt and the main loop
pub struct SharedTickCounter {
    ticks: Mutex<Cell<u32>>,
}

impl SharedTickCounter {
    /// Counter starting at zero (const constructor for static initialization)
    pub const fn new() -> Self {
        Self {
            ticks: Mutex::new(Cell::new(0)),
        }
    }

    /// Advance by one tick.
    pub fn tick(&self) {
        self.add(1);
    }

    /// Advance by `ticks`, wrapping at `u32::MAX`.
    pub fn add(&self, ticks: u32) {
        critical_section::with(|cs| {
            let counter = self.ticks.borrow(cs);
            counter.set(counter.get().wrapping_add(ticks));
        });
    }

    /// Current value
    pub fn get(&self) -> u32 {
        critical_section::with(|cs| self.ticks.borrow(cs).get())
    }

    /// Overwrite the current value.
    pub fn set(&self, ticks: u32) {
        critical_section::with(|cs| self.ticks.borrow(cs).set(ticks));
    }

    /// Return the current value and reset it to zero in one step.
    pub fn read_reset(&self) -> u32 {
        critical_section::with(|cs| self.ticks.borrow(cs).replace(0))
    }
}

impl core::fmt::Debug for SharedTickCounter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("SharedTickCounter").field(&self.get()).finish()
    }
}

impl Default for SharedTickCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// [`TimeSource`] backed by interrupt-driven counters
///
/// Without a load counter, CPU load accounting reads zero ticks and all
/// usage fractions stay at their initial values.
#[derive(Debug, Clone, Copy)]
pub struct InterruptClock<'a> {
    system: &'a SharedTickCounter,
    load: Option<&'a SharedTickCounter>,
}

impl<'a> InterruptClock<'a> {
    /// Clock without load accounting
    pub const fn new(system: &'a SharedTickCounter) -> Self {
        Self { system, load: None }
    }

    /// Clock with a separate load counter for CPU usage accounting
    pub const fn with_load_counter(system: &'a SharedTickCounter, load: &'a SharedTickCounter) -> Self {
        Self {
            system,
            load: Some(load),
        }
    }
}

impl TimeSource for InterruptClock<'_> {
    type Tick = u32;

    fn now(&self) -> u32 {
        self.system.get()
    }

    fn read_reset_load_ticks(&self) -> u32 {
        self.load.map_or(0, SharedTickCounter::read_reset)
    }
}
