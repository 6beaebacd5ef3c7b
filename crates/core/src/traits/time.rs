//! Time abstraction traits for the scheduling engine.
//!
//! This module provides the `TimeSource` trait that abstracts over the
//! platform tick counter, so the scheduler can be tested on host without
//! any hardware timer.

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

/// Unsigned integer usable as a free-running tick counter.
///
/// Counters are fixed width and wrap silently. The width is chosen by the
/// [`TimeSource`] implementation (`u8`, `u16`, `u32` or `u64`).
pub trait Tick: Copy + Ord + Default + fmt::Debug {
    /// Zero ticks
    const ZERO: Self;
    /// Largest representable counter value
    const MAX: Self;

    /// Add with wrap, reporting whether the counter range was exceeded.
    fn overflowing_add(self, rhs: Self) -> (Self, bool);

    /// Convert to `f32` for usage fractions.
    fn as_f32(self) -> f32;

    /// Convert a configuration value, clamping to [`Tick::MAX`].
    fn saturating_from_u32(value: u32) -> Self;

    /// Add with silent wrap.
    #[inline]
    fn wrapping_add(self, rhs: Self) -> Self {
        self.overflowing_add(rhs).0
    }
}

macro_rules! impl_tick {
    ($($ty:ty),*) => {$(
        impl Tick for $ty {
            const ZERO: Self = 0;
            const MAX: Self = <$ty>::MAX;

            #[inline]
            fn overflowing_add(self, rhs: Self) -> (Self, bool) {
                <$ty>::overflowing_add(self, rhs)
            }

            #[inline]
            fn as_f32(self) -> f32 {
                self as f32
            }

            #[inline]
            fn saturating_from_u32(value: u32) -> Self {
                <$ty>::try_from(value).unwrap_or(<$ty>::MAX)
            }
        }
    )*};
}

impl_tick!(u8, u16, u32, u64);

/// Platform tick source for the scheduler.
///
/// `now` must be a monotonic counter that wraps silently at
/// [`Tick::MAX`]. `read_reset_load_ticks` is only needed when CPU load
/// accounting is wanted: it returns a separate counter and resets it to
/// zero in one step. If the counter is advanced from an interrupt, the
/// implementation must make that step atomic with respect to the interrupt.
///
/// # Example
///
/// ```
/// use ttdelay_core::traits::{MockTime, TimeSource};
///
/// let time: MockTime<u32> = MockTime::new();
/// time.advance(250);
/// assert_eq!(time.now(), 250);
/// assert_eq!(time.read_reset_load_ticks(), 0);
/// ```
pub trait TimeSource {
    /// Counter width
    type Tick: Tick;

    /// Returns the current value of the free-running tick counter.
    fn now(&self) -> Self::Tick;

    /// Returns the load counter and resets it to zero.
    ///
    /// The default implementation disables load accounting.
    fn read_reset_load_ticks(&self) -> Self::Tick {
        Self::Tick::ZERO
    }
}

impl<S: TimeSource + ?Sized> TimeSource for &S {
    type Tick = S::Tick;

    fn now(&self) -> Self::Tick {
        (**self).now()
    }

    fn read_reset_load_ticks(&self) -> Self::Tick {
        (**self).read_reset_load_ticks()
    }
}

// ============================================================================
// Mock Implementation (always available for testing)
// ============================================================================

#[derive(Default)]
struct MockState<T: Tick> {
    now: Cell<T>,
    load_ticks: Cell<T>,
    scripted_load: RefCell<VecDeque<T>>,
}

/// Mock time source with controllable time advancement.
///
/// Clones share the same counters, so a test can keep one handle while the
/// scheduler owns another, and task closures can hold a third to simulate
/// work by adding load ticks.
///
/// # Example
///
/// ```
/// use ttdelay_core::traits::{MockTime, TimeSource};
///
/// let time: MockTime<u16> = MockTime::with_initial(u16::MAX);
/// let handle = time.clone();
/// handle.advance(2);
/// assert_eq!(time.now(), 1);
/// ```
#[derive(Clone, Default)]
pub struct MockTime<T: Tick = u32> {
    state: Rc<MockState<T>>,
}

impl<T: Tick> MockTime<T> {
    /// Creates a new `MockTime` starting at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `MockTime` starting at the specified tick.
    pub fn with_initial(ticks: T) -> Self {
        let time = Self::default();
        time.set(ticks);
        time
    }

    /// Sets the current tick to an absolute value.
    pub fn set(&self, ticks: T) {
        self.state.now.set(ticks);
    }

    /// Advances the current tick, wrapping at the counter width.
    pub fn advance(&self, ticks: T) {
        self.state.now.set(self.state.now.get().wrapping_add(ticks));
    }

    /// Adds ticks to the load counter, as if the CPU had been busy.
    pub fn add_load_ticks(&self, ticks: T) {
        let load = &self.state.load_ticks;
        load.set(load.get().wrapping_add(ticks));
    }

    /// Queues exact values for the next load counter reads.
    ///
    /// Queued values take precedence over ticks added with
    /// [`MockTime::add_load_ticks`].
    pub fn script_load_ticks(&self, values: &[T]) {
        self.state
            .scripted_load
            .borrow_mut()
            .extend(values.iter().copied());
    }

    /// Number of scripted load reads not yet consumed.
    pub fn scripted_reads_remaining(&self) -> usize {
        self.state.scripted_load.borrow().len()
    }
}

impl<T: Tick> TimeSource for MockTime<T> {
    type Tick = T;

    fn now(&self) -> T {
        self.state.now.get()
    }

    fn read_reset_load_ticks(&self) -> T {
        if let Some(value) = self.state.scripted_load.borrow_mut().pop_front() {
            return value;
        }
        self.state.load_ticks.replace(T::ZERO)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
