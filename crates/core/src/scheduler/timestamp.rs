//! Wrapping timestamps
//!
//! Every comparison and addition on scheduler time goes through
//! [`Timestamp`]. Comparisons are plain numeric comparisons on the raw
//! counter; a wrap is never hidden; it is reported to the caller, which
//! tracks it with the task's overflow-pending flag until the clock itself
//! wraps.

use crate::traits::Tick;

/// A point in the wrapping tick domain of a [`TimeSource`](crate::traits::TimeSource).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp<T: Tick>(T);

impl<T: Tick> Timestamp<T> {
    /// Wraps a raw counter value.
    #[inline]
    pub const fn new(ticks: T) -> Self {
        Self(ticks)
    }

    /// Raw counter value.
    #[inline]
    pub fn ticks(self) -> T {
        self.0
    }

    /// Adds `delay` ticks, wrapping at the counter width.
    ///
    /// The flag is `true` when the result wrapped past [`Tick::MAX`].
    #[inline]
    pub fn offset(self, delay: T) -> (Self, bool) {
        let (ticks, wrapped) = self.0.overflowing_add(delay);
        (Self(ticks), wrapped)
    }

    /// `true` once this time is at or past `deadline`.
    #[inline]
    pub fn has_reached(self, deadline: Self) -> bool {
        self.0 >= deadline.0
    }

    /// `true` when this time is numerically before `other`.
    #[inline]
    pub fn is_before(self, other: Self) -> bool {
        self.0 < other.0
    }

    /// `true` when a clock reading of `self` following `previous` can only
    /// be explained by the counter having wrapped in between.
    #[inline]
    pub fn wrapped_since(self, previous: Self) -> bool {
        self.is_before(previous)
    }
}

impl<T: Tick> From<T> for Timestamp<T> {
    fn from(ticks: T) -> Self {
        Self(ticks)
    }
}
