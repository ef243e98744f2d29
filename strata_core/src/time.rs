// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic timestamps in animation-subsystem units.
//!
//! [`Timestamp`] is a point on the caller's monotonic clock, expressed in
//! seconds. The engine never reads a clock itself; the embedder samples its
//! platform time source and passes the value into the sync entry points and
//! the [`PauseClock`](crate::clock::PauseClock). [`TimeDelta`] is a span in
//! the same unit.

use core::fmt;
use core::ops::{Add, Sub};

/// A point in time, in seconds on the embedder's monotonic clock.
#[derive(Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Timestamp(pub f64);

impl Timestamp {
    /// The clock origin.
    pub const ZERO: Self = Self(0.0);

    /// Returns the raw value in seconds.
    #[inline]
    #[must_use]
    pub const fn seconds(self) -> f64 {
        self.0
    }
}

impl Add<TimeDelta> for Timestamp {
    type Output = Self;

    #[inline]
    fn add(self, rhs: TimeDelta) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub<TimeDelta> for Timestamp {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: TimeDelta) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sub for Timestamp {
    type Output = TimeDelta;

    #[inline]
    fn sub(self, rhs: Self) -> TimeDelta {
        TimeDelta(self.0 - rhs.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}s)", self.0)
    }
}

/// A span of time in seconds.
#[derive(Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct TimeDelta(pub f64);

impl TimeDelta {
    /// A zero-length span.
    pub const ZERO: Self = Self(0.0);

    /// Returns the raw value in seconds.
    #[inline]
    #[must_use]
    pub const fn seconds(self) -> f64 {
        self.0
    }
}

impl Add for TimeDelta {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for TimeDelta {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Debug for TimeDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeDelta({}s)", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_delta_arithmetic() {
        let t = Timestamp(2.0);
        let d = TimeDelta(0.5);
        assert_eq!((t + d).seconds(), 2.5);
        assert_eq!((t - d).seconds(), 1.5);
        assert_eq!(Timestamp(3.0) - Timestamp(1.0), TimeDelta(2.0));
    }

    #[test]
    fn ordering() {
        assert!(Timestamp(1.0) < Timestamp(2.0));
        assert!(TimeDelta(0.1) < TimeDelta(0.2));
        assert_eq!(Timestamp::ZERO, Timestamp(0.0));
    }
}
