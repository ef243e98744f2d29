// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pause gating for repaint and animation-start delivery.
//!
//! [`PauseClock`] is an explicit value object the embedder owns and passes
//! into [`sync_compositing_state`](crate::layer::LayerTree::sync_compositing_state)
//! and [`notify_animation_started`](crate::layer::LayerTree::notify_animation_started).
//! While suppressed, externally visible effects (repaint recording, animation
//! start delivery) are delayed; dirty bookkeeping continues unchanged, so no
//! mutation is lost.
//!
//! Pausing installs a resume threshold of "now plus a fixed one-second
//! grace". A fresh pause request while already paused extends the threshold
//! rather than blocking indefinitely; once the current time passes the
//! threshold, effects resume even without an explicit unpause.

use crate::time::{TimeDelta, Timestamp};

/// Grace period granted by each pause request.
const PAUSE_GRACE: TimeDelta = TimeDelta(1.0);

/// Pause state gating repaint and animation-start notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct PauseClock {
    paused: bool,
    resume_at: Timestamp,
}

impl PauseClock {
    /// Creates an unpaused clock.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            paused: false,
            resume_at: Timestamp::ZERO,
        }
    }

    /// Sets or clears the paused state.
    ///
    /// Pausing extends the resume threshold to `now + 1s`, even when already
    /// paused. Unpausing takes effect immediately.
    pub fn set_paused(&mut self, paused: bool, now: Timestamp) {
        self.paused = paused;
        if paused {
            self.resume_at = now + PAUSE_GRACE;
        }
    }

    /// Returns whether the clock is currently paused.
    ///
    /// This reflects the raw flag; use [`suppressed`](Self::suppressed) to
    /// account for the grace threshold.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Returns whether externally visible effects are suppressed at `now`.
    #[must_use]
    pub fn suppressed(&self, now: Timestamp) -> bool {
        self.paused && now < self.resume_at
    }
}
