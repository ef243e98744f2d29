// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for sync passes.
//!
//! This module provides a [`TraceSink`] trait the embedder's commit loop can
//! feed as it drives the engine. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace`
//! feature is **off**, every `Tracer` method compiles to nothing (zero
//! overhead). When **on**, each method performs a single `Option` branch
//! before dispatching.

use crate::layer::SyncChanges;
use crate::time::Timestamp;

/// Summary of one completed sync pass.
#[derive(Clone, Copy, Debug)]
pub struct SyncPassEvent {
    /// Slot index of the layer the pass started from.
    pub root: u32,
    /// The time passed into the sync entry point.
    pub now: Timestamp,
    /// Layers whose snapshot child list was rebuilt.
    pub children_rebuilt: usize,
    /// Layers whose mask state was reconciled.
    pub masks_synced: usize,
    /// Layers whose pending properties were committed.
    pub geometry_committed: usize,
    /// Layers successfully re-recorded.
    pub repainted: usize,
    /// Layers whose recording failed and stays dirty.
    pub repaint_failed: usize,
}

impl SyncPassEvent {
    /// Builds an event from a pass result.
    #[must_use]
    pub fn new(root: u32, now: Timestamp, changes: &SyncChanges) -> Self {
        Self {
            root,
            now,
            children_rebuilt: changes.children.len(),
            masks_synced: changes.masks.len(),
            geometry_committed: changes.geometry.len(),
            repainted: changes.repainted.len(),
            repaint_failed: changes.repaint_failed.len(),
        }
    }
}

/// Emitted when the embedder pauses or resumes display updates.
#[derive(Clone, Copy, Debug)]
pub struct PauseEvent {
    /// The new paused state.
    pub paused: bool,
    /// When the state changed.
    pub now: Timestamp,
}

/// Receives trace events from the embedder's commit loop.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after each sync pass completes.
    fn on_sync_pass(&mut self, e: &SyncPassEvent) {
        _ = e;
    }

    /// Called when display updates are paused or resumed.
    fn on_pause(&mut self, e: &PauseEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing.
/// When **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`SyncPassEvent`].
    #[inline]
    pub fn sync_pass(&mut self, e: &SyncPassEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_sync_pass(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PauseEvent`].
    #[inline]
    pub fn pause(&mut self, e: &PauseEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pause(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_tracer_is_inert() {
        let mut tracer = Tracer::none();
        let changes = SyncChanges::default();
        tracer.sync_pass(&SyncPassEvent::new(0, Timestamp::ZERO, &changes));
        tracer.pause(&PauseEvent {
            paused: true,
            now: Timestamp::ZERO,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        struct CountingSink {
            passes: usize,
        }

        impl TraceSink for CountingSink {
            fn on_sync_pass(&mut self, _e: &SyncPassEvent) {
                self.passes += 1;
            }
        }

        let mut sink = CountingSink { passes: 0 };
        let mut tracer = Tracer::new(&mut sink);
        let changes = SyncChanges::default();
        tracer.sync_pass(&SyncPassEvent::new(0, Timestamp::ZERO, &changes));
        drop(tracer);
        assert_eq!(sink.passes, 1);
    }
}
