// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The sync engine: reconciling logical state into snapshots.
//!
//! [`sync_compositing_state`](LayerTree::sync_compositing_state) drains the
//! dirty channels and walks the requested subtree children-first, so every
//! child's snapshot is fully consistent before its parent's child list is
//! rebuilt. Each node runs up to four independent steps:
//!
//! 1. **children** — rebuild the snapshot child list (clip sublayer first,
//!    then each logical child's snapshot, in paint order).
//! 2. **mask** — write through the mask reference and masks-to-bounds flag.
//! 3. **geometry** — commit the whole pending property block atomically into
//!    the committed state and the snapshot.
//! 4. **repaint** — re-record content through the paint backend, unless the
//!    pause clock suppresses it.
//!
//! Steps only run for nodes whose channel was marked; a node with only a
//! mask change does not pay for a children rebuild. Marks drained for nodes
//! outside the synced subtree are re-marked afterwards, and a failed
//! recording re-marks REPAINT, so no invalidation is ever lost.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use kurbo::{Point, Rect, Size};
use understory_dirty::{Channel, DirtyTracker};

use crate::backend::{PaintBackend, PaintPhase};
use crate::clock::PauseClock;
use crate::dirty;
use crate::time::Timestamp;

use super::id::LayerId;
use super::tree::LayerTree;

/// The work performed by one sync pass, by slot index.
///
/// A pass over an unchanged tree returns an empty value, which is the
/// engine's idempotence guarantee.
#[derive(Clone, Debug, Default)]
pub struct SyncChanges {
    /// Layers whose snapshot child list was rebuilt.
    pub children: Vec<u32>,
    /// Layers whose mask state was written through.
    pub masks: Vec<u32>,
    /// Layers whose pending properties were committed.
    pub geometry: Vec<u32>,
    /// Layers whose content was successfully re-recorded.
    pub repainted: Vec<u32>,
    /// Layers whose recording failed; they stay marked for retry.
    pub repaint_failed: Vec<u32>,
}

impl SyncChanges {
    /// Returns whether the pass performed no reconciliation work at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
            && self.masks.is_empty()
            && self.geometry.is_empty()
            && self.repainted.is_empty()
            && self.repaint_failed.is_empty()
    }
}

/// One drained dirty channel, consumed during the walk.
///
/// Whatever the walk does not take is re-marked afterwards, so marks for
/// layers outside the synced subtree survive the pass.
struct Drained {
    slots: BTreeSet<u32>,
}

impl Drained {
    fn collect(tracker: &mut DirtyTracker<u32>, channel: Channel) -> Self {
        let slots: BTreeSet<u32> = tracker.drain(channel).deterministic().run().collect();
        Self { slots }
    }

    fn take(&mut self, idx: u32) -> bool {
        self.slots.remove(&idx)
    }

    fn restore(self, tracker: &mut DirtyTracker<u32>, channel: Channel) {
        for idx in self.slots {
            tracker.mark(idx, channel);
        }
    }
}

struct PassState<'a> {
    children: Drained,
    masks: Drained,
    geometry: Drained,
    repaint: Option<Drained>,
    painter: &'a mut dyn PaintBackend,
    changes: SyncChanges,
}

enum RepaintOutcome {
    Done,
    Failed,
    Skipped,
}

impl LayerTree {
    /// Reconciles the subtree rooted at `root` into its snapshots.
    ///
    /// Children are synchronized before their parents. Repaint recording is
    /// skipped entirely while `clock` suppresses display at `now`; the
    /// repaint marks stay put so a later pass retries.
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale.
    pub fn sync_compositing_state(
        &mut self,
        root: LayerId,
        clock: &PauseClock,
        now: Timestamp,
        painter: &mut dyn PaintBackend,
    ) -> SyncChanges {
        self.validate(root);

        let repaint = if clock.suppressed(now) {
            None
        } else {
            Some(Drained::collect(&mut self.dirty, dirty::REPAINT))
        };
        let mut pass = PassState {
            children: Drained::collect(&mut self.dirty, dirty::CHILDREN),
            masks: Drained::collect(&mut self.dirty, dirty::MASK),
            geometry: Drained::collect(&mut self.dirty, dirty::GEOMETRY),
            repaint,
            painter,
            changes: SyncChanges::default(),
        };

        self.sync_node(root.idx, &mut pass);

        pass.children.restore(&mut self.dirty, dirty::CHILDREN);
        pass.masks.restore(&mut self.dirty, dirty::MASK);
        pass.geometry.restore(&mut self.dirty, dirty::GEOMETRY);
        if let Some(repaint) = pass.repaint {
            repaint.restore(&mut self.dirty, dirty::REPAINT);
        }
        pass.changes
    }

    /// Walks children-first delivering animation-start notifications.
    ///
    /// Each layer marked since its last delivered notification produces one
    /// [`animation_started`](crate::backend::CompositionClient::animation_started)
    /// call stamped with `now`. While `clock` suppresses display the walk
    /// does nothing and every mark stays put.
    ///
    /// # Panics
    ///
    /// Panics if `root` is stale.
    pub fn notify_animation_started(&mut self, root: LayerId, clock: &PauseClock, now: Timestamp) {
        self.validate(root);
        if clock.suppressed(now) {
            return;
        }

        let mut drained = Drained::collect(&mut self.dirty, dirty::NOTIFY);
        let mut targets = Vec::new();
        self.collect_notify(root.idx, &mut drained, &mut targets);
        drained.restore(&mut self.dirty, dirty::NOTIFY);

        self.deliver_animation_started(targets, now);
    }

    fn collect_notify(&self, idx: u32, drained: &mut Drained, targets: &mut Vec<LayerId>) {
        for &child in &self.children[idx as usize] {
            self.collect_notify(child, drained, targets);
        }
        if drained.take(idx) {
            targets.push(self.handle(idx));
        }
    }

    fn sync_node(&mut self, idx: u32, pass: &mut PassState<'_>) {
        let n = self.children[idx as usize].len();
        for i in 0..n {
            let child = self.children[idx as usize][i];
            self.sync_node(child, pass);
        }

        if pass.children.take(idx) {
            self.sync_children(idx);
            pass.changes.children.push(idx);
        }
        if pass.masks.take(idx) {
            self.sync_mask(idx);
            pass.changes.masks.push(idx);
        }
        if pass.geometry.take(idx) {
            self.sync_position_state(idx);
            pass.changes.geometry.push(idx);
        }
        if let Some(repaint) = &mut pass.repaint {
            if repaint.take(idx) {
                match self.repaint(idx, pass.painter) {
                    RepaintOutcome::Done => pass.changes.repainted.push(idx),
                    RepaintOutcome::Failed => {
                        pass.changes.repaint_failed.push(idx);
                        self.dirty.mark(idx, dirty::REPAINT);
                    }
                    // Content-less and static-image layers never record;
                    // the mark persists, matching the dirty invariant.
                    RepaintOutcome::Skipped => self.dirty.mark(idx, dirty::REPAINT),
                }
            }
        }
    }

    /// Rebuilds the snapshot child list from the logical children.
    fn sync_children(&mut self, idx: u32) {
        let i = idx as usize;
        let mut list = Vec::with_capacity(self.children[i].len() + 1);
        if let Some(clip) = self.foreground_clip[i] {
            list.push(clip);
        }
        for &child in &self.children[i] {
            list.push(self.composited[child as usize]);
        }
        self.snapshots.get_mut(self.composited[i]).children = list;
    }

    /// Writes through the mask reference and masks-to-bounds flag.
    fn sync_mask(&mut self, idx: u32) {
        let i = idx as usize;
        let mask = self.mask[i]
            .filter(|&m| self.is_alive(m))
            .map(|m| self.composited[m.idx as usize]);
        let masks_to_bounds = self.masks_to_bounds[i];
        let snapshot = self.snapshots.get_mut(self.composited[i]);
        snapshot.mask = mask;
        snapshot.masks_to_bounds = masks_to_bounds;
    }

    /// Commits the pending property block into the committed state and the
    /// snapshot in one step.
    fn sync_position_state(&mut self, idx: u32) {
        let i = idx as usize;
        self.committed[i] = self.pending[i];
        let state = self.committed[i];
        let snapshot = self.snapshots.get_mut(self.composited[i]);
        snapshot.position = state.position;
        snapshot.translation = state.translation;
        snapshot.size = state.size;
        snapshot.anchor_point = state.anchor_point;
        snapshot.opacity = state.opacity;
        snapshot.background_color = state.background_color;
        snapshot.image = state.image;
        snapshot.fixed_frame = state.fixed_frame;
    }

    /// Re-records the layer's content through the paint backend.
    fn repaint(&mut self, idx: u32, painter: &mut dyn PaintBackend) -> RepaintOutcome {
        let i = idx as usize;
        if !self.has_content[i] || self.has_image[i] {
            return RepaintOutcome::Skipped;
        }

        let bounds = Rect::from_origin_size(Point::ORIGIN, self.committed[i].size);
        let main = self.surface_of(self.composited[i]);

        let split = (self.foreground[i].zip(self.foreground_clip[i])).and_then(|ids| {
            let metrics = self.client_ref().and_then(|c| c.scroll_metrics(self.handle(idx)));
            metrics.map(|m| (ids.0, ids.1, m))
        });

        if let Some((fg, clip, m)) = split {
            // Background slice into the main surface.
            if !painter.record(main, PaintPhase::Background, bounds) {
                return RepaintOutcome::Failed;
            }

            // The foreground covers the scrollable extent plus borders,
            // inflated by the outline on every side.
            let contents = Rect::from_origin_size(
                Point::ORIGIN,
                Size::new(
                    m.border.x0 + m.border.x1 + m.scroll_size.width,
                    m.border.y0 + m.border.y1 + m.scroll_size.height,
                ),
            )
            .inflate(m.outline, m.outline);
            self.snapshots.get_mut(fg).size = contents.size();
            if !painter.record(self.surface_of(fg), PaintPhase::Remaining, contents) {
                return RepaintOutcome::Failed;
            }

            // The clip sublayer frames the visible viewport inside the
            // border box; the foreground is pulled back by the clip origin
            // so its content lands correctly under the clip.
            let x = m.border.x0 + m.outline;
            let y = m.border.y0 + m.outline;
            let clip_snapshot = self.snapshots.get_mut(clip);
            clip_snapshot.position = Point::new(x, y);
            clip_snapshot.size = Size::new(
                m.bounding_box.width() - m.border.x0 - m.border.x1,
                m.bounding_box.height() - m.border.y0 - m.border.y1,
            );
            self.snapshots.get_mut(fg).position = Point::new(-x, -y);
        } else if !painter.record(main, PaintPhase::All, bounds) {
            return RepaintOutcome::Failed;
        }

        self.regions[i].clear();
        RepaintOutcome::Done
    }
}
