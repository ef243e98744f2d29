// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Strata uses multi-channel dirty tracking (via [`understory_dirty`]) to
//! record which aspects of a layer went stale since the last successful
//! synchronization step. Each channel corresponds to one reconciliation step
//! of the sync pass; a mark is cleared only once the step it drives has been
//! applied, so a failed repaint leaves the layer marked for retry.
//!
//! All channels are local-only: marking a layer never propagates to its
//! descendants. Subtree effects (children-transform distribution,
//! invalidation fan-out) are explicit tree walks that mark each affected
//! layer individually.
//!
//! # Consumption
//!
//! [`sync_compositing_state`](crate::layer::LayerTree::sync_compositing_state)
//! drains [`CHILDREN`], [`MASK`], [`GEOMETRY`], and [`REPAINT`] at the start
//! of a pass and re-marks any drained layer it did not visit (or whose
//! repaint failed), so marks outside the synced subtree are never lost.
//! [`NOTIFY`] is drained only by
//! [`notify_animation_started`](crate::layer::LayerTree::notify_animation_started).

use understory_dirty::Channel;

/// Child list changed — the snapshot child list must be rebuilt.
pub const CHILDREN: Channel = Channel::new(0);

/// Mask reference or masks-to-bounds flag changed.
pub const MASK: Channel = Channel::new(1);

/// Pending property state differs from the committed state.
pub const GEOMETRY: Channel = Channel::new(2);

/// Content was invalidated — the layer must re-record its surface.
pub const REPAINT: Channel = Channel::new(3);

/// An animation was attached and the client has not yet been told.
pub const NOTIFY: Channel = Channel::new(4);
