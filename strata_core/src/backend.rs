// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Embedder contract for the sync engine.
//!
//! Two capabilities are required from the embedding side:
//!
//! - **[`CompositionClient`]** — the owner of the logical tree. It is told
//!   when a sync pass is wanted ([`sync_required`](CompositionClient::sync_required),
//!   at least once per dirtying mutation; coalescing is the client's job)
//!   and when an attached animation has begun
//!   ([`animation_started`](CompositionClient::animation_started)). It also
//!   doubles as the read-only style provider: scrollable-overflow metrics
//!   and fixed-position style values are fetched from it on demand rather
//!   than duplicated in the tree.
//!
//! - **[`PaintBackend`]** — records layer content into a surface. It is
//!   passed into each
//!   [`sync_compositing_state`](crate::layer::LayerTree::sync_compositing_state)
//!   call rather than stored, since recording only happens inside a pass.
//!   A `false` return means nothing was drawn and the layer's dirty state
//!   must persist.

use kurbo::{Insets, Rect, Size};

use crate::layer::{LayerId, SurfaceId};
use crate::time::Timestamp;

/// Which slice of a layer's content a recording covers.
///
/// Layers with a foreground sublayer record in two passes so overflow
/// content can scroll without re-recording; everything else records in one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaintPhase {
    /// The whole content in a single pass.
    All,
    /// Only the background slice, into the main surface.
    Background,
    /// Everything except the background, into the foreground surface.
    Remaining,
}

/// Records layer content into recording surfaces.
pub trait PaintBackend {
    /// Records `phase` of the owning layer's content into `surface`, covering
    /// `rect` in surface coordinates.
    ///
    /// Returns `false` when no recording surface could be obtained; the
    /// caller keeps its dirty state and retries on a later pass.
    fn record(&mut self, surface: SurfaceId, phase: PaintPhase, rect: Rect) -> bool;
}

/// Style and geometry of a scrollable-overflow node.
///
/// Fetched from the [`CompositionClient`] when sizing the foreground/clip
/// sublayer split.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollMetrics {
    /// Border widths (`x0` left, `y0` top, `x1` right, `y1` bottom).
    pub border: Insets,
    /// Maximal outline width drawn outside the border box.
    pub outline: f64,
    /// Full extent of the scrollable content.
    pub scroll_size: Size,
    /// The node's absolute bounding box (excluding the outline).
    pub bounding_box: Rect,
}

/// A CSS-style length value from the layout side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    /// No value specified.
    Auto,
    /// An absolute length in pixels.
    Fixed(f64),
    /// A percentage of the containing block.
    Percent(f64),
}

/// Fixed-position constraints for a layer, as authored on the layout side.
///
/// The engine forwards these to the snapshot verbatim; resolving them against
/// the viewport is the renderer's job.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedFrame {
    /// Distance from the left edge.
    pub left: Length,
    /// Distance from the top edge.
    pub top: Length,
    /// Distance from the right edge.
    pub right: Length,
    /// Distance from the bottom edge.
    pub bottom: Length,
    /// Left margin.
    pub margin_left: Length,
    /// Top margin.
    pub margin_top: Length,
    /// Right margin.
    pub margin_right: Length,
    /// Bottom margin.
    pub margin_bottom: Length,
    /// The element's layout-overflow rectangle, offset by the painting
    /// origin relative to the layer.
    pub view_rect: Rect,
}

/// The owner of the logical tree, notified of sync needs and animation
/// starts and consulted for style values.
pub trait CompositionClient {
    /// Called at least once per dirtying mutation of `layer`. The client
    /// decides when to actually drive a sync pass; repeated signals before
    /// that pass collapse into one.
    fn sync_required(&mut self, layer: LayerId);

    /// Called once per committed animation descriptor on `layer`, from
    /// [`notify_animation_started`](crate::layer::LayerTree::notify_animation_started).
    fn animation_started(&mut self, layer: LayerId, time: Timestamp);

    /// Returns scrollable-overflow metrics for `layer`, or `None` when the
    /// node's content does not overflow-scroll.
    fn scroll_metrics(&self, layer: LayerId) -> Option<ScrollMetrics> {
        let _ = layer;
        None
    }

    /// Returns fixed-position constraints for `layer`, or `None` when the
    /// node is not fixed-positioned.
    fn fixed_position(&self, layer: LayerId) -> Option<FixedFrame> {
        let _ = layer;
        None
    }
}
