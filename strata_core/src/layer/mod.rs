// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Logical layers, composited snapshots, and the sync engine.
//!
//! A *logical layer* is a node in the tree the layout side mutates. Each
//! layer has:
//!
//! - An identity ([`LayerId`]) — a generational handle that becomes stale
//!   when the layer is destroyed, preventing use-after-free bugs at the API
//!   level.
//! - Topology — an ordered, non-owning child list; the [`LayerTree`] arena
//!   owns every layer.
//! - **Pending properties** set by the caller: position, translation, size,
//!   anchor point, opacity, background color, static image, fixed-position
//!   frame.
//! - **Committed properties** produced by a sync pass, mirrored into the
//!   owned [`CompositedLayer`] snapshot the rendering side consumes.
//!
//! Mutations mark dirty channels (see [`dirty`](crate::dirty)) and signal
//! the client; nothing becomes visible to the rendering side until the
//! client drives [`LayerTree::sync_compositing_state`], which reconciles
//! children, mask, and geometry per node and triggers repaint recording.
//! [`SyncChanges`] summarizes the work a pass actually performed.

mod composited;
mod id;
mod sync;
mod traverse;
mod tree;

pub use composited::CompositedLayer;
pub use id::{CompositedId, ImageId, LayerId, SurfaceId};
pub use sync::SyncChanges;
pub use traverse::Children;
pub use tree::LayerTree;
