// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred layer-tree synchronization with keyframe animation decomposition.
//!
//! `strata_core` bridges a mutable *logical* layer tree, owned by the side
//! that produces layout and paint, and an immutable-per-frame *composited*
//! snapshot tree consumed by a rendering pipeline. Property mutations
//! accumulate as dirty marks without re-rendering; one children-first sync
//! pass materializes a consistent snapshot of the whole subtree on demand.
//! It is `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! The crate is organized around the commit loop the embedding client
//! drives:
//!
//! ```text
//!   mutators ──► LayerTree (pending state + dirty marks)
//!                    │ sync_required(layer)
//!                    ▼
//!   CompositionClient ──► sync_compositing_state(root, clock, now, painter)
//!                              │ children / mask / geometry / repaint
//!                              ▼
//!   CompositedLayer tree ──► rendering pipeline (read-only)
//! ```
//!
//! **[`layer`]** — The [`LayerTree`](layer::LayerTree) arena of logical
//! layers with generational handles, the deferred property contract, the
//! [`CompositedLayer`](layer::CompositedLayer) snapshots, and the sync
//! engine.
//!
//! **[`dirty`]** — Per-layer dirty channels via `understory_dirty`, one per
//! reconciliation step. Marks persist until the step they drive succeeds.
//!
//! **[`invalidation`]** — Bounded per-layer dirty-rectangle sets with a
//! union-into-accumulator coalescing policy.
//!
//! **[`animation`]** — Decomposition of two-keyframe value lists into
//! primitive opacity/transform curves, selecting per-component or
//! matrix-interpolation playback.
//!
//! **[`backend`]** — The [`CompositionClient`](backend::CompositionClient)
//! and [`PaintBackend`](backend::PaintBackend) traits the embedder
//! implements.
//!
//! **[`clock`]** — The [`PauseClock`](clock::PauseClock) value object gating
//! repaint and animation-start delivery.
//!
//! **[`transform`]** — Minimal 4×4 transform; only its translation column is
//! consumed by the property contract.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! commit-loop instrumentation, with zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one
//!   branch per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod animation;
pub mod backend;
pub mod clock;
pub mod color;
pub mod dirty;
pub mod invalidation;
pub mod layer;
pub mod time;
pub mod trace;
pub mod transform;
