// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer, snapshot, surface, and image identity types.

use core::fmt;

/// Sentinel value indicating "no layer" in index fields.
pub(crate) const INVALID: u32 = u32::MAX;

/// A handle to a logical layer in a [`LayerTree`](super::LayerTree).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a layer is destroyed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId {
    /// Slot index into the tree's arrays.
    pub(crate) idx: u32,
    /// Generation counter, must match the tree's generation for this slot.
    pub(crate) generation: u32,
}

impl LayerId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({}@gen{})", self.idx, self.generation)
    }
}

/// A handle to a [`CompositedLayer`](super::CompositedLayer) snapshot.
///
/// Snapshot handles never outlive the logical layer that owns the snapshot,
/// so they carry no generation counter.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompositedId(pub(crate) u32);

impl CompositedId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for CompositedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompositedId({})", self.0)
    }
}

/// Names the recording surface owned by one snapshot.
///
/// Surface ids are assigned when the snapshot is created and handed to the
/// [`PaintBackend`](crate::backend::PaintBackend) on each recording, which
/// maps them to whatever surface storage the backend keeps.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}

/// An opaque reference to a decoded static image.
///
/// Images are decoded and managed externally; a layer presenting one skips
/// repaint recording entirely.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub u32);

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({})", self.0)
    }
}
