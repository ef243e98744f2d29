// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer-facing layer snapshots.
//!
//! A [`CompositedLayer`] is the immutable-per-frame view of one logical
//! layer. It is created when the logical layer is created, released when the
//! logical layer is destroyed, and mutated only by the reconciliation steps
//! of a sync pass — property setters on the logical tree never touch it.
//! Between passes the rendering side may read the whole snapshot tree
//! without observing partial commits.

use alloc::vec::Vec;

use kurbo::{Point, Size, Vec2};

use crate::animation::{AnimatedProperty, AnimationDescriptor};
use crate::backend::FixedFrame;
use crate::color::Color;
use crate::transform::Vec3;

use super::id::{CompositedId, ImageId, SurfaceId};

/// The renderer-consumed snapshot of one logical layer.
#[derive(Clone, Debug)]
pub struct CompositedLayer {
    pub(crate) position: Point,
    pub(crate) translation: Vec2,
    pub(crate) size: Size,
    pub(crate) anchor_point: Vec3,
    pub(crate) opacity: f32,
    pub(crate) background_color: Option<Color>,
    pub(crate) image: Option<ImageId>,
    pub(crate) fixed_frame: Option<FixedFrame>,
    pub(crate) masks_to_bounds: bool,
    pub(crate) mask: Option<CompositedId>,
    pub(crate) children: Vec<CompositedId>,
    pub(crate) animations: Vec<AnimationDescriptor>,
    pub(crate) content_scrollable: bool,
    pub(crate) surface: SurfaceId,
}

impl CompositedLayer {
    fn new(surface: SurfaceId, content_scrollable: bool) -> Self {
        Self {
            position: Point::ORIGIN,
            translation: Vec2::ZERO,
            size: Size::ZERO,
            anchor_point: Vec3::new(0.5, 0.5, 0.0),
            opacity: 1.0,
            background_color: None,
            image: None,
            fixed_frame: None,
            masks_to_bounds: false,
            mask: None,
            children: Vec::new(),
            animations: Vec::new(),
            content_scrollable,
            surface,
        }
    }

    /// Returns the committed position.
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    /// Returns the committed translation offset.
    #[must_use]
    pub const fn translation(&self) -> Vec2 {
        self.translation
    }

    /// Returns the committed size.
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Returns the committed anchor point.
    #[must_use]
    pub const fn anchor_point(&self) -> Vec3 {
        self.anchor_point
    }

    /// Returns the committed opacity.
    #[must_use]
    pub const fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Returns the committed background color, if any.
    #[must_use]
    pub const fn background_color(&self) -> Option<Color> {
        self.background_color
    }

    /// Returns the committed static image reference, if any.
    #[must_use]
    pub const fn image(&self) -> Option<ImageId> {
        self.image
    }

    /// Returns the committed fixed-position constraints, if any.
    #[must_use]
    pub const fn fixed_frame(&self) -> Option<FixedFrame> {
        self.fixed_frame
    }

    /// Returns whether descendants are clipped to this snapshot's bounds.
    #[must_use]
    pub const fn masks_to_bounds(&self) -> bool {
        self.masks_to_bounds
    }

    /// Returns the snapshot acting as this layer's mask, if any.
    #[must_use]
    pub const fn mask(&self) -> Option<CompositedId> {
        self.mask
    }

    /// Returns the child snapshots in paint order.
    #[must_use]
    pub fn children(&self) -> &[CompositedId] {
        &self.children
    }

    /// Returns the attached animations.
    #[must_use]
    pub fn animations(&self) -> &[AnimationDescriptor] {
        &self.animations
    }

    /// Returns whether this snapshot presents independently scrollable
    /// overflow content.
    #[must_use]
    pub const fn content_scrollable(&self) -> bool {
        self.content_scrollable
    }

    /// Returns the recording surface owned by this snapshot.
    #[must_use]
    pub const fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// Attaches a descriptor, replacing any prior animation of the same name.
    pub(crate) fn set_animation(&mut self, descriptor: AnimationDescriptor) {
        self.animations.retain(|a| a.name != descriptor.name);
        self.animations.push(descriptor);
    }

    /// Removes the animation with the given name, if attached.
    pub(crate) fn remove_animation(&mut self, name: &str) {
        self.animations.retain(|a| a.name != name);
    }

    /// Removes every animation targeting `property`.
    pub(crate) fn remove_animations_for_property(&mut self, property: AnimatedProperty) {
        self.animations.retain(|a| a.property() != property);
    }
}

/// Slot storage for snapshots, with slot reuse.
///
/// Each slot is created alongside its owning logical layer (or lazily for
/// foreground/clip sublayers) and assigned a fresh [`SurfaceId`].
#[derive(Debug, Default)]
pub(crate) struct CompositedSlab {
    slots: Vec<Option<CompositedLayer>>,
    free: Vec<u32>,
    next_surface: u32,
}

impl CompositedSlab {
    /// Creates a snapshot and returns its handle.
    #[expect(clippy::cast_possible_truncation, reason = "slot count fits u32")]
    pub(crate) fn create(&mut self, content_scrollable: bool) -> CompositedId {
        let surface = SurfaceId(self.next_surface);
        self.next_surface += 1;
        let layer = CompositedLayer::new(surface, content_scrollable);
        if let Some(idx) = self.free.pop() {
            self.slots[idx as usize] = Some(layer);
            CompositedId(idx)
        } else {
            self.slots.push(Some(layer));
            CompositedId(self.slots.len() as u32 - 1)
        }
    }

    /// Releases a snapshot, freeing its slot for reuse.
    pub(crate) fn release(&mut self, id: CompositedId) {
        let slot = &mut self.slots[id.0 as usize];
        assert!(slot.is_some(), "snapshot released twice: {id:?}");
        *slot = None;
        self.free.push(id.0);
    }

    pub(crate) fn get(&self, id: CompositedId) -> &CompositedLayer {
        self.slots[id.0 as usize]
            .as_ref()
            .expect("released CompositedId")
    }

    pub(crate) fn get_mut(&mut self, id: CompositedId) -> &mut CompositedLayer {
        self.slots[id.0 as usize]
            .as_mut()
            .expect("released CompositedId")
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::sync::Arc;

    use crate::animation::{AnimationCurve, AnimationTiming, Span, TimingFunction};
    use crate::time::Timestamp;

    use super::*;

    fn opacity_descriptor(name: &str) -> AnimationDescriptor {
        AnimationDescriptor {
            name: String::from(name),
            begin_time: Timestamp::ZERO,
            timing: Arc::new(AnimationTiming {
                duration: 1.0,
                delay: 0.0,
                iterations: 1.0,
                alternate: false,
                function: TimingFunction::Linear,
            }),
            curve: AnimationCurve::Opacity(Span { from: 0.0, to: 1.0 }),
        }
    }

    #[test]
    fn slab_reuses_released_slots_with_fresh_surfaces() {
        let mut slab = CompositedSlab::default();
        let a = slab.create(false);
        let surface_a = slab.get(a).surface();
        slab.release(a);
        let b = slab.create(false);
        assert_eq!(a.index(), b.index());
        assert_ne!(slab.get(b).surface(), surface_a);
    }

    #[test]
    #[should_panic(expected = "released CompositedId")]
    fn released_snapshot_panics_on_access() {
        let mut slab = CompositedSlab::default();
        let id = slab.create(false);
        slab.release(id);
        let _ = slab.get(id);
    }

    #[test]
    fn same_named_animation_replaces_prior() {
        let mut slab = CompositedSlab::default();
        let id = slab.create(false);
        slab.get_mut(id).set_animation(opacity_descriptor("fade"));
        slab.get_mut(id).set_animation(opacity_descriptor("fade"));
        assert_eq!(slab.get(id).animations().len(), 1);
    }

    #[test]
    fn remove_by_name_and_property() {
        let mut slab = CompositedSlab::default();
        let id = slab.create(false);
        slab.get_mut(id).set_animation(opacity_descriptor("a"));
        slab.get_mut(id).set_animation(opacity_descriptor("b"));
        slab.get_mut(id).remove_animation("a");
        assert_eq!(slab.get(id).animations().len(), 1);
        slab.get_mut(id)
            .remove_animations_for_property(AnimatedProperty::Opacity);
        assert!(slab.get(id).animations().is_empty());
    }
}
