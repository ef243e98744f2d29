// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded per-layer invalidation regions.
//!
//! Each layer accumulates the rectangles invalidated since its last
//! successful repaint in a [`RegionSet`]. The set is bounded: once
//! [`RegionSet::MAX_RECTS`] entries exist, further rectangles are unioned
//! into the accumulator entry at index 0 rather than dropped, so coverage is
//! never lost at the cost of precision. A rectangle already covered by a
//! stored entry is discarded on submission.

use alloc::vec::Vec;

use kurbo::Rect;

/// An ordered, bounded set of invalidated rectangles.
#[derive(Clone, Debug, Default)]
pub struct RegionSet {
    rects: Vec<Rect>,
}

/// Returns whether `outer` fully contains `inner`.
fn covers(outer: &Rect, inner: &Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && outer.x1 >= inner.x1 && outer.y1 >= inner.y1
}

impl RegionSet {
    /// Maximum number of stored rectangles before coalescing starts.
    pub const MAX_RECTS: usize = 8;

    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Submits an invalidated rectangle.
    ///
    /// Rectangles fully contained in an already-stored entry are discarded.
    /// Once the set holds [`MAX_RECTS`](Self::MAX_RECTS) entries, new
    /// rectangles are unioned into entry 0.
    pub fn add(&mut self, rect: Rect) {
        if self.rects.iter().any(|stored| covers(stored, &rect)) {
            return;
        }
        if self.rects.len() < Self::MAX_RECTS {
            self.rects.push(rect);
        } else {
            self.rects[0] = self.rects[0].union(rect);
        }
    }

    /// Removes all stored rectangles.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Returns the stored rectangles in submission order.
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Returns whether the set holds no rectangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_distinct_rects() {
        let mut set = RegionSet::new();
        set.add(Rect::new(0.0, 0.0, 10.0, 10.0));
        set.add(Rect::new(20.0, 0.0, 30.0, 10.0));
        assert_eq!(set.rects().len(), 2);
    }

    #[test]
    fn discards_covered_rect() {
        let mut set = RegionSet::new();
        set.add(Rect::new(0.0, 0.0, 100.0, 100.0));
        set.add(Rect::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(set.rects().len(), 1);
    }

    #[test]
    fn does_not_discard_partial_overlap() {
        let mut set = RegionSet::new();
        set.add(Rect::new(0.0, 0.0, 10.0, 10.0));
        set.add(Rect::new(5.0, 5.0, 15.0, 15.0));
        assert_eq!(set.rects().len(), 2);
    }

    #[test]
    fn ninth_rect_coalesces_into_accumulator() {
        let mut set = RegionSet::new();
        for i in 0..9 {
            let x = f64::from(i) * 20.0;
            set.add(Rect::new(x, 0.0, x + 10.0, 10.0));
        }
        assert_eq!(set.rects().len(), RegionSet::MAX_RECTS);
        // Entry 0 is the union of the first and the ninth rectangle.
        let expected = Rect::new(0.0, 0.0, 10.0, 10.0).union(Rect::new(160.0, 0.0, 170.0, 10.0));
        assert_eq!(set.rects()[0], expected);
        // The other seven original entries are untouched.
        assert_eq!(set.rects()[1], Rect::new(20.0, 0.0, 30.0, 10.0));
        assert_eq!(set.rects()[7], Rect::new(140.0, 0.0, 150.0, 10.0));
    }

    #[test]
    fn clear_empties_the_set() {
        let mut set = RegionSet::new();
        set.add(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(!set.is_empty());
        set.clear();
        assert!(set.is_empty());
    }
}
