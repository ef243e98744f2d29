// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyframe decomposition into primitive, hardware-playable curves.
//!
//! The playback target accepts only primitive animation curves: opacity
//! ranges and per-component transform ranges (translation, single-axis
//! rotation angle, scale). [`decompose`] turns a two-keyframe value list
//! into one [`AnimationDescriptor`] carrying those ranges, or rejects the
//! input when the timing is degenerate or the keyframe count is not exactly
//! two. True multi-keyframe interpolation is unsupported by the target and
//! is rejected rather than approximated.
//!
//! # Mode selection
//!
//! A transform keyframe is an ordered list of [`TransformOp`]s. Independent
//! per-component playback is only valid when both keyframes apply the same
//! operation kinds in the same order; any structural mismatch means
//! component-wise interpolation would not reconstruct the same path, so the
//! descriptor is flagged for matrix interpolation instead and carries no
//! component ranges.
//!
//! Depth (Z) translation ranges and rotation about more than one axis are
//! recorded but the playback target composes them as flat 2-D motion; this
//! is a limitation of the target, not an input error.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::Point;

use crate::time::Timestamp;
use crate::transform::Vec3;

/// Timing parameters owned by the animation subsystem.
///
/// Descriptors hold a shared reference to this rather than copying the
/// values, so the animation subsystem remains the single owner of timing
/// state.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationTiming {
    /// Total duration of one iteration, in seconds.
    pub duration: f64,
    /// Delay before the first iteration starts, in seconds.
    pub delay: f64,
    /// Number of iterations; `f64::INFINITY` repeats forever.
    pub iterations: f64,
    /// Whether alternate iterations play in reverse.
    pub alternate: bool,
    /// Easing applied within each iteration.
    pub function: TimingFunction,
}

impl AnimationTiming {
    /// Returns whether this timing can drive no observable animation.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.duration.is_finite() && self.duration > 0.0)
    }
}

/// Easing function for one animation iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimingFunction {
    /// Constant velocity.
    Linear,
    /// The standard ease curve.
    Ease,
    /// An arbitrary cubic Bézier with control points `(x1, y1)`, `(x2, y2)`.
    CubicBezier(f64, f64, f64, f64),
}

/// The property a keyframe list animates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimatedProperty {
    /// Layer opacity.
    Opacity,
    /// Layer transform.
    Transform,
}

impl AnimatedProperty {
    /// Returns the symbolic name used when no explicit animation name is
    /// given.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Opacity => "opacity",
            Self::Transform => "transform",
        }
    }
}

/// Axis of a single-axis rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RotationAxis {
    /// Rotation about the X axis.
    X,
    /// Rotation about the Y axis.
    Y,
    /// Rotation about the Z axis.
    Z,
}

/// One primitive operation inside a transform keyframe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformOp {
    /// Combined translation on all three axes.
    Translate {
        /// Horizontal offset.
        x: f64,
        /// Vertical offset.
        y: f64,
        /// Depth offset.
        z: f64,
    },
    /// Translation on the X axis only.
    TranslateX(f64),
    /// Translation on the Y axis only.
    TranslateY(f64),
    /// Translation on the Z axis only.
    TranslateZ(f64),
    /// Rotation about a single axis, in degrees.
    Rotate {
        /// The rotation axis.
        axis: RotationAxis,
        /// The rotation angle in degrees.
        degrees: f64,
    },
    /// Combined scale on all three axes.
    Scale {
        /// Horizontal factor.
        x: f64,
        /// Vertical factor.
        y: f64,
        /// Depth factor.
        z: f64,
    },
    /// Scale on the X axis only.
    ScaleX(f64),
    /// Scale on the Y axis only.
    ScaleY(f64),
    /// Scale on the Z axis only.
    ScaleZ(f64),
}

/// Structural kind of a [`TransformOp`], used for list matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum OpKind {
    Translate,
    TranslateX,
    TranslateY,
    TranslateZ,
    RotateX,
    RotateY,
    RotateZ,
    Scale,
    ScaleX,
    ScaleY,
    ScaleZ,
}

impl TransformOp {
    fn kind(&self) -> OpKind {
        match self {
            Self::Translate { .. } => OpKind::Translate,
            Self::TranslateX(_) => OpKind::TranslateX,
            Self::TranslateY(_) => OpKind::TranslateY,
            Self::TranslateZ(_) => OpKind::TranslateZ,
            Self::Rotate { axis, .. } => match axis {
                RotationAxis::X => OpKind::RotateX,
                RotationAxis::Y => OpKind::RotateY,
                RotationAxis::Z => OpKind::RotateZ,
            },
            Self::Scale { .. } => OpKind::Scale,
            Self::ScaleX(_) => OpKind::ScaleX,
            Self::ScaleY(_) => OpKind::ScaleY,
            Self::ScaleZ(_) => OpKind::ScaleZ,
        }
    }
}

/// An ordered list of transform operations for one keyframe.
pub type TransformOps = Vec<TransformOp>;

/// Keyframe values for one animatable property.
///
/// The value representation is part of the variant, so a property/value
/// mismatch cannot be constructed.
#[derive(Clone, Debug, PartialEq)]
pub enum KeyframeList {
    /// Opacity endpoints.
    Opacity(Vec<f32>),
    /// Per-keyframe transform operation lists.
    Transform(Vec<TransformOps>),
}

impl KeyframeList {
    /// Returns the number of keyframes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Opacity(values) => values.len(),
            Self::Transform(lists) => lists.len(),
        }
    }

    /// Returns whether the list holds no keyframes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the property this list animates.
    #[must_use]
    pub const fn property(&self) -> AnimatedProperty {
        match self {
            Self::Opacity(_) => AnimatedProperty::Opacity,
            Self::Transform(_) => AnimatedProperty::Transform,
        }
    }
}

/// A from/to value range for one animated component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span<T> {
    /// Value at the first keyframe.
    pub from: T,
    /// Value at the second keyframe.
    pub to: T,
}

/// Component ranges for a transform animation.
///
/// Only the components present in the keyframes carry a range; absent
/// components are `None`. When `matrix_interpolation` is set the keyframe
/// operation lists did not match structurally, every range is `None`, and
/// playback must interpolate the composed matrix as a single unit.
#[derive(Clone, Debug, PartialEq)]
pub struct TransformCurve {
    /// The node's pre-animation position; hardware playback composes the
    /// animated transform around this fixed anchor.
    pub origin: Point,
    /// Whether playback must interpolate one composed matrix instead of
    /// independent component curves.
    pub matrix_interpolation: bool,
    /// Translation range, if any translate operation was present.
    pub translation: Option<Span<Vec3>>,
    /// Rotation angle range in degrees, if a rotate operation was present.
    pub rotation: Option<Span<f64>>,
    /// Scale range, if any scale operation was present.
    pub scale: Option<Span<Vec3>>,
}

/// The primitive curve a descriptor plays.
#[derive(Clone, Debug, PartialEq)]
pub enum AnimationCurve {
    /// Opacity endpoints, carried verbatim from the keyframes.
    Opacity(Span<f32>),
    /// Decomposed transform components.
    Transform(TransformCurve),
}

/// A primitive animation ready for the playback target.
#[derive(Clone, Debug)]
pub struct AnimationDescriptor {
    /// Symbolic name; replaces any prior animation of the same name when
    /// attached to a layer.
    pub name: String,
    /// When the animation began, on the embedder's clock.
    pub begin_time: Timestamp,
    /// Shared timing parameters.
    pub timing: Arc<AnimationTiming>,
    /// The curve to play.
    pub curve: AnimationCurve,
}

impl AnimationDescriptor {
    /// Returns the property this descriptor animates.
    #[must_use]
    pub const fn property(&self) -> AnimatedProperty {
        match &self.curve {
            AnimationCurve::Opacity(_) => AnimatedProperty::Opacity,
            AnimationCurve::Transform(_) => AnimatedProperty::Transform,
        }
    }
}

/// Decomposes a keyframe list into a primitive animation descriptor.
///
/// Returns `None` when the timing is degenerate (zero or non-finite
/// duration) or the list does not hold exactly two keyframes. `origin` is
/// the owning node's committed position at decomposition time.
#[must_use]
pub fn decompose(
    keyframes: &KeyframeList,
    timing: &Arc<AnimationTiming>,
    name: Option<&str>,
    begin_time: Timestamp,
    origin: Point,
) -> Option<AnimationDescriptor> {
    if timing.is_degenerate() || keyframes.len() != 2 {
        return None;
    }

    let curve = match keyframes {
        KeyframeList::Opacity(values) => AnimationCurve::Opacity(Span {
            from: values[0],
            to: values[1],
        }),
        KeyframeList::Transform(lists) => {
            AnimationCurve::Transform(decompose_transform(&lists[0], &lists[1], origin))
        }
    };

    let name = match name {
        Some(explicit) if !explicit.is_empty() => String::from(explicit),
        _ => String::from(keyframes.property().name()),
    };

    Some(AnimationDescriptor {
        name,
        begin_time,
        timing: Arc::clone(timing),
        curve,
    })
}

/// Accumulates from/to component values across the two keyframes.
///
/// Index 0 of each range comes from `from_ops`, index 1 from `to_ops`.
fn decompose_transform(from_ops: &[TransformOp], to_ops: &[TransformOp], origin: Point) -> TransformCurve {
    let lists_match = from_ops.len() == to_ops.len()
        && from_ops
            .iter()
            .zip(to_ops)
            .all(|(a, b)| a.kind() == b.kind());

    if !lists_match {
        return TransformCurve {
            origin,
            matrix_interpolation: true,
            translation: None,
            rotation: None,
            scale: None,
        };
    }

    let mut translation = Span {
        from: Vec3::ZERO,
        to: Vec3::ZERO,
    };
    let mut rotation = Span { from: 0.0, to: 0.0 };
    let mut scale = Span {
        from: Vec3::ONE,
        to: Vec3::ONE,
    };
    let mut do_translation = false;
    let mut do_rotation = false;
    let mut do_scale = false;

    for (ops, end) in [(from_ops, false), (to_ops, true)] {
        for op in ops {
            match *op {
                TransformOp::Translate { x, y, z } => {
                    let side = if end { &mut translation.to } else { &mut translation.from };
                    *side = Vec3::new(x, y, z);
                    do_translation = true;
                }
                TransformOp::TranslateX(x) => {
                    let side = if end { &mut translation.to } else { &mut translation.from };
                    side.x = x;
                    do_translation = true;
                }
                TransformOp::TranslateY(y) => {
                    let side = if end { &mut translation.to } else { &mut translation.from };
                    side.y = y;
                    do_translation = true;
                }
                TransformOp::TranslateZ(z) => {
                    let side = if end { &mut translation.to } else { &mut translation.from };
                    side.z = z;
                    do_translation = true;
                }
                TransformOp::Rotate { degrees, .. } => {
                    if end {
                        rotation.to = degrees;
                    } else {
                        rotation.from = degrees;
                    }
                    do_rotation = true;
                }
                TransformOp::Scale { x, y, z } => {
                    let side = if end { &mut scale.to } else { &mut scale.from };
                    *side = Vec3::new(x, y, z);
                    do_scale = true;
                }
                TransformOp::ScaleX(x) => {
                    let side = if end { &mut scale.to } else { &mut scale.from };
                    side.x = x;
                    do_scale = true;
                }
                TransformOp::ScaleY(y) => {
                    let side = if end { &mut scale.to } else { &mut scale.from };
                    side.y = y;
                    do_scale = true;
                }
                TransformOp::ScaleZ(z) => {
                    let side = if end { &mut scale.to } else { &mut scale.from };
                    side.z = z;
                    do_scale = true;
                }
            }
        }
    }

    TransformCurve {
        origin,
        matrix_interpolation: false,
        translation: do_translation.then_some(translation),
        rotation: do_rotation.then_some(rotation),
        scale: do_scale.then_some(scale),
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn timing(duration: f64) -> Arc<AnimationTiming> {
        Arc::new(AnimationTiming {
            duration,
            delay: 0.0,
            iterations: 1.0,
            alternate: false,
            function: TimingFunction::Linear,
        })
    }

    #[test]
    fn opacity_endpoints_carried_verbatim() {
        let keyframes = KeyframeList::Opacity(vec![0.25, 0.75]);
        let descriptor =
            decompose(&keyframes, &timing(1.0), None, Timestamp::ZERO, Point::ORIGIN).unwrap();
        assert_eq!(descriptor.property(), AnimatedProperty::Opacity);
        assert_eq!(descriptor.name, "opacity");
        match descriptor.curve {
            AnimationCurve::Opacity(span) => {
                assert_eq!(span.from, 0.25);
                assert_eq!(span.to, 0.75);
            }
            AnimationCurve::Transform(_) => panic!("expected opacity curve"),
        }
    }

    #[test]
    fn explicit_name_wins_over_property_name() {
        let keyframes = KeyframeList::Opacity(vec![0.0, 1.0]);
        let descriptor = decompose(
            &keyframes,
            &timing(1.0),
            Some("fade-in"),
            Timestamp::ZERO,
            Point::ORIGIN,
        )
        .unwrap();
        assert_eq!(descriptor.name, "fade-in");
    }

    #[test]
    fn empty_name_falls_back_to_property_name() {
        let keyframes = KeyframeList::Opacity(vec![0.0, 1.0]);
        let descriptor = decompose(
            &keyframes,
            &timing(1.0),
            Some(""),
            Timestamp::ZERO,
            Point::ORIGIN,
        )
        .unwrap();
        assert_eq!(descriptor.name, "opacity");
    }

    #[test]
    fn zero_duration_is_rejected() {
        let keyframes = KeyframeList::Opacity(vec![0.0, 1.0]);
        assert!(decompose(&keyframes, &timing(0.0), None, Timestamp::ZERO, Point::ORIGIN).is_none());
        assert!(
            decompose(&keyframes, &timing(f64::NAN), None, Timestamp::ZERO, Point::ORIGIN)
                .is_none()
        );
    }

    #[test]
    fn wrong_keyframe_count_is_rejected() {
        let single = KeyframeList::Opacity(vec![0.5]);
        assert!(decompose(&single, &timing(1.0), None, Timestamp::ZERO, Point::ORIGIN).is_none());

        let triple = KeyframeList::Opacity(vec![0.0, 0.5, 1.0]);
        assert!(decompose(&triple, &timing(1.0), None, Timestamp::ZERO, Point::ORIGIN).is_none());

        let empty = KeyframeList::Transform(vec![]);
        assert!(empty.is_empty());
        assert!(decompose(&empty, &timing(1.0), None, Timestamp::ZERO, Point::ORIGIN).is_none());
    }

    #[test]
    fn matching_lists_select_component_mode() {
        let keyframes = KeyframeList::Transform(vec![
            vec![
                TransformOp::TranslateX(0.0),
                TransformOp::Rotate {
                    axis: RotationAxis::Z,
                    degrees: 0.0,
                },
            ],
            vec![
                TransformOp::TranslateX(120.0),
                TransformOp::Rotate {
                    axis: RotationAxis::Z,
                    degrees: 90.0,
                },
            ],
        ]);
        let descriptor = decompose(
            &keyframes,
            &timing(1.0),
            None,
            Timestamp(2.0),
            Point::new(5.0, 6.0),
        )
        .unwrap();
        assert_eq!(descriptor.name, "transform");
        assert_eq!(descriptor.begin_time, Timestamp(2.0));
        let AnimationCurve::Transform(curve) = descriptor.curve else {
            panic!("expected transform curve");
        };
        assert!(!curve.matrix_interpolation);
        assert_eq!(curve.origin, Point::new(5.0, 6.0));
        let translation = curve.translation.unwrap();
        assert_eq!(translation.from.x, 0.0);
        assert_eq!(translation.to.x, 120.0);
        let rotation = curve.rotation.unwrap();
        assert_eq!(rotation.from, 0.0);
        assert_eq!(rotation.to, 90.0);
        assert!(curve.scale.is_none());
    }

    #[test]
    fn kind_mismatch_selects_matrix_mode() {
        let keyframes = KeyframeList::Transform(vec![
            vec![TransformOp::TranslateX(0.0)],
            vec![TransformOp::ScaleX(2.0)],
        ]);
        let descriptor =
            decompose(&keyframes, &timing(1.0), None, Timestamp::ZERO, Point::ORIGIN).unwrap();
        let AnimationCurve::Transform(curve) = descriptor.curve else {
            panic!("expected transform curve");
        };
        assert!(curve.matrix_interpolation);
        assert!(curve.translation.is_none());
        assert!(curve.rotation.is_none());
        assert!(curve.scale.is_none());
    }

    #[test]
    fn count_mismatch_selects_matrix_mode() {
        let keyframes = KeyframeList::Transform(vec![
            vec![TransformOp::TranslateX(0.0), TransformOp::ScaleX(1.0)],
            vec![TransformOp::TranslateX(10.0)],
        ]);
        let descriptor =
            decompose(&keyframes, &timing(1.0), None, Timestamp::ZERO, Point::ORIGIN).unwrap();
        let AnimationCurve::Transform(curve) = descriptor.curve else {
            panic!("expected transform curve");
        };
        assert!(curve.matrix_interpolation);
    }

    #[test]
    fn rotation_axis_participates_in_matching() {
        let keyframes = KeyframeList::Transform(vec![
            vec![TransformOp::Rotate {
                axis: RotationAxis::X,
                degrees: 0.0,
            }],
            vec![TransformOp::Rotate {
                axis: RotationAxis::Z,
                degrees: 45.0,
            }],
        ]);
        let descriptor =
            decompose(&keyframes, &timing(1.0), None, Timestamp::ZERO, Point::ORIGIN).unwrap();
        let AnimationCurve::Transform(curve) = descriptor.curve else {
            panic!("expected transform curve");
        };
        assert!(curve.matrix_interpolation);
    }

    #[test]
    fn combined_scale_accumulates_all_axes() {
        let keyframes = KeyframeList::Transform(vec![
            vec![TransformOp::Scale {
                x: 1.0,
                y: 1.0,
                z: 1.0,
            }],
            vec![TransformOp::Scale {
                x: 2.0,
                y: 3.0,
                z: 1.0,
            }],
        ]);
        let descriptor =
            decompose(&keyframes, &timing(1.0), None, Timestamp::ZERO, Point::ORIGIN).unwrap();
        let AnimationCurve::Transform(curve) = descriptor.curve else {
            panic!("expected transform curve");
        };
        let scale = curve.scale.unwrap();
        assert_eq!(scale.from, Vec3::ONE);
        assert_eq!(scale.to, Vec3::new(2.0, 3.0, 1.0));
        assert!(curve.translation.is_none());
        assert!(curve.rotation.is_none());
    }

    #[test]
    fn single_axis_ops_leave_other_components_at_defaults() {
        let keyframes = KeyframeList::Transform(vec![
            vec![TransformOp::TranslateY(5.0)],
            vec![TransformOp::TranslateY(25.0)],
        ]);
        let descriptor =
            decompose(&keyframes, &timing(1.0), None, Timestamp::ZERO, Point::ORIGIN).unwrap();
        let AnimationCurve::Transform(curve) = descriptor.curve else {
            panic!("expected transform curve");
        };
        let translation = curve.translation.unwrap();
        assert_eq!(translation.from, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(translation.to, Vec3::new(0.0, 25.0, 0.0));
    }

    #[test]
    fn timing_is_shared_not_copied() {
        let timing = timing(2.5);
        let keyframes = KeyframeList::Opacity(vec![0.0, 1.0]);
        let descriptor =
            decompose(&keyframes, &timing, None, Timestamp::ZERO, Point::ORIGIN).unwrap();
        assert!(Arc::ptr_eq(&descriptor.timing, &timing));
    }
}
