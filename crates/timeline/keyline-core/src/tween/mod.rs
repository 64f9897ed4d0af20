//! Motion tween engine.
//!
//! Pure functions over two keyframes' shape lists. Inputs are never mutated; results carry
//! borrowed shapes plus the transform to draw them with.

pub mod easing;

pub use easing::{ease, Easing};

use crate::geometry::Transform;
use crate::ids::ShapeId;
use crate::shape::Shape;

/// Linear interpolation of scalars.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Wrap degrees into (-180, 180].
#[inline]
pub fn normalize_angle(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    if r > 180.0 {
        r - 360.0
    } else {
        r
    }
}

/// Interpolate angles in degrees along the shortest arc. Result is in (-180, 180].
#[inline]
pub fn lerp_angle(from: f64, to: f64, t: f64) -> f64 {
    let delta = normalize_angle(to - from);
    normalize_angle(from + delta * t)
}

/// One shape as it should be drawn at some point inside a tween span.
#[derive(Debug, Clone, PartialEq)]
pub struct TweenSample<'a> {
    pub shape: &'a Shape,
    pub transform: Transform,
    /// Eased progress this shape was evaluated at; 0 for shapes that hold still.
    pub progress: f64,
}

/// Explicit start/end correspondence for one animated object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenPair<'a> {
    pub start: &'a Shape,
    pub end: &'a Shape,
}

fn find_by_id(shapes: &[Shape], id: ShapeId) -> Option<&Shape> {
    shapes.iter().find(|s| s.id == id)
}

/// Interpolate two keyframes' shapes, matching them by id.
///
/// - matched: transform lerped at eased progress, rotation on the shortest arc
/// - only in `start`: passed through with its own transform at progress 0
/// - only in `end`: end transform, alpha faded in from 0
///
/// Output order is `start` order followed by end-only shapes in `end` order.
pub fn interpolate<'a>(
    start: &'a [Shape],
    end: &'a [Shape],
    progress: f64,
    easing: Option<Easing>,
) -> Vec<TweenSample<'a>> {
    let eased = ease(easing, progress);
    let mut out = Vec::with_capacity(start.len().max(end.len()));

    for shape in start {
        match find_by_id(end, shape.id) {
            Some(target) => out.push(TweenSample {
                shape,
                transform: shape.transform.lerp(&target.transform, eased),
                progress: eased,
            }),
            None => out.push(TweenSample {
                shape,
                transform: shape.transform,
                progress: 0.0,
            }),
        }
    }

    for shape in end {
        if find_by_id(start, shape.id).is_none() {
            let mut transform = shape.transform;
            transform.alpha = shape.transform.alpha * eased;
            out.push(TweenSample {
                shape,
                transform,
                progress: eased,
            });
        }
    }

    out
}

/// Whether a motion tween between two keyframes has anything to animate.
///
/// Two single-shape keyframes always qualify: the end shape is taken as the start
/// shape redrawn.
pub fn can_motion_tween(start: &[Shape], end: &[Shape]) -> bool {
    if start.is_empty() || end.is_empty() {
        return false;
    }
    if start.iter().any(|s| find_by_id(end, s.id).is_some()) {
        return true;
    }
    start.len() == 1 && end.len() == 1
}

/// Pair shapes by id first, then pair the leftovers positionally.
/// Shapes left over on the longer side are not paired.
pub fn create_tween_pairs<'a>(start: &'a [Shape], end: &'a [Shape]) -> Vec<TweenPair<'a>> {
    let mut pairs = Vec::with_capacity(start.len().min(end.len()));
    let mut end_used = vec![false; end.len()];
    let mut start_unmatched = Vec::new();

    for s in start {
        match end.iter().position(|e| e.id == s.id) {
            Some(i) => {
                end_used[i] = true;
                pairs.push(TweenPair { start: s, end: &end[i] });
            }
            None => start_unmatched.push(s),
        }
    }

    let end_unmatched = end
        .iter()
        .zip(end_used)
        .filter(|(_, used)| !used)
        .map(|(e, _)| e);
    for (s, e) in start_unmatched.into_iter().zip(end_unmatched) {
        pairs.push(TweenPair { start: s, end: e });
    }

    pairs
}

/// Interpolate explicit pairs. The start shape supplies the geometry.
pub fn interpolate_pairs<'a>(
    pairs: &[TweenPair<'a>],
    progress: f64,
    easing: Option<Easing>,
) -> Vec<TweenSample<'a>> {
    let eased = ease(easing, progress);
    pairs
        .iter()
        .map(|pair| TweenSample {
            shape: pair.start,
            transform: pair.start.transform.lerp(&pair.end.transform, eased),
            progress: eased,
        })
        .collect()
}

/// Draw list for a frame inside a motion span, in `start` paint order.
///
/// Paired shapes move toward their partner; unpaired start shapes hold. End-only shapes are
/// left out until the end keyframe itself is reached.
pub fn sample_span<'a>(
    start: &'a [Shape],
    end: &'a [Shape],
    progress: f64,
    easing: Option<Easing>,
) -> Vec<TweenSample<'a>> {
    if !can_motion_tween(start, end) {
        return start
            .iter()
            .map(|shape| TweenSample {
                shape,
                transform: shape.transform,
                progress: 0.0,
            })
            .collect();
    }

    let pairs = create_tween_pairs(start, end);
    let eased = ease(easing, progress);
    start
        .iter()
        .map(|shape| {
            match pairs.iter().find(|p| p.start.id == shape.id) {
                Some(pair) => TweenSample {
                    shape,
                    transform: shape.transform.lerp(&pair.end.transform, eased),
                    progress: eased,
                },
                None => TweenSample {
                    shape,
                    transform: shape.transform,
                    progress: 0.0,
                },
            }
        })
        .collect()
}

/// Progress of `frame` through the span `[start, next)`, as used by renderers.
#[inline]
pub fn span_progress(frame: u32, start: u32, next: u32) -> f64 {
    if next <= start {
        return 0.0;
    }
    (f64::from(frame) - f64::from(start)) / (f64::from(next) - f64::from(start))
}
