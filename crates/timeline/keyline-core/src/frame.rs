//! A single timeline slot on a layer.

use serde::{Deserialize, Serialize};

use crate::ids::{FrameId, ShapeId};
use crate::shape::{Shape, SymbolInstance};
use crate::tween::Easing;

/// Kind of tween that starts at a keyframe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TweenType {
    #[default]
    None,
    Motion,
    /// Accepted and persisted, evaluated as a hold (no path morphing).
    Shape,
}

impl TweenType {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Motion => "motion",
            Self::Shape => "shape",
        }
    }
}

/// One materialized frame. `is_empty` mirrors `shapes.is_empty()` and is only
/// changed through the shape methods below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub id: FrameId,
    /// 1-based, unique within a layer.
    pub index: u32,
    pub is_keyframe: bool,
    #[serde(default)]
    is_empty: bool,
    #[serde(default)]
    shapes: Vec<Shape>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    instances: Vec<SymbolInstance>,
    #[serde(default)]
    pub tween_type: TweenType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<Easing>,
    /// Span length for keyframes, maintained by the owning layer.
    #[serde(default = "default_duration")]
    pub duration: u32,
}

fn default_duration() -> u32 {
    1
}

impl Frame {
    /// An empty keyframe.
    pub fn keyframe(index: u32) -> Self {
        Self {
            id: FrameId::new(),
            index,
            is_keyframe: true,
            is_empty: true,
            shapes: Vec::new(),
            instances: Vec::new(),
            tween_type: TweenType::None,
            easing: None,
            duration: 1,
        }
    }

    /// A plain frame that only extends the span of the keyframe before it.
    pub fn plain(index: u32) -> Self {
        Self {
            is_keyframe: false,
            ..Self::keyframe(index)
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    #[inline]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    #[inline]
    pub fn instances(&self) -> &[SymbolInstance] {
        &self.instances
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Mutable access for in-place edits that cannot change emptiness (transform, style).
    pub fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
        self.sync_empty();
    }

    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        let pos = self.shapes.iter().position(|s| s.id == id)?;
        let removed = self.shapes.remove(pos);
        self.sync_empty();
        Some(removed)
    }

    /// Remove every shape matching `pred`, returning them in frame order.
    pub fn remove_shapes_where<F: FnMut(&Shape) -> bool>(&mut self, mut pred: F) -> Vec<Shape> {
        let (removed, kept): (Vec<Shape>, Vec<Shape>) = std::mem::take(&mut self.shapes)
            .into_iter()
            .partition(|s| pred(s));
        self.shapes = kept;
        self.sync_empty();
        removed
    }

    pub fn set_shapes(&mut self, shapes: Vec<Shape>) {
        self.shapes = shapes;
        self.sync_empty();
    }

    pub fn add_instance(&mut self, instance: SymbolInstance) {
        self.instances.push(instance);
    }

    pub fn set_instances(&mut self, instances: Vec<SymbolInstance>) {
        self.instances = instances;
    }

    /// Drop all content and tween settings. Identity, index and keyframe flag stay.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.instances.clear();
        self.tween_type = TweenType::None;
        self.easing = None;
        self.sync_empty();
    }

    /// Content copies under fresh ids, used for keyframe carry-forward.
    pub fn duplicate_content(&self) -> (Vec<Shape>, Vec<SymbolInstance>) {
        (
            self.shapes.iter().map(Shape::duplicate).collect(),
            self.instances
                .iter()
                .map(SymbolInstance::duplicate)
                .collect(),
        )
    }

    /// Restore derived fields after deserialization.
    pub(crate) fn normalize(&mut self) {
        self.sync_empty();
        if !self.is_keyframe {
            self.tween_type = TweenType::None;
            self.easing = None;
        }
    }

    #[inline]
    fn sync_empty(&mut self) {
        self.is_empty = self.shapes.is_empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_flag_tracks_shapes() {
        let mut frame = Frame::keyframe(1);
        assert!(frame.is_empty());

        let shape = Shape::rectangle(0.0, 0.0, 1.0, 1.0);
        let id = shape.id;
        frame.add_shape(shape);
        assert!(!frame.is_empty());

        assert!(frame.remove_shape(id).is_some());
        assert!(frame.is_empty());
        assert!(frame.remove_shape(id).is_none());
    }

    #[test]
    fn remove_where_keeps_order() {
        let mut frame = Frame::keyframe(1);
        let shapes: Vec<Shape> = (0..4)
            .map(|i| Shape::rectangle(i as f64, 0.0, 1.0, 1.0))
            .collect();
        let ids: Vec<ShapeId> = shapes.iter().map(|s| s.id).collect();
        frame.set_shapes(shapes);

        let removed = frame.remove_shapes_where(|s| s.id == ids[1] || s.id == ids[3]);
        assert_eq!(removed.iter().map(|s| s.id).collect::<Vec<_>>(), vec![ids[1], ids[3]]);
        assert_eq!(
            frame.shapes().iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![ids[0], ids[2]]
        );
    }

    #[test]
    fn clear_resets_tween() {
        let mut frame = Frame::keyframe(1);
        frame.add_shape(Shape::rectangle(0.0, 0.0, 1.0, 1.0));
        frame.tween_type = TweenType::Motion;
        frame.easing = Some(Easing::EaseInQuad);
        frame.clear();
        assert!(frame.is_empty());
        assert_eq!(frame.tween_type, TweenType::None);
        assert!(frame.easing.is_none());
        assert!(frame.is_keyframe);
    }

    #[test]
    fn normalize_strips_tween_from_plain_frames() {
        let mut frame = Frame::plain(4);
        frame.tween_type = TweenType::Motion;
        frame.normalize();
        assert_eq!(frame.tween_type, TweenType::None);
    }

    #[test]
    fn serialized_field_names() {
        let json = serde_json::to_value(Frame::keyframe(3)).unwrap();
        assert_eq!(json["isKeyframe"], true);
        assert_eq!(json["isEmpty"], true);
        assert_eq!(json["tweenType"], "none");
        assert!(json.get("easing").is_none());
        assert!(json.get("instances").is_none());
    }
}
