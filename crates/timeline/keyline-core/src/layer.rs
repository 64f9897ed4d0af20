//! Layers: sparse, index-sorted frame storage and keyframe resolution.
//!
//! Only keyframes and explicitly inserted frames are materialized. Every other index is
//! governed by the nearest keyframe at or before it, found with a predecessor search over the
//! sorted frame list.

use serde::{Deserialize, Serialize};

use crate::frame::{Frame, TweenType};
use crate::ids::{FrameId, LayerId, ShapeId};
use crate::shape::{Shape, SymbolInstance};
use crate::tween::{span_progress, Easing};
use crate::EditorError;

/// Highest frame index a layer accepts. Edits beyond it are no-ops and projects that use it
/// are rejected on load.
pub const MAX_FRAME_INDEX: u32 = 1 << 24;

#[inline]
fn in_range(index: u32) -> bool {
    (1..=MAX_FRAME_INDEX).contains(&index)
}

/// Motion span that a frame index falls strictly inside.
#[derive(Debug, Clone, Copy)]
pub struct TweenSpan<'a> {
    pub start: &'a Frame,
    pub end: &'a Frame,
    /// Un-eased progress through the span.
    pub progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    /// UI color tag, `#rrggbb`.
    pub color: String,
    frames: Vec<Frame>,
}

impl Layer {
    /// A layer with an empty keyframe at frame 1.
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: LayerId::new(),
            name: name.into(),
            visible: true,
            locked: false,
            color: color.into(),
            frames: vec![Frame::keyframe(1)],
        }
    }

    /// Materialized frames in ascending index order.
    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[inline]
    fn position(&self, index: u32) -> Result<usize, usize> {
        self.frames.binary_search_by_key(&index, |f| f.index)
    }

    /// Number of materialized frames with `index <= query`.
    #[inline]
    fn upper_bound(&self, index: u32) -> usize {
        self.frames.partition_point(|f| f.index <= index)
    }

    /// Exact lookup; `None` if the index is not materialized.
    pub fn get_frame(&self, index: u32) -> Option<&Frame> {
        self.position(index).ok().map(|pos| &self.frames[pos])
    }

    pub(crate) fn frame_mut(&mut self, index: u32) -> Option<&mut Frame> {
        match self.position(index) {
            Ok(pos) => Some(&mut self.frames[pos]),
            Err(_) => None,
        }
    }

    /// The keyframe in effect at `index`: greatest keyframe index `<= index`.
    pub fn get_keyframe_at(&self, index: u32) -> Option<&Frame> {
        let end = self.upper_bound(index);
        self.frames[..end].iter().rev().find(|f| f.is_keyframe)
    }

    fn keyframe_mut_at(&mut self, index: u32) -> Option<&mut Frame> {
        let end = self.upper_bound(index);
        self.frames[..end].iter_mut().rev().find(|f| f.is_keyframe)
    }

    /// Smallest keyframe strictly after `index`.
    pub fn get_next_keyframe(&self, index: u32) -> Option<&Frame> {
        let start = self.upper_bound(index);
        self.frames[start..].iter().find(|f| f.is_keyframe)
    }

    pub fn keyframe_indices(&self) -> Vec<u32> {
        self.frames
            .iter()
            .filter(|f| f.is_keyframe)
            .map(|f| f.index)
            .collect()
    }

    /// Make `index` a keyframe. A new or empty slot starts as a copy of the content in effect
    /// just before it, under fresh ids.
    pub fn insert_keyframe(&mut self, index: u32) -> Option<FrameId> {
        if !in_range(index) {
            return None;
        }
        let seed = if index > 1 {
            self.get_keyframe_at(index - 1)
                .map(Frame::duplicate_content)
        } else {
            None
        };

        let id = match self.position(index) {
            Ok(pos) => {
                let frame = &mut self.frames[pos];
                frame.is_keyframe = true;
                if frame.is_empty() && frame.instances().is_empty() {
                    if let Some((shapes, instances)) = seed {
                        frame.set_shapes(shapes);
                        frame.set_instances(instances);
                    }
                }
                frame.id
            }
            Err(pos) => {
                let mut frame = Frame::keyframe(index);
                if let Some((shapes, instances)) = seed {
                    frame.set_shapes(shapes);
                    frame.set_instances(instances);
                }
                let id = frame.id;
                self.frames.insert(pos, frame);
                id
            }
        };
        self.refresh_spans();
        Some(id)
    }

    /// Make `index` an empty keyframe with no tween. Nothing is carried forward.
    pub fn insert_blank_keyframe(&mut self, index: u32) -> Option<FrameId> {
        if !in_range(index) {
            return None;
        }
        let id = match self.position(index) {
            Ok(pos) => {
                let frame = &mut self.frames[pos];
                frame.is_keyframe = true;
                frame.clear();
                frame.id
            }
            Err(pos) => {
                let frame = Frame::keyframe(index);
                let id = frame.id;
                self.frames.insert(pos, frame);
                id
            }
        };
        self.refresh_spans();
        Some(id)
    }

    /// Materialize a plain frame, extending the span of the keyframe before it.
    /// Returns `false` if the slot already exists.
    pub fn insert_frame(&mut self, index: u32) -> bool {
        if !in_range(index) {
            return false;
        }
        match self.position(index) {
            Ok(_) => false,
            Err(pos) => {
                self.frames.insert(pos, Frame::plain(index));
                self.refresh_spans();
                true
            }
        }
    }

    /// Frame 1 is emptied but kept; any other frame is removed so the previous keyframe
    /// governs its range again. Returns the frame as it was before the change.
    pub fn clear_keyframe(&mut self, index: u32) -> Option<Frame> {
        let pos = self.position(index).ok()?;
        let before = if index == 1 {
            let frame = &mut self.frames[pos];
            let snapshot = frame.clone();
            frame.clear();
            snapshot
        } else {
            self.frames.remove(pos)
        };
        self.refresh_spans();
        Some(before)
    }

    /// The keyframe at exactly `index`, inserting one (with carry-forward) if the keyframe in
    /// effect sits at another index.
    pub(crate) fn keyframe_for_edit(&mut self, index: u32) -> Option<&mut Frame> {
        if !in_range(index) {
            return None;
        }
        let governed_here = self
            .get_keyframe_at(index)
            .is_some_and(|kf| kf.index == index);
        if !governed_here {
            self.insert_keyframe(index)?;
        }
        self.frame_mut(index)
    }

    /// Append a shape at `index`, first inserting a keyframe there if the keyframe in effect
    /// sits at another index.
    pub fn add_shape_at_frame(&mut self, index: u32, shape: Shape) -> bool {
        match self.keyframe_for_edit(index) {
            Some(frame) => {
                frame.add_shape(shape);
                true
            }
            None => false,
        }
    }

    /// Place a symbol instance at `index`, inserting a keyframe there like `add_shape_at_frame`.
    pub fn add_instance_at_frame(&mut self, index: u32, instance: SymbolInstance) -> bool {
        match self.keyframe_for_edit(index) {
            Some(frame) => {
                frame.add_instance(instance);
                true
            }
            None => false,
        }
    }

    /// Shapes of the keyframe in effect at `index`.
    pub fn get_shapes_at_frame(&self, index: u32) -> &[Shape] {
        self.get_keyframe_at(index)
            .map(Frame::shapes)
            .unwrap_or_default()
    }

    /// Highest materialized index, at least 1.
    pub fn get_frame_count(&self) -> u32 {
        self.frames.last().map_or(1, |f| f.index.max(1))
    }

    /// Set the tween on the keyframe governing `index`. Returns that keyframe's index.
    pub fn set_tween(
        &mut self,
        index: u32,
        tween_type: TweenType,
        easing: Option<Easing>,
    ) -> Option<u32> {
        let keyframe = self.keyframe_mut_at(index)?;
        keyframe.tween_type = tween_type;
        keyframe.easing = match tween_type {
            TweenType::None => None,
            _ => easing,
        };
        Some(keyframe.index)
    }

    /// The motion span `index` falls strictly inside, if any.
    pub fn tween_span(&self, index: u32) -> Option<TweenSpan<'_>> {
        let start = self.get_keyframe_at(index)?;
        if start.tween_type != TweenType::Motion || start.index == index {
            return None;
        }
        let end = self.get_next_keyframe(index)?;
        Some(TweenSpan {
            start,
            end,
            progress: span_progress(index, start.index, end.index),
        })
    }

    /// Locate a shape anywhere on this layer. Returns the owning frame index.
    pub fn find_shape(&self, id: ShapeId) -> Option<(u32, &Shape)> {
        self.frames
            .iter()
            .find_map(|f| f.shape(id).map(|s| (f.index, s)))
    }

    /// Swap the slot at `index` wholesale. `None` removes it, except at frame 1 which must
    /// always hold a keyframe. Returns the previous occupant.
    pub fn replace_frame(&mut self, index: u32, frame: Option<Frame>) -> Option<Frame> {
        if !in_range(index) {
            return None;
        }
        let previous = match (self.position(index), frame) {
            (Ok(pos), Some(mut frame)) => {
                frame.index = index;
                if index == 1 {
                    frame.is_keyframe = true;
                }
                Some(std::mem::replace(&mut self.frames[pos], frame))
            }
            (Ok(_), None) if index == 1 => return None,
            (Ok(pos), None) => Some(self.frames.remove(pos)),
            (Err(pos), Some(mut frame)) => {
                frame.index = index;
                if index == 1 {
                    frame.is_keyframe = true;
                }
                self.frames.insert(pos, frame);
                None
            }
            (Err(_), None) => None,
        };
        self.refresh_spans();
        previous
    }

    /// Recompute keyframe span durations from the current keyframe layout.
    pub(crate) fn refresh_spans(&mut self) {
        let mut next_key = u64::from(self.get_frame_count()) + 1;
        for frame in self.frames.iter_mut().rev() {
            if frame.is_keyframe {
                let span = next_key - u64::from(frame.index);
                frame.duration = u32::try_from(span).unwrap_or(u32::MAX);
                next_key = u64::from(frame.index);
            } else {
                frame.duration = 1;
            }
        }
    }

    /// Check structural invariants of a deserialized layer.
    pub(crate) fn validate(&self) -> Result<(), EditorError> {
        let mut seen = hashbrown::HashSet::with_capacity(self.frames.len());
        for frame in &self.frames {
            if !in_range(frame.index) {
                return Err(EditorError::invalid_document(format!(
                    "layer '{}' has frame index {} outside 1..={}",
                    self.name, frame.index, MAX_FRAME_INDEX
                )));
            }
            if !seen.insert(frame.index) {
                return Err(EditorError::invalid_document(format!(
                    "layer '{}' has duplicate frame index {}",
                    self.name, frame.index
                )));
            }
            for shape in frame.shapes() {
                shape.validate()?;
            }
        }
        match self.frames.iter().find(|f| f.index == 1) {
            Some(first) if first.is_keyframe => Ok(()),
            Some(_) => Err(EditorError::invalid_document(format!(
                "layer '{}': frame 1 is not a keyframe",
                self.name
            ))),
            None => Err(EditorError::invalid_document(format!(
                "layer '{}' has no frame 1",
                self.name
            ))),
        }
    }

    /// Restore ordering and derived fields after deserialization.
    pub(crate) fn normalize(&mut self) {
        self.frames.sort_by_key(|f| f.index);
        for frame in &mut self.frames {
            frame.normalize();
        }
        self.refresh_spans();
    }
}
