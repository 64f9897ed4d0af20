//! Concrete document commands.
//!
//! Frame-level commands work on slot snapshots: on their first run they record each touched
//! frame slot before and after the mutation. Undo puts the "before" copies back. Redo puts the
//! "after" copies back, so ids generated during the first run (carried-forward shapes, new
//! keyframes) come back identical.

use crate::document::Document;
use crate::frame::{Frame, TweenType};
use crate::geometry::Transform;
use crate::ids::{LayerId, ShapeId, SymbolId};
use crate::layer::Layer;
use crate::shape::{Shape, SymbolInstance};
use crate::symbol::{Symbol, SymbolType};
use crate::tween::Easing;

use super::command::Command;

/// Before/after copies of one frame slot. `None` means "not materialized".
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FrameEdit {
    layer_id: LayerId,
    index: u32,
    before: Option<Frame>,
    after: Option<Frame>,
}

impl FrameEdit {
    fn begin(doc: &Document, layer_id: LayerId, index: u32) -> Self {
        Self {
            layer_id,
            index,
            before: doc.frame_snapshot(layer_id, index),
            after: None,
        }
    }

    fn finish(&mut self, doc: &Document) {
        self.after = doc.frame_snapshot(self.layer_id, self.index);
    }

    fn changed(&self) -> bool {
        self.before != self.after
    }

    fn restore_before(&self, doc: &mut Document) {
        doc.replace_frame(self.layer_id, self.index, self.before.clone());
    }

    fn restore_after(&self, doc: &mut Document) {
        doc.replace_frame(self.layer_id, self.index, self.after.clone());
    }
}

fn undo_edits(edits: &[FrameEdit], doc: &mut Document) {
    for edit in edits.iter().rev() {
        edit.restore_before(doc);
    }
}

fn redo_edits(edits: &[FrameEdit], doc: &mut Document) {
    for edit in edits {
        edit.restore_after(doc);
    }
}

/// Group `ids` by the (unlocked layer, keyframe) that holds them at `frame`.
fn group_by_keyframe(
    doc: &Document,
    frame: u32,
    ids: &[ShapeId],
) -> Vec<(LayerId, u32, Vec<ShapeId>)> {
    let mut groups: Vec<(LayerId, u32, Vec<ShapeId>)> = Vec::new();
    for id in ids {
        let Some(location) = doc.find_shape_at(*id, frame) else {
            log::debug!("shape {id} not found at frame {frame}");
            continue;
        };
        if doc.layer(location.layer_id).is_some_and(|l| l.locked) {
            continue;
        }
        match groups
            .iter_mut()
            .find(|(layer, index, _)| *layer == location.layer_id && *index == location.frame)
        {
            Some((_, _, members)) => members.push(*id),
            None => groups.push((location.layer_id, location.frame, vec![*id])),
        }
    }
    groups
}

// ---- layers ---------------------------------------------------------------------------------

/// Add a layer on top of the stack and select it.
#[derive(Debug, Default)]
pub struct AddLayerCommand {
    name: Option<String>,
    layer_id: Option<LayerId>,
    previous_selection: Option<LayerId>,
    removed: Option<Layer>,
}

impl AddLayerCommand {
    pub fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            ..Self::default()
        }
    }

    /// Id of the created layer once executed.
    pub fn layer_id(&self) -> Option<LayerId> {
        self.layer_id
    }
}

impl Command for AddLayerCommand {
    fn execute(&mut self, doc: &mut Document) -> bool {
        self.previous_selection = doc.selected_layer_id();
        match self.removed.take() {
            Some(layer) => {
                let id = layer.id;
                if !doc.insert_layer_at(0, layer) {
                    return false;
                }
                doc.select_layer(id);
            }
            None => self.layer_id = Some(doc.add_layer(self.name.as_deref())),
        }
        true
    }

    fn undo(&mut self, doc: &mut Document) {
        let Some(id) = self.layer_id else {
            return;
        };
        if let Some((_, layer)) = doc.remove_layer(id) {
            self.removed = Some(layer);
        }
        if let Some(previous) = self.previous_selection {
            doc.select_layer(previous);
        }
    }

    fn description(&self) -> String {
        "Add Layer".to_string()
    }
}

/// Remove a layer; undo puts it back at its old position.
#[derive(Debug)]
pub struct RemoveLayerCommand {
    layer_id: LayerId,
    removed: Option<(usize, Layer)>,
    was_selected: bool,
}

impl RemoveLayerCommand {
    pub fn new(layer_id: LayerId) -> Self {
        Self {
            layer_id,
            removed: None,
            was_selected: false,
        }
    }
}

impl Command for RemoveLayerCommand {
    fn execute(&mut self, doc: &mut Document) -> bool {
        self.was_selected = doc.selected_layer_id() == Some(self.layer_id);
        self.removed = doc.remove_layer(self.layer_id);
        self.removed.is_some()
    }

    fn undo(&mut self, doc: &mut Document) {
        if let Some((index, layer)) = self.removed.take() {
            doc.insert_layer_at(index, layer);
            if self.was_selected {
                doc.select_layer(self.layer_id);
            }
        }
    }

    fn description(&self) -> String {
        "Delete Layer".to_string()
    }
}

/// Reorder a layer within the stack.
#[derive(Debug)]
pub struct MoveLayerCommand {
    layer_id: LayerId,
    to: usize,
    from: Option<usize>,
}

impl MoveLayerCommand {
    pub fn new(layer_id: LayerId, to: usize) -> Self {
        Self {
            layer_id,
            to,
            from: None,
        }
    }
}

impl Command for MoveLayerCommand {
    fn execute(&mut self, doc: &mut Document) -> bool {
        let Some(from) = doc.move_layer(self.layer_id, self.to) else {
            return false;
        };
        self.from = Some(from);
        doc.layer_index(self.layer_id) != Some(from)
    }

    fn undo(&mut self, doc: &mut Document) {
        if let Some(from) = self.from {
            doc.move_layer(self.layer_id, from);
        }
    }

    fn description(&self) -> String {
        "Move Layer".to_string()
    }
}

/// A single editable layer attribute with its new value.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerProperty {
    Name(String),
    Visible(bool),
    Locked(bool),
    Color(String),
}

impl LayerProperty {
    /// Write the value, returning the one it replaced.
    fn apply(&self, doc: &mut Document, layer_id: LayerId) -> Option<LayerProperty> {
        match self {
            Self::Name(name) => doc.rename_layer(layer_id, name.clone()).map(Self::Name),
            Self::Visible(v) => doc.set_layer_visible(layer_id, *v).map(Self::Visible),
            Self::Locked(v) => doc.set_layer_locked(layer_id, *v).map(Self::Locked),
            Self::Color(c) => doc.set_layer_color(layer_id, c.clone()).map(Self::Color),
        }
    }
}

#[derive(Debug)]
pub struct LayerPropertyCommand {
    layer_id: LayerId,
    value: LayerProperty,
    previous: Option<LayerProperty>,
}

impl LayerPropertyCommand {
    pub fn new(layer_id: LayerId, value: LayerProperty) -> Self {
        Self {
            layer_id,
            value,
            previous: None,
        }
    }
}

impl Command for LayerPropertyCommand {
    fn execute(&mut self, doc: &mut Document) -> bool {
        self.previous = self.value.apply(doc, self.layer_id);
        self.previous.as_ref().is_some_and(|p| *p != self.value)
    }

    fn undo(&mut self, doc: &mut Document) {
        if let Some(previous) = &self.previous {
            previous.apply(doc, self.layer_id);
        }
    }

    fn description(&self) -> String {
        match self.value {
            LayerProperty::Name(_) => "Rename Layer",
            LayerProperty::Visible(_) => "Toggle Layer Visibility",
            LayerProperty::Locked(_) => "Toggle Layer Lock",
            LayerProperty::Color(_) => "Change Layer Color",
        }
        .to_string()
    }
}

// ---- keyframes ------------------------------------------------------------------------------

/// Timeline structure edits at one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyframeOp {
    Insert,
    InsertBlank,
    Clear,
    InsertFrame,
}

#[derive(Debug)]
pub struct KeyframeCommand {
    layer_id: LayerId,
    index: u32,
    op: KeyframeOp,
    edit: Option<FrameEdit>,
}

impl KeyframeCommand {
    pub fn new(layer_id: LayerId, index: u32, op: KeyframeOp) -> Self {
        Self {
            layer_id,
            index,
            op,
            edit: None,
        }
    }

    pub fn insert(layer_id: LayerId, index: u32) -> Self {
        Self::new(layer_id, index, KeyframeOp::Insert)
    }

    pub fn insert_blank(layer_id: LayerId, index: u32) -> Self {
        Self::new(layer_id, index, KeyframeOp::InsertBlank)
    }

    pub fn clear(layer_id: LayerId, index: u32) -> Self {
        Self::new(layer_id, index, KeyframeOp::Clear)
    }

    pub fn insert_frame(layer_id: LayerId, index: u32) -> Self {
        Self::new(layer_id, index, KeyframeOp::InsertFrame)
    }
}

impl Command for KeyframeCommand {
    fn execute(&mut self, doc: &mut Document) -> bool {
        if let Some(edit) = &self.edit {
            edit.restore_after(doc);
            return true;
        }
        let mut edit = FrameEdit::begin(doc, self.layer_id, self.index);
        let applied = match self.op {
            KeyframeOp::Insert => doc.insert_keyframe(self.layer_id, self.index).is_some(),
            KeyframeOp::InsertBlank => doc
                .insert_blank_keyframe(self.layer_id, self.index)
                .is_some(),
            KeyframeOp::Clear => doc.clear_keyframe(self.layer_id, self.index).is_some(),
            KeyframeOp::InsertFrame => doc.insert_frame(self.layer_id, self.index),
        };
        edit.finish(doc);
        if !applied || !edit.changed() {
            return false;
        }
        self.edit = Some(edit);
        true
    }

    fn undo(&mut self, doc: &mut Document) {
        if let Some(edit) = &self.edit {
            edit.restore_before(doc);
        }
    }

    fn description(&self) -> String {
        match self.op {
            KeyframeOp::Insert => "Insert Keyframe",
            KeyframeOp::InsertBlank => "Insert Blank Keyframe",
            KeyframeOp::Clear => "Clear Keyframe",
            KeyframeOp::InsertFrame => "Insert Frame",
        }
        .to_string()
    }
}

/// Set (or remove, with `TweenType::None`) the tween governing an index.
#[derive(Debug)]
pub struct SetTweenCommand {
    layer_id: LayerId,
    index: u32,
    tween_type: TweenType,
    easing: Option<Easing>,
    edit: Option<FrameEdit>,
}

impl SetTweenCommand {
    pub fn new(
        layer_id: LayerId,
        index: u32,
        tween_type: TweenType,
        easing: Option<Easing>,
    ) -> Self {
        Self {
            layer_id,
            index,
            tween_type,
            easing,
            edit: None,
        }
    }
}

impl Command for SetTweenCommand {
    fn execute(&mut self, doc: &mut Document) -> bool {
        if let Some(edit) = &self.edit {
            edit.restore_after(doc);
            return true;
        }
        let Some(key_index) = doc
            .layer(self.layer_id)
            .and_then(|l| l.get_keyframe_at(self.index))
            .map(|f| f.index)
        else {
            return false;
        };
        let mut edit = FrameEdit::begin(doc, self.layer_id, key_index);
        let applied = doc
            .set_tween(self.layer_id, self.index, self.tween_type, self.easing)
            .is_some();
        edit.finish(doc);
        if !applied || !edit.changed() {
            return false;
        }
        self.edit = Some(edit);
        true
    }

    fn undo(&mut self, doc: &mut Document) {
        if let Some(edit) = &self.edit {
            edit.restore_before(doc);
        }
    }

    fn description(&self) -> String {
        match self.tween_type {
            TweenType::None => "Remove Tween".to_string(),
            kind => format!("Create {} Tween", capitalize(kind.name())),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---- shapes ---------------------------------------------------------------------------------

/// Add a shape at a layer/frame, creating a keyframe there if needed.
#[derive(Debug)]
pub struct AddShapeCommand {
    layer_id: LayerId,
    index: u32,
    shape: Shape,
    edit: Option<FrameEdit>,
}

impl AddShapeCommand {
    pub fn new(layer_id: LayerId, index: u32, shape: Shape) -> Self {
        Self {
            layer_id,
            index,
            shape,
            edit: None,
        }
    }

    /// Target the selected layer at the playhead.
    pub fn at_playhead(doc: &Document, shape: Shape) -> Option<Self> {
        let layer_id = doc.selected_layer_id()?;
        Some(Self::new(layer_id, doc.current_frame(), shape))
    }

    pub fn shape_id(&self) -> ShapeId {
        self.shape.id
    }
}

impl Command for AddShapeCommand {
    fn execute(&mut self, doc: &mut Document) -> bool {
        if let Some(edit) = &self.edit {
            edit.restore_after(doc);
            return true;
        }
        let mut edit = FrameEdit::begin(doc, self.layer_id, self.index);
        if doc
            .add_shape_to(self.layer_id, self.index, self.shape.clone())
            .is_none()
        {
            return false;
        }
        edit.finish(doc);
        self.edit = Some(edit);
        true
    }

    fn undo(&mut self, doc: &mut Document) {
        if let Some(edit) = &self.edit {
            edit.restore_before(doc);
        }
    }

    fn description(&self) -> String {
        "Add Shape".to_string()
    }
}

/// Remove shapes shown at a frame. The frame is fixed when the command first runs, so a later
/// undo restores the right keyframes wherever the playhead has moved since.
#[derive(Debug)]
pub struct RemoveShapesCommand {
    shape_ids: Vec<ShapeId>,
    edits: Vec<FrameEdit>,
}

impl RemoveShapesCommand {
    pub fn new(shape_ids: Vec<ShapeId>) -> Self {
        Self {
            shape_ids,
            edits: Vec::new(),
        }
    }

    /// Remove whatever is currently selected.
    pub fn from_selection(doc: &Document) -> Self {
        Self::new(doc.selected_shape_ids())
    }
}

impl Command for RemoveShapesCommand {
    fn execute(&mut self, doc: &mut Document) -> bool {
        if !self.edits.is_empty() {
            redo_edits(&self.edits, doc);
            return true;
        }
        let frame = doc.current_frame();
        for (layer_id, key_index, ids) in group_by_keyframe(doc, frame, &self.shape_ids) {
            let mut edit = FrameEdit::begin(doc, layer_id, key_index);
            for id in ids {
                doc.remove_shape(layer_id, key_index, id);
            }
            edit.finish(doc);
            if edit.changed() {
                self.edits.push(edit);
            }
        }
        !self.edits.is_empty()
    }

    fn undo(&mut self, doc: &mut Document) {
        undo_edits(&self.edits, doc);
    }

    fn description(&self) -> String {
        if self.shape_ids.len() == 1 {
            "Delete Shape".to_string()
        } else {
            "Delete Shapes".to_string()
        }
    }
}

/// How a transform command changes each shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformChange {
    /// Move by an offset.
    Translate { dx: f64, dy: f64 },
    /// Replace the whole transform.
    Set(Transform),
}

impl TransformChange {
    fn apply(&self, current: Transform) -> Transform {
        match *self {
            Self::Translate { dx, dy } => current.translated(dx, dy),
            Self::Set(transform) => transform,
        }
    }
}

/// Change the transform of shapes shown at the playhead.
#[derive(Debug)]
pub struct TransformShapesCommand {
    shape_ids: Vec<ShapeId>,
    change: TransformChange,
    edits: Vec<FrameEdit>,
}

impl TransformShapesCommand {
    pub fn new(shape_ids: Vec<ShapeId>, change: TransformChange) -> Self {
        Self {
            shape_ids,
            change,
            edits: Vec::new(),
        }
    }

    pub fn translate(shape_ids: Vec<ShapeId>, dx: f64, dy: f64) -> Self {
        Self::new(shape_ids, TransformChange::Translate { dx, dy })
    }
}

impl Command for TransformShapesCommand {
    fn execute(&mut self, doc: &mut Document) -> bool {
        if !self.edits.is_empty() {
            redo_edits(&self.edits, doc);
            return true;
        }
        let frame = doc.current_frame();
        for (layer_id, key_index, ids) in group_by_keyframe(doc, frame, &self.shape_ids) {
            let mut edit = FrameEdit::begin(doc, layer_id, key_index);
            for id in ids {
                let Some(current) = doc
                    .layer(layer_id)
                    .and_then(|l| l.get_frame(key_index))
                    .and_then(|f| f.shape(id))
                    .map(|s| s.transform)
                else {
                    continue;
                };
                doc.set_shape_transform(layer_id, key_index, id, self.change.apply(current));
            }
            edit.finish(doc);
            if edit.changed() {
                self.edits.push(edit);
            }
        }
        !self.edits.is_empty()
    }

    fn undo(&mut self, doc: &mut Document) {
        undo_edits(&self.edits, doc);
    }

    fn description(&self) -> String {
        match self.change {
            TransformChange::Translate { .. } => "Move".to_string(),
            TransformChange::Set(_) => "Transform".to_string(),
        }
    }
}

/// Replace shapes shown at the playhead with an instance of a new library symbol.
///
/// The instance is placed on the topmost layer that held any of the shapes. Shapes keep their
/// own transforms inside the symbol, so the instance starts at identity and nothing moves.
#[derive(Debug)]
pub struct ConvertToSymbolCommand {
    shape_ids: Vec<ShapeId>,
    name: String,
    kind: SymbolType,
    symbol: Option<(usize, Symbol)>,
    symbol_id: Option<SymbolId>,
    edits: Vec<FrameEdit>,
}

impl ConvertToSymbolCommand {
    pub fn new(shape_ids: Vec<ShapeId>, name: impl Into<String>, kind: SymbolType) -> Self {
        Self {
            shape_ids,
            name: name.into(),
            kind,
            symbol: None,
            symbol_id: None,
            edits: Vec::new(),
        }
    }

    /// Id of the created symbol once executed.
    pub fn symbol_id(&self) -> Option<SymbolId> {
        self.symbol_id
    }
}

impl Command for ConvertToSymbolCommand {
    fn execute(&mut self, doc: &mut Document) -> bool {
        if let Some((index, symbol)) = self.symbol.take() {
            doc.insert_symbol_at(index, symbol);
            redo_edits(&self.edits, doc);
            return true;
        }

        let frame = doc.current_frame();
        let groups = group_by_keyframe(doc, frame, &self.shape_ids);
        let Some(&(target_layer, target_index, _)) = groups.first() else {
            return false;
        };

        // paint order inside the symbol follows the stage: bottom layers first
        let mut shapes = Vec::new();
        for (layer_id, key_index, ids) in groups.iter().rev() {
            if let Some(frame) = doc.frame_snapshot(*layer_id, *key_index) {
                shapes.extend(
                    frame
                        .shapes()
                        .iter()
                        .filter(|s| ids.contains(&s.id))
                        .cloned(),
                );
            }
        }

        let name = doc.library().unique_name(&self.name);
        let symbol = Symbol::from_shapes(name, self.kind, shapes);
        let symbol_id = symbol.id;

        let mut edits: Vec<FrameEdit> = groups
            .iter()
            .map(|(layer_id, key_index, _)| FrameEdit::begin(doc, *layer_id, *key_index))
            .collect();
        if !doc.add_symbol(symbol) {
            return false;
        }
        for (layer_id, key_index, ids) in &groups {
            for id in ids {
                doc.remove_shape(*layer_id, *key_index, *id);
            }
        }
        let instance = SymbolInstance::new(symbol_id, Transform::identity());
        doc.place_instance(target_layer, target_index, instance);
        for edit in &mut edits {
            edit.finish(doc);
        }

        self.symbol_id = Some(symbol_id);
        self.edits = edits;
        log::debug!("converted {} shape(s) into symbol {symbol_id}", self.shape_ids.len());
        true
    }

    fn undo(&mut self, doc: &mut Document) {
        undo_edits(&self.edits, doc);
        if let Some(id) = self.symbol_id {
            self.symbol = doc.remove_symbol(id);
        }
    }

    fn description(&self) -> String {
        "Convert to Symbol".to_string()
    }
}
