//! The document: layer stack, library, playhead and selection, plus the mutation API that
//! tools and history commands drive.
//!
//! Mutators never fail loudly. When a precondition does not hold (missing or locked layer,
//! last remaining layer, unknown shape) they change nothing and report it through their
//! `Option`/`bool` return value.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::events::{DocumentEvent, EventBus, EventType, ListenerResult};
use crate::frame::{Frame, TweenType};
use crate::geometry::{Color, Point, Transform};
use crate::ids::{FrameId, InstanceId, LayerId, ListenerId, ShapeId, SymbolId};
use crate::layer::{Layer, MAX_FRAME_INDEX};
use crate::shape::{Shape, SymbolInstance};
use crate::symbol::{Library, Symbol};
use crate::tween::{sample_span, Easing};

/// Stage settings persisted with the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSettings {
    pub width: f64,
    pub height: f64,
    pub frame_rate: f64,
    pub background_color: Color,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            width: 550.0,
            height: 400.0,
            frame_rate: 24.0,
            background_color: Color::WHITE,
        }
    }
}

/// Where a shape lives: layer plus the keyframe index that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeLocation {
    pub layer_id: LayerId,
    pub frame: u32,
}

/// A shape taken out of the document, with enough context to put it back.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedShape {
    pub location: ShapeLocation,
    pub shape: Shape,
}

/// One drawable in an evaluated frame, in paint order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem<'a> {
    pub layer_id: LayerId,
    pub shape: &'a Shape,
    /// Shape transform after tweening.
    pub transform: Transform,
    /// Transform of the symbol instance the shape is drawn through, if any.
    pub parent: Option<Transform>,
}

#[derive(Debug)]
pub struct Document {
    pub(crate) name: String,
    pub(crate) settings: DocumentSettings,
    /// Index 0 is the topmost layer.
    pub(crate) layers: Vec<Layer>,
    pub(crate) library: Library,
    pub(crate) current_frame: u32,
    pub(crate) selected_layer_id: Option<LayerId>,
    pub(crate) selected_shapes: HashSet<ShapeId>,
    pub(crate) events: EventBus,
    pub(crate) config: Config,
    /// Layers created this session, drives default names and colors.
    pub(crate) layers_created: usize,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// An untitled document with one empty layer, selected.
    pub fn with_config(config: Config) -> Self {
        let mut doc = Self {
            name: "Untitled".to_string(),
            settings: DocumentSettings::default(),
            layers: Vec::new(),
            library: Library::new(),
            current_frame: 1,
            selected_layer_id: None,
            selected_shapes: HashSet::new(),
            events: EventBus::new(),
            config,
            layers_created: 0,
        };
        let first = doc.next_layer();
        doc.selected_layer_id = Some(first.id);
        doc.layers.push(first);
        doc
    }

    fn next_layer(&mut self) -> Layer {
        let n = self.layers_created;
        self.layers_created += 1;
        Layer::new(format!("Layer {}", n + 1), self.config.layer_color(n))
    }

    // ---- metadata -------------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn settings(&self) -> &DocumentSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: DocumentSettings) {
        if self.settings != settings {
            self.settings = settings;
            self.emit(&DocumentEvent::SettingsChanged);
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ---- events ---------------------------------------------------------------------------

    pub fn on<F>(&mut self, event: EventType, listener: F) -> ListenerId
    where
        F: FnMut(&DocumentEvent) -> ListenerResult + 'static,
    {
        self.events.on(event, listener)
    }

    pub fn off(&mut self, event: EventType, id: ListenerId) -> bool {
        self.events.off(event, id)
    }

    /// Deliver an event to subscribers; returns the number of failing listeners.
    pub fn emit(&mut self, event: &DocumentEvent) -> usize {
        self.events.emit(event)
    }

    // ---- playhead -------------------------------------------------------------------------

    #[inline]
    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    /// Move the playhead (clamped to `1..=MAX_FRAME_INDEX`). Notifies only on an actual change.
    pub fn set_current_frame(&mut self, frame: u32) {
        let frame = frame.clamp(1, MAX_FRAME_INDEX);
        if frame != self.current_frame {
            self.current_frame = frame;
            self.emit(&DocumentEvent::FrameChanged { frame });
        }
    }

    /// Timeline length: the longest layer, but never below the configured floor.
    pub fn total_frames(&self) -> u32 {
        self.layers
            .iter()
            .map(Layer::get_frame_count)
            .max()
            .unwrap_or(1)
            .max(self.config.min_timeline_frames)
    }

    // ---- layers ---------------------------------------------------------------------------

    /// Layer stack, index 0 topmost.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub(crate) fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    /// Layer that accepts edits: present and unlocked.
    fn editable_layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        match self.layers.iter_mut().find(|l| l.id == id) {
            Some(layer) if layer.locked => {
                log::debug!("ignoring edit on locked layer '{}'", layer.name);
                None
            }
            Some(layer) => Some(layer),
            None => {
                log::debug!("ignoring edit on missing layer {id}");
                None
            }
        }
    }

    pub fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn selected_layer_id(&self) -> Option<LayerId> {
        self.selected_layer_id
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selected_layer_id.and_then(|id| self.layer(id))
    }

    pub fn select_layer(&mut self, id: LayerId) -> bool {
        if self.layer(id).is_none() {
            return false;
        }
        if self.selected_layer_id != Some(id) {
            self.selected_layer_id = Some(id);
            self.emit(&DocumentEvent::LayerSelected { layer_id: Some(id) });
        }
        true
    }

    /// Add a new layer on top of the stack and select it.
    pub fn add_layer(&mut self, name: Option<&str>) -> LayerId {
        let mut layer = self.next_layer();
        if let Some(name) = name {
            layer.name = name.to_string();
        }
        let id = layer.id;
        self.layers.insert(0, layer);
        self.emit(&DocumentEvent::LayersChanged);
        self.select_layer(id);
        id
    }

    /// Put a layer back at `index` (clamped). Rejects an id already in the stack.
    pub fn insert_layer_at(&mut self, index: usize, layer: Layer) -> bool {
        if self.layer(layer.id).is_some() {
            return false;
        }
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
        self.emit(&DocumentEvent::LayersChanged);
        true
    }

    /// Remove a layer. The last remaining layer cannot be removed. If the selected layer goes,
    /// the layer that slides into its slot (or the new bottom layer) becomes selected.
    pub fn remove_layer(&mut self, id: LayerId) -> Option<(usize, Layer)> {
        if self.layers.len() <= 1 {
            log::debug!("refusing to remove the last layer");
            return None;
        }
        let pos = self.layer_index(id)?;
        let layer = self.layers.remove(pos);

        let before = self.selected_shapes.len();
        self.selected_shapes
            .retain(|sid| layer.find_shape(*sid).is_none());
        let selection_changed = before != self.selected_shapes.len();

        self.emit(&DocumentEvent::LayersChanged);
        if self.selected_layer_id == Some(id) {
            let next = self.layers[pos.min(self.layers.len() - 1)].id;
            self.selected_layer_id = Some(next);
            self.emit(&DocumentEvent::LayerSelected {
                layer_id: Some(next),
            });
        }
        if selection_changed {
            self.emit_selection();
        }
        Some((pos, layer))
    }

    /// Move a layer to `to` (clamped). Returns its previous index.
    pub fn move_layer(&mut self, id: LayerId, to: usize) -> Option<usize> {
        let from = self.layer_index(id)?;
        let to = to.min(self.layers.len() - 1);
        if from != to {
            let layer = self.layers.remove(from);
            self.layers.insert(to, layer);
            self.emit(&DocumentEvent::LayersChanged);
        }
        Some(from)
    }

    fn update_layer<T, F>(&mut self, id: LayerId, update: F) -> Option<T>
    where
        T: PartialEq,
        F: FnOnce(&mut Layer) -> (T, T),
    {
        let (previous, current) = update(self.layer_mut(id)?);
        if previous != current {
            self.emit(&DocumentEvent::LayersChanged);
        }
        Some(previous)
    }

    /// Returns the previous name.
    pub fn rename_layer(&mut self, id: LayerId, name: impl Into<String>) -> Option<String> {
        let name = name.into();
        self.update_layer(id, |layer| {
            let previous = std::mem::replace(&mut layer.name, name);
            (previous, layer.name.clone())
        })
    }

    /// Returns the previous visibility.
    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> Option<bool> {
        self.update_layer(id, |layer| {
            (std::mem::replace(&mut layer.visible, visible), visible)
        })
    }

    /// Returns the previous lock state.
    pub fn set_layer_locked(&mut self, id: LayerId, locked: bool) -> Option<bool> {
        self.update_layer(id, |layer| {
            (std::mem::replace(&mut layer.locked, locked), locked)
        })
    }

    /// Returns the previous color tag.
    pub fn set_layer_color(&mut self, id: LayerId, color: impl Into<String>) -> Option<String> {
        let color = color.into();
        self.update_layer(id, |layer| {
            let previous = std::mem::replace(&mut layer.color, color);
            (previous, layer.color.clone())
        })
    }

    // ---- keyframes ------------------------------------------------------------------------

    pub fn insert_keyframe(&mut self, layer_id: LayerId, index: u32) -> Option<FrameId> {
        let id = self.editable_layer_mut(layer_id)?.insert_keyframe(index)?;
        self.emit(&DocumentEvent::KeyframesChanged { layer_id });
        Some(id)
    }

    pub fn insert_blank_keyframe(&mut self, layer_id: LayerId, index: u32) -> Option<FrameId> {
        let id = self
            .editable_layer_mut(layer_id)?
            .insert_blank_keyframe(index)?;
        self.emit(&DocumentEvent::KeyframesChanged { layer_id });
        Some(id)
    }

    /// Returns the frame as it was before clearing.
    pub fn clear_keyframe(&mut self, layer_id: LayerId, index: u32) -> Option<Frame> {
        let before = self.editable_layer_mut(layer_id)?.clear_keyframe(index)?;
        self.prune_selection();
        self.emit(&DocumentEvent::KeyframesChanged { layer_id });
        Some(before)
    }

    pub fn insert_frame(&mut self, layer_id: LayerId, index: u32) -> bool {
        let inserted = self
            .editable_layer_mut(layer_id)
            .is_some_and(|layer| layer.insert_frame(index));
        if inserted {
            self.emit(&DocumentEvent::KeyframesChanged { layer_id });
        }
        inserted
    }

    /// Set the tween of the keyframe governing `index`. Returns that keyframe's index.
    pub fn set_tween(
        &mut self,
        layer_id: LayerId,
        index: u32,
        tween_type: TweenType,
        easing: Option<Easing>,
    ) -> Option<u32> {
        let keyframe = self
            .editable_layer_mut(layer_id)?
            .set_tween(index, tween_type, easing)?;
        self.emit(&DocumentEvent::KeyframesChanged { layer_id });
        Some(keyframe)
    }

    /// Copy of the frame materialized at exactly `index`.
    pub fn frame_snapshot(&self, layer_id: LayerId, index: u32) -> Option<Frame> {
        self.layer(layer_id)?.get_frame(index).cloned()
    }

    /// Overwrite (or with `None`, remove) one frame slot, bypassing locks. Used to restore
    /// history snapshots. Returns `false` if the layer does not exist.
    pub fn replace_frame(&mut self, layer_id: LayerId, index: u32, frame: Option<Frame>) -> bool {
        let Some(layer) = self.layer_mut(layer_id) else {
            return false;
        };
        layer.replace_frame(index, frame);
        self.prune_selection();
        self.emit(&DocumentEvent::KeyframesChanged { layer_id });
        self.emit(&DocumentEvent::ShapesChanged {
            layer_id,
            frame: index,
        });
        true
    }

    // ---- shapes ---------------------------------------------------------------------------

    /// Add a shape to the selected layer at the playhead.
    pub fn add_shape(&mut self, shape: Shape) -> Option<ShapeId> {
        let layer_id = self.selected_layer_id?;
        self.add_shape_to(layer_id, self.current_frame, shape)
    }

    /// Add a shape at `index`, creating a keyframe there if needed.
    pub fn add_shape_to(&mut self, layer_id: LayerId, index: u32, shape: Shape) -> Option<ShapeId> {
        let id = shape.id;
        let layer = self.editable_layer_mut(layer_id)?;
        let had_keyframe = layer.get_frame(index).is_some_and(|f| f.is_keyframe);
        if !layer.add_shape_at_frame(index, shape) {
            return None;
        }
        if !had_keyframe {
            self.emit(&DocumentEvent::KeyframesChanged { layer_id });
        }
        self.emit(&DocumentEvent::ShapesChanged {
            layer_id,
            frame: index,
        });
        Some(id)
    }

    /// Remove a shape from the keyframe governing `index`.
    pub fn remove_shape(
        &mut self,
        layer_id: LayerId,
        index: u32,
        shape_id: ShapeId,
    ) -> Option<Shape> {
        let layer = self.editable_layer_mut(layer_id)?;
        let key_index = layer.get_keyframe_at(index)?.index;
        let removed = layer.frame_mut(key_index)?.remove_shape(shape_id)?;
        self.emit(&DocumentEvent::ShapesChanged {
            layer_id,
            frame: key_index,
        });
        if self.selected_shapes.remove(&shape_id) {
            self.emit_selection();
        }
        Some(removed)
    }

    /// Remove every selected shape shown at the playhead on unlocked layers.
    pub fn remove_selected_shapes(&mut self) -> Vec<RemovedShape> {
        if self.selected_shapes.is_empty() {
            return Vec::new();
        }
        let frame = self.current_frame;
        let mut removed = Vec::new();
        let mut touched = Vec::new();
        for layer in self.layers.iter_mut().filter(|l| !l.locked) {
            let Some(key_index) = layer.get_keyframe_at(frame).map(|f| f.index) else {
                continue;
            };
            let selected = &self.selected_shapes;
            let Some(keyframe) = layer.frame_mut(key_index) else {
                continue;
            };
            let taken = keyframe.remove_shapes_where(|s| selected.contains(&s.id));
            if taken.is_empty() {
                continue;
            }
            let location = ShapeLocation {
                layer_id: layer.id,
                frame: key_index,
            };
            touched.push(location);
            removed.extend(taken.into_iter().map(|shape| RemovedShape { location, shape }));
        }

        for r in &removed {
            self.selected_shapes.remove(&r.shape.id);
        }
        for location in touched {
            self.emit(&DocumentEvent::ShapesChanged {
                layer_id: location.layer_id,
                frame: location.frame,
            });
        }
        if !removed.is_empty() {
            self.emit_selection();
        }
        removed
    }

    /// Find a shape among the keyframes in effect at `frame`, searching layers top-down.
    pub fn find_shape_at(&self, id: ShapeId, frame: u32) -> Option<ShapeLocation> {
        self.layers.iter().find_map(|layer| {
            let keyframe = layer.get_keyframe_at(frame)?;
            keyframe.shape(id).map(|_| ShapeLocation {
                layer_id: layer.id,
                frame: keyframe.index,
            })
        })
    }

    /// Find a shape shown at the playhead.
    pub fn find_shape(&self, id: ShapeId) -> Option<ShapeLocation> {
        self.find_shape_at(id, self.current_frame)
    }

    /// The shape shown at the playhead with this id.
    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        let location = self.find_shape(id)?;
        self.layer(location.layer_id)?
            .get_frame(location.frame)?
            .shape(id)
    }

    /// Replace a shape's transform on the keyframe governing `index`. Returns the old one.
    pub fn set_shape_transform(
        &mut self,
        layer_id: LayerId,
        index: u32,
        shape_id: ShapeId,
        transform: Transform,
    ) -> Option<Transform> {
        let layer = self.editable_layer_mut(layer_id)?;
        let key_index = layer.get_keyframe_at(index)?.index;
        let shape = layer.frame_mut(key_index)?.shape_mut(shape_id)?;
        let previous = std::mem::replace(&mut shape.transform, transform);
        self.emit(&DocumentEvent::ShapesChanged {
            layer_id,
            frame: key_index,
        });
        Some(previous)
    }

    // ---- selection ------------------------------------------------------------------------

    fn emit_selection(&mut self) {
        let shape_ids = self.selected_shape_ids();
        self.emit(&DocumentEvent::SelectionChanged { shape_ids });
    }

    /// Drop selected ids that no longer exist anywhere.
    fn prune_selection(&mut self) {
        let before = self.selected_shapes.len();
        let layers = &self.layers;
        self.selected_shapes
            .retain(|id| layers.iter().any(|l| l.find_shape(*id).is_some()));
        if before != self.selected_shapes.len() {
            self.emit_selection();
        }
    }

    /// Selected ids in a stable (sorted) order.
    pub fn selected_shape_ids(&self) -> Vec<ShapeId> {
        let mut ids: Vec<ShapeId> = self.selected_shapes.iter().copied().collect();
        ids.sort();
        ids
    }

    pub fn is_selected(&self, id: ShapeId) -> bool {
        self.selected_shapes.contains(&id)
    }

    pub fn select_shape(&mut self, id: ShapeId) {
        self.selected_shapes.insert(id);
        self.emit_selection();
    }

    pub fn deselect_shape(&mut self, id: ShapeId) {
        self.selected_shapes.remove(&id);
        self.emit_selection();
    }

    pub fn clear_selection(&mut self) {
        self.selected_shapes.clear();
        self.emit_selection();
    }

    /// Replace the whole selection set at once.
    pub fn set_selection<I: IntoIterator<Item = ShapeId>>(&mut self, ids: I) {
        self.selected_shapes = ids.into_iter().collect();
        self.emit_selection();
    }

    // ---- rendering queries ----------------------------------------------------------------

    /// Shapes of visible layers at the playhead, back to front. Hit-testing walks it reversed.
    pub fn get_visible_shapes(&self) -> Vec<&Shape> {
        self.visible_shapes_at(self.current_frame)
    }

    pub fn visible_shapes_at(&self, frame: u32) -> Vec<&Shape> {
        self.layers
            .iter()
            .rev()
            .filter(|l| l.visible)
            .flat_map(|l| l.get_shapes_at_frame(frame))
            .collect()
    }

    /// Topmost visible shape under `point` at the playhead.
    pub fn shape_at_point(&self, point: Point) -> Option<ShapeId> {
        self.get_visible_shapes()
            .into_iter()
            .rev()
            .find(|s| s.hit_test(point))
            .map(|s| s.id)
    }

    /// Full draw list for `frame`, back to front, with motion tweens resolved and symbol
    /// instances expanded one level. Instances whose symbol is gone are skipped.
    pub fn evaluate_frame(&self, frame: u32) -> Vec<RenderItem<'_>> {
        let mut items = Vec::new();
        for layer in self.layers.iter().rev().filter(|l| l.visible) {
            let Some(keyframe) = layer.get_keyframe_at(frame) else {
                continue;
            };

            match layer.tween_span(frame) {
                Some(span) => {
                    let samples = sample_span(
                        span.start.shapes(),
                        span.end.shapes(),
                        span.progress,
                        span.start.easing,
                    );
                    items.extend(samples.into_iter().map(|s| RenderItem {
                        layer_id: layer.id,
                        shape: s.shape,
                        transform: s.transform,
                        parent: None,
                    }));
                }
                None => items.extend(keyframe.shapes().iter().map(|shape| RenderItem {
                    layer_id: layer.id,
                    shape,
                    transform: shape.transform,
                    parent: None,
                })),
            }

            let elapsed = frame - keyframe.index;
            for instance in keyframe.instances() {
                let Some(symbol) = instance.resolve(&self.library) else {
                    continue;
                };
                items.extend(
                    symbol
                        .shapes_for_instance(instance, elapsed)
                        .into_iter()
                        .map(|shape| RenderItem {
                            layer_id: layer.id,
                            shape,
                            transform: shape.transform,
                            parent: Some(instance.transform),
                        }),
                );
            }
        }
        items
    }

    // ---- library --------------------------------------------------------------------------

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.library.get(id)
    }

    /// Add a symbol to the library. Rejects duplicate ids.
    pub fn add_symbol(&mut self, mut symbol: Symbol) -> bool {
        symbol.refresh_frame_count();
        let added = self.library.add(symbol);
        if added {
            self.emit(&DocumentEvent::LibraryChanged);
        }
        added
    }

    pub fn insert_symbol_at(&mut self, index: usize, symbol: Symbol) -> bool {
        let added = self.library.insert(index, symbol);
        if added {
            self.emit(&DocumentEvent::LibraryChanged);
        }
        added
    }

    /// Remove a symbol. Instances referring to it stay in place and resolve to nothing.
    pub fn remove_symbol(&mut self, id: SymbolId) -> Option<(usize, Symbol)> {
        let removed = self.library.remove(id)?;
        self.emit(&DocumentEvent::LibraryChanged);
        Some(removed)
    }

    /// Place an instance of a library symbol at `index`. The symbol must exist.
    pub fn place_instance(
        &mut self,
        layer_id: LayerId,
        index: u32,
        instance: SymbolInstance,
    ) -> Option<InstanceId> {
        if !self.library.contains(instance.symbol_id) {
            return None;
        }
        let id = instance.id;
        if !self
            .editable_layer_mut(layer_id)?
            .add_instance_at_frame(index, instance)
        {
            return None;
        }
        self.emit(&DocumentEvent::ShapesChanged {
            layer_id,
            frame: index,
        });
        Some(id)
    }
}
