//! Reusable nested timelines and the document library that owns them.

use serde::{Deserialize, Serialize};

use crate::ids::SymbolId;
use crate::layer::Layer;
use crate::shape::{Shape, SymbolInstance};
use crate::EditorError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolType {
    #[default]
    Graphic,
    #[serde(rename = "movieclip")]
    MovieClip,
    Button,
}

/// A named, reusable stack of layers with its own timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SymbolType,
    /// Length of the symbol timeline; never less than its layers' frame counts.
    pub frame_count: u32,
    pub layers: Vec<Layer>,
}

impl Symbol {
    /// A symbol with a single empty layer.
    pub fn new(name: impl Into<String>, kind: SymbolType) -> Self {
        Self {
            id: SymbolId::new(),
            name: name.into(),
            kind,
            frame_count: 1,
            layers: vec![Layer::new("Layer 1", "#4f81bd")],
        }
    }

    /// A graphic symbol whose first frame holds `shapes`.
    pub fn from_shapes(name: impl Into<String>, kind: SymbolType, shapes: Vec<Shape>) -> Self {
        let mut symbol = Self::new(name, kind);
        for shape in shapes {
            symbol.layers[0].add_shape_at_frame(1, shape);
        }
        symbol
    }

    /// Grow `frame_count` to cover every layer.
    pub fn refresh_frame_count(&mut self) {
        let layers_max = self
            .layers
            .iter()
            .map(Layer::get_frame_count)
            .max()
            .unwrap_or(1);
        self.frame_count = self.frame_count.max(layers_max).max(1);
    }

    /// Shapes visible at a symbol-local frame, in paint order (bottom layer first).
    pub fn shapes_at(&self, frame: u32) -> Vec<&Shape> {
        self.layers
            .iter()
            .rev()
            .filter(|l| l.visible)
            .flat_map(|l| l.get_shapes_at_frame(frame))
            .collect()
    }

    /// Shapes an instance shows after `elapsed` parent frames.
    pub fn shapes_for_instance(&self, instance: &SymbolInstance, elapsed: u32) -> Vec<&Shape> {
        self.shapes_at(instance.frame_at(elapsed, self.frame_count))
    }

    pub(crate) fn validate(&self) -> Result<(), EditorError> {
        if self.layers.is_empty() {
            return Err(EditorError::invalid_document(format!(
                "symbol '{}' has no layers",
                self.name
            )));
        }
        self.layers.iter().try_for_each(Layer::validate)
    }

    pub(crate) fn normalize(&mut self) {
        for layer in &mut self.layers {
            layer.normalize();
        }
        self.refresh_frame_count();
    }
}

/// Document-scoped symbol storage keyed by id. Preserves insertion order for persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Library {
    symbols: Vec<Symbol>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol. Returns `false` and leaves the library unchanged on a duplicate id.
    pub fn add(&mut self, symbol: Symbol) -> bool {
        if self.contains(symbol.id) {
            return false;
        }
        self.symbols.push(symbol);
        true
    }

    /// Insert at a position (clamped), used when restoring a removed symbol.
    pub fn insert(&mut self, index: usize, symbol: Symbol) -> bool {
        if self.contains(symbol.id) {
            return false;
        }
        let index = index.min(self.symbols.len());
        self.symbols.insert(index, symbol);
        true
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.iter_mut().find(|s| s.id == id)
    }

    pub fn position(&self, id: SymbolId) -> Option<usize> {
        self.symbols.iter().position(|s| s.id == id)
    }

    /// Remove a symbol, returning it together with its former position.
    pub fn remove(&mut self, id: SymbolId) -> Option<(usize, Symbol)> {
        let pos = self.position(id)?;
        Some((pos, self.symbols.remove(pos)))
    }

    #[inline]
    pub fn contains(&self, id: SymbolId) -> bool {
        self.symbols.iter().any(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// `base`, or `base 2`, `base 3`, ... whichever is not yet taken.
    pub fn unique_name(&self, base: &str) -> String {
        if !self.symbols.iter().any(|s| s.name == base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base} {n}"))
            .find(|candidate| !self.symbols.iter().any(|s| &s.name == candidate))
            .unwrap_or_else(|| base.to_string())
    }

    pub(crate) fn validate(&self) -> Result<(), EditorError> {
        let mut seen = hashbrown::HashSet::with_capacity(self.symbols.len());
        for symbol in &self.symbols {
            if !seen.insert(symbol.id) {
                return Err(EditorError::invalid_document(format!(
                    "duplicate symbol id {}",
                    symbol.id
                )));
            }
            symbol.validate()?;
        }
        Ok(())
    }

    pub(crate) fn normalize(&mut self) {
        for symbol in &mut self.symbols {
            symbol.normalize();
        }
    }
}

impl SymbolInstance {
    /// Look the referenced symbol up. `None` if it has been removed from the library.
    pub fn resolve<'a>(&self, library: &'a Library) -> Option<&'a Symbol> {
        library.get(self.symbol_id)
    }
}
