//! Change notifications emitted by a document.
//!
//! The bus is owned by its document and dropped with it. Listeners run synchronously in
//! subscription order. A listener that returns `Err` is logged and skipped; the remaining
//! listeners still run.

use hashbrown::HashMap;

use crate::ids::{LayerId, ListenerId, ShapeId};

/// Types of document events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Playhead moved
    FrameChanged,
    /// Layer added, removed, reordered or edited
    LayersChanged,
    /// Selected layer changed
    LayerSelected,
    /// Keyframe structure or tween settings changed on a layer
    KeyframesChanged,
    /// Shape content of a frame changed
    ShapesChanged,
    /// Shape selection changed
    SelectionChanged,
    /// Library symbol added or removed
    LibraryChanged,
    /// Stage settings changed
    SettingsChanged,
    /// Document replaced from persisted data
    DocumentLoaded,
}

impl EventType {
    /// Get the name of this event type
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FrameChanged => "frameChanged",
            Self::LayersChanged => "layersChanged",
            Self::LayerSelected => "layerSelected",
            Self::KeyframesChanged => "keyframesChanged",
            Self::ShapesChanged => "shapesChanged",
            Self::SelectionChanged => "selectionChanged",
            Self::LibraryChanged => "libraryChanged",
            Self::SettingsChanged => "settingsChanged",
            Self::DocumentLoaded => "documentLoaded",
        }
    }
}

/// Payload delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    FrameChanged { frame: u32 },
    LayersChanged,
    LayerSelected { layer_id: Option<LayerId> },
    KeyframesChanged { layer_id: LayerId },
    ShapesChanged { layer_id: LayerId, frame: u32 },
    SelectionChanged { shape_ids: Vec<ShapeId> },
    LibraryChanged,
    SettingsChanged,
    DocumentLoaded,
}

impl DocumentEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::FrameChanged { .. } => EventType::FrameChanged,
            Self::LayersChanged => EventType::LayersChanged,
            Self::LayerSelected { .. } => EventType::LayerSelected,
            Self::KeyframesChanged { .. } => EventType::KeyframesChanged,
            Self::ShapesChanged { .. } => EventType::ShapesChanged,
            Self::SelectionChanged { .. } => EventType::SelectionChanged,
            Self::LibraryChanged => EventType::LibraryChanged,
            Self::SettingsChanged => EventType::SettingsChanged,
            Self::DocumentLoaded => EventType::DocumentLoaded,
        }
    }
}

/// Result returned by a listener; the error text is only logged.
pub type ListenerResult = Result<(), String>;

pub type Listener = Box<dyn FnMut(&DocumentEvent) -> ListenerResult>;

/// Named-event subscription table.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<EventType, Vec<(ListenerId, Listener)>>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, event: EventType, listener: F) -> ListenerId
    where
        F: FnMut(&DocumentEvent) -> ListenerResult + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.listeners
            .entry(event)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Unsubscribe. Returns `false` if the listener was not registered for `event`.
    pub fn off(&mut self, event: EventType, id: ListenerId) -> bool {
        let Some(list) = self.listeners.get_mut(&event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(lid, _)| *lid != id);
        before != list.len()
    }

    /// Deliver an event to its listeners. Returns how many listeners failed.
    pub fn emit(&mut self, event: &DocumentEvent) -> usize {
        let kind = event.event_type();
        let Some(list) = self.listeners.get_mut(&kind) else {
            return 0;
        };
        let mut failures = 0;
        for (id, listener) in list.iter_mut() {
            if let Err(reason) = listener(event) {
                failures += 1;
                log::warn!(
                    "listener {} for '{}' failed: {}",
                    id.0,
                    kind.name(),
                    reason
                );
            }
        }
        failures
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}
