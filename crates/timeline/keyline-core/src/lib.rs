//! Keyline core (renderer-agnostic)
//!
//! Timeline data model for frame/keyframe vector animation: shapes, frames, layers with
//! keyframe resolution, symbols and their library, the document mutation API with change
//! events, the motion tween engine, undo/redo history and the JSON project format.
//! Drawing, panels and input tools live outside this crate and drive it through
//! [`Document`] and [`History`].

pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod frame;
pub mod geometry;
pub mod history;
pub mod ids;
pub mod layer;
pub mod playback;
pub mod project;
pub mod shape;
pub mod symbol;
pub mod tween;

// Re-exports for consumers (tools, renderers, persistence)
pub use config::Config;
pub use document::{Document, DocumentSettings, RemovedShape, RenderItem, ShapeLocation};
pub use error::EditorError;
pub use events::{DocumentEvent, EventBus, EventType, ListenerResult};
pub use frame::{Frame, TweenType};
pub use geometry::{Color, Matrix, Point, Rect, Transform};
pub use history::{Command, CompositeCommand, History};
pub use ids::{FrameId, InstanceId, LayerId, ListenerId, ShapeId, SymbolId};
pub use layer::{Layer, TweenSpan, MAX_FRAME_INDEX};
pub use playback::{Playback, PlaybackState};
pub use project::{ProjectFile, FORMAT_VERSION};
pub use shape::{
    CommandKind, FillStyle, Gradient, GradientKind, GradientStop, LineCap, LineJoin, LoopMode,
    Path, PathCommand, Shape, StrokeStyle, SymbolInstance,
};
pub use symbol::{Library, Symbol, SymbolType};
pub use tween::{
    can_motion_tween, create_tween_pairs, interpolate, interpolate_pairs, lerp, lerp_angle,
    Easing, TweenPair, TweenSample,
};

/// Result alias for the fallible entry points (loading, id parsing).
pub type Result<T> = core::result::Result<T, EditorError>;
