//! Persisted project format.
//!
//! ```json
//! { "version": "1.0", "name": "...", "settings": {...}, "layers": [...], "library": [...] }
//! ```
//!
//! Loading is the one place the core fails loudly: malformed JSON and structurally invalid
//! projects are rejected before any document state is built.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::document::{Document, DocumentSettings};
use crate::events::DocumentEvent;
use crate::layer::Layer;
use crate::symbol::Library;
use crate::{EditorError, Result};

/// Format version written by this crate. Files with the same major version load.
pub const FORMAT_VERSION: &str = "1.0";

/// Serialized form of a [`Document`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub settings: DocumentSettings,
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub library: Library,
}

impl ProjectFile {
    /// Reject files this crate cannot represent.
    pub fn validate(&self) -> Result<()> {
        let major = self.version.split('.').next().unwrap_or_default();
        if major != FORMAT_VERSION.split('.').next().unwrap_or_default() {
            return Err(EditorError::UnsupportedVersion {
                version: self.version.clone(),
            });
        }

        let settings = &self.settings;
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(settings.width) || !positive(settings.height) {
            return Err(EditorError::invalid_document(format!(
                "stage size {}x{} must be positive",
                settings.width, settings.height
            )));
        }
        if !positive(settings.frame_rate) {
            return Err(EditorError::invalid_document(format!(
                "frame rate {} must be positive",
                settings.frame_rate
            )));
        }

        if self.layers.is_empty() {
            return Err(EditorError::invalid_document("project has no layers"));
        }
        let mut seen = hashbrown::HashSet::with_capacity(self.layers.len());
        for layer in &self.layers {
            if !seen.insert(layer.id) {
                return Err(EditorError::invalid_document(format!(
                    "duplicate layer id {}",
                    layer.id
                )));
            }
            layer.validate()?;
        }
        self.library.validate()
    }

    /// Recompute derived fields (frame order, `isEmpty`, spans, symbol frame counts).
    pub fn normalize(&mut self) {
        for layer in &mut self.layers {
            layer.normalize();
        }
        self.library.normalize();
    }
}

impl Document {
    /// Snapshot of the persistent part of the document.
    pub fn to_project(&self) -> ProjectFile {
        ProjectFile {
            version: FORMAT_VERSION.to_string(),
            name: self.name.clone(),
            settings: self.settings.clone(),
            layers: self.layers.clone(),
            library: self.library.clone(),
        }
    }

    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.to_project())?)
    }

    /// Pretty-printed JSON text.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_project())?)
    }

    pub fn from_json(value: Value) -> Result<Self> {
        Self::from_project(serde_json::from_value(value)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_project(serde_json::from_str(text)?)
    }

    pub fn from_project(project: ProjectFile) -> Result<Self> {
        Self::from_project_with_config(project, Config::default())
    }

    pub fn from_project_with_config(project: ProjectFile, config: Config) -> Result<Self> {
        let mut doc = Self::with_config(config);
        doc.install(project)?;
        Ok(doc)
    }

    /// Replace this document's content in place, keeping its listeners and config.
    /// On error the document is left untouched.
    pub fn load_project(&mut self, project: ProjectFile) -> Result<()> {
        self.install(project)?;
        self.emit(&DocumentEvent::DocumentLoaded);
        Ok(())
    }

    fn install(&mut self, mut project: ProjectFile) -> Result<()> {
        project.validate()?;
        project.normalize();
        log::debug!(
            "loading project '{}' ({} layer(s), {} symbol(s))",
            project.name,
            project.layers.len(),
            project.library.len()
        );

        self.name = project.name;
        self.settings = project.settings;
        self.layers_created = project.layers.len();
        self.selected_layer_id = project.layers.first().map(|l| l.id);
        self.layers = project.layers;
        self.library = project.library;
        self.current_frame = 1;
        self.selected_shapes.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventType;
    use crate::frame::TweenType;
    use crate::shape::Shape;
    use crate::tween::Easing;
    use serde_json::json;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.set_name("Bounce");
        let layer = doc.layers()[0].id;
        doc.add_shape_to(layer, 1, Shape::ellipse(10.0, 10.0, 5.0, 5.0));
        doc.insert_keyframe(layer, 12);
        doc.set_tween(layer, 1, TweenType::Motion, Some(Easing::EaseOutBounce));
        doc
    }

    #[test]
    fn round_trip_is_lossless() {
        let doc = sample();
        let json = doc.to_json().unwrap();
        let loaded = Document::from_json(json.clone()).unwrap();
        assert_eq!(loaded.to_json().unwrap(), json);
        assert_eq!(loaded.name(), "Bounce");
        assert_eq!(loaded.selected_layer_id(), Some(loaded.layers()[0].id));
    }

    #[test]
    fn wire_names_are_camel_case() {
        let json = sample().to_json().unwrap();
        assert_eq!(json["version"], "1.0");
        assert_eq!(json["settings"]["frameRate"], 24.0);
        let frame = &json["layers"][0]["frames"][0];
        assert_eq!(frame["isKeyframe"], true);
        assert_eq!(frame["isEmpty"], false);
        assert_eq!(frame["tweenType"], "motion");
        assert_eq!(frame["easing"], "easeOutBounce");
        assert_eq!(frame["duration"], 11);
        assert!(frame.get("instances").is_none());
    }

    #[test]
    fn derived_fields_are_recomputed() {
        let mut json = sample().to_json().unwrap();
        let frames = json["layers"][0]["frames"].as_array_mut().unwrap();
        frames.reverse();
        frames[1]["isEmpty"] = json!(true);
        frames[1]["duration"] = json!(99);

        let doc = Document::from_json(json).unwrap();
        let layer = &doc.layers()[0];
        assert_eq!(layer.keyframe_indices(), vec![1, 12]);
        let first = layer.get_frame(1).unwrap();
        assert!(!first.is_empty());
        assert_eq!(first.duration, 11);
    }

    #[test]
    fn structural_errors_are_rejected() {
        let base = sample().to_json().unwrap();

        let mut no_layers = base.clone();
        no_layers["layers"] = json!([]);
        assert!(matches!(
            Document::from_json(no_layers),
            Err(EditorError::InvalidDocument { .. })
        ));

        let mut no_first = base.clone();
        no_first["layers"][0]["frames"][0]["index"] = json!(2);
        assert!(matches!(
            Document::from_json(no_first),
            Err(EditorError::InvalidDocument { .. })
        ));

        let mut future = base.clone();
        future["version"] = json!("2.0");
        assert_eq!(
            Document::from_json(future).unwrap_err(),
            EditorError::UnsupportedVersion {
                version: "2.0".to_string()
            }
        );

        let mut bad_rate = base;
        bad_rate["settings"]["frameRate"] = json!(0.0);
        assert!(Document::from_json(bad_rate).is_err());
    }

    #[test]
    fn out_of_range_frame_index_is_rejected() {
        let mut json = sample().to_json().unwrap();
        json["layers"][0]["frames"][1]["index"] = json!(u32::MAX);
        let err = Document::from_json(json).unwrap_err();
        assert_eq!(err.category(), "document");
        assert!(err.to_string().contains("outside 1..="));
    }

    #[test]
    fn malformed_text_is_a_serialization_error() {
        let err = Document::from_json_str("{ \"version\": \"1.0\", ").unwrap_err();
        assert_eq!(err.category(), "serialization");
        let err = Document::from_json(json!({ "version": "1.0", "name": 3 })).unwrap_err();
        assert_eq!(err.category(), "serialization");
    }

    #[test]
    fn load_in_place_notifies() {
        let source = sample().to_project();
        let mut doc = Document::new();
        let hits = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = std::rc::Rc::clone(&hits);
        doc.on(EventType::DocumentLoaded, move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });
        doc.load_project(source.clone()).unwrap();
        assert_eq!(hits.get(), 1);
        assert_eq!(doc.to_project(), source);

        let mut broken = source;
        broken.layers.clear();
        assert!(doc.load_project(broken).is_err());
        assert_eq!(doc.name(), "Bounce");
    }
}
