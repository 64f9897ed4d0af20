//! Core configuration for keyline-core.

use serde::{Deserialize, Serialize};

/// Editor-session configuration. Not persisted with projects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Maximum number of undo steps retained; oldest entries are dropped first.
    pub max_history: usize,
    /// Floor for `Document::total_frames` so an empty timeline still has a usable span.
    pub min_timeline_frames: u32,
    /// UI color tags handed out to new layers in rotation.
    pub layer_colors: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_history: 100,
            min_timeline_frames: 60,
            layer_colors: vec![
                "#4f81bd".to_string(),
                "#c0504d".to_string(),
                "#9bbb59".to_string(),
                "#8064a2".to_string(),
                "#4bacc6".to_string(),
                "#f79646".to_string(),
            ],
        }
    }
}

impl Config {
    /// Color tag for the `n`th layer created in a session.
    pub fn layer_color(&self, n: usize) -> String {
        if self.layer_colors.is_empty() {
            return "#4f81bd".to_string();
        }
        self.layer_colors[n % self.layer_colors.len()].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_colors_cycle() {
        let config = Config::default();
        let n = config.layer_colors.len();
        assert_eq!(config.layer_color(0), config.layer_color(n));
        assert_ne!(config.layer_color(0), config.layer_color(1));
    }

    #[test]
    fn empty_palette_falls_back() {
        let config = Config {
            layer_colors: Vec::new(),
            ..Config::default()
        };
        assert_eq!(config.layer_color(3), "#4f81bd");
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{ "maxHistory": 5 }"#).unwrap();
        assert_eq!(config.max_history, 5);
        assert_eq!(config.min_timeline_frames, 60);
    }
}
