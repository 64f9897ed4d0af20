use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    projects: HashMap<String, String>,
    #[serde(default)]
    malformed: HashMap<String, String>,
}

/// Read the fixture registered under `name` in one manifest section.
fn read_entry(section: &HashMap<String, String>, kind: &str, name: &str) -> Result<String> {
    let rel = section
        .get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))?;
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../../fixtures")
        .join(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read {kind} fixture at {}", path.display()))
}

/// Well-formed project files.
pub mod projects {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.projects.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        read_entry(&MANIFEST.projects, "project", name)
    }

    /// Parse a project fixture into any serde model, typically `keyline_core::ProjectFile`.
    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let text = json(name)?;
        serde_json::from_str(&text).with_context(|| format!("failed to parse project '{name}'"))
    }
}

/// Project files that a loader must reject.
pub mod malformed {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.malformed.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        read_entry(&MANIFEST.malformed, "malformed project", name)
    }
}
