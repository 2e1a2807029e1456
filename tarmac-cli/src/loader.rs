//! Document loading
//!
//! Templates, launch requests and launch configs are read from JSON or YAML
//! files. The format follows the file extension; anything that is not `.yaml`
//! or `.yml` is parsed as JSON.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Load and deserialize a JSON or YAML document
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    tracing::debug!("Loading {}", path.display());
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if is_yaml(path) {
        serde_yaml::from_str(&text).with_context(|| format!("Invalid YAML in {}", path.display()))
    } else {
        serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
    }
}

/// Load a document, or its default when no path is given
pub fn load_optional<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    match path {
        Some(path) => load_document(path),
        None => Ok(T::default()),
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}
