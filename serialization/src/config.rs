use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SerializationError};

/// Manager settings, usually loaded from a `serialization.toml`.
///
/// ```toml
/// strict_unknown_fields = true
/// parent_key = "parent"
/// non_inherited_keys = ["id", "parent", "abstract"]
/// max_depth = 128
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SerializationConfig {
    /// Unknown mapping keys fail reads and are always-relevant validation
    /// errors. When off, they are ignored on read and reported as
    /// irrelevant errors.
    pub strict_unknown_fields: bool,
    /// Key naming a document's parent(s) during inheritance resolution.
    pub parent_key: String,
    /// Keys never copied from a parent document.
    pub non_inherited_keys: Vec<String>,
    /// Deepest node nesting accepted when reading or validating.
    pub max_depth: usize,
}

impl Default for SerializationConfig {
    fn default() -> Self {
        Self {
            strict_unknown_fields: false,
            parent_key: "parent".to_owned(),
            non_inherited_keys: vec!["id".to_owned(), "parent".to_owned(), "abstract".to_owned()],
            max_depth: 256,
        }
    }
}

impl SerializationConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| SerializationError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SerializationError::Config(format!("failed to read {}: {e}", path.display())))?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded serialization config from {}", path.display());
        Ok(config)
    }

    /// Like [`load`](Self::load), falling back to defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("No serialization config ({e}), using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = SerializationConfig::from_toml_str("strict_unknown_fields = true\nmax_depth = 8\n").unwrap();
        assert!(config.strict_unknown_fields);
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.parent_key, "parent");
        assert_eq!(config.non_inherited_keys, vec!["id", "parent", "abstract"]);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = SerializationConfig::from_toml_str("max_depth = \"deep\"").unwrap_err();
        assert!(matches!(err, SerializationError::Config(_)));
    }

    #[test]
    fn missing_file_falls_back() {
        let config = SerializationConfig::load_or_default(Path::new("/nonexistent/serialization.toml"));
        assert_eq!(config, SerializationConfig::default());
    }
}
