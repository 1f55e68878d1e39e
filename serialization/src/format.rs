//! Text formats that documents are loaded from and written to.

use std::path::Path;

use crate::error::{Result, SerializationError};
use crate::node::DataNode;

/// A supported document syntax. Each variant is gated on its cargo feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    #[cfg(feature = "yaml")]
    Yaml,
    #[cfg(feature = "ron")]
    Ron,
}

impl Format {
    /// Format matching a file extension, if its feature is enabled.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Some(Self::Yaml),
            #[cfg(feature = "ron")]
            "ron" => Some(Self::Ron),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Parse `text` into a node tree.
pub fn parse_document(text: &str, format: Format) -> Result<DataNode> {
    match format {
        #[cfg(feature = "yaml")]
        Format::Yaml => serde_yaml::from_str(text).map_err(|e| SerializationError::Format(e.to_string())),
        #[cfg(feature = "ron")]
        Format::Ron => ron::from_str(text).map_err(|e| SerializationError::Format(e.to_string())),
    }
}

/// Render a node tree as text.
pub fn emit_document(node: &DataNode, format: Format) -> Result<String> {
    match format {
        #[cfg(feature = "yaml")]
        Format::Yaml => serde_yaml::to_string(node).map_err(|e| SerializationError::Format(e.to_string())),
        #[cfg(feature = "ron")]
        Format::Ron => ron::ser::to_string_pretty(node, ron::ser::PrettyConfig::default())
            .map_err(|e| SerializationError::Format(e.to_string())),
    }
}

/// Read and parse a document, picking the format from the file extension.
pub fn load_document(path: &Path) -> Result<DataNode> {
    let format = Format::from_path(path)
        .ok_or_else(|| SerializationError::Format(format!("unsupported document format: {}", path.display())))?;
    let text = std::fs::read_to_string(path)
        .map_err(|e| SerializationError::Format(format!("failed to read {}: {e}", path.display())))?;
    let node = parse_document(&text, format)?;
    log::debug!("Loaded document {}", path.display());
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extension() {
        assert_eq!(Format::from_extension("txt"), None);
        assert!(load_document(Path::new("notes.txt")).is_err());
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_parse_and_emit() {
        assert_eq!(Format::from_path(Path::new("mobs/goblin.YML")), Some(Format::Yaml));

        let node = parse_document("id: goblin\ntags: [small, green]\nloot: ~\n", Format::Yaml).unwrap();
        let map = node.as_mapping().unwrap();
        assert_eq!(map.get("id"), Some(&DataNode::value("goblin")));
        assert!(map.get("loot").unwrap().is_null());

        let text = emit_document(&node, Format::Yaml).unwrap();
        assert_eq!(parse_document(&text, Format::Yaml).unwrap(), node);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_syntax_error_is_format_error() {
        let err = parse_document("a: [1, 2", Format::Yaml).unwrap_err();
        assert!(matches!(err, SerializationError::Format(_)));
    }

    #[cfg(feature = "ron")]
    #[test]
    fn ron_parse_and_emit() {
        let node = parse_document(r#"{"id": "goblin", "hp": 10}"#, Format::Ron).unwrap();
        assert_eq!(node.as_mapping().unwrap().get("hp"), Some(&DataNode::value("10")));
        let text = emit_document(&node, Format::Ron).unwrap();
        assert_eq!(parse_document(&text, Format::Ron).unwrap(), node);
    }
}
