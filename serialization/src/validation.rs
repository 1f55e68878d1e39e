//! Validation trees.
//!
//! Validating a document never touches a live object: the node is walked
//! against a type's description and every problem becomes an [`ErrorNode`]
//! at the matching position of a [`ValidationNode`] tree. Validation does not
//! stop at the first error.

use std::fmt;

use crate::error::SerializationError;
use crate::node::DataNode;

/// Category of a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A mapping key that is not a field of the target type.
    FieldNotFound,
    /// Text that cannot be interpreted as the expected type.
    Malformed,
    /// A required field is absent.
    MissingRequired,
    /// Null given for a type that cannot hold it.
    NullNotAllowed,
    /// A reference to a document id that does not exist.
    UnknownReference,
    /// A node of the wrong shape, e.g. a mapping where a value was expected.
    InvalidNodeType,
    /// A polymorphic value whose `!type:` tag is missing or names no
    /// registered type.
    UnknownType,
}

/// A validation error anchored to the node it was found at.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorNode {
    pub node: DataNode,
    pub message: String,
    pub kind: ErrorKind,
    /// Irrelevant errors are reported but may be ignored by tooling.
    /// Unknown keys are the only errors that are irrelevant by default.
    pub always_relevant: bool,
}

impl ErrorNode {
    pub fn new(kind: ErrorKind, node: DataNode, message: impl Into<String>) -> Self {
        Self {
            node,
            message: message.into(),
            kind,
            always_relevant: true,
        }
    }

    /// Unknown mapping key. Only relevant in strict mode.
    pub fn field_not_found(key: DataNode, type_name: &str, strict: bool) -> Self {
        let message = format!("field `{key}` not found on {type_name}");
        Self {
            node: key,
            message,
            kind: ErrorKind::FieldNotFound,
            always_relevant: strict,
        }
    }

    /// Classify a read error into a validation error at `node`.
    pub fn from_error(node: DataNode, error: &SerializationError) -> Self {
        let kind = match error.root_cause() {
            SerializationError::InvalidNodeType { .. } => ErrorKind::InvalidNodeType,
            SerializationError::NullNotAllowed { .. } => ErrorKind::NullNotAllowed,
            SerializationError::MissingRequiredField { .. } => ErrorKind::MissingRequired,
            SerializationError::UnknownField { .. } => ErrorKind::FieldNotFound,
            SerializationError::UnknownReference { .. } => ErrorKind::UnknownReference,
            SerializationError::MissingTypeTag { .. } | SerializationError::UnknownTypeTag { .. } => {
                ErrorKind::UnknownType
            }
            _ => ErrorKind::Malformed,
        };
        Self::new(kind, node, error.to_string())
    }
}

impl fmt::Display for ErrorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.node.start(), self.message)
    }
}

/// Result of validating one node.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationNode {
    /// A scalar that checked out, paired with the node it came from.
    Value(DataNode),
    Sequence(Vec<ValidationNode>),
    Mapping(Vec<(ValidationNode, ValidationNode)>),
    Error(ErrorNode),
    /// Could not be judged either way, e.g. a reference into documents that
    /// have not been loaded yet, or the value under an unknown key.
    Inconclusive(DataNode),
}

impl ValidationNode {
    pub fn valid(node: DataNode) -> Self {
        ValidationNode::Value(node)
    }

    pub fn error(kind: ErrorKind, node: DataNode, message: impl Into<String>) -> Self {
        ValidationNode::Error(ErrorNode::new(kind, node, message))
    }

    pub fn inconclusive(node: DataNode) -> Self {
        ValidationNode::Inconclusive(node)
    }

    /// Validate by attempting `read`; a failure becomes a single error node.
    pub fn from_result<T>(node: &DataNode, result: Result<T, SerializationError>) -> Self {
        match result {
            Ok(_) => ValidationNode::valid(node.clone()),
            Err(e) => ValidationNode::Error(ErrorNode::from_error(node.clone(), &e)),
        }
    }

    /// No error node anywhere in the tree.
    pub fn is_valid(&self) -> bool {
        match self {
            ValidationNode::Value(_) | ValidationNode::Inconclusive(_) => true,
            ValidationNode::Error(_) => false,
            ValidationNode::Sequence(items) => items.iter().all(ValidationNode::is_valid),
            ValidationNode::Mapping(entries) => entries
                .iter()
                .all(|(k, v)| k.is_valid() && v.is_valid()),
        }
    }

    /// Every error node, in pre-order (for mappings: key before value).
    pub fn errors(&self) -> Vec<&ErrorNode> {
        let mut out = Vec::new();
        self.collect_errors(&mut out);
        out
    }

    /// Errors that should not be ignored.
    pub fn relevant_errors(&self) -> Vec<&ErrorNode> {
        self.errors()
            .into_iter()
            .filter(|e| e.always_relevant)
            .collect()
    }

    fn collect_errors<'a>(&'a self, out: &mut Vec<&'a ErrorNode>) {
        match self {
            ValidationNode::Error(e) => out.push(e),
            ValidationNode::Sequence(items) => {
                for item in items {
                    item.collect_errors(out);
                }
            }
            ValidationNode::Mapping(entries) => {
                for (key, value) in entries {
                    key.collect_errors(out);
                    value.collect_errors(out);
                }
            }
            ValidationNode::Value(_) | ValidationNode::Inconclusive(_) => {}
        }
    }
}
