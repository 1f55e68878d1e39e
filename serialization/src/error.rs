use thiserror::Error;

use crate::node::{DataNode, NodeKind, NodeMark, ValueDataNode};

/// Errors produced while reading, writing, copying or composing data.
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("missing required field `{field}` on {type_name}")]
    MissingRequiredField {
        field: String,
        type_name: &'static str,
    },

    #[error("{type_name} expects a {expected} node, found {found} at {mark}")]
    InvalidNodeType {
        type_name: &'static str,
        expected: &'static str,
        found: NodeKind,
        mark: NodeMark,
    },

    #[error("cannot parse `{text}` as {type_name} at {mark}: {reason}")]
    Parse {
        type_name: &'static str,
        text: String,
        reason: String,
        mark: NodeMark,
    },

    #[error("null is not allowed for {type_name} at {mark}")]
    NullNotAllowed {
        type_name: &'static str,
        mark: NodeMark,
    },

    #[error("no serializer {serializer} registered for {type_name}")]
    UnknownSerializer {
        type_name: &'static str,
        serializer: &'static str,
    },

    #[error("`{name}` is not a constant of {set}")]
    UnknownConstant { set: &'static str, name: String },

    #[error("unknown field `{field}` on {type_name} at {mark}")]
    UnknownField {
        field: String,
        type_name: &'static str,
        mark: NodeMark,
    },

    #[error("unknown {kind} `{id}`")]
    UnknownReference { kind: &'static str, id: String },

    #[error("{base} needs a `!type:` tag naming its concrete type at {mark}")]
    MissingTypeTag { base: &'static str, mark: NodeMark },

    #[error("no type `{name}` registered for {base} at {mark}")]
    UnknownTypeTag {
        base: &'static str,
        name: String,
        mark: NodeMark,
    },

    #[error("concrete type of this {base} value is not registered")]
    UnregisteredConcreteType { base: &'static str },

    #[error("duplicate data field key `{key}` on {type_name}")]
    DuplicateFieldKey {
        key: String,
        type_name: &'static str,
    },

    #[error("inheritance cycle: {}", path.join(" -> "))]
    InheritanceCycle { path: Vec<String> },

    #[error("`{id}` inherits from unknown parent `{parent}`")]
    UnknownParent { id: String, parent: String },

    #[error("unknown document `{id}`")]
    UnknownDocument { id: String },

    #[error("nesting exceeds {limit} levels at {mark}")]
    DepthLimitExceeded { limit: usize, mark: NodeMark },

    #[error("serialization manager is already initialized")]
    AlreadyInitialized,

    #[error("format error: {0}")]
    Format(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Custom(String),

    #[error("in `{field}`: {source}")]
    InField {
        field: String,
        #[source]
        source: Box<SerializationError>,
    },
}

pub type Result<T, E = SerializationError> = std::result::Result<T, E>;

impl SerializationError {
    /// Wrap this error with the name of the field (or `[index]`) it occurred in.
    pub fn in_field(self, field: impl Into<String>) -> Self {
        SerializationError::InField {
            field: field.into(),
            source: Box::new(self),
        }
    }

    /// Dotted path to the failing value, e.g. `stats.resistances[2]`.
    pub fn path(&self) -> String {
        let mut path = String::new();
        let mut current = self;
        while let SerializationError::InField { field, source } = current {
            if !path.is_empty() && !field.starts_with('[') {
                path.push('.');
            }
            path.push_str(field);
            current = source.as_ref();
        }
        path
    }

    /// The innermost error, with all field context stripped.
    pub fn root_cause(&self) -> &SerializationError {
        let mut current = self;
        while let SerializationError::InField { source, .. } = current {
            current = source.as_ref();
        }
        current
    }

    pub(crate) fn parse(
        type_name: &'static str,
        node: &ValueDataNode,
        reason: impl ToString,
    ) -> Self {
        SerializationError::Parse {
            type_name,
            text: node.value().to_owned(),
            reason: reason.to_string(),
            mark: node.start(),
        }
    }

    pub(crate) fn invalid_node(type_name: &'static str, expected: &'static str, node: &DataNode) -> Self {
        SerializationError::InvalidNodeType {
            type_name,
            expected,
            found: node.kind(),
            mark: node.start(),
        }
    }
}
