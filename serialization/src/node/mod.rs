//! Format-agnostic document tree.
//!
//! Every document handled by the serialization layer is first parsed into a
//! [`DataNode`]: a leaf [`ValueDataNode`] holding raw text, an ordered
//! [`SequenceDataNode`], or a keyed [`MappingDataNode`]. Nodes carry an
//! optional tag and the source positions they were parsed from, neither of
//! which has any bearing on typed reading. Positions never take part in
//! equality or hashing.

mod mapping;
mod sequence;
mod serde_impl;
mod value;

use std::fmt;

pub use mapping::MappingDataNode;
pub use sequence::SequenceDataNode;
pub use value::ValueDataNode;

/// Line/column position inside a source document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeMark {
    pub line: usize,
    pub column: usize,
}

impl NodeMark {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for NodeMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Shape of a node, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Value,
    Sequence,
    Mapping,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Value => write!(f, "value"),
            NodeKind::Sequence => write!(f, "sequence"),
            NodeKind::Mapping => write!(f, "mapping"),
        }
    }
}

/// A node in a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataNode {
    Value(ValueDataNode),
    Sequence(SequenceDataNode),
    Mapping(MappingDataNode),
}

impl DataNode {
    /// Shorthand for a value node.
    pub fn value(text: impl Into<String>) -> Self {
        DataNode::Value(ValueDataNode::new(text))
    }

    /// Shorthand for a null value node.
    pub fn null() -> Self {
        DataNode::Value(ValueDataNode::null())
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            DataNode::Value(_) => NodeKind::Value,
            DataNode::Sequence(_) => NodeKind::Sequence,
            DataNode::Mapping(_) => NodeKind::Mapping,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            DataNode::Value(n) => n.tag(),
            DataNode::Sequence(n) => n.tag(),
            DataNode::Mapping(n) => n.tag(),
        }
    }

    pub fn set_tag(&mut self, tag: Option<String>) {
        match self {
            DataNode::Value(n) => n.set_tag(tag),
            DataNode::Sequence(n) => n.set_tag(tag),
            DataNode::Mapping(n) => n.set_tag(tag),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.set_tag(Some(tag.into()));
        self
    }

    pub fn start(&self) -> NodeMark {
        match self {
            DataNode::Value(n) => n.start(),
            DataNode::Sequence(n) => n.start(),
            DataNode::Mapping(n) => n.start(),
        }
    }

    pub fn end(&self) -> NodeMark {
        match self {
            DataNode::Value(n) => n.end(),
            DataNode::Sequence(n) => n.end(),
            DataNode::Mapping(n) => n.end(),
        }
    }

    pub fn with_marks(self, start: NodeMark, end: NodeMark) -> Self {
        match self {
            DataNode::Value(n) => DataNode::Value(n.with_marks(start, end)),
            DataNode::Sequence(n) => DataNode::Sequence(n.with_marks(start, end)),
            DataNode::Mapping(n) => DataNode::Mapping(n.with_marks(start, end)),
        }
    }

    /// Empty text, empty sequence or empty mapping.
    pub fn is_empty(&self) -> bool {
        match self {
            DataNode::Value(n) => n.is_empty(),
            DataNode::Sequence(n) => n.is_empty(),
            DataNode::Mapping(n) => n.is_empty(),
        }
    }

    /// Only value nodes can be null.
    pub fn is_null(&self) -> bool {
        matches!(self, DataNode::Value(n) if n.is_null())
    }

    pub fn as_value(&self) -> Option<&ValueDataNode> {
        match self {
            DataNode::Value(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&SequenceDataNode> {
        match self {
            DataNode::Sequence(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&MappingDataNode> {
        match self {
            DataNode::Mapping(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut MappingDataNode> {
        match self {
            DataNode::Mapping(n) => Some(n),
            _ => None,
        }
    }

    pub fn into_mapping(self) -> Option<MappingDataNode> {
        match self {
            DataNode::Mapping(n) => Some(n),
            _ => None,
        }
    }

    /// Structural difference; nodes of different kinds never cancel out.
    pub fn except(&self, other: &DataNode) -> Option<DataNode> {
        match (self, other) {
            (DataNode::Value(a), DataNode::Value(b)) => a.except(b).map(DataNode::Value),
            (DataNode::Sequence(a), DataNode::Sequence(b)) => a.except(b).map(DataNode::Sequence),
            (DataNode::Mapping(a), DataNode::Mapping(b)) => a.except(b).map(DataNode::Mapping),
            _ => Some(self.clone()),
        }
    }

    /// Overlay `self` on `parent`. Only mappings merge; anything else is
    /// returned as-is because the child's value wins.
    pub fn push_inheritance(&self, parent: &DataNode) -> DataNode {
        match (self, parent) {
            (DataNode::Mapping(child), DataNode::Mapping(parent)) => {
                DataNode::Mapping(child.push_inheritance(parent))
            }
            _ => self.clone(),
        }
    }
}

impl From<ValueDataNode> for DataNode {
    fn from(node: ValueDataNode) -> Self {
        DataNode::Value(node)
    }
}

impl From<SequenceDataNode> for DataNode {
    fn from(node: SequenceDataNode) -> Self {
        DataNode::Sequence(node)
    }
}

impl From<MappingDataNode> for DataNode {
    fn from(node: MappingDataNode) -> Self {
        DataNode::Mapping(node)
    }
}

impl From<&str> for DataNode {
    fn from(text: &str) -> Self {
        DataNode::value(text)
    }
}

impl From<String> for DataNode {
    fn from(text: String) -> Self {
        DataNode::value(text)
    }
}

impl fmt::Display for DataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = self.tag() {
            write!(f, "{tag} ")?;
        }
        match self {
            DataNode::Value(n) => write!(f, "{}", n.value()),
            DataNode::Sequence(n) => {
                write!(f, "[")?;
                for (i, item) in n.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            DataNode::Mapping(n) => {
                write!(f, "{{")?;
                for (i, (key, value)) in n.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
