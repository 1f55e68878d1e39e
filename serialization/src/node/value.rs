use std::hash::{Hash, Hasher};

use super::NodeMark;

/// Leaf scalar node.
///
/// The raw text is kept as written; typed interpretation (`"10"` as an
/// integer, `"1.5,1.5"` as a vector) happens lazily inside the type
/// serializers.
#[derive(Debug, Clone)]
pub struct ValueDataNode {
    value: String,
    tag: Option<String>,
    start: NodeMark,
    end: NodeMark,
}

impl ValueDataNode {
    /// Literal used for explicit null values.
    pub const NULL: &'static str = "null";

    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            tag: None,
            start: NodeMark::default(),
            end: NodeMark::default(),
        }
    }

    /// A node holding the null literal.
    pub fn null() -> Self {
        Self::new(Self::NULL)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn into_value(self) -> String {
        self.value
    }

    /// Whether the text is the null literal (trimmed, case-insensitive).
    pub fn is_null(&self) -> bool {
        self.value.trim().eq_ignore_ascii_case(Self::NULL)
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn set_tag(&mut self, tag: Option<String>) {
        self.tag = tag;
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn start(&self) -> NodeMark {
        self.start
    }

    pub fn end(&self) -> NodeMark {
        self.end
    }

    pub fn with_marks(mut self, start: NodeMark, end: NodeMark) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Returns `None` when `other` holds the same value, otherwise a copy of `self`.
    pub fn except(&self, other: &ValueDataNode) -> Option<ValueDataNode> {
        if self == other {
            None
        } else {
            Some(self.clone())
        }
    }
}

impl PartialEq for ValueDataNode {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.tag == other.tag
    }
}

impl Eq for ValueDataNode {}

impl Hash for ValueDataNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
        self.tag.hash(state);
    }
}

impl From<&str> for ValueDataNode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ValueDataNode {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_marks() {
        let a = ValueDataNode::new("10").with_marks(NodeMark::new(1, 1), NodeMark::new(1, 3));
        let b = ValueDataNode::new("10").with_marks(NodeMark::new(7, 4), NodeMark::new(7, 6));
        assert_eq!(a, b);
    }

    #[test]
    fn tag_participates_in_equality() {
        let a = ValueDataNode::new("Foo");
        let b = ValueDataNode::new("Foo").with_tag("!type:Foo");
        assert_ne!(a, b);
    }

    #[test]
    fn null_literal() {
        assert!(ValueDataNode::null().is_null());
        assert!(ValueDataNode::new("  NULL ").is_null());
        assert!(!ValueDataNode::new("").is_null());
        assert!(!ValueDataNode::new("nullable").is_null());
    }

    #[test]
    fn except_drops_equal_value() {
        let a = ValueDataNode::new("1");
        assert!(a.except(&ValueDataNode::new("1")).is_none());
        assert_eq!(a.except(&ValueDataNode::new("2")), Some(a.clone()));
    }
}
