use std::hash::{Hash, Hasher};

use super::{DataNode, NodeMark};

/// Ordered list of nodes. Order and multiplicity are both significant.
#[derive(Debug, Clone, Default)]
pub struct SequenceDataNode {
    items: Vec<DataNode>,
    tag: Option<String>,
    start: NodeMark,
    end: NodeMark,
}

impl SequenceDataNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Build a sequence of value nodes from plain strings.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        values
            .into_iter()
            .map(|v| DataNode::value(v.into()))
            .collect()
    }

    pub fn push(&mut self, node: impl Into<DataNode>) {
        self.items.push(node.into());
    }

    pub fn get(&self, index: usize) -> Option<&DataNode> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[DataNode] {
        &self.items
    }

    pub fn into_items(self) -> Vec<DataNode> {
        self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DataNode> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, node: &DataNode) -> bool {
        self.items.contains(node)
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

    /// Items of `self` that do not occur anywhere in `other`, in `self`'s order.
    ///
    /// Returns `None` when nothing remains.
    pub fn except(&self, other: &SequenceDataNode) -> Option<SequenceDataNode> {
        let items: Vec<DataNode> = self
            .items
            .iter()
            .filter(|item| !other.contains(item))
            .cloned()
            .collect();
        if items.is_empty() {
            return None;
        }
        Some(SequenceDataNode {
            items,
            tag: self.tag.clone(),
            start: self.start,
            end: self.end,
        })
    }

    /// Parent items followed by the child's items.
    pub(crate) fn concat(parent: &SequenceDataNode, child: &SequenceDataNode) -> SequenceDataNode {
        let mut items = Vec::with_capacity(parent.len() + child.len());
        items.extend(parent.items.iter().cloned());
        items.extend(child.items.iter().cloned());
        SequenceDataNode {
            items,
            tag: child.tag.clone(),
            start: child.start,
            end: child.end,
        }
    }
}

impl PartialEq for SequenceDataNode {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.items == other.items
    }
}

impl Eq for SequenceDataNode {}

impl Hash for SequenceDataNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag.hash(state);
        self.items.hash(state);
    }
}

impl From<Vec<DataNode>> for SequenceDataNode {
    fn from(items: Vec<DataNode>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }
}

impl FromIterator<DataNode> for SequenceDataNode {
    fn from_iter<I: IntoIterator<Item = DataNode>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<'a> IntoIterator for &'a SequenceDataNode {
    type Item = &'a DataNode;
    type IntoIter = std::slice::Iter<'a, DataNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for SequenceDataNode {
    type Item = DataNode;
    type IntoIter = std::vec::IntoIter<DataNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
