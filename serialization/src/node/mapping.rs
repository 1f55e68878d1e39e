use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::{DataNode, NodeMark};

/// Keyed collection of nodes.
///
/// Keys are themselves nodes, although in practice almost every key is a
/// plain value node. Entries keep insertion order so that written documents
/// are stable, but equality and hashing ignore it. Lookups go through a
/// hashed index of entry positions.
#[derive(Clone, Default)]
pub struct MappingDataNode {
    entries: Vec<(DataNode, DataNode)>,
    index: HashMap<DataNode, usize>,
    tag: Option<String>,
    start: NodeMark,
    end: NodeMark,
}

impl MappingDataNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Builder-style insert, mostly useful for assembling documents in code.
    pub fn with(mut self, key: impl Into<DataNode>, value: impl Into<DataNode>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace the value stored under `key`.
    ///
    /// Returns the previous value when the key was already present.
    pub fn insert(
        &mut self,
        key: impl Into<DataNode>,
        value: impl Into<DataNode>,
    ) -> Option<DataNode> {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index].1, value)),
            None => {
                self.push_entry(key, value);
                None
            }
        }
    }

    /// Insert only if `key` is absent. Returns `false` if the key already exists.
    pub fn try_add(&mut self, key: impl Into<DataNode>, value: impl Into<DataNode>) -> bool {
        let key = key.into();
        if self.position(&key).is_some() {
            return false;
        }
        self.push_entry(key, value.into());
        true
    }

    /// Look up a value by plain (untagged) string key.
    pub fn get(&self, key: &str) -> Option<&DataNode> {
        self.get_node(&DataNode::value(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut DataNode> {
        let index = self.position(&DataNode::value(key))?;
        Some(&mut self.entries[index].1)
    }

    /// Look up a value by arbitrary key node.
    pub fn get_node(&self, key: &DataNode) -> Option<&DataNode> {
        self.position(key).map(|index| &self.entries[index].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn contains_node(&self, key: &DataNode) -> bool {
        self.position(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<DataNode> {
        self.remove_node(&DataNode::value(key))
    }

    /// Remove `key`, keeping the order of the remaining entries.
    pub fn remove_node(&mut self, key: &DataNode) -> Option<DataNode> {
        let index = self.index.remove(key)?;
        let (_, value) = self.entries.remove(index);
        for position in self.index.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        Some(value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &DataNode> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &DataNode> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DataNode, &DataNode)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
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

    /// Entries of `self` that differ from `other`.
    ///
    /// Keys absent from `other` are kept. Keys present in both are dropped
    /// when the values are equal; nested mappings are diffed recursively and
    /// any other differing value is kept whole. Returns `None` when nothing
    /// remains.
    pub fn except(&self, other: &MappingDataNode) -> Option<MappingDataNode> {
        let mut result = self.empty_like(0);
        for (key, value) in &self.entries {
            let Some(other_value) = other.get_node(key) else {
                result.push_entry(key.clone(), value.clone());
                continue;
            };
            match (value, other_value) {
                (DataNode::Mapping(mine), DataNode::Mapping(theirs)) => {
                    if let Some(diff) = mine.except(theirs) {
                        result.push_entry(key.clone(), DataNode::Mapping(diff));
                    }
                }
                _ if value == other_value => {}
                _ => result.push_entry(key.clone(), value.clone()),
            }
        }
        if result.is_empty() {
            None
        } else {
            Some(result)
        }
    }

    /// Overlay `self` (the child) on top of `parent`.
    ///
    /// Parent keys come first in parent order with the child's value winning
    /// on conflict; keys only the child has are appended. Nested mappings
    /// present on both sides are merged recursively.
    pub fn push_inheritance(&self, parent: &MappingDataNode) -> MappingDataNode {
        let mut merged = self.empty_like(parent.len().max(self.len()));
        merged.tag = self.tag.clone().or_else(|| parent.tag.clone());
        for (key, parent_value) in &parent.entries {
            let value = match self.get_node(key) {
                Some(child_value) => child_value.push_inheritance(parent_value),
                None => parent_value.clone(),
            };
            merged.push_entry(key.clone(), value);
        }
        for (key, child_value) in &self.entries {
            if !parent.contains_node(key) {
                merged.push_entry(key.clone(), child_value.clone());
            }
        }
        merged
    }

    fn empty_like(&self, capacity: usize) -> MappingDataNode {
        MappingDataNode {
            tag: self.tag.clone(),
            start: self.start,
            end: self.end,
            ..MappingDataNode::with_capacity(capacity)
        }
    }

    // Caller guarantees `key` is not present yet.
    fn push_entry(&mut self, key: DataNode, value: DataNode) {
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
    }

    fn position(&self, key: &DataNode) -> Option<usize> {
        self.index.get(key).copied()
    }
}

impl fmt::Debug for MappingDataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingDataNode")
            .field("entries", &self.entries)
            .field("tag", &self.tag)
            .field("start", &self.start)
            .field("end", &self.end)
            .finish()
    }
}

impl PartialEq for MappingDataNode {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get_node(k) == Some(v))
    }
}

impl Eq for MappingDataNode {}

impl Hash for MappingDataNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Entry hashes are combined commutatively so that order does not matter.
        let mut combined: u64 = 0;
        for entry in &self.entries {
            let mut hasher = DefaultHasher::new();
            entry.hash(&mut hasher);
            combined = combined.wrapping_add(hasher.finish());
        }
        self.tag.hash(state);
        state.write_usize(self.entries.len());
        state.write_u64(combined);
    }
}

impl<K: Into<DataNode>, V: Into<DataNode>> FromIterator<(K, V)> for MappingDataNode {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = MappingDataNode::new();
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}

impl IntoIterator for MappingDataNode {
    type Item = (DataNode, DataNode);
    type IntoIter = std::vec::IntoIter<(DataNode, DataNode)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
