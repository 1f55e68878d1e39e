//! Resolution of document inheritance chains.
//!
//! Documents are mappings registered by id. A document names its parents
//! under the configured parent key, either a single id or a sequence of ids;
//! the first parent listed takes precedence over later ones. Resolution
//! walks the chain depth-first, merges each parent (minus its non-inherited
//! keys such as `id`) under the child, and reports cycles with the full
//! path.

use std::collections::{BTreeMap, HashMap};

use crate::config::SerializationConfig;
use crate::error::{Result, SerializationError};
use crate::node::{DataNode, MappingDataNode};

/// Set of documents that can inherit from one another.
#[derive(Debug, Clone)]
pub struct InheritanceResolver {
    documents: HashMap<String, MappingDataNode>,
    parent_key: String,
    non_inherited_keys: Vec<String>,
}

impl Default for InheritanceResolver {
    fn default() -> Self {
        Self::new(&SerializationConfig::default())
    }
}

impl InheritanceResolver {
    pub fn new(config: &SerializationConfig) -> Self {
        Self {
            documents: HashMap::new(),
            parent_key: config.parent_key.clone(),
            non_inherited_keys: config.non_inherited_keys.clone(),
        }
    }

    /// Register (or replace) a document.
    pub fn insert(&mut self, id: impl Into<String>, document: MappingDataNode) -> Option<MappingDataNode> {
        self.documents.insert(id.into(), document)
    }

    pub fn remove(&mut self, id: &str) -> Option<MappingDataNode> {
        self.documents.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&MappingDataNode> {
        self.documents.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Direct parents of `id`, most specific first.
    pub fn parents_of(&self, id: &str) -> Result<Vec<String>> {
        let document = self.document(id)?;
        Self::parents_in(document, &self.parent_key)
    }

    fn parents_in(document: &MappingDataNode, parent_key: &str) -> Result<Vec<String>> {
        match document.get(parent_key) {
            None => Ok(Vec::new()),
            Some(DataNode::Value(value)) if value.is_null() => Ok(Vec::new()),
            Some(DataNode::Value(value)) => Ok(vec![value.value().trim().to_owned()]),
            Some(DataNode::Sequence(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    DataNode::Value(value) => Ok(value.value().trim().to_owned()),
                    other => Err(SerializationError::invalid_node("parent id", "value", other)
                        .in_field(format!("[{i}]"))
                        .in_field(parent_key)),
                })
                .collect(),
            Some(other) => Err(
                SerializationError::invalid_node("parent id", "value or sequence", other).in_field(parent_key),
            ),
        }
    }

    /// The fully merged document for `id`.
    pub fn resolve(&self, id: &str) -> Result<MappingDataNode> {
        self.resolve_with(id, |child, parent| Ok(child.push_inheritance(parent)))
    }

    /// Like [`resolve`](Self::resolve) with a custom merge, typically
    /// [`SerializationManager::push_composition`](crate::SerializationManager::push_composition)
    /// so that per-field inheritance behavior is honored.
    pub fn resolve_with<F>(&self, id: &str, mut merge: F) -> Result<MappingDataNode>
    where
        F: FnMut(&MappingDataNode, &MappingDataNode) -> Result<MappingDataNode>,
    {
        let mut memo = HashMap::new();
        self.resolve_inner(id, &mut merge, &mut memo, &mut Vec::new())
    }

    /// Resolve every document, sharing intermediate results.
    pub fn resolve_all(&self) -> Result<BTreeMap<String, MappingDataNode>> {
        self.resolve_all_with(|child, parent| Ok(child.push_inheritance(parent)))
    }

    pub fn resolve_all_with<F>(&self, mut merge: F) -> Result<BTreeMap<String, MappingDataNode>>
    where
        F: FnMut(&MappingDataNode, &MappingDataNode) -> Result<MappingDataNode>,
    {
        let mut memo = HashMap::with_capacity(self.documents.len());
        let mut ids: Vec<&String> = self.documents.keys().collect();
        ids.sort();
        for id in ids {
            self.resolve_inner(id, &mut merge, &mut memo, &mut Vec::new())?;
        }
        log::debug!("Resolved inheritance for {} documents", memo.len());
        Ok(memo.into_iter().collect())
    }

    /// `document` with everything it would inherit from its parents removed,
    /// so that re-resolving the result reproduces the full document.
    pub fn strip_inherited(&self, document: &MappingDataNode) -> Result<MappingDataNode> {
        let parents = Self::parents_in(document, &self.parent_key)?;
        let child = document
            .get("id")
            .and_then(DataNode::as_value)
            .map_or("<document>", |v| v.value());
        let Some(inherited) = self.merged_parents(child, &parents, &mut |c, p| Ok(c.push_inheritance(p)))? else {
            return Ok(document.clone());
        };
        Ok(document.except(&inherited).unwrap_or_default())
    }

    fn resolve_inner<F>(
        &self,
        id: &str,
        merge: &mut F,
        memo: &mut HashMap<String, MappingDataNode>,
        stack: &mut Vec<String>,
    ) -> Result<MappingDataNode>
    where
        F: FnMut(&MappingDataNode, &MappingDataNode) -> Result<MappingDataNode>,
    {
        if let Some(done) = memo.get(id) {
            return Ok(done.clone());
        }
        if let Some(start) = stack.iter().position(|s| s == id) {
            let mut path = stack[start..].to_vec();
            path.push(id.to_owned());
            return Err(SerializationError::InheritanceCycle { path });
        }

        let document = self.document(id)?;
        let parents = Self::parents_in(document, &self.parent_key)?;

        stack.push(id.to_owned());
        let mut inherited: Option<MappingDataNode> = None;
        // Least specific parent first, so earlier parents override later ones.
        for parent in parents.iter().rev() {
            self.check_parent(id, parent)?;
            let resolved = self.inheritable(self.resolve_inner(parent, merge, memo, stack)?);
            inherited = Some(match inherited {
                None => resolved,
                Some(acc) => merge(&resolved, &acc)?,
            });
        }
        stack.pop();

        let result = match inherited {
            Some(parent) => merge(document, &parent)?,
            None => document.clone(),
        };
        memo.insert(id.to_owned(), result.clone());
        Ok(result)
    }

    fn merged_parents<F>(&self, child: &str, parents: &[String], merge: &mut F) -> Result<Option<MappingDataNode>>
    where
        F: FnMut(&MappingDataNode, &MappingDataNode) -> Result<MappingDataNode>,
    {
        let mut memo = HashMap::new();
        let mut inherited: Option<MappingDataNode> = None;
        for parent in parents.iter().rev() {
            self.check_parent(child, parent)?;
            let resolved = self.inheritable(self.resolve_inner(parent, merge, &mut memo, &mut Vec::new())?);
            inherited = Some(match inherited {
                None => resolved,
                Some(acc) => merge(&resolved, &acc)?,
            });
        }
        Ok(inherited)
    }

    fn check_parent(&self, child: &str, parent: &str) -> Result<()> {
        if self.documents.contains_key(parent) {
            return Ok(());
        }
        Err(SerializationError::UnknownParent {
            id: child.to_owned(),
            parent: parent.to_owned(),
        })
    }

    fn inheritable(&self, mut document: MappingDataNode) -> MappingDataNode {
        for key in &self.non_inherited_keys {
            document.remove(key);
        }
        document
    }

    fn document(&self, id: &str) -> Result<&MappingDataNode> {
        self.documents
            .get(id)
            .ok_or_else(|| SerializationError::UnknownDocument { id: id.to_owned() })
    }
}
