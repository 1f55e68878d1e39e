//! Typed references to other documents by id.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::DataType;
use super::primitives::expect_value;
use crate::context::{PrototypeLookup, SerializationContext};
use crate::error::{Result, SerializationError};
use crate::manager::SerializationManager;
use crate::node::DataNode;
use crate::validation::{ErrorKind, ValidationNode};

/// Marker naming a kind of document, e.g. `"entity"` or `"reagent"`.
pub trait PrototypeKind: Send + Sync + 'static {
    const KIND: &'static str;
}

/// Id of a document of kind `K`.
///
/// Reading checks the id against the context's
/// [`PrototypeIndex`](crate::context::PrototypeIndex) when one is present.
pub struct ProtoId<K> {
    id: String,
    _kind: PhantomData<fn() -> K>,
}

impl<K> ProtoId<K> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            _kind: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl<K> Clone for ProtoId<K> {
    fn clone(&self) -> Self {
        Self::new(self.id.clone())
    }
}

impl<K> Default for ProtoId<K> {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl<K> PartialEq for ProtoId<K> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<K> Eq for ProtoId<K> {}

impl<K> Hash for ProtoId<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<K> PartialOrd for ProtoId<K> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for ProtoId<K> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl<K: PrototypeKind> fmt::Debug for ProtoId<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProtoId<{}>({:?})", K::KIND, self.id)
    }
}

impl<K> fmt::Display for ProtoId<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl<K: PrototypeKind> DataType for ProtoId<K> {
    fn type_name() -> &'static str {
        K::KIND
    }

    fn read(node: &DataNode, _manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        let value = expect_value(node, K::KIND)?;
        let id = value.value().trim();
        if let Some(index) = ctx.prototypes()
            && index.lookup(K::KIND, id) == PrototypeLookup::Unknown
        {
            return Err(SerializationError::UnknownReference {
                kind: K::KIND,
                id: id.to_owned(),
            });
        }
        Ok(Self::new(id))
    }

    fn write(&self, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<DataNode> {
        Ok(DataNode::value(self.id.as_str()))
    }

    fn create_copy(&self, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<Self> {
        Ok(self.clone())
    }

    fn validate(node: &DataNode, _manager: &SerializationManager, ctx: &SerializationContext<'_>) -> ValidationNode {
        let value = match expect_value(node, K::KIND) {
            Ok(value) => value,
            Err(e) => return ValidationNode::error(ErrorKind::InvalidNodeType, node.clone(), e.to_string()),
        };
        let Some(index) = ctx.prototypes() else {
            return ValidationNode::valid(node.clone());
        };
        match index.lookup(K::KIND, value.value().trim()) {
            PrototypeLookup::Known => ValidationNode::valid(node.clone()),
            PrototypeLookup::NotLoaded => ValidationNode::inconclusive(node.clone()),
            PrototypeLookup::Unknown => ValidationNode::error(
                ErrorKind::UnknownReference,
                node.clone(),
                format!("unknown {} `{}`", K::KIND, value.value().trim()),
            ),
        }
    }
}
