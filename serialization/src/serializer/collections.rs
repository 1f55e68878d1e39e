use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::sync::Arc;

use super::DataType;
use crate::context::SerializationContext;
use crate::error::{Result, SerializationError};
use crate::manager::SerializationManager;
use crate::node::{DataNode, MappingDataNode, SequenceDataNode};
use crate::validation::{ErrorKind, ValidationNode};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn expect_sequence<'n>(node: &'n DataNode, type_name: &'static str) -> Result<&'n SequenceDataNode> {
    match node {
        DataNode::Sequence(seq) => Ok(seq),
        other => Err(SerializationError::invalid_node(type_name, "sequence", other)),
    }
}

fn expect_mapping<'n>(node: &'n DataNode, type_name: &'static str) -> Result<&'n MappingDataNode> {
    match node {
        DataNode::Mapping(map) => Ok(map),
        other => Err(SerializationError::invalid_node(type_name, "mapping", other)),
    }
}

fn read_items<'n, T: DataType>(
    seq: &'n SequenceDataNode,
    manager: &'n SerializationManager,
    ctx: &'n SerializationContext<'_>,
) -> impl Iterator<Item = Result<T>> + 'n {
    seq.iter()
        .enumerate()
        .map(move |(i, item)| manager.read_with::<T>(item, ctx).map_err(|e| e.in_field(format!("[{i}]"))))
}

fn write_items<'a, T: DataType>(
    items: impl Iterator<Item = &'a T>,
    manager: &SerializationManager,
    ctx: &SerializationContext<'_>,
) -> Result<DataNode> {
    let mut seq = SequenceDataNode::new();
    for (i, item) in items.enumerate() {
        seq.push(manager.write_with(item, ctx).map_err(|e| e.in_field(format!("[{i}]")))?);
    }
    Ok(DataNode::Sequence(seq))
}

fn validate_items<T: DataType>(
    node: &DataNode,
    type_name: &'static str,
    manager: &SerializationManager,
    ctx: &SerializationContext<'_>,
) -> ValidationNode {
    match node {
        DataNode::Sequence(seq) => ValidationNode::Sequence(
            seq.iter()
                .map(|item| manager.validate_with::<T>(item, ctx))
                .collect(),
        ),
        other => invalid(type_name, "sequence", other),
    }
}

fn read_entries<K: DataType, V: DataType>(
    map: &MappingDataNode,
    manager: &SerializationManager,
    ctx: &SerializationContext<'_>,
    mut insert: impl FnMut(K, V),
) -> Result<()> {
    for (key, value) in map.iter() {
        let k = manager.read_with::<K>(key, ctx)?;
        let v = manager
            .read_with::<V>(value, ctx)
            .map_err(|e| e.in_field(key.to_string()))?;
        insert(k, v);
    }
    Ok(())
}

fn write_entries<'a, K: DataType, V: DataType>(
    entries: impl Iterator<Item = (&'a K, &'a V)>,
    manager: &SerializationManager,
    ctx: &SerializationContext<'_>,
) -> Result<DataNode> {
    let mut map = MappingDataNode::new();
    for (key, value) in entries {
        let key = manager.write_with(key, ctx)?;
        let value = manager
            .write_with(value, ctx)
            .map_err(|e| e.in_field(key.to_string()))?;
        map.insert(key, value);
    }
    Ok(DataNode::Mapping(map))
}

fn validate_entries<K: DataType, V: DataType>(
    node: &DataNode,
    type_name: &'static str,
    manager: &SerializationManager,
    ctx: &SerializationContext<'_>,
) -> ValidationNode {
    match node {
        DataNode::Mapping(map) => ValidationNode::Mapping(
            map.iter()
                .map(|(k, v)| (manager.validate_with::<K>(k, ctx), manager.validate_with::<V>(v, ctx)))
                .collect(),
        ),
        other => invalid(type_name, "mapping", other),
    }
}

fn invalid(type_name: &'static str, expected: &'static str, node: &DataNode) -> ValidationNode {
    ValidationNode::error(
        ErrorKind::InvalidNodeType,
        node.clone(),
        SerializationError::invalid_node(type_name, expected, node).to_string(),
    )
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

impl<T: DataType> DataType for Vec<T> {
    fn type_name() -> &'static str {
        "Vec"
    }

    fn read(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        let seq = expect_sequence(node, Self::type_name())?;
        read_items(seq, manager, ctx).collect()
    }

    fn read_into(
        &mut self,
        node: &DataNode,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        let seq = expect_sequence(node, Self::type_name())?;
        self.clear();
        self.reserve(seq.len());
        for item in read_items(seq, manager, ctx) {
            self.push(item?);
        }
        Ok(())
    }

    fn write(&self, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<DataNode> {
        write_items(self.iter(), manager, ctx)
    }

    fn create_copy(&self, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        self.iter().map(|item| manager.copy_with(item, ctx)).collect()
    }

    fn copy_to(
        &self,
        target: &mut Self,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        target.clear();
        target.reserve(self.len());
        for item in self {
            target.push(manager.copy_with(item, ctx)?);
        }
        Ok(())
    }

    fn validate(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> ValidationNode {
        validate_items::<T>(node, Self::type_name(), manager, ctx)
    }
}

impl<T: DataType> DataType for VecDeque<T> {
    fn type_name() -> &'static str {
        "VecDeque"
    }

    fn read(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        let seq = expect_sequence(node, Self::type_name())?;
        read_items(seq, manager, ctx).collect()
    }

    fn write(&self, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<DataNode> {
        write_items(self.iter(), manager, ctx)
    }

    fn create_copy(&self, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        self.iter().map(|item| manager.copy_with(item, ctx)).collect()
    }

    fn validate(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> ValidationNode {
        validate_items::<T>(node, Self::type_name(), manager, ctx)
    }
}

impl<T: DataType + Eq + Hash> DataType for HashSet<T> {
    fn type_name() -> &'static str {
        "HashSet"
    }

    fn read(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        let seq = expect_sequence(node, Self::type_name())?;
        read_items(seq, manager, ctx).collect()
    }

    fn write(&self, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<DataNode> {
        write_items(self.iter(), manager, ctx)
    }

    fn create_copy(&self, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        self.iter().map(|item| manager.copy_with(item, ctx)).collect()
    }

    fn validate(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> ValidationNode {
        validate_items::<T>(node, Self::type_name(), manager, ctx)
    }
}

impl<T: DataType + Ord> DataType for BTreeSet<T> {
    fn type_name() -> &'static str {
        "BTreeSet"
    }

    fn read(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        let seq = expect_sequence(node, Self::type_name())?;
        read_items(seq, manager, ctx).collect()
    }

    fn write(&self, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<DataNode> {
        write_items(self.iter(), manager, ctx)
    }

    fn create_copy(&self, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        self.iter().map(|item| manager.copy_with(item, ctx)).collect()
    }

    fn validate(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> ValidationNode {
        validate_items::<T>(node, Self::type_name(), manager, ctx)
    }
}

// ---------------------------------------------------------------------------
// Mappings
// ---------------------------------------------------------------------------

impl<K: DataType + Eq + Hash, V: DataType> DataType for HashMap<K, V> {
    fn type_name() -> &'static str {
        "HashMap"
    }

    fn read(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        let map = expect_mapping(node, Self::type_name())?;
        let mut out = HashMap::with_capacity(map.len());
        read_entries(map, manager, ctx, |k, v| {
            out.insert(k, v);
        })?;
        Ok(out)
    }

    fn write(&self, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<DataNode> {
        write_entries(self.iter(), manager, ctx)
    }

    fn create_copy(&self, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        self.iter()
            .map(|(k, v)| Ok((manager.copy_with(k, ctx)?, manager.copy_with(v, ctx)?)))
            .collect()
    }

    fn validate(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> ValidationNode {
        validate_entries::<K, V>(node, Self::type_name(), manager, ctx)
    }
}

impl<K: DataType + Ord, V: DataType> DataType for BTreeMap<K, V> {
    fn type_name() -> &'static str {
        "BTreeMap"
    }

    fn read(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        let map = expect_mapping(node, Self::type_name())?;
        let mut out = BTreeMap::new();
        read_entries(map, manager, ctx, |k, v| {
            out.insert(k, v);
        })?;
        Ok(out)
    }

    fn write(&self, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<DataNode> {
        write_entries(self.iter(), manager, ctx)
    }

    fn create_copy(&self, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        self.iter()
            .map(|(k, v)| Ok((manager.copy_with(k, ctx)?, manager.copy_with(v, ctx)?)))
            .collect()
    }

    fn validate(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> ValidationNode {
        validate_entries::<K, V>(node, Self::type_name(), manager, ctx)
    }
}

// ---------------------------------------------------------------------------
// Wrappers
// ---------------------------------------------------------------------------

impl<T: DataType> DataType for Option<T> {
    const NULLABLE: bool = true;

    fn type_name() -> &'static str {
        T::type_name()
    }

    fn read(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        if node.is_null() {
            return Ok(None);
        }
        manager.read_with::<T>(node, ctx).map(Some)
    }

    fn write(&self, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<DataNode> {
        match self {
            Some(value) => manager.write_with(value, ctx),
            None => Ok(DataNode::null()),
        }
    }

    fn create_copy(&self, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        self.as_ref().map(|value| manager.copy_with(value, ctx)).transpose()
    }

    fn validate(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> ValidationNode {
        if node.is_null() {
            return ValidationNode::valid(node.clone());
        }
        manager.validate_with::<T>(node, ctx)
    }
}

impl<T: DataType> DataType for Box<T> {
    const NULLABLE: bool = T::NULLABLE;

    fn type_name() -> &'static str {
        T::type_name()
    }

    fn read(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        manager.read_with::<T>(node, ctx).map(Box::new)
    }

    fn read_into(
        &mut self,
        node: &DataNode,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        manager.read_into_with::<T>(self, node, ctx)
    }

    fn write(&self, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<DataNode> {
        manager.write_with::<T>(self, ctx)
    }

    fn create_copy(&self, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        manager.copy_with::<T>(self, ctx).map(Box::new)
    }

    fn copy_to(
        &self,
        target: &mut Self,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        manager.copy_to_with::<T>(self, target, ctx)
    }

    fn validate(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> ValidationNode {
        manager.validate_with::<T>(node, ctx)
    }
}

/// Shared values are immutable, so copies share the allocation.
impl<T: DataType> DataType for Arc<T> {
    const NULLABLE: bool = T::NULLABLE;

    fn type_name() -> &'static str {
        T::type_name()
    }

    fn read(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<Self> {
        manager.read_with::<T>(node, ctx).map(Arc::new)
    }

    fn write(&self, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<DataNode> {
        manager.write_with::<T>(self, ctx)
    }

    fn create_copy(&self, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<Self> {
        Ok(Arc::clone(self))
    }

    fn validate(node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> ValidationNode {
        manager.validate_with::<T>(node, ctx)
    }
}
