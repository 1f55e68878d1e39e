//! Data definitions: the per-type description of which fields are data.
//!
//! A [`DataDefinition`] lists a type's data fields (key, required flag,
//! priority, inheritance behavior and how the value is serialized) and
//! implements everything the manager does with a structured type:
//! populating an instance from a mapping, writing an instance back out,
//! copying between instances, validating a mapping, and merging a child
//! mapping onto its parent.
//!
//! Definitions are normally generated with `#[derive(DataDefinition)]`;
//! [`DataDefinition::builder`] builds one by hand.

mod builder;
mod field;

use std::sync::OnceLock;

pub use builder::DataDefinitionBuilder;

use self::field::FieldAccess;
use crate::context::SerializationContext;
use crate::error::{Result, SerializationError};
use crate::manager::SerializationManager;
use crate::node::{DataNode, MappingDataNode, SequenceDataNode};
use crate::validation::{ErrorKind, ErrorNode, ValidationNode};

/// How a field combines with the same field of a parent document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InheritanceBehavior {
    /// Child value wins; nested mappings are merged key by key.
    #[default]
    Default,
    /// Child and parent combine: sequences concatenate (parent first),
    /// mappings merge.
    Always,
    /// Never inherited from a parent.
    Never,
}

/// Static description of one data field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub key: &'static str,
    pub required: bool,
    pub priority: i32,
    pub inheritance: InheritanceBehavior,
    pub type_name: &'static str,
}

pub(crate) struct FieldEntry<T> {
    pub(crate) definition: FieldDefinition,
    access: Box<dyn FieldAccess<T>>,
    default_node: OnceLock<Option<DataNode>>,
}

impl<T> FieldEntry<T> {
    pub(crate) fn new(definition: FieldDefinition, access: Box<dyn FieldAccess<T>>) -> Self {
        Self {
            definition,
            access,
            default_node: OnceLock::new(),
        }
    }
}

/// Types described by a [`DataDefinition`].
///
/// Implemented by `#[derive(DataDefinition)]`. The derive also implements
/// [`DataType`](crate::DataType) by forwarding to the manager's definition
/// path; hand-written definitions can do the same with
/// [`impl_definition_data_type!`](crate::impl_definition_data_type).
pub trait DataDefinitionType: Default + Send + Sync + 'static {
    fn build_definition() -> DataDefinition<Self>;
}

pub struct DataDefinition<T> {
    fields: Vec<FieldEntry<T>>,
    after_read: Option<fn(&mut T)>,
    defaults: T,
}

impl<T: Default + Send + Sync + 'static> DataDefinition<T> {
    pub fn builder() -> DataDefinitionBuilder<T> {
        DataDefinitionBuilder::new()
    }

    pub(crate) fn from_fields(mut fields: Vec<FieldEntry<T>>, after_read: Option<fn(&mut T)>) -> Self {
        // Stable, so equal priorities keep declaration order.
        fields.sort_by_key(|f| std::cmp::Reverse(f.definition.priority));
        Self {
            fields,
            after_read,
            defaults: T::default(),
        }
    }

    fn type_name() -> &'static str {
        std::any::type_name::<T>()
    }

    /// Fields in processing order (priority, then declaration).
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().map(|f| &f.definition)
    }

    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.entry(key).map(|f| &f.definition)
    }

    fn entry(&self, key: &str) -> Option<&FieldEntry<T>> {
        self.fields.iter().find(|f| f.definition.key == key)
    }

    /// Keys declared by more than one field.
    pub fn duplicates(&self) -> Vec<&'static str> {
        let mut seen = Vec::with_capacity(self.fields.len());
        let mut duplicates = Vec::new();
        for field in &self.fields {
            let key = field.definition.key;
            if seen.contains(&key) {
                if !duplicates.contains(&key) {
                    duplicates.push(key);
                }
            } else {
                seen.push(key);
            }
        }
        duplicates
    }

    /// Pre-flight checks: unique keys and resolvable field serializers.
    pub fn check(&self, manager: &SerializationManager) -> Result<()> {
        if let Some(key) = self.duplicates().first() {
            return Err(SerializationError::DuplicateFieldKey {
                key: (*key).to_owned(),
                type_name: Self::type_name(),
            });
        }
        for field in &self.fields {
            field
                .access
                .check(manager)
                .map_err(|e| e.in_field(field.definition.key))?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Read
    // -----------------------------------------------------------------------

    /// Create an instance from a mapping node.
    ///
    /// An empty value node reads as an empty mapping.
    pub fn read(&self, node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<T> {
        let mut target = T::default();
        self.read_node(&mut target, node, false, manager, ctx)?;
        Ok(target)
    }

    /// Update `target` with the keys present in `node`. Required fields are
    /// not enforced and untouched fields keep their values.
    pub fn read_into(
        &self,
        target: &mut T,
        node: &DataNode,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        self.read_node(target, node, true, manager, ctx)
    }

    fn read_node(
        &self,
        target: &mut T,
        node: &DataNode,
        update: bool,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        match node {
            DataNode::Mapping(mapping) => self.populate_with(target, mapping, update, manager, ctx),
            DataNode::Value(value) if value.value().trim().is_empty() => {
                self.populate_with(target, &MappingDataNode::new(), update, manager, ctx)
            }
            other => Err(SerializationError::invalid_node(Self::type_name(), "mapping", other)),
        }
    }

    /// Populate every field from `mapping`, failing on missing required fields.
    pub fn populate(
        &self,
        target: &mut T,
        mapping: &MappingDataNode,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        self.populate_with(target, mapping, false, manager, ctx)
    }

    /// Populate only the fields present in `mapping`.
    pub fn populate_partial(
        &self,
        target: &mut T,
        mapping: &MappingDataNode,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        self.populate_with(target, mapping, true, manager, ctx)
    }

    fn populate_with(
        &self,
        target: &mut T,
        mapping: &MappingDataNode,
        update: bool,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        self.check_unknown_keys(mapping, manager, ctx)?;

        for field in &self.fields {
            let key = field.definition.key;
            match mapping.get(key) {
                Some(node) => field
                    .access
                    .read(target, node, update, manager, ctx)
                    .map_err(|e| e.in_field(key))?,
                None if field.definition.required && !update => {
                    return Err(SerializationError::MissingRequiredField {
                        field: key.to_owned(),
                        type_name: Self::type_name(),
                    });
                }
                None => {}
            }
        }

        if let Some(hook) = self.after_read
            && !ctx.hooks_skipped()
        {
            hook(target);
        }
        Ok(())
    }

    fn check_unknown_keys(
        &self,
        mapping: &MappingDataNode,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        for key in mapping.keys() {
            let known = key
                .as_value()
                .is_some_and(|k| self.entry(k.value()).is_some());
            if known {
                continue;
            }
            if manager.is_strict(ctx) {
                return Err(SerializationError::UnknownField {
                    field: key.to_string(),
                    type_name: Self::type_name(),
                    mark: key.start(),
                });
            }
            log::trace!("Ignoring unknown key `{key}` on {}", Self::type_name());
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Write
    // -----------------------------------------------------------------------

    /// Write every field that differs from its default. Required fields are
    /// always written.
    pub fn serialize(
        &self,
        source: &T,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<MappingDataNode> {
        let mut mapping = MappingDataNode::with_capacity(self.fields.len());
        for field in &self.fields {
            let key = field.definition.key;
            let node = field
                .access
                .write(source, manager, ctx)
                .map_err(|e| e.in_field(key))?;
            if !field.definition.required && self.is_default(field, &node, manager, ctx) {
                continue;
            }
            mapping.insert(key, node);
        }
        Ok(mapping)
    }

    /// Write exactly the named fields, whatever their values.
    pub fn serialize_fields(
        &self,
        source: &T,
        keys: &[&str],
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<MappingDataNode> {
        let mut mapping = MappingDataNode::with_capacity(keys.len());
        for key in keys {
            let field = self.entry(key).ok_or_else(|| SerializationError::UnknownField {
                field: (*key).to_owned(),
                type_name: Self::type_name(),
                mark: Default::default(),
            })?;
            let node = field
                .access
                .write(source, manager, ctx)
                .map_err(|e| e.in_field(*key))?;
            mapping.insert(*key, node);
        }
        Ok(mapping)
    }

    /// Whether `node` is what the field's default value writes as. The
    /// default node is cached only for calls without per-call overrides,
    /// since overrides can change how the default is written.
    fn is_default(
        &self,
        field: &FieldEntry<T>,
        node: &DataNode,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> bool {
        if ctx.overrides().is_some() {
            return field
                .access
                .write(&self.defaults, manager, ctx)
                .is_ok_and(|default| &default == node);
        }
        field
            .default_node
            .get_or_init(|| field.access.write(&self.defaults, manager, ctx).ok())
            .as_ref()
            == Some(node)
    }

    // -----------------------------------------------------------------------
    // Copy
    // -----------------------------------------------------------------------

    pub fn copy_to(
        &self,
        source: &T,
        target: &mut T,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        for field in &self.fields {
            field
                .access
                .copy(source, target, manager, ctx)
                .map_err(|e| e.in_field(field.definition.key))?;
        }
        Ok(())
    }

    pub fn create_copy(&self, source: &T, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<T> {
        let mut target = T::default();
        self.copy_to(source, &mut target, manager, ctx)?;
        Ok(target)
    }

    // -----------------------------------------------------------------------
    // Validate
    // -----------------------------------------------------------------------

    /// Check `node` against this definition without building an instance.
    ///
    /// Unknown keys produce a `FieldNotFound` error paired with an
    /// inconclusive value; missing required fields produce an error on the
    /// missing key.
    pub fn validate(&self, node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> ValidationNode {
        let empty = MappingDataNode::new();
        let mapping = match node {
            DataNode::Mapping(mapping) => mapping,
            DataNode::Value(value) if value.value().trim().is_empty() => &empty,
            other => {
                return ValidationNode::error(
                    ErrorKind::InvalidNodeType,
                    other.clone(),
                    SerializationError::invalid_node(Self::type_name(), "mapping", other).to_string(),
                );
            }
        };

        let strict = manager.is_strict(ctx);
        let mut entries = Vec::with_capacity(mapping.len());
        for (key, value) in mapping.iter() {
            let field = key.as_value().and_then(|k| self.entry(k.value()));
            match field {
                Some(field) => entries.push((
                    ValidationNode::valid(key.clone()),
                    field.access.validate(value, manager, ctx),
                )),
                None => entries.push((
                    ValidationNode::Error(ErrorNode::field_not_found(key.clone(), Self::type_name(), strict)),
                    ValidationNode::inconclusive(value.clone()),
                )),
            }
        }

        for field in &self.fields {
            let key = field.definition.key;
            if field.definition.required && !mapping.contains_key(key) {
                entries.push((
                    ValidationNode::error(
                        ErrorKind::MissingRequired,
                        DataNode::value(key),
                        format!("missing required field `{key}` on {}", Self::type_name()),
                    ),
                    ValidationNode::inconclusive(DataNode::null()),
                ));
            }
        }

        ValidationNode::Mapping(entries)
    }

    // -----------------------------------------------------------------------
    // Composition
    // -----------------------------------------------------------------------

    /// Merge `child` onto `parent` honoring each field's
    /// [`InheritanceBehavior`]. Keys that are not fields use the default
    /// behavior.
    pub fn push_composition(&self, child: &MappingDataNode, parent: &MappingDataNode) -> MappingDataNode {
        let mut merged = child.push_inheritance(parent);
        for field in &self.fields {
            let key = field.definition.key;
            let Some(parent_value) = parent.get(key) else {
                continue;
            };
            match field.definition.inheritance {
                InheritanceBehavior::Default => {}
                InheritanceBehavior::Never => match child.get(key) {
                    Some(child_value) => {
                        merged.insert(key, child_value.clone());
                    }
                    None => {
                        merged.remove(key);
                    }
                },
                InheritanceBehavior::Always => {
                    if let (Some(DataNode::Sequence(c)), DataNode::Sequence(p)) = (child.get(key), parent_value) {
                        merged.insert(key, SequenceDataNode::concat(p, c));
                    }
                }
            }
        }
        merged
    }
}

/// Implement [`DataType`](crate::DataType) for a type with a hand-written
/// [`DataDefinitionType`] impl.
#[macro_export]
macro_rules! impl_definition_data_type {
    ($ty:ty) => {
        impl $crate::DataType for $ty {
            fn read(
                node: &$crate::DataNode,
                manager: &$crate::SerializationManager,
                ctx: &$crate::SerializationContext<'_>,
            ) -> $crate::Result<Self> {
                manager.read_definition::<Self>(node, ctx)
            }

            fn read_into(
                &mut self,
                node: &$crate::DataNode,
                manager: &$crate::SerializationManager,
                ctx: &$crate::SerializationContext<'_>,
            ) -> $crate::Result<()> {
                manager.read_definition_into(self, node, ctx)
            }

            fn write(
                &self,
                manager: &$crate::SerializationManager,
                ctx: &$crate::SerializationContext<'_>,
            ) -> $crate::Result<$crate::DataNode> {
                manager.write_definition(self, ctx)
            }

            fn create_copy(
                &self,
                manager: &$crate::SerializationManager,
                ctx: &$crate::SerializationContext<'_>,
            ) -> $crate::Result<Self> {
                manager.create_definition_copy(self, ctx)
            }

            fn copy_to(
                &self,
                target: &mut Self,
                manager: &$crate::SerializationManager,
                ctx: &$crate::SerializationContext<'_>,
            ) -> $crate::Result<()> {
                manager.copy_definition_to(self, target, ctx)
            }

            fn validate(
                node: &$crate::DataNode,
                manager: &$crate::SerializationManager,
                ctx: &$crate::SerializationContext<'_>,
            ) -> $crate::ValidationNode {
                manager.validate_definition::<Self>(node, ctx)
            }
        }
    };
}
