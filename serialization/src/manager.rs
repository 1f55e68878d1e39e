use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::SerializationConfig;
use crate::context::SerializationContext;
use crate::definition::{DataDefinition, DataDefinitionType};
use crate::error::{Result, SerializationError};
use crate::node::{DataNode, MappingDataNode};
use crate::serializer::polymorphic::{self, PolymorphicBase, PolymorphicTypes, PolymorphicVariant};
use crate::serializer::{DataType, SerializerRegistry, TypeSerializer};
use crate::validation::{ErrorKind, ValidationNode};

/// A definition type registered for pre-flight checking.
struct PendingDefinition {
    type_name: &'static str,
    check: fn(&SerializationManager) -> Result<()>,
}

/// Entry point for reading, writing, copying and validating data.
///
/// Configure the manager (serializers, constant sets, definition types)
/// through `&mut` methods, call [`initialize`](Self::initialize) once, then
/// share it (`Arc<SerializationManager>`) and use it from any thread. Data
/// definitions are built lazily on first use and cached.
///
/// # Example
///
/// ```ignore
/// let mut manager = SerializationManager::new();
/// manager.registry_mut().register_constants::<CollisionLayer>();
/// manager.register_definition::<Weapon>();
/// manager.initialize()?;
///
/// let weapon: Weapon = manager.read(&node)?;
/// let node = manager.write(&weapon)?;
/// ```
pub struct SerializationManager {
    registry: SerializerRegistry,
    config: SerializationConfig,
    definitions: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    pending: Vec<PendingDefinition>,
    initialized: bool,
}

impl Default for SerializationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SerializationManager {
    pub fn new() -> Self {
        Self::with_config(SerializationConfig::default())
    }

    pub fn with_config(config: SerializationConfig) -> Self {
        Self {
            registry: SerializerRegistry::new(),
            config,
            definitions: RwLock::new(HashMap::new()),
            pending: Vec::new(),
            initialized: false,
        }
    }

    pub fn config(&self) -> &SerializationConfig {
        &self.config
    }

    pub fn registry(&self) -> &SerializerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SerializerRegistry {
        &mut self.registry
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether unknown mapping keys are errors for this call.
    pub fn is_strict(&self, ctx: &SerializationContext<'_>) -> bool {
        ctx.strict_override()
            .unwrap_or(self.config.strict_unknown_fields)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Add `T` to the set of definitions checked by [`initialize`](Self::initialize).
    ///
    /// Definitions of unregistered types still work; they are simply built
    /// on first use instead of being checked up front.
    pub fn register_definition<T: DataDefinitionType>(&mut self) -> &mut Self {
        self.pending.push(PendingDefinition {
            type_name: std::any::type_name::<T>(),
            check: Self::check_definition::<T>,
        });
        self
    }

    /// Build and check every registered definition.
    ///
    /// Fails on duplicate field keys and on fields whose serializer or
    /// constant set is not registered. Calling this twice without an
    /// intervening [`clear`](Self::clear) is an error.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Err(SerializationError::AlreadyInitialized);
        }
        for pending in &self.pending {
            log::debug!("Checking data definition {}", pending.type_name);
            (pending.check)(self)?;
        }
        self.initialized = true;
        log::info!(
            "Serialization initialized: {} data definitions, {} registered serializers",
            self.pending.len(),
            self.registry.len()
        );
        Ok(())
    }

    /// Drop cached definitions and return to the uninitialized state.
    /// Registrations are kept.
    pub fn clear(&mut self) {
        self.definitions.write().clear();
        self.initialized = false;
        log::debug!("Serialization manager cleared");
    }

    fn check_definition<T: DataDefinitionType>(&self) -> Result<()> {
        self.definition::<T>().check(self)
    }

    /// The cached definition of `T`, building it on first use.
    pub fn definition<T: DataDefinitionType>(&self) -> Arc<DataDefinition<T>> {
        let id = TypeId::of::<T>();
        if let Some(cached) = self.definitions.read().get(&id).cloned()
            && let Ok(definition) = cached.downcast::<DataDefinition<T>>()
        {
            return definition;
        }
        let definition = Arc::new(T::build_definition());
        log::debug!(
            "Built data definition for {} ({} fields)",
            std::any::type_name::<T>(),
            definition.fields().count()
        );
        self.definitions.write().insert(id, definition.clone());
        definition
    }

    // -----------------------------------------------------------------------
    // Read
    // -----------------------------------------------------------------------

    pub fn read<T: DataType>(&self, node: &DataNode) -> Result<T> {
        self.read_with(node, &SerializationContext::default())
    }

    /// Read a `T` from `node`. Registry overrides take precedence over `T`'s
    /// own representation; the context's overrides take precedence over both.
    pub fn read_with<T: DataType>(&self, node: &DataNode, ctx: &SerializationContext<'_>) -> Result<T> {
        let _depth = ctx.descend(self.config.max_depth, node.start())?;
        if !T::NULLABLE && node.is_null() {
            return Err(SerializationError::NullNotAllowed {
                type_name: T::type_name(),
                mark: node.start(),
            });
        }
        if let Some(serializer) = self.override_for::<T>(ctx) {
            return serializer.read(node, self, ctx);
        }
        T::read(node, self, ctx)
    }

    pub fn read_into<T: DataType>(&self, target: &mut T, node: &DataNode) -> Result<()> {
        self.read_into_with(target, node, &SerializationContext::default())
    }

    /// Read into an existing value. Structured types only update the fields
    /// present in `node`.
    pub fn read_into_with<T: DataType>(
        &self,
        target: &mut T,
        node: &DataNode,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        let _depth = ctx.descend(self.config.max_depth, node.start())?;
        if !T::NULLABLE && node.is_null() {
            return Err(SerializationError::NullNotAllowed {
                type_name: T::type_name(),
                mark: node.start(),
            });
        }
        if let Some(serializer) = self.override_for::<T>(ctx) {
            *target = serializer.read(node, self, ctx)?;
            return Ok(());
        }
        target.read_into(node, self, ctx)
    }

    // -----------------------------------------------------------------------
    // Write
    // -----------------------------------------------------------------------

    pub fn write<T: DataType>(&self, value: &T) -> Result<DataNode> {
        self.write_with(value, &SerializationContext::default())
    }

    pub fn write_with<T: DataType>(&self, value: &T, ctx: &SerializationContext<'_>) -> Result<DataNode> {
        if let Some(serializer) = self.override_for::<T>(ctx) {
            return serializer.write(value, self, ctx);
        }
        value.write(self, ctx)
    }

    /// Write exactly the named fields of a structured value.
    pub fn write_fields<T: DataDefinitionType>(&self, value: &T, keys: &[&str]) -> Result<MappingDataNode> {
        self.definition::<T>()
            .serialize_fields(value, keys, self, &SerializationContext::default())
    }

    // -----------------------------------------------------------------------
    // Copy
    // -----------------------------------------------------------------------

    /// Deep copy into a fresh value.
    pub fn copy<T: DataType>(&self, source: &T) -> Result<T> {
        self.copy_with(source, &SerializationContext::default())
    }

    pub fn copy_with<T: DataType>(&self, source: &T, ctx: &SerializationContext<'_>) -> Result<T> {
        if let Some(serializer) = self.override_for::<T>(ctx) {
            return serializer.create_copy(source, self, ctx);
        }
        source.create_copy(self, ctx)
    }

    /// Deep copy into an existing value.
    pub fn copy_to<T: DataType>(&self, source: &T, target: &mut T) -> Result<()> {
        self.copy_to_with(source, target, &SerializationContext::default())
    }

    pub fn copy_to_with<T: DataType>(&self, source: &T, target: &mut T, ctx: &SerializationContext<'_>) -> Result<()> {
        if let Some(serializer) = self.override_for::<T>(ctx) {
            return serializer.copy_to(source, target, self, ctx);
        }
        source.copy_to(target, self, ctx)
    }

    // -----------------------------------------------------------------------
    // Validate
    // -----------------------------------------------------------------------

    pub fn validate<T: DataType>(&self, node: &DataNode) -> ValidationNode {
        self.validate_with::<T>(node, &SerializationContext::default())
    }

    pub fn validate_with<T: DataType>(&self, node: &DataNode, ctx: &SerializationContext<'_>) -> ValidationNode {
        let _depth = match ctx.descend(self.config.max_depth, node.start()) {
            Ok(guard) => guard,
            Err(e) => return ValidationNode::error(ErrorKind::Malformed, node.clone(), e.to_string()),
        };
        if !T::NULLABLE && node.is_null() {
            return ValidationNode::error(
                ErrorKind::NullNotAllowed,
                node.clone(),
                format!("null is not allowed for {}", T::type_name()),
            );
        }
        if let Some(serializer) = self.override_for::<T>(ctx) {
            return serializer.validate(node, self, ctx);
        }
        T::validate(node, self, ctx)
    }

    // -----------------------------------------------------------------------
    // Composition
    // -----------------------------------------------------------------------

    /// Merge a child mapping onto its parent using `T`'s per-field
    /// inheritance behavior.
    pub fn push_composition<T: DataDefinitionType>(
        &self,
        child: &MappingDataNode,
        parent: &MappingDataNode,
    ) -> MappingDataNode {
        self.definition::<T>().push_composition(child, parent)
    }

    // -----------------------------------------------------------------------
    // Definition path, used by `#[derive(DataDefinition)]`
    // -----------------------------------------------------------------------

    pub fn read_definition<T: DataDefinitionType>(&self, node: &DataNode, ctx: &SerializationContext<'_>) -> Result<T> {
        self.definition::<T>().read(node, self, ctx)
    }

    pub fn read_definition_into<T: DataDefinitionType>(
        &self,
        target: &mut T,
        node: &DataNode,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        self.definition::<T>().read_into(target, node, self, ctx)
    }

    pub fn write_definition<T: DataDefinitionType>(&self, value: &T, ctx: &SerializationContext<'_>) -> Result<DataNode> {
        self.definition::<T>()
            .serialize(value, self, ctx)
            .map(DataNode::Mapping)
    }

    pub fn create_definition_copy<T: DataDefinitionType>(&self, source: &T, ctx: &SerializationContext<'_>) -> Result<T> {
        self.definition::<T>().create_copy(source, self, ctx)
    }

    pub fn copy_definition_to<T: DataDefinitionType>(
        &self,
        source: &T,
        target: &mut T,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        self.definition::<T>().copy_to(source, target, self, ctx)
    }

    pub fn validate_definition<T: DataDefinitionType>(&self, node: &DataNode, ctx: &SerializationContext<'_>) -> ValidationNode {
        self.definition::<T>().validate(node, self, ctx)
    }

    // -----------------------------------------------------------------------
    // Polymorphic path, used by `impl_polymorphic_data_type!`
    // -----------------------------------------------------------------------

    /// Read the concrete type named by `node`'s `!type:` tag.
    pub fn read_polymorphic<B: ?Sized + PolymorphicBase>(
        &self,
        node: &DataNode,
        ctx: &SerializationContext<'_>,
    ) -> Result<Box<B>> {
        self.variant_for_node::<B>(node, ctx)?.read(node, self, ctx)
    }

    /// Write `value` through its concrete type and tag the node with the
    /// registered name.
    pub fn write_polymorphic<B: ?Sized + PolymorphicBase>(
        &self,
        value: &B,
        ctx: &SerializationContext<'_>,
    ) -> Result<DataNode> {
        let (name, variant) = self.variant_for_value(value, ctx)?;
        let node = variant.write(value, self, ctx)?;
        Ok(node.with_tag(format!("{}{name}", polymorphic::TYPE_TAG_PREFIX)))
    }

    pub fn copy_polymorphic<B: ?Sized + PolymorphicBase>(
        &self,
        value: &B,
        ctx: &SerializationContext<'_>,
    ) -> Result<Box<B>> {
        let (_, variant) = self.variant_for_value(value, ctx)?;
        variant.create_copy(value, self, ctx)
    }

    pub fn validate_polymorphic<B: ?Sized + PolymorphicBase>(
        &self,
        node: &DataNode,
        ctx: &SerializationContext<'_>,
    ) -> ValidationNode {
        match self.variant_for_node::<B>(node, ctx) {
            Ok(variant) => variant.validate(node, self, ctx),
            Err(e) => ValidationNode::error(ErrorKind::UnknownType, node.clone(), e.to_string()),
        }
    }

    /// Polymorphic tables for `B`, context overrides first.
    fn polymorphic_types<'r, B: ?Sized + PolymorphicBase>(
        &'r self,
        ctx: &SerializationContext<'r>,
    ) -> impl Iterator<Item = &'r PolymorphicTypes<B>> {
        ctx.overrides()
            .and_then(|registry| registry.polymorphic::<B>())
            .into_iter()
            .chain(self.registry.polymorphic::<B>())
    }

    fn variant_for_node<'r, B: ?Sized + PolymorphicBase>(
        &'r self,
        node: &DataNode,
        ctx: &SerializationContext<'r>,
    ) -> Result<&'r dyn PolymorphicVariant<B>> {
        let base = std::any::type_name::<B>();
        let name = polymorphic::type_tag_name(node).ok_or(SerializationError::MissingTypeTag {
            base,
            mark: node.start(),
        })?;
        self.polymorphic_types::<B>(ctx)
            .find_map(|types| types.by_name(name))
            .ok_or_else(|| SerializationError::UnknownTypeTag {
                base,
                name: name.to_owned(),
                mark: node.start(),
            })
    }

    fn variant_for_value<'r, B: ?Sized + PolymorphicBase>(
        &'r self,
        value: &B,
        ctx: &SerializationContext<'r>,
    ) -> Result<(&'r str, &'r dyn PolymorphicVariant<B>)> {
        self.polymorphic_types::<B>(ctx)
            .find_map(|types| types.by_value(value))
            .ok_or(SerializationError::UnregisteredConcreteType {
                base: std::any::type_name::<B>(),
            })
    }

    fn override_for<T: 'static>(&self, ctx: &SerializationContext<'_>) -> Option<Arc<dyn TypeSerializer<T>>> {
        ctx.overrides()
            .and_then(|registry| registry.get::<T>())
            .or_else(|| self.registry.get::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reads integers written in hex.
    struct HexSerializer;

    impl TypeSerializer<u32> for HexSerializer {
        fn read(&self, node: &DataNode, _: &SerializationManager, _: &SerializationContext<'_>) -> Result<u32> {
            let text = node.as_value().map(|v| v.value()).unwrap_or_default();
            u32::from_str_radix(text.trim_start_matches("0x"), 16)
                .map_err(|e| SerializationError::Custom(e.to_string()))
        }

        fn write(&self, value: &u32, _: &SerializationManager, _: &SerializationContext<'_>) -> Result<DataNode> {
            Ok(DataNode::value(format!("0x{value:x}")))
        }
    }

    #[test]
    fn registry_override_applies_to_nested_values() {
        let mut manager = SerializationManager::new();
        manager.registry_mut().register::<u32, _>(HexSerializer);
        let node = manager.write(&vec![255u32, 16]).unwrap();
        assert_eq!(node.to_string(), "[0xff, 0x10]");
        assert_eq!(manager.read::<Vec<u32>>(&node).unwrap(), vec![255, 16]);
    }

    #[test]
    fn context_override_wins_for_one_call() {
        let manager = SerializationManager::new();
        let mut overrides = SerializerRegistry::new();
        overrides.register::<u32, _>(HexSerializer);
        let ctx = SerializationContext::new().with_overrides(&overrides);

        assert_eq!(manager.read_with::<u32>(&DataNode::value("0x20"), &ctx).unwrap(), 32);
        assert!(manager.read::<u32>(&DataNode::value("0x20")).is_err());
    }

    #[test]
    fn initialize_twice_fails() {
        let mut manager = SerializationManager::new();
        manager.initialize().unwrap();
        assert!(matches!(manager.initialize(), Err(SerializationError::AlreadyInitialized)));
        manager.clear();
        manager.initialize().unwrap();
    }

    #[test]
    fn depth_limit() {
        let manager = SerializationManager::with_config(SerializationConfig {
            max_depth: 3,
            ..SerializationConfig::default()
        });
        let node = manager.write(&vec![vec![vec![1u8]]]).unwrap();
        assert!(matches!(
            manager.read::<Vec<Vec<Vec<u8>>>>(&node).unwrap_err().root_cause(),
            SerializationError::DepthLimitExceeded { limit: 3, .. }
        ));
        assert!(!manager.validate::<Vec<Vec<Vec<u8>>>>(&node).is_valid());
    }
}
