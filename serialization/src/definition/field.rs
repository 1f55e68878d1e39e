//! Field accessors.
//!
//! A definition stores one type-erased [`FieldAccess`] per data field. Each
//! accessor pairs a getter/setter with the way the field's value is turned
//! into nodes:
//!
//! - [`TypedField`] uses the field type's own [`DataType`] implementation,
//!   dispatched through the manager so registry overrides still apply.
//! - [`CustomField`] uses a serializer named on the field and resolved from
//!   the manager's registry on first use.
//! - [`ConstantsField`] reads and writes an integer through a registered
//!   [`ConstantSet`].

use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use crate::context::SerializationContext;
use crate::error::{Result, SerializationError};
use crate::manager::SerializationManager;
use crate::node::DataNode;
use crate::serializer::{ConstantRepr, ConstantSet, ConstantTable, DataType, TypeSerializer};
use crate::validation::{ErrorKind, ValidationNode};

pub(crate) trait FieldAccess<T>: Send + Sync {
    fn type_name(&self) -> &'static str;

    /// Replace the field with the value read from `node`. When `update` is
    /// set, nested definitions only receive the keys present in `node`.
    fn read(
        &self,
        target: &mut T,
        node: &DataNode,
        update: bool,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()>;

    fn write(&self, source: &T, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<DataNode>;

    fn copy(
        &self,
        source: &T,
        target: &mut T,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()>;

    fn validate(&self, node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> ValidationNode;

    /// Pre-flight check run by [`SerializationManager::initialize`].
    fn check(&self, _manager: &SerializationManager) -> Result<()> {
        Ok(())
    }
}

pub(crate) type Getter<T, F> = fn(&T) -> &F;
pub(crate) type GetterMut<T, F> = fn(&mut T) -> &mut F;

fn reject_null(node: &DataNode, type_name: &'static str) -> Result<()> {
    if node.is_null() {
        return Err(SerializationError::NullNotAllowed {
            type_name,
            mark: node.start(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// TypedField
// ---------------------------------------------------------------------------

pub(crate) struct TypedField<T, F> {
    pub get: Getter<T, F>,
    pub get_mut: GetterMut<T, F>,
}

impl<T: 'static, F: DataType> FieldAccess<T> for TypedField<T, F> {
    fn type_name(&self) -> &'static str {
        F::type_name()
    }

    fn read(
        &self,
        target: &mut T,
        node: &DataNode,
        update: bool,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        let field = (self.get_mut)(target);
        if update {
            manager.read_into_with(field, node, ctx)
        } else {
            *field = manager.read_with::<F>(node, ctx)?;
            Ok(())
        }
    }

    fn write(&self, source: &T, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<DataNode> {
        manager.write_with((self.get)(source), ctx)
    }

    fn copy(
        &self,
        source: &T,
        target: &mut T,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        manager.copy_to_with((self.get)(source), (self.get_mut)(target), ctx)
    }

    fn validate(&self, node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> ValidationNode {
        manager.validate_with::<F>(node, ctx)
    }
}

// ---------------------------------------------------------------------------
// CustomField
// ---------------------------------------------------------------------------

pub(crate) struct CustomField<T, F, S> {
    pub get: Getter<T, F>,
    pub get_mut: GetterMut<T, F>,
    resolved: OnceLock<Arc<dyn TypeSerializer<F>>>,
    _serializer: PhantomData<fn() -> S>,
}

impl<T, F: 'static, S: 'static> CustomField<T, F, S> {
    pub fn new(get: Getter<T, F>, get_mut: GetterMut<T, F>) -> Self {
        Self {
            get,
            get_mut,
            resolved: OnceLock::new(),
            _serializer: PhantomData,
        }
    }

    fn serializer(&self, manager: &SerializationManager) -> Result<&Arc<dyn TypeSerializer<F>>> {
        if let Some(serializer) = self.resolved.get() {
            return Ok(serializer);
        }
        let serializer = manager
            .registry()
            .get_custom::<F, S>()
            .ok_or(SerializationError::UnknownSerializer {
                type_name: std::any::type_name::<F>(),
                serializer: std::any::type_name::<S>(),
            })?;
        Ok(self.resolved.get_or_init(|| serializer))
    }
}

impl<T, F, S> FieldAccess<T> for CustomField<T, F, S>
where
    T: 'static,
    F: Send + Sync + 'static,
    S: TypeSerializer<F>,
{
    fn type_name(&self) -> &'static str {
        std::any::type_name::<F>()
    }

    fn read(
        &self,
        target: &mut T,
        node: &DataNode,
        _update: bool,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        reject_null(node, self.type_name())?;
        let value = self.serializer(manager)?.read(node, manager, ctx)?;
        *(self.get_mut)(target) = value;
        Ok(())
    }

    fn write(&self, source: &T, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<DataNode> {
        self.serializer(manager)?.write((self.get)(source), manager, ctx)
    }

    fn copy(
        &self,
        source: &T,
        target: &mut T,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        self.serializer(manager)?
            .copy_to((self.get)(source), (self.get_mut)(target), manager, ctx)
    }

    fn validate(&self, node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> ValidationNode {
        if let Err(e) = reject_null(node, self.type_name()) {
            return ValidationNode::error(ErrorKind::NullNotAllowed, node.clone(), e.to_string());
        }
        match self.serializer(manager) {
            Ok(serializer) => serializer.validate(node, manager, ctx),
            Err(e) => ValidationNode::error(ErrorKind::Malformed, node.clone(), e.to_string()),
        }
    }

    fn check(&self, manager: &SerializationManager) -> Result<()> {
        self.serializer(manager).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// ConstantsField
// ---------------------------------------------------------------------------

pub(crate) struct ConstantsField<T, F, C> {
    pub get: Getter<T, F>,
    pub get_mut: GetterMut<T, F>,
    _set: PhantomData<fn() -> C>,
}

impl<T, F, C> ConstantsField<T, F, C> {
    pub fn new(get: Getter<T, F>, get_mut: GetterMut<T, F>) -> Self {
        Self {
            get,
            get_mut,
            _set: PhantomData,
        }
    }
}

fn constant_table<C: ConstantSet>(manager: &SerializationManager) -> Result<&ConstantTable> {
    manager
        .registry()
        .constants::<C>()
        .ok_or(SerializationError::UnknownSerializer {
            type_name: C::name(),
            serializer: "constant set",
        })
}

fn read_constant<F: ConstantRepr>(table: &ConstantTable, node: &DataNode) -> Result<F> {
    let raw = table.read(node)?;
    F::from_i64(raw).ok_or_else(|| {
        SerializationError::Custom(format!(
            "{raw} does not fit in {}",
            std::any::type_name::<F>()
        ))
    })
}

impl<T, F, C> FieldAccess<T> for ConstantsField<T, F, C>
where
    T: 'static,
    F: ConstantRepr,
    C: ConstantSet,
{
    fn type_name(&self) -> &'static str {
        C::name()
    }

    fn read(
        &self,
        target: &mut T,
        node: &DataNode,
        _update: bool,
        manager: &SerializationManager,
        _ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        reject_null(node, C::name())?;
        *(self.get_mut)(target) = read_constant::<F>(constant_table::<C>(manager)?, node)?;
        Ok(())
    }

    fn write(&self, source: &T, manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<DataNode> {
        let value = (self.get)(source).to_i64();
        Ok(constant_table::<C>(manager)?.write(value))
    }

    fn copy(
        &self,
        source: &T,
        target: &mut T,
        _manager: &SerializationManager,
        _ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        *(self.get_mut)(target) = *(self.get)(source);
        Ok(())
    }

    fn validate(&self, node: &DataNode, manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> ValidationNode {
        if node.is_null() {
            return ValidationNode::error(
                ErrorKind::NullNotAllowed,
                node.clone(),
                format!("null is not allowed for {}", C::name()),
            );
        }
        let table = match constant_table::<C>(manager) {
            Ok(table) => table,
            Err(e) => return ValidationNode::error(ErrorKind::Malformed, node.clone(), e.to_string()),
        };
        let names = table.validate(node);
        if !names.is_valid() {
            return names;
        }
        // Every name resolves; the combined value must still fit the field.
        match read_constant::<F>(table, node) {
            Ok(_) => names,
            Err(e) => ValidationNode::error(ErrorKind::Malformed, node.clone(), e.to_string()),
        }
    }

    fn check(&self, manager: &SerializationManager) -> Result<()> {
        constant_table::<C>(manager).map(|_| ())
    }
}
