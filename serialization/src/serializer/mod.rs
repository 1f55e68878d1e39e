//! Typed reading and writing of [`DataNode`]s.
//!
//! Two seams are involved:
//!
//! - [`DataType`] is implemented by the type itself and is its default
//!   node representation. Primitives, math types, collections and
//!   `#[derive(DataDefinition)]` structs all implement it.
//! - [`TypeSerializer`] is a stand-alone strategy object. Registered in a
//!   [`SerializerRegistry`], it either replaces a type's default
//!   representation everywhere, or only for fields that name it explicitly
//!   (`#[data_field(serializer = ...)]`).
//!
//! All recursion goes through [`SerializationManager`] so that overrides and
//! nesting limits apply at every level.

mod collections;
pub mod constants;
pub mod enums;
mod math;
pub mod polymorphic;
pub(crate) mod primitives;
pub mod proto_id;
mod registry;

pub use constants::{ConstantRepr, ConstantSet, ConstantTable};
pub use enums::DataEnum;
pub use polymorphic::{PolymorphicBase, TYPE_TAG_PREFIX};
pub use proto_id::{PrototypeKind, ProtoId};
pub use registry::SerializerRegistry;

use crate::context::SerializationContext;
use crate::error::Result;
use crate::manager::SerializationManager;
use crate::node::DataNode;
use crate::validation::ValidationNode;

/// A type with a node representation.
pub trait DataType: Sized + Send + Sync + 'static {
    /// Whether the null literal is an acceptable input.
    const NULLABLE: bool = false;

    /// Name used in error messages.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }

    fn read(
        node: &DataNode,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<Self>;

    /// Read into an existing value. Definitions override this to update only
    /// the fields present in `node`.
    fn read_into(
        &mut self,
        node: &DataNode,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        *self = Self::read(node, manager, ctx)?;
        Ok(())
    }

    fn write(
        &self,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<DataNode>;

    /// Deep copy into a fresh value.
    fn create_copy(
        &self,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<Self>;

    /// Deep copy into an existing value, reusing its storage where possible.
    fn copy_to(
        &self,
        target: &mut Self,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        *target = self.create_copy(manager, ctx)?;
        Ok(())
    }

    fn validate(
        node: &DataNode,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> ValidationNode;
}

/// Strategy object reading and writing values of `T`.
///
/// Copy and validation default to a write/read round-trip and to attempting
/// a read, respectively.
pub trait TypeSerializer<T>: Send + Sync + 'static {
    fn read(
        &self,
        node: &DataNode,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<T>;

    fn write(
        &self,
        value: &T,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<DataNode>;

    fn create_copy(
        &self,
        source: &T,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<T> {
        let node = self.write(source, manager, ctx)?;
        self.read(&node, manager, ctx)
    }

    fn copy_to(
        &self,
        source: &T,
        target: &mut T,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        *target = self.create_copy(source, manager, ctx)?;
        Ok(())
    }

    fn validate(
        &self,
        node: &DataNode,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> ValidationNode {
        ValidationNode::from_result(node, self.read(node, manager, ctx))
    }
}
