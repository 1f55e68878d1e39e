//! Trait-object values whose concrete type is named by a `!type:` tag.
//!
//! A `Box<dyn Shape>` field cannot be read without knowing which shape to
//! build. Concrete types are registered under a name, the node carries that
//! name as a tag, and reading picks the registered type:
//!
//! ```yaml
//! shape: !type:Circle
//!   radius: 2
//! ```
//!
//! ```ignore
//! trait Shape: PolymorphicBase {
//!     fn area(&self) -> f32;
//! }
//! impl_polymorphic_data_type!(dyn Shape);
//!
//! manager
//!     .registry_mut()
//!     .register_polymorphic::<dyn Shape, Circle>("Circle", |c| Box::new(c));
//! ```
//!
//! Writing looks the concrete type up again and stamps its tag on the node.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;

use super::DataType;
use crate::context::SerializationContext;
use crate::error::{Result, SerializationError};
use crate::manager::SerializationManager;
use crate::node::DataNode;
use crate::validation::ValidationNode;

/// Tag prefix naming the concrete type of a polymorphic value.
pub const TYPE_TAG_PREFIX: &str = "!type:";

/// Supertrait of traits used as polymorphic values. Implemented for every
/// sized `Send + Sync + 'static` type.
pub trait PolymorphicBase: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync> PolymorphicBase for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The registered name in a `!type:Name` tag, if `node` carries one.
pub fn type_tag_name(node: &DataNode) -> Option<&str> {
    node.tag()?.strip_prefix(TYPE_TAG_PREFIX)
}

pub(crate) trait PolymorphicVariant<B: ?Sized>: Send + Sync {
    fn read(
        &self,
        node: &DataNode,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<Box<B>>;

    fn write(&self, value: &B, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<DataNode>;

    fn create_copy(
        &self,
        value: &B,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<Box<B>>;

    fn validate(&self, node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> ValidationNode;
}

struct ConcreteVariant<B: ?Sized, C> {
    wrap: fn(C) -> Box<B>,
    _concrete: PhantomData<fn() -> C>,
}

impl<B: ?Sized + PolymorphicBase, C: DataType> ConcreteVariant<B, C> {
    fn concrete<'v>(&self, value: &'v B) -> Result<&'v C> {
        value.as_any().downcast_ref::<C>().ok_or_else(|| {
            SerializationError::Custom(format!(
                "value of {} is not a {}",
                std::any::type_name::<B>(),
                C::type_name()
            ))
        })
    }
}

impl<B: ?Sized + PolymorphicBase, C: DataType> PolymorphicVariant<B> for ConcreteVariant<B, C> {
    fn read(
        &self,
        node: &DataNode,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<Box<B>> {
        manager.read_with::<C>(node, ctx).map(self.wrap)
    }

    fn write(&self, value: &B, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> Result<DataNode> {
        manager.write_with(self.concrete(value)?, ctx)
    }

    fn create_copy(
        &self,
        value: &B,
        manager: &SerializationManager,
        ctx: &SerializationContext<'_>,
    ) -> Result<Box<B>> {
        manager.copy_with(self.concrete(value)?, ctx).map(self.wrap)
    }

    fn validate(&self, node: &DataNode, manager: &SerializationManager, ctx: &SerializationContext<'_>) -> ValidationNode {
        manager.validate_with::<C>(node, ctx)
    }
}

/// Concrete types registered for one trait object type `B`.
pub(crate) struct PolymorphicTypes<B: ?Sized> {
    by_name: HashMap<String, Box<dyn PolymorphicVariant<B>>>,
    names: HashMap<TypeId, String>,
}

impl<B: ?Sized + PolymorphicBase> PolymorphicTypes<B> {
    pub fn new() -> Self {
        Self {
            by_name: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Returns `true` if `name` was already taken and has been replaced.
    pub fn insert<C: DataType>(&mut self, name: &str, wrap: fn(C) -> Box<B>) -> bool {
        let variant = ConcreteVariant {
            wrap,
            _concrete: PhantomData,
        };
        self.names.insert(TypeId::of::<C>(), name.to_owned());
        self.by_name.insert(name.to_owned(), Box::new(variant)).is_some()
    }

    pub fn by_name(&self, name: &str) -> Option<&dyn PolymorphicVariant<B>> {
        self.by_name.get(name).map(|variant| &**variant)
    }

    /// Registered name and variant of the concrete type behind `value`.
    pub fn by_value(&self, value: &B) -> Option<(&str, &dyn PolymorphicVariant<B>)> {
        let name = self.names.get(&value.as_any().type_id())?;
        Some((name.as_str(), self.by_name(name)?))
    }
}

/// Implement [`DataType`](crate::DataType) for `Box<dyn Trait>`, dispatching
/// on the `!type:` tag to the concrete types registered with
/// [`SerializerRegistry::register_polymorphic`](crate::SerializerRegistry::register_polymorphic).
#[macro_export]
macro_rules! impl_polymorphic_data_type {
    ($base:ty) => {
        impl $crate::DataType for ::std::boxed::Box<$base> {
            fn read(
                node: &$crate::DataNode,
                manager: &$crate::SerializationManager,
                ctx: &$crate::SerializationContext<'_>,
            ) -> $crate::Result<Self> {
                manager.read_polymorphic::<$base>(node, ctx)
            }

            fn write(
                &self,
                manager: &$crate::SerializationManager,
                ctx: &$crate::SerializationContext<'_>,
            ) -> $crate::Result<$crate::DataNode> {
                manager.write_polymorphic::<$base>(&**self, ctx)
            }

            fn create_copy(
                &self,
                manager: &$crate::SerializationManager,
                ctx: &$crate::SerializationContext<'_>,
            ) -> $crate::Result<Self> {
                manager.copy_polymorphic::<$base>(&**self, ctx)
            }

            fn validate(
                node: &$crate::DataNode,
                manager: &$crate::SerializationManager,
                ctx: &$crate::SerializationContext<'_>,
            ) -> $crate::ValidationNode {
                manager.validate_polymorphic::<$base>(node, ctx)
            }
        }
    };
}
