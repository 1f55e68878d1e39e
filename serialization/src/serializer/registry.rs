use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use super::constants::{ConstantSet, ConstantTable};
use super::polymorphic::{PolymorphicBase, PolymorphicTypes};
use super::{DataType, TypeSerializer};

/// Key of a registered serializer: the target type plus, for serializers
/// that only apply when a field asks for them, the serializer's own type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SerializerKey {
    target: TypeId,
    marker: Option<TypeId>,
}

struct Entry {
    /// `Arc<dyn TypeSerializer<T>>` for the key's target type.
    serializer: Box<dyn Any + Send + Sync>,
    name: &'static str,
}

/// Serializers and constant sets known to a manager or a call context.
///
/// Registration takes `&mut self`, so a registry is filled in before it is
/// shared and is read-only afterwards.
#[derive(Default)]
pub struct SerializerRegistry {
    serializers: HashMap<SerializerKey, Entry>,
    constants: HashMap<TypeId, ConstantTable>,
    /// `PolymorphicTypes<B>` keyed by the trait object type `B`.
    polymorphic: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl SerializerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default representation of `T` wherever it is read or written.
    pub fn register<T: 'static, S: TypeSerializer<T>>(&mut self, serializer: S) -> &mut Self {
        self.insert::<T, S>(None, serializer)
    }

    /// Make `S` available to fields that name it with
    /// `#[data_field(serializer = S)]`. Other uses of `T` are unaffected.
    pub fn register_custom<T: 'static, S: TypeSerializer<T>>(&mut self, serializer: S) -> &mut Self {
        self.insert::<T, S>(Some(TypeId::of::<S>()), serializer)
    }

    /// Make a constant set available to `#[data_field(constants = C)]` fields.
    pub fn register_constants<C: ConstantSet>(&mut self) -> &mut Self {
        let table = ConstantTable::of::<C>();
        log::debug!(
            "Registered {} set {} ({} constants)",
            if table.flags { "flag" } else { "constant" },
            table.name,
            table.entries.len()
        );
        self.constants.insert(TypeId::of::<C>(), table);
        self
    }

    /// Make `C` readable as a `Box<B>` from nodes tagged `!type:{name}`.
    ///
    /// `wrap` boxes the concrete value, usually `|c| Box::new(c)`.
    pub fn register_polymorphic<B, C>(&mut self, name: &str, wrap: fn(C) -> Box<B>) -> &mut Self
    where
        B: ?Sized + PolymorphicBase,
        C: DataType,
    {
        let types = self
            .polymorphic
            .entry(TypeId::of::<B>())
            .or_insert_with(|| Box::new(PolymorphicTypes::<B>::new()));
        let replaced = types
            .downcast_mut::<PolymorphicTypes<B>>()
            .is_some_and(|types| types.insert(name, wrap));
        if replaced {
            log::warn!("Polymorphic type `{name}` of {} replaced", std::any::type_name::<B>());
        } else {
            log::debug!(
                "Registered {} as `{name}` for {}",
                C::type_name(),
                std::any::type_name::<B>()
            );
        }
        self
    }

    pub(crate) fn polymorphic<B: ?Sized + PolymorphicBase>(&self) -> Option<&PolymorphicTypes<B>> {
        self.polymorphic.get(&TypeId::of::<B>())?.downcast_ref()
    }

    /// Serializer replacing the default representation of `T`, if any.
    pub fn get<T: 'static>(&self) -> Option<Arc<dyn TypeSerializer<T>>> {
        self.lookup::<T>(SerializerKey {
            target: TypeId::of::<T>(),
            marker: None,
        })
    }

    /// Field-level serializer `S` for `T`, if registered.
    pub fn get_custom<T: 'static, S: 'static>(&self) -> Option<Arc<dyn TypeSerializer<T>>> {
        self.lookup::<T>(SerializerKey {
            target: TypeId::of::<T>(),
            marker: Some(TypeId::of::<S>()),
        })
    }

    pub fn constants<C: ConstantSet>(&self) -> Option<&ConstantTable> {
        self.constants.get(&TypeId::of::<C>())
    }

    /// Names of all registered serializers, for diagnostics.
    pub fn serializer_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.serializers.values().map(|e| e.name)
    }

    pub fn len(&self) -> usize {
        self.serializers.len() + self.constants.len() + self.polymorphic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serializers.is_empty() && self.constants.is_empty() && self.polymorphic.is_empty()
    }

    pub fn clear(&mut self) {
        self.serializers.clear();
        self.constants.clear();
        self.polymorphic.clear();
    }

    fn insert<T: 'static, S: TypeSerializer<T>>(
        &mut self,
        marker: Option<TypeId>,
        serializer: S,
    ) -> &mut Self {
        let key = SerializerKey {
            target: TypeId::of::<T>(),
            marker,
        };
        let shared: Arc<dyn TypeSerializer<T>> = Arc::new(serializer);
        let name = std::any::type_name::<S>();
        if self
            .serializers
            .insert(
                key,
                Entry {
                    serializer: Box::new(shared),
                    name,
                },
            )
            .is_some()
        {
            log::warn!("Serializer for {} replaced by {name}", std::any::type_name::<T>());
        } else {
            log::debug!("Registered serializer {name} for {}", std::any::type_name::<T>());
        }
        self
    }

    fn lookup<T: 'static>(&self, key: SerializerKey) -> Option<Arc<dyn TypeSerializer<T>>> {
        if self.serializers.is_empty() {
            return None;
        }
        self.serializers
            .get(&key)?
            .serializer
            .downcast_ref::<Arc<dyn TypeSerializer<T>>>()
            .cloned()
    }
}

impl std::fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializerRegistry")
            .field("serializers", &self.serializers.len())
            .field("constants", &self.constants.len())
            .field("polymorphic", &self.polymorphic.len())
            .finish()
    }
}
