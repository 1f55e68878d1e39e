use super::field::{ConstantsField, CustomField, FieldAccess, TypedField};
use super::{DataDefinition, FieldDefinition, FieldEntry, InheritanceBehavior};
use crate::serializer::{ConstantRepr, ConstantSet, DataType, TypeSerializer};

/// Assembles a [`DataDefinition`] field by field.
///
/// Modifiers such as [`required`](Self::required) apply to the most
/// recently added field.
///
/// ```ignore
/// DataDefinition::<Weapon>::builder()
///     .field::<String>("id", |w| &w.id, |w| &mut w.id)
///     .required()
///     .field::<f32>("damage", |w| &w.damage, |w| &mut w.damage)
///     .build()
/// ```
pub struct DataDefinitionBuilder<T> {
    fields: Vec<FieldEntry<T>>,
    after_read: Option<fn(&mut T)>,
}

impl<T: Default + Send + Sync + 'static> DataDefinitionBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            fields: Vec::new(),
            after_read: None,
        }
    }

    /// A field read and written through its type's [`DataType`] implementation.
    pub fn field<F: DataType>(self, key: &'static str, get: fn(&T) -> &F, get_mut: fn(&mut T) -> &mut F) -> Self {
        self.push(key, F::type_name(), Box::new(TypedField { get, get_mut }))
    }

    /// A field read and written by the registered custom serializer `S`.
    pub fn custom_field<F, S>(self, key: &'static str, get: fn(&T) -> &F, get_mut: fn(&mut T) -> &mut F) -> Self
    where
        F: Send + Sync + 'static,
        S: TypeSerializer<F>,
    {
        self.push(
            key,
            std::any::type_name::<F>(),
            Box::new(CustomField::<T, F, S>::new(get, get_mut)),
        )
    }

    /// An integer field written as names from the constant set `C`.
    pub fn constants_field<F, C>(self, key: &'static str, get: fn(&T) -> &F, get_mut: fn(&mut T) -> &mut F) -> Self
    where
        F: ConstantRepr,
        C: ConstantSet,
    {
        self.push(
            key,
            C::name(),
            Box::new(ConstantsField::<T, F, C>::new(get, get_mut)),
        )
    }

    pub fn required(mut self) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.definition.required = true;
        }
        self
    }

    /// Higher priorities are read and written first.
    pub fn priority(mut self, priority: i32) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.definition.priority = priority;
        }
        self
    }

    pub fn inheritance(mut self, behavior: InheritanceBehavior) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.definition.inheritance = behavior;
        }
        self
    }

    /// Hook run after every successful read into `T`.
    pub fn after_read(mut self, hook: fn(&mut T)) -> Self {
        self.after_read = Some(hook);
        self
    }

    pub fn build(self) -> DataDefinition<T> {
        DataDefinition::from_fields(self.fields, self.after_read)
    }

    fn push(mut self, key: &'static str, type_name: &'static str, access: Box<dyn FieldAccess<T>>) -> Self {
        self.fields.push(FieldEntry::new(
            FieldDefinition {
                key,
                required: false,
                priority: 0,
                inheritance: InheritanceBehavior::Default,
                type_name,
            },
            access,
        ));
        self
    }
}
