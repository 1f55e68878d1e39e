//! # RedLilium Serialization
//!
//! Data marshalling between typed Rust values and a format-neutral node tree.
//!
//! ## Node Model
//!
//! - [`DataNode`]: a value, sequence or mapping with an optional tag and
//!   source marks
//! - [`MappingDataNode::except`] / [`MappingDataNode::push_inheritance`]:
//!   structural diff and parent merge
//! - [`format`]: YAML (and optionally RON) documents to and from nodes
//!
//! ## Typed Marshalling
//!
//! - [`SerializationManager`]: entry point for read, write, copy and validate
//! - [`DataType`]: a type's default node representation
//! - [`TypeSerializer`] / [`SerializerRegistry`]: replaceable strategies,
//!   global or per-field
//! - [`DataDefinition`]: field lists of structured types, usually from
//!   `#[derive(DataDefinition)]`
//! - [`ConstantSet`] / [`DataEnum`]: named integers, flags and enums
//! - [`PolymorphicBase`]: `Box<dyn Trait>` values picked by `!type:` tags
//!
//! ## Validation & Inheritance
//!
//! - [`ValidationNode`] / [`ErrorNode`]: validation results mirroring the
//!   input tree
//! - [`InheritanceResolver`]: parent chains between documents with cycle
//!   detection
//!
//! ```ignore
//! #[derive(Default, DataDefinition)]
//! struct Weapon {
//!     #[data_field(required)]
//!     id: String,
//!     damage: f32,
//! }
//!
//! let mut manager = SerializationManager::new();
//! manager.register_definition::<Weapon>();
//! manager.initialize()?;
//! let weapon: Weapon = manager.read(&node)?;
//! ```

// Lets the derive macros name this crate from inside it as well.
extern crate self as redlilium_serialization;

pub mod color;
pub mod composition;
pub mod config;
pub mod context;
pub mod definition;
mod error;
pub mod format;
mod manager;
pub mod node;
pub mod serde_node;
pub mod serializer;
pub mod validation;

pub use color::Color;
pub use composition::InheritanceResolver;
pub use config::SerializationConfig;
pub use context::{PrototypeIndex, PrototypeLookup, SerializationContext};
pub use definition::{
    DataDefinition, DataDefinitionBuilder, DataDefinitionType, FieldDefinition, InheritanceBehavior,
};
pub use error::{Result, SerializationError};
pub use manager::SerializationManager;
pub use node::{DataNode, MappingDataNode, NodeKind, NodeMark, SequenceDataNode, ValueDataNode};
pub use serde_node::{SerdeSerializer, from_node, to_node};
pub use serialization_macro::{DataDefinition, DataEnum};
pub use serializer::{
    ConstantRepr, ConstantSet, ConstantTable, DataEnum, DataType, PolymorphicBase, PrototypeKind, ProtoId,
    SerializerRegistry, TYPE_TAG_PREFIX, TypeSerializer,
};
pub use validation::{ErrorKind, ErrorNode, ValidationNode};
