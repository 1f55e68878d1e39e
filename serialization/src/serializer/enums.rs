//! Unit-only enums, written by variant name.
//!
//! `#[derive(DataEnum)]` implements [`DataEnum`] and forwards [`DataType`]
//! to the helpers here. Names are matched case-insensitively on read.
//!
//! [`DataType`]: super::DataType

use super::primitives::expect_value;
use crate::error::{Result, SerializationError};
use crate::node::DataNode;
use crate::validation::ValidationNode;

pub trait DataEnum: Sized + 'static {
    /// Variant names in declaration order.
    const VARIANTS: &'static [&'static str];

    fn from_variant_index(index: usize) -> Option<Self>;

    fn variant_index(&self) -> usize;

    fn variant_name(&self) -> &'static str {
        Self::VARIANTS
            .get(self.variant_index())
            .copied()
            .unwrap_or_default()
    }
}

pub fn read_enum<E: DataEnum>(node: &DataNode, type_name: &'static str) -> Result<E> {
    let value = expect_value(node, type_name)?;
    let text = value.value().trim();
    E::VARIANTS
        .iter()
        .position(|name| name.eq_ignore_ascii_case(text))
        .and_then(E::from_variant_index)
        .ok_or_else(|| {
            SerializationError::parse(
                type_name,
                value,
                format!("expected one of {}", E::VARIANTS.join(", ")),
            )
        })
}

pub fn write_enum<E: DataEnum>(value: &E) -> DataNode {
    DataNode::value(value.variant_name())
}

pub fn copy_enum<E: DataEnum>(value: &E, type_name: &'static str) -> Result<E> {
    E::from_variant_index(value.variant_index())
        .ok_or_else(|| SerializationError::Custom(format!("{type_name}: variant index out of range")))
}

pub fn validate_enum<E: DataEnum>(node: &DataNode, type_name: &'static str) -> ValidationNode {
    ValidationNode::from_result(node, read_enum::<E>(node, type_name))
}
