//! Vectors are written as comma-separated components (`"1.5,2"`), colors as
//! hex strings.

use glam::{IVec2, IVec3, Vec2, Vec3, Vec4};

use super::DataType;
use super::primitives::{expect_value, parse_value};
use crate::color::Color;
use crate::context::SerializationContext;
use crate::error::{Result, SerializationError};
use crate::manager::SerializationManager;
use crate::node::DataNode;
use crate::validation::ValidationNode;

fn parse_components<T, const N: usize>(node: &DataNode, type_name: &'static str) -> Result<[T; N]>
where
    T: std::str::FromStr + Copy + Default,
    T::Err: std::fmt::Display,
{
    let value = expect_value(node, type_name)?;
    let mut out = [T::default(); N];
    let mut parts = value.value().split(',');
    for slot in out.iter_mut() {
        let part = parts
            .next()
            .ok_or_else(|| SerializationError::parse(type_name, value, format!("expected {N} components")))?;
        *slot = part
            .trim()
            .parse()
            .map_err(|e| SerializationError::parse(type_name, value, e))?;
    }
    if parts.next().is_some() {
        return Err(SerializationError::parse(type_name, value, format!("expected {N} components")));
    }
    Ok(out)
}

fn join_components<T: std::fmt::Display>(components: &[T]) -> DataNode {
    let text = components
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",");
    DataNode::value(text)
}

macro_rules! impl_vector_data_type {
    ($ty:ty, $scalar:ty, $n:literal, $name:literal) => {
        impl DataType for $ty {
            fn type_name() -> &'static str {
                $name
            }

            fn read(node: &DataNode, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<Self> {
                parse_components::<$scalar, $n>(node, $name).map(<$ty>::from_array)
            }

            fn write(&self, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<DataNode> {
                Ok(join_components(&self.to_array()))
            }

            fn create_copy(&self, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<Self> {
                Ok(*self)
            }

            fn validate(node: &DataNode, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> ValidationNode {
                ValidationNode::from_result(node, parse_components::<$scalar, $n>(node, $name))
            }
        }
    };
}

impl_vector_data_type!(Vec2, f32, 2, "Vec2");
impl_vector_data_type!(Vec3, f32, 3, "Vec3");
impl_vector_data_type!(Vec4, f32, 4, "Vec4");
impl_vector_data_type!(IVec2, i32, 2, "IVec2");
impl_vector_data_type!(IVec3, i32, 3, "IVec3");

impl DataType for Color {
    fn type_name() -> &'static str {
        "Color"
    }

    fn read(node: &DataNode, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<Self> {
        parse_value::<Color>(node, "Color")
    }

    fn write(&self, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<DataNode> {
        Ok(DataNode::value(self.to_hex()))
    }

    fn create_copy(&self, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<Self> {
        Ok(*self)
    }

    fn validate(node: &DataNode, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> ValidationNode {
        ValidationNode::from_result(node, parse_value::<Color>(node, "Color"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components() {
        let parsed = parse_components::<f32, 2>(&DataNode::value("1.5, 2"), "Vec2").unwrap();
        assert_eq!(parsed, [1.5, 2.0]);
        assert!(parse_components::<f32, 2>(&DataNode::value("1.5"), "Vec2").is_err());
        assert!(parse_components::<f32, 2>(&DataNode::value("1,2,3"), "Vec2").is_err());
        assert_eq!(join_components(&[1.5f32, 2.0]), DataNode::value("1.5,2"));
    }
}
