use std::fmt::Display;
use std::str::FromStr;

use super::DataType;
use crate::context::SerializationContext;
use crate::error::{Result, SerializationError};
use crate::manager::SerializationManager;
use crate::node::{DataNode, ValueDataNode};
use crate::validation::ValidationNode;

/// The value node behind `node`, or an invalid-node error naming `type_name`.
pub(crate) fn expect_value<'n>(node: &'n DataNode, type_name: &'static str) -> Result<&'n ValueDataNode> {
    match node {
        DataNode::Value(value) => Ok(value),
        other => Err(SerializationError::invalid_node(type_name, "value", other)),
    }
}

pub(crate) fn parse_value<T>(node: &DataNode, type_name: &'static str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let value = expect_value(node, type_name)?;
    value
        .value()
        .trim()
        .parse::<T>()
        .map_err(|e| SerializationError::parse(type_name, value, e))
}

macro_rules! impl_parsed_data_type {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl DataType for $ty {
                fn type_name() -> &'static str {
                    $name
                }

                fn read(
                    node: &DataNode,
                    _manager: &SerializationManager,
                    _ctx: &SerializationContext<'_>,
                ) -> Result<Self> {
                    parse_value::<Self>(node, $name)
                }

                fn write(
                    &self,
                    _manager: &SerializationManager,
                    _ctx: &SerializationContext<'_>,
                ) -> Result<DataNode> {
                    Ok(DataNode::value(self.to_string()))
                }

                fn create_copy(
                    &self,
                    _manager: &SerializationManager,
                    _ctx: &SerializationContext<'_>,
                ) -> Result<Self> {
                    Ok(*self)
                }

                fn validate(
                    node: &DataNode,
                    _manager: &SerializationManager,
                    _ctx: &SerializationContext<'_>,
                ) -> ValidationNode {
                    ValidationNode::from_result(node, parse_value::<Self>(node, $name))
                }
            }
        )*
    };
}

impl_parsed_data_type!(
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    i128 => "i128",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    u128 => "u128",
    usize => "usize",
    f32 => "f32",
    f64 => "f64",
);

// Whitespace is a valid char, so the text is taken as-is.
fn read_char(node: &DataNode) -> Result<char> {
    let value = expect_value(node, "char")?;
    value
        .value()
        .parse::<char>()
        .map_err(|e| SerializationError::parse("char", value, e))
}

impl DataType for char {
    fn type_name() -> &'static str {
        "char"
    }

    fn read(node: &DataNode, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<Self> {
        read_char(node)
    }

    fn write(&self, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<DataNode> {
        Ok(DataNode::value(self.to_string()))
    }

    fn create_copy(&self, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<Self> {
        Ok(*self)
    }

    fn validate(node: &DataNode, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> ValidationNode {
        ValidationNode::from_result(node, read_char(node))
    }
}

/// Accepted boolean spellings, compared case-insensitively.
const TRUE_LITERALS: [&str; 4] = ["true", "yes", "on", "1"];
const FALSE_LITERALS: [&str; 4] = ["false", "no", "off", "0"];

pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if TRUE_LITERALS.iter().any(|l| l.eq_ignore_ascii_case(text)) {
        Some(true)
    } else if FALSE_LITERALS.iter().any(|l| l.eq_ignore_ascii_case(text)) {
        Some(false)
    } else {
        None
    }
}

fn read_bool(node: &DataNode) -> Result<bool> {
    let value = expect_value(node, "bool")?;
    parse_bool(value.value())
        .ok_or_else(|| SerializationError::parse("bool", value, "expected true/false, yes/no, on/off or 1/0"))
}

impl DataType for bool {
    fn type_name() -> &'static str {
        "bool"
    }

    fn read(node: &DataNode, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<Self> {
        read_bool(node)
    }

    fn write(&self, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<DataNode> {
        Ok(DataNode::value(if *self { "true" } else { "false" }))
    }

    fn create_copy(&self, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<Self> {
        Ok(*self)
    }

    fn validate(node: &DataNode, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> ValidationNode {
        ValidationNode::from_result(node, read_bool(node))
    }
}

// Strings keep their text verbatim, surrounding whitespace included.
impl DataType for String {
    fn type_name() -> &'static str {
        "string"
    }

    fn read(node: &DataNode, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<Self> {
        expect_value(node, "string").map(|v| v.value().to_owned())
    }

    fn read_into(
        &mut self,
        node: &DataNode,
        _manager: &SerializationManager,
        _ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        let value = expect_value(node, "string")?;
        self.clear();
        self.push_str(value.value());
        Ok(())
    }

    fn write(&self, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<DataNode> {
        Ok(DataNode::value(self.as_str()))
    }

    fn create_copy(&self, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<Self> {
        Ok(self.clone())
    }

    fn copy_to(
        &self,
        target: &mut Self,
        _manager: &SerializationManager,
        _ctx: &SerializationContext<'_>,
    ) -> Result<()> {
        target.clone_from(self);
        Ok(())
    }

    fn validate(node: &DataNode, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> ValidationNode {
        ValidationNode::from_result(node, expect_value(node, "string"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_literals() {
        for text in ["true", "Yes", "ON", "1"] {
            assert_eq!(parse_bool(text), Some(true), "{text}");
        }
        for text in ["false", "NO", "off", "0"] {
            assert_eq!(parse_bool(text), Some(false), "{text}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn parse_reports_text_and_type() {
        let err = parse_value::<i32>(&DataNode::value("ten"), "i32").unwrap_err();
        match err {
            SerializationError::Parse { type_name, text, .. } => {
                assert_eq!(type_name, "i32");
                assert_eq!(text, "ten");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn whitespace_chars_round_trip() {
        let manager = SerializationManager::new();
        for c in [' ', '\t', 'x'] {
            let node = manager.write(&c).unwrap();
            assert_eq!(manager.read::<char>(&node).unwrap(), c);
            assert!(manager.validate::<char>(&node).is_valid());
        }
        assert!(manager.read::<char>(&DataNode::value("ab")).is_err());
    }

    #[test]
    fn non_value_is_invalid_node() {
        let node = DataNode::Mapping(Default::default());
        assert!(matches!(
            parse_value::<i32>(&node, "i32"),
            Err(SerializationError::InvalidNodeType { .. })
        ));
    }
}
