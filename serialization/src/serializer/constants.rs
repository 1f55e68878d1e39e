//! Named integer constants and bit flags.
//!
//! An integer field can be tied to a [`ConstantSet`], after which it is
//! written as names instead of numbers: a single name for plain constants,
//! a sequence of names for flag sets.
//!
//! ```yaml
//! layer: Walls            # constants
//! mask: [Walls, Mobs]     # flags
//! ```

use crate::error::{Result, SerializationError};
use crate::node::{DataNode, SequenceDataNode};
use crate::validation::{ErrorKind, ValidationNode};

/// A named set of integer constants.
pub trait ConstantSet: 'static {
    /// Whether values combine as bit flags.
    const FLAGS: bool = false;

    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }

    fn constants() -> &'static [(&'static str, i64)];
}

/// Integer types that can hold constants.
pub trait ConstantRepr: Copy + Send + Sync + 'static {
    fn to_i64(self) -> i64;
    fn from_i64(value: i64) -> Option<Self>;
}

macro_rules! impl_constant_repr {
    ($($ty:ty),*) => {
        $(
            impl ConstantRepr for $ty {
                fn to_i64(self) -> i64 {
                    self as i64
                }

                fn from_i64(value: i64) -> Option<Self> {
                    <$ty>::try_from(value).ok()
                }
            }
        )*
    };
}

impl_constant_repr!(i8, i16, i32, i64, u8, u16, u32);

impl ConstantRepr for u64 {
    fn to_i64(self) -> i64 {
        self as i64
    }

    fn from_i64(value: i64) -> Option<Self> {
        Some(value as u64)
    }
}

/// Resolved contents of a [`ConstantSet`].
#[derive(Debug, Clone)]
pub struct ConstantTable {
    pub name: &'static str,
    pub flags: bool,
    pub entries: Vec<(&'static str, i64)>,
}

impl ConstantTable {
    pub fn of<C: ConstantSet>() -> Self {
        Self {
            name: C::name(),
            flags: C::FLAGS,
            entries: C::constants().to_vec(),
        }
    }

    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    pub fn name_of(&self, value: i64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| *n)
    }

    /// A constant name, or a raw integer as an escape hatch.
    fn parse_single(&self, text: &str) -> Result<i64> {
        let text = text.trim();
        if let Some(value) = self.value_of(text) {
            return Ok(value);
        }
        text.parse::<i64>()
            .map_err(|_| SerializationError::UnknownConstant {
                set: self.name,
                name: text.to_owned(),
            })
    }

    pub fn read(&self, node: &DataNode) -> Result<i64> {
        match node {
            DataNode::Value(value) => self.parse_single(value.value()),
            DataNode::Sequence(items) if self.flags => {
                let mut bits = 0i64;
                for (index, item) in items.iter().enumerate() {
                    let DataNode::Value(value) = item else {
                        return Err(SerializationError::invalid_node(self.name, "value", item)
                            .in_field(format!("[{index}]")));
                    };
                    bits |= self.parse_single(value.value())?;
                }
                Ok(bits)
            }
            other => Err(SerializationError::invalid_node(
                self.name,
                if self.flags { "value or sequence" } else { "value" },
                other,
            )),
        }
    }

    /// Flag sets are written as the names of the set flags in declaration
    /// order; bits without a name fall back to a raw number.
    pub fn write(&self, value: i64) -> DataNode {
        if !self.flags {
            return match self.name_of(value) {
                Some(name) => DataNode::value(name),
                None => DataNode::value(value.to_string()),
            };
        }
        let mut names = SequenceDataNode::new();
        let mut remaining = value;
        for (name, flag) in &self.entries {
            if *flag != 0 && value & flag == *flag {
                names.push(DataNode::value(*name));
                remaining &= !flag;
            }
        }
        if remaining != 0 {
            return DataNode::value(value.to_string());
        }
        DataNode::Sequence(names)
    }

    pub fn validate(&self, node: &DataNode) -> ValidationNode {
        match node {
            DataNode::Sequence(items) if self.flags => ValidationNode::Sequence(
                items
                    .iter()
                    .map(|item| self.validate_single(item))
                    .collect(),
            ),
            DataNode::Value(_) => self.validate_single(node),
            other => ValidationNode::error(
                ErrorKind::InvalidNodeType,
                other.clone(),
                format!("{} expects a value, found {}", self.name, other.kind()),
            ),
        }
    }

    fn validate_single(&self, node: &DataNode) -> ValidationNode {
        match node {
            DataNode::Value(value) => match self.parse_single(value.value()) {
                Ok(_) => ValidationNode::valid(node.clone()),
                Err(e) => ValidationNode::error(ErrorKind::Malformed, node.clone(), e.to_string()),
            },
            other => ValidationNode::error(
                ErrorKind::InvalidNodeType,
                other.clone(),
                format!("{} expects a value, found {}", self.name, other.kind()),
            ),
        }
    }
}
