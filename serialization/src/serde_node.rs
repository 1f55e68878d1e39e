//! Bridge between serde and the node tree.
//!
//! [`to_node`] runs any `T: Serialize` through a serializer that builds a
//! [`DataNode`]; [`from_node`] drives any `T: DeserializeOwned` from one.
//! Because value nodes are untyped text, the deserializer parses scalars on
//! demand from the type hint it receives.
//!
//! [`SerdeSerializer`] wraps the bridge as a [`TypeSerializer`], so a plain
//! serde type can be used as a data field without implementing
//! [`DataType`](crate::DataType):
//!
//! ```ignore
//! manager.registry_mut().register_custom::<Palette, _>(SerdeSerializer::<Palette>::new());
//!
//! #[derive(DataDefinition, Default)]
//! struct Theme {
//!     #[data_field(serializer = SerdeSerializer<Palette>)]
//!     palette: Palette,
//! }
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, DeserializeOwned, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde::Serialize;

use crate::context::SerializationContext;
use crate::error::{Result, SerializationError};
use crate::manager::SerializationManager;
use crate::node::{DataNode, MappingDataNode, SequenceDataNode, ValueDataNode};
use crate::serializer::TypeSerializer;
use crate::serializer::primitives::parse_bool;

/// Convert any `T: Serialize` into a [`DataNode`].
pub fn to_node<T: Serialize + ?Sized>(value: &T) -> Result<DataNode> {
    value
        .serialize(NodeSerializer)
        .map_err(|e| SerializationError::Custom(e.0))
}

/// Convert a [`DataNode`] into any `T: DeserializeOwned`.
pub fn from_node<T: DeserializeOwned>(node: &DataNode) -> Result<T> {
    T::deserialize(NodeDeserializer(node.clone())).map_err(|e| SerializationError::Custom(e.0))
}

/// [`TypeSerializer`] for any serde type, via [`to_node`] and [`from_node`].
pub struct SerdeSerializer<T>(PhantomData<fn() -> T>);

impl<T> SerdeSerializer<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for SerdeSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TypeSerializer<T> for SerdeSerializer<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    fn read(&self, node: &DataNode, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<T> {
        from_node(node)
    }

    fn write(&self, value: &T, _manager: &SerializationManager, _ctx: &SerializationContext<'_>) -> Result<DataNode> {
        to_node(value)
    }
}

// ---------------------------------------------------------------------------
// NodeSerializer: T -> DataNode
// ---------------------------------------------------------------------------

struct NodeSerializer;

#[derive(Debug)]
struct NodeError(String);

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NodeError {}

impl serde::ser::Error for NodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        NodeError(msg.to_string())
    }
}

impl de::Error for NodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        NodeError(msg.to_string())
    }
}

fn text(v: impl ToString) -> std::result::Result<DataNode, NodeError> {
    Ok(DataNode::value(v.to_string()))
}

fn variant_node(variant: &str, inner: DataNode) -> DataNode {
    DataNode::Mapping(MappingDataNode::new().with(variant, inner))
}

impl serde::Serializer for NodeSerializer {
    type Ok = DataNode;
    type Error = NodeError;
    type SerializeSeq = NodeSerializeSeq;
    type SerializeTuple = NodeSerializeSeq;
    type SerializeTupleStruct = NodeSerializeSeq;
    type SerializeTupleVariant = NodeSerializeSeq;
    type SerializeMap = NodeSerializeMap;
    type SerializeStruct = NodeSerializeMap;
    type SerializeStructVariant = NodeSerializeMap;

    fn serialize_bool(self, v: bool) -> std::result::Result<DataNode, NodeError> {
        text(v)
    }
    fn serialize_i8(self, v: i8) -> std::result::Result<DataNode, NodeError> {
        text(v)
    }
    fn serialize_i16(self, v: i16) -> std::result::Result<DataNode, NodeError> {
        text(v)
    }
    fn serialize_i32(self, v: i32) -> std::result::Result<DataNode, NodeError> {
        text(v)
    }
    fn serialize_i64(self, v: i64) -> std::result::Result<DataNode, NodeError> {
        text(v)
    }
    fn serialize_u8(self, v: u8) -> std::result::Result<DataNode, NodeError> {
        text(v)
    }
    fn serialize_u16(self, v: u16) -> std::result::Result<DataNode, NodeError> {
        text(v)
    }
    fn serialize_u32(self, v: u32) -> std::result::Result<DataNode, NodeError> {
        text(v)
    }
    fn serialize_u64(self, v: u64) -> std::result::Result<DataNode, NodeError> {
        text(v)
    }
    fn serialize_f32(self, v: f32) -> std::result::Result<DataNode, NodeError> {
        text(v)
    }
    fn serialize_f64(self, v: f64) -> std::result::Result<DataNode, NodeError> {
        text(v)
    }
    fn serialize_char(self, v: char) -> std::result::Result<DataNode, NodeError> {
        text(v)
    }
    fn serialize_str(self, v: &str) -> std::result::Result<DataNode, NodeError> {
        text(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> std::result::Result<DataNode, NodeError> {
        Ok(DataNode::Sequence(
            v.iter().map(|b| DataNode::value(b.to_string())).collect(),
        ))
    }

    fn serialize_none(self) -> std::result::Result<DataNode, NodeError> {
        Ok(DataNode::null())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> std::result::Result<DataNode, NodeError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> std::result::Result<DataNode, NodeError> {
        Ok(DataNode::null())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> std::result::Result<DataNode, NodeError> {
        Ok(DataNode::null())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> std::result::Result<DataNode, NodeError> {
        text(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> std::result::Result<DataNode, NodeError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> std::result::Result<DataNode, NodeError> {
        Ok(variant_node(variant, value.serialize(NodeSerializer)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> std::result::Result<NodeSerializeSeq, NodeError> {
        Ok(NodeSerializeSeq {
            variant: None,
            items: SequenceDataNode::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> std::result::Result<NodeSerializeSeq, NodeError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> std::result::Result<NodeSerializeSeq, NodeError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> std::result::Result<NodeSerializeSeq, NodeError> {
        Ok(NodeSerializeSeq {
            variant: Some(variant),
            items: SequenceDataNode::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> std::result::Result<NodeSerializeMap, NodeError> {
        Ok(NodeSerializeMap {
            variant: None,
            entries: MappingDataNode::with_capacity(len.unwrap_or(0)),
            current_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> std::result::Result<NodeSerializeMap, NodeError> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> std::result::Result<NodeSerializeMap, NodeError> {
        Ok(NodeSerializeMap {
            variant: Some(variant),
            entries: MappingDataNode::with_capacity(len),
            current_key: None,
        })
    }
}

struct NodeSerializeSeq {
    variant: Option<&'static str>,
    items: SequenceDataNode,
}

impl NodeSerializeSeq {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> std::result::Result<(), NodeError> {
        self.items.push(value.serialize(NodeSerializer)?);
        Ok(())
    }

    fn finish(self) -> std::result::Result<DataNode, NodeError> {
        let seq = DataNode::Sequence(self.items);
        Ok(match self.variant {
            Some(variant) => variant_node(variant, seq),
            None => seq,
        })
    }
}

impl serde::ser::SerializeSeq for NodeSerializeSeq {
    type Ok = DataNode;
    type Error = NodeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> std::result::Result<(), NodeError> {
        self.push(value)
    }

    fn end(self) -> std::result::Result<DataNode, NodeError> {
        self.finish()
    }
}

impl serde::ser::SerializeTuple for NodeSerializeSeq {
    type Ok = DataNode;
    type Error = NodeError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> std::result::Result<(), NodeError> {
        self.push(value)
    }

    fn end(self) -> std::result::Result<DataNode, NodeError> {
        self.finish()
    }
}

impl serde::ser::SerializeTupleStruct for NodeSerializeSeq {
    type Ok = DataNode;
    type Error = NodeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> std::result::Result<(), NodeError> {
        self.push(value)
    }

    fn end(self) -> std::result::Result<DataNode, NodeError> {
        self.finish()
    }
}

impl serde::ser::SerializeTupleVariant for NodeSerializeSeq {
    type Ok = DataNode;
    type Error = NodeError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> std::result::Result<(), NodeError> {
        self.push(value)
    }

    fn end(self) -> std::result::Result<DataNode, NodeError> {
        self.finish()
    }
}

struct NodeSerializeMap {
    variant: Option<&'static str>,
    entries: MappingDataNode,
    current_key: Option<DataNode>,
}

impl NodeSerializeMap {
    fn finish(self) -> std::result::Result<DataNode, NodeError> {
        let map = DataNode::Mapping(self.entries);
        Ok(match self.variant {
            Some(variant) => variant_node(variant, map),
            None => map,
        })
    }
}

impl serde::ser::SerializeMap for NodeSerializeMap {
    type Ok = DataNode;
    type Error = NodeError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> std::result::Result<(), NodeError> {
        self.current_key = Some(key.serialize(NodeSerializer)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> std::result::Result<(), NodeError> {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| NodeError("serialize_value called before serialize_key".into()))?;
        self.entries.insert(key, value.serialize(NodeSerializer)?);
        Ok(())
    }

    fn end(self) -> std::result::Result<DataNode, NodeError> {
        self.finish()
    }
}

impl serde::ser::SerializeStruct for NodeSerializeMap {
    type Ok = DataNode;
    type Error = NodeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> std::result::Result<(), NodeError> {
        self.entries.insert(key, value.serialize(NodeSerializer)?);
        Ok(())
    }

    fn end(self) -> std::result::Result<DataNode, NodeError> {
        self.finish()
    }
}

impl serde::ser::SerializeStructVariant for NodeSerializeMap {
    type Ok = DataNode;
    type Error = NodeError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> std::result::Result<(), NodeError> {
        self.entries.insert(key, value.serialize(NodeSerializer)?);
        Ok(())
    }

    fn end(self) -> std::result::Result<DataNode, NodeError> {
        self.finish()
    }
}

// ---------------------------------------------------------------------------
// NodeDeserializer: DataNode -> T
// ---------------------------------------------------------------------------

struct NodeDeserializer(DataNode);

impl NodeDeserializer {
    fn scalar(&self, expected: &str) -> std::result::Result<&ValueDataNode, NodeError> {
        match &self.0 {
            DataNode::Value(value) => Ok(value),
            other => Err(NodeError(format!(
                "expected {expected}, found {} at {}",
                other.kind(),
                other.start()
            ))),
        }
    }

    fn parse<T>(&self, expected: &str) -> std::result::Result<T, NodeError>
    where
        T: std::str::FromStr,
        T::Err: fmt::Display,
    {
        let value = self.scalar(expected)?;
        value
            .value()
            .trim()
            .parse()
            .map_err(|e| NodeError(format!("cannot parse `{}` as {expected}: {e}", value.value())))
    }
}

macro_rules! deserialize_parsed {
    ($($method:ident => $ty:ty, $visit:ident;)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, NodeError> {
                let parsed: $ty = self.parse(stringify!($ty))?;
                visitor.$visit(parsed)
            }
        )*
    };
}

impl<'de> serde::Deserializer<'de> for NodeDeserializer {
    type Error = NodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, NodeError> {
        match self.0 {
            DataNode::Value(value) if value.is_null() => visitor.visit_unit(),
            DataNode::Value(value) => visitor.visit_string(value.into_value()),
            DataNode::Sequence(seq) => visitor.visit_seq(NodeSeqAccess {
                iter: seq.into_iter(),
            }),
            DataNode::Mapping(map) => visitor.visit_map(NodeMapAccess {
                iter: map.into_iter(),
                pending_value: None,
            }),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, NodeError> {
        let value = self.scalar("bool")?;
        let parsed = parse_bool(value.value())
            .ok_or_else(|| NodeError(format!("cannot parse `{}` as bool", value.value())))?;
        visitor.visit_bool(parsed)
    }

    deserialize_parsed! {
        deserialize_i8 => i8, visit_i8;
        deserialize_i16 => i16, visit_i16;
        deserialize_i32 => i32, visit_i32;
        deserialize_i64 => i64, visit_i64;
        deserialize_u8 => u8, visit_u8;
        deserialize_u16 => u16, visit_u16;
        deserialize_u32 => u32, visit_u32;
        deserialize_u64 => u64, visit_u64;
        deserialize_f32 => f32, visit_f32;
        deserialize_f64 => f64, visit_f64;
        deserialize_char => char, visit_char;
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, NodeError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, NodeError> {
        let value = self.scalar("string")?;
        visitor.visit_str(value.value())
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, NodeError> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, NodeError> {
        match self.0 {
            DataNode::Sequence(seq) => {
                let bytes = seq
                    .into_iter()
                    .map(|item| NodeDeserializer(item).parse::<u8>("u8"))
                    .collect::<std::result::Result<Vec<u8>, _>>()?;
                visitor.visit_byte_buf(bytes)
            }
            DataNode::Value(value) => visitor.visit_byte_buf(value.into_value().into_bytes()),
            DataNode::Mapping(_) => Err(NodeError("expected bytes, found mapping".into())),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, NodeError> {
        if self.0.is_null() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, NodeError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> std::result::Result<V::Value, NodeError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> std::result::Result<V::Value, NodeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, NodeError> {
        match self.0 {
            DataNode::Sequence(seq) => visitor.visit_seq(NodeSeqAccess {
                iter: seq.into_iter(),
            }),
            other => Err(NodeError(format!("expected sequence, found {} at {}", other.kind(), other.start()))),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> std::result::Result<V::Value, NodeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> std::result::Result<V::Value, NodeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, NodeError> {
        match self.0 {
            DataNode::Mapping(map) => visitor.visit_map(NodeMapAccess {
                iter: map.into_iter(),
                pending_value: None,
            }),
            other => Err(NodeError(format!("expected mapping, found {} at {}", other.kind(), other.start()))),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> std::result::Result<V::Value, NodeError> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> std::result::Result<V::Value, NodeError> {
        match self.0 {
            DataNode::Value(value) => visitor.visit_enum(NodeEnumAccess {
                variant: value.into_value(),
                content: None,
            }),
            DataNode::Mapping(map) if map.len() == 1 => {
                let Some((key, content)) = map.into_iter().next() else {
                    return Err(NodeError("expected a single-entry mapping for enum".into()));
                };
                let variant = match key {
                    DataNode::Value(v) => v.into_value(),
                    other => return Err(NodeError(format!("expected variant name, found {}", other.kind()))),
                };
                visitor.visit_enum(NodeEnumAccess {
                    variant,
                    content: Some(content),
                })
            }
            other => Err(NodeError(format!(
                "expected variant name or single-entry mapping, found {} at {}",
                other.kind(),
                other.start()
            ))),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, NodeError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> std::result::Result<V::Value, NodeError> {
        visitor.visit_unit()
    }

    serde::forward_to_deserialize_any! { i128 u128 }
}

// --- SeqAccess ---

struct NodeSeqAccess {
    iter: std::vec::IntoIter<DataNode>,
}

impl<'de> SeqAccess<'de> for NodeSeqAccess {
    type Error = NodeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> std::result::Result<Option<T::Value>, NodeError> {
        match self.iter.next() {
            Some(node) => seed.deserialize(NodeDeserializer(node)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

// --- MapAccess ---

struct NodeMapAccess {
    iter: std::vec::IntoIter<(DataNode, DataNode)>,
    pending_value: Option<DataNode>,
}

impl<'de> MapAccess<'de> for NodeMapAccess {
    type Error = NodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> std::result::Result<Option<K::Value>, NodeError> {
        match self.iter.next() {
            Some((key, value)) => {
                self.pending_value = Some(value);
                seed.deserialize(NodeDeserializer(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> std::result::Result<V::Value, NodeError> {
        let value = self
            .pending_value
            .take()
            .ok_or_else(|| NodeError("next_value_seed called before next_key_seed".into()))?;
        seed.deserialize(NodeDeserializer(value))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

// --- EnumAccess ---

struct NodeEnumAccess {
    variant: String,
    content: Option<DataNode>,
}

impl<'de> de::EnumAccess<'de> for NodeEnumAccess {
    type Error = NodeError;
    type Variant = NodeVariantAccess;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> std::result::Result<(V::Value, NodeVariantAccess), NodeError> {
        let variant = seed.deserialize(NodeDeserializer(DataNode::value(self.variant)))?;
        Ok((variant, NodeVariantAccess(self.content)))
    }
}

struct NodeVariantAccess(Option<DataNode>);

impl<'de> de::VariantAccess<'de> for NodeVariantAccess {
    type Error = NodeError;

    fn unit_variant(self) -> std::result::Result<(), NodeError> {
        match self.0 {
            None => Ok(()),
            Some(node) if node.is_null() => Ok(()),
            Some(_) => Err(NodeError("expected unit variant".into())),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> std::result::Result<T::Value, NodeError> {
        match self.0 {
            Some(node) => seed.deserialize(NodeDeserializer(node)),
            None => Err(NodeError("expected newtype variant".into())),
        }
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> std::result::Result<V::Value, NodeError> {
        match self.0 {
            Some(node) => serde::Deserializer::deserialize_seq(NodeDeserializer(node), visitor),
            None => Err(NodeError("expected tuple variant".into())),
        }
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> std::result::Result<V::Value, NodeError> {
        match self.0 {
            Some(node) => serde::Deserializer::deserialize_map(NodeDeserializer(node), visitor),
            None => Err(NodeError("expected struct variant".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    enum Shape {
        Point,
        Circle(f32),
        Rect { w: u32, h: u32 },
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Palette {
        name: String,
        enabled: bool,
        weights: Vec<f64>,
        shapes: Vec<Shape>,
        extra: Option<BTreeMap<String, i32>>,
    }

    #[test]
    fn struct_round_trip() {
        let palette = Palette {
            name: "warm".into(),
            enabled: true,
            weights: vec![0.5, 1.25],
            shapes: vec![Shape::Point, Shape::Circle(2.0), Shape::Rect { w: 3, h: 4 }],
            extra: None,
        };
        let node = to_node(&palette).unwrap();
        let map = node.as_mapping().unwrap();
        assert_eq!(map.get("name"), Some(&DataNode::value("warm")));
        assert!(map.get("extra").unwrap().is_null());

        let back: Palette = from_node(&node).unwrap();
        assert_eq!(back, palette);
    }

    #[test]
    fn scalars_are_parsed_from_text() {
        let node = DataNode::Mapping(
            MappingDataNode::new()
                .with("name", "cold")
                .with("enabled", "yes")
                .with("weights", SequenceDataNode::from_values(["1", "2.5"]))
                .with("shapes", SequenceDataNode::from_values(["Point"])),
        );
        let palette: Palette = from_node(&node).unwrap();
        assert!(palette.enabled);
        assert_eq!(palette.weights, vec![1.0, 2.5]);
        assert_eq!(palette.extra, None);
    }

    #[test]
    fn parse_failure_is_reported() {
        let node = DataNode::value("many");
        assert!(from_node::<u32>(&node).is_err());
    }
}
