//! `serde` support for [`DataNode`], so that any self-describing serde format
//! can produce or consume the node tree directly.
//!
//! Scalars are written as the most specific primitive that reproduces the
//! source text exactly (an integer, a float or a boolean) and as a string
//! otherwise.
//!
//! A tagged node is written as a single-entry map keyed by the tag. YAML
//! turns that into a native tag (`!type:Foo value`) and hands it back
//! through the enum access path. Formats without tags keep the map, and a
//! single-entry map whose key starts with `!` is read back as a tag.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use super::{DataNode, MappingDataNode, SequenceDataNode, ValueDataNode};

impl Serialize for DataNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.tag() {
            Some(tag) => {
                let mut out = serializer.serialize_map(Some(1))?;
                out.serialize_entry(&TagKey(tag), &Untagged(self))?;
                out.end()
            }
            None => serialize_untagged(self, serializer),
        }
    }
}

/// A tag written through `collect_str`, which is where `serde_yaml` looks
/// for tags on single-entry maps.
struct TagKey<'a>(&'a str);

impl Serialize for TagKey<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("!{}", self.0.trim_start_matches('!')))
    }
}

struct Untagged<'a>(&'a DataNode);

impl Serialize for Untagged<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_untagged(self.0, serializer)
    }
}

fn serialize_untagged<S: Serializer>(node: &DataNode, serializer: S) -> Result<S::Ok, S::Error> {
    match node {
        DataNode::Value(value) => serialize_scalar(value, serializer),
        DataNode::Sequence(seq) => {
            let mut out = serializer.serialize_seq(Some(seq.len()))?;
            for item in seq {
                out.serialize_element(item)?;
            }
            out.end()
        }
        DataNode::Mapping(map) => {
            let mut out = serializer.serialize_map(Some(map.len()))?;
            for (key, value) in map.iter() {
                out.serialize_entry(key, value)?;
            }
            out.end()
        }
    }
}

fn serialize_scalar<S: Serializer>(value: &ValueDataNode, serializer: S) -> Result<S::Ok, S::Error> {
    let text = value.value();
    if value.is_null() {
        return serializer.serialize_none();
    }
    match text {
        "true" => return serializer.serialize_bool(true),
        "false" => return serializer.serialize_bool(false),
        _ => {}
    }
    if let Ok(int) = text.parse::<i64>()
        && int.to_string() == text
    {
        return serializer.serialize_i64(int);
    }
    if let Ok(float) = text.parse::<f64>()
        && float.is_finite()
        && float.to_string() == text
    {
        return serializer.serialize_f64(float);
    }
    serializer.serialize_str(text)
}

impl<'de> Deserialize<'de> for DataNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DataNodeVisitor)
    }
}

struct DataNodeVisitor;

impl<'de> Visitor<'de> for DataNodeVisitor {
    type Value = DataNode;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any document node")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<DataNode, E> {
        Ok(DataNode::value(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<DataNode, E> {
        Ok(DataNode::value(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<DataNode, E> {
        Ok(DataNode::value(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<DataNode, E> {
        Ok(DataNode::value(v.to_string()))
    }

    fn visit_char<E: de::Error>(self, v: char) -> Result<DataNode, E> {
        Ok(DataNode::value(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<DataNode, E> {
        Ok(DataNode::value(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<DataNode, E> {
        Ok(DataNode::value(v))
    }

    fn visit_none<E: de::Error>(self) -> Result<DataNode, E> {
        Ok(DataNode::null())
    }

    fn visit_unit<E: de::Error>(self) -> Result<DataNode, E> {
        Ok(DataNode::null())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<DataNode, D::Error> {
        DataNode::deserialize(deserializer)
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(self, deserializer: D) -> Result<DataNode, D::Error> {
        DataNode::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<DataNode, A::Error> {
        let mut items = SequenceDataNode::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<DataNode>()? {
            items.push(item);
        }
        Ok(DataNode::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<DataNode, A::Error> {
        let mut entries = MappingDataNode::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<DataNode, DataNode>()? {
            if !entries.try_add(key.clone(), value) {
                return Err(de::Error::custom(format!("duplicate mapping key `{key}`")));
            }
        }
        let tag = match entries.len() {
            1 => entries.keys().next().and_then(tag_key).map(str::to_owned),
            _ => None,
        };
        if let Some(tag) = tag {
            let (_, node) = entries
                .into_iter()
                .next()
                .ok_or_else(|| <A::Error as de::Error>::custom("tagged mapping without a value"))?;
            return Ok(node.with_tag(tag));
        }
        Ok(DataNode::Mapping(entries))
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<DataNode, A::Error> {
        let (tag, variant): (String, _) = data.variant()?;
        let node: DataNode = variant.newtype_variant()?;
        let tag = if tag.starts_with('!') { tag } else { format!("!{tag}") };
        Ok(node.with_tag(tag))
    }
}

/// `!tag` text of an untagged value key, as written for tagged nodes by
/// formats without native tags.
fn tag_key(key: &DataNode) -> Option<&str> {
    let value = key.as_value()?;
    let text = value.value();
    (value.tag().is_none() && text.len() > 1 && text.starts_with('!')).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visitor_builds_value_nodes() {
        let v: Result<DataNode, de::value::Error> = DataNodeVisitor.visit_i64(-3);
        assert_eq!(v.unwrap(), DataNode::value("-3"));
        let v: Result<DataNode, de::value::Error> = DataNodeVisitor.visit_bool(true);
        assert_eq!(v.unwrap(), DataNode::value("true"));
        let v: Result<DataNode, de::value::Error> = DataNodeVisitor.visit_unit();
        assert!(v.unwrap().is_null());
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_round_trip_keeps_text() {
        let text = "name: goblin\nhp: 10\nspeed: 1.5\nflags: [a, b]\n";
        let node: DataNode = serde_yaml::from_str(text).unwrap();
        let map = node.as_mapping().unwrap();
        assert_eq!(map.get("hp"), Some(&DataNode::value("10")));
        assert_eq!(map.get("speed"), Some(&DataNode::value("1.5")));

        let written = serde_yaml::to_string(&node).unwrap();
        let reparsed: DataNode = serde_yaml::from_str(&written).unwrap();
        assert_eq!(node, reparsed);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_round_trip_keeps_tags() {
        let node = DataNode::Mapping(
            MappingDataNode::new()
                .with("shape", DataNode::value("Circle").with_tag("!type:Circle"))
                .with(
                    "body",
                    DataNode::Mapping(MappingDataNode::new().with("radius", "2")).with_tag("!type:Disc"),
                ),
        );
        let written = serde_yaml::to_string(&node).unwrap();
        assert!(written.contains("!type:Circle"), "{written}");
        let reparsed: DataNode = serde_yaml::from_str(&written).unwrap();
        assert_eq!(reparsed, node);
    }

    #[test]
    fn tag_keys_are_recognized() {
        assert_eq!(tag_key(&DataNode::value("!type:Foo")), Some("!type:Foo"));
        assert_eq!(tag_key(&DataNode::value("!")), None);
        assert_eq!(tag_key(&DataNode::value("type")), None);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_duplicate_keys_rejected() {
        let text = "a: 1\na: 2\n";
        assert!(serde_yaml::from_str::<DataNode>(text).is_err());
    }
}
