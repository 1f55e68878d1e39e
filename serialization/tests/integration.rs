use glam::Vec2;
use serde::{Deserialize, Serialize};

use redlilium_serialization::{
    Color, ConstantSet, DataDefinition, DataDefinitionType, DataEnum, DataNode, DataType, ErrorKind,
    InheritanceResolver, MappingDataNode, PolymorphicBase, PrototypeIndex, PrototypeKind, PrototypeLookup, ProtoId,
    SequenceDataNode, SerdeSerializer, SerializationConfig, SerializationContext, SerializationError,
    SerializationManager, SerializerRegistry, TypeSerializer, impl_definition_data_type,
    impl_polymorphic_data_type,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ---------------------------------------------------------------------------
// Test data types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, DataEnum)]
enum Size {
    #[default]
    Small,
    Medium,
    Large,
}

struct MobFlags;

impl ConstantSet for MobFlags {
    const FLAGS: bool = true;

    fn name() -> &'static str {
        "MobFlags"
    }

    fn constants() -> &'static [(&'static str, i64)] {
        &[("Flying", 1), ("Undead", 2), ("Boss", 4)]
    }
}

struct EntityKind;

impl PrototypeKind for EntityKind {
    const KIND: &'static str = "entity";
}

#[derive(Debug, Default, PartialEq, DataDefinition)]
#[data_definition(after_read = clamp_health)]
struct Creature {
    #[data_field(required, priority = 10)]
    id: String,
    max_hp: u32,
    health: u32,
    speed: f32,
    position: Vec2,
    tint: Color,
    size: Size,
    #[data_field(inheritance = "always")]
    tags: Vec<String>,
    #[data_field(constants = MobFlags)]
    flags: u32,
    loot: Option<ProtoId<EntityKind>>,
    #[data_field(inheritance = "never")]
    r#abstract: bool,
    #[data_field(skip)]
    reads: usize,
}

impl Creature {
    fn clamp_health(&mut self) {
        if self.health == 0 || self.health > self.max_hp {
            self.health = self.max_hp;
        }
        self.reads += 1;
    }
}

fn manager() -> SerializationManager {
    init_logging();
    let mut manager = SerializationManager::new();
    manager.registry_mut().register_constants::<MobFlags>();
    manager.register_definition::<Creature>();
    manager.initialize().unwrap();
    manager
}

fn goblin() -> MappingDataNode {
    MappingDataNode::new()
        .with("id", "goblin")
        .with("maxHp", "12")
        .with("health", "30")
        .with("speed", "1.5")
        .with("position", "1,2")
        .with("tint", "#33AA33")
        .with("size", "small")
        .with("tags", SequenceDataNode::from_values(["green", "sneaky"]))
        .with("flags", SequenceDataNode::from_values(["Undead", "Flying"]))
        .with("loot", "rusty_dagger")
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

#[test]
fn read_full_definition() {
    let manager = manager();
    let creature: Creature = manager.read(&DataNode::Mapping(goblin())).unwrap();

    assert_eq!(creature.id, "goblin");
    assert_eq!(creature.max_hp, 12);
    assert_eq!(creature.health, 12, "after_read clamps health");
    assert_eq!(creature.speed, 1.5);
    assert_eq!(creature.position, Vec2::new(1.0, 2.0));
    assert_eq!(creature.tint, Color::rgb(0x33, 0xAA, 0x33));
    assert_eq!(creature.size, Size::Small);
    assert_eq!(creature.tags, vec!["green", "sneaky"]);
    assert_eq!(creature.flags, 3);
    assert_eq!(creature.loot, Some(ProtoId::new("rusty_dagger")));
    assert_eq!(creature.reads, 1);
}

#[test]
fn missing_required_field() {
    let manager = manager();
    let mut node = goblin();
    node.remove("id");
    let node = DataNode::Mapping(node);

    let err = manager.read::<Creature>(&node).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        SerializationError::MissingRequiredField { field, .. } if field == "id"
    ));

    let validation = manager.validate::<Creature>(&node);
    let errors = validation.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::MissingRequired);
    assert_eq!(errors[0].node, DataNode::value("id"));
}

#[test]
fn unknown_key_lenient_and_strict() {
    let manager = manager();
    let node = DataNode::Mapping(goblin().with("foo", "bar"));

    assert!(manager.read::<Creature>(&node).is_ok());

    let validation = manager.validate::<Creature>(&node);
    let errors = validation.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::FieldNotFound);
    assert!(validation.relevant_errors().is_empty());

    let strict = SerializationContext::new().strict(true);
    let err = manager.read_with::<Creature>(&node, &strict).unwrap_err();
    assert!(matches!(err, SerializationError::UnknownField { ref field, .. } if field == "foo"));
    assert_eq!(manager.validate_with::<Creature>(&node, &strict).relevant_errors().len(), 1);
}

#[test]
fn strict_from_config() {
    init_logging();
    let config = SerializationConfig::from_toml_str("strict_unknown_fields = true").unwrap();
    let manager = SerializationManager::with_config(config);
    let node = DataNode::Mapping(MappingDataNode::new().with("id", "x").with("color", "red"));
    let err = manager.read::<Creature>(&node).unwrap_err();
    assert!(matches!(err, SerializationError::UnknownField { .. }));
}

#[test]
fn field_errors_carry_path() {
    let manager = manager();
    let node = DataNode::Mapping(goblin().with("tags", SequenceDataNode::from_values(["a", "b"])).with(
        "flags",
        SequenceDataNode::from_values(["Flying", "Swimming"]),
    ));
    let err = manager.read::<Creature>(&node).unwrap_err();
    assert_eq!(err.path(), "flags");
    assert!(matches!(err.root_cause(), SerializationError::UnknownConstant { name, .. } if name == "Swimming"));
}

#[test]
fn every_bad_field_is_reported() {
    let manager = manager();
    let node = DataNode::Mapping(
        goblin()
            .with("maxHp", "lots")
            .with("speed", "fast")
            .with("size", "Gigantic"),
    );
    let validation = manager.validate::<Creature>(&node);
    assert!(!validation.is_valid());
    assert_eq!(validation.errors().len(), 3);
    assert_eq!(validation.relevant_errors().len(), 3);
}

#[test]
fn null_is_rejected_for_plain_fields() {
    let manager = manager();
    let node = DataNode::Mapping(goblin().with("speed", DataNode::null()).with("loot", DataNode::null()));
    let err = manager.read::<Creature>(&node).unwrap_err();
    assert!(matches!(err.root_cause(), SerializationError::NullNotAllowed { .. }));

    let node = DataNode::Mapping(goblin().with("loot", DataNode::null()));
    let creature: Creature = manager.read(&node).unwrap();
    assert_eq!(creature.loot, None);
}

#[test]
fn read_into_updates_present_fields_only() {
    let manager = manager();
    let mut creature: Creature = manager.read(&DataNode::Mapping(goblin())).unwrap();

    let patch = DataNode::Mapping(MappingDataNode::new().with("speed", "3").with("size", "Large"));
    manager.read_into(&mut creature, &patch).unwrap();

    assert_eq!(creature.id, "goblin");
    assert_eq!(creature.speed, 3.0);
    assert_eq!(creature.size, Size::Large);
    assert_eq!(creature.tags.len(), 2);
}

#[test]
fn hooks_can_be_skipped() {
    let manager = manager();
    let ctx = SerializationContext::new().skip_hooks(true);
    let creature: Creature = manager.read_with(&DataNode::Mapping(goblin()), &ctx).unwrap();
    assert_eq!(creature.health, 30);
    assert_eq!(creature.reads, 0);
}

#[test]
fn empty_value_reads_as_empty_mapping() {
    let manager = manager();
    let err = manager.read::<Creature>(&DataNode::value("")).unwrap_err();
    assert!(matches!(err, SerializationError::MissingRequiredField { .. }));

    let err = manager
        .read::<Creature>(&DataNode::Sequence(SequenceDataNode::new()))
        .unwrap_err();
    assert!(matches!(err, SerializationError::InvalidNodeType { .. }));
}

// ---------------------------------------------------------------------------
// Write & copy
// ---------------------------------------------------------------------------

#[test]
fn write_is_sparse_but_keeps_required() {
    let manager = manager();
    let creature = Creature::default();
    let node = manager.write(&creature).unwrap();
    let mapping = node.as_mapping().unwrap();
    assert_eq!(mapping.len(), 1);
    assert_eq!(mapping.get("id"), Some(&DataNode::value("")));

    let creature = Creature {
        id: "bat".into(),
        flags: 1 | 4,
        size: Size::Medium,
        ..Default::default()
    };
    let node = manager.write(&creature).unwrap();
    let mapping = node.as_mapping().unwrap();
    assert_eq!(mapping.len(), 3);
    assert_eq!(mapping.get("size"), Some(&DataNode::value("Medium")));
    assert_eq!(
        mapping.get("flags"),
        Some(&DataNode::Sequence(SequenceDataNode::from_values(["Flying", "Boss"])))
    );
}

#[test]
fn write_then_read_reproduces_value() {
    let manager = manager();
    let ctx = SerializationContext::new().skip_hooks(true);
    let original: Creature = manager.read_with(&DataNode::Mapping(goblin()), &ctx).unwrap();

    let node = manager.write(&original).unwrap();
    let back: Creature = manager.read_with(&node, &ctx).unwrap();
    assert_eq!(back, original);
}

#[test]
fn write_selected_fields() {
    let manager = manager();
    let creature: Creature = manager.read(&DataNode::Mapping(goblin())).unwrap();
    let mapping = manager.write_fields(&creature, &["speed", "size"]).unwrap();
    assert_eq!(mapping.len(), 2);
    assert_eq!(mapping.get("size"), Some(&DataNode::value("Small")));
    assert!(matches!(
        manager.write_fields(&creature, &["wings"]),
        Err(SerializationError::UnknownField { .. })
    ));
}

#[test]
fn copy_is_independent() {
    let manager = manager();
    let original: Creature = manager.read(&DataNode::Mapping(goblin())).unwrap();

    let mut copy = manager.copy(&original).unwrap();
    assert_eq!(copy.tags, original.tags);
    copy.tags.push("angry".into());
    copy.id.push_str("_elite");
    assert_eq!(original.tags.len(), 2);
    assert_eq!(original.id, "goblin");

    let mut target = Creature::default();
    manager.copy_to(&original, &mut target).unwrap();
    assert_eq!(target.position, original.position);
    assert_eq!(target.loot, original.loot);
    assert_eq!(target.reads, 0, "skipped fields are not copied");
}

// ---------------------------------------------------------------------------
// Definitions & initialization
// ---------------------------------------------------------------------------

#[test]
fn priority_orders_fields() {
    let manager = manager();
    let definition = manager.definition::<Creature>();
    let keys: Vec<_> = definition.fields().map(|f| f.key).collect();
    assert_eq!(keys[0], "id");
    assert_eq!(keys[1], "maxHp");
    assert_eq!(keys.len(), 11);
    assert!(definition.field("reads").is_none());
    assert!(definition.field("abstract").is_some());
}

struct HexU32;

impl TypeSerializer<u32> for HexU32 {
    fn read(&self, node: &DataNode, _: &SerializationManager, _: &SerializationContext<'_>) -> redlilium_serialization::Result<u32> {
        let text = node.as_value().map(|v| v.value()).unwrap_or_default();
        u32::from_str_radix(text.trim_start_matches("0x"), 16)
            .map_err(|e| SerializationError::Custom(e.to_string()))
    }

    fn write(&self, value: &u32, _: &SerializationManager, _: &SerializationContext<'_>) -> redlilium_serialization::Result<DataNode> {
        Ok(DataNode::value(format!("0x{value:x}")))
    }
}

#[derive(Debug, Default, DataDefinition)]
struct Door {
    #[data_field(serializer = HexU32)]
    lock_code: u32,
    open: bool,
}

#[test]
fn missing_custom_serializer_fails_initialize() {
    init_logging();
    let mut manager = SerializationManager::new();
    manager.register_definition::<Door>();
    let err = manager.initialize().unwrap_err();
    assert!(matches!(err.root_cause(), SerializationError::UnknownSerializer { .. }));
    assert_eq!(err.path(), "lockCode");
    assert!(!manager.is_initialized());

    manager.registry_mut().register_custom::<u32, HexU32>(HexU32);
    manager.initialize().unwrap();

    let door: Door = manager
        .read(&DataNode::Mapping(MappingDataNode::new().with("lockCode", "0xff").with("open", "yes")))
        .unwrap();
    assert_eq!(door.lock_code, 255);
    assert!(door.open);
    let node = manager.write(&door).unwrap();
    assert_eq!(node.as_mapping().unwrap().get("lockCode"), Some(&DataNode::value("0xff")));

    // Plain u32 values are unaffected by a field-level serializer.
    assert_eq!(manager.write(&255u32).unwrap(), DataNode::value("255"));
}

#[derive(Debug, Default, DataDefinition)]
struct Counter {
    count: u32,
    label: String,
}

fn written_keys(node: &DataNode) -> Vec<String> {
    node.as_mapping()
        .unwrap()
        .keys()
        .map(|k| k.to_string())
        .collect()
}

#[test]
fn sparse_write_is_independent_of_call_order() {
    init_logging();
    let mut hex = SerializerRegistry::new();
    hex.register::<u32, HexU32>(HexU32);
    let ctx = SerializationContext::new().with_overrides(&hex);
    let counter = Counter::default();

    let manager = SerializationManager::new();
    assert!(written_keys(&manager.write_with(&counter, &ctx).unwrap()).is_empty());
    assert!(written_keys(&manager.write(&counter).unwrap()).is_empty());

    let manager = SerializationManager::new();
    assert!(written_keys(&manager.write(&counter).unwrap()).is_empty());
    assert!(written_keys(&manager.write_with(&counter, &ctx).unwrap()).is_empty());

    let busy = Counter {
        count: 16,
        ..Default::default()
    };
    let node = manager.write_with(&busy, &ctx).unwrap();
    assert_eq!(node.as_mapping().unwrap().get("count"), Some(&DataNode::value("0x10")));
    assert_eq!(written_keys(&manager.write(&busy).unwrap()), vec!["count"]);
}

#[derive(Default)]
struct Twins {
    a: u32,
    b: u32,
}

impl DataDefinitionType for Twins {
    fn build_definition() -> DataDefinition<Self> {
        DataDefinition::<Self>::builder()
            .field::<u32>("value", |t| &t.a, |t| &mut t.a)
            .field::<u32>("value", |t| &t.b, |t| &mut t.b)
            .build()
    }
}

impl_definition_data_type!(Twins);

#[test]
fn duplicate_keys_fail_initialize() {
    init_logging();
    let mut manager = SerializationManager::new();
    manager.register_definition::<Twins>();
    assert!(matches!(
        manager.initialize(),
        Err(SerializationError::DuplicateFieldKey { ref key, .. }) if key == "value"
    ));
    assert_eq!(manager.definition::<Twins>().duplicates(), vec!["value"]);
}

#[test]
fn missing_constant_set_fails_initialize() {
    init_logging();
    let mut manager = SerializationManager::new();
    manager.register_definition::<Creature>();
    assert!(manager.initialize().is_err());
    manager.registry_mut().register_constants::<MobFlags>();
    manager.initialize().unwrap();
    assert!(matches!(manager.initialize(), Err(SerializationError::AlreadyInitialized)));
}

struct Tier;

impl ConstantSet for Tier {
    fn constants() -> &'static [(&'static str, i64)] {
        &[("Low", 1), ("High", 200), ("Mythic", 1000)]
    }
}

#[derive(Debug, Default, DataDefinition)]
struct Relic {
    #[data_field(constants = Tier)]
    tier: u8,
}

#[test]
fn constant_out_of_range_fails_read_and_validate() {
    init_logging();
    let mut manager = SerializationManager::new();
    manager.registry_mut().register_constants::<Tier>();
    manager.register_definition::<Relic>();
    manager.initialize().unwrap();

    let relic: Relic = manager
        .read(&DataNode::Mapping(MappingDataNode::new().with("tier", "High")))
        .unwrap();
    assert_eq!(relic.tier, 200);

    for text in ["300", "Mythic"] {
        let node = DataNode::Mapping(MappingDataNode::new().with("tier", text));
        let err = manager.read::<Relic>(&node).unwrap_err();
        assert_eq!(err.path(), "tier");

        let validation = manager.validate::<Relic>(&node);
        let errors = validation.errors();
        assert_eq!(errors.len(), 1, "{text}");
        assert_eq!(errors[0].kind, ErrorKind::Malformed);
        assert_eq!(errors[0].node, DataNode::value(text));
    }
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

struct Prototypes;

impl PrototypeIndex for Prototypes {
    fn lookup(&self, kind: &str, id: &str) -> PrototypeLookup {
        match (kind, id) {
            ("entity", "rusty_dagger") => PrototypeLookup::Known,
            ("entity", _) => PrototypeLookup::Unknown,
            _ => PrototypeLookup::NotLoaded,
        }
    }
}

struct ReagentKind;

impl PrototypeKind for ReagentKind {
    const KIND: &'static str = "reagent";
}

#[test]
fn references_are_checked_against_the_index() {
    let manager = manager();
    let index = Prototypes;
    let ctx = SerializationContext::new().with_prototypes(&index);

    assert!(manager.read_with::<Creature>(&DataNode::Mapping(goblin()), &ctx).is_ok());

    let node = DataNode::Mapping(goblin().with("loot", "golden_crown"));
    let err = manager.read_with::<Creature>(&node, &ctx).unwrap_err();
    assert!(matches!(err.root_cause(), SerializationError::UnknownReference { kind: "entity", .. }));

    let validation = manager.validate_with::<Creature>(&node, &ctx);
    let errors = validation.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::UnknownReference);

    // Without an index every id is accepted.
    assert!(manager.validate::<Creature>(&node).is_valid());

    let pending = manager.validate_with::<ProtoId<ReagentKind>>(&DataNode::value("water"), &ctx);
    assert!(matches!(pending, redlilium_serialization::ValidationNode::Inconclusive(_)));
}

// ---------------------------------------------------------------------------
// Inheritance
// ---------------------------------------------------------------------------

fn base_mob() -> MappingDataNode {
    MappingDataNode::new()
        .with("id", "base_mob")
        .with("abstract", "true")
        .with("speed", "2")
        .with("tags", SequenceDataNode::from_values(["mob"]))
}

#[test]
fn composition_honors_field_behavior() {
    let manager = manager();
    let child = MappingDataNode::new()
        .with("id", "goblin")
        .with("tags", SequenceDataNode::from_values(["green"]));

    let merged = manager.push_composition::<Creature>(&child, &base_mob());
    assert_eq!(merged.get("id"), Some(&DataNode::value("goblin")));
    assert_eq!(merged.get("speed"), Some(&DataNode::value("2")));
    assert!(!merged.contains_key("abstract"));
    assert_eq!(
        merged.get("tags"),
        Some(&DataNode::Sequence(SequenceDataNode::from_values(["mob", "green"])))
    );

    // Default behavior: plain structural merge, child wins.
    let plain = child.push_inheritance(&base_mob());
    assert_eq!(
        plain.get("tags"),
        Some(&DataNode::Sequence(SequenceDataNode::from_values(["green"])))
    );
}

#[test]
fn resolver_with_definition_merge() {
    let manager = manager();
    let mut resolver = InheritanceResolver::new(manager.config());
    resolver.insert("base_mob", base_mob());
    resolver.insert(
        "goblin",
        MappingDataNode::new()
            .with("id", "goblin")
            .with("parent", "base_mob")
            .with("tags", SequenceDataNode::from_values(["green"])),
    );
    resolver.insert(
        "goblin_chief",
        MappingDataNode::new()
            .with("id", "goblin_chief")
            .with("parent", "goblin")
            .with("flags", SequenceDataNode::from_values(["Boss"])),
    );

    let mut resolved = resolver
        .resolve_with("goblin_chief", |child, parent| {
            Ok(manager.push_composition::<Creature>(child, parent))
        })
        .unwrap();
    resolved.remove("parent");

    let chief: Creature = manager.read(&DataNode::Mapping(resolved)).unwrap();
    assert_eq!(chief.id, "goblin_chief");
    assert_eq!(chief.speed, 2.0);
    assert_eq!(chief.tags, vec!["mob", "green"]);
    assert_eq!(chief.flags, 4);
    assert!(!chief.r#abstract);
}

#[test]
fn inheritance_cycle_is_an_error() {
    let mut resolver = InheritanceResolver::default();
    resolver.insert("a", MappingDataNode::new().with("parent", "b"));
    resolver.insert("b", MappingDataNode::new().with("parent", "c"));
    resolver.insert("c", MappingDataNode::new().with("parent", "a"));
    let err = resolver.resolve_all().unwrap_err();
    assert!(matches!(err, SerializationError::InheritanceCycle { ref path } if path.len() == 4));
}

#[test]
fn except_inverts_push_inheritance() {
    let parent = MappingDataNode::new()
        .with("a", "1")
        .with("b", "2")
        .with("nested", MappingDataNode::new().with("x", "1").with("y", "2"));
    let child = MappingDataNode::new()
        .with("b", "3")
        .with("nested", MappingDataNode::new().with("y", "5"));

    let merged = child.push_inheritance(&parent);
    assert_eq!(merged.get("a"), Some(&DataNode::value("1")));
    assert_eq!(merged.get("b"), Some(&DataNode::value("3")));

    let diff = merged.except(&parent).unwrap();
    assert_eq!(diff.push_inheritance(&parent), merged);
    assert_eq!(diff, child);
}

// ---------------------------------------------------------------------------
// Formats & serde bridge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Palette {
    primary: String,
    weights: Vec<f32>,
}

#[derive(Debug, Default, DataDefinition)]
struct Theme {
    #[data_field(required)]
    name: String,
    #[data_field(serializer = SerdeSerializer<Palette>)]
    palette: Palette,
}

#[test]
fn serde_types_as_fields() {
    init_logging();
    let mut manager = SerializationManager::new();
    manager
        .registry_mut()
        .register_custom::<Palette, SerdeSerializer<Palette>>(SerdeSerializer::new());
    manager.register_definition::<Theme>();
    manager.initialize().unwrap();

    let node = DataNode::Mapping(
        MappingDataNode::new().with("name", "dusk").with(
            "palette",
            MappingDataNode::new()
                .with("primary", "#202040")
                .with("weights", SequenceDataNode::from_values(["0.25", "0.75"])),
        ),
    );
    let theme: Theme = manager.read(&node).unwrap();
    assert_eq!(theme.palette.weights, vec![0.25, 0.75]);
    assert_eq!(manager.write(&theme).unwrap(), node);
}

#[cfg(feature = "yaml")]
#[test]
fn yaml_document_to_typed_value() {
    use redlilium_serialization::format::{Format, emit_document, parse_document};

    let manager = manager();
    let text = "\
id: skeleton
maxHp: 20
speed: 0.75
position: 3,-4
tint: '#E0E0E0'
size: medium
tags: [bones, loud]
flags: [Undead]
";
    let node = parse_document(text, Format::Yaml).unwrap();
    assert!(manager.validate::<Creature>(&node).is_valid());

    let skeleton: Creature = manager.read(&node).unwrap();
    assert_eq!(skeleton.health, 20);
    assert_eq!(skeleton.position, Vec2::new(3.0, -4.0));
    assert_eq!(skeleton.size, Size::Medium);
    assert_eq!(skeleton.flags, 2);

    let written = manager.write(&skeleton).unwrap();
    let reparsed = parse_document(&emit_document(&written, Format::Yaml).unwrap(), Format::Yaml).unwrap();
    assert_eq!(reparsed, written);
}

#[test]
fn data_type_names() {
    assert_eq!(Creature::type_name(), "Creature");
    assert_eq!(Size::type_name(), "Size");
    assert_eq!(<ProtoId<EntityKind>>::type_name(), "entity");
}

// ---------------------------------------------------------------------------
// Node model scenarios
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, DataDefinition)]
struct Named {
    #[data_field(required)]
    id: String,
    name: String,
}

impl Default for Named {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: "x".to_owned(),
        }
    }
}

#[test]
fn optional_field_keeps_default() {
    init_logging();
    let manager = SerializationManager::new();
    let named: Named = manager
        .read(&DataNode::Mapping(MappingDataNode::new().with("id", "n1")))
        .unwrap();
    assert_eq!(named.name, "x");

    let err = manager
        .read::<Named>(&DataNode::Mapping(MappingDataNode::new().with("name", "y")))
        .unwrap_err();
    assert!(err.to_string().starts_with("missing required field `id`"));
    assert_eq!(
        manager
            .validate::<Named>(&DataNode::Mapping(MappingDataNode::new().with("name", "y")))
            .errors()
            .len(),
        1
    );
}

#[test]
fn child_overrides_parent_value() {
    let parent = MappingDataNode::new().with("a", "1").with("b", "2");
    let child = MappingDataNode::new().with("b", "3");
    let expected = MappingDataNode::new().with("a", "1").with("b", "3");
    assert_eq!(child.push_inheritance(&parent), expected);
}

#[test]
fn sequence_equality_is_positional() {
    let left = SequenceDataNode::from_values(["a", "a", "b"]);
    let right = SequenceDataNode::from_values(["a", "b", "b"]);
    assert_ne!(left, right);
    assert_ne!(
        SequenceDataNode::from_values(["a", "b"]),
        SequenceDataNode::from_values(["b", "a"])
    );
}

// ---------------------------------------------------------------------------
// Polymorphic values
// ---------------------------------------------------------------------------

trait Shape: PolymorphicBase {
    fn area(&self) -> f32;
}

impl_polymorphic_data_type!(dyn Shape);

#[derive(Debug, Default, DataDefinition)]
struct Circle {
    radius: f32,
}

impl Shape for Circle {
    fn area(&self) -> f32 {
        std::f32::consts::PI * self.radius * self.radius
    }
}

#[derive(Debug, Default, DataDefinition)]
struct Square {
    side: f32,
}

impl Shape for Square {
    fn area(&self) -> f32 {
        self.side * self.side
    }
}

struct Triangle;

impl Shape for Triangle {
    fn area(&self) -> f32 {
        0.5
    }
}

#[derive(Default, DataDefinition)]
struct Sprite {
    shape: Option<Box<dyn Shape>>,
    layers: Vec<Box<dyn Shape>>,
}

impl std::fmt::Debug for Sprite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sprite").finish_non_exhaustive()
    }
}

fn shape_manager() -> SerializationManager {
    init_logging();
    let mut manager = SerializationManager::new();
    manager
        .registry_mut()
        .register_polymorphic::<dyn Shape, Circle>("Circle", |c| Box::new(c))
        .register_polymorphic::<dyn Shape, Square>("Square", |s| Box::new(s));
    manager.register_definition::<Sprite>();
    manager.initialize().unwrap();
    manager
}

fn tagged(tag: &str, key: &str, value: &str) -> DataNode {
    DataNode::Mapping(MappingDataNode::new().with(key, value)).with_tag(tag)
}

fn sprite_node() -> DataNode {
    let mut layers = SequenceDataNode::new();
    layers.push(tagged("!type:Square", "side", "3"));
    layers.push(tagged("!type:Circle", "radius", "1"));
    DataNode::Mapping(
        MappingDataNode::new()
            .with("shape", tagged("!type:Circle", "radius", "2"))
            .with("layers", layers),
    )
}

#[test]
fn polymorphic_fields_follow_type_tags() {
    let manager = shape_manager();
    let node = sprite_node();

    let sprite: Sprite = manager.read(&node).unwrap();
    let areas: Vec<f32> = sprite.layers.iter().map(|s| s.area()).collect();
    assert_eq!(areas, vec![9.0, std::f32::consts::PI]);
    assert_eq!(sprite.shape.as_ref().map(|s| s.area()), Some(4.0 * std::f32::consts::PI));

    let written = manager.write(&sprite).unwrap();
    assert_eq!(written, node);
    assert_eq!(
        written.as_mapping().unwrap().get("shape").and_then(DataNode::tag),
        Some("!type:Circle")
    );

    let copy = manager.copy(&sprite).unwrap();
    let copied: Vec<f32> = copy.layers.iter().map(|s| s.area()).collect();
    assert_eq!(copied, areas);

    assert!(manager.validate::<Sprite>(&node).is_valid());
}

#[test]
fn unknown_or_missing_type_tag() {
    let manager = shape_manager();

    let node = DataNode::Mapping(MappingDataNode::new().with("shape", tagged("!type:Hexagon", "side", "1")));
    let err = manager.read::<Sprite>(&node).unwrap_err();
    assert_eq!(err.path(), "shape");
    assert!(matches!(
        err.root_cause(),
        SerializationError::UnknownTypeTag { name, .. } if name == "Hexagon"
    ));
    let validation = manager.validate::<Sprite>(&node);
    let errors = validation.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::UnknownType);

    let untagged = DataNode::Mapping(MappingDataNode::new().with("radius", "1"));
    let node = DataNode::Mapping(MappingDataNode::new().with("shape", untagged));
    assert!(matches!(
        manager.read::<Sprite>(&node).unwrap_err().root_cause(),
        SerializationError::MissingTypeTag { .. }
    ));
    assert_eq!(manager.validate::<Sprite>(&node).errors()[0].kind, ErrorKind::UnknownType);

    let sprite = Sprite {
        shape: Some(Box::new(Triangle)),
        layers: Vec::new(),
    };
    assert!(matches!(
        manager.write(&sprite).unwrap_err().root_cause(),
        SerializationError::UnregisteredConcreteType { .. }
    ));
}

#[cfg(feature = "yaml")]
#[test]
fn polymorphic_yaml_document() {
    use redlilium_serialization::format::{Format, emit_document, parse_document};

    let manager = shape_manager();
    let text = "shape: !type:Square\n  side: 2\nlayers: []\n";
    let sprite: Sprite = manager.read(&parse_document(text, Format::Yaml).unwrap()).unwrap();
    assert_eq!(sprite.shape.as_ref().map(|s| s.area()), Some(4.0));

    let written = manager.write(&sprite).unwrap();
    let emitted = emit_document(&written, Format::Yaml).unwrap();
    assert!(emitted.contains("!type:Square"), "{emitted}");
    assert_eq!(parse_document(&emitted, Format::Yaml).unwrap(), written);
}
