use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use redlilium_serialization::{
    DataDefinition, DataNode, InheritanceResolver, MappingDataNode, SequenceDataNode, SerializationManager,
};

// ---------------------------------------------------------------------------
// Helper types
// ---------------------------------------------------------------------------

#[derive(Default, DataDefinition)]
struct Item {
    #[data_field(required)]
    id: String,
    weight: f32,
    stack_size: u32,
    tags: Vec<String>,
}

fn item_node(i: usize) -> DataNode {
    DataNode::Mapping(
        MappingDataNode::new()
            .with("id", format!("item_{i}"))
            .with("weight", "0.5")
            .with("stackSize", (i % 64).to_string())
            .with("tags", SequenceDataNode::from_values(["loot", "common"])),
    )
}

fn manager() -> SerializationManager {
    let mut manager = SerializationManager::new();
    manager.register_definition::<Item>();
    let _ = manager.initialize();
    manager
}

// ---------------------------------------------------------------------------
// Typed read / write
// ---------------------------------------------------------------------------

fn bench_read_1k_items(c: &mut Criterion) {
    let manager = manager();
    let nodes: Vec<_> = (0..1_000).map(item_node).collect();
    c.bench_function("read_1k_items", |b| {
        b.iter(|| {
            for node in &nodes {
                black_box(manager.read::<Item>(node).ok());
            }
        });
    });
}

fn bench_write_1k_items(c: &mut Criterion) {
    let manager = manager();
    let items: Vec<Item> = (0..1_000)
        .filter_map(|i| manager.read(&item_node(i)).ok())
        .collect();
    c.bench_function("write_1k_items", |b| {
        b.iter(|| {
            for item in &items {
                black_box(manager.write(item).ok());
            }
        });
    });
}

fn bench_copy_1k_items(c: &mut Criterion) {
    let manager = manager();
    let items: Vec<Item> = (0..1_000)
        .filter_map(|i| manager.read(&item_node(i)).ok())
        .collect();
    c.bench_function("copy_1k_items", |b| {
        b.iter(|| {
            for item in &items {
                black_box(manager.copy(item).ok());
            }
        });
    });
}

fn bench_validate_1k_items(c: &mut Criterion) {
    let manager = manager();
    let nodes: Vec<_> = (0..1_000).map(item_node).collect();
    c.bench_function("validate_1k_items", |b| {
        b.iter(|| {
            for node in &nodes {
                black_box(manager.validate::<Item>(node));
            }
        });
    });
}

// ---------------------------------------------------------------------------
// Node model
// ---------------------------------------------------------------------------

fn wide_mapping(prefix: &str, n: usize) -> MappingDataNode {
    (0..n)
        .map(|i| (format!("key_{i}"), format!("{prefix}_{i}")))
        .collect()
}

fn bench_push_inheritance_100_keys(c: &mut Criterion) {
    let parent = wide_mapping("parent", 100);
    let child = wide_mapping("child", 50);
    c.bench_function("push_inheritance_100_keys", |b| {
        b.iter(|| black_box(child.push_inheritance(&parent)));
    });
}

fn bench_except_100_keys(c: &mut Criterion) {
    let parent = wide_mapping("parent", 100);
    let merged = wide_mapping("child", 50).push_inheritance(&parent);
    c.bench_function("except_100_keys", |b| {
        b.iter(|| black_box(merged.except(&parent)));
    });
}

fn bench_wide_mapping_20k(c: &mut Criterion) {
    let manager = manager();
    let table: std::collections::HashMap<String, u32> = (0..20_000).map(|i| (format!("key_{i}"), i)).collect();
    let written = manager.write(&table).ok();
    c.bench_function("write_mapping_20k_entries", |b| {
        b.iter(|| black_box(manager.write(&table).ok()));
    });
    c.bench_function("compare_mapping_20k_entries", |b| {
        let other = written.clone();
        b.iter(|| black_box(written == other));
    });
}

fn bench_resolve_chain_depth_32(c: &mut Criterion) {
    c.bench_function("resolve_chain_depth_32", |b| {
        b.iter_batched(
            || {
                let mut resolver = InheritanceResolver::default();
                resolver.insert("level_0", wide_mapping("root", 20));
                for i in 1..32 {
                    resolver.insert(
                        format!("level_{i}"),
                        MappingDataNode::new()
                            .with("parent", format!("level_{}", i - 1))
                            .with(format!("key_{i}"), "override"),
                    );
                }
                resolver
            },
            |resolver| black_box(resolver.resolve("level_31").ok()),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_read_1k_items,
    bench_write_1k_items,
    bench_copy_1k_items,
    bench_validate_1k_items,
    bench_push_inheritance_100_keys,
    bench_except_100_keys,
    bench_wide_mapping_20k,
    bench_resolve_chain_depth_32,
);
criterion_main!(benches);
