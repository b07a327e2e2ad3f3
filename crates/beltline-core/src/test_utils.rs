//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available everywhere tests run (via the `test-utils` feature).

use crate::catalog::*;
use crate::config::FlowConfig;
use crate::edge::Edge;
use crate::graph::{FlowContext, FlowGraph, LayoutSnapshot};
use crate::id::*;
use crate::node::*;
use std::collections::BTreeMap;

// ===========================================================================
// Catalog
// ===========================================================================

fn recipe(name: &str, inputs: &[(&str, f64)], output: f64, producer: &str) -> RecipeDef {
    RecipeDef {
        name: name.to_string(),
        inputs: inputs.iter().map(|&(item, rate)| ItemRate::new(item, rate)).collect(),
        output,
        byproducts: Vec::new(),
        producers: vec![BuildingId::from(producer)],
    }
}

/// A small Satisfactory-flavoured catalog covering every recipe shape:
/// explicit recipes, a legacy item with an alternate, byproducts and fluids.
pub fn sample_catalog() -> Catalog {
    let mut builder = CatalogBuilder::new();

    builder
        .register_item(ItemDef::raw("iron_ore", "Iron Ore").with_stack_size(100))
        .register_item(ItemDef::raw("copper_ore", "Copper Ore").with_stack_size(100))
        .register_item(ItemDef::raw("water", "Water").with_form(ItemForm::Fluid))
        .register_item(ItemDef::raw("crude_oil", "Crude Oil").with_form(ItemForm::Fluid))
        .register_item(
            ItemDef::raw("heavy_oil_residue", "Heavy Oil Residue").with_form(ItemForm::Fluid),
        )
        .register_item(
            ItemDef::raw("iron_ingot", "Iron Ingot")
                .with_stack_size(100)
                .with_recipe(recipe("Iron Ingot", &[("iron_ore", 30.0)], 30.0, "smelter")),
        )
        .register_item(
            ItemDef::raw("iron_plate", "Iron Plate")
                .with_stack_size(200)
                .with_recipe(recipe("Iron Plate", &[("iron_ingot", 30.0)], 20.0, "constructor")),
        )
        .register_item(
            ItemDef::raw("screw", "Screw")
                .with_stack_size(500)
                .with_recipe(recipe("Screw", &[("iron_rod", 10.0)], 40.0, "constructor")),
        );

    let mut rod = ItemDef::raw("iron_rod", "Iron Rod")
        .with_stack_size(200)
        .with_requires(vec![ItemRate::new("iron_ingot", 15.0)], 15.0)
        .with_alternate(AlternateDef {
            name: "Copper Rod".to_string(),
            requires: vec![ItemRate::new("copper_ore", 15.0)],
            default_production: 15.0,
            byproducts: Vec::new(),
            producers: vec![BuildingId::from("assembler")],
        });
    rod.default_producers = vec![BuildingId::from("constructor")];
    builder.register_item(rod);

    // Legacy item whose base rate was never filled in.
    builder.register_item(
        ItemDef::raw("sludge", "Sludge").with_requires(vec![ItemRate::new("water", 10.0)], 0.0),
    );

    builder
        .register_item(
            ItemDef::raw("reinforced_plate", "Reinforced Iron Plate")
                .with_stack_size(100)
                .with_recipe(recipe(
                    "Reinforced Iron Plate",
                    &[("iron_plate", 30.0), ("screw", 60.0)],
                    5.0,
                    "assembler",
                )),
        )
        .register_item(ItemDef::raw("plastic", "Plastic").with_stack_size(100).with_recipe(
            RecipeDef {
                byproducts: vec![ItemRate::new("heavy_oil_residue", 10.0)],
                ..recipe("Plastic", &[("crude_oil", 30.0)], 20.0, "refinery")
            },
        ));

    builder
        .register_building(
            BuildingDef::new("miner", "Miner Mk.1", BuildingCategory::Extraction)
                .with_ports(PortSpec::default(), PortSpec::belts(1))
                .with_default_production(60.0),
        )
        .register_building(
            BuildingDef::new("water_extractor", "Water Extractor", BuildingCategory::Extraction)
                .with_ports(PortSpec::default(), PortSpec::pipes(1))
                .with_default_production(120.0),
        )
        .register_building(BuildingDef::new("smelter", "Smelter", BuildingCategory::Production))
        .register_building(BuildingDef::new(
            "constructor",
            "Constructor",
            BuildingCategory::Production,
        ))
        .register_building(
            BuildingDef::new("assembler", "Assembler", BuildingCategory::Production)
                .with_ports(PortSpec::belts(2), PortSpec::belts(1)),
        )
        .register_building(
            BuildingDef::new("refinery", "Refinery", BuildingCategory::Production).with_ports(
                PortSpec::belts(1),
                PortSpec {
                    kinds: vec![crate::rate::Material::Belt, crate::rate::Material::Pipe],
                    count: 2,
                },
            ),
        )
        .register_building(
            BuildingDef::new("storage_container", "Storage Container", BuildingCategory::Storage)
                .with_ports(PortSpec::belts(2), PortSpec::belts(2))
                .with_inventory(24.0, InventoryUnit::Slots),
        )
        .register_building(
            BuildingDef::new("small_crate", "Personal Storage Box", BuildingCategory::Storage)
                .with_ports(PortSpec::belts(1), PortSpec::belts(1))
                .with_inventory(2.0, InventoryUnit::Slots),
        )
        .register_building(
            BuildingDef::new("fluid_buffer", "Fluid Buffer", BuildingCategory::Storage)
                .with_ports(PortSpec::pipes(1), PortSpec::pipes(1))
                .with_inventory(400.0, InventoryUnit::Volume),
        );

    builder.build().expect("sample catalog is valid")
}

// ===========================================================================
// Node constructors
// ===========================================================================

pub fn extractor(id: &str, item: &str, production: f64) -> Node {
    Node::new(
        id,
        NodeKind::Extractor(ExtractorConfig {
            item: Some(item.into()),
            production: Some(production),
            ..ExtractorConfig::default()
        }),
    )
}

pub fn producer(id: &str, item: &str, production: f64) -> Node {
    Node::new(
        id,
        NodeKind::Producer(ProducerConfig {
            item: Some(item.into()),
            production: Some(production),
            ..ProducerConfig::default()
        }),
    )
}

/// A storage container, optionally pinned to an item.
pub fn storage(id: &str, item: Option<&str>) -> Node {
    Node::new(
        id,
        NodeKind::Storage(StorageConfig {
            building: Some("storage_container".into()),
            stored_item: item.map(ItemId::from),
            ..StorageConfig::default()
        }),
    )
}

pub fn splitter(id: &str) -> Node {
    Node::new(id, NodeKind::Splitter(SplitterConfig::default()))
}

/// A splitter whose listed output handles are filtered to one item each.
pub fn splitter_with_branches(id: &str, branches: &[(&str, &str)]) -> Node {
    let branches: BTreeMap<String, ItemId> = branches
        .iter()
        .map(|&(handle, item)| (handle.to_string(), ItemId::from(item)))
        .collect();
    Node::new(id, NodeKind::Splitter(SplitterConfig { branches }))
}

pub fn lift(id: &str, item: &str) -> Node {
    Node::new(
        id,
        NodeKind::Lift(LiftConfig {
            item: Some(item.into()),
        }),
    )
}

pub fn goal(id: &str, item: &str, rate: f64) -> Node {
    Node::new(
        id,
        NodeKind::Goal(GoalConfig {
            item: Some(item.into()),
            rate,
        }),
    )
}

// ===========================================================================
// Edge constructors
// ===========================================================================

pub fn belt(from: &str, to: &str) -> Edge {
    Edge::new(from, to).with_handles("belt-out-0", "belt-in-0")
}

pub fn pipe(from: &str, to: &str) -> Edge {
    Edge::new(from, to).with_handles("pipe-out-0", "pipe-in-0")
}

/// A belt leaving output port `port` of `from`.
pub fn belt_from(from: &str, port: usize, to: &str) -> Edge {
    Edge::new(from, to).with_handles(&format!("belt-out-{port}"), "belt-in-0")
}

// ===========================================================================
// Snapshot and context
// ===========================================================================

pub fn layout(nodes: Vec<Node>, edges: Vec<Edge>) -> LayoutSnapshot {
    LayoutSnapshot::new(nodes, edges)
}

/// Run `f` against `snapshot` indexed with the sample catalog and default config.
pub fn with_context<R>(snapshot: &LayoutSnapshot, f: impl FnOnce(FlowContext<'_>) -> R) -> R {
    let catalog = sample_catalog();
    let config = FlowConfig::default();
    let graph = FlowGraph::build(snapshot);
    f(FlowContext::new(&graph, &catalog, &config))
}

pub fn node_ref<'a>(ctx: &FlowContext<'a>, id: &str) -> &'a Node {
    ctx.graph
        .node(&NodeId::from(id))
        .unwrap_or_else(|| panic!("node {id} not in snapshot"))
}

// ===========================================================================
// Assertions
// ===========================================================================

#[track_caller]
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
