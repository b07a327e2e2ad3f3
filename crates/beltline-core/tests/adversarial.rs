//! Adversarial layouts: cycles, dangling references and nonsense
//! configuration must degrade to zero flow, never panic or diverge.

use beltline_core::config::FlowConfig;
use beltline_core::edge::Edge;
use beltline_core::engine::{FlowReport, compute_statuses};
use beltline_core::graph::LayoutSnapshot;
use beltline_core::id::NodeId;
use beltline_core::node::{Node, NodeKind, ProducerConfig, StorageConfig};
use beltline_core::rate::TierSelection;
use beltline_core::status::FlowStatus;
use beltline_core::test_utils::*;

fn run(snapshot: &LayoutSnapshot) -> FlowReport {
    compute_statuses(snapshot, &sample_catalog(), &FlowConfig::default())
}

fn assert_all_finite(report: &FlowReport) {
    for (id, s) in report {
        assert!(s.supply.is_finite() && s.supply >= 0.0, "{id} supply {}", s.supply);
        assert!(s.demand.is_finite() && s.demand >= 0.0, "{id} demand {}", s.demand);
        if let Some(flow) = s.storage_flow {
            assert!(flow.in_rate.is_finite());
            assert!(flow.out_rate.is_finite());
            assert!(flow.net_rate.is_finite());
        }
    }
}

/// Self-loop on a splitter.
#[test]
fn splitter_self_loop() {
    let snapshot = layout(
        vec![
            extractor("m", "iron_ore", 60.0),
            splitter("s"),
            goal("g", "iron_ore", 30.0),
        ],
        vec![
            belt("m", "s"),
            belt_from("s", 0, "s"),
            belt_from("s", 1, "g"),
        ],
    );
    let report = run(&snapshot);
    assert_all_finite(&report);
    assert!(report[&NodeId::from("g")].supply <= 60.0);
}

/// Two storages feeding each other.
#[test]
fn storage_ring() {
    let snapshot = layout(
        vec![
            extractor("m", "iron_ore", 60.0),
            storage("a", None),
            storage("b", None),
            goal("g", "iron_ore", 60.0),
        ],
        vec![
            belt("m", "a"),
            belt("a", "b"),
            belt("b", "a"),
            belt("b", "g"),
        ],
    );
    let report = run(&snapshot);
    assert_all_finite(&report);
    assert_eq!(report.len(), 4);
}

/// A storage that only feeds itself never resolves an item.
#[test]
fn storage_self_loop_without_item() {
    let snapshot = layout(vec![storage("box", None)], vec![belt("box", "box")]);
    let report = run(&snapshot);
    let b = &report[&NodeId::from("box")];
    assert!(!b.disconnected);
    assert_eq!(b.storage_flow.unwrap().in_rate, 0.0);
}

/// Lifts pointing at each other.
#[test]
fn lift_ring() {
    let snapshot = layout(
        vec![lift("up", "iron_ore"), lift("down", "iron_ore"), goal("g", "iron_ore", 10.0)],
        vec![belt("up", "down"), belt("down", "up"), belt("down", "g")],
    );
    let report = run(&snapshot);
    assert_all_finite(&report);
}

/// Edges naming nodes that do not exist are ignored.
#[test]
fn dangling_edges_ignored() {
    let snapshot = layout(
        vec![producer("s", "iron_ingot", 30.0)],
        vec![
            belt("ghost", "s"),
            belt("s", "nowhere"),
            Edge::new("s", "s").with_virtual(Some("phantom"), None),
        ],
    );
    let report = run(&snapshot);
    assert!(report[&NodeId::from("s")].disconnected);
}

/// Duplicate ids keep the first node.
#[test]
fn duplicate_node_ids() {
    let snapshot = layout(
        vec![
            extractor("m", "iron_ore", 30.0),
            extractor("m", "copper_ore", 999.0),
            producer("s", "iron_ingot", 30.0),
        ],
        vec![belt("m", "s")],
    );
    let report = run(&snapshot);
    assert_eq!(report.len(), 2);
    assert_eq!(report[&NodeId::from("s")].status, Some(FlowStatus::Optimal));
}

/// Items and buildings missing from the catalog.
#[test]
fn unknown_catalog_references() {
    let snapshot = layout(
        vec![
            extractor("m", "unobtainium", 60.0).with_building("hyperdrill"),
            producer("p", "flux_capacitor", 10.0).with_building("time_machine"),
            storage("box", Some("unobtainium")).with_building("bag_of_holding"),
            goal("g", "unobtainium", 60.0),
        ],
        vec![belt("m", "p"), belt("m", "box"), belt("box", "g")],
    );
    let report = run(&snapshot);
    assert_all_finite(&report);
    let p = &report[&NodeId::from("p")];
    assert!(p.input_details.is_none());
    assert!(!p.mismatch_incoming);
    let flow = report[&NodeId::from("box")].storage_flow.unwrap();
    assert_eq!(flow.capacity, None);
    assert!(!flow.can_fill);
}

/// Unconfigured producers state no demand.
#[test]
fn unconfigured_producer() {
    let snapshot = layout(
        vec![
            extractor("m", "iron_ore", 60.0),
            Node::new("p", NodeKind::Producer(ProducerConfig::default())),
        ],
        vec![belt("m", "p")],
    );
    let report = run(&snapshot);
    let p = &report[&NodeId::from("p")];
    assert_eq!(p.status, None);
    assert_eq!(p.demand, 0.0);
    assert_eq!(report[&NodeId::from("m")].status, Some(FlowStatus::Over));
}

/// Negative production and rates clamp to zero.
#[test]
fn negative_rates_clamp() {
    let snapshot = layout(
        vec![
            extractor("m", "iron_ore", -50.0),
            producer("s", "iron_ingot", -30.0),
            goal("g", "iron_ingot", -5.0),
        ],
        vec![belt("m", "s"), belt("s", "g")],
    );
    let report = run(&snapshot);
    assert_all_finite(&report);
    assert_eq!(report[&NodeId::from("g")].status, None);
}

/// An alternate picked by index, and a producer switched off.
#[test]
fn alternate_recipe_and_idle_producer() {
    let mut rod = producer("r", "iron_rod", 15.0);
    if let NodeKind::Producer(cfg) = &mut rod.kind {
        // Copper Rod needs an assembler; without a building every list applies.
        cfg.alternate_index = Some(0);
    }
    let snapshot = layout(
        vec![extractor("m", "copper_ore", 15.0), rod],
        vec![belt("m", "r")],
    );
    let report = run(&snapshot);
    assert_eq!(report[&NodeId::from("r")].status, Some(FlowStatus::Optimal));

    let snapshot = layout(
        vec![
            extractor("m", "iron_ore", 60.0),
            Node::new(
                "p",
                NodeKind::Producer(ProducerConfig {
                    item: Some("iron_ingot".into()),
                    production: Some(0.0),
                    ..ProducerConfig::default()
                }),
            ),
        ],
        vec![belt("m", "p")],
    );
    let report = run(&snapshot);
    assert_all_finite(&report);
    assert_eq!(report[&NodeId::from("p")].status, None);
}

/// Stack parents whose members are missing count them as copies.
#[test]
fn stack_with_missing_members() {
    let snapshot = layout(
        vec![
            producer("stack", "water", 10.0).with_stack(&["stack", "gone1", "gone2"], Some("stack")),
            goal("g", "water", 30.0),
        ],
        vec![pipe("stack", "g")],
    );
    let report = run(&snapshot);
    let stack = &report[&NodeId::from("stack")];
    assert_eq!(stack.supply, 30.0);
    assert_eq!(stack.status, Some(FlowStatus::Optimal));
}

/// Stack parents whose active member is missing keep their own status.
#[test]
fn stack_active_member_missing() {
    let snapshot = layout(
        vec![producer("stack", "water", 10.0).with_stack(&["gone"], Some("gone"))],
        vec![],
    );
    let report = run(&snapshot);
    assert!(report[&NodeId::from("stack")].disconnected);
}

/// Absurd tier selections clamp to the table.
#[test]
fn out_of_range_tiers() {
    let snapshot = layout(
        vec![
            extractor("m", "iron_ore", 5000.0).with_tiers(TierSelection::belt(250)),
            storage("box", Some("iron_ore")).with_tiers(TierSelection::belt(0)),
        ],
        vec![belt("m", "box")],
    );
    let report = run(&snapshot);
    assert_eq!(report[&NodeId::from("m")].supply, 1200.0);
    // Two Mk.1 lanes.
    assert_eq!(report[&NodeId::from("box")].storage_flow.unwrap().in_rate, 120.0);
}

/// A negative stored amount never produces a drain time, but the known
/// item still flows at the demanded rate.
#[test]
fn negative_stored_amount() {
    let snapshot = layout(
        vec![
            Node::new(
                "box",
                NodeKind::Storage(StorageConfig {
                    building: Some("small_crate".into()),
                    stored_item: Some("iron_ore".into()),
                    stored_amount: Some(-40.0),
                    ..StorageConfig::default()
                }),
            ),
            goal("g", "iron_ore", 10.0),
        ],
        vec![belt("box", "g")],
    );
    let report = run(&snapshot);
    let b = &report[&NodeId::from("box")];
    assert_eq!(b.status, Some(FlowStatus::Optimal));
    assert_eq!(b.supply, 10.0);
    assert!(b.storage_flow.unwrap().drain_minutes.is_none());
}

/// A long chain of splitters stays bounded.
#[test]
fn deep_splitter_chain() {
    let mut nodes = vec![extractor("m", "iron_ore", 1024.0)];
    let mut edges = Vec::new();
    let mut previous = "m".to_string();
    for i in 0..10 {
        let id = format!("s{i}");
        nodes.push(splitter(&id));
        edges.push(belt_from(&previous, 0, &id));
        let sink = format!("g{i}");
        nodes.push(goal(&sink, "iron_ore", 1.0));
        edges.push(belt_from(&id, 1, &sink));
        previous = id;
    }
    let report = run(&layout(nodes, edges));
    assert_all_finite(&report);
    // Each splitter halves what continues down the chain.
    assert_eq!(report[&NodeId::from("g0")].supply, 512.0);
    assert_eq!(report[&NodeId::from("g9")].supply, 2.0);
}
