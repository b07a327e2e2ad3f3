//! Data-driven Satisfactory scenarios.
//!
//! The catalog, engine config and layouts under `data/` are loaded through
//! `beltline-data` exactly as an embedding application would, then run
//! through the core engine. Items are JSON, buildings TOML, config RON.

use beltline_core::engine::{FlowEngine, FlowReport};
use beltline_core::graph::LayoutSnapshot;
use beltline_core::id::{BuildingId, ItemId};
use beltline_core::node::NodeKind;
use beltline_core::status::{FlowStatus, NodeStatus};
use beltline_core::test_utils::assert_close;
use beltline_data::{DataLoadError, load_catalog, load_engine, load_flow_config, load_layout};
use proptest::prelude::*;
use std::path::{Path, PathBuf};

// ===========================================================================
// Fixtures
// ===========================================================================

fn data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("beltline_core=debug,beltline_data=debug")
        .with_test_writer()
        .try_init();
}

fn engine() -> FlowEngine {
    init_tracing();
    load_engine(&data_dir().join("satisfactory")).unwrap()
}

fn layout(name: &str) -> LayoutSnapshot {
    load_layout(&data_dir().join("layouts").join(name)).unwrap()
}

fn status<'r>(report: &'r FlowReport, id: &str) -> &'r NodeStatus {
    report
        .get(id)
        .unwrap_or_else(|| panic!("no status for {id}"))
}

// ===========================================================================
// Catalog loading
// ===========================================================================

#[test]
fn catalog_loads_mixed_formats() {
    let dir = data_dir().join("satisfactory");
    let catalog = load_catalog(&dir).unwrap();
    assert_eq!(catalog.item_count(), 14);
    assert_eq!(catalog.building_count(), 9);

    let screw = catalog.item(&ItemId::from("screw")).unwrap();
    assert_eq!(screw.recipes.len(), 2);
    assert_eq!(screw.recipes[1].inputs[0].per_minute, 12.5);

    let rod = catalog.item(&ItemId::from("iron_rod")).unwrap();
    assert!(rod.recipes.is_empty());
    assert_eq!(rod.alternates[0].producers, vec![BuildingId::from("assembler")]);

    let buffer = catalog.building(&BuildingId::from("fluid_buffer")).unwrap();
    assert_eq!(buffer.inventory.map(|inv| inv.size), Some(400.0));
}

#[test]
fn flow_config_from_ron() {
    let config = load_flow_config(&data_dir().join("satisfactory")).unwrap();
    assert_eq!(config.tolerance, 0.02);
    assert_eq!(config.default_belt_tier, 6);
}

#[test]
fn layouts_directory_has_no_catalog() {
    assert!(matches!(
        load_catalog(&data_dir().join("layouts")),
        Err(DataLoadError::MissingRequired { .. })
    ));
}

// ===========================================================================
// Iron plate line
// ===========================================================================

#[test]
fn iron_plate_line_is_balanced() {
    let engine = engine();
    let report = engine.calculate(&layout("iron_plates.json"));

    for id in ["miner", "smelter-1", "smelter-2", "sink"] {
        assert_eq!(status(&report, id).status, Some(FlowStatus::Optimal), "{id}");
    }

    // Each constructor answers for the sink's full demand on its own belt.
    for id in ["plates-1", "plates-2"] {
        let plates = status(&report, id);
        assert_eq!(plates.status, Some(FlowStatus::Under), "{id}");
        assert_close(plates.supply, 20.0);
        assert_close(plates.demand, 40.0);
    }

    let miner = status(&report, "miner");
    assert_close(miner.supply, 60.0);
    assert_close(miner.demand, 60.0);

    let smelter = status(&report, "smelter-1");
    let details = smelter.input_details.as_ref().unwrap();
    assert_eq!(details.len(), 1);
    assert_close(details[0].supply, 30.0);

    let sink = status(&report, "sink");
    assert_close(sink.supply, 40.0);
    assert_close(sink.demand, 40.0);

    let split = status(&report, "split");
    assert_eq!(split.status, None);
    assert_close(split.supply, 60.0);
}

#[test]
fn idle_constructor_is_disconnected() {
    let report = engine().calculate(&layout("iron_plates.json"));
    let spare = status(&report, "spare");
    assert!(spare.disconnected);
    assert_eq!(spare.status, None);
}

#[test]
fn raising_the_target_starves_the_sink() {
    let mut snapshot = layout("iron_plates.json");
    for node in &mut snapshot.nodes {
        if let NodeKind::Goal(cfg) = &mut node.kind {
            cfg.rate = 60.0;
        }
    }
    let report = engine().calculate(&snapshot);
    assert_eq!(status(&report, "sink").status, Some(FlowStatus::Under));
    let plates = status(&report, "plates-1");
    assert_eq!(plates.status, Some(FlowStatus::Under));
    assert_close(plates.demand, 60.0);
}

// ===========================================================================
// Oil refinery with a residue buffer
// ===========================================================================

#[test]
fn refinery_byproduct_fills_buffer() {
    let report = engine().calculate(&layout("oil_refinery.json"));

    assert_eq!(status(&report, "well").status, Some(FlowStatus::Optimal));
    assert_eq!(status(&report, "refinery").status, Some(FlowStatus::Optimal));
    assert_eq!(status(&report, "plastic-out").status, Some(FlowStatus::Optimal));

    let buffer = status(&report, "residue-buffer");
    assert_eq!(buffer.status, Some(FlowStatus::Over));
    assert!(!buffer.mismatch_incoming);
    let flow = buffer.storage_flow.unwrap();
    assert_close(flow.in_rate, 20.0);
    assert_close(flow.out_rate, 0.0);
    assert_eq!(flow.capacity, Some(400.0));
    assert!(flow.can_fill);
    assert_close(flow.fill_minutes.unwrap(), 20.0);
}

#[test]
fn report_serializes_camel_case() {
    let report = engine().calculate(&layout("oil_refinery.json"));
    let value = serde_json::to_value(&report).unwrap();

    let buffer = &value["residue-buffer"];
    assert_eq!(buffer["status"], "over");
    assert_eq!(buffer["storageFlow"]["fillMinutes"], 20.0);
    assert_eq!(buffer["storageFlow"]["canFill"], true);
    assert!(buffer.get("disconnected").is_none());

    let refinery = &value["refinery"];
    assert_eq!(refinery["inputDetails"][0]["itemId"], "crude_oil");
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// The sink's status follows the configured tolerance band around 40/min.
    #[test]
    fn sink_status_tracks_target(rate in 1.0..120.0f64) {
        let engine = engine();
        let mut snapshot = layout("iron_plates.json");
        for node in &mut snapshot.nodes {
            if let NodeKind::Goal(cfg) = &mut node.kind {
                cfg.rate = rate;
            }
        }
        let report = engine.calculate(&snapshot);
        let sink = status(&report, "sink");
        let expected = if (40.0 - rate).abs() <= 0.02 * rate {
            FlowStatus::Optimal
        } else if 40.0 < rate {
            FlowStatus::Under
        } else {
            FlowStatus::Over
        };
        prop_assert_eq!(sink.status, Some(expected));
        prop_assert!((sink.supply - 40.0).abs() < 1e-6);
    }
}
