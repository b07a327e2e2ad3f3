//! Storage flow simulation: fill and drain behavior of buffer nodes.

use crate::catalog::InventoryUnit;
use crate::demand::downstream_demand;
use crate::graph::{FlowContext, Visited};
use crate::id::ItemId;
use crate::node::{Node, NodeKind};
use crate::rate::storage_capacities;
use crate::supply::{edge_flow, stored_item};
use serde::{Deserialize, Serialize};

/// Steady-state flow through one storage node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageFlow {
    pub in_rate: f64,
    pub out_rate: f64,
    /// Positive while filling, negative while draining.
    pub net_rate: f64,
    pub out_demand: f64,
    pub can_fill: bool,
    pub fill_minutes: Option<f64>,
    /// Capacity in item units, when the building and item are known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drain_minutes: Option<f64>,
}

/// Capacity of a storage node in units of `item`.
///
/// Slot inventories hold `size × stack_size`; volumetric ones hold `size`.
pub fn capacity_units(ctx: &FlowContext<'_>, node: &Node, item: Option<&ItemId>) -> Option<f64> {
    let building = ctx.catalog.building(node.building()?)?;
    let inventory = building.inventory?;
    match inventory.unit {
        InventoryUnit::Volume => Some(inventory.size),
        InventoryUnit::Slots => {
            let stack_size = ctx.catalog.item(item?)?.stack_size?;
            Some(inventory.size * f64::from(stack_size))
        }
    }
}

fn stored_amount(node: &Node) -> f64 {
    match &node.kind {
        NodeKind::Storage(cfg) => cfg.stored_amount.unwrap_or(0.0).max(0.0),
        _ => 0.0,
    }
}

/// Simulate `node` as a buffer.
///
/// A storage already on the current path yields a zeroed flow.
pub fn simulate_storage<'a>(
    ctx: &FlowContext<'a>,
    node: &'a Node,
    visited: &Visited<'a>,
) -> StorageFlow {
    let item = stored_item(ctx, node);
    let Some(inner) = ctx.enter(visited, &node.id) else {
        return StorageFlow::default();
    };
    let (in_capacity, out_capacity) = storage_capacities(ctx, node);
    let incoming = ctx.graph.incoming(&node.id);
    let outgoing = ctx.graph.outgoing(&node.id);

    let (in_rate, out_demand) = match item {
        Some(item) => {
            let supplied: f64 = incoming
                .iter()
                .map(|&index| edge_flow(ctx, ctx.graph.edge(index), item, &inner))
                .fold(0.0, |total, rate| total + rate);
            (
                supplied.min(in_capacity),
                downstream_demand(ctx, node, item, &inner),
            )
        }
        None => (0.0, 0.0),
    };

    // A buffer with no inputs drains at whatever its outputs can carry.
    let available = if incoming.is_empty() && !outgoing.is_empty() {
        out_capacity
    } else {
        in_rate
    };
    let out_rate = out_demand.min(out_capacity).min(available).max(0.0);
    let net_rate = in_rate - out_rate;

    let capacity = capacity_units(ctx, node, item);
    let stored = stored_amount(node);
    let fill_minutes = match capacity {
        Some(capacity) if net_rate > 0.0 => Some((capacity - stored).max(0.0) / net_rate),
        _ => None,
    };
    let drain_minutes = (net_rate < 0.0 && stored > 0.0).then(|| stored / -net_rate);

    StorageFlow {
        in_rate,
        out_rate,
        net_rate,
        out_demand,
        can_fill: fill_minutes.is_some(),
        fill_minutes,
        capacity,
        drain_minutes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn fill_time_from_net_rate() {
        let snapshot = layout(
            vec![
                extractor("m", "iron_ore", 50.0),
                storage("box", Some("iron_ore")).with_building("small_crate"),
                goal("g", "iron_ore", 30.0),
            ],
            vec![belt("m", "box"), belt("box", "g")],
        );
        with_context(&snapshot, |ctx| {
            let flow = simulate_storage(&ctx, node_ref(&ctx, "box"), &Visited::new());
            assert_close(flow.in_rate, 50.0);
            assert_close(flow.out_rate, 30.0);
            assert_close(flow.net_rate, 20.0);
            assert_eq!(flow.capacity, Some(200.0));
            assert!(flow.can_fill);
            assert_close(flow.fill_minutes.unwrap(), 10.0);
            assert!(flow.drain_minutes.is_none());
        });
    }

    #[test]
    fn stored_amount_shortens_fill_and_sets_drain() {
        let mut buffer = storage("box", Some("iron_ore")).with_building("small_crate");
        if let NodeKind::Storage(cfg) = &mut buffer.kind {
            cfg.stored_amount = Some(100.0);
        }
        let snapshot = layout(
            vec![buffer, goal("g", "iron_ore", 25.0)],
            vec![belt("box", "g")],
        );
        with_context(&snapshot, |ctx| {
            let flow = simulate_storage(&ctx, node_ref(&ctx, "box"), &Visited::new());
            // No inputs: drains at the demanded rate.
            assert_close(flow.in_rate, 0.0);
            assert_close(flow.out_rate, 25.0);
            assert_close(flow.net_rate, -25.0);
            assert!(!flow.can_fill);
            assert_close(flow.drain_minutes.unwrap(), 4.0);
        });
    }

    #[test]
    fn inferred_item_sees_downstream_demand() {
        let snapshot = layout(
            vec![
                extractor("m", "iron_ore", 45.0),
                storage("box", None),
                goal("g", "iron_ore", 30.0),
            ],
            vec![belt("m", "box"), belt("box", "g")],
        );
        with_context(&snapshot, |ctx| {
            let flow = simulate_storage(&ctx, node_ref(&ctx, "box"), &Visited::new());
            assert_close(flow.in_rate, 45.0);
            assert_close(flow.out_demand, 30.0);
            assert_close(flow.out_rate, 30.0);
            assert_close(flow.net_rate, 15.0);
        });
    }

    #[test]
    fn no_inputs_is_positive_zero() {
        let snapshot = layout(
            vec![storage("box", Some("iron_ore")), goal("g", "iron_ore", 10.0)],
            vec![belt("box", "g")],
        );
        with_context(&snapshot, |ctx| {
            let flow = simulate_storage(&ctx, node_ref(&ctx, "box"), &Visited::new());
            assert_eq!(flow.in_rate, 0.0);
            assert!(flow.in_rate.is_sign_positive());
        });
    }

    #[test]
    fn input_clamped_to_port_capacity() {
        let snapshot = layout(
            vec![
                extractor("m", "iron_ore", 600.0),
                storage("box", Some("iron_ore")).with_tiers(crate::rate::TierSelection::belt(2)),
            ],
            vec![belt("m", "box")],
        );
        with_context(&snapshot, |ctx| {
            let flow = simulate_storage(&ctx, node_ref(&ctx, "box"), &Visited::new());
            // Two Mk.2 input lanes.
            assert_close(flow.in_rate, 240.0);
            assert_close(flow.out_rate, 0.0);
            assert_close(flow.fill_minutes.unwrap(), 2400.0 / 240.0);
        });
    }

    #[test]
    fn volumetric_capacity_ignores_stack_size() {
        let snapshot = layout(
            vec![storage("tank", Some("crude_oil")).with_building("fluid_buffer")],
            vec![],
        );
        with_context(&snapshot, |ctx| {
            let tank = node_ref(&ctx, "tank");
            assert_eq!(capacity_units(&ctx, tank, Some(&"crude_oil".into())), Some(400.0));
        });
    }

    #[test]
    fn unknown_item_has_no_capacity() {
        let snapshot = layout(vec![storage("box", None)], vec![]);
        with_context(&snapshot, |ctx| {
            let flow = simulate_storage(&ctx, node_ref(&ctx, "box"), &Visited::new());
            assert_eq!(flow.capacity, None);
            assert!(!flow.can_fill);
            assert_eq!(flow, StorageFlow::default());
        });
    }

    #[test]
    fn self_referencing_storage_is_zeroed() {
        let snapshot = layout(
            vec![
                extractor("m", "iron_ore", 60.0),
                storage("a", Some("iron_ore")),
                storage("b", Some("iron_ore")),
            ],
            vec![belt("m", "a"), belt("a", "b"), belt("b", "a")],
        );
        with_context(&snapshot, |ctx| {
            let a = node_ref(&ctx, "a");
            let mut visited = Visited::new();
            visited.insert(&a.id);
            assert_eq!(simulate_storage(&ctx, a, &visited), StorageFlow::default());
            let flow = simulate_storage(&ctx, a, &Visited::new());
            assert!(flow.in_rate.is_finite());
        });
    }

    #[test]
    fn serializes_camel_case() {
        let flow = StorageFlow {
            in_rate: 1.0,
            can_fill: false,
            ..StorageFlow::default()
        };
        let json = serde_json::to_value(flow).unwrap();
        assert_eq!(json["inRate"], 1.0);
        assert_eq!(json["canFill"], false);
        assert!(json["fillMinutes"].is_null());
        assert!(json.get("drainMinutes").is_none());
    }
}
