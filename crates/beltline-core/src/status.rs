//! Per-node status classification and item mismatch detection.

use crate::demand::{downstream_demand, input_demands, required_items};
use crate::graph::{FlowContext, Visited};
use crate::id::ItemId;
use crate::node::{Node, NodeKind};
use crate::rate::{output_capacity, stacked_production};
use crate::storage::{StorageFlow, simulate_storage};
use crate::supply::{edge_item, incoming_supply, stored_item};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Status record
// ---------------------------------------------------------------------------

/// Balance of supply against demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowStatus {
    Optimal,
    Under,
    Over,
}

/// Classify a supply/demand pair. Optimal within `tolerance × demand`.
pub fn determine_status(supply: f64, demand: f64, tolerance: f64) -> FlowStatus {
    if (supply - demand).abs() <= tolerance * demand {
        FlowStatus::Optimal
    } else if supply < demand {
        FlowStatus::Under
    } else {
        FlowStatus::Over
    }
}

/// Supply and demand of one required input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDetail {
    pub item_id: ItemId,
    pub supply: f64,
    pub demand: f64,
}

impl InputDetail {
    fn ratio(&self) -> f64 {
        self.supply / self.demand
    }
}

/// Calculated state of one node.
///
/// `status` is `None` when there is nothing to report: the node is
/// disconnected, unconfigured, or states no demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeStatus {
    pub status: Option<FlowStatus>,
    pub supply: f64,
    pub demand: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_flow: Option<StorageFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_details: Option<Vec<InputDetail>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub terminal_input_only: bool,
    pub mismatch_incoming: bool,
    pub mismatch_outgoing: bool,
    pub mismatch_outgoing_count: usize,
    pub mismatch_outgoing_total: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disconnected: bool,
}

impl NodeStatus {
    pub fn disconnected() -> Self {
        Self {
            disconnected: true,
            ..Self::default()
        }
    }

    fn balance(status: Option<FlowStatus>, supply: f64, demand: f64) -> Self {
        Self {
            status,
            supply,
            demand,
            ..Self::default()
        }
    }

    pub fn apply_mismatch(&mut self, mismatch: Mismatch) {
        self.mismatch_incoming = mismatch.incoming;
        self.mismatch_outgoing = mismatch.outgoing_count > 0;
        self.mismatch_outgoing_count = mismatch.outgoing_count;
        self.mismatch_outgoing_total = mismatch.outgoing_total;
    }
}

// ---------------------------------------------------------------------------
// Mismatch detection
// ---------------------------------------------------------------------------

/// Edges whose item the consuming end does not require.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mismatch {
    pub incoming: bool,
    /// Outgoing edges into consumers that do not require their item.
    pub outgoing_count: usize,
    /// Outgoing edges into consumers with a non-empty required set.
    pub outgoing_total: usize,
}

pub fn detect_mismatch<'a>(ctx: &FlowContext<'a>, node: &'a Node) -> Mismatch {
    let required = required_items(ctx, node);
    let incoming = !required.is_empty()
        && ctx.graph.incoming(&node.id).iter().any(|&index| {
            edge_item(ctx, ctx.graph.edge(index)).is_some_and(|item| !required.contains(item))
        });

    let mut mismatch = Mismatch {
        incoming,
        ..Mismatch::default()
    };
    for &index in ctx.graph.outgoing(&node.id) {
        let edge = ctx.graph.edge(index);
        let Some(target) = ctx.graph.node(edge.target) else {
            continue;
        };
        let accepted = required_items(ctx, target);
        if accepted.is_empty() {
            continue;
        }
        mismatch.outgoing_total += 1;
        if edge_item(ctx, edge).is_some_and(|item| !accepted.contains(item)) {
            mismatch.outgoing_count += 1;
        }
    }
    mismatch
}

// ---------------------------------------------------------------------------
// Classifiers
// ---------------------------------------------------------------------------

/// Own output against downstream demand. Used by extractors and by producers
/// that both receive and emit.
fn output_balance<'a>(ctx: &FlowContext<'a>, node: &'a Node) -> NodeStatus {
    let Some(item) = node.configured_item() else {
        return NodeStatus::default();
    };
    let supply = stacked_production(ctx, node).min(output_capacity(ctx, node));
    let demand = downstream_demand(ctx, node, item, &Visited::new());
    let status = if demand > 0.0 {
        Some(determine_status(supply, demand, ctx.config.tolerance))
    } else if ctx.graph.outgoing(&node.id).is_empty() {
        None
    } else {
        Some(FlowStatus::Over)
    };
    NodeStatus::balance(status, supply, demand)
}

fn input_balance<'a>(ctx: &FlowContext<'a>, node: &'a Node) -> Vec<InputDetail> {
    input_demands(ctx, node)
        .into_iter()
        .map(|(item, demand)| InputDetail {
            item_id: item.clone(),
            supply: incoming_supply(ctx, node, item),
            demand,
        })
        .collect()
}

/// The input with the lowest supply/demand ratio.
fn worst_input(details: &[InputDetail]) -> Option<&InputDetail> {
    details
        .iter()
        .filter(|d| d.demand > 0.0)
        .min_by(|a, b| a.ratio().total_cmp(&b.ratio()))
}

pub fn classify_extractor<'a>(ctx: &FlowContext<'a>, node: &'a Node) -> NodeStatus {
    output_balance(ctx, node)
}

pub fn classify_producer<'a>(ctx: &FlowContext<'a>, node: &'a Node) -> NodeStatus {
    let details = input_balance(ctx, node);
    let worst = worst_input(&details);
    let has_incoming = !ctx.graph.incoming(&node.id).is_empty();
    let has_outgoing = !ctx.graph.outgoing(&node.id).is_empty();

    let mut status = match worst {
        Some(worst) if !has_incoming => NodeStatus {
            terminal_input_only: true,
            ..NodeStatus::balance(Some(FlowStatus::Under), worst.supply, worst.demand)
        },
        Some(worst) if !has_outgoing => NodeStatus::balance(
            Some(determine_status(worst.supply, worst.demand, ctx.config.tolerance)),
            worst.supply,
            worst.demand,
        ),
        None if !has_outgoing => NodeStatus::default(),
        _ => output_balance(ctx, node),
    };
    if !details.is_empty() {
        status.input_details = Some(details);
    }
    status
}

pub fn classify_storage<'a>(ctx: &FlowContext<'a>, node: &'a Node) -> NodeStatus {
    let flow = simulate_storage(ctx, node, &Visited::new());
    let has_incoming = !ctx.graph.incoming(&node.id).is_empty();
    // A known item counts as stock; the amount only drives fill and drain.
    let has_stock = stored_item(ctx, node).is_some();
    let demand = flow.out_demand;
    let supply = if !has_incoming && has_stock && demand > 0.0 {
        flow.out_rate
    } else {
        flow.in_rate
    };
    let status = if demand > 0.0 {
        Some(determine_status(supply, demand, ctx.config.tolerance))
    } else if has_incoming {
        Some(FlowStatus::Over)
    } else {
        None
    };
    NodeStatus {
        storage_flow: Some(flow),
        ..NodeStatus::balance(status, supply, demand)
    }
}

pub fn classify_goal<'a>(ctx: &FlowContext<'a>, node: &'a Node) -> NodeStatus {
    let details = input_balance(ctx, node);
    let mut status = match worst_input(&details) {
        Some(worst) => NodeStatus::balance(
            Some(determine_status(worst.supply, worst.demand, ctx.config.tolerance)),
            worst.supply,
            worst.demand,
        ),
        None => NodeStatus::default(),
    };
    if !details.is_empty() {
        status.input_details = Some(details);
    }
    status
}

/// Splitters and lifts only report what passes through them.
pub fn classify_pass_through<'a>(ctx: &FlowContext<'a>, node: &'a Node) -> NodeStatus {
    let item = match &node.kind {
        NodeKind::Lift(cfg) => cfg.item.as_ref(),
        // Unfiltered splitter outputs carry the first resolvable input.
        _ => stored_item(ctx, node),
    };
    let Some(item) = item else {
        return NodeStatus::default();
    };
    let supply = incoming_supply(ctx, node, item);
    let demand = downstream_demand(ctx, node, item, &Visited::new());
    NodeStatus::balance(None, supply, demand)
}

/// Classify a connected node by its type.
pub fn classify<'a>(ctx: &FlowContext<'a>, node: &'a Node) -> NodeStatus {
    match &node.kind {
        NodeKind::Extractor(_) => classify_extractor(ctx, node),
        NodeKind::Producer(_) => classify_producer(ctx, node),
        NodeKind::Storage(_) => classify_storage(ctx, node),
        NodeKind::Goal(_) => classify_goal(ctx, node),
        NodeKind::Splitter(_) | NodeKind::Lift(_) => classify_pass_through(ctx, node),
    }
}
