//! Demand resolution.
//!
//! Consumers (producers and goals) state demand per required item. Demand
//! seen across an edge descends through pass-through nodes. Every incoming
//! edge that carries an item sees the consumer's full demand for it.

use crate::graph::{FlowContext, FlowEdge, Visited};
use crate::id::ItemId;
use crate::node::{Node, NodeKind};
use crate::rate::stacked_production;
use crate::recipe::active_recipe;
use crate::supply::{edge_carries, stored_item};
use std::collections::BTreeSet;

/// Items a node consumes. Empty means the node states no demand.
pub fn required_items<'a>(ctx: &FlowContext<'a>, node: &'a Node) -> BTreeSet<&'a ItemId> {
    match &node.kind {
        NodeKind::Producer(_) => active_recipe(ctx.catalog, node)
            .map(|recipe| recipe.requires.iter().map(|r| &r.item).collect())
            .unwrap_or_default(),
        NodeKind::Goal(cfg) => cfg.item.iter().collect(),
        NodeKind::Storage(cfg) => cfg.stored_item.iter().collect(),
        _ => BTreeSet::new(),
    }
}

/// Per-minute demand of a consumer for one item, including every stack member.
pub fn item_demand(ctx: &FlowContext<'_>, node: &Node, item: &ItemId) -> f64 {
    match &node.kind {
        NodeKind::Producer(_) => {
            let Some(recipe) = active_recipe(ctx.catalog, node) else {
                return 0.0;
            };
            let Some(required) = recipe.requirement(item) else {
                return 0.0;
            };
            if recipe.output_basis <= 0.0 {
                return 0.0;
            }
            required * stacked_production(ctx, node) / recipe.output_basis
        }
        NodeKind::Goal(cfg) if cfg.item.as_ref() == Some(item) => cfg.rate.max(0.0),
        _ => 0.0,
    }
}

/// Demand for every required item of a consumer, in item order.
pub fn input_demands<'a>(ctx: &FlowContext<'a>, node: &'a Node) -> Vec<(&'a ItemId, f64)> {
    required_items(ctx, node)
        .into_iter()
        .map(|item| (item, item_demand(ctx, node, item)))
        .collect()
}

/// Demand `node` places on its incoming flow of `item`.
///
/// Pass-through nodes report what their outputs demand downstream.
pub fn node_demand<'a>(
    ctx: &FlowContext<'a>,
    node: &'a Node,
    item: &ItemId,
    visited: &Visited<'a>,
) -> f64 {
    match &node.kind {
        NodeKind::Producer(_) | NodeKind::Goal(_) => item_demand(ctx, node, item),
        NodeKind::Extractor(_) => 0.0,
        NodeKind::Lift(cfg) if cfg.item.as_ref() != Some(item) => 0.0,
        NodeKind::Storage(_) if stored_item(ctx, node).is_some_and(|s| s != item) => 0.0,
        NodeKind::Storage(_) | NodeKind::Splitter(_) | NodeKind::Lift(_) => {
            match ctx.enter(visited, &node.id) {
                Some(inner) => downstream_demand(ctx, node, item, &inner),
                None => 0.0,
            }
        }
    }
}

/// Demand for `item` attributed to one edge.
pub fn edge_demand<'a>(
    ctx: &FlowContext<'a>,
    edge: &FlowEdge<'a>,
    item: &ItemId,
    visited: &Visited<'a>,
) -> f64 {
    if !edge_carries(ctx, edge, item) {
        return 0.0;
    }
    let Some(target) = ctx.graph.node(edge.target) else {
        return 0.0;
    };
    node_demand(ctx, target, item, visited).max(0.0)
}

/// Total demand for `item` across all outgoing edges of `node`.
pub fn downstream_demand<'a>(
    ctx: &FlowContext<'a>,
    node: &'a Node,
    item: &ItemId,
    visited: &Visited<'a>,
) -> f64 {
    ctx.graph
        .outgoing(&node.id)
        .iter()
        .map(|&index| edge_demand(ctx, ctx.graph.edge(index), item, visited))
        .fold(0.0, |total, demand| total + demand)
}
