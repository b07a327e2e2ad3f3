//! Output rate resolution.
//!
//! Answers "how much of item X reaches this edge" by walking upstream from
//! the edge's source. Extractors and producers terminate the walk; storage,
//! lifts and splitters forward it, with fan-out shares applied per edge.
//! Every recursive step clones the visited set, and any unresolvable
//! reference yields zero.

use crate::graph::{FlowContext, FlowEdge, Visited};
use crate::id::{ItemId, NodeId};
use crate::node::{Node, NodeKind, ProducerConfig, SplitterConfig};
use crate::rate::{output_capacity, stacked_production};
use crate::recipe::active_recipe;
use crate::storage::simulate_storage;

// ---------------------------------------------------------------------------
// Edge item identity
// ---------------------------------------------------------------------------

fn branch_filter<'a>(cfg: &'a SplitterConfig, edge: &FlowEdge<'a>) -> Option<&'a ItemId> {
    edge.source_handle.and_then(|handle| cfg.branches.get(handle))
}

/// Item restriction stated on the edge itself: the explicit override, or the
/// splitter branch it leaves from. Never inferred from upstream.
pub fn edge_filter<'a>(ctx: &FlowContext<'a>, edge: &FlowEdge<'a>) -> Option<&'a ItemId> {
    edge.item.or_else(|| match &ctx.graph.node(edge.source)?.kind {
        NodeKind::Splitter(cfg) => branch_filter(cfg, edge),
        _ => None,
    })
}

/// Item flowing on `edge`.
///
/// The explicit override wins; otherwise it is derived from the source's
/// current configuration (output item, stored item, splitter branch). An
/// unfiltered splitter output carries whatever its first resolvable input
/// carries.
///
/// Item identity depends only on what lies upstream, so the walk keeps its
/// own cycle guard instead of the caller's path.
pub fn edge_item<'a>(ctx: &FlowContext<'a>, edge: &FlowEdge<'a>) -> Option<&'a ItemId> {
    resolve_edge_item(ctx, edge, &Visited::new())
}

/// Item held by a storage node: configured, else inferred from its inputs.
pub fn stored_item<'a>(ctx: &FlowContext<'a>, node: &'a Node) -> Option<&'a ItemId> {
    resolve_stored_item(ctx, node, &Visited::new())
}

fn resolve_edge_item<'a>(
    ctx: &FlowContext<'a>,
    edge: &FlowEdge<'a>,
    visited: &Visited<'a>,
) -> Option<&'a ItemId> {
    if let Some(item) = edge.item {
        return Some(item);
    }
    let source = ctx.graph.node(edge.source)?;
    match &source.kind {
        NodeKind::Extractor(cfg) => cfg.item.as_ref(),
        NodeKind::Producer(cfg) => cfg.item.as_ref(),
        NodeKind::Lift(cfg) => cfg.item.as_ref(),
        NodeKind::Storage(_) => resolve_stored_item(ctx, source, visited),
        NodeKind::Splitter(cfg) => branch_filter(cfg, edge).or_else(|| {
            let inner = ctx.enter(visited, &source.id)?;
            first_incoming_item(ctx, source, &inner)
        }),
        NodeKind::Goal(_) => None,
    }
}

fn resolve_stored_item<'a>(
    ctx: &FlowContext<'a>,
    node: &'a Node,
    visited: &Visited<'a>,
) -> Option<&'a ItemId> {
    if let Some(item) = node.configured_item() {
        return Some(item);
    }
    let inner = ctx.enter(visited, &node.id)?;
    first_incoming_item(ctx, node, &inner)
}

fn first_incoming_item<'a>(
    ctx: &FlowContext<'a>,
    node: &'a Node,
    visited: &Visited<'a>,
) -> Option<&'a ItemId> {
    ctx.graph
        .incoming(&node.id)
        .iter()
        .find_map(|&index| resolve_edge_item(ctx, ctx.graph.edge(index), visited))
}

/// Whether `edge` can carry `item`.
///
/// Splitter outputs carry anything their branch filter allows; every other
/// edge carries exactly its resolved item.
pub fn edge_carries<'a>(ctx: &FlowContext<'a>, edge: &FlowEdge<'a>, item: &ItemId) -> bool {
    match ctx.graph.node(edge.source).map(|n| &n.kind) {
        Some(NodeKind::Splitter(_)) => edge_filter(ctx, edge).is_none_or(|filter| filter == item),
        Some(_) => edge_item(ctx, edge) == Some(item),
        None => false,
    }
}

/// Fraction of the source's output of `item` attributed to `edge`.
///
/// `1 / n` over the source's outgoing edges of the same material that carry
/// the item; zero if `edge` itself does not carry it.
pub fn fan_out_share<'a>(ctx: &FlowContext<'a>, edge: &FlowEdge<'a>, item: &ItemId) -> f64 {
    if !edge_carries(ctx, edge, item) {
        return 0.0;
    }
    let siblings = ctx
        .graph
        .outgoing(edge.source)
        .iter()
        .map(|&index| ctx.graph.edge(index))
        .filter(|other| other.material == edge.material && edge_carries(ctx, other, item))
        .count();
    if siblings == 0 {
        0.0
    } else {
        1.0 / siblings as f64
    }
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

fn producer_output(ctx: &FlowContext<'_>, node: &Node, cfg: &ProducerConfig, item: &ItemId) -> f64 {
    let capacity = output_capacity(ctx, node);
    let production = stacked_production(ctx, node);
    if cfg.item.as_ref() == Some(item) {
        return production.min(capacity);
    }
    let Some(recipe) = active_recipe(ctx.catalog, node) else {
        return 0.0;
    };
    match recipe.byproduct(item) {
        Some(amount) if recipe.output_basis > 0.0 => {
            (amount * production / recipe.output_basis).min(capacity)
        }
        _ => 0.0,
    }
}

/// Total of `item` flowing into a pass-through node across all its inputs.
pub fn trace_back<'a>(
    ctx: &FlowContext<'a>,
    node: &'a Node,
    item: &ItemId,
    visited: &Visited<'a>,
) -> f64 {
    ctx.graph
        .incoming(&node.id)
        .iter()
        .map(|&index| edge_flow(ctx, ctx.graph.edge(index), item, visited))
        .fold(0.0, |total, rate| total + rate)
}

/// Rate of `item` leaving `node_id`, restricted to `via` when given.
///
/// Without `via` this is the node's total output of the item. With `via`
/// the total is scaled by that edge's fan-out share.
pub fn output_rate<'a>(
    ctx: &FlowContext<'a>,
    node_id: &NodeId,
    item: &ItemId,
    via: Option<&FlowEdge<'a>>,
    visited: &Visited<'a>,
) -> f64 {
    let Some(node) = ctx.graph.node(node_id) else {
        return 0.0;
    };
    let share = match via {
        Some(edge) => fan_out_share(ctx, edge, item),
        None => 1.0,
    };
    if share == 0.0 {
        return 0.0;
    }

    // Storage guards its own recursion.
    if let NodeKind::Storage(_) = node.kind {
        if stored_item(ctx, node) != Some(item) {
            return 0.0;
        }
        return simulate_storage(ctx, node, visited).out_rate * share;
    }

    let Some(inner) = ctx.enter(visited, &node.id) else {
        return 0.0;
    };
    let total = match &node.kind {
        NodeKind::Extractor(cfg) => {
            if cfg.item.as_ref() != Some(item) {
                return 0.0;
            }
            stacked_production(ctx, node).min(output_capacity(ctx, node))
        }
        NodeKind::Producer(cfg) => producer_output(ctx, node, cfg, item),
        NodeKind::Lift(cfg) => {
            if cfg.item.as_ref() == Some(item) {
                ctx.config.lift_rate
            } else {
                0.0
            }
        }
        NodeKind::Splitter(_) => {
            let any_branch = ctx
                .graph
                .outgoing(&node.id)
                .iter()
                .any(|&index| edge_carries(ctx, ctx.graph.edge(index), item));
            if any_branch {
                trace_back(ctx, node, item, &inner)
            } else {
                0.0
            }
        }
        NodeKind::Storage(_) | NodeKind::Goal(_) => 0.0,
    };
    total * share
}

/// Rate of `item` arriving over `edge`.
pub fn edge_flow<'a>(
    ctx: &FlowContext<'a>,
    edge: &FlowEdge<'a>,
    item: &ItemId,
    visited: &Visited<'a>,
) -> f64 {
    output_rate(ctx, edge.source, item, Some(edge), visited)
}

/// Rate of `item` arriving at `node` over all incoming edges.
pub fn incoming_supply<'a>(ctx: &FlowContext<'a>, node: &'a Node, item: &ItemId) -> f64 {
    trace_back(ctx, node, item, &Visited::new())
}
