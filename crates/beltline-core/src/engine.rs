//! The flow engine: indexes a snapshot and classifies every node.
//!
//! # Passes
//!
//! Each `calculate()` runs:
//! 1. **Index** -- build the [`FlowGraph`] (virtual rerouting, dangling edges dropped)
//! 2. **Classify** -- edge-less nodes are disconnected; the rest go to their
//!    type's classifier, then get mismatch flags overlaid
//! 3. **Mirror** -- stack parents without edges of their own copy the status
//!    of their active member
//!
//! Nothing is cached between calls. Every root query starts from an empty
//! visited set, so independent calls never share state.

use crate::catalog::Catalog;
use crate::config::FlowConfig;
use crate::graph::{FlowContext, FlowGraph, LayoutSnapshot};
use crate::id::NodeId;
use crate::status::{FlowStatus, NodeStatus, classify, detect_mismatch};
use std::collections::BTreeMap;

/// Status of every node, keyed by node id.
pub type FlowReport = BTreeMap<NodeId, NodeStatus>;

// ---------------------------------------------------------------------------
// Free-function entry point
// ---------------------------------------------------------------------------

/// Compute the status of every node in `snapshot`.
pub fn compute_statuses(
    snapshot: &LayoutSnapshot,
    catalog: &Catalog,
    config: &FlowConfig,
) -> FlowReport {
    let graph = FlowGraph::build(snapshot);
    let ctx = FlowContext::new(&graph, catalog, config);

    let mut report = FlowReport::new();
    for node in graph.nodes() {
        let status = if graph.has_edges(&node.id) {
            let mut status = classify(&ctx, node);
            status.apply_mismatch(detect_mismatch(&ctx, node));
            status
        } else {
            NodeStatus::disconnected()
        };
        report.insert(node.id.clone(), status);
    }

    mirror_stack_parents(&graph, &mut report);

    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        optimal = count(&report, FlowStatus::Optimal),
        under = count(&report, FlowStatus::Under),
        over = count(&report, FlowStatus::Over),
        "flow pass complete"
    );
    report
}

fn mirror_stack_parents(graph: &FlowGraph<'_>, report: &mut FlowReport) {
    for node in graph.nodes() {
        if !node.is_stack_parent() || graph.has_edges(&node.id) {
            continue;
        }
        let Some(active) = node.stack.active_member() else {
            continue;
        };
        if *active == node.id {
            continue;
        }
        if let Some(mirrored) = report.get(active).cloned() {
            tracing::trace!(parent = %node.id, %active, "mirroring stack member status");
            report.insert(node.id.clone(), mirrored);
        }
    }
}

fn count(report: &FlowReport, status: FlowStatus) -> usize {
    report.values().filter(|s| s.status == Some(status)).count()
}

// ---------------------------------------------------------------------------
// FlowEngine
// ---------------------------------------------------------------------------

/// A catalog and configuration bound together for repeated calculations.
#[derive(Debug, Clone)]
pub struct FlowEngine {
    catalog: Catalog,
    config: FlowConfig,
}

impl FlowEngine {
    pub fn new(catalog: Catalog, config: FlowConfig) -> Self {
        Self { catalog, config }
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        Self::new(catalog, FlowConfig::default())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: FlowConfig) {
        self.config = config;
    }

    /// Recompute every node status from scratch.
    pub fn calculate(&self, snapshot: &LayoutSnapshot) -> FlowReport {
        compute_statuses(snapshot, &self.catalog, &self.config)
    }
}
