//! Snapshot indexing.
//!
//! Turns a [`LayoutSnapshot`] into a [`FlowGraph`]: nodes looked up by id and
//! a canonical edge list with virtual rerouting already applied, plus
//! outgoing/incoming adjacency keyed by the effective endpoints.

use crate::catalog::Catalog;
use crate::config::FlowConfig;
use crate::edge::Edge;
use crate::id::{ItemId, NodeId};
use crate::node::Node;
use crate::rate::Material;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The full input of one calculation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl LayoutSnapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }
}

/// Index of an edge in [`FlowGraph::edges`].
pub type EdgeIndex = usize;

/// An edge after rerouting, with its endpoints resolved.
#[derive(Debug, Clone, Copy)]
pub struct FlowEdge<'a> {
    pub source: &'a NodeId,
    pub target: &'a NodeId,
    pub material: Material,
    /// Explicit item override.
    pub item: Option<&'a ItemId>,
    pub source_handle: Option<&'a str>,
    pub raw: &'a Edge,
}

/// Outgoing and incoming edge lists keyed by effective endpoint.
#[derive(Debug, Default)]
pub struct Adjacency<'a> {
    pub outgoing: HashMap<&'a NodeId, Vec<EdgeIndex>>,
    pub incoming: HashMap<&'a NodeId, Vec<EdgeIndex>>,
}

/// Build adjacency for a list of edges, keyed by virtual ids when present.
pub fn index_edges<'a>(edges: impl IntoIterator<Item = &'a Edge>) -> Adjacency<'a> {
    let mut adjacency = Adjacency::default();
    for (index, edge) in edges.into_iter().enumerate() {
        adjacency
            .outgoing
            .entry(edge.effective_source())
            .or_default()
            .push(index);
        adjacency
            .incoming
            .entry(edge.effective_target())
            .or_default()
            .push(index);
    }
    adjacency
}

/// Read-only graph view over one snapshot.
#[derive(Debug)]
pub struct FlowGraph<'a> {
    nodes: HashMap<&'a NodeId, &'a Node>,
    order: Vec<&'a Node>,
    edges: Vec<FlowEdge<'a>>,
    adjacency: Adjacency<'a>,
}

impl<'a> FlowGraph<'a> {
    /// Index a snapshot.
    ///
    /// Duplicate node ids keep the first occurrence. Edges whose effective
    /// source or target is not in the snapshot are dropped.
    pub fn build(snapshot: &'a LayoutSnapshot) -> Self {
        let mut nodes = HashMap::with_capacity(snapshot.nodes.len());
        let mut order = Vec::with_capacity(snapshot.nodes.len());
        for node in &snapshot.nodes {
            if nodes.contains_key(&node.id) {
                tracing::warn!(node = %node.id, "duplicate node id ignored");
                continue;
            }
            nodes.insert(&node.id, node);
            order.push(node);
        }

        let mut edges = Vec::with_capacity(snapshot.edges.len());
        for edge in &snapshot.edges {
            let source = edge.effective_source();
            let target = edge.effective_target();
            if !nodes.contains_key(source) || !nodes.contains_key(target) {
                tracing::debug!(%source, %target, "dropping dangling edge");
                continue;
            }
            edges.push(edge);
        }

        let adjacency = index_edges(edges.iter().copied());
        let edges = edges
            .into_iter()
            .map(|edge| FlowEdge {
                source: edge.effective_source(),
                target: edge.effective_target(),
                material: edge.material(),
                item: edge.item_id.as_ref(),
                source_handle: edge.source_handle.as_deref(),
                raw: edge,
            })
            .collect();

        Self {
            nodes,
            order,
            edges,
            adjacency,
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&'a Node> {
        self.nodes.get(id).copied()
    }

    /// Nodes in snapshot order.
    pub fn nodes(&self) -> impl Iterator<Item = &'a Node> + '_ {
        self.order.iter().copied()
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    pub fn edge(&self, index: EdgeIndex) -> &FlowEdge<'a> {
        &self.edges[index]
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn outgoing(&self, id: &NodeId) -> &[EdgeIndex] {
        self.adjacency.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn incoming(&self, id: &NodeId) -> &[EdgeIndex] {
        self.adjacency.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_edges(&self, id: &NodeId) -> bool {
        !self.outgoing(id).is_empty() || !self.incoming(id).is_empty()
    }
}

/// Node ids already on the current traversal path.
///
/// Each recursive branch receives its own clone, so sibling branches never
/// see each other's entries.
pub type Visited<'a> = HashSet<&'a NodeId>;

/// Everything a resolver needs for one pass.
#[derive(Debug, Clone, Copy)]
pub struct FlowContext<'a> {
    pub graph: &'a FlowGraph<'a>,
    pub catalog: &'a Catalog,
    pub config: &'a FlowConfig,
}

impl<'a> FlowContext<'a> {
    pub fn new(graph: &'a FlowGraph<'a>, catalog: &'a Catalog, config: &'a FlowConfig) -> Self {
        Self {
            graph,
            catalog,
            config,
        }
    }

    /// Clone `visited` and add `id`, or `None` if `id` is already on the path.
    pub fn enter(&self, visited: &Visited<'a>, id: &'a NodeId) -> Option<Visited<'a>> {
        if visited.contains(id) {
            tracing::trace!(node = %id, "cycle cut");
            return None;
        }
        let mut next = visited.clone();
        next.insert(id);
        Some(next)
    }
}
