//! Beltline Core -- the production-flow calculation engine for factory layouts.
//!
//! Given a snapshot of placed nodes (extractors, producers, storage, splitters,
//! lifts, goals) and the belts/pipes between them, the engine computes for
//! every node whether its supply matches its demand, and how storage buffers
//! fill or drain.
//!
//! # Calculation Pipeline
//!
//! Each call to [`engine::compute_statuses`] runs from scratch:
//!
//! 1. **Index** -- Resolve virtual edge endpoints and build adjacency.
//! 2. **Classify** -- Each connected node is classified by its type; supply
//!    is traced upstream through pass-through nodes, demand downstream.
//! 3. **Overlay** -- Item mismatch flags are computed for every edge end.
//! 4. **Mirror** -- Unwired stack parents take their active member's status.
//!
//! ```rust,ignore
//! let engine = FlowEngine::new(catalog, FlowConfig::default());
//! let report = engine.calculate(&snapshot);
//! let status = &report[&NodeId::from("smelter-1")];
//! ```
//!
//! # Key Types
//!
//! - [`engine::FlowEngine`] -- Catalog and config bound for repeated passes.
//! - [`graph::LayoutSnapshot`] -- The node and edge input of one pass.
//! - [`node::NodeKind`] -- Typed per-node configuration.
//! - [`catalog::Catalog`] -- Immutable item and building tables.
//! - [`status::NodeStatus`] -- The per-node result record.
//! - [`storage::StorageFlow`] -- Fill and drain figures of a storage node.
//!
//! The calculation never fails. Unresolvable references, cycles and zero
//! rate bases degrade to zero flow or a `None` status for the affected node.

pub mod catalog;
pub mod config;
pub mod demand;
pub mod edge;
pub mod engine;
pub mod graph;
pub mod id;
pub mod node;
pub mod rate;
pub mod recipe;
pub mod status;
pub mod storage;
pub mod supply;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
