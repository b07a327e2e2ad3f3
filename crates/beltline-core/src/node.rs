//! Typed layout nodes.
//!
//! A node's attribute bag is resolved into one configuration struct per node
//! type at the serde boundary, so the engine never probes untyped fields.

use crate::id::{BuildingId, ItemId, NodeId};
use crate::rate::TierSelection;
use crate::recipe::RecipeSelection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node of the layout snapshot.
///
/// Serialized as `{ "id": .., "type": .., "data": { .. }, "stack": { .. } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "StackInfo::is_empty")]
    pub stack: StackInfo,
}

/// Per-type node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum NodeKind {
    Extractor(ExtractorConfig),
    Producer(ProducerConfig),
    Storage(StorageConfig),
    Splitter(SplitterConfig),
    Lift(LiftConfig),
    #[serde(alias = "terminal")]
    Goal(GoalConfig),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractorConfig {
    pub item: Option<ItemId>,
    pub building: Option<BuildingId>,
    pub production: Option<f64>,
    #[serde(flatten)]
    pub tiers: TierSelection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProducerConfig {
    pub item: Option<ItemId>,
    pub building: Option<BuildingId>,
    pub production: Option<f64>,
    pub recipe_index: Option<usize>,
    pub alternate_index: Option<i32>,
    #[serde(flatten)]
    pub tiers: TierSelection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageConfig {
    pub building: Option<BuildingId>,
    pub stored_item: Option<ItemId>,
    pub stored_amount: Option<f64>,
    #[serde(flatten)]
    pub tiers: TierSelection,
}

/// A splitter. `branches` maps an output handle to the item it is filtered to;
/// outputs without an entry accept any item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SplitterConfig {
    pub branches: BTreeMap<String, ItemId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiftConfig {
    pub item: Option<ItemId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoalConfig {
    pub item: Option<ItemId>,
    pub rate: f64,
}

/// Stack metadata: several identical nodes merged into one logical unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StackInfo {
    pub count: u32,
    pub member_ids: Vec<NodeId>,
    pub active_id: Option<NodeId>,
}

impl StackInfo {
    pub fn is_empty(&self) -> bool {
        self.count <= 1 && self.member_ids.is_empty() && self.active_id.is_none()
    }

    /// The member whose status the stack shows.
    pub fn active_member(&self) -> Option<&NodeId> {
        self.active_id.as_ref().or_else(|| self.member_ids.first())
    }
}

impl Node {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            stack: StackInfo::default(),
        }
    }

    /// The item this node emits or holds, as configured.
    pub fn configured_item(&self) -> Option<&ItemId> {
        match &self.kind {
            NodeKind::Extractor(cfg) => cfg.item.as_ref(),
            NodeKind::Producer(cfg) => cfg.item.as_ref(),
            NodeKind::Storage(cfg) => cfg.stored_item.as_ref(),
            NodeKind::Lift(cfg) => cfg.item.as_ref(),
            NodeKind::Goal(cfg) => cfg.item.as_ref(),
            NodeKind::Splitter(_) => None,
        }
    }

    pub fn building(&self) -> Option<&BuildingId> {
        match &self.kind {
            NodeKind::Extractor(cfg) => cfg.building.as_ref(),
            NodeKind::Producer(cfg) => cfg.building.as_ref(),
            NodeKind::Storage(cfg) => cfg.building.as_ref(),
            _ => None,
        }
    }

    pub fn tiers(&self) -> TierSelection {
        match &self.kind {
            NodeKind::Extractor(cfg) => cfg.tiers,
            NodeKind::Producer(cfg) => cfg.tiers,
            NodeKind::Storage(cfg) => cfg.tiers,
            _ => TierSelection::default(),
        }
    }

    pub fn recipe_selection(&self) -> RecipeSelection {
        match &self.kind {
            NodeKind::Producer(cfg) => RecipeSelection {
                recipe_index: cfg.recipe_index,
                alternate_index: cfg.alternate_index,
            },
            _ => RecipeSelection::default(),
        }
    }

    /// Whether this node forwards flow instead of producing or consuming it.
    pub fn is_pass_through(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Storage(_) | NodeKind::Splitter(_) | NodeKind::Lift(_)
        )
    }

    pub fn is_stack_parent(&self) -> bool {
        !self.stack.member_ids.is_empty()
    }

    pub fn with_tiers(mut self, tiers: TierSelection) -> Self {
        match &mut self.kind {
            NodeKind::Extractor(cfg) => cfg.tiers = tiers,
            NodeKind::Producer(cfg) => cfg.tiers = tiers,
            NodeKind::Storage(cfg) => cfg.tiers = tiers,
            _ => {}
        }
        self
    }

    pub fn with_building(mut self, building: impl Into<BuildingId>) -> Self {
        let building = Some(building.into());
        match &mut self.kind {
            NodeKind::Extractor(cfg) => cfg.building = building,
            NodeKind::Producer(cfg) => cfg.building = building,
            NodeKind::Storage(cfg) => cfg.building = building,
            _ => {}
        }
        self
    }

    pub fn with_stack(mut self, members: &[&str], active: Option<&str>) -> Self {
        self.stack = StackInfo {
            count: members.len() as u32,
            member_ids: members.iter().map(|m| NodeId::from(*m)).collect(),
            active_id: active.map(NodeId::from),
        };
        self
    }
}
