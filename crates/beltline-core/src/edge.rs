//! Layout edges (belts and pipes).

use crate::id::{ItemId, NodeId};
use crate::rate::Material;
use serde::{Deserialize, Serialize};

/// A connection between two nodes as drawn on the canvas.
///
/// `virtual_source_id` / `virtual_target_id` reroute a stacked or duplicated
/// node's connection without touching `source` / `target`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Edge {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: NodeId,
    pub target: NodeId,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
    pub material: Option<Material>,
    pub item_id: Option<ItemId>,
    pub virtual_source_id: Option<NodeId>,
    pub virtual_target_id: Option<NodeId>,
}

impl Edge {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn with_handles(mut self, source_handle: &str, target_handle: &str) -> Self {
        self.source_handle = Some(source_handle.to_string());
        self.target_handle = Some(target_handle.to_string());
        self
    }

    pub fn with_item(mut self, item: impl Into<ItemId>) -> Self {
        self.item_id = Some(item.into());
        self
    }

    pub fn with_virtual(mut self, source: Option<&str>, target: Option<&str>) -> Self {
        self.virtual_source_id = source.map(NodeId::from);
        self.virtual_target_id = target.map(NodeId::from);
        self
    }

    /// Source after virtual rerouting.
    pub fn effective_source(&self) -> &NodeId {
        self.virtual_source_id.as_ref().unwrap_or(&self.source)
    }

    /// Target after virtual rerouting.
    pub fn effective_target(&self) -> &NodeId {
        self.virtual_target_id.as_ref().unwrap_or(&self.target)
    }

    /// Explicit material, else derived from the handles.
    pub fn material(&self) -> Material {
        if let Some(material) = self.material {
            return material;
        }
        self.source_handle
            .as_deref()
            .or(self.target_handle.as_deref())
            .map_or(Material::Belt, Material::from_handle)
    }
}

/// Trailing port index of a handle such as `belt-out-2`.
pub fn port_index(handle: &str) -> Option<usize> {
    handle.rsplit(['-', '_']).next()?.parse().ok()
}
