//! Belt and pipe throughput tiers, port capacities and stacked production.

use crate::catalog::PortSpec;
use crate::config::FlowConfig;
use crate::graph::FlowContext;
use crate::node::{Node, NodeKind};
use crate::recipe::active_recipe;
use serde::{Deserialize, Serialize};

/// Items per minute carried by conveyor belts, Mk.1 through Mk.6.
pub const BELT_RATES: [f64; 6] = [60.0, 120.0, 270.0, 480.0, 780.0, 1200.0];

/// Units per minute carried by pipelines, Mk.1 through Mk.3.
pub const PIPE_RATES: [f64; 3] = [300.0, 600.0, 1200.0];

/// What a connection carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    #[default]
    Belt,
    Pipe,
}

impl Material {
    /// Derive the material from a port handle such as `pipe-in-0`.
    pub fn from_handle(handle: &str) -> Self {
        if handle.to_ascii_lowercase().contains("pipe") {
            Material::Pipe
        } else {
            Material::Belt
        }
    }
}

/// Rate of a 1-based tier. Out-of-range tiers clamp to the nearest one.
pub fn tier_rate(material: Material, tier: u8) -> f64 {
    let table: &[f64] = match material {
        Material::Belt => &BELT_RATES,
        Material::Pipe => &PIPE_RATES,
    };
    let index = (tier.max(1) as usize - 1).min(table.len() - 1);
    table[index]
}

/// Belt and pipe tiers selected on a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TierSelection {
    pub belt_tier: Option<u8>,
    pub pipe_tier: Option<u8>,
}

impl TierSelection {
    pub fn belt(tier: u8) -> Self {
        Self {
            belt_tier: Some(tier),
            pipe_tier: None,
        }
    }

    pub fn pipe(tier: u8) -> Self {
        Self {
            belt_tier: None,
            pipe_tier: Some(tier),
        }
    }

    /// Single-lane rate for `material`, falling back to the configured default tier.
    pub fn rate(&self, material: Material, config: &FlowConfig) -> f64 {
        let tier = match material {
            Material::Belt => self.belt_tier.unwrap_or(config.default_belt_tier),
            Material::Pipe => self.pipe_tier.unwrap_or(config.default_pipe_tier),
        };
        tier_rate(material, tier)
    }
}

/// Capacity of one side of a building: tier rate times port count.
pub fn port_capacity(ports: &PortSpec, tiers: &TierSelection, config: &FlowConfig) -> f64 {
    tiers.rate(ports.material(), config) * ports.port_count() as f64
}

/// Material leaving an extractor or producer.
///
/// Taken from the building's output ports, else from the item's form.
pub fn output_material(ctx: &FlowContext<'_>, node: &Node) -> Material {
    if let Some(building) = node.building().and_then(|b| ctx.catalog.building(b)) {
        return building.outputs.material();
    }
    match node.configured_item().and_then(|i| ctx.catalog.item(i)) {
        Some(item) if item.is_fluid() => Material::Pipe,
        _ => Material::Belt,
    }
}

/// Throughput ceiling of an extractor or producer output lane.
pub fn output_capacity(ctx: &FlowContext<'_>, node: &Node) -> f64 {
    node.tiers().rate(output_material(ctx, node), ctx.config)
}

/// Input and output capacity of a storage node.
///
/// Without a known building the storage is a single lane on each side.
pub fn storage_capacities(ctx: &FlowContext<'_>, node: &Node) -> (f64, f64) {
    let tiers = node.tiers();
    match node.building().and_then(|b| ctx.catalog.building(b)) {
        Some(building) => (
            port_capacity(&building.inputs, &tiers, ctx.config),
            port_capacity(&building.outputs, &tiers, ctx.config),
        ),
        None => {
            let lane = port_capacity(&PortSpec::belts(1), &tiers, ctx.config);
            (lane, lane)
        }
    }
}

/// Production of a single node, ignoring stacking.
///
/// Unset production falls back to the building default (extractors) or the
/// active recipe's output basis (producers).
pub fn base_production(ctx: &FlowContext<'_>, node: &Node) -> f64 {
    let building_default = || {
        node.building()
            .and_then(|b| ctx.catalog.building(b))
            .map_or(0.0, |b| b.default_production)
    };
    match &node.kind {
        NodeKind::Extractor(cfg) => cfg.production.unwrap_or_else(building_default),
        NodeKind::Producer(cfg) => cfg.production.unwrap_or_else(|| {
            active_recipe(ctx.catalog, node)
                .map(|recipe| recipe.output_basis)
                .unwrap_or_else(building_default)
        }),
        _ => 0.0,
    }
    .max(0.0)
}

/// Production of a node including every member of its stack.
///
/// Members missing from the snapshot count as identical copies of the parent.
pub fn stacked_production(ctx: &FlowContext<'_>, node: &Node) -> f64 {
    let own = base_production(ctx, node);
    if node.stack.member_ids.is_empty() {
        return own * node.stack.count.max(1) as f64;
    }
    node.stack
        .member_ids
        .iter()
        .map(|id| {
            if *id == node.id {
                own
            } else {
                ctx.graph
                    .node(id)
                    .map_or(own, |member| base_production(ctx, member))
            }
        })
        .sum()
}
