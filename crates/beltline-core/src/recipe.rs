//! Active recipe resolution for producer nodes.
//!
//! An item either carries explicit recipes, or a legacy default requirement
//! list plus alternates. Both paths filter by the node's building and pick an
//! entry from the node's stored index, the item's default, or the first match.

use crate::catalog::{Catalog, ItemDef, ItemRate};
use crate::id::{BuildingId, ItemId};
use crate::node::Node;

/// Recipe choice stored on a producer node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecipeSelection {
    pub recipe_index: Option<usize>,
    /// Negative values select the item's default requirement list.
    pub alternate_index: Option<i32>,
}

/// Where the active requirement list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeSource {
    /// Index into the item's `recipes`.
    Recipe(usize),
    /// Index into the item's `alternates`.
    Alternate(usize),
    /// The item's default `requires` list.
    Default,
}

/// The requirement set currently in effect for a producer.
#[derive(Debug, Clone, Copy)]
pub struct ActiveRecipe<'a> {
    pub requires: &'a [ItemRate],
    /// Output per minute the requirement amounts are expressed against.
    pub output_basis: f64,
    pub byproducts: &'a [ItemRate],
    pub source: RecipeSource,
}

impl<'a> ActiveRecipe<'a> {
    /// Per-minute requirement of `item` at the base output rate.
    pub fn requirement(&self, item: &ItemId) -> Option<f64> {
        self.requires
            .iter()
            .filter(|r| r.item == *item)
            .map(|r| r.per_minute)
            .reduce(|a, b| a + b)
    }

    pub fn byproduct(&self, item: &ItemId) -> Option<f64> {
        self.byproducts
            .iter()
            .find(|r| r.item == *item)
            .map(|r| r.per_minute)
    }
}

fn producer_allowed(filter: &[BuildingId], building: Option<&BuildingId>) -> bool {
    match building {
        Some(building) => filter.is_empty() || filter.contains(building),
        None => true,
    }
}

/// Pick from a filtered candidate list: stored index, then default, then first.
fn select<T>(candidates: &[T], stored: Option<usize>, default: Option<usize>) -> Option<&T> {
    stored
        .and_then(|i| candidates.get(i))
        .or_else(|| default.and_then(|i| candidates.get(i)))
        .or_else(|| candidates.first())
}

/// Resolve the active requirement set of `item` for a node running on `building`.
///
/// Returns `None` when nothing applies; such a node has no demand.
pub fn resolve_active_recipe<'a>(
    item: &'a ItemDef,
    building: Option<&BuildingId>,
    selection: RecipeSelection,
) -> Option<ActiveRecipe<'a>> {
    if !item.recipes.is_empty() {
        let filtered: Vec<usize> = (0..item.recipes.len())
            .filter(|&i| producer_allowed(&item.recipes[i].producers, building))
            .collect();
        let index = *select(&filtered, selection.recipe_index, item.default_recipe)?;
        let recipe = &item.recipes[index];
        return Some(ActiveRecipe {
            requires: &recipe.inputs,
            output_basis: recipe.output,
            byproducts: &recipe.byproducts,
            source: RecipeSource::Recipe(index),
        });
    }

    let default = ActiveRecipe {
        requires: &item.requires,
        output_basis: item.default_production,
        byproducts: &item.byproducts,
        source: RecipeSource::Default,
    };

    if item.alternates.is_empty() {
        return Some(default);
    }

    let default_allowed = producer_allowed(&item.default_producers, building);
    let filtered: Vec<usize> = (0..item.alternates.len())
        .filter(|&i| producer_allowed(&item.alternates[i].producers, building))
        .collect();
    let alternate = move |index: usize| {
        let alt = &item.alternates[index];
        ActiveRecipe {
            requires: &alt.requires,
            output_basis: alt.default_production,
            byproducts: &alt.byproducts,
            source: RecipeSource::Alternate(index),
        }
    };

    match selection.alternate_index {
        Some(i) if i >= 0 => {
            if let Some(&index) = filtered.get(i as usize) {
                return Some(alternate(index));
            }
        }
        _ => {}
    }
    if default_allowed {
        return Some(default);
    }
    filtered.first().map(|&index| alternate(index))
}

/// Active recipe of a producer node, looked up through the catalog.
pub fn active_recipe<'a>(catalog: &'a Catalog, node: &Node) -> Option<ActiveRecipe<'a>> {
    let item_id = node.configured_item()?;
    let Some(item) = catalog.item(item_id) else {
        tracing::debug!(node = %node.id, item = %item_id, "item not in catalog");
        return None;
    };
    let recipe = resolve_active_recipe(item, node.building(), node.recipe_selection());
    if recipe.is_none() {
        tracing::debug!(node = %node.id, item = %item_id, "no recipe applies to this producer");
    }
    recipe
}
