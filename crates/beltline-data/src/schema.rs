//! Serde data file structs for catalog content.
//!
//! These structs define the on-disk format for items, recipes and buildings.
//! They are deserialized from RON, JSON, or TOML data files and then resolved
//! into core catalog types by the loader.

use beltline_core::catalog::{
    AlternateDef, BuildingCategory, BuildingDef, Inventory, InventoryUnit, ItemDef, ItemForm,
    ItemRate, PortSpec, RecipeDef,
};
use beltline_core::id::{BuildingId, ItemId};
use beltline_core::rate::Material;
use serde::Deserialize;

// ===========================================================================
// Shared: rates and producer filters
// ===========================================================================

/// An item amount per minute, in short tuple form or full form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RateData {
    /// Short form: `("iron_ore", 30.0)`.
    Short(String, f64),
    /// Full form with explicit fields.
    Full { item: String, per_minute: f64 },
}

impl RateData {
    pub fn item(&self) -> &str {
        match self {
            RateData::Short(item, _) | RateData::Full { item, .. } => item,
        }
    }

    pub fn per_minute(&self) -> f64 {
        match self {
            RateData::Short(_, rate) | RateData::Full { per_minute: rate, .. } => *rate,
        }
    }

    fn to_rate(&self) -> ItemRate {
        ItemRate::new(self.item(), self.per_minute())
    }
}

/// Buildings allowed to run a recipe: a single id or a list.
///
/// Missing means any building.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProducerFilter {
    One(String),
    Many(Vec<String>),
}

impl Default for ProducerFilter {
    fn default() -> Self {
        ProducerFilter::Many(Vec::new())
    }
}

impl ProducerFilter {
    pub fn names(&self) -> &[String] {
        match self {
            ProducerFilter::One(name) => std::slice::from_ref(name),
            ProducerFilter::Many(names) => names,
        }
    }

    fn to_ids(&self) -> Vec<BuildingId> {
        self.names().iter().map(|n| BuildingId::from(n.as_str())).collect()
    }
}

fn rates(list: &[RateData]) -> Vec<ItemRate> {
    list.iter().map(RateData::to_rate).collect()
}

// ===========================================================================
// Items
// ===========================================================================

/// A recipe entry of an item.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<RateData>,
    pub output: f64,
    #[serde(default)]
    pub byproducts: Vec<RateData>,
    #[serde(default)]
    pub produced_by: ProducerFilter,
}

/// An alternate requirement set of a legacy item.
#[derive(Debug, Clone, Deserialize)]
pub struct AlternateData {
    pub name: String,
    #[serde(default)]
    pub requires: Vec<RateData>,
    #[serde(default)]
    pub default_production: f64,
    #[serde(default)]
    pub byproducts: Vec<RateData>,
    #[serde(default)]
    pub produced_by: ProducerFilter,
}

/// An item definition in a data file.
///
/// Either `recipes` or the legacy `requires` / `alternates` pair is used;
/// raw resources carry neither.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub fluid: bool,
    #[serde(default)]
    pub stack_size: Option<u32>,
    #[serde(default)]
    pub recipes: Vec<RecipeData>,
    #[serde(default)]
    pub default_recipe: Option<usize>,
    #[serde(default)]
    pub requires: Vec<RateData>,
    #[serde(default)]
    pub alternates: Vec<AlternateData>,
    #[serde(default)]
    pub default_production: f64,
    #[serde(default)]
    pub produced_by: ProducerFilter,
    #[serde(default)]
    pub byproducts: Vec<RateData>,
}

impl ItemData {
    /// Every item name referenced by requirements and byproducts.
    pub fn item_refs(&self) -> impl Iterator<Item = &str> {
        let recipes = self
            .recipes
            .iter()
            .flat_map(|r| r.inputs.iter().chain(r.byproducts.iter()));
        let alternates = self
            .alternates
            .iter()
            .flat_map(|a| a.requires.iter().chain(a.byproducts.iter()));
        recipes
            .chain(alternates)
            .chain(self.requires.iter())
            .chain(self.byproducts.iter())
            .map(RateData::item)
    }

    /// Every building name referenced by producer filters.
    pub fn building_refs(&self) -> impl Iterator<Item = &str> {
        self.recipes
            .iter()
            .flat_map(|r| r.produced_by.names())
            .chain(self.alternates.iter().flat_map(|a| a.produced_by.names()))
            .chain(self.produced_by.names())
            .map(String::as_str)
    }

    pub fn to_def(&self) -> ItemDef {
        ItemDef {
            id: ItemId::from(self.id.as_str()),
            name: self.name.clone(),
            category: self.category.clone(),
            form: if self.fluid {
                ItemForm::Fluid
            } else {
                ItemForm::Solid
            },
            stack_size: self.stack_size,
            recipes: self
                .recipes
                .iter()
                .map(|r| RecipeDef {
                    name: r.name.clone(),
                    inputs: rates(&r.inputs),
                    output: r.output,
                    byproducts: rates(&r.byproducts),
                    producers: r.produced_by.to_ids(),
                })
                .collect(),
            default_recipe: self.default_recipe,
            requires: rates(&self.requires),
            alternates: self
                .alternates
                .iter()
                .map(|a| AlternateDef {
                    name: a.name.clone(),
                    requires: rates(&a.requires),
                    default_production: a.default_production,
                    byproducts: rates(&a.byproducts),
                    producers: a.produced_by.to_ids(),
                })
                .collect(),
            default_production: self.default_production,
            default_producers: self.produced_by.to_ids(),
            byproducts: rates(&self.byproducts),
        }
    }
}

// ===========================================================================
// Buildings
// ===========================================================================

/// Broad role of a building in a data file.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryData {
    Extraction,
    #[default]
    Production,
    Storage,
    Logistics,
}

impl From<CategoryData> for BuildingCategory {
    fn from(category: CategoryData) -> Self {
        match category {
            CategoryData::Extraction => BuildingCategory::Extraction,
            CategoryData::Production => BuildingCategory::Production,
            CategoryData::Storage => BuildingCategory::Storage,
            CategoryData::Logistics => BuildingCategory::Logistics,
        }
    }
}

/// One side of a building's ports. Defaults to a single belt.
#[derive(Debug, Clone, Deserialize)]
pub struct PortData {
    #[serde(default = "default_kinds")]
    pub kinds: Vec<Material>,
    #[serde(default = "default_port_count")]
    pub count: u32,
}

fn default_kinds() -> Vec<Material> {
    vec![Material::Belt]
}

fn default_port_count() -> u32 {
    1
}

impl Default for PortData {
    fn default() -> Self {
        Self {
            kinds: default_kinds(),
            count: default_port_count(),
        }
    }
}

impl PortData {
    fn to_spec(&self) -> PortSpec {
        PortSpec {
            kinds: self.kinds.clone(),
            count: self.count,
        }
    }
}

/// How a storage inventory is measured.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitData {
    #[default]
    Slots,
    Volume,
}

/// Inventory of a storage building.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryData {
    pub size: f64,
    #[serde(default)]
    pub unit: UnitData,
}

/// A building definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildingData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: CategoryData,
    #[serde(default)]
    pub inputs: PortData,
    #[serde(default)]
    pub outputs: PortData,
    #[serde(default)]
    pub inventory: Option<InventoryData>,
    #[serde(default)]
    pub default_production: f64,
    #[serde(default)]
    pub default_power: f64,
}

impl BuildingData {
    pub fn to_def(&self) -> BuildingDef {
        BuildingDef {
            id: BuildingId::from(self.id.as_str()),
            name: self.name.clone(),
            category: self.category.into(),
            inputs: self.inputs.to_spec(),
            outputs: self.outputs.to_spec(),
            inventory: self.inventory.as_ref().map(|inv| Inventory {
                size: inv.size,
                unit: match inv.unit {
                    UnitData::Slots => InventoryUnit::Slots,
                    UnitData::Volume => InventoryUnit::Volume,
                },
            }),
            default_production: self.default_production,
            default_power: self.default_power,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
