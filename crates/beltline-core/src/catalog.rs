//! Static game data: items, recipes and building descriptors.
//!
//! The catalog is read-only reference data for the calculation engine. It is
//! assembled through [`CatalogBuilder`] and validated once on `build()`.

use crate::id::{BuildingId, ItemId};
use crate::rate::Material;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while building a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate item id: {0}")]
    DuplicateItem(ItemId),
    #[error("duplicate building id: {0}")]
    DuplicateBuilding(BuildingId),
    #[error("item {owner} references unknown item {missing}")]
    UnknownItemRef { owner: ItemId, missing: ItemId },
}

// ---------------------------------------------------------------------------
// Items and recipes
// ---------------------------------------------------------------------------

/// An item amount expressed per minute.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRate {
    pub item: ItemId,
    pub per_minute: f64,
}

impl ItemRate {
    pub fn new(item: impl Into<ItemId>, per_minute: f64) -> Self {
        Self {
            item: item.into(),
            per_minute,
        }
    }
}

/// Physical form of an item. Fluids travel on pipes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ItemForm {
    #[default]
    Solid,
    Fluid,
}

/// A recipe producing an item.
///
/// `inputs` and `byproducts` are per-minute amounts at the recipe's base
/// `output` rate. An empty `producers` list means any building may run it.
#[derive(Debug, Clone, Default)]
pub struct RecipeDef {
    pub name: String,
    pub inputs: Vec<ItemRate>,
    pub output: f64,
    pub byproducts: Vec<ItemRate>,
    pub producers: Vec<BuildingId>,
}

/// An alternate requirement set of a legacy item (no explicit recipes).
#[derive(Debug, Clone, Default)]
pub struct AlternateDef {
    pub name: String,
    pub requires: Vec<ItemRate>,
    pub default_production: f64,
    pub byproducts: Vec<ItemRate>,
    pub producers: Vec<BuildingId>,
}

/// An item definition in the catalog.
///
/// Modern items carry `recipes`; legacy items carry a single `requires` list
/// (valid on `default_producers`) plus optional `alternates`.
#[derive(Debug, Clone, Default)]
pub struct ItemDef {
    pub id: ItemId,
    pub name: String,
    pub category: Option<String>,
    pub form: ItemForm,
    pub stack_size: Option<u32>,
    pub recipes: Vec<RecipeDef>,
    pub default_recipe: Option<usize>,
    pub requires: Vec<ItemRate>,
    pub alternates: Vec<AlternateDef>,
    pub default_production: f64,
    pub default_producers: Vec<BuildingId>,
    pub byproducts: Vec<ItemRate>,
}

impl ItemDef {
    /// A raw item with no requirements.
    pub fn raw(id: impl Into<ItemId>, name: &str) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_form(mut self, form: ItemForm) -> Self {
        self.form = form;
        self
    }

    pub fn with_stack_size(mut self, stack_size: u32) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    pub fn with_recipe(mut self, recipe: RecipeDef) -> Self {
        self.recipes.push(recipe);
        self
    }

    /// Legacy form: a single default requirement list at `default_production`.
    pub fn with_requires(mut self, requires: Vec<ItemRate>, default_production: f64) -> Self {
        self.requires = requires;
        self.default_production = default_production;
        self
    }

    pub fn with_alternate(mut self, alternate: AlternateDef) -> Self {
        self.alternates.push(alternate);
        self
    }

    pub fn is_fluid(&self) -> bool {
        self.form == ItemForm::Fluid
    }

    /// Every item id this definition refers to (requirements and byproducts).
    fn referenced_items(&self) -> impl Iterator<Item = &ItemId> {
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
            .map(|rate| &rate.item)
    }
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

/// Broad role of a building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildingCategory {
    Extraction,
    #[default]
    Production,
    Storage,
    Logistics,
}

/// Port layout of one side (input or output) of a building.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortSpec {
    pub kinds: Vec<Material>,
    pub count: u32,
}

impl PortSpec {
    pub fn belts(count: u32) -> Self {
        Self {
            kinds: vec![Material::Belt],
            count,
        }
    }

    pub fn pipes(count: u32) -> Self {
        Self {
            kinds: vec![Material::Pipe],
            count,
        }
    }

    /// The single material these ports carry.
    ///
    /// Buildings that declare both belts and pipes on one side are treated as
    /// conveyors.
    pub fn material(&self) -> Material {
        match self.kinds.as_slice() {
            [] => Material::Belt,
            [first, ..] if !self.is_mixed() => *first,
            _ => Material::Belt,
        }
    }

    /// Whether belts and pipes share this side.
    pub fn is_mixed(&self) -> bool {
        self.kinds.windows(2).any(|pair| pair[0] != pair[1])
    }

    /// Number of ports, never less than one.
    pub fn port_count(&self) -> u32 {
        self.count.max(1)
    }
}

/// How a storage building measures its inventory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InventoryUnit {
    /// Inventory is a number of slots, each holding one item stack.
    #[default]
    Slots,
    /// Inventory is a volume in item units (fluid buffers).
    Volume,
}

/// Inventory of a storage building.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inventory {
    pub size: f64,
    pub unit: InventoryUnit,
}

/// A building descriptor in the catalog.
#[derive(Debug, Clone, Default)]
pub struct BuildingDef {
    pub id: BuildingId,
    pub name: String,
    pub category: BuildingCategory,
    pub inputs: PortSpec,
    pub outputs: PortSpec,
    pub inventory: Option<Inventory>,
    pub default_production: f64,
    pub default_power: f64,
}

impl BuildingDef {
    pub fn new(id: impl Into<BuildingId>, name: &str, category: BuildingCategory) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            category,
            inputs: PortSpec::belts(1),
            outputs: PortSpec::belts(1),
            ..Self::default()
        }
    }

    pub fn with_ports(mut self, inputs: PortSpec, outputs: PortSpec) -> Self {
        self.inputs = inputs;
        self.outputs = outputs;
        self
    }

    pub fn with_inventory(mut self, size: f64, unit: InventoryUnit) -> Self {
        self.inventory = Some(Inventory { size, unit });
        self
    }

    pub fn with_default_production(mut self, per_minute: f64) -> Self {
        self.default_production = per_minute;
        self
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Collects item and building definitions before validation.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    items: Vec<ItemDef>,
    buildings: Vec<BuildingDef>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_item(&mut self, item: ItemDef) -> &mut Self {
        self.items.push(item);
        self
    }

    pub fn register_building(&mut self, building: BuildingDef) -> &mut Self {
        self.buildings.push(building);
        self
    }

    /// Validate and freeze the catalog.
    ///
    /// Rejects duplicate ids and requirements or byproducts naming items that
    /// were never registered.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let mut items = HashMap::with_capacity(self.items.len());
        for item in self.items {
            if items.contains_key(&item.id) {
                return Err(CatalogError::DuplicateItem(item.id));
            }
            items.insert(item.id.clone(), item);
        }

        for item in items.values() {
            if let Some(missing) = item.referenced_items().find(|id| !items.contains_key(*id)) {
                return Err(CatalogError::UnknownItemRef {
                    owner: item.id.clone(),
                    missing: missing.clone(),
                });
            }
        }

        let mut buildings = HashMap::with_capacity(self.buildings.len());
        for building in self.buildings {
            if buildings.contains_key(&building.id) {
                return Err(CatalogError::DuplicateBuilding(building.id));
            }
            if building.inputs.is_mixed() || building.outputs.is_mixed() {
                tracing::warn!(
                    building = %building.id,
                    "mixed port materials, using belt capacity"
                );
            }
            buildings.insert(building.id.clone(), building);
        }

        Ok(Catalog { items, buildings })
    }
}

/// Immutable item and building tables.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: HashMap<ItemId, ItemDef>,
    buildings: HashMap<BuildingId, BuildingDef>,
}

impl Catalog {
    pub fn item(&self, id: &ItemId) -> Option<&ItemDef> {
        self.items.get(id)
    }

    pub fn building(&self, id: &BuildingId) -> Option<&BuildingDef> {
        self.buildings.get(id)
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemDef> {
        self.items.values()
    }

    pub fn buildings(&self) -> impl Iterator<Item = &BuildingDef> {
        self.buildings.values()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }
}
