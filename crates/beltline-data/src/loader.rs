//! Resolution pipeline: reads data files, resolves cross-references, builds
//! the catalog.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers, plus the loaders for catalogs, layout snapshots
//! and engine configuration.

use crate::schema::{BuildingData, ItemData};
use beltline_core::catalog::{Catalog, CatalogBuilder, CatalogError};
use beltline_core::config::FlowConfig;
use beltline_core::engine::FlowEngine;
use beltline_core::graph::LayoutSnapshot;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The resolved definitions were rejected by the catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found.take() {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list from a file. For TOML files, extracts the array at the
/// given `toml_key` from a top-level table. For RON and JSON, deserializes
/// directly as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }

    let content = std::fs::read_to_string(path)?;
    let table: toml::Value = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
    let array = table
        .get(toml_key)
        .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
        .clone();
    array
        .try_into()
        .map_err(|e: toml::de::Error| parse_error(path, e))
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name in a map, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Check whether a name already exists in a map, returning a `DuplicateName`
/// error if so.
pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

// ===========================================================================
// Loaders
// ===========================================================================

/// Load and resolve the catalog from `items.*` and `buildings.*` in `dir`.
///
/// Every requirement, byproduct and producer reference must name an entry
/// of the same data set.
pub fn load_catalog(dir: &Path) -> Result<Catalog, DataLoadError> {
    let buildings_path = require_data_file(dir, "buildings")?;
    let buildings: Vec<BuildingData> = deserialize_list(&buildings_path, "buildings")?;
    let mut building_index: HashMap<String, usize> = HashMap::with_capacity(buildings.len());
    for (i, building) in buildings.iter().enumerate() {
        check_duplicate(&building_index, &building.id, &buildings_path)?;
        building_index.insert(building.id.clone(), i);
    }

    let items_path = require_data_file(dir, "items")?;
    let items: Vec<ItemData> = deserialize_list(&items_path, "items")?;
    let mut item_index: HashMap<String, usize> = HashMap::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        check_duplicate(&item_index, &item.id, &items_path)?;
        item_index.insert(item.id.clone(), i);
    }

    for item in &items {
        for name in item.item_refs() {
            resolve_name(&item_index, name, &items_path, "item")?;
        }
        for name in item.building_refs() {
            resolve_name(&building_index, name, &items_path, "building")?;
        }
    }

    let mut builder = CatalogBuilder::new();
    for item in &items {
        builder.register_item(item.to_def());
    }
    for building in &buildings {
        builder.register_building(building.to_def());
    }
    let catalog = builder.build()?;

    tracing::debug!(
        items = catalog.item_count(),
        buildings = catalog.building_count(),
        dir = %dir.display(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Load a `{ nodes, edges }` layout snapshot from a single file.
pub fn load_layout(path: &Path) -> Result<LayoutSnapshot, DataLoadError> {
    let snapshot: LayoutSnapshot = deserialize_file(path)?;
    tracing::debug!(
        nodes = snapshot.nodes.len(),
        edges = snapshot.edges.len(),
        file = %path.display(),
        "layout loaded"
    );
    Ok(snapshot)
}

/// Load `flow.*` from `dir`. An absent file yields the default configuration.
pub fn load_flow_config(dir: &Path) -> Result<FlowConfig, DataLoadError> {
    match find_data_file(dir, "flow")? {
        Some(path) => deserialize_file(&path),
        None => {
            tracing::debug!(dir = %dir.display(), "no flow config, using defaults");
            Ok(FlowConfig::default())
        }
    }
}

/// Load the catalog and configuration from `dir` and bind them to an engine.
pub fn load_engine(dir: &Path) -> Result<FlowEngine, DataLoadError> {
    let catalog = load_catalog(dir)?;
    let config = load_flow_config(dir)?;
    Ok(FlowEngine::new(catalog, config))
}

// ===========================================================================
// Tests
// ===========================================================================
