//! Loading pipeline: finds data files, parses them, resolves names, and
//! builds the engine's config and catalog.
//!
//! A data directory may hold any of these files, each in RON, TOML or JSON:
//!
//! | Base name   | Contents                                  | When absent       |
//! |-------------|-------------------------------------------|-------------------|
//! | `config`    | a [`SimConfig`] table                     | default tuning    |
//! | `machines`  | list of [`MachineData`] cost overrides    | stock costs       |
//! | `resources` | list of [`ResourceData`]                  | stock resources   |
//! | `research`  | list of [`ResearchData`]                  | stock research    |
//!
//! TOML lists live under a top-level key named after the file
//! (`[[resources]]`, `[[research]]`, `[[machines]]`).

use crate::schema::{MachineData, ResearchData, ResourceData};
use factory_core::catalog::{Catalog, CatalogBuilder, MachineDef, MachineKind};
use factory_core::config::{ConfigError, SimConfig};
use factory_core::engine::Engine;
use factory_core::id::{ResearchId, ResourceId};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files share a base name but not an extension.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    const EXTENSIONS: [(&'static str, Format); 3] =
        [("ron", Format::Ron), ("toml", Format::Toml), ("json", Format::Json)];
}

/// Format of a file, from its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let ext = path.extension().and_then(|e| e.to_str());
    Format::EXTENSIONS
        .iter()
        .find(|(e, _)| Some(*e) == ext)
        .map(|&(_, format)| format)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Look for `{base_name}.ron`, `.toml` or `.json` in `dir`.
///
/// Returns `Ok(None)` when none exists and `ConflictingFormats` when more
/// than one does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for (ext, _) in Format::EXTENSIONS {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if !candidate.exists() {
            continue;
        }
        if let Some(existing) = found {
            return Err(DataLoadError::ConflictingFormats {
                a: existing,
                b: candidate,
            });
        }
        found = Some(candidate);
    }
    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path) -> impl FnOnce(String) -> DataLoadError + '_ {
    move |detail| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path)(e.to_string())),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path)(e.to_string())),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path)(e.to_string())),
    }
}

/// Deserialize a list. RON and JSON files hold the list itself; TOML files
/// hold it under `toml_key`. An empty TOML file is an empty list.
pub fn deserialize_list<T: DeserializeOwned>(path: &Path, toml_key: &str) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }
    let mut table: toml::Table = deserialize_file(path)?;
    match table.remove(toml_key) {
        Some(value) => value
            .try_into()
            .map_err(|e: toml::de::Error| parse_error(path)(e.to_string())),
        None if table.is_empty() => Ok(Vec::new()),
        None => Err(parse_error(path)(format!("missing key '{toml_key}' in TOML file"))),
    }
}

// ===========================================================================
// Name resolution
// ===========================================================================

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

pub fn check_duplicate<V>(map: &HashMap<String, V>, name: &str, file: &Path) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        return Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Map every entry's name to the id it will get, rejecting duplicates.
/// Ids follow list order, so entries may refer to later ones.
fn index_names<'a, I: Copy>(
    names: impl IntoIterator<Item = &'a str>,
    file: &Path,
    id: impl Fn(u32) -> I,
) -> Result<HashMap<String, I>, DataLoadError> {
    let mut map = HashMap::new();
    for (i, name) in names.into_iter().enumerate() {
        check_duplicate(&map, name, file)?;
        map.insert(name.to_string(), id(i as u32));
    }
    Ok(map)
}

// ===========================================================================
// Game data
// ===========================================================================

/// Everything needed to construct an [`Engine`].
#[derive(Debug, Clone)]
pub struct GameData {
    pub config: SimConfig,
    pub catalog: Catalog,
}

impl GameData {
    pub fn into_engine(self) -> Result<Engine, DataLoadError> {
        Ok(Engine::new(self.config, self.catalog)?)
    }
}

/// Load config and catalog from a data directory. Missing files fall back to
/// the stock game.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let config = match find_data_file(dir, "config")? {
        Some(path) => {
            log::info!("loading config from {}", path.display());
            deserialize_file::<SimConfig>(&path)?
        }
        None => SimConfig::default(),
    };
    config.validate()?;

    let mut builder = CatalogBuilder::new();

    if let Some(path) = find_data_file(dir, "machines")? {
        for data in deserialize_list::<MachineData>(&path, "machines")? {
            apply_machine_override(&mut builder, &data, &path)?;
        }
    }

    builder = match find_data_file(dir, "resources")? {
        Some(path) => {
            let entries: Vec<ResourceData> = deserialize_list(&path, "resources")?;
            register_resources(builder, &entries, &path)?
        }
        None => builder.with_standard_resources(),
    };

    builder = match find_data_file(dir, "research")? {
        Some(path) => {
            let entries: Vec<ResearchData> = deserialize_list(&path, "research")?;
            register_research(builder, &entries, &path)?
        }
        None => builder.with_standard_research(),
    };

    let catalog = builder.build();
    log::info!(
        "game data ready: {} resources, {} research options",
        catalog.resource_count(),
        catalog.research_count()
    );
    Ok(GameData { config, catalog })
}

fn apply_machine_override(
    builder: &mut CatalogBuilder,
    data: &MachineData,
    file: &Path,
) -> Result<(), DataLoadError> {
    let kind = MachineKind::from_name(&data.kind).map_err(|_| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: data.kind.clone(),
        expected_kind: "machine",
    })?;
    let stock = MachineDef::standard(kind);
    builder.set_machine(MachineDef {
        kind,
        build_cost: data.build_cost.unwrap_or(stock.build_cost),
        op_cost: data.op_cost.unwrap_or(stock.op_cost),
        op_time: data.op_time.unwrap_or(stock.op_time),
        unlock_cost: data.unlock_cost.unwrap_or(stock.unlock_cost),
    });
    log::debug!("machine costs overridden for {kind}");
    Ok(())
}

fn register_resources(
    mut builder: CatalogBuilder,
    entries: &[ResourceData],
    file: &Path,
) -> Result<CatalogBuilder, DataLoadError> {
    let ids = index_names(entries.iter().map(|e| e.name.as_str()), file, ResourceId)?;
    for entry in entries {
        let components = entry
            .components
            .iter()
            .map(|(name, count)| resolve_name(&ids, name, file, "resource").map(|&id| (id, *count)))
            .collect::<Result<Vec<_>, _>>()?;
        builder.register_resource(
            &entry.name,
            entry.value,
            entry.cost,
            entry.class,
            entry.unlock_cost,
            components,
        );
    }
    Ok(builder)
}

fn register_research(
    mut builder: CatalogBuilder,
    entries: &[ResearchData],
    file: &Path,
) -> Result<CatalogBuilder, DataLoadError> {
    let ids = index_names(entries.iter().map(|e| e.name.as_str()), file, ResearchId)?;
    for entry in entries {
        let prerequisite = entry
            .prerequisite
            .as_deref()
            .map(|name| resolve_name(&ids, name, file, "research").copied())
            .transpose()?;
        builder.register_research(&entry.name, entry.cost, entry.effect, prerequisite);
    }
    Ok(builder)
}

// ===========================================================================
// Tests
// ===========================================================================
