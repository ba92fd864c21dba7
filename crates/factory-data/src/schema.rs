//! Serde data file structs for game content.
//!
//! These mirror the engine's catalog types but refer to other entries by
//! name. The loader resolves names to ids and builds a
//! [`Catalog`](factory_core::catalog::Catalog).

use factory_core::catalog::{ResearchEffect, ResourceClass};
use factory_core::fixed::Money;
use serde::Deserialize;

// ===========================================================================
// Machines
// ===========================================================================

/// Cost overrides for one machine kind. Omitted fields keep the stock value.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineData {
    /// Display name of the kind, e.g. `"Robotic Arm"`.
    pub kind: String,
    #[serde(default)]
    pub build_cost: Option<Money>,
    #[serde(default)]
    pub op_cost: Option<Money>,
    #[serde(default)]
    pub op_time: Option<u32>,
    #[serde(default)]
    pub unlock_cost: Option<Money>,
}

// ===========================================================================
// Resources
// ===========================================================================

/// A resource and its recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceData {
    pub name: String,
    pub value: Money,
    #[serde(default)]
    pub cost: Money,
    pub class: ResourceClass,
    #[serde(default)]
    pub unlock_cost: Money,
    /// `(resource name, count)` pairs.
    #[serde(default)]
    pub components: Vec<(String, u32)>,
}

// ===========================================================================
// Research
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ResearchData {
    pub name: String,
    pub cost: Money,
    pub effect: ResearchEffect,
    /// Name of the research that must be bought first.
    #[serde(default)]
    pub prerequisite: Option<String>,
}
