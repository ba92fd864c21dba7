use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a placed machine in the world.
    pub struct MachineId;

    /// Identifies a material stack travelling through the world.
    pub struct MaterialId;

    /// Identifies a visual stacking group of materials.
    pub struct GroupId;
}

/// Identifies a resource (blueprint) in the catalog. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

/// Identifies a research option in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResearchId(pub u32);
