//! Static game data: machine types, resources (blueprints), and research.
//!
//! A [`Catalog`] is assembled once through a [`CatalogBuilder`] and is
//! immutable afterwards. [`Catalog::standard`] returns the stock game data;
//! alternative catalogs can be loaded from data files by `factory-data`.

use crate::fixed::Money;
use crate::id::{ResearchId, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown resource: {0}")]
    UnknownResource(String),
    #[error("unknown research: {0}")]
    UnknownResearch(String),
    #[error("unknown machine type: {0}")]
    UnknownMachine(String),
}

// ---------------------------------------------------------------------------
// Machine kinds
// ---------------------------------------------------------------------------

/// Every kind of machine that can be placed on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MachineKind {
    Starter,
    Seller,
    Crafter,
    Roller,
    Drawer,
    Cutter,
    Furnace,
    Press,
    SplitterLeft,
    SplitterRight,
    SplitterTee,
    Splitter3Way,
    FilterLeft,
    FilterRight,
    FilterTee,
    RoboticArm,
    FilteredArm,
    TeleporterInput,
    TeleporterOutput,
}

/// Which op-time research modifier applies to a producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpTimeGroup {
    StarterCrafter,
    Tier2,
}

impl MachineKind {
    pub const ALL: [MachineKind; 19] = [
        MachineKind::Starter,
        MachineKind::Seller,
        MachineKind::Crafter,
        MachineKind::Roller,
        MachineKind::Drawer,
        MachineKind::Cutter,
        MachineKind::Furnace,
        MachineKind::Press,
        MachineKind::SplitterLeft,
        MachineKind::SplitterRight,
        MachineKind::SplitterTee,
        MachineKind::Splitter3Way,
        MachineKind::FilterLeft,
        MachineKind::FilterRight,
        MachineKind::FilterTee,
        MachineKind::RoboticArm,
        MachineKind::FilteredArm,
        MachineKind::TeleporterInput,
        MachineKind::TeleporterOutput,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            MachineKind::Starter => "Starter",
            MachineKind::Seller => "Seller",
            MachineKind::Crafter => "Crafter",
            MachineKind::Roller => "Roller",
            MachineKind::Drawer => "Drawer",
            MachineKind::Cutter => "Cutter",
            MachineKind::Furnace => "Furnace",
            MachineKind::Press => "Press",
            MachineKind::SplitterLeft => "Splitter Left",
            MachineKind::SplitterRight => "Splitter Right",
            MachineKind::SplitterTee => "Splitter Tee",
            MachineKind::Splitter3Way => "Splitter 3-Way",
            MachineKind::FilterLeft => "Filter Left",
            MachineKind::FilterRight => "Filter Right",
            MachineKind::FilterTee => "Filter Tee",
            MachineKind::RoboticArm => "Robotic Arm",
            MachineKind::FilteredArm => "Filtered Arm",
            MachineKind::TeleporterInput => "Teleporter Input",
            MachineKind::TeleporterOutput => "Teleporter Output",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CatalogError> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name() == name)
            .ok_or_else(|| CatalogError::UnknownMachine(name.to_string()))
    }

    /// Machines that queue and spawn blueprints.
    pub fn is_producer(self) -> bool {
        self.blueprint_class().is_some()
    }

    pub fn is_splitter(self) -> bool {
        matches!(
            self,
            MachineKind::SplitterLeft
                | MachineKind::SplitterRight
                | MachineKind::SplitterTee
                | MachineKind::Splitter3Way
        )
    }

    pub fn is_filter(self) -> bool {
        matches!(
            self,
            MachineKind::FilterLeft | MachineKind::FilterRight | MachineKind::FilterTee
        )
    }

    pub fn is_arm(self) -> bool {
        matches!(self, MachineKind::RoboticArm | MachineKind::FilteredArm)
    }

    pub fn is_teleporter(self) -> bool {
        matches!(
            self,
            MachineKind::TeleporterInput | MachineKind::TeleporterOutput
        )
    }

    /// Player picks a single blueprint rather than the machine trying every
    /// blueprint of its class.
    pub fn selects_blueprint(self) -> bool {
        matches!(self, MachineKind::Starter | MachineKind::Crafter)
    }

    /// The resource class this machine produces, if it is a producer.
    pub fn blueprint_class(self) -> Option<ResourceClass> {
        match self {
            MachineKind::Starter => Some(ResourceClass::Basic),
            MachineKind::Crafter => Some(ResourceClass::Tier2),
            MachineKind::Drawer => Some(ResourceClass::Wire),
            MachineKind::Cutter => Some(ResourceClass::Gear),
            MachineKind::Furnace => Some(ResourceClass::Liquid),
            MachineKind::Press => Some(ResourceClass::Plate),
            _ => None,
        }
    }

    pub fn op_time_group(self) -> Option<OpTimeGroup> {
        match self {
            MachineKind::Starter | MachineKind::Crafter => Some(OpTimeGroup::StarterCrafter),
            MachineKind::Drawer | MachineKind::Cutter | MachineKind::Furnace | MachineKind::Press => {
                Some(OpTimeGroup::Tier2)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for MachineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Costs and timing for one machine kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineDef {
    pub kind: MachineKind,
    pub build_cost: Money,
    /// Charged per interaction (or per pickup for arms).
    pub op_cost: Money,
    /// Launch intervals between queueing and spawning.
    pub op_time: u32,
    pub unlock_cost: Money,
}

impl MachineDef {
    /// Stock costs for a machine kind.
    pub fn standard(kind: MachineKind) -> Self {
        let (build_cost, op_cost, op_time, unlock_cost) = match kind {
            MachineKind::Starter => (1_000, 5, 3, 0),
            MachineKind::Seller => (5_000, 0, 0, 0),
            MachineKind::Crafter => (20_000, 5, 3, 80_000),
            MachineKind::Roller => (300, 0, 0, 5_000),
            MachineKind::Drawer => (10_000, 5, 3, 40_000),
            MachineKind::Cutter => (10_000, 5, 3, 30_000),
            MachineKind::Furnace => (10_000, 5, 3, 20_000),
            MachineKind::Press => (10_000, 5, 3, 300_000),
            MachineKind::SplitterLeft | MachineKind::SplitterRight | MachineKind::SplitterTee => {
                (10_000, 5, 1, 600_000)
            }
            MachineKind::Splitter3Way => (10_000, 5, 1, 1_000_000),
            MachineKind::FilterLeft => (10_000, 2, 1, 300_000),
            MachineKind::FilterRight | MachineKind::FilterTee => (10_000, 2, 1, 500_000),
            MachineKind::RoboticArm => (10_000, 2, 1, 400_000),
            MachineKind::FilteredArm => (10_000, 2, 1, 500_000),
            MachineKind::TeleporterInput | MachineKind::TeleporterOutput => {
                (1_000_000, 100, 1, 250_000_000)
            }
        };
        Self {
            kind,
            build_cost,
            op_cost,
            op_time,
            unlock_cost,
        }
    }

    /// Amount credited when the machine is sold back.
    pub fn sell_value(&self) -> Money {
        self.build_cost / 4
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Blueprint category. Each producer makes exactly one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceClass {
    Basic,
    Wire,
    Gear,
    Liquid,
    Plate,
    Tier2,
}

impl ResourceClass {
    pub fn maker(self) -> MachineKind {
        match self {
            ResourceClass::Basic => MachineKind::Starter,
            ResourceClass::Wire => MachineKind::Drawer,
            ResourceClass::Gear => MachineKind::Cutter,
            ResourceClass::Liquid => MachineKind::Furnace,
            ResourceClass::Plate => MachineKind::Press,
            ResourceClass::Tier2 => MachineKind::Crafter,
        }
    }
}

/// A resource type and the recipe that makes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDef {
    pub name: String,
    /// Sale price per unit.
    pub value: Money,
    /// Charged when a producer queues one unit.
    pub cost: Money,
    pub class: ResourceClass,
    pub unlock_cost: Money,
    pub components: Vec<(ResourceId, u32)>,
}

// ---------------------------------------------------------------------------
// Research
// ---------------------------------------------------------------------------

/// What a research option changes once purchased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResearchEffect {
    FloorPlans,
    /// Percentage points removed from the op-cost modifier.
    OpCostReduction(u32),
    StarterCrafterOpTime(u32),
    Tier2OpTime(u32),
    MaxStarters(u32),
    MaxTeleporters(u32),
    StarterSpawnQuantity(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchDef {
    pub name: String,
    pub cost: Money,
    pub effect: ResearchEffect,
    pub prerequisite: Option<ResearchId>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for constructing an immutable [`Catalog`].
#[derive(Debug)]
pub struct CatalogBuilder {
    machines: Vec<MachineDef>,
    resources: Vec<ResourceDef>,
    resource_by_name: HashMap<String, ResourceId>,
    research: Vec<ResearchDef>,
    research_by_name: HashMap<String, ResearchId>,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBuilder {
    /// Starts with the stock machine table and no resources or research.
    pub fn new() -> Self {
        Self {
            machines: MachineKind::ALL.iter().map(|&k| MachineDef::standard(k)).collect(),
            resources: Vec::new(),
            resource_by_name: HashMap::new(),
            research: Vec::new(),
            research_by_name: HashMap::new(),
        }
    }

    /// Replace the costs of one machine kind.
    pub fn set_machine(&mut self, def: MachineDef) {
        let index = def.kind.index();
        self.machines[index] = def;
    }

    /// Register a resource. Returns its ID.
    pub fn register_resource(
        &mut self,
        name: &str,
        value: Money,
        cost: Money,
        class: ResourceClass,
        unlock_cost: Money,
        components: Vec<(ResourceId, u32)>,
    ) -> ResourceId {
        let id = ResourceId(self.resources.len() as u32);
        self.resources.push(ResourceDef {
            name: name.to_string(),
            value,
            cost,
            class,
            unlock_cost,
            components,
        });
        self.resource_by_name.insert(name.to_string(), id);
        id
    }

    /// Register a research option. Returns its ID.
    pub fn register_research(
        &mut self,
        name: &str,
        cost: Money,
        effect: ResearchEffect,
        prerequisite: Option<ResearchId>,
    ) -> ResearchId {
        let id = ResearchId(self.research.len() as u32);
        self.research.push(ResearchDef {
            name: name.to_string(),
            cost,
            effect,
            prerequisite,
        });
        self.research_by_name.insert(name.to_string(), id);
        id
    }

    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.resource_by_name.get(name).copied()
    }

    pub fn research_id(&self, name: &str) -> Option<ResearchId> {
        self.research_by_name.get(name).copied()
    }

    /// Register the stock resource table.
    pub fn with_standard_resources(mut self) -> Self {
        register_standard_resources(&mut self);
        self
    }

    /// Register the stock research tree.
    pub fn with_standard_research(mut self) -> Self {
        register_standard_research(&mut self);
        self
    }

    pub fn build(self) -> Catalog {
        Catalog {
            machines: self.machines,
            resources: self.resources,
            resource_by_name: self.resource_by_name,
            research: self.research,
            research_by_name: self.research_by_name,
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable game data, frozen at startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    machines: Vec<MachineDef>,
    resources: Vec<ResourceDef>,
    resource_by_name: HashMap<String, ResourceId>,
    research: Vec<ResearchDef>,
    research_by_name: HashMap<String, ResearchId>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Catalog {
    pub fn machine(&self, kind: MachineKind) -> &MachineDef {
        &self.machines[kind.index()]
    }

    pub fn resource(&self, id: ResourceId) -> Option<&ResourceDef> {
        self.resources.get(id.0 as usize)
    }

    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.resource_by_name.get(name).copied()
    }

    pub fn require_resource(&self, name: &str) -> Result<ResourceId, CatalogError> {
        self.resource_id(name)
            .ok_or_else(|| CatalogError::UnknownResource(name.to_string()))
    }

    /// Display name for a resource; `"?"` for IDs outside the catalog.
    pub fn resource_name(&self, id: ResourceId) -> &str {
        self.resource(id).map(|r| r.name.as_str()).unwrap_or("?")
    }

    pub fn resources(&self) -> impl Iterator<Item = (ResourceId, &ResourceDef)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(i, r)| (ResourceId(i as u32), r))
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Every resource of a class, in declaration order.
    pub fn resources_in_class(&self, class: ResourceClass) -> Vec<ResourceId> {
        self.resources()
            .filter(|(_, r)| r.class == class)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn research(&self, id: ResearchId) -> Option<&ResearchDef> {
        self.research.get(id.0 as usize)
    }

    pub fn research_id(&self, name: &str) -> Option<ResearchId> {
        self.research_by_name.get(name).copied()
    }

    pub fn require_research(&self, name: &str) -> Result<ResearchId, CatalogError> {
        self.research_id(name)
            .ok_or_else(|| CatalogError::UnknownResearch(name.to_string()))
    }

    pub fn research_entries(&self) -> impl Iterator<Item = (ResearchId, &ResearchDef)> {
        self.research
            .iter()
            .enumerate()
            .map(|(i, r)| (ResearchId(i as u32), r))
    }

    pub fn research_count(&self) -> usize {
        self.research.len()
    }

    /// The stock game data.
    pub fn standard() -> Self {
        CatalogBuilder::new()
            .with_standard_resources()
            .with_standard_research()
            .build()
    }
}

// ---------------------------------------------------------------------------
// Stock data
// ---------------------------------------------------------------------------

/// Raw resources made by Starters.
pub const RAW_RESOURCES: [&str; 5] = ["Copper", "Gold", "Iron", "Aluminum", "Crystal"];

const RAW_VALUE: Money = 80;
const RAW_COST: Money = 5;
const PROCESSED_VALUE: Money = 100;

fn register_standard_resources(b: &mut CatalogBuilder) {
    let raw = RAW_RESOURCES.map(|name| {
        b.register_resource(name, RAW_VALUE, RAW_COST, ResourceClass::Basic, 0, Vec::new())
    });

    let processed = |b: &mut CatalogBuilder, class: ResourceClass, name: fn(&str) -> String| {
        let mut ids = [ResourceId(0); 5];
        for (i, source) in RAW_RESOURCES.iter().enumerate() {
            ids[i] = b.register_resource(
                &name(source),
                PROCESSED_VALUE,
                0,
                class,
                0,
                vec![(raw[i], 1)],
            );
        }
        ids
    };
    let wire = processed(b, ResourceClass::Wire, |s| format!("{s} Wire"));
    let gear = processed(b, ResourceClass::Gear, |s| format!("{s} Gear"));
    let molten = processed(b, ResourceClass::Liquid, |s| format!("Molten {s}"));
    let plate = processed(b, ResourceClass::Plate, |s| format!("{s} Plate"));

    let [copper, gold, iron, aluminum, crystal] = raw;
    let [copper_wire, gold_wire, iron_wire, _, crystal_wire] = wire;
    let [copper_gear, gold_gear, iron_gear, _, _] = gear;
    let [_, _, _, molten_aluminum, _] = molten;
    let [copper_plate, gold_plate, iron_plate, aluminum_plate, crystal_plate] = plate;

    let mut t2 = |name: &str, value: Money, cost: Money, unlock: Money, parts: &[(ResourceId, u32)]| {
        b.register_resource(name, value, cost, ResourceClass::Tier2, unlock, parts.to_vec())
    };

    let circuit = t2("Circuit", 350, 0, 0, &[(copper_wire, 2), (gold, 1)]);
    let engine = t2("Engine", 400, 0, 360_000, &[(iron_gear, 2), (gold_gear, 1)]);
    let heating_coil = t2("Heating Coil", 350, 0, 360_000, &[(circuit, 1), (aluminum, 2)]);
    let cooling_coil = t2(
        "Cooling Coil",
        350,
        0,
        360_000,
        &[(crystal, 1), (gold, 1), (gold_wire, 1)],
    );
    t2(
        "Light Bulb",
        350,
        5,
        360_000,
        &[(cooling_coil, 1), (gold, 1), (aluminum, 1)],
    );
    t2("Clock", 500, 0, 540_000, &[(iron, 2), (gold, 2), (copper_gear, 1)]);
    let antenna = t2("Antenna", 500, 0, 540_000, &[(crystal_wire, 4), (iron, 1)]);
    t2("Grill", 600, 0, 600_000, &[(heating_coil, 1), (iron, 4)]);
    t2(
        "Toaster",
        900,
        0,
        900_000,
        &[(heating_coil, 1), (aluminum, 1), (copper, 1)],
    );
    t2("Air Conditioner", 900, 0, 900_000, &[(circuit, 1), (aluminum, 2)]);
    let battery = t2(
        "Battery",
        1_000,
        0,
        1_050_000,
        &[(circuit, 1), (aluminum, 1), (molten_aluminum, 1)],
    );
    t2(
        "Washing Machine",
        1_100,
        0,
        1_100_000,
        &[(engine, 1), (aluminum, 2), (copper, 2)],
    );
    t2(
        "Solar Panel",
        1_200,
        0,
        1_170_000,
        &[(circuit, 1), (gold, 2), (crystal, 1)],
    );
    t2(
        "Headphones",
        1_300,
        0,
        1_300_000,
        &[(circuit, 1), (gold_wire, 1), (crystal_wire, 1)],
    );
    let processor = t2("Processor", 1_300, 0, 1_320_000, &[(circuit, 2), (aluminum, 2)]);
    t2(
        "Drill",
        1_500,
        0,
        1_500_000,
        &[(crystal, 2), (copper_gear, 2), (engine, 1)],
    );
    let power_supply = t2(
        "Power Supply",
        2_000,
        5,
        1_920_000,
        &[(circuit, 1), (copper_wire, 3), (iron_wire, 3)],
    );
    t2(
        "Speaker",
        3_300,
        0,
        3_300_000,
        &[(circuit, 2), (gold_wire, 4), (crystal_wire, 4)],
    );
    t2(
        "Radio",
        5_600,
        0,
        5_670_000,
        &[(circuit, 1), (antenna, 1), (battery, 1)],
    );
    t2(
        "Jack Hammer",
        7_000,
        0,
        6_920_000,
        &[(circuit, 4), (crystal, 4), (iron_plate, 4)],
    );
    t2(
        "TV",
        4_000,
        5,
        7_100_000,
        &[(power_supply, 1), (circuit, 1), (aluminum, 4)],
    );
    t2(
        "Smartphone",
        7_300,
        0,
        7_300_000,
        &[(processor, 1), (battery, 1), (aluminum, 2)],
    );
    t2(
        "Refrigerator",
        7_400,
        0,
        7_400_000,
        &[(cooling_coil, 1), (aluminum, 6), (power_supply, 1)],
    );
    t2(
        "Tablet",
        7_600,
        0,
        7_600_000,
        &[(processor, 1), (battery, 2), (aluminum, 2)],
    );
    t2(
        "Microwave",
        8_000,
        0,
        8_070_000,
        &[(heating_coil, 5), (crystal_plate, 5), (aluminum_plate, 5)],
    );
    t2(
        "Railroad Tracks",
        8_400,
        0,
        8_400_000,
        &[(iron, 10), (iron_plate, 10)],
    );
    t2(
        "Smart Watch",
        10_200,
        0,
        10_000_000,
        &[(processor, 2), (iron_plate, 1), (aluminum_plate, 2)],
    );
    let server_rack = t2(
        "Server Rack",
        10_600,
        0,
        11_000_000,
        &[(aluminum_plate, 20), (aluminum, 10)],
    );
    let computer = t2(
        "Computer",
        11_000,
        0,
        11_000_000,
        &[(processor, 1), (aluminum, 6), (power_supply, 1)],
    );
    let generator = t2(
        "Generator",
        12_000,
        0,
        12_000_000,
        &[(engine, 4), (copper_plate, 5), (gold_plate, 5)],
    );
    t2(
        "Water Heater",
        13_000,
        0,
        13_000_000,
        &[(heating_coil, 5), (crystal_plate, 5), (aluminum_plate, 5)],
    );
    t2(
        "Drone",
        17_200,
        0,
        17_000_000,
        &[(battery, 2), (processor, 2), (aluminum_plate, 4)],
    );
    t2(
        "Circuit Board Assembly",
        27_000,
        0,
        27_000_000,
        &[(circuit, 20), (copper_plate, 6), (iron_plate, 6)],
    );
    t2(
        "Oven",
        27_300,
        0,
        27_000_000,
        &[(heating_coil, 10), (iron_plate, 10), (iron, 10)],
    );
    t2(
        "Laser",
        32_000,
        0,
        32_000_000,
        &[(battery, 6), (crystal_plate, 10), (circuit, 6)],
    );
    let advanced_engine = t2(
        "Advanced Engine",
        70_000,
        0,
        70_000_000,
        &[(engine, 50), (circuit, 50)],
    );
    let electric_generator = t2(
        "Electric Generator",
        470_000,
        0,
        470_000_000,
        &[(generator, 15), (circuit, 50), (battery, 40)],
    );
    let super_computer = t2(
        "Super Computer",
        550_000,
        0,
        550_000_000,
        &[(computer, 30), (server_rack, 10)],
    );
    let electric_engine = t2(
        "Electric Engine",
        900_000,
        0,
        900_000_000,
        &[(advanced_engine, 10), (battery, 40)],
    );
    let ai_processor = t2(
        "AI Processor",
        2_500_000,
        0,
        2_500_000_000,
        &[(super_computer, 4), (circuit, 40)],
    );
    let ai_body = t2(
        "AI Robot Body",
        2_800_000,
        0,
        2_800_000_000,
        &[(electric_engine, 1), (electric_generator, 1), (aluminum, 400)],
    );
    let ai_head = t2(
        "AI Robot Head",
        5_000_000,
        0,
        5_000_000_000,
        &[(ai_processor, 1), (aluminum, 200)],
    );
    t2(
        "AI Robot",
        15_000_000,
        0,
        15_000_000_000,
        &[(ai_body, 1), (ai_head, 1)],
    );
}

fn register_standard_research(b: &mut CatalogBuilder) {
    b.register_research("Floor Plans", 5_000_000, ResearchEffect::FloorPlans, None);

    let chain = |b: &mut CatalogBuilder, entries: &[(&str, Money, ResearchEffect)]| {
        let mut previous = None;
        for &(name, cost, effect) in entries {
            previous = Some(b.register_research(name, cost, effect, previous));
        }
    };

    chain(
        b,
        &[
            ("Op Cost Reduction I", 150_000, ResearchEffect::OpCostReduction(40)),
            ("Op Cost Reduction II", 300_000, ResearchEffect::OpCostReduction(40)),
        ],
    );
    chain(
        b,
        &[
            ("Starter/Crafter Speed I", 2_000_000, ResearchEffect::StarterCrafterOpTime(1)),
            ("Starter/Crafter Speed II", 20_000_000, ResearchEffect::StarterCrafterOpTime(1)),
        ],
    );
    chain(
        b,
        &[
            ("Tier 2 Speed I", 1_000_000, ResearchEffect::Tier2OpTime(1)),
            ("Tier 2 Speed II", 10_000_000, ResearchEffect::Tier2OpTime(1)),
        ],
    );
    chain(
        b,
        &[
            ("Max Starters I", 100_000, ResearchEffect::MaxStarters(5)),
            ("Max Starters II", 2_500_000, ResearchEffect::MaxStarters(5)),
            ("Max Starters III", 5_000_000, ResearchEffect::MaxStarters(5)),
            ("Max Starters IV", 10_000_000, ResearchEffect::MaxStarters(10)),
            ("Max Starters V", 100_000_000, ResearchEffect::MaxStarters(10)),
            ("Max Starters VI", 1_000_000_000, ResearchEffect::MaxStarters(10)),
        ],
    );
    chain(
        b,
        &[
            ("Max Teleporters I", 50_000_000_000, ResearchEffect::MaxTeleporters(5)),
            ("Max Teleporters II", 80_000_000_000, ResearchEffect::MaxTeleporters(5)),
        ],
    );
    chain(
        b,
        &[
            ("Starter Spawn Quantity I", 20_000_000, ResearchEffect::StarterSpawnQuantity(1)),
            ("Starter Spawn Quantity II", 200_000_000, ResearchEffect::StarterSpawnQuantity(1)),
        ],
    );
}
