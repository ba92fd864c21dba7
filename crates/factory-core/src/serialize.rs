//! Save and restore of the persistent world.
//!
//! A snapshot is a `bitcode` blob with a versioned header. It carries the
//! economy, the grid's lock and wall flags, every machine in placement order
//! with its player settings and stored components, and the floor-plan slots.
//! Materials in flight, arm swings and production queues are transient and
//! are not saved; a loaded world starts with an empty floor.

use crate::catalog::MachineKind;
use crate::economy::Economy;
use crate::engine::Engine;
use crate::fixed::Ticks;
use crate::floor_plan::FloorPlanSlots;
use crate::grid::{Grid, Orientation, Position};
use crate::id::ResourceId;
use crate::machine::{Machine, MachineSettings};
use crate::teleport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a factory snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xFAC7_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("data too short for snapshot header")]
    TooShort,
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header at the front of every snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick count when the snapshot was taken.
    pub tick: Ticks,
}

impl SnapshotHeader {
    pub fn new(tick: Ticks) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// Decode only far enough to read the header.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, DeserializeError> {
    decode(data).map(|snapshot| snapshot.header)
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// One saved machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineRecord {
    pub kind: MachineKind,
    pub position: Position,
    pub orientation: Orientation,
    pub settings: MachineSettings,
    /// Stored components of a producer.
    pub inventory: BTreeMap<ResourceId, u32>,
}

impl MachineRecord {
    fn capture(machine: &Machine) -> Self {
        Self {
            kind: machine.kind,
            position: machine.position,
            orientation: machine.orientation,
            settings: machine.settings(),
            inventory: machine
                .producer()
                .map(|p| p.inventory.clone())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WorldSnapshot {
    header: SnapshotHeader,
    economy: Economy,
    grid: Grid,
    machines: Vec<MachineRecord>,
    floor_plans: FloorPlanSlots,
}

fn decode(data: &[u8]) -> Result<WorldSnapshot, DeserializeError> {
    if data.is_empty() {
        return Err(DeserializeError::TooShort);
    }
    bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))
}

// ---------------------------------------------------------------------------
// Engine integration
// ---------------------------------------------------------------------------

impl Engine {
    /// Encode the persistent world.
    pub fn save_snapshot(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = WorldSnapshot {
            header: SnapshotHeader::new(self.sim_state.tick),
            economy: self.economy.clone(),
            grid: self.grid.clone(),
            machines: self.machines().map(|(_, m)| MachineRecord::capture(m)).collect(),
            floor_plans: self.floor_plans.clone(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Replace the world with a saved one. Config, catalog and event
    /// listeners are kept. On error the current world is left as it was.
    pub fn load_snapshot(&mut self, data: &[u8]) -> Result<(), DeserializeError> {
        let snapshot = decode(data)?;
        snapshot.header.validate()?;

        self.machines.clear();
        self.machine_order.clear();
        self.machine_index.clear();
        self.materials.clear();
        self.material_order.clear();
        self.groups.clear();
        self.commands.clear_pending();
        self.reset_requested = false;
        self.last_report = None;

        self.economy = snapshot.economy;
        self.grid = snapshot.grid;
        self.floor_plans = snapshot.floor_plans;
        self.sim_state.tick = snapshot.header.tick;
        self.sim_state.accumulator_ms = 0;

        for record in &snapshot.machines {
            let mut machine = Machine::new(record.kind, record.position, record.orientation, &self.catalog);
            machine.apply_settings(&record.settings);
            if let Some(producer) = machine.producer_mut() {
                producer.inventory = record.inventory.clone();
            }
            let id = self.machines.insert(machine);
            self.machine_order.push(id);
            self.machine_index.insert(record.position, id);
        }
        teleport::refresh_activation(&mut self.machines);

        log::info!(
            "loaded snapshot at tick {} with {} machines",
            snapshot.header.tick,
            self.machine_order.len()
        );
        self.last_state_hash = self.compute_state_hash();
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, MachineParam};
    use crate::grid::AssemblyLine;
    use crate::machine::MachineState;
    use crate::test_utils::*;

    fn furnished_engine() -> Engine {
        let mut engine = rich_engine();
        set_balance(&mut engine, 123_456);
        place(&mut engine, MachineKind::Seller, 0, 0, Orientation::Up);
        place(&mut engine, MachineKind::Roller, 1, 0, Orientation::Left);
        let splitter = place(&mut engine, MachineKind::SplitterTee, 2, 0, Orientation::Down);
        engine
            .execute(Command::SetMachineParam {
                machine: splitter,
                param: MachineParam::SplitRatio([2, 0, 3]),
            })
            .unwrap();
        let furnace = place(&mut engine, MachineKind::Furnace, 3, 0, Orientation::Right);
        let iron = resource(&engine, "Iron");
        if let MachineState::Producer(p) = &mut engine.machines[furnace].state {
            p.add_to_inventory(iron, 4);
        }
        engine
    }

    fn encode_with_header(engine: &Engine, header: SnapshotHeader) -> Vec<u8> {
        let snapshot = WorldSnapshot {
            header,
            economy: engine.economy.clone(),
            grid: engine.grid.clone(),
            machines: Vec::new(),
            floor_plans: engine.floor_plans.clone(),
        };
        bitcode::serialize(&snapshot).unwrap()
    }

    #[test]
    fn round_trip_restores_world() {
        let mut engine = furnished_engine();
        run_ticks(&mut engine, 3);
        let data = engine.save_snapshot().unwrap();

        let mut restored = Engine::default();
        restored.load_snapshot(&data).unwrap();

        assert_eq!(restored.balance(), 123_456);
        assert_eq!(restored.tick(), 3);
        assert_eq!(restored.economy().unlocked_machines, engine.economy().unlocked_machines);
        assert!(restored.economy().unlocked_lines.contains(&AssemblyLine::Three));
        assert_eq!(restored.machine_count(), 4);
        let kinds: Vec<MachineKind> = restored.machines().map(|(_, m)| m.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MachineKind::Seller,
                MachineKind::Roller,
                MachineKind::SplitterTee,
                MachineKind::Furnace
            ]
        );
        assert_eq!(restored.state_hash(), engine.state_hash());
    }

    #[test]
    fn settings_and_inventory_survive() {
        let engine = furnished_engine();
        let data = engine.save_snapshot().unwrap();
        let mut restored = Engine::default();
        restored.load_snapshot(&data).unwrap();

        let splitter = restored.machine_at(Position::tile(2, 0)).unwrap();
        assert_eq!(restored.machine(splitter).unwrap().splitter().unwrap().ratio, [2, 0, 3]);
        let furnace = restored.machine_at(Position::tile(3, 0)).unwrap();
        let iron = resource(&restored, "Iron");
        let producer = restored.machine(furnace).unwrap().producer().unwrap();
        assert_eq!(producer.inventory.get(&iron), Some(&4));
    }

    #[test]
    fn materials_are_not_saved() {
        let mut engine = furnished_engine();
        let copper = resource(&engine, "Copper");
        engine.spawn_material(copper, Position::tile(5, 5), Orientation::Up, 2);
        let data = engine.save_snapshot().unwrap();

        let mut restored = Engine::default();
        let gold = resource(&restored, "Gold");
        restored.spawn_material(gold, Position::tile(1, 1), Orientation::Up, 1);
        restored.load_snapshot(&data).unwrap();
        assert_eq!(restored.material_count(), 0);
        assert!(restored.groups().is_empty());
    }

    #[test]
    fn header_validation() {
        assert!(SnapshotHeader::new(0).validate().is_ok());
        let bad = SnapshotHeader {
            magic: 0xDEAD_BEEF,
            ..SnapshotHeader::new(0)
        };
        assert!(matches!(bad.validate(), Err(DeserializeError::InvalidMagic(0xDEAD_BEEF))));
        let old = SnapshotHeader {
            version: 0,
            ..SnapshotHeader::new(0)
        };
        assert!(matches!(old.validate(), Err(DeserializeError::UnsupportedVersion(0))));
    }

    #[test]
    fn future_version_is_rejected() {
        let mut engine = Engine::default();
        let data = encode_with_header(
            &engine,
            SnapshotHeader {
                version: FORMAT_VERSION + 1,
                ..SnapshotHeader::new(7)
            },
        );
        assert_eq!(read_snapshot_header(&data).unwrap().tick, 7);
        let err = engine.load_snapshot(&data).unwrap_err();
        assert!(matches!(err, DeserializeError::FutureVersion(v) if v == FORMAT_VERSION + 1));
        assert_eq!(engine.tick(), 0);
    }

    #[test]
    fn garbage_is_rejected() {
        let mut engine = furnished_engine();
        assert!(matches!(engine.load_snapshot(&[]), Err(DeserializeError::TooShort)));
        assert!(matches!(
            engine.load_snapshot(&[1, 2, 3]),
            Err(DeserializeError::Decode(_))
        ));
        assert_eq!(engine.machine_count(), 4);
    }
}
