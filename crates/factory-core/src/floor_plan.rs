//! Saved machine layouts.
//!
//! A floor plan stores machines relative to the bottom-left tile of the
//! rectangle they were captured from. Placing a plan only computes target
//! positions; the engine validates the footprint and then builds each record
//! through its normal build path.

use crate::catalog::MachineKind;
use crate::grid::{GRID_SIZE, Orientation, Position};
use crate::machine::{Machine, MachineSettings};
use serde::{Deserialize, Serialize};

/// Number of floor-plan slots.
pub const FLOOR_PLAN_SLOTS: usize = 10;

/// One machine in a plan. Offsets are in tiles from the plan's origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub kind: MachineKind,
    pub dx: i32,
    pub dy: i32,
    pub orientation: Orientation,
    pub settings: MachineSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorPlan {
    /// Footprint in tiles, `(columns, rows)`.
    pub size: (i32, i32),
    pub records: Vec<PlanRecord>,
}

impl FloorPlan {
    /// Capture every machine whose tile lies in the rectangle spanned by
    /// `a` and `b`, in the order given.
    pub fn capture<'a>(machines: impl IntoIterator<Item = &'a Machine>, a: Position, b: Position) -> Self {
        let (c0, c1) = (a.column().min(b.column()), a.column().max(b.column()));
        let (r0, r1) = (a.row().min(b.row()), a.row().max(b.row()));
        let records = machines
            .into_iter()
            .filter(|m| {
                (c0..=c1).contains(&m.position.column()) && (r0..=r1).contains(&m.position.row())
            })
            .map(|m| PlanRecord {
                kind: m.kind,
                dx: m.position.column() - c0,
                dy: m.position.row() - r0,
                orientation: m.orientation,
                settings: m.settings(),
            })
            .collect();
        Self {
            size: (c1 - c0 + 1, r1 - r0 + 1),
            records,
        }
    }

    /// Every tile center the plan covers when placed at `origin`.
    pub fn footprint(&self, origin: Position) -> Vec<Position> {
        let origin = origin.snapped();
        let (cols, rows) = self.size;
        (0..cols)
            .flat_map(|dx| (0..rows).map(move |dy| origin.offset(dx * GRID_SIZE, dy * GRID_SIZE)))
            .collect()
    }

    /// Absolute position of each record when placed at `origin`.
    pub fn placements(&self, origin: Position) -> impl Iterator<Item = (&PlanRecord, Position)> {
        let origin = origin.snapped();
        self.records
            .iter()
            .map(move |r| (r, origin.offset(r.dx * GRID_SIZE, r.dy * GRID_SIZE)))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Fixed set of plan slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorPlanSlots {
    slots: Vec<Option<FloorPlan>>,
}

impl Default for FloorPlanSlots {
    fn default() -> Self {
        Self {
            slots: vec![None; FLOOR_PLAN_SLOTS],
        }
    }
}

impl FloorPlanSlots {
    pub fn get(&self, slot: usize) -> Option<&FloorPlan> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Returns false for an out-of-range slot.
    pub fn store(&mut self, slot: usize, plan: FloorPlan) -> bool {
        match self.slots.get_mut(slot) {
            Some(entry) => {
                *entry = Some(plan);
                true
            }
            None => false,
        }
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}
