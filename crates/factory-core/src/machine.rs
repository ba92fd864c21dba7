//! Placed machines and their per-kind runtime state.
//!
//! Every machine carries a [`MachineState`] whose variant is fixed by its
//! [`MachineKind`]. The engine dispatches on that variant with a single
//! exhaustive match when a material reaches the machine's tile center.

use crate::catalog::{Catalog, MachineKind};
use crate::grid::{AssemblyLine, GRID_SIZE, Orientation, Position};
use crate::id::{MaterialId, ResourceId};
use crate::kinematics::ARM_FRAMES;
use crate::material::MAX_STACK;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Teleporter channel assigned to newly built teleporters.
pub const DEFAULT_TELEPORTER_ID: u32 = 1;

// ---------------------------------------------------------------------------
// Producers
// ---------------------------------------------------------------------------

/// State shared by every machine that queues and spawns blueprints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerState {
    /// Player selection (Starter and Crafter only).
    pub selected: Option<ResourceId>,
    /// Blueprints tried in order on each launch pass.
    pub considered: Vec<ResourceId>,
    pub spawn_quantity: u8,
    pub inventory: BTreeMap<ResourceId, u32>,
    pub queued: Option<ResourceId>,
    /// Launch passes remaining until `queued` spawns.
    pub delay: u32,
}

impl ProducerState {
    /// Point a Starter or Crafter at a single blueprint.
    pub fn select(&mut self, blueprint: ResourceId) {
        self.selected = Some(blueprint);
        self.considered = vec![blueprint];
    }

    pub fn add_to_inventory(&mut self, resource: ResourceId, quantity: u32) {
        *self.inventory.entry(resource).or_insert(0) += quantity;
    }

    /// Whether the inventory covers every component.
    pub fn has_components(&self, components: &[(ResourceId, u32)]) -> bool {
        components
            .iter()
            .all(|(r, n)| self.inventory.get(r).copied().unwrap_or(0) >= *n)
    }

    /// Remove components. Callers check [`has_components`](Self::has_components) first.
    pub fn consume(&mut self, components: &[(ResourceId, u32)]) {
        for (resource, n) in components {
            if let Some(count) = self.inventory.get_mut(resource) {
                *count = count.saturating_sub(*n);
                if *count == 0 {
                    self.inventory.remove(resource);
                }
            }
        }
    }

    /// Ready to queue a new blueprint.
    pub fn is_idle(&self) -> bool {
        self.queued.is_none() && self.delay == 0
    }
}

// ---------------------------------------------------------------------------
// Splitters
// ---------------------------------------------------------------------------

/// Output slots in `[left, straight, right]` order.
pub const SPLIT_DIRECTIONS: usize = 3;

/// Weighted round-robin state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitterState {
    /// Weight per direction. Disabled directions are fixed at zero.
    pub ratio: [u32; SPLIT_DIRECTIONS],
    pub cumulative: [u32; SPLIT_DIRECTIONS],
    pub turn: usize,
}

impl SplitterState {
    /// Directions a splitter variant can emit to.
    pub fn enabled(kind: MachineKind) -> [bool; SPLIT_DIRECTIONS] {
        match kind {
            MachineKind::SplitterLeft => [true, true, false],
            MachineKind::SplitterRight => [false, true, true],
            MachineKind::SplitterTee => [true, false, true],
            _ => [true, true, true],
        }
    }

    pub fn new(kind: MachineKind) -> Self {
        let enabled = Self::enabled(kind);
        Self {
            ratio: enabled.map(u32::from),
            cumulative: [0; SPLIT_DIRECTIONS],
            turn: 0,
        }
    }

    /// Whether `ratio` is acceptable for this variant: at least 1 on every
    /// enabled direction and 0 on every disabled one.
    pub fn is_valid_ratio(kind: MachineKind, ratio: [u32; SPLIT_DIRECTIONS]) -> bool {
        Self::enabled(kind)
            .iter()
            .zip(ratio)
            .all(|(&on, w)| if on { w >= 1 } else { w == 0 })
    }

    /// Replace the weights and restart the rotation.
    pub fn set_ratio(&mut self, ratio: [u32; SPLIT_DIRECTIONS]) {
        self.ratio = ratio;
        self.cumulative = [0; SPLIT_DIRECTIONS];
        self.turn = 0;
    }

    fn skip_disabled(&mut self) {
        for _ in 0..SPLIT_DIRECTIONS {
            if self.ratio[self.turn] > 0 {
                return;
            }
            self.turn = (self.turn + 1) % SPLIT_DIRECTIONS;
        }
    }

    /// Allocate `units` one at a time. Returns the count per direction.
    /// Directions with weight zero never receive a unit.
    pub fn allocate(&mut self, units: u32) -> [u32; SPLIT_DIRECTIONS] {
        let mut out = [0; SPLIT_DIRECTIONS];
        if self.ratio.iter().all(|&w| w == 0) {
            return out;
        }
        for _ in 0..units {
            self.skip_disabled();
            let turn = self.turn;
            out[turn] += 1;
            self.cumulative[turn] += 1;
            if self.cumulative[turn] >= self.ratio[turn] {
                self.cumulative[turn] = 0;
                self.turn = (turn + 1) % SPLIT_DIRECTIONS;
            }
        }
        self.skip_disabled();
        out
    }
}

// ---------------------------------------------------------------------------
// Filters, arms, teleporters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub left: Option<ResourceId>,
    pub right: Option<ResourceId>,
}

impl FilterState {
    /// New travel direction for a material of type `resource`.
    pub fn route(&self, facing: Orientation, resource: ResourceId, current: Orientation) -> Orientation {
        if self.left == Some(resource) {
            facing.left_output()
        } else if self.right == Some(resource) {
            facing.right_output()
        } else {
            current
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmState {
    /// Accepted resource for a Filtered Arm. Plain arms accept anything.
    pub filter: Option<ResourceId>,
    pub motion_active: bool,
    pub frame: u32,
    pub returning: bool,
    #[serde(skip)]
    pub held: Option<MaterialId>,
}

impl Default for ArmState {
    fn default() -> Self {
        Self {
            filter: None,
            motion_active: false,
            frame: 1,
            returning: false,
            held: None,
        }
    }
}

impl ArmState {
    /// Stop any swing in progress. Returns the material that was held.
    pub fn cancel(&mut self) -> Option<MaterialId> {
        self.motion_active = false;
        self.returning = false;
        self.frame = 1;
        self.held.take()
    }

    /// Start a swing holding `material`.
    pub fn begin(&mut self, material: MaterialId) {
        self.held = Some(material);
        self.motion_active = true;
        self.returning = false;
        self.frame = 1;
    }

    /// Frame counter after processing the current frame.
    pub fn advance_frame(&mut self) {
        if !self.motion_active {
            return;
        }
        if self.returning {
            self.frame = self.frame.saturating_sub(1).max(1);
        } else {
            self.frame = (self.frame + 1).min(ARM_FRAMES);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeleporterState {
    pub channel: Option<u32>,
    /// Exactly one machine of this role uses the channel.
    pub active: bool,
}

impl Default for TeleporterState {
    fn default() -> Self {
        Self {
            channel: Some(DEFAULT_TELEPORTER_ID),
            active: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// Per-kind runtime state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineState {
    Producer(ProducerState),
    Splitter(SplitterState),
    Filter(FilterState),
    Arm(ArmState),
    Teleporter(TeleporterState),
    /// Sellers and rollers.
    Passive,
}

impl MachineState {
    /// Fresh state for a newly built machine.
    pub fn new(kind: MachineKind, catalog: &Catalog) -> Self {
        if let Some(class) = kind.blueprint_class() {
            let mut producer = ProducerState {
                spawn_quantity: 1,
                ..ProducerState::default()
            };
            if kind.selects_blueprint() {
                // First blueprint of the class: Copper for Starters, Circuit for Crafters.
                if let Some(&first) = catalog.resources_in_class(class).first() {
                    producer.select(first);
                }
            } else {
                producer.considered = catalog.resources_in_class(class);
            }
            return MachineState::Producer(producer);
        }
        if kind.is_splitter() {
            MachineState::Splitter(SplitterState::new(kind))
        } else if kind.is_filter() {
            MachineState::Filter(FilterState::default())
        } else if kind.is_arm() {
            MachineState::Arm(ArmState::default())
        } else if kind.is_teleporter() {
            MachineState::Teleporter(TeleporterState::default())
        } else {
            MachineState::Passive
        }
    }
}

/// A machine placed on a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub kind: MachineKind,
    pub position: Position,
    pub orientation: Orientation,
    pub state: MachineState,
}

impl Machine {
    pub fn new(kind: MachineKind, position: Position, orientation: Orientation, catalog: &Catalog) -> Self {
        Self {
            kind,
            position,
            orientation,
            state: MachineState::new(kind, catalog),
        }
    }

    pub fn line(&self) -> AssemblyLine {
        AssemblyLine::of(self.position.x)
    }

    /// Tile an arm picks from: the side opposite its facing.
    pub fn pickup_tile(&self) -> Position {
        self.position.step(self.orientation, -GRID_SIZE)
    }

    /// Tile an arm drops onto.
    pub fn dropoff_tile(&self) -> Position {
        self.position.step(self.orientation, GRID_SIZE)
    }

    pub fn producer(&self) -> Option<&ProducerState> {
        match &self.state {
            MachineState::Producer(p) => Some(p),
            _ => None,
        }
    }

    pub fn producer_mut(&mut self) -> Option<&mut ProducerState> {
        match &mut self.state {
            MachineState::Producer(p) => Some(p),
            _ => None,
        }
    }

    pub fn splitter(&self) -> Option<&SplitterState> {
        match &self.state {
            MachineState::Splitter(s) => Some(s),
            _ => None,
        }
    }

    pub fn arm(&self) -> Option<&ArmState> {
        match &self.state {
            MachineState::Arm(a) => Some(a),
            _ => None,
        }
    }

    pub fn arm_mut(&mut self) -> Option<&mut ArmState> {
        match &mut self.state {
            MachineState::Arm(a) => Some(a),
            _ => None,
        }
    }

    pub fn teleporter(&self) -> Option<&TeleporterState> {
        match &self.state {
            MachineState::Teleporter(t) => Some(t),
            _ => None,
        }
    }

    pub fn teleporter_mut(&mut self) -> Option<&mut TeleporterState> {
        match &mut self.state {
            MachineState::Teleporter(t) => Some(t),
            _ => None,
        }
    }

    /// Whether an idle arm would take a material of type `resource`.
    pub fn arm_accepts(&self, resource: ResourceId) -> bool {
        match (&self.state, self.kind) {
            (MachineState::Arm(arm), MachineKind::FilteredArm) => {
                !arm.motion_active && arm.filter == Some(resource)
            }
            (MachineState::Arm(arm), _) => !arm.motion_active,
            _ => false,
        }
    }
}

/// Player-visible settings of a machine, as stored in snapshots and floor plans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSettings {
    pub blueprint: Option<ResourceId>,
    pub spawn_quantity: u8,
    pub filter_left: Option<ResourceId>,
    pub filter_right: Option<ResourceId>,
    pub arm_filter: Option<ResourceId>,
    pub teleporter_channel: Option<u32>,
    pub split_ratio: Option<[u32; SPLIT_DIRECTIONS]>,
}

impl Machine {
    pub fn settings(&self) -> MachineSettings {
        let mut s = MachineSettings::default();
        match &self.state {
            MachineState::Producer(p) => {
                s.blueprint = p.selected;
                s.spawn_quantity = p.spawn_quantity;
            }
            MachineState::Splitter(sp) => s.split_ratio = Some(sp.ratio),
            MachineState::Filter(f) => {
                s.filter_left = f.left;
                s.filter_right = f.right;
            }
            MachineState::Arm(a) => s.arm_filter = a.filter,
            MachineState::Teleporter(t) => s.teleporter_channel = t.channel,
            MachineState::Passive => {}
        }
        s
    }

    /// Restore captured settings. Values that do not fit this machine's kind
    /// are ignored.
    pub fn apply_settings(&mut self, s: &MachineSettings) {
        let kind = self.kind;
        match &mut self.state {
            MachineState::Producer(p) => {
                if kind.selects_blueprint()
                    && let Some(blueprint) = s.blueprint
                {
                    p.select(blueprint);
                }
                if kind == MachineKind::Starter {
                    p.spawn_quantity = s.spawn_quantity.clamp(1, MAX_STACK);
                }
            }
            MachineState::Splitter(sp) => {
                if let Some(ratio) = s.split_ratio
                    && SplitterState::is_valid_ratio(kind, ratio)
                {
                    sp.set_ratio(ratio);
                }
            }
            MachineState::Filter(f) => {
                f.left = s.filter_left;
                f.right = s.filter_right;
            }
            MachineState::Arm(a) => a.filter = s.arm_filter,
            MachineState::Teleporter(t) => t.channel = s.teleporter_channel,
            MachineState::Passive => {}
        }
    }
}

/// Validate a requested Starter spawn quantity against the research cap.
pub fn clamp_spawn_quantity(requested: u8, research_max: u8) -> Option<u8> {
    (1..=research_max.min(MAX_STACK)).contains(&requested).then_some(requested)
}
