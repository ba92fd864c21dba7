//! The simulation engine: owns the world and runs the tick pipeline.
//!
//! # Architecture
//!
//! The `Engine` owns:
//! - The [`Grid`] of tiles and the [`Catalog`] of machine, resource and research data
//! - Machines in a `SlotMap<MachineId, Machine>`, plus their placement order and a
//!   position index
//! - Materials in a `SlotMap<MaterialId, Material>`, plus their creation order
//! - The [`GroupArena`] of visual stacking groups
//! - The [`Economy`] (balance, modifiers, unlocks) and the [`FloorPlanSlots`]
//! - A [`CommandQueue`] of player commands and an [`EventBus`] for notifications
//!
//! # Tick pipeline
//!
//! Each `step()` runs:
//! 1. **Commands** -- drain queued commands at the tick boundary
//! 2. **Snapshot** -- bump the tick and copy the machine and material id lists
//! 3. **Admin** -- sales analysis and achievement checks on their intervals
//! 4. **Production** -- on launch ticks, producers spawn queued output and queue more
//! 5. **Movement** -- every snapshot material not held by an arm moves one pixel
//! 6. **Arms** -- swinging arms advance one frame, dropping at frame 48
//! 7. **Interactions** -- materials on a machine's tile center are resolved, then
//!    anything left on an unsupported tile falls off
//! 8. **Bookkeeping** -- low-balance notice, queued reset, state hash, event delivery
//!
//! Every phase iterates the id snapshot taken in step 2 and skips ids removed
//! earlier in the tick, so anything created mid-tick waits for the next one.

use crate::achievement::{self, AchievementInputs};
use crate::catalog::{Catalog, MachineKind};
use crate::command::{Command, CommandError, CommandOutcome, CommandQueue, MachineParam};
use crate::config::{ConfigError, SimConfig};
use crate::economy::{Economy, line_prerequisite, line_price, short_money, tile_price};
use crate::event::{DestroyReason, Event, EventBus};
use crate::fixed::{Money, Ticks};
use crate::floor_plan::{FLOOR_PLAN_SLOTS, FloorPlan, FloorPlanSlots};
use crate::grid::{AssemblyLine, Grid, Orientation, Position, Tile};
use crate::group::GroupArena;
use crate::id::{MachineId, MaterialId, ResearchId, ResourceId};
use crate::kinematics::{ARM_FRAMES, ArmKinematics, ArmPose};
use crate::machine::{Machine, MachineState, SplitterState, clamp_spawn_quantity};
use crate::material::Material;
use crate::sim::{AdvanceResult, SimState, StateHash};
use crate::stats::SalesReport;
use crate::teleport;
use slotmap::SlotMap;
use std::collections::BTreeMap;

/// Notice shown once each time the balance drops below the threshold.
pub const LOW_BALANCE_MESSAGE: &str =
    "Starters may not be able to afford raw materials! May need to sell machines";

/// Notice shown when a teleporter input has nowhere to send a material.
pub const LOST_IN_TELEPORT_MESSAGE: &str = "Material destroyed by teleporter";

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The world and the fixed-step simulation that drives it.
#[derive(Debug)]
pub struct Engine {
    pub(crate) config: SimConfig,
    pub(crate) catalog: Catalog,
    pub(crate) kinematics: ArmKinematics,
    pub(crate) grid: Grid,
    pub(crate) economy: Economy,

    // -- Machines --
    pub(crate) machines: SlotMap<MachineId, Machine>,
    /// Placement order. Every phase visits machines in this order.
    pub(crate) machine_order: Vec<MachineId>,
    /// Tile center -> machine on that tile.
    pub(crate) machine_index: BTreeMap<Position, MachineId>,

    // -- Materials --
    pub(crate) materials: SlotMap<MaterialId, Material>,
    /// Creation order. May hold ids removed during the current tick until the
    /// tick's bookkeeping compacts it.
    pub(crate) material_order: Vec<MaterialId>,
    pub(crate) groups: GroupArena,

    pub(crate) floor_plans: FloorPlanSlots,
    pub(crate) sim_state: SimState,
    pub(crate) last_report: Option<SalesReport>,
    pub(crate) commands: CommandQueue,
    /// Typed event bus for UI notifications.
    pub event_bus: EventBus,
    pub(crate) reset_requested: bool,
    pub(crate) last_state_hash: u64,
}

/// Id lists copied at the start of a tick.
struct TickSnapshot {
    machines: Vec<MachineId>,
    materials: Vec<MaterialId>,
}

impl Default for Engine {
    /// The stock game with default tuning.
    fn default() -> Self {
        Self::build(SimConfig::default(), Catalog::standard())
    }
}

impl Engine {
    /// Create an engine from validated tuning and game data.
    pub fn new(config: SimConfig, catalog: Catalog) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, catalog))
    }

    fn build(config: SimConfig, catalog: Catalog) -> Self {
        let economy = Economy::new(config.starting_balance, &catalog);
        let event_bus = EventBus::new(config.event_capacity);
        let commands = CommandQueue::with_max_history(config.command_history);
        let mut engine = Self {
            config,
            catalog,
            kinematics: ArmKinematics::new(),
            grid: Grid::standard(),
            economy,
            machines: SlotMap::with_key(),
            machine_order: Vec::new(),
            machine_index: BTreeMap::new(),
            materials: SlotMap::with_key(),
            material_order: Vec::new(),
            groups: GroupArena::new(),
            floor_plans: FloorPlanSlots::default(),
            sim_state: SimState::new(),
            last_report: None,
            commands,
            event_bus,
            reset_requested: false,
            last_state_hash: 0,
        };
        engine.last_state_hash = engine.compute_state_hash();
        engine
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn kinematics(&self) -> &ArmKinematics {
        &self.kinematics
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn economy(&self) -> &Economy {
        &self.economy
    }

    pub fn balance(&self) -> Money {
        self.economy.balance
    }

    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    pub fn tile_at(&self, position: Position) -> Option<&Tile> {
        self.grid.tile_at(position)
    }

    /// Snap any pixel to the center of the tile containing it.
    pub fn tile_center_of(x: i32, y: i32) -> Position {
        Position::new(x, y).snapped()
    }

    pub fn machine(&self, id: MachineId) -> Option<&Machine> {
        self.machines.get(id)
    }

    /// Machine on an exact tile center.
    pub fn machine_at(&self, position: Position) -> Option<MachineId> {
        self.machine_index.get(&position).copied()
    }

    /// Machines in placement order.
    pub fn machines(&self) -> impl Iterator<Item = (MachineId, &Machine)> {
        self.machine_order
            .iter()
            .filter_map(|&id| self.machines.get(id).map(|m| (id, m)))
    }

    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    /// Materials in creation order.
    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &Material)> {
        self.material_order
            .iter()
            .filter_map(|&id| self.materials.get(id).map(|m| (id, m)))
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn groups(&self) -> &GroupArena {
        &self.groups
    }

    pub fn floor_plans(&self) -> &FloorPlanSlots {
        &self.floor_plans
    }

    /// The report from the most recent analysis period.
    pub fn last_report(&self) -> Option<&SalesReport> {
        self.last_report.as_ref()
    }

    /// Current pose of an arm, for rendering.
    pub fn arm_pose(&self, id: MachineId) -> Option<&ArmPose> {
        let machine = self.machines.get(id)?;
        let arm = machine.arm()?;
        Some(self.kinematics.pose(machine.orientation, arm.frame))
    }

    /// Executed commands, oldest first. Empty unless history is enabled.
    pub fn command_history(&self) -> &[(Ticks, Command)] {
        self.commands.history()
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.pending_count()
    }

    /// Hash of the world after the most recent tick or command.
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Run a command now, between ticks. Events it raises are delivered
    /// before returning.
    pub fn execute(&mut self, command: Command) -> Result<CommandOutcome, CommandError> {
        let balance_before = self.economy.balance;
        let result = self.apply_command(command);
        self.compact_material_order();
        self.emit_balance_if_changed(balance_before);
        self.last_state_hash = self.compute_state_hash();
        self.event_bus.deliver();
        result
    }

    /// Queue a command for the next tick boundary.
    pub fn submit(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn submit_batch(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.commands.push_batch(commands);
    }

    /// Reset the world at the end of the current or next tick.
    pub fn request_reset(&mut self) {
        self.reset_requested = true;
    }

    fn apply_command(&mut self, command: Command) -> Result<CommandOutcome, CommandError> {
        let result = self.dispatch(&command);
        match &result {
            Ok(_) => self.commands.record(self.sim_state.tick, &command),
            Err(err) => {
                log::debug!("command rejected at tick {}: {err}", self.sim_state.tick);
                self.message(err.to_string());
            }
        }
        result
    }

    fn dispatch(&mut self, command: &Command) -> Result<CommandOutcome, CommandError> {
        match *command {
            Command::BuildMachine {
                kind,
                position,
                orientation,
            } => self
                .build_machine(kind, position, orientation)
                .map(CommandOutcome::Built),
            Command::MoveMachine { machine, to } => {
                self.move_machine(machine, to).map(|()| CommandOutcome::Moved)
            }
            Command::RotateMachine { machine } => {
                self.rotate_machine(machine).map(CommandOutcome::Rotated)
            }
            Command::SellMachine { machine } => self
                .sell_machine(machine)
                .map(|refund| CommandOutcome::Sold { refund }),
            Command::SetMachineParam { machine, ref param } => self
                .set_machine_param(machine, param)
                .map(|()| CommandOutcome::ParamSet),
            Command::BuyTile { position } => self
                .buy_tile(position)
                .map(|price| CommandOutcome::TileBought { price }),
            Command::BuyAssemblyLine { line } => self
                .buy_assembly_line(line)
                .map(|price| CommandOutcome::LineBought { price }),
            Command::UnlockMachine { kind } => self
                .unlock_machine(kind)
                .map(|cost| CommandOutcome::Unlocked { cost }),
            Command::UnlockBlueprint { resource } => self
                .unlock_blueprint(resource)
                .map(|cost| CommandOutcome::Unlocked { cost }),
            Command::UnlockResearch { research } => self
                .unlock_research(research)
                .map(|cost| CommandOutcome::Unlocked { cost }),
            Command::SaveFloorPlan {
                slot,
                corner_a,
                corner_b,
            } => self
                .save_floor_plan(slot, corner_a, corner_b)
                .map(|machines| CommandOutcome::FloorPlanSaved { machines }),
            Command::PlaceFloorPlan { slot, origin } => self
                .place_floor_plan(slot, origin)
                .map(|built| CommandOutcome::FloorPlanPlaced { built }),
            Command::ResetWorld => {
                self.reset();
                Ok(CommandOutcome::Reset)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Command handlers: machines
    // -----------------------------------------------------------------------

    fn require_funds(&self, amount: Money) -> Result<(), CommandError> {
        if self.economy.can_afford(amount) {
            Ok(())
        } else {
            Err(CommandError::InsufficientFunds {
                needed: amount,
                balance: self.economy.balance,
            })
        }
    }

    /// An unlocked, unwalled, empty tile.
    fn check_site(&self, position: Position) -> Result<(), CommandError> {
        match self.grid.tile_at(position) {
            Some(tile) if tile.is_buildable() => {}
            _ => return Err(CommandError::InvalidLocation(position)),
        }
        if self.machine_index.contains_key(&position) {
            return Err(CommandError::Occupied(position));
        }
        Ok(())
    }

    /// Per-line Starter cap and global teleporter cap, which inputs and
    /// outputs share. `moving` is left out of the counts.
    fn check_limits(
        &self,
        kind: MachineKind,
        position: Position,
        moving: Option<MachineId>,
    ) -> Result<(), CommandError> {
        let others = || self.machines.iter().filter(move |(id, _)| Some(*id) != moving);
        if kind == MachineKind::Starter {
            let line = AssemblyLine::of(position.x);
            let limit = self.economy.max_starters_per_line;
            let starters = others()
                .filter(|(_, m)| m.kind == MachineKind::Starter && m.line() == line)
                .count();
            if starters >= limit as usize {
                return Err(CommandError::StarterLimit { limit });
            }
        }
        if kind.is_teleporter() {
            let limit = self.economy.max_teleporters_total;
            if others().filter(|(_, m)| m.kind.is_teleporter()).count() >= limit as usize {
                return Err(CommandError::TeleporterLimit { limit });
            }
        }
        Ok(())
    }

    fn build_machine(
        &mut self,
        kind: MachineKind,
        position: Position,
        orientation: Orientation,
    ) -> Result<MachineId, CommandError> {
        if !self.economy.unlocked_machines.contains(&kind) {
            return Err(CommandError::MachineLocked(kind));
        }
        self.check_site(position)?;
        self.check_limits(kind, position, None)?;
        let cost = self.catalog.machine(kind).build_cost;
        self.require_funds(cost)?;

        self.economy.charge(cost);
        let machine = Machine::new(kind, position, orientation, &self.catalog);
        let id = self.insert_machine(machine);
        log::debug!("built {kind} at {position:?} for {cost}");
        self.event_bus.emit(Event::MachineBuilt {
            machine: id,
            kind,
            position,
            tick: self.sim_state.tick,
        });
        Ok(id)
    }

    /// Add a machine without charging for it. Teleporter pairing is refreshed.
    pub(crate) fn insert_machine(&mut self, machine: Machine) -> MachineId {
        let position = machine.position;
        let is_teleporter = machine.kind.is_teleporter();
        let id = self.machines.insert(machine);
        self.machine_order.push(id);
        self.machine_index.insert(position, id);
        if is_teleporter {
            teleport::refresh_activation(&mut self.machines);
        }
        id
    }

    fn move_machine(&mut self, id: MachineId, to: Position) -> Result<(), CommandError> {
        let (kind, from) = self
            .machines
            .get(id)
            .map(|m| (m.kind, m.position))
            .ok_or(CommandError::UnknownMachine(id))?;
        self.check_site(to)?;
        self.check_limits(kind, to, Some(id))?;

        self.drop_held_material(id);
        self.machine_index.remove(&from);
        self.machine_index.insert(to, id);
        if let Some(machine) = self.machines.get_mut(id) {
            machine.position = to;
        }
        if kind.is_teleporter() {
            teleport::refresh_activation(&mut self.machines);
        }
        Ok(())
    }

    fn rotate_machine(&mut self, id: MachineId) -> Result<Orientation, CommandError> {
        let machine = self
            .machines
            .get_mut(id)
            .ok_or(CommandError::UnknownMachine(id))?;
        machine.orientation = machine.orientation.rotated();
        Ok(machine.orientation)
    }

    fn sell_machine(&mut self, id: MachineId) -> Result<Money, CommandError> {
        let kind = self
            .machines
            .get(id)
            .map(|m| m.kind)
            .ok_or(CommandError::UnknownMachine(id))?;
        self.drop_held_material(id);
        let refund = self.catalog.machine(kind).sell_value();
        self.remove_machine(id);
        self.economy.credit(refund);
        self.message(format!("Sold Machine for ${}", short_money(refund)));
        self.event_bus.emit(Event::MachineSold {
            machine: id,
            kind,
            refund,
            tick: self.sim_state.tick,
        });
        Ok(refund)
    }

    fn remove_machine(&mut self, id: MachineId) {
        let Some(machine) = self.machines.remove(id) else {
            return;
        };
        self.machine_order.retain(|&m| m != id);
        self.machine_index.remove(&machine.position);
        if machine.kind.is_teleporter() {
            teleport::refresh_activation(&mut self.machines);
        }
    }

    /// Stop an arm's swing and destroy whatever it was holding.
    fn drop_held_material(&mut self, id: MachineId) {
        let held = self
            .machines
            .get_mut(id)
            .and_then(Machine::arm_mut)
            .and_then(|arm| arm.cancel());
        if let Some(material) = held {
            self.remove_material(material, Some(DestroyReason::ArmRemoved));
        }
    }

    fn set_machine_param(&mut self, id: MachineId, param: &MachineParam) -> Result<(), CommandError> {
        let kind = self
            .machines
            .get(id)
            .map(|m| m.kind)
            .ok_or(CommandError::UnknownMachine(id))?;
        let invalid = |what: &str| CommandError::InvalidParameter(format!("{what} does not apply to {kind}"));

        match *param {
            MachineParam::Blueprint(resource) => {
                let def = self.catalog.resource(resource).ok_or_else(|| {
                    CommandError::InvalidParameter(format!("unknown resource {}", resource.0))
                })?;
                if !kind.selects_blueprint() || kind.blueprint_class() != Some(def.class) {
                    return Err(invalid(&def.name));
                }
                if !self.economy.unlocked_blueprints.contains(&resource) {
                    return Err(CommandError::BlueprintLocked(resource));
                }
                if let Some(producer) = self.machines.get_mut(id).and_then(Machine::producer_mut) {
                    producer.select(resource);
                }
            }
            MachineParam::SplitRatio(ratio) => {
                if !kind.is_splitter() || !SplitterState::is_valid_ratio(kind, ratio) {
                    return Err(CommandError::InvalidParameter(format!(
                        "split ratio {ratio:?} is not valid for {kind}"
                    )));
                }
                if let Some(MachineState::Splitter(state)) = self.machines.get_mut(id).map(|m| &mut m.state) {
                    state.set_ratio(ratio);
                }
            }
            MachineParam::FilterLeft(resource) | MachineParam::FilterRight(resource) => {
                let left = matches!(param, MachineParam::FilterLeft(_));
                let allowed = match kind {
                    MachineKind::FilterTee => true,
                    MachineKind::FilterLeft => left,
                    MachineKind::FilterRight => !left,
                    _ => false,
                };
                if !allowed {
                    return Err(invalid(if left { "left filter" } else { "right filter" }));
                }
                self.check_resource(resource)?;
                if let Some(MachineState::Filter(filter)) = self.machines.get_mut(id).map(|m| &mut m.state) {
                    if left {
                        filter.left = resource;
                    } else {
                        filter.right = resource;
                    }
                }
            }
            MachineParam::ArmFilter(resource) => {
                if kind != MachineKind::FilteredArm {
                    return Err(invalid("arm filter"));
                }
                self.check_resource(resource)?;
                if let Some(arm) = self.machines.get_mut(id).and_then(Machine::arm_mut) {
                    arm.filter = resource;
                }
            }
            MachineParam::TeleporterChannel(channel) => {
                if !kind.is_teleporter() {
                    return Err(invalid("teleporter channel"));
                }
                if let Some(teleporter) = self.machines.get_mut(id).and_then(Machine::teleporter_mut) {
                    teleporter.channel = channel;
                }
                teleport::refresh_activation(&mut self.machines);
            }
            MachineParam::SpawnQuantity(requested) => {
                if kind != MachineKind::Starter {
                    return Err(invalid("spawn quantity"));
                }
                let max = self.economy.starter_max_spawn_quantity;
                let quantity = clamp_spawn_quantity(requested, max).ok_or_else(|| {
                    CommandError::InvalidParameter(format!("spawn quantity must be between 1 and {max}"))
                })?;
                if let Some(producer) = self.machines.get_mut(id).and_then(Machine::producer_mut) {
                    producer.spawn_quantity = quantity;
                }
            }
            MachineParam::ClearInventory => {
                let producer = self
                    .machines
                    .get_mut(id)
                    .and_then(Machine::producer_mut)
                    .ok_or_else(|| invalid("inventory"))?;
                producer.inventory.clear();
            }
        }
        Ok(())
    }

    fn check_resource(&self, resource: Option<ResourceId>) -> Result<(), CommandError> {
        match resource {
            Some(r) if self.catalog.resource(r).is_none() => Err(CommandError::InvalidParameter(
                format!("unknown resource {}", r.0),
            )),
            _ => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Command handlers: purchases
    // -----------------------------------------------------------------------

    fn buy_tile(&mut self, position: Position) -> Result<Money, CommandError> {
        let tile = self
            .grid
            .tile_at(position)
            .ok_or(CommandError::InvalidLocation(position))?;
        if !tile.locked || tile.walled {
            return Err(CommandError::TileUnavailable(position));
        }
        let price = tile_price(self.grid.unlocked_count());
        self.require_funds(price)?;
        self.economy.charge(price);
        self.grid.set_locked(position, false);
        self.message(format!("Bought Tile for ${}!", short_money(price)));
        Ok(price)
    }

    fn buy_assembly_line(&mut self, line: AssemblyLine) -> Result<Money, CommandError> {
        if self.economy.unlocked_lines.contains(&line) {
            return Err(CommandError::AlreadyUnlocked);
        }
        let price = line_price(line).ok_or(CommandError::AlreadyUnlocked)?;
        if let Some(required) = line_prerequisite(line)
            && !self.economy.unlocked_lines.contains(&required)
        {
            return Err(CommandError::MissingPrerequisite(format!(
                "Assembly Line {}",
                required.number()
            )));
        }
        self.require_funds(price)?;
        self.economy.charge(price);
        self.economy.unlocked_lines.insert(line);
        self.grid.set_line_walled(line, false);
        log::info!("assembly line {} bought for {price}", line.number());
        self.message(format!(
            "Bought Assembly Line {} for ${}!",
            line.number(),
            short_money(price)
        ));
        Ok(price)
    }

    fn unlock_machine(&mut self, kind: MachineKind) -> Result<Money, CommandError> {
        if self.economy.unlocked_machines.contains(&kind) {
            return Err(CommandError::AlreadyUnlocked);
        }
        let cost = self.catalog.machine(kind).unlock_cost;
        self.require_funds(cost)?;
        self.economy.charge(cost);
        self.economy.unlocked_machines.insert(kind);
        self.message(format!("Unlocked machine type: {kind}"));
        Ok(cost)
    }

    fn unlock_blueprint(&mut self, resource: ResourceId) -> Result<Money, CommandError> {
        let def = self.catalog.resource(resource).ok_or_else(|| {
            CommandError::InvalidParameter(format!("unknown resource {}", resource.0))
        })?;
        if self.economy.unlocked_blueprints.contains(&resource) {
            return Err(CommandError::AlreadyUnlocked);
        }
        let (cost, name) = (def.unlock_cost, def.name.clone());
        self.require_funds(cost)?;
        self.economy.charge(cost);
        self.economy.unlocked_blueprints.insert(resource);
        self.message(format!("Unlocked Blueprint: {name}"));
        Ok(cost)
    }

    fn unlock_research(&mut self, research: ResearchId) -> Result<Money, CommandError> {
        let def = self.catalog.research(research).ok_or_else(|| {
            CommandError::InvalidParameter(format!("unknown research {}", research.0))
        })?;
        if self.economy.unlocked_research.contains(&research) {
            return Err(CommandError::AlreadyUnlocked);
        }
        if let Some(required) = def.prerequisite
            && !self.economy.unlocked_research.contains(&required)
        {
            let name = self
                .catalog
                .research(required)
                .map_or_else(|| format!("research {}", required.0), |r| r.name.clone());
            return Err(CommandError::MissingPrerequisite(name));
        }
        let (cost, effect, name) = (def.cost, def.effect, def.name.clone());
        self.require_funds(cost)?;
        self.economy.charge(cost);
        self.economy.unlocked_research.insert(research);
        self.economy.apply_research(effect);
        log::info!("research {name:?} purchased for {cost}");
        self.message(format!("Purchased Research for ${}", short_money(cost)));
        Ok(cost)
    }

    // -----------------------------------------------------------------------
    // Command handlers: floor plans
    // -----------------------------------------------------------------------

    fn save_floor_plan(&mut self, slot: usize, a: Position, b: Position) -> Result<usize, CommandError> {
        if !self.economy.floor_plans_unlocked {
            return Err(CommandError::FeatureLocked("Floor plans"));
        }
        if slot >= FLOOR_PLAN_SLOTS {
            return Err(CommandError::InvalidParameter(format!("no floor plan slot {slot}")));
        }
        if self.grid.tile_at(a).is_none() || self.grid.tile_at(b).is_none() {
            return Err(CommandError::InvalidArea);
        }
        let plan = FloorPlan::capture(self.machines().map(|(_, m)| m), a, b);
        if plan.is_empty() {
            return Err(CommandError::InvalidArea);
        }
        let count = plan.len();
        self.floor_plans.store(slot, plan);
        self.message("Floor Plan Saved!");
        Ok(count)
    }

    fn place_floor_plan(&mut self, slot: usize, origin: Position) -> Result<Vec<MachineId>, CommandError> {
        if !self.economy.floor_plans_unlocked {
            return Err(CommandError::FeatureLocked("Floor plans"));
        }
        let plan = self
            .floor_plans
            .get(slot)
            .cloned()
            .ok_or_else(|| CommandError::InvalidParameter(format!("floor plan slot {slot} is empty")))?;
        for tile in plan.footprint(origin) {
            self.check_site(tile)?;
        }

        let mut built = Vec::with_capacity(plan.len());
        for (record, position) in plan.placements(origin) {
            match self.build_machine(record.kind, position, record.orientation) {
                Ok(id) => {
                    if let Some(machine) = self.machines.get_mut(id) {
                        machine.apply_settings(&record.settings);
                    }
                    built.push(id);
                }
                Err(err) => {
                    log::debug!("floor plan record {:?} skipped: {err}", record.kind);
                    self.message(err.to_string());
                }
            }
        }
        teleport::refresh_activation(&mut self.machines);
        self.message("Floor Plan Placed!");
        Ok(built)
    }

    // -----------------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------------

    /// Empty the world and start a fresh economy. The tick counter keeps
    /// running; listeners and suppression settings survive.
    pub fn reset(&mut self) {
        self.machines.clear();
        self.machine_order.clear();
        self.machine_index.clear();
        self.materials.clear();
        self.material_order.clear();
        self.groups.clear();
        self.grid = Grid::standard();
        self.economy = Economy::new(self.config.starting_balance, &self.catalog);
        self.floor_plans = FloorPlanSlots::default();
        self.last_report = None;
        self.reset_requested = false;
        log::info!("world reset at tick {}", self.sim_state.tick);
        self.message("Game Reset!");
    }

    // -----------------------------------------------------------------------
    // Materials
    // -----------------------------------------------------------------------

    /// Put a stack on the floor. It is not moved or matched until the next
    /// tick.
    pub fn spawn_material(
        &mut self,
        resource: ResourceId,
        position: Position,
        orientation: Orientation,
        quantity: u8,
    ) -> MaterialId {
        self.insert_material(Material::new(resource, position, orientation, quantity))
    }

    fn insert_material(&mut self, material: Material) -> MaterialId {
        let id = self.materials.insert(material);
        self.material_order.push(id);
        id
    }

    /// The only way a material leaves the world. `reason` is set for losses;
    /// materials consumed by a machine pass `None`.
    fn remove_material(&mut self, id: MaterialId, reason: Option<DestroyReason>) {
        let Some(material) = self.materials.remove(id) else {
            return;
        };
        if let Some(group) = material.group {
            self.groups.remove_member(group, id);
        }
        if let Some(reason) = reason {
            log::debug!(
                "{} at {:?} destroyed: {reason:?}",
                self.catalog.resource_name(material.resource),
                material.position
            );
            self.event_bus.emit(Event::MaterialDestroyed {
                material: id,
                resource: material.resource,
                reason,
                tick: self.sim_state.tick,
            });
        }
    }

    fn compact_material_order(&mut self) {
        let materials = &self.materials;
        self.material_order.retain(|&id| materials.contains_key(id));
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Run exactly one tick.
    pub fn step(&mut self) -> AdvanceResult {
        self.step_internal();
        AdvanceResult { steps_run: 1 }
    }

    /// Feed elapsed wall-clock time and run every whole tick that fits.
    pub fn advance(&mut self, elapsed_ms: u64) -> AdvanceResult {
        let due = self
            .sim_state
            .accumulate(elapsed_ms, self.config.tick_interval_ms);
        for _ in 0..due {
            self.step_internal();
        }
        AdvanceResult { steps_run: due }
    }

    fn step_internal(&mut self) {
        let balance_before = self.economy.balance;

        // Phase 1: Commands.
        for command in self.commands.drain() {
            let _ = self.apply_command(command);
        }
        self.compact_material_order();

        // Phase 2: Snapshot.
        self.sim_state.tick += 1;
        let tick = self.sim_state.tick;
        let snapshot = TickSnapshot {
            machines: self.machine_order.clone(),
            materials: self.material_order.clone(),
        };

        // Phase 3: Admin.
        if tick % self.config.analysis_period_ticks == 0 {
            self.phase_sales_analysis();
        }
        if tick % self.config.achievement_check_interval == 0 {
            self.phase_achievements();
        }

        // Phase 4: Production.
        if tick % self.config.launch_interval == 0 {
            self.phase_production(&snapshot);
        }

        // Phase 5: Movement.
        for &id in &snapshot.materials {
            if let Some(material) = self.materials.get_mut(id) {
                material.advance();
            }
        }

        // Phase 6: Arms.
        self.phase_arms(&snapshot);

        // Phase 7: Interactions.
        self.phase_interactions(&snapshot);

        // Phase 8: Bookkeeping.
        if self.economy.check_low_balance(self.config.low_balance_threshold) {
            log::warn!("balance {} below threshold", self.economy.balance);
            self.message(LOW_BALANCE_MESSAGE);
        }
        if self.reset_requested {
            self.reset();
        }
        self.compact_material_order();
        self.emit_balance_if_changed(balance_before);
        self.last_state_hash = self.compute_state_hash();
        self.event_bus.deliver();
    }

    // -----------------------------------------------------------------------
    // Phase 3: Admin
    // -----------------------------------------------------------------------

    fn phase_sales_analysis(&mut self) {
        let counts = self.economy.take_sales();
        let report = SalesReport::from_counts(&counts, &self.catalog, self.config.analysis_period_secs());
        log::info!(
            "sales at tick {}: {} items, {} profit",
            self.sim_state.tick,
            report.total_items,
            report.total_profit
        );
        self.event_bus.emit(Event::SalesReport {
            report: report.clone(),
            tick: self.sim_state.tick,
        });
        self.last_report = Some(report);
    }

    fn phase_achievements(&mut self) {
        let earned = achievement::newly_unlocked(&AchievementInputs {
            catalog: &self.catalog,
            sales: &self.economy.sales,
            last_report: self.last_report.as_ref(),
            unlocked_lines: &self.economy.unlocked_lines,
            unlocked_research: &self.economy.unlocked_research,
            owned: &self.economy.achievements,
        });
        for achievement in earned {
            let title = achievement.title(&self.catalog);
            log::info!("achievement unlocked: {title}");
            self.economy.achievements.insert(achievement);
            self.event_bus.emit(Event::AchievementUnlocked {
                achievement,
                title,
                tick: self.sim_state.tick,
            });
        }
    }

    // -----------------------------------------------------------------------
    // Phase 4: Production
    // -----------------------------------------------------------------------

    fn phase_production(&mut self, snapshot: &TickSnapshot) {
        for &id in &snapshot.machines {
            let Some(machine) = self.machines.get_mut(id) else {
                continue;
            };
            let (kind, position, orientation) = (machine.kind, machine.position, machine.orientation);
            let Some(producer) = machine.producer_mut() else {
                continue;
            };

            if producer.delay > 0 {
                producer.delay -= 1;
            }
            let mut spawn = None;
            if producer.delay == 0
                && let Some(resource) = producer.queued.take()
            {
                let quantity = if kind == MachineKind::Starter {
                    producer.spawn_quantity
                } else {
                    1
                };
                spawn = Some((resource, quantity));
            }

            if producer.is_idle() {
                let modifier = kind
                    .op_time_group()
                    .map_or(0, |group| self.economy.op_time_modifier(group));
                let op_time = self.catalog.machine(kind).op_time;
                let chosen = producer.considered.iter().copied().find(|&blueprint| {
                    self.catalog.resource(blueprint).is_some_and(|def| {
                        producer.has_components(&def.components)
                            && self.economy.can_afford(self.economy.scaled_op_cost(def.cost))
                    })
                });
                if let Some(blueprint) = chosen
                    && let Some(def) = self.catalog.resource(blueprint)
                {
                    self.economy.charge(self.economy.scaled_op_cost(def.cost));
                    producer.consume(&def.components);
                    producer.queued = Some(blueprint);
                    producer.delay = op_time.saturating_sub(modifier);
                }
            }

            if let Some((resource, quantity)) = spawn {
                self.spawn_material(resource, position, orientation, quantity);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Phase 6: Arms
    // -----------------------------------------------------------------------

    fn phase_arms(&mut self, snapshot: &TickSnapshot) {
        for &id in &snapshot.machines {
            let Some(machine) = self.machines.get_mut(id) else {
                continue;
            };
            let (position, orientation, dropoff) =
                (machine.position, machine.orientation, machine.dropoff_tile());
            let Some(arm) = machine.arm_mut() else {
                continue;
            };
            if !arm.motion_active {
                continue;
            }

            let (dx, dy) = self.kinematics.held_offset(orientation, arm.frame);
            if let Some(material) = arm.held.and_then(|held| self.materials.get_mut(held)) {
                material.position = position.offset(dx, dy);
            }

            if arm.frame == ARM_FRAMES && !arm.returning {
                // One pixel short of the center so the material rolls onto it.
                if let Some(material) = arm.held.take().and_then(|held| self.materials.get_mut(held)) {
                    material.position = dropoff.offset(0, -1);
                    material.orientation = Orientation::Up;
                    material.picked_up = false;
                }
                arm.returning = true;
            }

            if arm.returning && arm.frame == 1 {
                arm.motion_active = false;
                arm.returning = false;
            }
            arm.advance_frame();
        }
    }

    // -----------------------------------------------------------------------
    // Phase 7: Interactions
    // -----------------------------------------------------------------------

    fn phase_interactions(&mut self, snapshot: &TickSnapshot) {
        for &material_id in &snapshot.materials {
            let Some(material) = self.materials.get(material_id) else {
                continue;
            };
            if material.picked_up || !material.is_at_tile_center() {
                continue;
            }
            if let Some(machine_id) = self.machine_at(material.position) {
                self.interact(machine_id, material_id, snapshot);
            }
            self.fall_through(material_id);
        }
    }

    /// Resolve a material sitting on a machine's tile center.
    fn interact(&mut self, machine_id: MachineId, material_id: MaterialId, snapshot: &TickSnapshot) {
        let Some(kind) = self.machines.get(machine_id).map(|m| m.kind) else {
            return;
        };
        let op_cost = self.catalog.machine(kind).op_cost;
        match kind {
            MachineKind::Roller => self.roll(machine_id, material_id, snapshot),
            MachineKind::SplitterLeft
            | MachineKind::SplitterRight
            | MachineKind::SplitterTee
            | MachineKind::Splitter3Way => {
                self.split(machine_id, material_id);
                self.charge_op_cost(op_cost);
            }
            MachineKind::FilterLeft | MachineKind::FilterRight | MachineKind::FilterTee => {
                self.filter(machine_id, material_id);
                self.charge_op_cost(op_cost);
            }
            MachineKind::TeleporterInput => {
                self.teleport(machine_id, material_id);
                self.charge_op_cost(op_cost);
            }
            MachineKind::Crafter
            | MachineKind::Drawer
            | MachineKind::Cutter
            | MachineKind::Furnace
            | MachineKind::Press => self.absorb(machine_id, material_id),
            MachineKind::Seller => self.sell(material_id),
            MachineKind::Starter
            | MachineKind::TeleporterOutput
            | MachineKind::RoboticArm
            | MachineKind::FilteredArm => {}
        }
    }

    /// Destroy a material left on a tile center that cannot carry it.
    fn fall_through(&mut self, material_id: MaterialId) {
        let Some(material) = self.materials.get(material_id) else {
            return;
        };
        if material.picked_up || !material.is_at_tile_center() {
            return;
        }
        let supported = self
            .machine_at(material.position)
            .and_then(|id| self.machines.get(id))
            .is_some_and(|m| m.kind != MachineKind::Starter && !m.kind.is_arm());
        if !supported {
            self.remove_material(material_id, Some(DestroyReason::FellOff));
        }
    }

    fn charge_op_cost(&mut self, base: Money) {
        let cost = self.economy.scaled_op_cost(base);
        self.economy.charge(cost);
    }

    fn roll(&mut self, roller_id: MachineId, material_id: MaterialId, snapshot: &TickSnapshot) {
        let Some(orientation) = self.machines.get(roller_id).map(|m| m.orientation) else {
            return;
        };
        let Some(material) = self.materials.get_mut(material_id) else {
            return;
        };
        material.orientation = orientation;
        let position = material.position;
        if material.group.is_none() {
            self.assign_group(material_id, position, &snapshot.materials);
        }

        for &arm_id in &snapshot.machines {
            let Some(source) = self.materials.get(material_id) else {
                return;
            };
            if source.picked_up {
                return;
            }
            let resource = source.resource;
            let Some(arm) = self.machines.get(arm_id) else {
                continue;
            };
            if !arm.kind.is_arm() || arm.pickup_tile() != position || !arm.arm_accepts(resource) {
                continue;
            }
            let op_cost = self.catalog.machine(arm.kind).op_cost;

            let unit = self
                .materials
                .get_mut(material_id)
                .and_then(Material::split_one);
            let held = match unit {
                Some(unit) => self.insert_material(unit),
                None => material_id,
            };
            if let Some(m) = self.materials.get_mut(held) {
                m.picked_up = true;
            }
            if let Some(arm) = self.machines.get_mut(arm_id).and_then(Machine::arm_mut) {
                arm.begin(held);
            }
            self.charge_op_cost(op_cost);
        }
    }

    /// Join the group of a grouped neighbour within one pixel, or start a
    /// new group.
    fn assign_group(&mut self, material_id: MaterialId, position: Position, candidates: &[MaterialId]) {
        let neighbour_group = candidates
            .iter()
            .filter(|&&id| id != material_id)
            .filter_map(|&id| self.materials.get(id))
            .find(|m| m.group.is_some() && m.position.chebyshev_distance(&position) <= 1)
            .and_then(|m| m.group);
        let joined = neighbour_group
            .is_some_and(|group| self.groups.join(group, material_id, &mut self.materials));
        if !joined {
            self.groups.create(material_id, &mut self.materials);
        }
    }

    fn split(&mut self, splitter_id: MachineId, material_id: MaterialId) {
        let Some((resource, quantity)) = self
            .materials
            .get(material_id)
            .map(|m| (m.resource, m.quantity))
        else {
            return;
        };
        let Some(machine) = self.machines.get_mut(splitter_id) else {
            return;
        };
        let (position, facing) = (machine.position, machine.orientation);
        let MachineState::Splitter(state) = &mut machine.state else {
            return;
        };
        let counts = state.allocate(quantity as u32);

        let directions = [facing.left_output(), facing, facing.right_output()];
        for (direction, count) in directions.into_iter().zip(counts) {
            if count > 0 {
                self.spawn_material(resource, position, direction, count as u8);
            }
        }
        self.remove_material(material_id, None);
    }

    fn filter(&mut self, filter_id: MachineId, material_id: MaterialId) {
        let Some(machine) = self.machines.get(filter_id) else {
            return;
        };
        let MachineState::Filter(filter) = &machine.state else {
            return;
        };
        if let Some(material) = self.materials.get_mut(material_id) {
            material.orientation = filter.route(machine.orientation, material.resource, material.orientation);
        }
    }

    fn teleport(&mut self, input_id: MachineId, material_id: MaterialId) {
        let channel = self
            .machines
            .get(input_id)
            .and_then(Machine::teleporter)
            .and_then(|t| t.channel);
        let target = channel
            .and_then(|c| teleport::find_output(&self.machines, &self.machine_order, c))
            .and_then(|id| self.machines.get(id))
            .map(|m| (m.position, m.orientation));

        match target {
            Some((position, orientation)) => {
                if let Some(material) = self.materials.get_mut(material_id) {
                    material.position = position;
                    material.orientation = orientation;
                }
            }
            None => {
                self.message(LOST_IN_TELEPORT_MESSAGE);
                self.remove_material(material_id, Some(DestroyReason::NoTeleporterOutput));
            }
        }
    }

    fn absorb(&mut self, producer_id: MachineId, material_id: MaterialId) {
        let Some((resource, quantity)) = self
            .materials
            .get(material_id)
            .map(|m| (m.resource, m.quantity))
        else {
            return;
        };
        if let Some(producer) = self.machines.get_mut(producer_id).and_then(Machine::producer_mut) {
            producer.add_to_inventory(resource, quantity as u32);
        }
        self.remove_material(material_id, None);
    }

    fn sell(&mut self, material_id: MaterialId) {
        let Some((resource, quantity)) = self
            .materials
            .get(material_id)
            .map(|m| (m.resource, m.quantity))
        else {
            return;
        };
        let value = self.catalog.resource(resource).map_or(0, |r| r.value);
        let amount = value.saturating_mul(quantity as Money);
        self.economy.credit(amount);
        self.economy.record_sale(resource, quantity as u32);
        let text = format!(
            "Sold {} for ${}!",
            self.catalog.resource_name(resource),
            short_money(amount)
        );
        self.event_bus.emit(Event::Sale {
            resource,
            quantity: quantity as u32,
            amount,
            text,
            tick: self.sim_state.tick,
        });
        self.remove_material(material_id, None);
    }

    // -----------------------------------------------------------------------
    // Phase 8: Bookkeeping
    // -----------------------------------------------------------------------

    fn message(&mut self, text: impl Into<String>) {
        self.event_bus.emit(Event::Message {
            text: text.into(),
            tick: self.sim_state.tick,
        });
    }

    fn emit_balance_if_changed(&mut self, before: Money) {
        if self.economy.balance != before {
            self.event_bus.emit(Event::BalanceChanged {
                balance: self.economy.balance,
                tick: self.sim_state.tick,
            });
        }
    }

    pub(crate) fn compute_state_hash(&self) -> u64 {
        let mut hasher = StateHash::new();
        hasher.write_u64(self.sim_state.tick);
        hasher.write_i64(self.economy.balance);

        for (_, machine) in self.machines() {
            hasher.write_u32(machine.kind.index() as u32);
            hasher.write_i32(machine.position.x);
            hasher.write_i32(machine.position.y);
            hasher.write_u32(machine.orientation.index() as u32);
            match &machine.state {
                MachineState::Producer(p) => {
                    hasher.write_u32(p.delay);
                    hasher.write_u32(p.queued.map_or(u32::MAX, |r| r.0));
                    for (resource, count) in &p.inventory {
                        hasher.write_u32(resource.0);
                        hasher.write_u32(*count);
                    }
                }
                MachineState::Splitter(s) => {
                    for c in s.cumulative {
                        hasher.write_u32(c);
                    }
                    hasher.write_u32(s.turn as u32);
                }
                MachineState::Arm(a) => {
                    hasher.write_bool(a.motion_active);
                    hasher.write_bool(a.returning);
                    hasher.write_u32(a.frame);
                }
                MachineState::Teleporter(t) => hasher.write_bool(t.active),
                MachineState::Filter(_) | MachineState::Passive => {}
            }
        }

        for (_, material) in self.materials() {
            hasher.write_u32(material.resource.0);
            hasher.write_i32(material.position.x);
            hasher.write_i32(material.position.y);
            hasher.write_u32(material.orientation.index() as u32);
            hasher.write_u32(material.quantity as u32);
            hasher.write_bool(material.picked_up);
        }

        hasher.finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::test_utils::*;

    // -----------------------------------------------------------------------
    // Test 1: a fresh world
    // -----------------------------------------------------------------------
    #[test]
    fn fresh_engine_defaults() {
        let engine = Engine::default();
        assert_eq!(engine.balance(), 15_000);
        assert_eq!(engine.tick(), 0);
        assert_eq!(engine.machine_count(), 0);
        assert_eq!(engine.material_count(), 0);
        assert_ne!(engine.state_hash(), 0);
    }

    // -----------------------------------------------------------------------
    // Test 2: invalid config is rejected
    // -----------------------------------------------------------------------
    #[test]
    fn invalid_config_rejected() {
        let config = SimConfig {
            launch_interval: 0,
            ..SimConfig::default()
        };
        assert!(matches!(
            Engine::new(config, Catalog::standard()),
            Err(ConfigError::Zero { field: "launch_interval" })
        ));
    }

    // -----------------------------------------------------------------------
    // Test 3: advance runs whole ticks only
    // -----------------------------------------------------------------------
    #[test]
    fn advance_accumulates_milliseconds() {
        let mut engine = Engine::default();
        assert_eq!(engine.advance(60).steps_run, 2);
        assert_eq!(engine.tick(), 2);
        assert_eq!(engine.advance(15).steps_run, 1);
        assert_eq!(engine.advance(10).steps_run, 0);
        assert_eq!(engine.tick(), 3);
    }

    // -----------------------------------------------------------------------
    // Test 4: materials spawned this tick wait for the next one
    // -----------------------------------------------------------------------
    #[test]
    fn new_material_waits_one_tick() {
        let mut engine = Engine::default();
        let copper = resource(&engine, "Copper");
        let id = engine.spawn_material(copper, Position::tile(1, 1), Orientation::Right, 1);
        assert_eq!(engine.material(id).unwrap().position, Position::tile(1, 1));
        engine.step();
        assert_eq!(engine.material(id).unwrap().position, Position::tile(1, 1).offset(1, 0));
    }

    // -----------------------------------------------------------------------
    // Test 5: material with nothing underneath falls off
    // -----------------------------------------------------------------------
    #[test]
    fn material_falls_off_empty_tile() {
        let mut engine = Engine::default();
        let events = record_events(&mut engine, EventKind::MaterialDestroyed);
        let copper = resource(&engine, "Copper");
        engine.spawn_material(copper, Position::tile(1, 1), Orientation::Right, 1);
        run_ticks(&mut engine, 25);
        assert_eq!(engine.material_count(), 0);
        let events = events.borrow();
        assert!(matches!(
            events[0],
            Event::MaterialDestroyed {
                reason: DestroyReason::FellOff,
                ..
            }
        ));
    }

    // -----------------------------------------------------------------------
    // Test 6: build charges and indexes the machine
    // -----------------------------------------------------------------------
    #[test]
    fn build_charges_and_indexes() {
        let mut engine = Engine::default();
        let outcome = engine
            .execute(Command::BuildMachine {
                kind: MachineKind::Starter,
                position: Position::tile(2, 2),
                orientation: Orientation::Right,
            })
            .unwrap();
        let CommandOutcome::Built(id) = outcome else {
            panic!("expected Built, got {outcome:?}");
        };
        assert_eq!(engine.balance(), 14_000);
        assert_eq!(engine.machine_at(Position::tile(2, 2)), Some(id));
        assert_eq!(engine.machines().count(), 1);
    }

    // -----------------------------------------------------------------------
    // Test 7: failed command leaves the world untouched and posts a notice
    // -----------------------------------------------------------------------
    #[test]
    fn rejected_command_posts_message() {
        let mut engine = Engine::default();
        let messages = record_events(&mut engine, EventKind::Message);
        let before = engine.state_hash();
        let err = engine
            .execute(Command::BuildMachine {
                kind: MachineKind::Roller,
                position: Position::tile(2, 2),
                orientation: Orientation::Right,
            })
            .unwrap_err();
        assert_eq!(err, CommandError::MachineLocked(MachineKind::Roller));
        assert_eq!(engine.state_hash(), before);
        assert_eq!(engine.balance(), 15_000);
        assert_eq!(message_texts(&messages), vec!["Machine type is locked: Roller"]);
    }

    // -----------------------------------------------------------------------
    // Test 8: walled and locked tiles are not buildable
    // -----------------------------------------------------------------------
    #[test]
    fn invalid_locations() {
        let mut engine = Engine::default();
        engine.economy.unlocked_machines.extend(MachineKind::ALL);
        set_balance(&mut engine, 1_000_000_000);
        assert!(engine.tile_at(Position::tile(20, 0)).is_some_and(|t| t.walled));
        assert!(engine.tile_at(Position::tile(40, 0)).is_some_and(|t| t.walled));
        for position in [
            Position::tile(6, 0),
            Position::tile(16, 0),
            Position::tile(20, 0),
            Position::tile(40, 0),
            Position::new(14, 13),
        ] {
            let err = engine
                .execute(Command::BuildMachine {
                    kind: MachineKind::Roller,
                    position,
                    orientation: Orientation::Up,
                })
                .unwrap_err();
            assert_eq!(err, CommandError::InvalidLocation(position));
        }
    }

    // -----------------------------------------------------------------------
    // Test 9: queued commands run at the tick boundary
    // -----------------------------------------------------------------------
    #[test]
    fn submitted_commands_wait_for_step() {
        let mut engine = Engine::default();
        engine.submit(Command::BuildMachine {
            kind: MachineKind::Seller,
            position: Position::tile(0, 0),
            orientation: Orientation::Down,
        });
        assert_eq!(engine.pending_commands(), 1);
        assert_eq!(engine.machine_count(), 0);
        engine.step();
        assert_eq!(engine.pending_commands(), 0);
        assert_eq!(engine.machine_count(), 1);
        assert_eq!(engine.balance(), 10_000);
    }

    // -----------------------------------------------------------------------
    // Test 10: production stalls silently without funds
    // -----------------------------------------------------------------------
    #[test]
    fn production_stalls_when_broke() {
        let mut engine = Engine::default();
        place(&mut engine, MachineKind::Starter, 0, 0, Orientation::Up);
        set_balance(&mut engine, 4);
        run_ticks(&mut engine, 400);
        assert_eq!(engine.material_count(), 0);
        assert_eq!(engine.balance(), 4);
    }

    // -----------------------------------------------------------------------
    // Test 11: low balance notice is edge triggered
    // -----------------------------------------------------------------------
    #[test]
    fn low_balance_notice_once() {
        let mut engine = Engine::default();
        let messages = record_events(&mut engine, EventKind::Message);
        set_balance(&mut engine, 50);
        run_ticks(&mut engine, 20);
        assert_eq!(message_texts(&messages), vec![LOW_BALANCE_MESSAGE]);
    }

    // -----------------------------------------------------------------------
    // Test 12: requested reset happens at the end of the tick
    // -----------------------------------------------------------------------
    #[test]
    fn requested_reset_clears_world() {
        let mut engine = Engine::default();
        place(&mut engine, MachineKind::Seller, 0, 0, Orientation::Up);
        let copper = resource(&engine, "Copper");
        engine.spawn_material(copper, Position::tile(3, 3), Orientation::Up, 1);
        set_balance(&mut engine, 99_999);
        engine.request_reset();
        engine.step();
        assert_eq!(engine.machine_count(), 0);
        assert_eq!(engine.material_count(), 0);
        assert_eq!(engine.balance(), 15_000);
        assert_eq!(engine.tick(), 1);
    }

    // -----------------------------------------------------------------------
    // Test 13: arm swing lasts 48 frames out and back
    // -----------------------------------------------------------------------
    #[test]
    fn arm_swing_cycle() {
        let mut engine = rich_engine();
        place(&mut engine, MachineKind::Roller, 2, 2, Orientation::Up);
        let arm = place(&mut engine, MachineKind::RoboticArm, 2, 3, Orientation::Up);
        let copper = resource(&engine, "Copper");
        let id = engine.spawn_material(copper, Position::tile(2, 1), Orientation::Up, 1);

        // 25 ticks to reach the roller center, where the arm takes it.
        run_ticks(&mut engine, 25);
        let material = engine.material(id).unwrap();
        assert!(material.picked_up);
        assert!(engine.machine(arm).unwrap().arm().unwrap().motion_active);

        // Frames 1..=48 on the way out.
        run_ticks(&mut engine, 48);
        let material = engine.material(id).unwrap();
        assert!(!material.picked_up);
        assert_eq!(material.position, Position::tile(2, 4).offset(0, -1));
        assert_eq!(material.orientation, Orientation::Up);
        assert!(engine.machine(arm).unwrap().arm().unwrap().returning);

        // Frames 47..=1 on the way back.
        run_ticks(&mut engine, 47);
        let state = engine.machine(arm).unwrap().arm().unwrap();
        assert!(!state.motion_active);
        assert_eq!(state.frame, 1);
    }

    // -----------------------------------------------------------------------
    // Test 14: identical inputs give identical hashes
    // -----------------------------------------------------------------------
    #[test]
    fn state_hash_tracks_changes() {
        let mut a = Engine::default();
        let mut b = Engine::default();
        assert_eq!(a.state_hash(), b.state_hash());
        place(&mut a, MachineKind::Starter, 0, 0, Orientation::Up);
        a.step();
        b.step();
        assert_ne!(a.state_hash(), b.state_hash());
    }

    // -----------------------------------------------------------------------
    // Test 15: inputs and outputs count against one teleporter cap
    // -----------------------------------------------------------------------
    #[test]
    fn teleporter_cap_counts_both_roles() {
        let mut engine = rich_engine();
        let mut last = None;
        for row in 0..5 {
            place(&mut engine, MachineKind::TeleporterInput, 0, row, Orientation::Up);
            last = Some(place(&mut engine, MachineKind::TeleporterOutput, 1, row, Orientation::Up));
        }
        for kind in [MachineKind::TeleporterInput, MachineKind::TeleporterOutput] {
            let err = engine
                .execute(Command::BuildMachine {
                    kind,
                    position: Position::tile(2, 0),
                    orientation: Orientation::Up,
                })
                .unwrap_err();
            assert_eq!(err, CommandError::TeleporterLimit { limit: 10 });
        }

        // A teleporter at the cap can still move.
        let machine = last.unwrap();
        engine
            .execute(Command::MoveMachine {
                machine,
                to: Position::tile(2, 0),
            })
            .unwrap();
        assert_eq!(engine.machine(machine).unwrap().position, Position::tile(2, 0));
    }
}
