//! Player commands.
//!
//! Commands are the only way a UI changes the world. They either run
//! immediately between ticks via `Engine::execute`, or are queued with
//! `Engine::submit` and drained at the next tick boundary. A rejected command
//! leaves the world untouched.

use crate::catalog::{CatalogError, MachineKind};
use crate::fixed::{Money, Ticks};
use crate::grid::{AssemblyLine, Orientation, Position};
use crate::id::{MachineId, ResearchId, ResourceId};

// ---------------------------------------------------------------------------
// Command enum
// ---------------------------------------------------------------------------

/// A per-machine setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineParam {
    /// Starter or Crafter output.
    Blueprint(ResourceId),
    /// `[left, straight, right]` weights.
    SplitRatio([u32; 3]),
    FilterLeft(Option<ResourceId>),
    FilterRight(Option<ResourceId>),
    ArmFilter(Option<ResourceId>),
    TeleporterChannel(Option<u32>),
    SpawnQuantity(u8),
    /// Discard a producer's stored components.
    ClearInventory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    BuildMachine {
        kind: MachineKind,
        position: Position,
        orientation: Orientation,
    },
    MoveMachine {
        machine: MachineId,
        to: Position,
    },
    /// Advance one step in rotation order.
    RotateMachine {
        machine: MachineId,
    },
    SellMachine {
        machine: MachineId,
    },
    SetMachineParam {
        machine: MachineId,
        param: MachineParam,
    },
    BuyTile {
        position: Position,
    },
    BuyAssemblyLine {
        line: AssemblyLine,
    },
    UnlockMachine {
        kind: MachineKind,
    },
    UnlockBlueprint {
        resource: ResourceId,
    },
    UnlockResearch {
        research: ResearchId,
    },
    /// Capture every machine in the rectangle spanned by two tile corners.
    SaveFloorPlan {
        slot: usize,
        corner_a: Position,
        corner_b: Position,
    },
    /// Rebuild a saved plan with its bottom-left tile at `origin`.
    PlaceFloorPlan {
        slot: usize,
        origin: Position,
    },
    ResetWorld,
}

/// What a successful command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Built(MachineId),
    Moved,
    Rotated(Orientation),
    Sold { refund: Money },
    ParamSet,
    TileBought { price: Money },
    LineBought { price: Money },
    Unlocked { cost: Money },
    FloorPlanSaved { machines: usize },
    FloorPlanPlaced { built: Vec<MachineId> },
    Reset,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a command was rejected. The display text is shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Not enough money")]
    InsufficientFunds { needed: Money, balance: Money },
    #[error("Invalid Location")]
    InvalidLocation(Position),
    #[error("Tile already occupied")]
    Occupied(Position),
    #[error("Maximum amount of Starters ({limit}) already placed in this line")]
    StarterLimit { limit: u32 },
    #[error("Maximum amount of Teleporters ({limit}) already placed")]
    TeleporterLimit { limit: u32 },
    #[error("Machine type is locked: {0}")]
    MachineLocked(MachineKind),
    #[error("Blueprint is locked")]
    BlueprintLocked(ResourceId),
    #[error("Unknown machine")]
    UnknownMachine(MachineId),
    #[error("Invalid setting: {0}")]
    InvalidParameter(String),
    #[error("Already unlocked")]
    AlreadyUnlocked,
    #[error("Requires {0} first")]
    MissingPrerequisite(String),
    #[error("Tile not available for purchase")]
    TileUnavailable(Position),
    #[error("Invalid Area Selected")]
    InvalidArea,
    #[error("{0} not unlocked")]
    FeatureLocked(&'static str),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

// ---------------------------------------------------------------------------
// CommandQueue
// ---------------------------------------------------------------------------

/// Commands waiting for the next tick boundary, with optional history.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: Vec<Command>,
    /// Executed commands as `(tick, command)`.
    history: Vec<(Ticks, Command)>,
    /// 0 disables history.
    max_history: usize,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            max_history,
            ..Self::default()
        }
    }

    pub fn push(&mut self, command: Command) {
        self.pending.push(command);
    }

    pub fn push_batch(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.pending.extend(commands);
    }

    /// Take every pending command in submission order.
    pub fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.pending)
    }

    /// Remember an executed command, trimming the oldest entries past the limit.
    pub fn record(&mut self, tick: Ticks, command: &Command) {
        if self.max_history == 0 {
            return;
        }
        self.history.push((tick, command.clone()));
        let excess = self.history.len().saturating_sub(self.max_history);
        if excess > 0 {
            self.history.drain(..excess);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn history(&self) -> &[(Ticks, Command)] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Drop pending commands without running them.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
