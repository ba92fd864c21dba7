//! Notifications for the UI collaborator.
//!
//! The engine emits events while a tick or command runs and delivers them in
//! one batch afterwards. Each event kind has its own [`EventBuffer`] ring
//! buffer; listeners are passive and never mutate the simulation.
//!
//! Event kinds can be suppressed with [`EventBus::suppress`], which skips
//! buffering for that kind entirely.

use crate::achievement::Achievement;
use crate::catalog::MachineKind;
use crate::fixed::{Money, Ticks};
use crate::grid::Position;
use crate::id::{MachineId, MaterialId, ResourceId};
use crate::stats::SalesReport;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Why a material left the world without being consumed by a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestroyReason {
    /// Reached a tile center with no machine, a Starter, or an arm.
    FellOff,
    /// Entered a teleporter input with no matching output.
    NoTeleporterOutput,
    /// Held by an arm that was moved or sold.
    ArmRemoved,
}

/// A simulation event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    BalanceChanged {
        balance: Money,
        tick: Ticks,
    },
    /// Transient notice for the status line.
    Message {
        text: String,
        tick: Ticks,
    },
    Sale {
        resource: ResourceId,
        quantity: u32,
        amount: Money,
        text: String,
        tick: Ticks,
    },
    AchievementUnlocked {
        achievement: Achievement,
        title: String,
        tick: Ticks,
    },
    SalesReport {
        report: SalesReport,
        tick: Ticks,
    },
    MaterialDestroyed {
        material: MaterialId,
        resource: ResourceId,
        reason: DestroyReason,
        tick: Ticks,
    },
    MachineBuilt {
        machine: MachineId,
        kind: MachineKind,
        position: Position,
        tick: Ticks,
    },
    MachineSold {
        machine: MachineId,
        kind: MachineKind,
        refund: Money,
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for suppression and subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BalanceChanged,
    Message,
    Sale,
    AchievementUnlocked,
    SalesReport,
    MaterialDestroyed,
    MachineBuilt,
    MachineSold,
}

const EVENT_KIND_COUNT: usize = 8;

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::BalanceChanged { .. } => EventKind::BalanceChanged,
            Event::Message { .. } => EventKind::Message,
            Event::Sale { .. } => EventKind::Sale,
            Event::AchievementUnlocked { .. } => EventKind::AchievementUnlocked,
            Event::SalesReport { .. } => EventKind::SalesReport,
            Event::MaterialDestroyed { .. } => EventKind::MaterialDestroyed,
            Event::MachineBuilt { .. } => EventKind::MachineBuilt,
            Event::MachineSold { .. } => EventKind::MachineSold,
        }
    }

    pub fn tick(&self) -> Ticks {
        match self {
            Event::BalanceChanged { tick, .. }
            | Event::Message { tick, .. }
            | Event::Sale { tick, .. }
            | Event::AchievementUnlocked { tick, .. }
            | Event::SalesReport { tick, .. }
            | Event::MaterialDestroyed { tick, .. }
            | Event::MachineBuilt { tick, .. }
            | Event::MachineSold { tick, .. } => *tick,
        }
    }
}

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer
// ---------------------------------------------------------------------------

/// Fixed-capacity ring buffer. When full, the oldest event is overwritten.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<Event>>,
    /// Next write slot.
    head: usize,
    len: usize,
    total_written: u64,
}

impl EventBuffer {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    pub fn push(&mut self, event: Event) {
        let capacity = self.capacity();
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % capacity;
        self.len = (self.len + 1).min(capacity);
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total events written since creation, including overwritten ones.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        let capacity = self.capacity();
        let start = if self.len < capacity { 0 } else { self.head };
        (0..self.len).filter_map(move |i| self.events[(start + i) % capacity].as_ref())
    }

    pub fn clear(&mut self) {
        self.events.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// A listener receives events read-only.
pub type Listener = Box<dyn FnMut(&Event)>;

/// One ring buffer and listener list per event kind.
pub struct EventBus {
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: [Vec<Listener>; EVENT_KIND_COUNT],
    capacity: usize,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffers", &self.buffers)
            .field("suppressed", &self.suppressed)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: Default::default(),
            capacity,
        }
    }

    /// Stop buffering a kind. Any buffered events of that kind are dropped.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        self.buffers[kind.index()] = None;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    pub fn emit(&mut self, event: Event) {
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }
        let capacity = self.capacity;
        self.buffers[idx]
            .get_or_insert_with(|| EventBuffer::new(capacity))
            .push(event);
    }

    /// Listeners run in registration order during [`deliver`](Self::deliver).
    pub fn subscribe(&mut self, kind: EventKind, listener: Listener) {
        self.listeners[kind.index()].push(listener);
    }

    /// Hand every buffered event to its listeners, then clear the buffers.
    pub fn deliver(&mut self) {
        for idx in 0..EVENT_KIND_COUNT {
            let Some(buffer) = self.buffers[idx].as_mut() else {
                continue;
            };
            if buffer.is_empty() {
                continue;
            }
            for listener in &mut self.listeners[idx] {
                for event in buffer.iter() {
                    listener(event);
                }
            }
            buffer.clear();
        }
    }

    pub fn buffer(&self, kind: EventKind) -> Option<&EventBuffer> {
        self.buffers[kind.index()].as_ref()
    }

    pub fn buffered_count(&self, kind: EventKind) -> usize {
        self.buffer(kind).map_or(0, EventBuffer::len)
    }

    /// Events ever emitted for a kind, including delivered ones.
    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.buffer(kind).map_or(0, EventBuffer::total_written)
    }

    /// Drop buffered events. Listeners and suppression stay.
    pub fn clear_all(&mut self) {
        for buffer in self.buffers.iter_mut().flatten() {
            buffer.clear();
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
