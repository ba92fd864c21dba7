//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::catalog::MachineKind;
use crate::engine::Engine;
use crate::event::{Event, EventKind};
use crate::fixed::Money;
use crate::grid::{AssemblyLine, Orientation, Position};
use crate::id::{MachineId, ResourceId};
use crate::machine::Machine;
use std::cell::RefCell;
use std::rc::Rc;

// ===========================================================================
// Engine setup
// ===========================================================================

/// Default engine with every machine, blueprint, line, and floor plans
/// unlocked, and a balance large enough to never run dry.
pub fn rich_engine() -> Engine {
    let mut engine = Engine::default();
    unlock_everything(&mut engine);
    set_balance(&mut engine, 1_000_000_000_000);
    engine
}

pub fn unlock_everything(engine: &mut Engine) {
    let economy = &mut engine.economy;
    economy.unlocked_machines.extend(MachineKind::ALL);
    economy
        .unlocked_blueprints
        .extend(engine.catalog.resources().map(|(id, _)| id));
    economy.unlocked_lines.extend(AssemblyLine::ALL);
    economy.floor_plans_unlocked = true;
    for line in AssemblyLine::ALL {
        engine.grid.set_line_walled(line, false);
    }
}

pub fn set_balance(engine: &mut Engine, balance: Money) {
    engine.economy.balance = balance;
}

/// Place a machine at `(column, row)` without charging or validating.
pub fn place(
    engine: &mut Engine,
    kind: MachineKind,
    column: i32,
    row: i32,
    orientation: Orientation,
) -> MachineId {
    let machine = Machine::new(kind, Position::tile(column, row), orientation, &engine.catalog);
    engine.insert_machine(machine)
}

pub fn resource(engine: &Engine, name: &str) -> ResourceId {
    engine
        .catalog()
        .resource_id(name)
        .unwrap_or_else(|| panic!("no resource named {name}"))
}

// ===========================================================================
// Running
// ===========================================================================

pub fn run_ticks(engine: &mut Engine, ticks: u64) {
    for _ in 0..ticks {
        engine.step();
    }
}

// ===========================================================================
// Events
// ===========================================================================

/// Collect every delivered event of one kind.
pub fn record_events(engine: &mut Engine, kind: EventKind) -> Rc<RefCell<Vec<Event>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    engine
        .event_bus
        .subscribe(kind, Box::new(move |event| sink.borrow_mut().push(event.clone())));
    log
}

/// Text of every recorded `Message` event.
pub fn message_texts(events: &Rc<RefCell<Vec<Event>>>) -> Vec<String> {
    events
        .borrow()
        .iter()
        .filter_map(|e| match e {
            Event::Message { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect()
}
