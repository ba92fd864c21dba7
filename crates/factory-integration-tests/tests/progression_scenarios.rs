//! Cross-crate progression scenarios: purchases, limits, floor plans,
//! snapshots, and worlds built from data files.

use std::fs;
use std::path::{Path, PathBuf};

use factory_core::catalog::MachineKind;
use factory_core::command::{Command, CommandError, CommandOutcome, MachineParam};
use factory_core::economy::tile_price;
use factory_core::engine::Engine;
use factory_core::event::EventKind;
use factory_core::grid::{AssemblyLine, Orientation, Position};
use factory_core::test_utils::*;
use factory_data::load_game_data;
use proptest::prelude::*;

// ===========================================================================
// Helpers
// ===========================================================================

fn build_at(engine: &mut Engine, kind: MachineKind, column: i32, row: i32) -> Result<CommandOutcome, CommandError> {
    engine.execute(Command::BuildMachine {
        kind,
        position: Position::tile(column, row),
        orientation: Orientation::Right,
    })
}

fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("factory_scenarios_{suffix}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn cleanup(dir: &Path) {
    let _ = fs::remove_dir_all(dir);
}

// ===========================================================================
// Build limits
// ===========================================================================

#[test]
fn starters_are_limited_per_line() {
    let mut engine = Engine::default();
    set_balance(&mut engine, 1_000_000);
    for row in 0..10 {
        build_at(&mut engine, MachineKind::Starter, 0, row).unwrap();
    }
    let err = build_at(&mut engine, MachineKind::Starter, 1, 0).unwrap_err();
    assert_eq!(err, CommandError::StarterLimit { limit: 10 });
    assert_eq!(err.to_string(), "Maximum amount of Starters (10) already placed in this line");

    // A different line has its own allowance.
    engine.execute(Command::BuyAssemblyLine { line: AssemblyLine::Two }).unwrap_err();
    set_balance(&mut engine, 20_000_000);
    engine.execute(Command::BuyAssemblyLine { line: AssemblyLine::Two }).unwrap();
    build_at(&mut engine, MachineKind::Starter, 17, 0).unwrap();

    let research = engine.catalog().research_id("Max Starters I").unwrap();
    engine.execute(Command::UnlockResearch { research }).unwrap();
    build_at(&mut engine, MachineKind::Starter, 1, 0).unwrap();
}

#[test]
fn teleporters_share_one_limit() {
    let mut engine = rich_engine();
    for row in 0..5 {
        build_at(&mut engine, MachineKind::TeleporterInput, 0, row).unwrap();
        build_at(&mut engine, MachineKind::TeleporterOutput, 1, row).unwrap();
    }
    for kind in [MachineKind::TeleporterInput, MachineKind::TeleporterOutput] {
        let err = build_at(&mut engine, kind, 2, 0).unwrap_err();
        assert_eq!(err, CommandError::TeleporterLimit { limit: 10 });
    }
    assert_eq!(engine.machine_count(), 10);
}

#[test]
fn failed_commands_change_nothing() {
    let mut engine = Engine::default();
    let messages = record_events(&mut engine, EventKind::Message);
    build_at(&mut engine, MachineKind::Seller, 0, 0).unwrap();
    build_at(&mut engine, MachineKind::Seller, 1, 0).unwrap();
    let hash = engine.state_hash();

    let err = build_at(&mut engine, MachineKind::Starter, 0, 0).unwrap_err();
    assert_eq!(err, CommandError::Occupied(Position::tile(0, 0)));
    let err = build_at(&mut engine, MachineKind::Starter, 6, 0).unwrap_err();
    assert_eq!(err, CommandError::InvalidLocation(Position::tile(6, 0)));
    let err = engine
        .execute(Command::UnlockMachine { kind: MachineKind::Crafter })
        .unwrap_err();
    assert_eq!(
        err,
        CommandError::InsufficientFunds {
            needed: 80_000,
            balance: 5_000
        }
    );

    assert_eq!(engine.machine_count(), 2);
    assert_eq!(engine.balance(), 5_000);
    assert_eq!(engine.state_hash(), hash);
    assert_eq!(
        message_texts(&messages),
        vec!["Tile already occupied", "Invalid Location", "Not enough money"]
    );
}

// ===========================================================================
// Tiles and lines
// ===========================================================================

#[test]
fn buying_a_tile_makes_it_buildable() {
    let mut engine = Engine::default();
    let target = Position::tile(6, 0);
    assert!(!engine.grid().is_buildable(target));

    let price = tile_price(engine.grid().unlocked_count());
    assert_eq!(price, 14_600);
    let outcome = engine.execute(Command::BuyTile { position: target }).unwrap();
    assert_eq!(outcome, CommandOutcome::TileBought { price });
    assert_eq!(engine.balance(), 400);
    assert!(engine.grid().is_buildable(target));

    let again = engine.execute(Command::BuyTile { position: target });
    assert_eq!(again, Err(CommandError::TileUnavailable(target)));
}

#[test]
fn walled_tiles_cannot_be_bought() {
    let mut engine = Engine::default();
    set_balance(&mut engine, 1_000_000);
    let walled = Position::tile(23, 0);
    assert_eq!(
        engine.execute(Command::BuyTile { position: walled }),
        Err(CommandError::TileUnavailable(walled))
    );
}

#[test]
fn assembly_lines_unlock_in_order() {
    let mut engine = Engine::default();
    set_balance(&mut engine, 600_000_000);
    assert!(!engine.grid().is_buildable(Position::tile(17, 0)));

    let err = engine
        .execute(Command::BuyAssemblyLine { line: AssemblyLine::Three })
        .unwrap_err();
    assert_eq!(err.to_string(), "Requires Assembly Line 2 first");

    engine.execute(Command::BuyAssemblyLine { line: AssemblyLine::Two }).unwrap();
    assert_eq!(engine.balance(), 590_000_000);
    assert!(engine.grid().is_buildable(Position::tile(17, 0)));
    assert!(!engine.grid().is_buildable(Position::tile(34, 0)));

    engine.execute(Command::BuyAssemblyLine { line: AssemblyLine::Three }).unwrap();
    assert!(engine.grid().is_buildable(Position::tile(34, 0)));
    assert_eq!(
        engine.execute(Command::BuyAssemblyLine { line: AssemblyLine::Three }),
        Err(CommandError::AlreadyUnlocked)
    );
}

// ===========================================================================
// Unlocks and research
// ===========================================================================

#[test]
fn unlocking_a_machine_type() {
    let mut engine = Engine::default();
    assert_eq!(
        build_at(&mut engine, MachineKind::Roller, 0, 0),
        Err(CommandError::MachineLocked(MachineKind::Roller))
    );
    let outcome = engine.execute(Command::UnlockMachine { kind: MachineKind::Roller }).unwrap();
    assert_eq!(outcome, CommandOutcome::Unlocked { cost: 5_000 });
    assert_eq!(engine.balance(), 10_000);
    build_at(&mut engine, MachineKind::Roller, 0, 0).unwrap();
    assert_eq!(
        engine.execute(Command::UnlockMachine { kind: MachineKind::Roller }),
        Err(CommandError::AlreadyUnlocked)
    );
}

#[test]
fn blueprint_must_be_unlocked_before_selection() {
    let mut engine = Engine::default();
    set_balance(&mut engine, 10_000_000);
    engine.execute(Command::UnlockMachine { kind: MachineKind::Crafter }).unwrap();
    let crafter = match build_at(&mut engine, MachineKind::Crafter, 0, 0).unwrap() {
        CommandOutcome::Built(id) => id,
        other => panic!("unexpected {other:?}"),
    };
    let engine_part = resource(&engine, "Engine");
    let select = Command::SetMachineParam {
        machine: crafter,
        param: MachineParam::Blueprint(engine_part),
    };
    assert_eq!(engine.execute(select.clone()), Err(CommandError::BlueprintLocked(engine_part)));

    engine.execute(Command::UnlockBlueprint { resource: engine_part }).unwrap();
    engine.execute(select).unwrap();
    let producer = engine.machine(crafter).unwrap().producer().unwrap();
    assert_eq!(producer.selected, Some(engine_part));
}

#[test]
fn op_cost_research_cheapens_production() {
    let mut engine = Engine::default();
    set_balance(&mut engine, 1_000_000);
    let first = engine.catalog().research_id("Op Cost Reduction I").unwrap();
    let second = engine.catalog().research_id("Op Cost Reduction II").unwrap();

    let err = engine.execute(Command::UnlockResearch { research: second }).unwrap_err();
    assert_eq!(err.to_string(), "Requires Op Cost Reduction I first");

    engine.execute(Command::UnlockResearch { research: first }).unwrap();
    assert_eq!(engine.economy().op_cost_modifier, 60);
    assert_eq!(engine.balance(), 850_000);

    build_at(&mut engine, MachineKind::Starter, 0, 0).unwrap();
    let before = engine.balance();
    run_ticks(&mut engine, 40);
    assert_eq!(before - engine.balance(), engine.economy().scaled_op_cost(5));
    assert!(engine.economy().scaled_op_cost(5) < 5);
}

// ===========================================================================
// Floor plans
// ===========================================================================

#[test]
fn floor_plans_need_research() {
    let mut engine = Engine::default();
    let err = engine
        .execute(Command::SaveFloorPlan {
            slot: 0,
            corner_a: Position::tile(0, 0),
            corner_b: Position::tile(1, 1),
        })
        .unwrap_err();
    assert_eq!(err.to_string(), "Floor plans not unlocked");
}

#[test]
fn saved_plan_rebuilds_with_settings() {
    let mut engine = rich_engine();
    let messages = record_events(&mut engine, EventKind::Message);
    build_at(&mut engine, MachineKind::Starter, 0, 0).unwrap();
    let splitter = match build_at(&mut engine, MachineKind::SplitterTee, 1, 0).unwrap() {
        CommandOutcome::Built(id) => id,
        other => panic!("unexpected {other:?}"),
    };
    engine
        .execute(Command::SetMachineParam {
            machine: splitter,
            param: MachineParam::SplitRatio([3, 0, 1]),
        })
        .unwrap();

    let saved = engine
        .execute(Command::SaveFloorPlan {
            slot: 2,
            corner_a: Position::tile(1, 1),
            corner_b: Position::tile(0, 0),
        })
        .unwrap();
    assert_eq!(saved, CommandOutcome::FloorPlanSaved { machines: 2 });

    let balance = engine.balance();
    let placed = engine
        .execute(Command::PlaceFloorPlan {
            slot: 2,
            origin: Position::tile(3, 5),
        })
        .unwrap();
    let CommandOutcome::FloorPlanPlaced { built } = placed else {
        panic!("unexpected {placed:?}");
    };
    assert_eq!(built.len(), 2);
    assert_eq!(balance - engine.balance(), 1_000 + 10_000);

    let copy = engine.machine_at(Position::tile(4, 5)).unwrap();
    assert_eq!(engine.machine(copy).unwrap().splitter().unwrap().ratio, [3, 0, 1]);
    assert_eq!(
        engine.machine(engine.machine_at(Position::tile(3, 5)).unwrap()).unwrap().kind,
        MachineKind::Starter
    );
    let texts = message_texts(&messages);
    assert!(texts.contains(&"Floor Plan Saved!".to_string()));
    assert!(texts.contains(&"Floor Plan Placed!".to_string()));

    // Overlapping an existing machine rejects the whole placement.
    let err = engine
        .execute(Command::PlaceFloorPlan {
            slot: 2,
            origin: Position::tile(4, 5),
        })
        .unwrap_err();
    assert_eq!(err, CommandError::Occupied(Position::tile(4, 5)));
}

// ===========================================================================
// Reset and snapshots
// ===========================================================================

#[test]
fn reset_returns_to_a_fresh_world() {
    let mut engine = Engine::default();
    build_at(&mut engine, MachineKind::Starter, 0, 0).unwrap();
    run_ticks(&mut engine, 170);
    assert!(engine.material_count() > 0);

    engine.submit(Command::ResetWorld);
    run_ticks(&mut engine, 1);
    assert_eq!(engine.machine_count(), 0);
    assert_eq!(engine.material_count(), 0);
    assert_eq!(engine.balance(), 15_000);
    assert_eq!(engine.tick(), 171);
}

#[test]
fn snapshot_restores_machines_but_not_materials() {
    let mut engine = Engine::default();
    set_balance(&mut engine, 1_000_000);
    let research = engine.catalog().research_id("Max Starters I").unwrap();
    engine.execute(Command::UnlockResearch { research }).unwrap();
    engine.execute(Command::UnlockMachine { kind: MachineKind::Roller }).unwrap();
    build_at(&mut engine, MachineKind::Starter, 0, 0).unwrap();
    for column in 1..=4 {
        build_at(&mut engine, MachineKind::Roller, column, 0).unwrap();
    }
    build_at(&mut engine, MachineKind::Seller, 5, 0).unwrap();

    // The first Copper leaves the Starter at tick 160 and is on the belt.
    run_ticks(&mut engine, 200);
    assert_eq!(engine.material_count(), 1);

    let bytes = engine.save_snapshot().unwrap();
    let mut restored = Engine::default();
    restored.load_snapshot(&bytes).unwrap();

    assert_eq!(restored.tick(), engine.tick());
    assert_eq!(restored.balance(), engine.balance());
    assert_eq!(restored.economy().max_starters_per_line, 15);
    assert_eq!(restored.machine_count(), 6);
    assert_eq!(restored.material_count(), 0);
    let kinds: Vec<_> = restored.machines().map(|(_, m)| (m.kind, m.position)).collect();
    assert_eq!(kinds.first(), Some(&(MachineKind::Starter, Position::tile(0, 0))));
    assert_eq!(kinds.last(), Some(&(MachineKind::Seller, Position::tile(5, 0))));
    assert_eq!(engine.material_count(), 1);

    // The restored line queues afresh at tick 240, spawns at 360 and sells
    // at 485.
    run_ticks(&mut restored, 400);
    let copper = resource(&restored, "Copper");
    assert!(restored.economy().sales.get(&copper).is_some_and(|n| *n > 0));
    assert!(restored.material_count() > 0);
}

// ===========================================================================
// Data files
// ===========================================================================

#[test]
fn engine_from_data_directory() {
    let dir = make_test_dir("engine");
    fs::write(dir.join("config.toml"), "starting_balance = 50000\n").unwrap();
    fs::write(
        dir.join("machines.toml"),
        "[[machines]]\nkind = \"Roller\"\nbuild_cost = 100\n",
    )
    .unwrap();

    let mut engine = load_game_data(&dir).unwrap().into_engine().unwrap();
    assert_eq!(engine.balance(), 50_000);
    assert!(engine.catalog().resource_id("Copper").is_some());

    engine.execute(Command::UnlockMachine { kind: MachineKind::Roller }).unwrap();
    build_at(&mut engine, MachineKind::Roller, 0, 0).unwrap();
    assert_eq!(engine.balance(), 50_000 - 5_000 - 100);
    cleanup(&dir);
}

#[test]
fn empty_data_directory_gives_stock_game() {
    let dir = make_test_dir("stock");
    let engine = load_game_data(&dir).unwrap().into_engine().unwrap();
    let stock = Engine::default();
    assert_eq!(engine.balance(), stock.balance());
    assert_eq!(engine.catalog().resource_count(), stock.catalog().resource_count());
    assert_eq!(engine.catalog().research_count(), stock.catalog().research_count());
    assert_eq!(engine.state_hash(), stock.state_hash());
    cleanup(&dir);
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    /// Each tile costs at least as much as the one before it.
    #[test]
    fn tile_prices_never_fall(unlocked in 288usize..700) {
        prop_assert!(tile_price(unlocked + 1) >= tile_price(unlocked));
        prop_assert_eq!(tile_price(unlocked) % 100, 0);
    }
}
