//! Factory Core -- the tick engine for a grid-based factory game.
//!
//! Materials travel one pixel per tick across a 50x16 tile grid and interact
//! with machines only when they sit exactly on a tile center. Producers spawn
//! and craft resources, rollers and splitters steer them, robotic arms carry
//! them between tiles, teleporters jump them across the map, and sellers turn
//! them into money.
//!
//! # Tick Pipeline
//!
//! Each call to [`engine::Engine::step`] advances the world by one tick:
//!
//! 1. **Commands** -- Drain commands queued with `submit`.
//! 2. **Snapshot** -- Increment the tick and copy the machine and material id lists.
//! 3. **Admin** -- Sales analysis and achievement checks on their intervals.
//! 4. **Production** -- On launch ticks, producers spawn and queue blueprints.
//! 5. **Movement** -- Free materials move one pixel.
//! 6. **Arms** -- Arms in motion advance one frame of their swing.
//! 7. **Interactions** -- Materials on tile centers hit machines or fall off.
//! 8. **Bookkeeping** -- Low-balance notice, queued reset, state hash, event delivery.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- World owner and pipeline orchestrator.
//! - [`grid::Grid`] -- Tiles, lock and wall flags, assembly-line membership.
//! - [`catalog::Catalog`] -- Immutable machine, resource and research data.
//! - [`machine::Machine`] -- A placed machine and its per-kind state.
//! - [`material::Material`] -- A stack of one to three units on the move.
//! - [`command::Command`] -- Every player action, validated and applied atomically.
//! - [`event::EventBus`] -- Buffered notifications for the UI.
//! - [`serialize`] -- Versioned snapshots via bitcode.

pub mod achievement;
pub mod catalog;
pub mod command;
pub mod config;
pub mod economy;
pub mod engine;
pub mod event;
pub mod fixed;
pub mod floor_plan;
pub mod grid;
pub mod group;
pub mod id;
pub mod kinematics;
pub mod machine;
pub mod material;
pub mod serialize;
pub mod sim;
pub mod stats;
pub mod teleport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
