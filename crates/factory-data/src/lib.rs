//! Data-file loading for the factory engine.
//!
//! Reads engine tuning and catalog content from RON, TOML or JSON files and
//! turns them into a ready [`GameData`].

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, Format, GameData, load_game_data};
