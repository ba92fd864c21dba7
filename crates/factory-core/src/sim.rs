//! Simulation clock and state hashing.
//!
//! The engine always runs whole ticks. A host either calls `Engine::step()`
//! at its own fixed rate, or feeds elapsed wall-clock time to
//! `Engine::advance()`, which accumulates milliseconds and runs as many
//! ticks as fit, carrying the remainder forward.

use crate::fixed::Ticks;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Mutable clock state tracked by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimState {
    /// Ticks run since the world was created or last reset.
    pub tick: Ticks,

    /// Wall-clock milliseconds not yet consumed by a whole tick.
    pub accumulator_ms: u64,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `elapsed_ms` to the accumulator and return how many ticks of
    /// `tick_ms` are now due. The remainder stays in the accumulator.
    pub fn accumulate(&mut self, elapsed_ms: u64, tick_ms: u64) -> u64 {
        if tick_ms == 0 {
            return 0;
        }
        self.accumulator_ms = self.accumulator_ms.saturating_add(elapsed_ms);
        let due = self.accumulator_ms / tick_ms;
        self.accumulator_ms %= tick_ms;
        due
    }
}

// ---------------------------------------------------------------------------
// Advance result
// ---------------------------------------------------------------------------

/// Result of an `Engine::advance()` or `Engine::step()` call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AdvanceResult {
    /// Number of ticks actually executed.
    pub steps_run: u64,
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// Deterministic hash of world state for replay and desync checks.
///
/// FNV-1a (64-bit). Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write(&[v as u8]);
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
