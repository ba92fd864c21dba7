//! Engine tuning knobs.
//!
//! [`SimConfig`] is plain serde data so `factory-data` can read it from RON,
//! TOML, or JSON. Every field has a default matching the stock game, and
//! missing fields in a config file fall back to those defaults.

use crate::fixed::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("analysis period ({period} ticks) is not a whole number of seconds at {tick_ms} ms per tick")]
    UnevenAnalysisPeriod { period: u64, tick_ms: u64 },
    #[error("analysis period ({period} ticks at {tick_ms} ms per tick) overflows a millisecond count")]
    AnalysisPeriodTooLong { period: u64, tick_ms: u64 },
    #[error("starting balance cannot be negative: {0}")]
    NegativeBalance(Money),
}

/// Runtime parameters for an [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Wall-clock length of one tick, in milliseconds.
    pub tick_interval_ms: u64,
    /// Ticks between production passes.
    pub launch_interval: u64,
    /// Ticks between sales reports.
    pub analysis_period_ticks: u64,
    /// Ticks between achievement checks.
    pub achievement_check_interval: u64,
    pub starting_balance: Money,
    /// A notice is emitted once when the balance drops below this.
    pub low_balance_threshold: Money,
    /// Ring-buffer capacity per event kind.
    pub event_capacity: usize,
    /// Executed commands retained for inspection. 0 disables history.
    pub command_history: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 25,
            launch_interval: 40,
            analysis_period_ticks: 400,
            achievement_check_interval: 10,
            starting_balance: 15_000,
            low_balance_threshold: 100,
            event_capacity: 1024,
            command_history: 0,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("tick_interval_ms", self.tick_interval_ms),
            ("launch_interval", self.launch_interval),
            ("analysis_period_ticks", self.analysis_period_ticks),
            ("achievement_check_interval", self.achievement_check_interval),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }
        let period_ms = self
            .analysis_period_ticks
            .checked_mul(self.tick_interval_ms)
            .ok_or(ConfigError::AnalysisPeriodTooLong {
                period: self.analysis_period_ticks,
                tick_ms: self.tick_interval_ms,
            })?;
        if period_ms % 1000 != 0 {
            return Err(ConfigError::UnevenAnalysisPeriod {
                period: self.analysis_period_ticks,
                tick_ms: self.tick_interval_ms,
            });
        }
        if self.starting_balance < 0 {
            return Err(ConfigError::NegativeBalance(self.starting_balance));
        }
        Ok(())
    }

    /// Length of one analysis period in whole seconds.
    pub fn analysis_period_secs(&self) -> u64 {
        self.analysis_period_ticks.saturating_mul(self.tick_interval_ms) / 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.analysis_period_secs(), 10);
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let config = SimConfig {
            launch_interval: 0,
            ..SimConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Zero {
                field: "launch_interval"
            })
        );
    }

    #[test]
    fn analysis_period_must_be_whole_seconds() {
        let config = SimConfig {
            analysis_period_ticks: 30,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnevenAnalysisPeriod { .. })
        ));
    }

    #[test]
    fn overflowing_analysis_period_is_rejected() {
        let config = SimConfig {
            analysis_period_ticks: u64::MAX,
            tick_interval_ms: 1000,
            ..SimConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::AnalysisPeriodTooLong {
                period: u64::MAX,
                tick_ms: 1000
            })
        );
        assert_eq!(config.analysis_period_secs(), u64::MAX / 1000);
    }

    #[test]
    fn negative_starting_balance_is_rejected() {
        let config = SimConfig {
            starting_balance: -1,
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NegativeBalance(-1)));
    }
}
