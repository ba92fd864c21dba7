//! Player economy: balance, research modifiers, unlock sets, and prices.
//!
//! The economy never rejects a charge on its own. Operating costs are debited
//! unconditionally during the tick and may drive the balance negative;
//! commands and production check [`Economy::can_afford`] first.

use crate::achievement::Achievement;
use crate::catalog::{Catalog, MachineKind, OpTimeGroup, ResearchEffect, ResourceClass};
use crate::fixed::{Money, scale_cost};
use crate::grid::{AssemblyLine, STARTING_TILES};
use crate::id::{ResearchId, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Full operating cost, in percent.
pub const BASE_OP_COST_PERCENT: u32 = 100;
pub const DEFAULT_MAX_STARTERS: u32 = 10;
pub const DEFAULT_MAX_TELEPORTERS: u32 = 10;

/// Price of an assembly line, or `None` for the line every world starts with.
pub fn line_price(line: AssemblyLine) -> Option<Money> {
    match line {
        AssemblyLine::One => None,
        AssemblyLine::Two => Some(10_000_000),
        AssemblyLine::Three => Some(500_000_000),
    }
}

/// Line that must be owned before `line` can be bought.
pub fn line_prerequisite(line: AssemblyLine) -> Option<AssemblyLine> {
    match line {
        AssemblyLine::Three => Some(AssemblyLine::Two),
        _ => None,
    }
}

/// Price of the next tile, given how many are already unlocked. Exponential
/// in the number of purchased tiles, rounded to the nearest hundred.
pub fn tile_price(unlocked_tiles: usize) -> Money {
    let bought = unlocked_tiles as f64 - STARTING_TILES as f64;
    let price = 14_620.0 * (0.0244 * bought).exp();
    ((price / 100.0).round() * 100.0) as Money
}

/// Compact money text: `950`, `14.6 K`, `10 M`, `1.5 B`.
pub fn short_money(amount: Money) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let n = amount.unsigned_abs();
    for (div, suffix) in [(1_000_000_000u64, "B"), (1_000_000, "M"), (1_000, "K")] {
        if n >= div {
            let tenths = (n.saturating_mul(10) + div / 2) / div;
            let (whole, frac) = (tenths / 10, tenths % 10);
            return if frac == 0 {
                format!("{sign}{whole} {suffix}")
            } else {
                format!("{sign}{whole}.{frac} {suffix}")
            };
        }
    }
    format!("{sign}{n}")
}

/// Balance, modifiers, and everything the player has unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Economy {
    pub balance: Money,
    /// Percentage applied to every operating cost.
    pub op_cost_modifier: u32,
    pub op_time_modifier_starter_crafter: u32,
    pub op_time_modifier_tier2: u32,
    pub max_starters_per_line: u32,
    pub max_teleporters_total: u32,
    pub starter_max_spawn_quantity: u8,
    pub floor_plans_unlocked: bool,
    pub unlocked_machines: BTreeSet<MachineKind>,
    pub unlocked_blueprints: BTreeSet<ResourceId>,
    pub unlocked_research: BTreeSet<ResearchId>,
    pub unlocked_lines: BTreeSet<AssemblyLine>,
    pub achievements: BTreeSet<Achievement>,
    /// Units sold per resource in the current analysis period.
    #[serde(skip)]
    pub sales: BTreeMap<ResourceId, u32>,
    #[serde(skip)]
    low_balance_warned: bool,
}

impl Economy {
    /// A fresh economy: Starter and Seller available, every non-Tier-2
    /// blueprint plus Circuit unlocked, line one owned.
    pub fn new(starting_balance: Money, catalog: &Catalog) -> Self {
        let unlocked_blueprints = catalog
            .resources()
            .filter(|(_, r)| r.class != ResourceClass::Tier2 || r.unlock_cost == 0)
            .map(|(id, _)| id)
            .collect();
        Self {
            balance: starting_balance,
            op_cost_modifier: BASE_OP_COST_PERCENT,
            op_time_modifier_starter_crafter: 0,
            op_time_modifier_tier2: 0,
            max_starters_per_line: DEFAULT_MAX_STARTERS,
            max_teleporters_total: DEFAULT_MAX_TELEPORTERS,
            starter_max_spawn_quantity: 1,
            floor_plans_unlocked: false,
            unlocked_machines: BTreeSet::from([MachineKind::Starter, MachineKind::Seller]),
            unlocked_blueprints,
            unlocked_research: BTreeSet::new(),
            unlocked_lines: BTreeSet::from([AssemblyLine::One]),
            achievements: BTreeSet::new(),
            sales: BTreeMap::new(),
            low_balance_warned: false,
        }
    }

    pub fn can_afford(&self, amount: Money) -> bool {
        self.balance >= amount
    }

    /// Unconditional debit.
    pub fn charge(&mut self, amount: Money) {
        self.balance = self.balance.saturating_sub(amount);
    }

    pub fn credit(&mut self, amount: Money) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// An operating cost after research reductions.
    pub fn scaled_op_cost(&self, base: Money) -> Money {
        scale_cost(base, self.op_cost_modifier)
    }

    /// Launch passes to subtract from a producer's op time.
    pub fn op_time_modifier(&self, group: OpTimeGroup) -> u32 {
        match group {
            OpTimeGroup::StarterCrafter => self.op_time_modifier_starter_crafter,
            OpTimeGroup::Tier2 => self.op_time_modifier_tier2,
        }
    }

    pub fn apply_research(&mut self, effect: ResearchEffect) {
        match effect {
            ResearchEffect::FloorPlans => self.floor_plans_unlocked = true,
            ResearchEffect::OpCostReduction(points) => {
                self.op_cost_modifier = self.op_cost_modifier.saturating_sub(points);
            }
            ResearchEffect::StarterCrafterOpTime(n) => self.op_time_modifier_starter_crafter += n,
            ResearchEffect::Tier2OpTime(n) => self.op_time_modifier_tier2 += n,
            ResearchEffect::MaxStarters(n) => self.max_starters_per_line += n,
            ResearchEffect::MaxTeleporters(n) => self.max_teleporters_total += n,
            ResearchEffect::StarterSpawnQuantity(n) => {
                self.starter_max_spawn_quantity = self.starter_max_spawn_quantity.saturating_add(n);
            }
        }
    }

    pub fn record_sale(&mut self, resource: ResourceId, quantity: u32) {
        *self.sales.entry(resource).or_insert(0) += quantity;
    }

    /// Hand over the period's counters and start a new period.
    pub fn take_sales(&mut self) -> BTreeMap<ResourceId, u32> {
        std::mem::take(&mut self.sales)
    }

    /// True exactly once each time the balance falls below `threshold`.
    pub fn check_low_balance(&mut self, threshold: Money) -> bool {
        if self.balance >= threshold {
            self.low_balance_warned = false;
            return false;
        }
        if self.low_balance_warned {
            return false;
        }
        self.low_balance_warned = true;
        true
    }

    pub fn has_all_lines(&self) -> bool {
        AssemblyLine::ALL.iter().all(|l| self.unlocked_lines.contains(l))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn economy() -> Economy {
        Economy::new(15_000, &Catalog::standard())
    }

    #[test]
    fn fresh_economy_defaults() {
        let catalog = Catalog::standard();
        let e = Economy::new(15_000, &catalog);
        assert_eq!(e.balance, 15_000);
        assert_eq!(e.op_cost_modifier, 100);
        assert_eq!(e.max_starters_per_line, 10);
        assert_eq!(e.max_teleporters_total, 10);
        assert_eq!(e.starter_max_spawn_quantity, 1);
        assert!(e.unlocked_machines.contains(&MachineKind::Starter));
        assert!(e.unlocked_machines.contains(&MachineKind::Seller));
        assert!(!e.unlocked_machines.contains(&MachineKind::Roller));
        assert!(e.unlocked_lines.contains(&AssemblyLine::One));
    }

    #[test]
    fn starting_blueprints() {
        let catalog = Catalog::standard();
        let e = Economy::new(0, &catalog);
        for name in ["Copper", "Gold Wire", "Iron Gear", "Molten Aluminum", "Crystal Plate", "Circuit"] {
            let id = catalog.resource_id(name).unwrap();
            assert!(e.unlocked_blueprints.contains(&id), "{name} should start unlocked");
        }
        let engine = catalog.resource_id("Engine").unwrap();
        assert!(!e.unlocked_blueprints.contains(&engine));
    }

    #[test]
    fn op_cost_research_steps() {
        let mut e = economy();
        assert_eq!(e.scaled_op_cost(5), 5);
        e.apply_research(ResearchEffect::OpCostReduction(40));
        assert_eq!(e.op_cost_modifier, 60);
        assert_eq!(e.scaled_op_cost(5), 3);
        e.apply_research(ResearchEffect::OpCostReduction(40));
        assert_eq!(e.op_cost_modifier, 20);
        assert_eq!(e.scaled_op_cost(5), 1);
        assert_eq!(e.scaled_op_cost(2), 1);
    }

    #[test]
    fn research_effects_accumulate() {
        let mut e = economy();
        e.apply_research(ResearchEffect::MaxStarters(5));
        e.apply_research(ResearchEffect::MaxTeleporters(5));
        e.apply_research(ResearchEffect::StarterCrafterOpTime(1));
        e.apply_research(ResearchEffect::Tier2OpTime(1));
        e.apply_research(ResearchEffect::StarterSpawnQuantity(1));
        e.apply_research(ResearchEffect::FloorPlans);
        assert_eq!(e.max_starters_per_line, 15);
        assert_eq!(e.max_teleporters_total, 15);
        assert_eq!(e.op_time_modifier(OpTimeGroup::StarterCrafter), 1);
        assert_eq!(e.op_time_modifier(OpTimeGroup::Tier2), 1);
        assert_eq!(e.starter_max_spawn_quantity, 2);
        assert!(e.floor_plans_unlocked);
    }

    #[test]
    fn tile_price_curve() {
        assert_eq!(tile_price(288), 14_600);
        assert_eq!(tile_price(289), 15_000);
        assert!(tile_price(400) > tile_price(300));
        assert_eq!(tile_price(350) % 100, 0);
    }

    #[test]
    fn line_prices() {
        assert_eq!(line_price(AssemblyLine::One), None);
        assert_eq!(line_price(AssemblyLine::Two), Some(10_000_000));
        assert_eq!(line_price(AssemblyLine::Three), Some(500_000_000));
        assert_eq!(line_prerequisite(AssemblyLine::Three), Some(AssemblyLine::Two));
    }

    #[test]
    fn low_balance_warning_is_edge_triggered() {
        let mut e = economy();
        assert!(!e.check_low_balance(100));
        e.balance = 50;
        assert!(e.check_low_balance(100));
        assert!(!e.check_low_balance(100));
        e.balance = 200;
        assert!(!e.check_low_balance(100));
        e.balance = 10;
        assert!(e.check_low_balance(100));
    }

    #[test]
    fn sales_counters_reset_on_take() {
        let mut e = economy();
        e.record_sale(ResourceId(0), 2);
        e.record_sale(ResourceId(0), 1);
        let taken = e.take_sales();
        assert_eq!(taken.get(&ResourceId(0)), Some(&3));
        assert!(e.sales.is_empty());
    }

    #[test]
    fn charges_may_go_negative() {
        let mut e = economy();
        e.charge(20_000);
        assert_eq!(e.balance, -5_000);
        assert!(!e.can_afford(1));
    }

    #[test]
    fn short_money_formatting() {
        assert_eq!(short_money(950), "950");
        assert_eq!(short_money(14_600), "14.6 K");
        assert_eq!(short_money(10_000_000), "10 M");
        assert_eq!(short_money(1_500_000_000), "1.5 B");
        assert_eq!(short_money(-2_000), "-2 K");
    }
}
