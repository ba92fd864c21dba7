//! Achievement rules.
//!
//! Checks are pure: [`newly_unlocked`] looks at the current sales counters,
//! the latest [`SalesReport`], and what the player already owns, and returns
//! the achievements that should unlock now. The engine records them and
//! emits events.

use crate::catalog::Catalog;
use crate::fixed::Fixed64;
use crate::grid::AssemblyLine;
use crate::id::{ResearchId, ResourceId};
use crate::stats::SalesReport;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Profit-per-second thresholds for Profit I, II, III.
pub const PROFIT_TIERS: [i64; 3] = [1_000_000, 10_000_000, 100_000_000];

/// Items-per-second thresholds for Scale I, II, III.
pub const SCALE_TIERS: [i64; 3] = [1, 5, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Achievement {
    /// At least one unit of this resource was sold.
    Sold(ResourceId),
    /// Tier 1 to 3.
    Profit(u8),
    /// Tier 1 to 3.
    Scale(u8),
    SellEveryItem,
    MaxAssemblyLines,
    UnlockAllResearch,
}

impl Achievement {
    pub fn title(&self, catalog: &Catalog) -> String {
        match self {
            Achievement::Sold(resource) => format!("Sold {}", catalog.resource_name(*resource)),
            Achievement::Profit(tier) => format!("Profit {}", roman(*tier)),
            Achievement::Scale(tier) => format!("Scale {}", roman(*tier)),
            Achievement::SellEveryItem => "Sell Every Item".to_string(),
            Achievement::MaxAssemblyLines => "Max Assembly Lines".to_string(),
            Achievement::UnlockAllResearch => "Unlock All Research".to_string(),
        }
    }

    /// Number of achievements a catalog offers: one per resource plus the
    /// fixed set.
    pub fn total(catalog: &Catalog) -> usize {
        catalog.resource_count() + PROFIT_TIERS.len() + SCALE_TIERS.len() + 3
    }
}

fn roman(tier: u8) -> &'static str {
    match tier {
        1 => "I",
        2 => "II",
        3 => "III",
        _ => "?",
    }
}

/// Everything an achievement check reads.
pub struct AchievementInputs<'a> {
    pub catalog: &'a Catalog,
    /// Sales counters for the period in progress.
    pub sales: &'a BTreeMap<ResourceId, u32>,
    pub last_report: Option<&'a SalesReport>,
    pub unlocked_lines: &'a BTreeSet<AssemblyLine>,
    pub unlocked_research: &'a BTreeSet<ResearchId>,
    pub owned: &'a BTreeSet<Achievement>,
}

/// Achievements earned but not yet owned, in check order.
pub fn newly_unlocked(inputs: &AchievementInputs<'_>) -> Vec<Achievement> {
    let mut earned: Vec<Achievement> = Vec::new();
    let grant = |a: Achievement, earned: &mut Vec<Achievement>| {
        if !inputs.owned.contains(&a) && !earned.contains(&a) {
            earned.push(a);
        }
    };

    // The last report covers sales made just before the counters were reset.
    let reported = inputs
        .last_report
        .into_iter()
        .flat_map(|r| r.entries.iter().map(|e| (e.resource, e.count)));
    for (resource, count) in inputs.sales.iter().map(|(&r, &n)| (r, n)).chain(reported) {
        if count > 0 {
            grant(Achievement::Sold(resource), &mut earned);
        }
    }

    let (profit_rate, item_rate) = inputs
        .last_report
        .map(|r| (r.profit_per_sec(), r.items_per_sec()))
        .unwrap_or((Fixed64::ZERO, Fixed64::ZERO));
    for (i, threshold) in PROFIT_TIERS.iter().enumerate() {
        if profit_rate >= Fixed64::saturating_from_num(*threshold) {
            grant(Achievement::Profit(i as u8 + 1), &mut earned);
        }
    }
    for (i, threshold) in SCALE_TIERS.iter().enumerate() {
        if item_rate >= Fixed64::saturating_from_num(*threshold) {
            grant(Achievement::Scale(i as u8 + 1), &mut earned);
        }
    }

    let sold_everything = inputs.catalog.resources().all(|(id, _)| {
        inputs.owned.contains(&Achievement::Sold(id)) || earned.contains(&Achievement::Sold(id))
    });
    if sold_everything && inputs.catalog.resource_count() > 0 {
        grant(Achievement::SellEveryItem, &mut earned);
    }

    if [AssemblyLine::Two, AssemblyLine::Three]
        .iter()
        .all(|line| inputs.unlocked_lines.contains(line))
    {
        grant(Achievement::MaxAssemblyLines, &mut earned);
    }

    if inputs.catalog.research_count() > 0
        && inputs
            .catalog
            .research_entries()
            .all(|(id, _)| inputs.unlocked_research.contains(&id))
    {
        grant(Achievement::UnlockAllResearch, &mut earned);
    }

    earned
}
