//! Periodic sales analysis.
//!
//! Sellers bump a per-resource counter; once per analysis period the engine
//! turns the counters into a [`SalesReport`] and clears them. Rates use
//! [`Fixed64`] so reports are identical across platforms.

use crate::catalog::Catalog;
use crate::fixed::{Fixed64, Money, per_second};
use crate::id::ResourceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One resource's line in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesEntry {
    pub resource: ResourceId,
    pub count: u32,
    pub profit: Money,
    pub profit_per_sec: Fixed64,
    pub items_per_sec: Fixed64,
}

/// Summary of one analysis period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReport {
    pub period_secs: u64,
    /// Ordered by resource id.
    pub entries: Vec<SalesEntry>,
    pub total_profit: Money,
    pub total_items: u64,
}

impl SalesReport {
    pub fn from_counts(counts: &BTreeMap<ResourceId, u32>, catalog: &Catalog, period_secs: u64) -> Self {
        let mut report = SalesReport {
            period_secs,
            ..SalesReport::default()
        };
        for (&resource, &count) in counts {
            let value = catalog.resource(resource).map_or(0, |r| r.value);
            let profit = value.saturating_mul(count as Money);
            report.entries.push(SalesEntry {
                resource,
                count,
                profit,
                profit_per_sec: per_second(profit, period_secs),
                items_per_sec: per_second(count as i64, period_secs),
            });
            report.total_profit = report.total_profit.saturating_add(profit);
            report.total_items += count as u64;
        }
        report
    }

    pub fn profit_per_sec(&self) -> Fixed64 {
        per_second(self.total_profit, self.period_secs)
    }

    pub fn items_per_sec(&self) -> Fixed64 {
        per_second(self.total_items as i64, self.period_secs)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64;

    #[test]
    fn report_totals_and_rates() {
        let catalog = Catalog::standard();
        let copper = catalog.resource_id("Copper").unwrap();
        let circuit = catalog.resource_id("Circuit").unwrap();
        let counts = BTreeMap::from([(copper, 10), (circuit, 2)]);

        let report = SalesReport::from_counts(&counts, &catalog, 10);
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.entries[0].resource, copper);
        assert_eq!(report.entries[0].profit, 800);
        assert_eq!(report.entries[0].items_per_sec, f64_to_fixed64(1.0));
        assert_eq!(report.entries[1].profit, 700);
        assert_eq!(report.total_profit, 1_500);
        assert_eq!(report.total_items, 12);
        assert_eq!(report.profit_per_sec(), f64_to_fixed64(150.0));
    }

    #[test]
    fn empty_period_reports_zero() {
        let catalog = Catalog::standard();
        let report = SalesReport::from_counts(&BTreeMap::new(), &catalog, 10);
        assert!(report.is_empty());
        assert_eq!(report.items_per_sec(), Fixed64::ZERO);
    }
}
