// 📊 Summary statistics - Aggregate KPIs over the consolidated records
// Pure computation; the presentation layer renders these numbers

use crate::consolidate::ConsolidatedCityRecord;
use serde::Serialize;

// ============================================================================
// SUMMARY STATS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub city_count: usize,

    pub brokers_total: i64,
    pub brokers_compliant: i64,
    pub brokers_noncompliant: i64,

    pub agencies_total: i64,
    pub agencies_compliant: i64,
    pub agencies_noncompliant: i64,

    pub grand_total: i64,

    /// Mean professionals per city, 0 when there are no cities
    pub mean_per_city: f64,
}

impl SummaryStats {
    pub fn from_records(records: &[ConsolidatedCityRecord]) -> Self {
        let brokers_total = records.iter().map(|r| r.brokers_total).sum();
        let brokers_compliant = records.iter().map(|r| r.brokers_compliant).sum();
        let brokers_noncompliant = records.iter().map(|r| r.brokers_noncompliant).sum();
        let agencies_total = records.iter().map(|r| r.agencies_total).sum();
        let agencies_compliant = records.iter().map(|r| r.agencies_compliant).sum();
        let agencies_noncompliant = records.iter().map(|r| r.agencies_noncompliant).sum();
        let grand_total: i64 = records.iter().map(|r| r.grand_total).sum();

        let mean_per_city = if records.is_empty() {
            0.0
        } else {
            grand_total as f64 / records.len() as f64
        };

        SummaryStats {
            city_count: records.len(),
            brokers_total,
            brokers_compliant,
            brokers_noncompliant,
            agencies_total,
            agencies_compliant,
            agencies_noncompliant,
            grand_total,
            mean_per_city,
        }
    }

    /// Fraction of brokers in good standing, None when there are no brokers
    pub fn brokers_compliant_share(&self) -> Option<f64> {
        let counted = self.brokers_compliant + self.brokers_noncompliant;
        if counted == 0 {
            None
        } else {
            Some(self.brokers_compliant as f64 / counted as f64)
        }
    }

    /// Fraction of agencies in good standing, None when there are no agencies
    pub fn agencies_compliant_share(&self) -> Option<f64> {
        let counted = self.agencies_compliant + self.agencies_noncompliant;
        if counted == 0 {
            None
        } else {
            Some(self.agencies_compliant as f64 / counted as f64)
        }
    }
}

// ============================================================================
// FILTERS AND SLICES
// ============================================================================

/// The dashboard's minimum-count filters as a pure function.
pub fn filter_by_minimums(
    records: &[ConsolidatedCityRecord],
    min_brokers: i64,
    min_agencies: i64,
) -> Vec<ConsolidatedCityRecord> {
    records
        .iter()
        .filter(|r| r.brokers_total >= min_brokers && r.agencies_total >= min_agencies)
        .cloned()
        .collect()
}

/// Top N cities by grand total. Records are already sorted descending,
/// so this is a prefix slice.
pub fn top_cities(records: &[ConsolidatedCityRecord], n: usize) -> &[ConsolidatedCityRecord] {
    &records[..n.min(records.len())]
}

// ============================================================================
// TESTS
// ============================================================================
