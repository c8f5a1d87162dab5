// 🧩 Consolidator - Merge broker and agency tables against the gazetteer
// One record per matched city, grand totals derived, sorted descending

use crate::gazetteer::{Gazetteer, Municipality};
use crate::matching::FuzzyMatcher;
use crate::normalize::NormalizedSourceRow;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// CONSOLIDATED RECORD
// ============================================================================

/// One city's merged metrics across both source categories.
/// `grand_total` is purely derived: always brokers_total + agencies_total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedCityRecord {
    /// Canonical gazetteer display name
    pub city: String,

    pub latitude: f64,
    pub longitude: f64,

    pub brokers_total: i64,
    pub brokers_compliant: i64,
    pub brokers_noncompliant: i64,

    pub agencies_total: i64,
    pub agencies_compliant: i64,
    pub agencies_noncompliant: i64,

    pub grand_total: i64,
}

impl ConsolidatedCityRecord {
    fn new(municipality: &Municipality) -> Self {
        ConsolidatedCityRecord {
            city: municipality.name.clone(),
            latitude: municipality.latitude,
            longitude: municipality.longitude,
            brokers_total: 0,
            brokers_compliant: 0,
            brokers_noncompliant: 0,
            agencies_total: 0,
            agencies_compliant: 0,
            agencies_noncompliant: 0,
            grand_total: 0,
        }
    }
}

// ============================================================================
// CONSOLIDATION REPORT
// ============================================================================

/// Output of one consolidation run: the merged records plus the cities
/// that could not be reconciled, so the caller can surface data-quality
/// warnings.
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidationReport {
    /// One record per matched city, sorted descending by grand total
    pub records: Vec<ConsolidatedCityRecord>,

    /// Normalized broker city names that matched no municipality
    pub unmatched_brokers: Vec<String>,

    /// Normalized agency city names that matched no municipality
    pub unmatched_agencies: Vec<String>,

    pub consolidated_at: DateTime<Utc>,
}

impl ConsolidationReport {
    pub fn grand_total(&self) -> i64 {
        self.records.iter().map(|r| r.grand_total).sum()
    }

    pub fn unmatched_count(&self) -> usize {
        self.unmatched_brokers.len() + self.unmatched_agencies.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} cities consolidated, {} professionals total, {} unmatched source rows",
            self.records.len(),
            self.grand_total(),
            self.unmatched_count()
        )
    }
}

// ============================================================================
// CONSOLIDATOR
// ============================================================================

pub struct Consolidator {
    matcher: FuzzyMatcher,
}

impl Consolidator {
    pub fn new() -> Self {
        Consolidator {
            matcher: FuzzyMatcher::new(),
        }
    }

    pub fn with_matcher(matcher: FuzzyMatcher) -> Self {
        Consolidator { matcher }
    }

    /// Merge the two normalized tables against the gazetteer.
    ///
    /// Brokers are folded in first, then agencies update the existing
    /// record in place or insert a fresh one. Unmatched rows are dropped
    /// and reported, never an error. The merge is keyed by canonical city
    /// name; records keep insertion order until the final stable sort by
    /// grand total, so equal totals retain their relative order.
    pub fn consolidate(
        &self,
        gazetteer: &Gazetteer,
        brokers: &[NormalizedSourceRow],
        agencies: &[NormalizedSourceRow],
    ) -> ConsolidationReport {
        let candidates = gazetteer.candidate_names();

        let mut records: Vec<ConsolidatedCityRecord> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut unmatched_brokers = Vec::new();
        let mut unmatched_agencies = Vec::new();

        for row in brokers {
            let Some(record) = self.resolve(
                gazetteer,
                &candidates,
                row,
                &mut records,
                &mut index,
                &mut unmatched_brokers,
            ) else {
                continue;
            };

            record.brokers_total += row.quantity;
            record.brokers_compliant += row.compliant;
            record.brokers_noncompliant += row.noncompliant;
        }

        for row in agencies {
            let Some(record) = self.resolve(
                gazetteer,
                &candidates,
                row,
                &mut records,
                &mut index,
                &mut unmatched_agencies,
            ) else {
                continue;
            };

            record.agencies_total += row.quantity;
            record.agencies_compliant += row.compliant;
            record.agencies_noncompliant += row.noncompliant;
        }

        for record in &mut records {
            record.grand_total = record.brokers_total + record.agencies_total;
        }

        // Stable sort: ties keep insertion order
        records.sort_by(|a, b| b.grand_total.cmp(&a.grand_total));

        if !unmatched_brokers.is_empty() || !unmatched_agencies.is_empty() {
            warn!(
                "{} broker and {} agency rows could not be matched to a municipality",
                unmatched_brokers.len(),
                unmatched_agencies.len()
            );
        }

        let report = ConsolidationReport {
            records,
            unmatched_brokers,
            unmatched_agencies,
            consolidated_at: Utc::now(),
        };

        info!("{}", report.summary());

        report
    }

    /// Match a source row to its municipality and return the record to
    /// accumulate into, inserting a zeroed record on first sight.
    fn resolve<'a>(
        &self,
        gazetteer: &Gazetteer,
        candidates: &[String],
        row: &NormalizedSourceRow,
        records: &'a mut Vec<ConsolidatedCityRecord>,
        index: &mut HashMap<String, usize>,
        unmatched: &mut Vec<String>,
    ) -> Option<&'a mut ConsolidatedCityRecord> {
        let matched = match self.matcher.best_match(&row.normalized_city, candidates) {
            Some(name) => name,
            None => {
                unmatched.push(row.normalized_city.clone());
                return None;
            }
        };

        // Candidates come from the gazetteer, so the lookup cannot miss
        let municipality = gazetteer.get(matched)?;

        let position = match index.get(&municipality.name) {
            Some(&position) => position,
            None => {
                records.push(ConsolidatedCityRecord::new(municipality));
                index.insert(municipality.name.clone(), records.len() - 1);
                records.len() - 1
            }
        };

        records.get_mut(position)
    }
}

impl Default for Consolidator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
