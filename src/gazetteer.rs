// 🗺️ Gazetteer Loader - Canonical municipality list with coordinates
// Loads the national municipality dump and filters it down to one state

use crate::error::{PipelineError, PipelineResult};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// IBGE code for the state of Bahia
pub const REGION_CODE_BAHIA: u32 = 29;

// ============================================================================
// MUNICIPALITY
// ============================================================================

/// One municipality from the gazetteer file.
/// Immutable once loaded; extra JSON fields are ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Municipality {
    #[serde(rename = "nome")]
    pub name: String,

    pub latitude: f64,

    pub longitude: f64,

    #[serde(rename = "codigo_uf")]
    pub region_code: u32,

    /// Uppercase, trimmed display name. Computed after deserialization.
    #[serde(skip)]
    pub normalized_name: String,
}

/// Uppercase + trim, the normalization applied to every city name before
/// matching. Both gazetteer names and source city names go through this.
pub fn normalize_city_name(name: &str) -> String {
    name.trim().to_uppercase()
}

// ============================================================================
// GAZETTEER
// ============================================================================

/// Lookup table of municipalities for one region, keyed by normalized name.
/// Backed by a BTreeMap so iteration order is deterministic across calls.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    municipalities: BTreeMap<String, Municipality>,
    region_code: u32,
}

impl Gazetteer {
    /// Build a gazetteer from already-parsed records, keeping only rows
    /// whose region code matches. Duplicate normalized names keep the
    /// first occurrence.
    pub fn from_records(records: Vec<Municipality>, region_code: u32) -> Self {
        let mut municipalities = BTreeMap::new();

        for mut record in records {
            if record.region_code != region_code {
                continue;
            }

            record.normalized_name = normalize_city_name(&record.name);

            if municipalities.contains_key(&record.normalized_name) {
                warn!(
                    "duplicate municipality name '{}' in gazetteer, keeping first",
                    record.normalized_name
                );
                continue;
            }

            municipalities.insert(record.normalized_name.clone(), record);
        }

        Gazetteer {
            municipalities,
            region_code,
        }
    }

    pub fn region_code(&self) -> u32 {
        self.region_code
    }

    pub fn len(&self) -> usize {
        self.municipalities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.municipalities.is_empty()
    }

    /// Look up a municipality by its normalized name.
    pub fn get(&self, normalized_name: &str) -> Option<&Municipality> {
        self.municipalities.get(normalized_name)
    }

    /// All normalized names, in deterministic (sorted) order.
    /// This is the candidate list handed to the fuzzy matcher.
    pub fn candidate_names(&self) -> Vec<String> {
        self.municipalities.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Municipality> {
        self.municipalities.values()
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Parse gazetteer JSON text into municipality records.
/// The IBGE dump ships as UTF-8 with a BOM; strip it before parsing.
pub fn parse_gazetteer(text: &str, path: &Path) -> PipelineResult<Vec<Municipality>> {
    let text = text.trim_start_matches('\u{feff}');

    serde_json::from_str(text).map_err(|e| PipelineError::parse(path, e.to_string()))
}

/// Load the gazetteer file and filter it to one region.
///
/// Deterministic: the same input file yields the same gazetteer on every
/// call, so results are safe to cache (see `cache::CachedGazetteerLoader`).
pub fn load_gazetteer(path: &Path, region_code: u32) -> PipelineResult<Gazetteer> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PipelineError::not_found(path)
        } else {
            PipelineError::parse(path, e.to_string())
        }
    })?;

    let records = parse_gazetteer(&text, path)?;
    let gazetteer = Gazetteer::from_records(records, region_code);

    info!(
        "loaded {} municipalities for region {} from {}",
        gazetteer.len(),
        region_code,
        path.display()
    );

    Ok(gazetteer)
}

// ============================================================================
// TESTS
// ============================================================================
