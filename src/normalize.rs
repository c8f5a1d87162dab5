// 🧹 Source Table Normalizer - Raw spreadsheet rows → canonical table
// Header cleanup, region filter, numeric coercion, duplicate aggregation

use crate::error::{PipelineError, PipelineResult};
use crate::gazetteer::normalize_city_name;
use log::warn;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

// Column names after header normalization. Sources arrive with
// inconsistent formatting ("Cidade:", " UF ", ...), so everything is
// trimmed, stripped of a trailing colon and uppercased first.
pub const COLUMN_CITY: &str = "CIDADE";
pub const COLUMN_REGION: &str = "UF";
pub const COLUMN_QUANTITY: &str = "QUANTIDADE";
pub const COLUMN_COMPLIANT: &str = "REGULAR";
pub const COLUMN_NONCOMPLIANT: &str = "IRREGULAR";

/// One raw row as produced by the spreadsheet API client or the local
/// CSV reader: a mapping of column name to cell value. Extra columns are
/// carried along and ignored downstream.
pub type RawRow = HashMap<String, Value>;

// ============================================================================
// NORMALIZED ROW
// ============================================================================

/// A source row after normalization and aggregation.
/// `normalized_city` values are unique within one normalized table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedSourceRow {
    pub normalized_city: String,
    pub quantity: i64,
    pub compliant: i64,
    pub noncompliant: i64,
}

// ============================================================================
// REGION FILTER
// ============================================================================

/// Accepted spellings for the target region's identifying column:
/// the canonical two-letter code plus the common full-name alias.
#[derive(Debug, Clone)]
pub struct RegionFilter {
    pub code: String,
    pub name: String,
}

impl RegionFilter {
    pub fn bahia() -> Self {
        RegionFilter {
            code: "BA".to_string(),
            name: "BAHIA".to_string(),
        }
    }

    pub fn accepts(&self, raw: &str) -> bool {
        let value = raw.trim().to_uppercase();
        value == self.code || value == self.name
    }
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Trim, strip a trailing colon, uppercase. Applied to every header so
/// "Cidade:" and " CIDADE " both resolve to "CIDADE".
pub fn normalize_header(raw: &str) -> String {
    raw.trim().trim_end_matches(':').to_uppercase()
}

/// Coerce a cell to a non-negative count. Missing and non-numeric values
/// become 0; floats are truncated. Never fails the row.
fn coerce_count(value: Option<&Value>) -> i64 {
    let coerced = match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        Some(_) => 0,
    };

    coerced.max(0)
}

/// Cell value as text, for the identifying columns.
fn cell_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Normalize one raw source table into the canonical shape.
///
/// Steps: header normalization, required-column check (fails with
/// `PipelineError::Schema` when CIDADE or UF is absent), region filter,
/// city normalization, numeric coercion and duplicate aggregation by sum.
/// Output order is the sorted grouping-key order, stable for a given input.
pub fn normalize(
    raw_rows: &[RawRow],
    region: &RegionFilter,
    source_label: &str,
) -> PipelineResult<Vec<NormalizedSourceRow>> {
    if raw_rows.is_empty() {
        return Ok(Vec::new());
    }

    // Rewrite every row's keys through header normalization once.
    let rows: Vec<HashMap<String, &Value>> = raw_rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|(key, value)| (normalize_header(key), value))
                .collect()
        })
        .collect();

    // Required identifying columns, checked against the first row's headers.
    let missing: Vec<String> = [COLUMN_CITY, COLUMN_REGION]
        .iter()
        .filter(|col| !rows[0].contains_key(**col))
        .map(|col| col.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(PipelineError::schema(source_label, missing));
    }

    let mut aggregated: BTreeMap<String, NormalizedSourceRow> = BTreeMap::new();
    let mut skipped_blank = 0usize;

    for row in &rows {
        if !region.accepts(&cell_text(row.get(COLUMN_REGION).copied())) {
            continue;
        }

        let normalized_city = normalize_city_name(&cell_text(row.get(COLUMN_CITY).copied()));
        if normalized_city.is_empty() {
            skipped_blank += 1;
            continue;
        }

        let quantity = coerce_count(row.get(COLUMN_QUANTITY).copied());
        let compliant = coerce_count(row.get(COLUMN_COMPLIANT).copied());
        let noncompliant = coerce_count(row.get(COLUMN_NONCOMPLIANT).copied());

        let entry = aggregated
            .entry(normalized_city.clone())
            .or_insert_with(|| NormalizedSourceRow {
                normalized_city,
                quantity: 0,
                compliant: 0,
                noncompliant: 0,
            });

        entry.quantity += quantity;
        entry.compliant += compliant;
        entry.noncompliant += noncompliant;
    }

    if skipped_blank > 0 {
        warn!("{}: skipped {} rows with blank city", source_label, skipped_blank);
    }

    Ok(aggregated.into_values().collect())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_row(pairs: &[(&str, Value)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn broker_row(city: &str, uf: &str, quantity: Value) -> RawRow {
        raw_row(&[
            ("CIDADE", json!(city)),
            ("UF", json!(uf)),
            ("QUANTIDADE", quantity),
            ("REGULAR", json!(1)),
            ("IRREGULAR", json!(0)),
        ])
    }

    #[test]
    fn test_header_normalization() {
        assert_eq!(normalize_header(" Cidade: "), "CIDADE");
        assert_eq!(normalize_header("uf"), "UF");
        assert_eq!(normalize_header("QUANTIDADE"), "QUANTIDADE");
    }

    #[test]
    fn test_messy_headers_are_accepted() {
        let rows = vec![raw_row(&[
            (" Cidade: ", json!("Salvador")),
            ("uf", json!("BA")),
            ("Quantidade:", json!(10)),
        ])];

        let result = normalize(&rows, &RegionFilter::bahia(), "Corretores").unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].normalized_city, "SALVADOR");
        assert_eq!(result[0].quantity, 10);
    }

    #[test]
    fn test_missing_required_column_is_schema_error() {
        let rows = vec![raw_row(&[("CIDADE", json!("Salvador"))])];

        let err = normalize(&rows, &RegionFilter::bahia(), "Corretores").unwrap_err();

        match err {
            PipelineError::Schema { source, missing } => {
                assert_eq!(source, "Corretores");
                assert_eq!(missing, vec!["UF".to_string()]);
            }
            other => panic!("expected Schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_region_filter_accepts_code_and_alias() {
        let rows = vec![
            broker_row("Salvador", "BA", json!(1)),
            broker_row("Ilhéus", "bahia", json!(2)),
            broker_row("São Paulo", "SP", json!(3)),
        ];

        let result = normalize(&rows, &RegionFilter::bahia(), "Corretores").unwrap();

        let cities: Vec<&str> = result.iter().map(|r| r.normalized_city.as_str()).collect();
        assert_eq!(cities, vec!["ILHÉUS", "SALVADOR"]);
    }

    #[test]
    fn test_numeric_coercion_never_fails() {
        let rows = vec![
            broker_row("Salvador", "BA", json!("12")),
            broker_row("Ilhéus", "BA", json!("not a number")),
            broker_row("Itabuna", "BA", Value::Null),
            broker_row("Jequié", "BA", json!(7.9)),
        ];

        let result = normalize(&rows, &RegionFilter::bahia(), "Corretores").unwrap();

        let by_city: HashMap<&str, i64> = result
            .iter()
            .map(|r| (r.normalized_city.as_str(), r.quantity))
            .collect();

        assert_eq!(by_city["SALVADOR"], 12);
        assert_eq!(by_city["ILHÉUS"], 0);
        assert_eq!(by_city["ITABUNA"], 0);
        assert_eq!(by_city["JEQUIÉ"], 7);
    }

    #[test]
    fn test_missing_numeric_column_defaults_to_zero() {
        let rows = vec![raw_row(&[
            ("CIDADE", json!("Salvador")),
            ("UF", json!("BA")),
        ])];

        let result = normalize(&rows, &RegionFilter::bahia(), "Corretores").unwrap();

        assert_eq!(result[0].quantity, 0);
        assert_eq!(result[0].compliant, 0);
        assert_eq!(result[0].noncompliant, 0);
    }

    #[test]
    fn test_duplicates_are_aggregated_by_sum() {
        let rows = vec![
            broker_row("Salvador", "BA", json!(10)),
            broker_row(" salvador ", "BA", json!(5)),
        ];

        let result = normalize(&rows, &RegionFilter::bahia(), "Corretores").unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].normalized_city, "SALVADOR");
        assert_eq!(result[0].quantity, 15);
        assert_eq!(result[0].compliant, 2);
    }

    #[test]
    fn test_city_uniqueness_after_aggregation() {
        let rows = vec![
            broker_row("Salvador", "BA", json!(1)),
            broker_row("Salvador", "BA", json!(1)),
            broker_row("Ilhéus", "BA", json!(1)),
        ];

        let result = normalize(&rows, &RegionFilter::bahia(), "Corretores").unwrap();

        let mut cities: Vec<&str> = result.iter().map(|r| r.normalized_city.as_str()).collect();
        cities.dedup();
        assert_eq!(cities.len(), result.len());
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let result = normalize(&[], &RegionFilter::bahia(), "Corretores").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_blank_city_rows_are_skipped() {
        let rows = vec![
            broker_row("", "BA", json!(3)),
            broker_row("Salvador", "BA", json!(1)),
        ];

        let result = normalize(&rows, &RegionFilter::bahia(), "Corretores").unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].normalized_city, "SALVADOR");
    }

    #[test]
    fn test_output_order_is_stable() {
        let rows = vec![
            broker_row("Jequié", "BA", json!(1)),
            broker_row("Salvador", "BA", json!(1)),
            broker_row("Ilhéus", "BA", json!(1)),
        ];

        let first = normalize(&rows, &RegionFilter::bahia(), "Corretores").unwrap();
        let second = normalize(&rows, &RegionFilter::bahia(), "Corretores").unwrap();

        assert_eq!(first, second);
    }
}
