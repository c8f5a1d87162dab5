// 📂 Source loading - Local spreadsheet fallback for the two raw tables
// Remote-or-local origin is invisible downstream: both produce row-mappings

use crate::error::{PipelineError, PipelineResult};
use crate::normalize::{normalize, NormalizedSourceRow, RawRow, RegionFilter};
use log::{info, warn};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

/// Read a CSV export of one source sheet into raw row-mappings.
/// Every cell stays a string; numeric coercion happens in the normalizer.
pub fn read_spreadsheet<R: Read>(reader: R, path: &Path) -> PipelineResult<Vec<RawRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| PipelineError::parse(path, e.to_string()))?
        .clone();

    let mut rows = Vec::new();

    for result in csv_reader.records() {
        let record = result.map_err(|e| PipelineError::parse(path, e.to_string()))?;

        let mut row = RawRow::new();
        for (position, header) in headers.iter().enumerate() {
            let field = record.get(position).unwrap_or("");
            row.insert(header.to_string(), Value::String(field.to_string()));
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Load one local spreadsheet file.
/// Missing file is `NotFound`, malformed content is `Parse`.
pub fn load_spreadsheet(path: &Path) -> PipelineResult<Vec<RawRow>> {
    if !path.exists() {
        return Err(PipelineError::not_found(path));
    }

    let file = std::fs::File::open(path)
        .map_err(|e| PipelineError::parse(path, e.to_string()))?;

    let rows = read_spreadsheet(file, path)?;

    info!("loaded {} rows from {}", rows.len(), path.display());

    Ok(rows)
}

/// Load and normalize one source, degrading structural failures to an
/// empty table with a logged reason. A broken source never crashes the
/// run; the caller decides whether the run as a whole has enough data.
pub fn load_table_or_empty(
    path: &Path,
    region: &RegionFilter,
    source_label: &str,
) -> Vec<NormalizedSourceRow> {
    let raw_rows = match load_spreadsheet(path) {
        Ok(rows) => rows,
        Err(e) => {
            warn!("{}: treating as empty ({})", source_label, e);
            return Vec::new();
        }
    };

    match normalize(&raw_rows, region, source_label) {
        Ok(rows) => rows,
        Err(e) => {
            warn!("{}: treating as empty ({})", source_label, e);
            Vec::new()
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
