// 📤 CSV export of consolidated records for the data-table / download surface

use crate::consolidate::ConsolidatedCityRecord;
use anyhow::{Context, Result};
use log::info;
use std::io::Write;
use std::path::Path;

/// Serialize consolidated records as CSV into any writer.
pub fn write_consolidated_csv<W: Write>(
    writer: W,
    records: &[ConsolidatedCityRecord],
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for record in records {
        csv_writer
            .serialize(record)
            .with_context(|| format!("failed to serialize record for {}", record.city))?;
    }

    csv_writer.flush().context("failed to flush CSV output")?;

    Ok(())
}

/// Write consolidated records to a CSV file.
pub fn export_consolidated_csv(path: &Path, records: &[ConsolidatedCityRecord]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    write_consolidated_csv(file, records)?;

    info!("exported {} records to {}", records.len(), path.display());

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(city: &str, brokers: i64, agencies: i64) -> ConsolidatedCityRecord {
        ConsolidatedCityRecord {
            city: city.to_string(),
            latitude: -12.97,
            longitude: -38.5,
            brokers_total: brokers,
            brokers_compliant: brokers,
            brokers_noncompliant: 0,
            agencies_total: agencies,
            agencies_compliant: agencies,
            agencies_noncompliant: 0,
            grand_total: brokers + agencies,
        }
    }

    #[test]
    fn test_csv_has_header_and_rows() {
        let records = vec![record("Salvador", 10, 4), record("Ilhéus", 3, 0)];

        let mut buffer = Vec::new();
        write_consolidated_csv(&mut buffer, &records).unwrap();
        let csv = String::from_utf8(buffer).unwrap();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("city,latitude,longitude"));
        assert!(lines[1].starts_with("Salvador,"));
        assert!(lines[1].ends_with(",14"));
    }

    #[test]
    fn test_empty_records_yield_empty_output() {
        let mut buffer = Vec::new();
        write_consolidated_csv(&mut buffer, &[]).unwrap();

        // No rows serialized means no header either
        assert!(buffer.is_empty());
    }
}
