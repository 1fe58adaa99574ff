//! CSV export of the consumption log.
//!
//! Flat archival export for spreadsheets and other tooling; the JSON entry
//! store remains the source of truth.

use crate::{DoseEvent, Result};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    drink: String,
    caffeine_mg: f64,
    timestamp: String,
    icon: String,
}

impl From<&DoseEvent> for CsvRow {
    fn from(entry: &DoseEvent) -> Self {
        CsvRow {
            id: entry.id.to_string(),
            drink: entry.drink.clone(),
            caffeine_mg: entry.caffeine_mg,
            timestamp: entry.timestamp.to_rfc3339(),
            icon: entry.icon.clone(),
        }
    }
}

/// Write the full entry log to a CSV file (with headers), newest first.
///
/// Returns the number of rows written. The file is synced to disk before
/// returning.
pub fn export_entries_csv(entries: &[DoseEvent], out_path: &Path) -> Result<usize> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut sorted: Vec<&DoseEvent> = entries.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let file = std::fs::File::create(out_path)?;
    let mut writer = csv::Writer::from_writer(&file);

    for entry in &sorted {
        writer.serialize(CsvRow::from(*entry))?;
    }
    writer.flush()?;
    drop(writer);
    file.sync_all()?;

    tracing::info!("Exported {} entries to {:?}", sorted.len(), out_path);
    Ok(sorted.len())
}
