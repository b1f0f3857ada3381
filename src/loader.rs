//! Loading metrics CSV files written by the resource monitor.

use crate::metrics::{MetricRow, MetricsSeries};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Load a metrics file, printing the cause and returning `None` on failure
pub fn load_series<P: AsRef<Path>>(path: P) -> Option<MetricsSeries> {
    let path = path.as_ref();
    match read_series(path) {
        Ok(series) => {
            log::debug!(
                "loaded {} rows ({} columns) from {}",
                series.len(),
                series.headers().len(),
                path.display()
            );
            Some(series)
        }
        Err(e) => {
            eprintln!("Error reading {}: {:#}", path.display(), e);
            None
        }
    }
}

/// Read a metrics CSV file with a header row
pub fn read_series<P: AsRef<Path>>(path: P) -> Result<MetricsSeries> {
    let file = File::open(path.as_ref())
        .with_context(|| format!("Failed to open metrics file: {}", path.as_ref().display()))?;
    read_series_from(file)
}

/// Read metrics CSV from any reader. Short rows are kept; the missing
/// trailing columns are just absent from the row.
pub fn read_series_from<R: Read>(input: R) -> Result<MetricsSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read CSV row {}", row_no + 1))?;
        let row: MetricRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(row);
    }

    Ok(MetricsSeries::new(headers, rows))
}
