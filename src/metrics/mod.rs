//! Metric rows as read from the monitor's CSV files, and typed views over them.

pub mod cpu;
pub mod io;
pub mod memory;

pub use cpu::CpuPoint;
pub use io::IoPoint;
pub use memory::MemoryPoint;

use chrono::{DateTime, Local, TimeZone};
use clap::ValueEnum;
use std::collections::HashMap;
use thiserror::Error;

/// Column holding the sample time as `seconds.nanoseconds`
pub const TIMESTAMP: &str = "timestamp";

/// One CSV line, keyed by header name
pub type MetricRow = HashMap<String, String>;

/// Why a row could not be converted into a typed point
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("missing field '{0}'")]
    MissingField(String),
    #[error("invalid number '{value}' in column '{column}'")]
    InvalidNumber { column: String, value: String },
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// Conversion from a raw row into a typed sample
pub trait FromRow: Sized {
    fn from_row(row: &MetricRow) -> Result<Self, RowError>;
}

/// All rows of one metrics file, in file order
#[derive(Debug, Clone, Default)]
pub struct MetricsSeries {
    headers: Vec<String>,
    rows: Vec<MetricRow>,
}

impl MetricsSeries {
    pub fn new(headers: Vec<String>, rows: Vec<MetricRow>) -> Self {
        Self { headers, rows }
    }

    /// Build a series from rows alone, taking the header from the first row
    #[cfg(test)]
    pub fn from_rows(rows: Vec<MetricRow>) -> Self {
        let mut headers: Vec<String> = rows
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();
        headers.sort();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[MetricRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Columns `family` needs that the header doesn't have
    pub fn missing_columns(&self, family: MetricFamily) -> Vec<&'static str> {
        family
            .required_columns()
            .iter()
            .copied()
            .filter(|col| !self.headers.iter().any(|h| h == col))
            .collect()
    }

    /// Convert every row into `T`, skipping (and reporting) rows that don't convert
    pub fn points<T: FromRow>(&self) -> Vec<T> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(idx, row)| match T::from_row(row) {
                Ok(point) => Some(point),
                Err(e) => {
                    eprintln!("Warning: Skipping invalid row {}: {}", idx + 1, e);
                    None
                }
            })
            .collect()
    }

    /// Numeric values of a single column. Rows where the column is absent
    /// or not a number are left out; other columns are not looked at.
    pub fn column_values(&self, column: &str) -> Vec<f64> {
        self.rows
            .iter()
            .filter_map(|row| match parse_number(row, column) {
                Ok(v) => Some(v),
                Err(e) => {
                    log::debug!("ignoring value in column {}: {}", column, e);
                    None
                }
            })
            .collect()
    }
}

/// Metric family, one per monitor output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricFamily {
    Cpu,
    Memory,
    Io,
}

impl MetricFamily {
    /// CLI flag naming the input file (also used as the output file suffix)
    pub fn flag(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Io => "io",
        }
    }

    /// Human readable name used in messages
    pub fn label(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Memory => "memory",
            Self::Io => "I/O",
        }
    }

    /// Columns a row needs to become a point of this family
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Self::Cpu => &[TIMESTAMP, cpu::CPU_PERCENT],
            Self::Memory => &[TIMESTAMP, memory::RSS_KB, memory::VSZ_KB],
            Self::Io => &[TIMESTAMP, io::READ_RATE, io::WRITE_RATE],
        }
    }
}

/// Plot selector given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlotType {
    Cpu,
    Memory,
    Io,
    All,
}

impl PlotType {
    pub fn families(self) -> Vec<MetricFamily> {
        match self {
            Self::Cpu => vec![MetricFamily::Cpu],
            Self::Memory => vec![MetricFamily::Memory],
            Self::Io => vec![MetricFamily::Io],
            Self::All => vec![MetricFamily::Cpu, MetricFamily::Memory, MetricFamily::Io],
        }
    }
}

pub fn field<'a>(row: &'a MetricRow, column: &str) -> Result<&'a str, RowError> {
    row.get(column)
        .map(String::as_str)
        .ok_or_else(|| RowError::MissingField(column.to_string()))
}

/// Parse a finite float out of `column`. Empty cells are invalid, not missing.
pub fn parse_number(row: &MetricRow, column: &str) -> Result<f64, RowError> {
    let raw = field(row, column)?;
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RowError::InvalidNumber {
            column: column.to_string(),
            value: raw.to_string(),
        })
}

/// Parse the row's timestamp. Only the whole seconds are kept.
pub fn parse_timestamp(row: &MetricRow) -> Result<DateTime<Local>, RowError> {
    let raw = field(row, TIMESTAMP)?;
    let invalid = || RowError::InvalidTimestamp(raw.to_string());

    let secs_part = raw.trim().split('.').next().unwrap_or_default();
    let secs: i64 = secs_part.parse().map_err(|_| invalid())?;
    Local.timestamp_opt(secs, 0).single().ok_or_else(invalid)
}

pub fn kb_to_mb(kb: f64) -> f64 {
    kb / 1024.0
}

pub fn bytes_to_kb(bytes: f64) -> f64 {
    bytes / 1024.0
}

#[cfg(test)]
pub(crate) fn row(pairs: &[(&str, &str)]) -> MetricRow {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        let r = row(&[("cpu_percent", " 12.5 "), ("empty", ""), ("word", "abc"), ("nan", "NaN")]);
        assert_eq!(parse_number(&r, "cpu_percent"), Ok(12.5));
        assert!(matches!(parse_number(&r, "empty"), Err(RowError::InvalidNumber { .. })));
        assert!(matches!(parse_number(&r, "word"), Err(RowError::InvalidNumber { .. })));
        assert!(matches!(parse_number(&r, "nan"), Err(RowError::InvalidNumber { .. })));
        assert_eq!(
            parse_number(&r, "rss_kb"),
            Err(RowError::MissingField("rss_kb".to_string()))
        );
    }

    #[test]
    fn test_parse_timestamp_drops_fraction() {
        let r = row(&[("timestamp", "1700000000.987654321")]);
        let ts = parse_timestamp(&r).unwrap();
        assert_eq!(ts.timestamp(), 1700000000);

        let r = row(&[("timestamp", "1700000000")]);
        assert_eq!(parse_timestamp(&r).unwrap().timestamp(), 1700000000);
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        let r = row(&[("timestamp", "yesterday")]);
        assert_eq!(
            parse_timestamp(&r),
            Err(RowError::InvalidTimestamp("yesterday".to_string()))
        );
        assert_eq!(
            parse_timestamp(&MetricRow::new()),
            Err(RowError::MissingField("timestamp".to_string()))
        );
    }

    #[test]
    fn test_unit_conversions() {
        assert_eq!(kb_to_mb(2048.0), 2.0);
        assert_eq!(bytes_to_kb(1024.0), 1.0);
    }

    #[test]
    fn test_column_values_filters_per_column() {
        let series = MetricsSeries::from_rows(vec![
            row(&[("rss_kb", "1024"), ("vsz_kb", "4096")]),
            row(&[("vsz_kb", "4096")]),
            row(&[("rss_kb", "bogus")]),
            row(&[("rss_kb", "3072")]),
        ]);
        assert_eq!(series.column_values("rss_kb"), vec![1024.0, 3072.0]);
        assert_eq!(series.column_values("vsz_kb"), vec![4096.0, 4096.0]);
    }

    #[test]
    fn test_points_skips_bad_rows() {
        let series = MetricsSeries::from_rows(vec![
            row(&[("timestamp", "100.5"), ("cpu_percent", "10")]),
            row(&[("timestamp", "101.5"), ("cpu_percent", "n/a")]),
            row(&[("timestamp", "102.5")]),
            row(&[("timestamp", "103.5"), ("cpu_percent", "30")]),
        ]);
        let points: Vec<CpuPoint> = series.points();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].cpu_percent, 10.0);
        assert_eq!(points[1].cpu_percent, 30.0);
    }

    #[test]
    fn test_plot_type_families() {
        assert_eq!(PlotType::Memory.families(), vec![MetricFamily::Memory]);
        assert_eq!(PlotType::All.families().len(), 3);
        assert_eq!(MetricFamily::Io.flag(), "io");
        assert_eq!(MetricFamily::Io.label(), "I/O");
        assert!(MetricFamily::Memory.required_columns().contains(&"vsz_kb"));
    }

    #[test]
    fn test_missing_columns() {
        let series = MetricsSeries::new(
            vec!["timestamp".to_string(), "rss_kb".to_string()],
            Vec::new(),
        );
        assert_eq!(series.missing_columns(MetricFamily::Memory), vec!["vsz_kb"]);
        assert_eq!(
            series.missing_columns(MetricFamily::Io),
            vec!["read_rate", "write_rate"]
        );
        assert!(series.missing_columns(MetricFamily::Cpu).contains(&"cpu_percent"));
    }
}
