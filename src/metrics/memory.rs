//! Memory samples (`timestamp`, `rss_kb`, `vsz_kb`).

use super::{kb_to_mb, parse_number, parse_timestamp, FromRow, MetricRow, RowError};
use chrono::{DateTime, Local};

pub const RSS_KB: &str = "rss_kb";
pub const VSZ_KB: &str = "vsz_kb";

/// Resident and virtual size in MB
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryPoint {
    pub time: DateTime<Local>,
    pub rss_mb: f64,
    pub vsz_mb: f64,
}

impl FromRow for MemoryPoint {
    fn from_row(row: &MetricRow) -> Result<Self, RowError> {
        Ok(Self {
            time: parse_timestamp(row)?,
            rss_mb: kb_to_mb(parse_number(row, RSS_KB)?),
            vsz_mb: kb_to_mb(parse_number(row, VSZ_KB)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::row;

    #[test]
    fn test_from_row_converts_to_mb() {
        let r = row(&[
            ("timestamp", "1700000000.25"),
            ("rss_kb", "2048"),
            ("vsz_kb", "10240"),
        ]);
        let point = MemoryPoint::from_row(&r).unwrap();
        assert_eq!(point.rss_mb, 2.0);
        assert_eq!(point.vsz_mb, 10.0);
    }

    #[test]
    fn test_from_row_needs_both_sizes() {
        let r = row(&[("timestamp", "1700000000.25"), ("rss_kb", "2048")]);
        assert_eq!(
            MemoryPoint::from_row(&r),
            Err(RowError::MissingField("vsz_kb".to_string()))
        );
    }
}
