//! I/O samples (`timestamp`, `read_rate`, `write_rate`), rates in bytes/s.

use super::{bytes_to_kb, parse_number, parse_timestamp, FromRow, MetricRow, RowError};
use chrono::{DateTime, Local};

pub const READ_RATE: &str = "read_rate";
pub const WRITE_RATE: &str = "write_rate";

/// Read and write throughput in KB/s
#[derive(Debug, Clone, PartialEq)]
pub struct IoPoint {
    pub time: DateTime<Local>,
    pub read_kbps: f64,
    pub write_kbps: f64,
}

impl FromRow for IoPoint {
    fn from_row(row: &MetricRow) -> Result<Self, RowError> {
        Ok(Self {
            time: parse_timestamp(row)?,
            read_kbps: bytes_to_kb(parse_number(row, READ_RATE)?),
            write_kbps: bytes_to_kb(parse_number(row, WRITE_RATE)?),
        })
    }
}
