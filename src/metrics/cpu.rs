//! CPU samples (`timestamp`, `cpu_percent`).

use super::{parse_number, parse_timestamp, FromRow, MetricRow, RowError};
use chrono::{DateTime, Local};

pub const CPU_PERCENT: &str = "cpu_percent";

/// Process CPU usage at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct CpuPoint {
    pub time: DateTime<Local>,
    /// May exceed 100 for multi-threaded processes
    pub cpu_percent: f64,
}

impl FromRow for CpuPoint {
    fn from_row(row: &MetricRow) -> Result<Self, RowError> {
        Ok(Self {
            time: parse_timestamp(row)?,
            cpu_percent: parse_number(row, CPU_PERCENT)?,
        })
    }
}
