//! Summary statistics over loaded metrics files.

use crate::loader;
use crate::metrics::cpu::CPU_PERCENT;
use crate::metrics::io::{READ_RATE, WRITE_RATE};
use crate::metrics::memory::RSS_KB;
use crate::metrics::{bytes_to_kb, kb_to_mb, MetricsSeries};
use num_format::{Locale, ToFormattedString};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Average, minimum and maximum of one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stats {
    pub samples: usize,
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            samples: values.len(),
            average: values.iter().sum::<f64>() / values.len() as f64,
            min: values.iter().cloned().fold(f64::INFINITY, f64::min),
            max: values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// Read and write rates in KB/s
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IoStats {
    pub read: Stats,
    pub write: Stats,
}

/// Per-family statistics; a family is absent when it had no usable values
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<Stats>,
    /// RSS in MB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<Stats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io: Option<IoStats>,
}

/// Compute statistics for whichever series are given
pub fn summarize(
    cpu: Option<&MetricsSeries>,
    memory: Option<&MetricsSeries>,
    io: Option<&MetricsSeries>,
) -> SummaryReport {
    let cpu_stats = cpu.and_then(|s| Stats::from_values(&s.column_values(CPU_PERCENT)));

    let memory_stats = memory.and_then(|s| {
        let rss: Vec<f64> = s.column_values(RSS_KB).into_iter().map(kb_to_mb).collect();
        Stats::from_values(&rss)
    });

    let io_stats = io.and_then(|s| {
        let kb = |column: &str| -> Vec<f64> {
            s.column_values(column).into_iter().map(bytes_to_kb).collect()
        };
        let read = Stats::from_values(&kb(READ_RATE))?;
        let write = Stats::from_values(&kb(WRITE_RATE))?;
        Some(IoStats { read, write })
    });

    SummaryReport {
        cpu: cpu_stats,
        memory: memory_stats,
        io: io_stats,
    }
}

fn samples(n: usize) -> String {
    n.to_formatted_string(&Locale::en)
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f)?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "RESOURCE MONITORING SUMMARY REPORT")?;
        writeln!(f, "{}", rule)?;
        writeln!(f)?;

        if let Some(cpu) = &self.cpu {
            writeln!(f, "CPU Metrics:")?;
            writeln!(f, "  Samples: {}", samples(cpu.samples))?;
            writeln!(f, "  Average CPU: {:.2}%", cpu.average)?;
            writeln!(f, "  Peak CPU: {:.2}%", cpu.max)?;
            writeln!(f, "  Min CPU: {:.2}%", cpu.min)?;
            writeln!(f)?;
        }

        if let Some(mem) = &self.memory {
            writeln!(f, "Memory Metrics:")?;
            writeln!(f, "  Samples: {}", samples(mem.samples))?;
            writeln!(f, "  Average RSS: {:.2} MB", mem.average)?;
            writeln!(f, "  Peak RSS: {:.2} MB", mem.max)?;
            writeln!(f, "  Min RSS: {:.2} MB", mem.min)?;
            writeln!(f)?;
        }

        if let Some(io) = &self.io {
            writeln!(f, "I/O Metrics:")?;
            writeln!(f, "  Samples: {}", samples(io.read.samples.max(io.write.samples)))?;
            writeln!(f, "  Average Read Rate: {:.2} KB/s", io.read.average)?;
            writeln!(f, "  Average Write Rate: {:.2} KB/s", io.write.average)?;
            writeln!(f, "  Peak Read Rate: {:.2} KB/s", io.read.max)?;
            writeln!(f, "  Peak Write Rate: {:.2} KB/s", io.write.max)?;
            writeln!(f, "  Min Read Rate: {:.2} KB/s", io.read.min)?;
            writeln!(f, "  Min Write Rate: {:.2} KB/s", io.write.min)?;
            writeln!(f)?;
        }

        writeln!(f, "{}", rule)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Load the given files and print their summary. Unreadable files are
/// reported and left out of the report.
pub fn generate_summary_report(
    cpu: Option<&Path>,
    memory: Option<&Path>,
    io: Option<&Path>,
    format: ReportFormat,
) {
    let cpu = cpu.and_then(loader::load_series);
    let memory = memory.and_then(loader::load_series);
    let io = io.and_then(loader::load_series);

    let report = summarize(cpu.as_ref(), memory.as_ref(), io.as_ref());

    match format {
        ReportFormat::Text => println!("{}", report),
        ReportFormat::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error: failed to encode summary: {}", e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_series_from;

    fn series(csv: &str) -> MetricsSeries {
        read_series_from(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_cpu_average() {
        let cpu = series(
            "timestamp,pid,cpu_percent\n\
             1700000000.0,1,10.00\n\
             1700000001.0,1,20.00\n\
             1700000002.0,1,30.00\n",
        );
        let report = summarize(Some(&cpu), None, None);
        let stats = report.cpu.unwrap();
        assert_eq!(stats.samples, 3);
        assert!((stats.average - 20.0).abs() < 1e-9);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 30.0);

        let text = report.to_string();
        assert!(text.contains("Average CPU: 20.00%"));
        assert!(text.contains("Peak CPU: 30.00%"));
        assert!(text.contains("Min CPU: 10.00%"));
        assert!(!text.contains("Memory Metrics"));
    }

    #[test]
    fn test_memory_skips_row_without_rss() {
        let mem = series(
            "timestamp,rss_kb,vsz_kb\n\
             1700000000.0,2048,8192\n\
             1700000001.0,,8192\n\
             1700000002.0\n\
             1700000003.0,6144,8192\n",
        );
        let stats = summarize(None, Some(&mem), None).memory.unwrap();
        assert_eq!(stats.samples, 2);
        assert!((stats.average - 4.0).abs() < 1e-9);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 6.0);
    }

    #[test]
    fn test_io_rates_in_kb() {
        let io = series(
            "pid,read_rate,write_rate,timestamp\n\
             1,1024.00,0.00,1700000000.0\n\
             1,3072.00,2048.00,1700000001.0\n",
        );
        let report = summarize(None, None, Some(&io));
        let stats = report.io.unwrap();
        assert_eq!(stats.read.min, 1.0);
        assert_eq!(stats.read.average, 2.0);
        assert_eq!(stats.write.max, 2.0);

        let text = report.to_string();
        assert!(text.contains("Average Read Rate: 2.00 KB/s"));
        assert!(text.contains("Peak Write Rate: 2.00 KB/s"));
    }

    #[test]
    fn test_io_needs_both_directions() {
        let io = series("timestamp,read_rate\n1700000000.0,1024\n");
        assert!(summarize(None, None, Some(&io)).io.is_none());
    }

    #[test]
    fn test_header_only_gives_empty_report() {
        let cpu = series("timestamp,cpu_percent\n");
        let report = summarize(Some(&cpu), None, None);
        assert_eq!(report, SummaryReport::default());

        let text = report.to_string();
        assert!(text.contains("RESOURCE MONITORING SUMMARY REPORT"));
        assert!(!text.contains("CPU Metrics"));
    }

    #[test]
    fn test_json_leaves_out_missing_families() {
        let mem = series("timestamp,rss_kb,vsz_kb\n1700000000.0,2048,4096\n");
        let report = summarize(None, Some(&mem), None);
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["memory"]["average"], 2.0);
        assert_eq!(json["memory"]["samples"], 1);
        assert!(json.get("cpu").is_none());
        assert!(json.get("io").is_none());
    }

    #[test]
    fn test_sample_count_formatting() {
        assert_eq!(samples(1234567), "1,234,567");
        assert_eq!(Stats::from_values(&[]), None);
    }
}
