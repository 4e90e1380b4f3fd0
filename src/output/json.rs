//! JSON output formatting
//!
//! Serializes a [`RunReport`] for scripts and CI jobs. Durations carry both a
//! machine value and the human form used in log lines.

use crate::coordinator::{RunReport, TargetReport};
use crate::target::Network;
use crate::util::time::format_duration;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Duration;

/// Duration with both microseconds and human-readable format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonDuration {
    pub micros: u64,
    pub human: String,
}

impl JsonDuration {
    pub fn from_duration(d: Duration) -> Self {
        Self {
            micros: d.as_micros() as u64,
            human: format_duration(d),
        }
    }
}

/// One target in the JSON report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonTarget {
    pub descriptor: String,
    pub network: Network,
    pub address: String,
    pub status: String,
    pub connected: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&TargetReport> for JsonTarget {
    fn from(target: &TargetReport) -> Self {
        Self {
            descriptor: target.descriptor.clone(),
            network: target.network,
            address: target.address.clone(),
            status: target.status.as_str().to_string(),
            connected: target.connected,
            error: target.error.clone(),
        }
    }
}

/// Top-level JSON report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    /// RFC 3339 start time
    pub started_at: String,
    pub elapsed: JsonDuration,
    pub connections: usize,
    pub timeout: JsonDuration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<JsonDuration>,
    pub deadline_expired: bool,
    pub success: bool,
    pub exit_code: u8,
    pub targets: Vec<JsonTarget>,
}

impl JsonReport {
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            started_at: report.started_at.to_rfc3339(),
            elapsed: JsonDuration::from_duration(report.elapsed),
            connections: report.connections,
            timeout: JsonDuration::from_duration(report.timeout),
            deadline: report.deadline.map(JsonDuration::from_duration),
            deadline_expired: report.deadline_expired,
            success: report.success,
            exit_code: report.exit_code(),
            targets: report.targets.iter().map(JsonTarget::from).collect(),
        }
    }
}

/// Write the report as pretty JSON followed by a newline
pub fn write_report<W: Write>(report: &RunReport, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, &JsonReport::from_report(report))?;
    writeln!(writer)?;
    Ok(())
}

/// Print the report to stdout
pub fn print_report(report: &RunReport) -> Result<()> {
    write_report(report, std::io::stdout().lock())
}
