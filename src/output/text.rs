//! Human-readable text output

use crate::coordinator::{RunReport, TargetStatus};
use crate::util::time::format_duration;

/// Summary lines for a finished run, one per target plus a closing verdict
pub fn summary_lines(report: &RunReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .targets
        .iter()
        .map(|target| match target.status {
            TargetStatus::Passed => format!(
                "{}: {}/{} connections held",
                target.descriptor, target.connected, report.connections
            ),
            TargetStatus::Failed => format!(
                "{}: failed after {}/{} connections",
                target.descriptor, target.connected, report.connections
            ),
            TargetStatus::Aborted => format!(
                "{}: aborted after {}/{} connections",
                target.descriptor, target.connected, report.connections
            ),
        })
        .collect();

    let verdict = if report.success { "PASS" } else { "FAIL" };
    lines.push(format!(
        "{} ({} targets in {})",
        verdict,
        report.targets.len(),
        format_duration(report.elapsed)
    ));
    lines
}

/// Log the summary to stderr
pub fn print_summary(report: &RunReport) {
    for line in summary_lines(report) {
        tracing::info!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::TargetReport;
    use crate::target::Network;
    use chrono::Utc;
    use std::time::Duration;

    fn target(descriptor: &str, status: TargetStatus, connected: usize) -> TargetReport {
        TargetReport {
            descriptor: descriptor.to_string(),
            network: Network::Tcp,
            address: descriptor.to_string(),
            status,
            connected,
            error: None,
        }
    }

    #[test]
    fn test_summary_lines() {
        let report = RunReport {
            started_at: Utc::now(),
            elapsed: Duration::from_millis(40),
            connections: 3,
            timeout: Duration::from_secs(1),
            deadline: None,
            deadline_expired: false,
            success: false,
            targets: vec![
                target("a:1", TargetStatus::Passed, 3),
                target("b:2", TargetStatus::Failed, 1),
                target("c:3", TargetStatus::Aborted, 0),
            ],
        };

        let lines = summary_lines(&report);
        assert_eq!(
            lines,
            vec![
                "a:1: 3/3 connections held",
                "b:2: failed after 1/3 connections",
                "c:3: aborted after 0/3 connections",
                "FAIL (3 targets in 40ms)",
            ]
        );
    }
}
