//! Synchronization report and its export formats
//!
//! The report is the only output retained from a run. It lists every
//! operation in plan order with its outcome, plus aggregate counts.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::Writer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

use crate::api::operations::{Operation, OperationStatus, SyncResult};

/// Why a run stopped before every operation was attempted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "message", rename_all = "snake_case")]
pub enum AbortReason {
    /// Authentication failure or unreachable knowledge base
    Fatal(String),
    Cancelled,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal(message) => write!(f, "fatal error: {}", message),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub operation: Operation,
    pub result: SyncResult,
}

/// Flat row used for CSV export and table output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub operation: String,
    pub status: OperationStatus,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Applied to an in-memory copy instead of the knowledge base
    #[serde(default)]
    pub dry_run: bool,
    pub entries: Vec<ReportEntry>,
    pub applied: usize,
    pub failed: usize,
    pub skipped: usize,
    pub aborted: Option<AbortReason>,
}

impl Default for SyncReport {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            dry_run: false,
            entries: Vec::new(),
            applied: 0,
            failed: 0,
            skipped: 0,
            aborted: None,
        }
    }

    pub fn record(&mut self, operation: Operation, result: SyncResult) {
        match result.status {
            OperationStatus::Applied => self.applied += 1,
            OperationStatus::Failed => self.failed += 1,
            OperationStatus::Skipped => self.skipped += 1,
        }
        self.entries.push(ReportEntry { operation, result });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every operation applied and the run was not aborted
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.skipped == 0 && self.aborted.is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.result.status == OperationStatus::Failed)
    }

    pub fn rows(&self) -> Vec<ReportRow> {
        self.entries
            .iter()
            .map(|entry| ReportRow {
                operation: entry.operation.to_string(),
                status: entry.result.status,
                message: entry.result.message.clone().unwrap_or_default(),
            })
            .collect()
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{} operations: {} applied, {} failed, {} skipped",
            self.len(),
            self.applied,
            self.failed,
            self.skipped
        );
        if let Some(reason) = &self.aborted {
            summary.push_str(&format!(" (aborted: {})", reason));
        }
        summary
    }

    /// Export to `.json` or `.csv` depending on the file extension
    pub fn export(&self, path: &Path) -> Result<()> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("csv") => self.export_csv(path),
            Some("json") | None => self.export_json(path),
            Some(other) => anyhow::bail!("Unsupported report format '.{}' (use .json or .csv)", other),
        }
    }

    pub fn export_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize sync report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report file: {}", path.display()))?;

        log::info!("Sync report exported to: {}", path.display());
        Ok(())
    }

    pub fn export_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = Writer::from_path(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

        for row in self.rows() {
            wtr.serialize(&row)
                .with_context(|| format!("Failed to write row: {}", row.operation))?;
        }

        wtr.flush().context("Failed to flush CSV writer")?;

        log::info!("Sync report exported to: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Term, Triple};
    use crate::sync::classify::EntityKind;

    fn op(name: &str) -> Operation {
        Operation::add(
            Triple::new(
                Term::iri(format!("http://example.org/{}", name)),
                "http://example.org/p",
                Term::literal("v"),
            ),
            EntityKind::Instance,
        )
    }

    fn sample_report() -> SyncReport {
        let mut report = SyncReport::new();
        report.record(op("a"), SyncResult::success());
        report.record(op("b"), SyncResult::failure("rejected: locked"));
        report.record(op("c"), SyncResult::skipped("cancelled"));
        report.aborted = Some(AbortReason::Cancelled);
        report.finish();
        report
    }

    #[test]
    fn test_counts() {
        let report = sample_report();

        assert_eq!((report.applied, report.failed, report.skipped), (1, 1, 1));
        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(
            report.summary(),
            "3 operations: 1 applied, 1 failed, 1 skipped (aborted: cancelled)"
        );
    }

    #[test]
    fn test_empty_report_is_success() {
        let report = SyncReport::new();
        assert!(report.is_empty());
        assert!(report.is_success());
        assert!(report.duration().is_none());
    }

    #[test]
    fn test_finished_report_has_duration() {
        let report = sample_report();
        let elapsed = report.duration().unwrap();
        assert!(elapsed >= chrono::Duration::zero());
    }

    #[test]
    fn test_export_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = sample_report();

        report.export(&path).unwrap();

        let parsed: SyncReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.run_id, report.run_id);
        assert_eq!(parsed.entries, report.entries);
        assert_eq!(parsed.aborted, Some(AbortReason::Cancelled));
    }

    #[test]
    fn test_export_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        sample_report().export(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "operation,status,message");
        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains("failed"));
        assert!(lines[2].contains("rejected: locked"));
    }

    #[test]
    fn test_export_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        assert!(sample_report().export(&dir.path().join("report.xlsx")).is_err());
    }
}
