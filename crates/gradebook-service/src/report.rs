//! Script run reports with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gradebook_core::auth::Operation;

/// What happened when a script ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Name of the script that ran.
    pub script: String,
    /// One entry per step, in order.
    pub outcomes: Vec<StepOutcome>,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// The reply to a single step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    /// 1-based step number.
    pub index: usize,
    pub user: String,
    pub operation: Operation,
    pub status: u16,
    pub body: serde_json::Value,
    #[serde(default)]
    pub expected_status: Option<u16>,
}

impl StepOutcome {
    /// A step without an expectation always matches.
    pub fn matched(&self) -> bool {
        self.expected_status.map_or(true, |s| s == self.status)
    }
}

impl ScriptReport {
    /// Steps whose status differs from the expected one.
    pub fn mismatches(&self) -> Vec<&StepOutcome> {
        self.outcomes.iter().filter(|o| !o.matched()).collect()
    }

    /// Number of steps that ended with each status, ascending by status.
    pub fn status_counts(&self) -> Vec<(u16, usize)> {
        let mut counts = std::collections::BTreeMap::new();
        for o in &self.outcomes {
            *counts.entry(o.status).or_insert(0usize) += 1;
        }
        counts.into_iter().collect()
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ScriptReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(index: usize, status: u16, expected: Option<u16>) -> StepOutcome {
        StepOutcome {
            index,
            user: "admin".into(),
            operation: Operation::ListStudents,
            status,
            body: serde_json::json!([]),
            expected_status: expected,
        }
    }

    fn report() -> ScriptReport {
        ScriptReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            script: "demo".into(),
            outcomes: vec![
                outcome(1, 200, None),
                outcome(2, 403, Some(403)),
                outcome(3, 404, Some(200)),
                outcome(4, 200, Some(200)),
            ],
            duration_ms: 3,
        }
    }

    #[test]
    fn mismatches_and_counts() {
        let report = report();
        let mismatched: Vec<usize> = report.mismatches().iter().map(|o| o.index).collect();
        assert_eq!(mismatched, vec![3]);
        assert_eq!(report.status_counts(), vec![(200, 2), (403, 1), (404, 1)]);
    }

    #[test]
    fn json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        report().save_json(&path).unwrap();

        let loaded = ScriptReport::load_json(&path).unwrap();
        assert_eq!(loaded.script, "demo");
        assert_eq!(loaded.outcomes.len(), 4);
        assert_eq!(loaded.outcomes[1].operation, Operation::ListStudents);
    }

    #[test]
    fn load_missing_report() {
        assert!(ScriptReport::load_json(Path::new("no_such_report.json")).is_err());
    }
}
