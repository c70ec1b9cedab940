//! The `gradebook run` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use gradebook_service::config::GradebookConfig;
use gradebook_service::report::{ScriptReport, StepOutcome};
use gradebook_service::script::{self, ProgressReporter, Step};
use gradebook_service::{GradebookService, StaticIdentityStore};

use crate::OutputFormat;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_step_start(&self, index: usize, step: &Step) {
        eprintln!(
            "  Step {index}: {} as {}",
            step.request.operation(),
            step.user
        );
    }

    fn on_step_complete(&self, outcome: &StepOutcome) {
        let mark = if outcome.matched() { "OK" } else { "MISMATCH" };
        eprintln!(
            "  Done: step {} -> {} [{mark}]",
            outcome.index, outcome.status
        );
    }

    fn on_script_complete(&self, total: usize, mismatched: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {total} steps, {mismatched} mismatched ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    config: GradebookConfig,
    script_path: PathBuf,
    format: OutputFormat,
    output: Option<PathBuf>,
    fail_on_mismatch: bool,
) -> Result<()> {
    let script = script::parse_script(&script_path)?;
    tracing::debug!(path = %script_path.display(), steps = script.steps.len(), "parsed script");
    for w in script::validate_script(&script) {
        match w.step {
            Some(n) => eprintln!("Warning: step {n}: {}", w.message),
            None => eprintln!("Warning: {}", w.message),
        }
    }

    anyhow::ensure!(
        !config.users.is_empty(),
        "no users configured; run `gradebook init` or pass --config"
    );

    let store = StaticIdentityStore::from_config(&config);
    let service = GradebookService::new(Arc::new(store));

    eprintln!(
        "gradebook v{}: running '{}' ({} steps)\n",
        env!("CARGO_PKG_VERSION"),
        script.name,
        script.steps.len()
    );

    let report = script::run_script(&service, &script, &ConsoleReporter).await;
    tracing::info!(
        report = %report.id,
        mismatched = report.mismatches().len(),
        duration_ms = report.duration_ms,
        "script finished"
    );

    match format {
        OutputFormat::Table => print_summary(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if let Some(dir) = output {
        std::fs::create_dir_all(&dir)?;
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
        let path = dir.join(format!("report-{timestamp}.json"));
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    let mismatched = report.mismatches().len();
    if fail_on_mismatch && mismatched > 0 {
        anyhow::bail!("{mismatched} step(s) did not return their expected status");
    }

    Ok(())
}

fn print_summary(report: &ScriptReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["#", "User", "Operation", "Status", "Expected", "Body"]);

    for o in &report.outcomes {
        let expected = match o.expected_status {
            Some(s) if s == o.status => format!("{s}"),
            Some(s) => format!("{s} (!)"),
            None => "-".to_string(),
        };
        table.add_row(vec![
            Cell::new(o.index),
            Cell::new(&o.user),
            Cell::new(o.operation),
            Cell::new(o.status),
            Cell::new(expected),
            Cell::new(o.body.to_string()),
        ]);
    }

    println!("{table}");

    let counts: Vec<String> = report
        .status_counts()
        .into_iter()
        .map(|(status, n)| format!("{status} x{n}"))
        .collect();
    println!("Statuses: {}", counts.join(", "));
}
