//! TOML request scripts.
//!
//! A script is an ordered list of requests, each made as a named user. Scripts
//! seed data, replay sessions and check expected statuses.

use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gradebook_core::auth::Credentials;

use crate::config::resolve_env_vars;
use crate::error::KNOWN_STATUSES;
use crate::report::{ScriptReport, StepOutcome};
use crate::request::Request;
use crate::service::GradebookService;

/// Intermediate TOML structure for parsing script files.
#[derive(Debug, Deserialize)]
struct TomlScriptFile {
    script: TomlScriptHeader,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct TomlScriptHeader {
    name: String,
    #[serde(default)]
    description: String,
}

/// A parsed script.
#[derive(Debug, Clone)]
pub struct Script {
    pub name: String,
    pub description: String,
    pub steps: Vec<Step>,
}

/// One request in a script.
#[derive(Clone, Serialize, Deserialize)]
pub struct Step {
    /// Username to authenticate as.
    pub user: String,
    /// `${VAR}` references are resolved from the environment. Missing
    /// passwords are sent as empty and fail authentication.
    #[serde(default)]
    pub password: Option<String>,
    /// Status the step is expected to end with.
    #[serde(default)]
    pub expect_status: Option<u16>,
    #[serde(flatten)]
    pub request: Request,
}

impl Step {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.user.clone(), self.password.clone().unwrap_or_default())
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("expect_status", &self.expect_status)
            .field("request", &self.request)
            .finish()
    }
}

/// Parse a single TOML file into a `Script`.
pub fn parse_script(path: &Path) -> Result<Script> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script file: {}", path.display()))?;

    parse_script_str(&content, path)
}

/// Parse a TOML string into a `Script` (useful for testing).
pub fn parse_script_str(content: &str, source_path: &Path) -> Result<Script> {
    let parsed: TomlScriptFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let steps = parsed
        .steps
        .into_iter()
        .map(|mut step| {
            step.password = step.password.map(|p| resolve_env_vars(&p));
            step
        })
        .collect();

    Ok(Script {
        name: parsed.script.name,
        description: parsed.script.description,
        steps,
    })
}

/// A warning from script validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// 1-based step number (if applicable).
    pub step: Option<usize>,
    pub message: String,
}

/// Validate a script for common mistakes.
pub fn validate_script(script: &Script) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if script.steps.is_empty() {
        warnings.push(ValidationWarning {
            step: None,
            message: "script has no steps".into(),
        });
    }

    let mut student_ids = HashSet::new();
    let mut test_ids = HashSet::new();

    for (i, step) in script.steps.iter().enumerate() {
        let number = i + 1;

        if step.user.trim().is_empty() {
            warnings.push(ValidationWarning {
                step: Some(number),
                message: "step has no user".into(),
            });
        }

        if let Some(status) = step.expect_status {
            if !KNOWN_STATUSES.contains(&status) {
                warnings.push(ValidationWarning {
                    step: Some(number),
                    message: format!("expect_status {status} is never returned"),
                });
            }
        }

        // A repeated create is fine when the script expects it to fail.
        let expects_success = step.expect_status.map_or(true, |s| s == 200);
        let duplicate = match &step.request {
            Request::CreateStudent(s) => !student_ids.insert(s.id),
            Request::CreateTest(t) => !test_ids.insert(t.id),
            _ => false,
        };
        if duplicate && expects_success {
            warnings.push(ValidationWarning {
                step: Some(number),
                message: format!("{} repeats an id created earlier", step.request.operation()),
            });
        }
    }

    warnings
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_step_start(&self, index: usize, step: &Step);
    fn on_step_complete(&self, outcome: &StepOutcome);
    fn on_script_complete(&self, total: usize, mismatched: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_step_start(&self, _: usize, _: &Step) {}
    fn on_step_complete(&self, _: &StepOutcome) {}
    fn on_script_complete(&self, _: usize, _: usize, _: Duration) {}
}

/// Run every step in order against `service`.
pub async fn run_script(
    service: &GradebookService,
    script: &Script,
    progress: &dyn ProgressReporter,
) -> ScriptReport {
    let start = Instant::now();
    let mut outcomes = Vec::with_capacity(script.steps.len());

    for (i, step) in script.steps.iter().enumerate() {
        let index = i + 1;
        progress.on_step_start(index, step);

        let operation = step.request.operation();
        let reply = service
            .call(&step.credentials(), step.request.clone())
            .await;

        let outcome = StepOutcome {
            index,
            user: step.user.clone(),
            operation,
            status: reply.status,
            body: reply.body,
            expected_status: step.expect_status,
        };
        if !outcome.matched() {
            tracing::warn!(
                step = index,
                %operation,
                status = outcome.status,
                expected = ?outcome.expected_status,
                "unexpected status"
            );
        }
        progress.on_step_complete(&outcome);
        outcomes.push(outcome);
    }

    let elapsed = start.elapsed();
    let report = ScriptReport {
        id: Uuid::new_v4(),
        created_at: chrono::Utc::now(),
        script: script.name.clone(),
        outcomes,
        duration_ms: elapsed.as_millis() as u64,
    };
    progress.on_script_complete(report.outcomes.len(), report.mismatches().len(), elapsed);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use gradebook_core::model::Role;

    use crate::identity::StaticIdentityStore;

    const VALID_TOML: &str = r#"
[script]
name = "semester"
description = "Register, test and grade one student"

[[steps]]
user = "admin"
password = "root-pw"
op = "create_student"
id = 1
name = "A"

[[steps]]
user = "prof"
password = "prof-pw"
op = "create_test"
id = 1
max_score = 100

[[steps]]
user = "prof"
password = "prof-pw"
op = "submit_result"
student_id = 1
test_id = 1
score = 95

[[steps]]
user = "kid"
password = "kid-pw"
op = "submit_result"
student_id = 1
test_id = 1
score = 100
expect_status = 403

[[steps]]
user = "kid"
password = "kid-pw"
op = "average_score"
id = 1
"#;

    fn service() -> GradebookService {
        let store = StaticIdentityStore::default()
            .with_user("admin", "root-pw", Role::Admin)
            .with_user("prof", "prof-pw", Role::Instructor)
            .with_user("kid", "kid-pw", Role::Student);
        GradebookService::new(Arc::new(store))
    }

    #[test]
    fn parse_valid_toml() {
        let script = parse_script_str(VALID_TOML, &PathBuf::from("s.toml")).unwrap();
        assert_eq!(script.name, "semester");
        assert_eq!(script.steps.len(), 5);
        assert_eq!(script.steps[3].expect_status, Some(403));
        assert!(matches!(
            script.steps[1].request,
            Request::CreateTest(ref t) if t.max_score == 100.0
        ));
        assert!(validate_script(&script).is_empty());
    }

    #[test]
    fn parse_unknown_op() {
        let toml = r#"
[script]
name = "bad"

[[steps]]
user = "admin"
op = "truncate"
"#;
        assert!(parse_script_str(toml, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_script_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_flags_problems() {
        let toml = r#"
[script]
name = "sloppy"

[[steps]]
user = ""
op = "list_students"

[[steps]]
user = "admin"
op = "create_student"
id = 1
name = "A"

[[steps]]
user = "admin"
op = "create_student"
id = 1
name = "B"

[[steps]]
user = "admin"
op = "create_student"
id = 1
name = "C"
expect_status = 400

[[steps]]
user = "admin"
op = "list_tests"
expect_status = 418
"#;
        let script = parse_script_str(toml, &PathBuf::from("s.toml")).unwrap();
        let warnings = validate_script(&script);
        assert_eq!(warnings.len(), 3, "{warnings:?}");
        assert!(warnings
            .iter()
            .any(|w| w.step == Some(1) && w.message.contains("no user")));
        assert!(warnings
            .iter()
            .any(|w| w.step == Some(3) && w.message.contains("repeats")));
        assert!(warnings
            .iter()
            .any(|w| w.step == Some(5) && w.message.contains("418")));
    }

    #[test]
    fn validate_empty_script() {
        let script = parse_script_str("[script]\nname = \"empty\"\n", &PathBuf::from("e.toml"))
            .unwrap();
        let warnings = validate_script(&script);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].step.is_none());
    }

    #[test]
    fn passwords_resolve_env_vars() {
        let toml = r#"
[script]
name = "env"

[[steps]]
user = "admin"
password = "${_GRADEBOOK_SCRIPT_PW}"
op = "list_tests"
"#;
        std::env::set_var("_GRADEBOOK_SCRIPT_PW", "from-env");
        let script = parse_script_str(toml, &PathBuf::from("s.toml")).unwrap();
        std::env::remove_var("_GRADEBOOK_SCRIPT_PW");
        assert_eq!(script.steps[0].credentials().password, "from-env");
    }

    #[test]
    fn self_referencing_password_resolves_once() {
        let toml = r#"
[script]
name = "env"

[[steps]]
user = "admin"
password = "${_GRADEBOOK_SCRIPT_SELF}"
op = "list_tests"
"#;
        std::env::set_var("_GRADEBOOK_SCRIPT_SELF", "${_GRADEBOOK_SCRIPT_SELF}");
        let script = parse_script_str(toml, &PathBuf::from("s.toml")).unwrap();
        std::env::remove_var("_GRADEBOOK_SCRIPT_SELF");
        assert_eq!(
            script.steps[0].credentials().password,
            "${_GRADEBOOK_SCRIPT_SELF}"
        );
    }

    #[test]
    fn step_debug_masks_password() {
        let script = parse_script_str(VALID_TOML, &PathBuf::from("s.toml")).unwrap();
        let debug = format!("{:?}", script.steps[0]);
        assert!(!debug.contains("root-pw"));
    }

    #[tokio::test]
    async fn run_reports_each_step() {
        let script = parse_script_str(VALID_TOML, &PathBuf::from("s.toml")).unwrap();
        let report = run_script(&service(), &script, &NoopReporter).await;

        let statuses: Vec<u16> = report.outcomes.iter().map(|o| o.status).collect();
        assert_eq!(statuses, vec![200, 200, 200, 403, 200]);
        assert!(report.mismatches().is_empty());
        assert_eq!(report.outcomes[4].body, serde_json::json!(95.0));
        assert_eq!(report.script, "semester");
    }

    #[tokio::test]
    async fn nan_max_score_is_rejected() {
        let toml = r#"
[script]
name = "nan"

[[steps]]
user = "prof"
password = "prof-pw"
op = "create_test"
id = 1
max_score = nan

[[steps]]
user = "prof"
password = "prof-pw"
op = "get_test"
id = 1
"#;
        let script = parse_script_str(toml, &PathBuf::from("s.toml")).unwrap();
        let report = run_script(&service(), &script, &NoopReporter).await;
        assert_eq!(report.outcomes[0].status, 400);
        assert_eq!(
            report.outcomes[0].body,
            serde_json::json!({"detail": "Maximum score must be a number"})
        );
        assert_eq!(report.outcomes[1].status, 404);
    }

    #[tokio::test]
    async fn missing_password_is_unauthorized() {
        let toml = r#"
[script]
name = "nopw"

[[steps]]
user = "admin"
op = "list_students"
expect_status = 200
"#;
        let script = parse_script_str(toml, &PathBuf::from("s.toml")).unwrap();
        let report = run_script(&service(), &script, &NoopReporter).await;
        assert_eq!(report.outcomes[0].status, 401);
        assert_eq!(report.mismatches().len(), 1);
    }
}
