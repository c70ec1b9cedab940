//! The `gradebook init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("gradebook.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("scripts")?;
    write_if_missing(Path::new("scripts/example.toml"), EXAMPLE_SCRIPT)?;

    println!("\nNext steps:");
    println!("  1. Export GRADEBOOK_ADMIN_PASSWORD, GRADEBOOK_PROF_PASSWORD and GRADEBOOK_KID_PASSWORD");
    println!("  2. Run: gradebook validate --script scripts/example.toml");
    println!("  3. Run: gradebook run --script scripts/example.toml");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# gradebook configuration

log_filter = "info"

[users.admin]
password = "${GRADEBOOK_ADMIN_PASSWORD}"
role = "admin"

[users.prof]
password = "${GRADEBOOK_PROF_PASSWORD}"
role = "instructor"

[users.kid]
password = "${GRADEBOOK_KID_PASSWORD}"
role = "student"
"#;

const EXAMPLE_SCRIPT: &str = r#"[script]
name = "example"
description = "Register a student, grade one test and read the aggregates"

[[steps]]
user = "admin"
password = "${GRADEBOOK_ADMIN_PASSWORD}"
op = "create_student"
id = 1
name = "Ada"

[[steps]]
user = "prof"
password = "${GRADEBOOK_PROF_PASSWORD}"
op = "create_test"
id = 1
max_score = 100

[[steps]]
user = "prof"
password = "${GRADEBOOK_PROF_PASSWORD}"
op = "submit_result"
student_id = 1
test_id = 1
score = 88

[[steps]]
user = "prof"
password = "${GRADEBOOK_PROF_PASSWORD}"
op = "submit_result"
student_id = 1
test_id = 1
score = 120
expect_status = 400

[[steps]]
user = "kid"
password = "${GRADEBOOK_KID_PASSWORD}"
op = "create_test"
id = 2
max_score = 50
expect_status = 403

[[steps]]
user = "kid"
password = "${GRADEBOOK_KID_PASSWORD}"
op = "average_score"
id = 1

[[steps]]
user = "admin"
password = "${GRADEBOOK_ADMIN_PASSWORD}"
op = "delete_student"
id = 1

[[steps]]
user = "kid"
password = "${GRADEBOOK_KID_PASSWORD}"
op = "highest_score"
id = 1
expect_status = 404
"#;
