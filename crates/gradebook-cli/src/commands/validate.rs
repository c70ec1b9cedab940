//! The `gradebook validate` command.

use std::path::PathBuf;

use anyhow::Result;

use gradebook_service::script;

pub fn execute(script_path: PathBuf) -> Result<()> {
    let script = script::parse_script(&script_path)?;
    println!("Script: {} ({} steps)", script.name, script.steps.len());

    let warnings = script::validate_script(&script);
    for w in &warnings {
        let prefix = w
            .step
            .map(|n| format!("  [step {n}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Script is valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
