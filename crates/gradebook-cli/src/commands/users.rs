//! The `gradebook users` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use gradebook_core::auth::Operation;
use gradebook_core::model::Role;
use gradebook_service::config::GradebookConfig;
use gradebook_service::StaticIdentityStore;

pub fn execute(config: &GradebookConfig) -> Result<()> {
    let roster = StaticIdentityStore::from_config(config).roster();
    if roster.is_empty() {
        println!("No users configured.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["User", "Role", "May change"]);
    for (username, role) in &roster {
        table.add_row(vec![
            Cell::new(username),
            Cell::new(role),
            Cell::new(permitted_mutations(*role)),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn permitted_mutations(role: Role) -> String {
    let ops: Vec<&str> = Operation::ALL
        .iter()
        .filter(|op| op.is_mutation() && op.required_capability().permits(role))
        .map(|op| op.as_str())
        .collect();
    if ops.is_empty() {
        "(read only)".to_string()
    } else {
        ops.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutations_follow_policy() {
        assert_eq!(
            permitted_mutations(Role::Admin),
            "create_student, delete_student"
        );
        assert_eq!(
            permitted_mutations(Role::Instructor),
            "create_test, submit_result"
        );
        assert_eq!(permitted_mutations(Role::Student), "(read only)");
    }
}
