use crate::output::print_json;
use anyhow::Context;
use incsync_core::lifecycle::StatusStateMachine;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let migrated = StatusStateMachine::new(root)
        .migrate_legacy()
        .context("legacy status migration failed")?;

    if json {
        #[derive(serde::Serialize)]
        struct MigrateOutput {
            migrated: Vec<String>,
        }
        return print_json(&MigrateOutput { migrated });
    }
    if migrated.is_empty() {
        println!("No legacy statuses found");
    } else {
        for id in &migrated {
            println!("Migrated {id}");
        }
    }
    Ok(())
}
