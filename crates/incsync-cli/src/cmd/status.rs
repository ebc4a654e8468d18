use crate::output::{print_json, print_table};
use anyhow::Context;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let rows = incsync_core::workspace::list(root).context("failed to list increments")?;

    if json {
        #[derive(serde::Serialize)]
        struct Row<'a> {
            id: &'a str,
            status: &'a str,
            #[serde(rename = "type")]
            increment_type: &'a str,
            tasks_total: usize,
            tasks_completed: usize,
            tasks_in_progress: usize,
        }
        let output: Vec<Row> = rows
            .iter()
            .map(|r| Row {
                id: &r.metadata.id,
                status: r.metadata.status.as_str(),
                increment_type: r.metadata.increment_type.as_str(),
                tasks_total: r.tasks.total,
                tasks_completed: r.tasks.completed,
                tasks_in_progress: r.tasks.in_progress,
            })
            .collect();
        return print_json(&output);
    }

    if rows.is_empty() {
        println!("No increments yet. Run: incsync create <slug>");
        return Ok(());
    }

    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.metadata.id.clone(),
                r.metadata.status.to_string(),
                r.metadata.increment_type.to_string(),
                format!("{}/{}", r.tasks.completed, r.tasks.total),
                r.metadata.last_activity.format("%Y-%m-%d").to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "STATUS", "TYPE", "TASKS", "LAST ACTIVITY"], table);
    Ok(())
}
