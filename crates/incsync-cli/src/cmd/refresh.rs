use crate::output::print_json;
use anyhow::Context;
use incsync_core::lifecycle::StatusStateMachine;
use incsync_core::paths;
use std::path::Path;

/// Re-run the automatic transition rules for one or all increments.
pub fn run(root: &Path, id: Option<&str>, json: bool) -> anyhow::Result<()> {
    let sm = StatusStateMachine::new(root);
    let ids = match id {
        Some(id) => vec![id.to_string()],
        None => incsync_core::desync::list_increment_ids(&paths::increments_root(root))?,
    };

    let mut changed = Vec::new();
    for id in &ids {
        if sm
            .auto_transition(id)
            .with_context(|| format!("auto-transition failed for {id}"))?
        {
            changed.push(id.clone());
        }
    }

    if json {
        #[derive(serde::Serialize)]
        struct RefreshOutput {
            checked: usize,
            changed: Vec<String>,
        }
        return print_json(&RefreshOutput {
            checked: ids.len(),
            changed,
        });
    }
    if changed.is_empty() {
        println!("Checked {}, no transitions", ids.len());
    } else {
        for id in &changed {
            println!("Transitioned {id}");
        }
    }
    Ok(())
}
