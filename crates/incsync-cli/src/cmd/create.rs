use crate::output::print_json;
use anyhow::Context;
use incsync_core::types::{IncrementType, Status};
use std::path::Path;

#[allow(clippy::too_many_arguments)]
pub fn run(
    root: &Path,
    slug: &str,
    title: Option<&str>,
    increment_type: &str,
    number: Option<&str>,
    planning: bool,
    json: bool,
) -> anyhow::Result<()> {
    let increment_type: IncrementType = increment_type
        .parse()
        .with_context(|| format!("unknown increment type '{increment_type}'"))?;
    let initial = if planning {
        Status::Planning
    } else {
        Status::Backlog
    };
    let title = title.unwrap_or(slug);

    let id = incsync_core::workspace::create(root, number, slug, title, increment_type, initial)
        .context("failed to create increment")?;

    if json {
        #[derive(serde::Serialize)]
        struct Created<'a> {
            id: &'a str,
            status: &'a str,
        }
        return print_json(&Created {
            id: &id,
            status: initial.as_str(),
        });
    }
    println!("Created {id} ({initial})");
    Ok(())
}
