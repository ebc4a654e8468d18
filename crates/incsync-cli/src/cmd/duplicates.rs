use crate::output::print_json;
use anyhow::Context;
use incsync_core::duplicates::{detect_all_duplicates, format_report};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let report = detect_all_duplicates(root).context("duplicate detection failed")?;

    if json {
        return print_json(&report);
    }
    print!("{}", format_report(&report));
    Ok(())
}
