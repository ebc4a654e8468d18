use crate::output::print_json;
use anyhow::bail;
use incsync_core::desync::{format_report, DesyncDetector};
use std::path::Path;

pub fn run(root: &Path, id: Option<&str>, fix: bool, json: bool) -> anyhow::Result<()> {
    let detector = DesyncDetector::new(root);
    match id {
        Some(id) => check_one(&detector, id, fix, json),
        None => check_all(&detector, fix, json),
    }
}

fn check_one(detector: &DesyncDetector, id: &str, fix: bool, json: bool) -> anyhow::Result<()> {
    let mut result = detector.check_increment(id);

    let mut fixed = false;
    if fix && result.has_desync {
        fixed = detector.fix_desync(id);
        result = detector.check_increment(id);
    }

    if json {
        #[derive(serde::Serialize)]
        struct CheckOutput<'a> {
            #[serde(flatten)]
            result: &'a incsync_core::desync::DesyncResult,
            fixed: bool,
        }
        print_json(&CheckOutput {
            result: &result,
            fixed,
        })?;
    } else if let Some(error) = &result.error {
        println!("{id}: ERROR {error}");
    } else if result.has_desync {
        println!(
            "{id}: DESYNC metadata.json={} spec.md={}",
            result.metadata_status.as_deref().unwrap_or("?"),
            result.spec_status.as_deref().unwrap_or("?"),
        );
    } else if fixed {
        println!("{id}: fixed, statuses now agree");
    } else {
        println!("{id}: consistent");
    }

    if result.error.is_some() {
        bail!("consistency check failed for {id}");
    }
    if result.has_desync {
        bail!("status desync in {id} (re-run with --fix to repair)");
    }
    Ok(())
}

fn check_all(detector: &DesyncDetector, fix: bool, json: bool) -> anyhow::Result<()> {
    let mut report = detector.scan_all()?;

    let mut fixed = 0usize;
    if fix {
        for desync in &report.desyncs {
            if detector.fix_desync(&desync.id) {
                fixed += 1;
            }
        }
        report = detector.scan_all()?;
    }

    if json {
        #[derive(serde::Serialize)]
        struct ScanOutput<'a> {
            #[serde(flatten)]
            report: &'a incsync_core::desync::ScanReport,
            fixed: usize,
        }
        print_json(&ScanOutput {
            report: &report,
            fixed,
        })?;
    } else {
        if fixed > 0 {
            println!("Fixed {fixed} desync(s)");
        }
        print!("{}", format_report(&report));
    }

    if report.total_desyncs > 0 || !report.errors.is_empty() {
        bail!(
            "{} desync(s), {} error(s)",
            report.total_desyncs,
            report.errors.len()
        );
    }
    Ok(())
}
