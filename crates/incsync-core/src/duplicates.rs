use crate::catalog::{LocationCatalog, LocationEntry};
use crate::error::Result;
use crate::paths;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct DuplicateGroup {
    /// Canonical 4-digit padded display form of the shared number.
    pub increment_number: String,
    pub locations: Vec<LocationEntry>,
    pub recommended_winner: LocationEntry,
    pub losing_versions: Vec<LocationEntry>,
    /// Which of the four selection rules broke the tie.
    pub resolution_reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct DuplicateReport {
    pub duplicates: Vec<DuplicateGroup>,
    pub total_checked: usize,
    pub duplicate_count: usize,
}

// ---------------------------------------------------------------------------
// Winner selection
// ---------------------------------------------------------------------------

/// Strict total order over locations sharing an id. Greater = preferred.
/// Priority: status rank, then recency (second precision), then file
/// count, then location precedence. Precedence always breaks the final
/// tie, so two distinct locations never compare equal in practice.
fn prefer(a: &LocationEntry, b: &LocationEntry) -> Ordering {
    a.status_rank()
        .cmp(&b.status_rank())
        .then_with(|| {
            a.last_activity
                .timestamp()
                .cmp(&b.last_activity.timestamp())
        })
        .then_with(|| a.file_count.cmp(&b.file_count))
        .then_with(|| b.precedence.cmp(&a.precedence))
}

fn precedence_name(precedence: u8) -> &'static str {
    match precedence {
        0 => "active root",
        1 => "_archive",
        _ => "_abandoned",
    }
}

/// Pick the winner among two or more locations and explain which rule
/// decided it, by comparing the winner against the best loser.
fn select_winner(locations: &[LocationEntry]) -> (usize, String) {
    let winner_idx = locations
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| prefer(a, b))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let winner = &locations[winner_idx];
    let runner_up = locations
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != winner_idx)
        .max_by(|(_, a), (_, b)| prefer(a, b))
        .map(|(_, e)| e);

    let reason = match runner_up {
        None => "Only one location".to_string(),
        Some(other) => {
            if winner.status_rank() != other.status_rank() {
                format!(
                    "Higher status ({}) wins over ({})",
                    winner.status, other.status
                )
            } else if winner.last_activity.timestamp() != other.last_activity.timestamp() {
                "Most recent activity wins".to_string()
            } else if winner.file_count != other.file_count {
                format!("Most complete ({} files) wins", winner.file_count)
            } else {
                format!(
                    "Location precedence ({}) wins",
                    precedence_name(winner.precedence)
                )
            }
        }
    };
    (winner_idx, reason)
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Group all locations by normalized number; any number materialized in
/// two or more places is a duplicate.
pub fn detect_all_duplicates(root: &Path) -> Result<DuplicateReport> {
    let entries = LocationCatalog::new(root).scan()?;
    let total_checked = entries.len();

    let mut groups: BTreeMap<String, Vec<LocationEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.number.clone()).or_default().push(entry);
    }

    let mut report = DuplicateReport {
        total_checked,
        ..Default::default()
    };
    for (number, locations) in groups {
        if locations.len() < 2 {
            continue;
        }
        let (winner_idx, resolution_reason) = select_winner(&locations);
        let recommended_winner = locations[winner_idx].clone();
        let losing_versions = locations
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != winner_idx)
            .map(|(_, e)| e.clone())
            .collect();

        report.duplicates.push(DuplicateGroup {
            increment_number: paths::display_number(&number),
            locations,
            recommended_winner,
            losing_versions,
            resolution_reason,
        });
    }
    report.duplicate_count = report.duplicates.len();
    Ok(report)
}

/// All locations sharing a number, even a single one. Used before
/// creating a new increment to detect an already-taken number.
pub fn detect_duplicates_by_number(number: &str, root: &Path) -> Result<Vec<LocationEntry>> {
    LocationCatalog::new(root).find_by_number(number)
}

/// Human-readable rendering of a duplicate report.
pub fn format_report(report: &DuplicateReport) -> String {
    let mut out = format!(
        "Checked {} locations: {} duplicate group(s)\n",
        report.total_checked, report.duplicate_count
    );
    for group in &report.duplicates {
        out.push_str(&format!(
            "  {} in {} locations — keep {} ({})\n",
            group.increment_number,
            group.locations.len(),
            group.recommended_winner.path.display(),
            group.resolution_reason,
        ));
        for loser in &group.losing_versions {
            out.push_str(&format!(
                "    superseded: {} (status {})\n",
                loser.path.display(),
                loser.status
            ));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
