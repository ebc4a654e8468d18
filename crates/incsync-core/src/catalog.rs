use crate::error::Result;
use crate::paths;
use crate::types::Status;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One physical increment directory found in one of the canonical roots.
#[derive(Debug, Clone, Serialize)]
pub struct LocationEntry {
    /// Directory name, e.g. `0009-cache-layer`.
    pub id: String,
    /// Sequence number with leading zeros stripped, the grouping key.
    pub number: String,
    /// Raw status string from the metadata record; "unknown" when the
    /// record is absent or unreadable.
    pub status: String,
    pub last_activity: DateTime<Utc>,
    pub file_count: usize,
    pub path: PathBuf,
    /// 0 = active root, 1 = `_archive`, 2 = `_abandoned`. Lower wins the
    /// final duplicate tie-break.
    pub precedence: u8,
}

impl LocationEntry {
    /// Status rank for winner selection. Unknown and legacy values rank
    /// with "other".
    pub fn status_rank(&self) -> u8 {
        self.status
            .parse::<Status>()
            .map(Status::rank)
            .unwrap_or(1)
    }
}

/// Uniform enumeration of the three canonical roots, consumed by both
/// the desync scanner's sibling (duplicate detection) and any caller
/// needing a whole-project inventory.
pub struct LocationCatalog {
    root: PathBuf,
}

impl LocationCatalog {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// All increment directories across `[active-root, _archive,
    /// _abandoned]`, in that precedence order. A missing root contributes
    /// nothing; a corrupt metadata record falls back to filesystem stat
    /// data rather than aborting the scan.
    pub fn scan(&self) -> Result<Vec<LocationEntry>> {
        let roots = [
            paths::increments_root(&self.root),
            paths::archive_root(&self.root),
            paths::abandoned_root(&self.root),
        ];

        let mut entries = Vec::new();
        for (precedence, dir) in roots.iter().enumerate() {
            if !dir.exists() {
                continue;
            }
            let mut names: Vec<String> = std::fs::read_dir(dir)?
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| paths::extract_number(name).is_some())
                .collect();
            names.sort();

            for name in names {
                entries.push(read_entry(&dir.join(&name), &name, precedence as u8));
            }
        }
        Ok(entries)
    }

    /// Entries whose normalized number matches, across all three roots.
    /// A single match is a meaningful answer here (pre-creation existence
    /// check), unlike duplicate reporting which needs two or more.
    pub fn find_by_number(&self, number: &str) -> Result<Vec<LocationEntry>> {
        let wanted = paths::normalize_number(number);
        Ok(self
            .scan()?
            .into_iter()
            .filter(|e| e.number == wanted)
            .collect())
    }
}

fn read_entry(dir: &Path, name: &str, precedence: u8) -> LocationEntry {
    let number = paths::extract_number(name)
        .map(paths::normalize_number)
        .unwrap_or_default();

    let (status, last_activity) = match read_record(dir) {
        Some(pair) => pair,
        None => ("unknown".to_string(), mtime(dir)),
    };

    LocationEntry {
        id: name.to_string(),
        number,
        status,
        last_activity,
        file_count: count_files(dir),
        path: dir.to_path_buf(),
        precedence,
    }
}

/// Raw status and lastActivity from the metadata record, if readable.
/// Partial records fall back field-by-field.
fn read_record(dir: &Path) -> Option<(String, DateTime<Utc>)> {
    let data = std::fs::read_to_string(dir.join(paths::METADATA_FILE)).ok()?;
    let value: serde_json::Value = serde_json::from_str(&data).ok()?;
    let status = value
        .get("status")
        .and_then(|s| s.as_str())
        .unwrap_or("unknown")
        .to_string();
    let last_activity = value
        .get("lastActivity")
        .and_then(|s| s.as_str())
        .and_then(|s| s.parse::<DateTime<Utc>>().ok())
        .unwrap_or_else(|| mtime(dir));
    Some((status, last_activity))
}

fn mtime(dir: &Path) -> DateTime<Utc> {
    std::fs::metadata(dir)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

fn count_files(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
