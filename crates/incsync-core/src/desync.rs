use crate::error::{IncsyncError, Result};
use crate::metadata;
use crate::paths;
use crate::spec_doc::SpecDocument;
use crate::types::Status;
use serde::Serialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Consistency verdict for one increment's two status stores.
///
/// A missing store is not a desync: both statuses must be readable and
/// differ. Whether a missing spec document should count as corruption is
/// an open policy question; current behavior matches the stores as
/// deployed.
#[derive(Debug, Clone, Serialize)]
pub struct DesyncResult {
    pub id: String,
    pub has_desync: bool,
    pub metadata_status: Option<String>,
    pub spec_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct ScanReport {
    pub total_scanned: usize,
    pub total_desyncs: usize,
    pub healthy: Vec<String>,
    pub desyncs: Vec<DesyncResult>,
    pub errors: Vec<String>,
}

// ---------------------------------------------------------------------------
// DesyncDetector
// ---------------------------------------------------------------------------

pub struct DesyncDetector {
    root: PathBuf,
}

impl DesyncDetector {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Compare the two stores for one increment. Never returns Err: read
    /// failures land in the `error` field so batch callers can continue.
    pub fn check_increment(&self, id: &str) -> DesyncResult {
        let mut result = DesyncResult {
            id: id.to_string(),
            has_desync: false,
            metadata_status: None,
            spec_status: None,
            error: None,
        };

        match metadata::read_raw_status(&self.root, id) {
            Ok(status) => result.metadata_status = status,
            Err(e) => {
                result.error = Some(e.to_string());
                return result;
            }
        }

        match SpecDocument::load(&self.root, id) {
            Ok(doc) => result.spec_status = doc.raw_status(),
            Err(IncsyncError::MissingFile { .. }) => {}
            Err(e) => {
                result.error = Some(e.to_string());
                return result;
            }
        }

        result.has_desync = match (&result.metadata_status, &result.spec_status) {
            (Some(m), Some(s)) => m != s,
            _ => false,
        };
        result
    }

    /// Scan every increment under the active root (`_archive` and other
    /// non-increment directories are skipped). One bad increment never
    /// aborts the scan; its error is collected and the scan continues.
    pub fn scan_all(&self) -> Result<ScanReport> {
        let mut report = ScanReport::default();

        for id in list_increment_ids(&paths::increments_root(&self.root))? {
            report.total_scanned += 1;
            let result = self.check_increment(&id);

            if let Some(error) = &result.error {
                report.errors.push(format!("{id}: {error}"));
            } else if result.has_desync {
                report.total_desyncs += 1;
                report.desyncs.push(result);
            } else {
                report.healthy.push(id);
            }
        }

        Ok(report)
    }

    /// Repair a desync by overwriting the spec document's status field
    /// with the metadata record's value (metadata is the source of
    /// truth). Returns false — never an error — when there is nothing to
    /// fix, the metadata record is unusable, or the write fails.
    pub fn fix_desync(&self, id: &str) -> bool {
        let result = self.check_increment(id);

        if !result.has_desync {
            tracing::debug!(id, "no desync to fix");
            return false;
        }

        let Some(raw) = result.metadata_status else {
            tracing::warn!(id, "cannot fix desync: metadata.json missing");
            return false;
        };
        let Ok(status) = raw.parse::<Status>() else {
            tracing::warn!(id, raw, "cannot fix desync: metadata status not in valid set");
            return false;
        };

        let mut doc = match SpecDocument::load(&self.root, id) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(id, error = %e, "cannot fix desync: spec.md unreadable");
                return false;
            }
        };
        doc.set_status(status);
        match doc.save(&self.root, id) {
            Ok(()) => {
                tracing::debug!(id, status = %status, "desync fixed: spec.md updated");
                true
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "failed to write spec.md");
                false
            }
        }
    }

    /// Fail-fast precondition for lifecycle operations: Err on desync or
    /// on an unreadable store, no-op when healthy.
    pub fn validate_or_throw(&self, id: &str) -> Result<()> {
        let result = self.check_increment(id);

        if let Some(error) = result.error {
            return Err(IncsyncError::InvalidRecord {
                id: id.to_string(),
                detail: error,
            });
        }

        if result.has_desync {
            return Err(IncsyncError::StatusMismatch {
                id: id.to_string(),
                metadata: result.metadata_status.unwrap_or_default(),
                spec: result.spec_status.unwrap_or_default(),
            });
        }

        Ok(())
    }
}

/// Increment directory names under `dir`, sorted for deterministic scan
/// order. A missing directory yields an empty list.
pub fn list_increment_ids(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut ids = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if paths::extract_number(&name).is_some() {
            ids.push(name);
        }
    }
    ids.sort();
    Ok(ids)
}

/// Human-readable rendering of a scan report.
pub fn format_report(report: &ScanReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Scanned {} increments: {} healthy, {} desynced, {} errors\n",
        report.total_scanned,
        report.healthy.len(),
        report.total_desyncs,
        report.errors.len()
    ));

    for desync in &report.desyncs {
        out.push_str(&format!(
            "  DESYNC {}: metadata.json={} spec.md={}\n",
            desync.id,
            desync.metadata_status.as_deref().unwrap_or("?"),
            desync.spec_status.as_deref().unwrap_or("?"),
        ));
    }
    for error in &report.errors {
        out.push_str(&format!("  ERROR {error}\n"));
    }

    if report.total_desyncs == 0 && report.errors.is_empty() {
        out.push_str("All increments healthy.\n");
    } else if report.total_desyncs > 0 {
        out.push_str("Run 'incsync check <id> --fix' to repair.\n");
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::IncrementMetadata;
    use crate::types::IncrementType;
    use tempfile::TempDir;

    fn make_increment(dir: &TempDir, id: &str, meta_status: Status, spec_status: Status) {
        IncrementMetadata::new(id, meta_status, IncrementType::Feature)
            .save(dir.path())
            .unwrap();
        let doc = SpecDocument::new(id, "Test", IncrementType::Feature, spec_status);
        doc.save(dir.path(), id).unwrap();
    }

    #[test]
    fn healthy_increment_has_no_desync() {
        let dir = TempDir::new().unwrap();
        make_increment(&dir, "0001-ok", Status::Active, Status::Active);

        let result = DesyncDetector::new(dir.path()).check_increment("0001-ok");
        assert!(!result.has_desync);
        assert_eq!(result.metadata_status.as_deref(), Some("active"));
        assert_eq!(result.spec_status.as_deref(), Some("active"));
    }

    #[test]
    fn differing_statuses_are_a_desync() {
        let dir = TempDir::new().unwrap();
        make_increment(&dir, "0002-bad", Status::Completed, Status::Active);

        let result = DesyncDetector::new(dir.path()).check_increment("0002-bad");
        assert!(result.has_desync);
        assert_eq!(result.metadata_status.as_deref(), Some("completed"));
        assert_eq!(result.spec_status.as_deref(), Some("active"));
    }

    #[test]
    fn missing_store_is_not_a_desync() {
        let dir = TempDir::new().unwrap();
        IncrementMetadata::new("0003-half", Status::Active, IncrementType::Feature)
            .save(dir.path())
            .unwrap();

        let result = DesyncDetector::new(dir.path()).check_increment("0003-half");
        assert!(!result.has_desync);
        assert_eq!(result.metadata_status.as_deref(), Some("active"));
        assert!(result.spec_status.is_none());
        assert!(result.error.is_none());
    }

    #[test]
    fn corrupt_metadata_is_an_error_not_a_desync() {
        let dir = TempDir::new().unwrap();
        crate::io::atomic_write(
            &paths::metadata_path(dir.path(), "0004-corrupt"),
            b"{broken",
        )
        .unwrap();

        let result = DesyncDetector::new(dir.path()).check_increment("0004-corrupt");
        assert!(!result.has_desync);
        assert!(result.error.is_some());
    }

    #[test]
    fn fix_desync_rewrites_spec_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        make_increment(&dir, "0005-fix", Status::Completed, Status::Active);
        let detector = DesyncDetector::new(dir.path());

        assert!(detector.fix_desync("0005-fix"));
        let result = detector.check_increment("0005-fix");
        assert!(!result.has_desync);
        assert_eq!(result.spec_status.as_deref(), Some("completed"));

        // Second call: nothing left to fix.
        assert!(!detector.fix_desync("0005-fix"));
    }

    #[test]
    fn fix_desync_preserves_spec_body() {
        let dir = TempDir::new().unwrap();
        make_increment(&dir, "0006-body", Status::Paused, Status::Active);
        let body_before = SpecDocument::load(dir.path(), "0006-body")
            .unwrap()
            .body()
            .to_string();

        assert!(DesyncDetector::new(dir.path()).fix_desync("0006-body"));

        let doc = SpecDocument::load(dir.path(), "0006-body").unwrap();
        assert_eq!(doc.body(), body_before);
    }

    #[test]
    fn fix_desync_returns_false_without_metadata() {
        let dir = TempDir::new().unwrap();
        let doc = SpecDocument::new("0007-solo", "Solo", IncrementType::Feature, Status::Active);
        doc.save(dir.path(), "0007-solo").unwrap();

        // No metadata store at all: no desync, nothing fixable.
        assert!(!DesyncDetector::new(dir.path()).fix_desync("0007-solo"));
    }

    #[test]
    fn validate_or_throw_names_both_statuses() {
        let dir = TempDir::new().unwrap();
        make_increment(&dir, "0008-gate", Status::Completed, Status::Active);

        let err = DesyncDetector::new(dir.path())
            .validate_or_throw("0008-gate")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("completed"));
        assert!(message.contains("active"));
        assert!(message.contains("--fix"));
    }

    #[test]
    fn validate_or_throw_passes_when_healthy() {
        let dir = TempDir::new().unwrap();
        make_increment(&dir, "0009-good", Status::Active, Status::Active);
        DesyncDetector::new(dir.path())
            .validate_or_throw("0009-good")
            .unwrap();
    }

    #[test]
    fn scan_all_collects_and_continues() {
        let dir = TempDir::new().unwrap();
        make_increment(&dir, "0001-a", Status::Active, Status::Active);
        make_increment(&dir, "0002-b", Status::Completed, Status::Active);
        crate::io::atomic_write(&paths::metadata_path(dir.path(), "0003-c"), b"{oops").unwrap();
        // Non-increment directories are ignored.
        std::fs::create_dir_all(paths::increments_root(dir.path()).join("templates")).unwrap();
        std::fs::create_dir_all(paths::archive_root(dir.path()).join("0004-old")).unwrap();

        let report = DesyncDetector::new(dir.path()).scan_all().unwrap();
        assert_eq!(report.total_scanned, 3);
        assert_eq!(report.total_desyncs, 1);
        assert_eq!(report.healthy, vec!["0001-a".to_string()]);
        assert_eq!(report.desyncs[0].id, "0002-b");
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("0003-c:"));
    }

    #[test]
    fn scan_all_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let report = DesyncDetector::new(dir.path()).scan_all().unwrap();
        assert_eq!(report.total_scanned, 0);
    }

    #[test]
    fn scenario_completed_vs_active_full_cycle() {
        let dir = TempDir::new().unwrap();
        make_increment(&dir, "0047-linkage", Status::Completed, Status::Active);
        let detector = DesyncDetector::new(dir.path());

        assert!(detector.check_increment("0047-linkage").has_desync);
        assert!(detector.fix_desync("0047-linkage"));

        let after = detector.check_increment("0047-linkage");
        assert!(!after.has_desync);
        assert_eq!(after.spec_status.as_deref(), Some("completed"));
    }
}
