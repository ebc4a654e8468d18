use crate::error::{IncsyncError, Result};
use crate::paths;
use crate::types::{IncrementType, Status, TrackerTool};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ExternalRef
// ---------------------------------------------------------------------------

/// Link to a mirrored item in an external issue tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalRef {
    pub tool: TrackerTool,
    pub id: String,
    pub url: String,
}

// ---------------------------------------------------------------------------
// IncrementMetadata
// ---------------------------------------------------------------------------

/// The structured metadata record, one `metadata.json` per increment
/// directory. This store is the source of truth when repairing a desync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncrementMetadata {
    pub id: String,
    pub status: Status,
    #[serde(rename = "type")]
    pub increment_type: IncrementType,
    pub created: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abandon_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalRef>,
}

impl IncrementMetadata {
    pub fn new(id: impl Into<String>, status: Status, increment_type: IncrementType) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status,
            increment_type,
            created: now,
            last_activity: now,
            completed_at: None,
            paused_at: None,
            pause_reason: None,
            abandon_reason: None,
            external: None,
        }
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn exists(root: &Path, id: &str) -> bool {
        paths::metadata_path(root, id).exists()
    }

    pub fn load(root: &Path, id: &str) -> Result<Self> {
        let path = paths::metadata_path(root, id);
        if !path.exists() {
            return Err(IncsyncError::MissingFile {
                id: id.to_string(),
                store: "metadata.json",
            });
        }
        let data = std::fs::read_to_string(&path)?;
        serde_json::from_str(&data).map_err(|e| IncsyncError::InvalidRecord {
            id: id.to_string(),
            detail: e.to_string(),
        })
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::metadata_path(root, &self.id);
        let data = serde_json::to_string_pretty(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Update `lastActivity` to now and persist.
    pub fn touch(root: &Path, id: &str) -> Result<()> {
        let mut metadata = Self::load(root, id)?;
        metadata.last_activity = Utc::now();
        metadata.save(root)
    }

    pub fn set_external(&mut self, external: ExternalRef) {
        self.external = Some(external);
        self.last_activity = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// Raw status access (migration support)
// ---------------------------------------------------------------------------

/// Read the raw status string without enum validation. Legacy records
/// carry values outside the valid set; the migration pass needs to see
/// them as written.
pub fn read_raw_status(root: &Path, id: &str) -> Result<Option<String>> {
    let path = paths::metadata_path(root, id);
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(&path)?;
    let value: serde_json::Value =
        serde_json::from_str(&data).map_err(|e| IncsyncError::InvalidRecord {
            id: id.to_string(),
            detail: e.to_string(),
        })?;
    Ok(value
        .get("status")
        .and_then(|s| s.as_str())
        .map(String::from))
}

/// Rewrite only the `status` field of a raw record, preserving all other
/// fields as-is. Used by the legacy-status migration pass.
pub fn write_raw_status(root: &Path, id: &str, status: Status) -> Result<()> {
    let path = paths::metadata_path(root, id);
    let data = std::fs::read_to_string(&path)?;
    let mut value: serde_json::Value =
        serde_json::from_str(&data).map_err(|e| IncsyncError::InvalidRecord {
            id: id.to_string(),
            detail: e.to_string(),
        })?;
    value["status"] = serde_json::Value::String(status.as_str().to_string());
    let updated = serde_json::to_string_pretty(&value)?;
    crate::io::atomic_write(&path, updated.as_bytes())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_metadata(dir: &TempDir, id: &str) -> IncrementMetadata {
        let metadata = IncrementMetadata::new(id, Status::Backlog, IncrementType::Feature);
        metadata.save(dir.path()).unwrap();
        metadata
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        write_metadata(&dir, "0001-auth");

        let loaded = IncrementMetadata::load(dir.path(), "0001-auth").unwrap();
        assert_eq!(loaded.id, "0001-auth");
        assert_eq!(loaded.status, Status::Backlog);
        assert_eq!(loaded.increment_type, IncrementType::Feature);
        assert!(loaded.external.is_none());
    }

    #[test]
    fn load_missing_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            IncrementMetadata::load(dir.path(), "0001-auth"),
            Err(IncsyncError::MissingFile { store: "metadata.json", .. })
        ));
    }

    #[test]
    fn load_corrupt_reports_invalid_record() {
        let dir = TempDir::new().unwrap();
        let path = crate::paths::metadata_path(dir.path(), "0002-bad");
        crate::io::atomic_write(&path, b"{not json").unwrap();

        assert!(matches!(
            IncrementMetadata::load(dir.path(), "0002-bad"),
            Err(IncsyncError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn on_disk_field_names_follow_record_contract() {
        let dir = TempDir::new().unwrap();
        write_metadata(&dir, "0003-naming");

        let raw =
            std::fs::read_to_string(crate::paths::metadata_path(dir.path(), "0003-naming"))
                .unwrap();
        assert!(raw.contains("\"lastActivity\""));
        assert!(raw.contains("\"type\": \"feature\""));
        assert!(!raw.contains("pausedAt"), "absent optionals are omitted");
    }

    #[test]
    fn raw_status_roundtrip_preserves_other_fields() {
        let dir = TempDir::new().unwrap();
        let path = crate::paths::metadata_path(dir.path(), "0004-legacy");
        crate::io::atomic_write(
            &path,
            br#"{"id":"0004-legacy","status":"planned","type":"feature","custom":"kept"}"#,
        )
        .unwrap();

        assert_eq!(
            read_raw_status(dir.path(), "0004-legacy").unwrap().as_deref(),
            Some("planned")
        );

        write_raw_status(dir.path(), "0004-legacy", Status::Planning).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"planning\""));
        assert!(raw.contains("\"kept\""));
    }

    #[test]
    fn external_ref_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut metadata = write_metadata(&dir, "0005-ext");
        metadata.set_external(ExternalRef {
            tool: TrackerTool::Github,
            id: "42".to_string(),
            url: "https://github.com/o/r/issues/42".to_string(),
        });
        metadata.save(dir.path()).unwrap();

        let loaded = IncrementMetadata::load(dir.path(), "0005-ext").unwrap();
        let ext = loaded.external.unwrap();
        assert_eq!(ext.tool, TrackerTool::Github);
        assert_eq!(ext.id, "42");
    }
}
