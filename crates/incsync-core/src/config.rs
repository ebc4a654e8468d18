use crate::error::{IncsyncError, Result};
use crate::paths;
use crate::sync_settings::{migrate_sync_direction, validate_sync_settings, SyncSettings};
use crate::types::TrackerTool;
use serde::Serialize;
use std::path::Path;

/// The increment store is an append-only source of truth: propagation
/// into living docs only ever flows one way. The field exists in the
/// config file so the invariant is visible, not so it can be changed.
pub const LIVING_DOCS_DIRECTION: &str = "one-way";

/// Project configuration, stored at `.incsync/config.yaml`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub increment_to_living_docs: String,
    pub sync: SyncSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracker: Option<TrackerTool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            increment_to_living_docs: LIVING_DOCS_DIRECTION.to_string(),
            sync: SyncSettings::default(),
            tracker: None,
        }
    }
}

impl Config {
    /// Load and validate project configuration. A missing file yields the
    /// defaults. A legacy `syncDirection` enum is migrated onto the
    /// boolean lattice in memory (the file is rewritten only on the next
    /// save). Any `incrementToLivingDocs` other than "one-way" is a
    /// structural error that blocks all sync operations.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&data)?;

        let direction = value
            .get("incrementToLivingDocs")
            .and_then(|v| v.as_str())
            .unwrap_or(LIVING_DOCS_DIRECTION)
            .to_string();
        if direction != LIVING_DOCS_DIRECTION {
            return Err(IncsyncError::StructuralConfig(direction));
        }

        let sync = if let Some(raw) = value.get("sync") {
            validate_sync_settings(raw)?
        } else if let Some(legacy) = value.get("syncDirection") {
            let legacy = legacy.as_str();
            tracing::warn!(
                value = legacy.unwrap_or("<non-string>"),
                "legacy syncDirection found; migrating to sync settings"
            );
            migrate_sync_direction(legacy)
        } else {
            SyncSettings::default()
        };

        let tracker = match value.get("tracker") {
            Some(v) => Some(serde_yaml::from_value(v.clone())?),
            None => None,
        };

        Ok(Self {
            increment_to_living_docs: direction,
            sync,
            tracker,
        })
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&paths::config_path(root), data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::atomic_write;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) {
        atomic_write(&paths::config_path(dir.path()), content.as_bytes()).unwrap();
    }

    #[test]
    fn missing_config_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.sync, SyncSettings::default());
        assert_eq!(config.increment_to_living_docs, "one-way");
        assert!(config.tracker.is_none());
    }

    #[test]
    fn roundtrip_preserves_settings() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            increment_to_living_docs: LIVING_DOCS_DIRECTION.to_string(),
            sync: migrate_sync_direction(Some("bidirectional")),
            tracker: Some(TrackerTool::Github),
        };
        config.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.sync, config.sync);
        assert_eq!(loaded.tracker, Some(TrackerTool::Github));
    }

    #[test]
    fn non_one_way_direction_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "incrementToLivingDocs: bidirectional\nsync:\n  canUpsertInternalItems: true\n  canUpdateExternalItems: true\n  canUpdateStatus: true\n",
        );

        let err = Config::load(dir.path()).unwrap_err();
        assert!(matches!(err, IncsyncError::StructuralConfig(_)));
        assert!(err.to_string().contains("immutable"));
    }

    #[test]
    fn rejection_is_independent_of_other_settings() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "incrementToLivingDocs: two-way\n");
        assert!(matches!(
            Config::load(dir.path()),
            Err(IncsyncError::StructuralConfig(_))
        ));
    }

    #[test]
    fn legacy_sync_direction_migrates_in_memory() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "syncDirection: export\n");

        let config = Config::load(dir.path()).unwrap();
        assert!(config.sync.can_upsert_internal_items);
        assert!(!config.sync.can_update_external_items);
        assert!(!config.sync.can_update_status);

        // The file itself is untouched until the next save.
        let raw = std::fs::read_to_string(paths::config_path(dir.path())).unwrap();
        assert!(raw.contains("syncDirection"));
    }

    #[test]
    fn explicit_sync_block_wins_over_legacy_field() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "syncDirection: bidirectional\nsync:\n  canUpsertInternalItems: false\n  canUpdateExternalItems: false\n  canUpdateStatus: true\n",
        );

        let config = Config::load(dir.path()).unwrap();
        assert!(!config.sync.can_upsert_internal_items);
        assert!(config.sync.can_update_status);
    }

    #[test]
    fn malformed_sync_block_names_field() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "sync:\n  canUpsertInternalItems: true\n");
        let err = Config::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("canUpdateExternalItems"));
    }

    #[test]
    fn saved_file_uses_camel_case_fields() {
        let dir = TempDir::new().unwrap();
        Config::default().save(dir.path()).unwrap();
        let raw = std::fs::read_to_string(paths::config_path(dir.path())).unwrap();
        assert!(raw.contains("incrementToLivingDocs: one-way"));
        assert!(raw.contains("canUpsertInternalItems"));
    }
}
