use crate::error::{IncsyncError, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SyncSettings
// ---------------------------------------------------------------------------

/// The three-boolean permission lattice governing living-docs to
/// external-tracker flow. All 8 combinations are legal configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    pub can_upsert_internal_items: bool,
    pub can_update_external_items: bool,
    pub can_update_status: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            can_upsert_internal_items: false,
            can_update_external_items: false,
            can_update_status: false,
        }
    }
}

impl SyncSettings {
    /// Non-fatal advisories for a legal but risky configuration.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.can_upsert_internal_items && self.can_update_external_items && self.can_update_status
        {
            warnings.push("full sync mode: conflict risk, all directions enabled".to_string());
        }
        warnings
    }
}

/// Structural validation of a raw settings mapping. Each field must be
/// present and a boolean; the error names the first offending field.
pub fn validate_sync_settings(raw: &serde_yaml::Value) -> Result<SyncSettings> {
    let mapping = raw.as_mapping().ok_or_else(|| {
        IncsyncError::InvalidSyncSettings("settings must be a mapping".to_string())
    })?;

    let field = |name: &str| -> Result<bool> {
        match mapping.get(serde_yaml::Value::from(name)) {
            None => Err(IncsyncError::InvalidSyncSettings(format!(
                "missing required field '{name}'"
            ))),
            Some(serde_yaml::Value::Bool(b)) => Ok(*b),
            Some(_) => Err(IncsyncError::InvalidSyncSettings(format!(
                "field '{name}' must be a boolean"
            ))),
        }
    };

    let settings = SyncSettings {
        can_upsert_internal_items: field("canUpsertInternalItems")?,
        can_update_external_items: field("canUpdateExternalItems")?,
        can_update_status: field("canUpdateStatus")?,
    };
    for warning in settings.warnings() {
        tracing::warn!("{warning}");
    }
    Ok(settings)
}

// ---------------------------------------------------------------------------
// Legacy direction migration
// ---------------------------------------------------------------------------

/// Map a legacy single-enum sync direction onto the boolean lattice.
/// Pure function returning a fresh value every call. Matching is exact,
/// case-sensitive, and untrimmed: anything unrecognized maps to
/// all-false rather than guessing.
pub fn migrate_sync_direction(legacy: Option<&str>) -> SyncSettings {
    match legacy {
        Some("bidirectional") => SyncSettings {
            can_upsert_internal_items: true,
            can_update_external_items: true,
            can_update_status: true,
        },
        Some("export") | Some("to-external") => SyncSettings {
            can_upsert_internal_items: true,
            can_update_external_items: false,
            can_update_status: false,
        },
        Some("import") | Some("from-external") => SyncSettings {
            can_upsert_internal_items: false,
            can_update_external_items: false,
            can_update_status: true,
        },
        _ => SyncSettings::default(),
    }
}

// ---------------------------------------------------------------------------
// PermissionChecker
// ---------------------------------------------------------------------------

/// The sync operations gated by the lattice, each tied to exactly one
/// boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOperation {
    /// Create or push an item into the tracker's item set.
    UpsertItem,
    /// Modify an item that already exists externally.
    UpdateExternalItem,
    /// Propagate a status change.
    UpdateStatus,
}

pub struct PermissionChecker {
    settings: SyncSettings,
}

impl PermissionChecker {
    pub fn new(settings: SyncSettings) -> Self {
        Self { settings }
    }

    pub fn is_allowed(&self, operation: SyncOperation) -> bool {
        match operation {
            SyncOperation::UpsertItem => self.settings.can_upsert_internal_items,
            SyncOperation::UpdateExternalItem => self.settings.can_update_external_items,
            SyncOperation::UpdateStatus => self.settings.can_update_status,
        }
    }

    /// Err names exactly the boolean that gates the operation.
    pub fn require(&self, operation: SyncOperation) -> Result<()> {
        if self.is_allowed(operation) {
            return Ok(());
        }
        let permission = match operation {
            SyncOperation::UpsertItem => "canUpsertInternalItems",
            SyncOperation::UpdateExternalItem => "canUpdateExternalItems",
            SyncOperation::UpdateStatus => "canUpdateStatus",
        };
        Err(IncsyncError::PermissionDenied { permission })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
