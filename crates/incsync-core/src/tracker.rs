use crate::desync::DesyncDetector;
use crate::error::Result;
use crate::metadata::{ExternalRef, IncrementMetadata};
use crate::spec_doc::SpecDocument;
use crate::sync_settings::{PermissionChecker, SyncOperation, SyncSettings};
use crate::types::TrackerTool;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Collaborator contract
// ---------------------------------------------------------------------------

/// Payload pushed to an external tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerItem {
    pub title: String,
    pub body: String,
    pub status: String,
}

/// Handle returned by a successful create.
#[derive(Debug, Clone)]
pub struct TrackerHandle {
    pub external_id: String,
    pub external_url: String,
}

/// The external tracker seam. Implementations are assumed slow and
/// fallible; the orchestrator treats every call as opaque and performs
/// all local validation before the first call.
pub trait ExternalTracker {
    fn tool(&self) -> TrackerTool;
    fn create(&self, item: &TrackerItem) -> Result<TrackerHandle>;
    fn update(&self, external_id: &str, item: &TrackerItem) -> Result<()>;
    fn get_status(&self, external_id: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// SyncOrchestrator
// ---------------------------------------------------------------------------

/// Drives sync against an external tracker. Ordering contract: the
/// desync check and permission check both pass before any external side
/// effect is attempted, so a failed external call never leaves local
/// records mutated.
pub struct SyncOrchestrator {
    root: PathBuf,
    checker: PermissionChecker,
}

impl SyncOrchestrator {
    pub fn new(root: &Path, settings: SyncSettings) -> Self {
        Self {
            root: root.to_path_buf(),
            checker: PermissionChecker::new(settings),
        }
    }

    /// Push one increment to the tracker. First push creates an external
    /// item and persists its id/url into the metadata record; later
    /// pushes update the existing item.
    pub fn push(&self, id: &str, tracker: &dyn ExternalTracker) -> Result<()> {
        DesyncDetector::new(&self.root).validate_or_throw(id)?;
        let mut meta = IncrementMetadata::load(&self.root, id)?;
        let item = self.build_item(id, &meta)?;

        match &meta.external {
            Some(external) => {
                self.checker.require(SyncOperation::UpdateExternalItem)?;
                tracker.update(&external.id, &item)?;
                IncrementMetadata::touch(&self.root, id)?;
                tracing::info!(id, external_id = %external.id, "external item updated");
            }
            None => {
                self.checker.require(SyncOperation::UpsertItem)?;
                let handle = tracker.create(&item)?;
                meta.set_external(ExternalRef {
                    tool: tracker.tool(),
                    id: handle.external_id.clone(),
                    url: handle.external_url,
                });
                meta.save(&self.root)?;
                tracing::info!(id, external_id = %handle.external_id, "external item created");
            }
        }
        Ok(())
    }

    /// Fetch the external status for a previously pushed increment. The
    /// caller decides how to reconcile; nothing local is mutated here.
    pub fn pull_status(&self, id: &str, tracker: &dyn ExternalTracker) -> Result<String> {
        self.checker.require(SyncOperation::UpdateStatus)?;
        let meta = IncrementMetadata::load(&self.root, id)?;
        let external = meta.external.ok_or_else(|| {
            crate::error::IncsyncError::Tracker(format!("increment {id} has no external link"))
        })?;
        tracker.get_status(&external.id)
    }

    fn build_item(&self, id: &str, meta: &IncrementMetadata) -> Result<TrackerItem> {
        let (title, body) = if SpecDocument::exists(&self.root, id) {
            let doc = SpecDocument::load(&self.root, id)?;
            (
                doc.title().unwrap_or(id).to_string(),
                doc.body().to_string(),
            )
        } else {
            (id.to_string(), String::new())
        };
        Ok(TrackerItem {
            title,
            body,
            status: meta.status.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
