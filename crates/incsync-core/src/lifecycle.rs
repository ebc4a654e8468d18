use crate::desync::DesyncDetector;
use crate::error::{IncsyncError, Result};
use crate::metadata::{self, IncrementMetadata};
use crate::paths;
use crate::spec_doc::SpecDocument;
use crate::tasks;
use crate::types::{migrate_legacy_status, Status};
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Owner of every status mutation. Closing or abandoning an increment is
/// a status update only; the directory is never moved or deleted.
pub struct StatusStateMachine {
    root: PathBuf,
}

/// Legal transitions. Automatic rules only ever move forward through
/// backlog/planning into active; everything out of active or a terminal
/// state is an explicit operator action.
fn transition_legal(from: Status, to: Status) -> bool {
    use Status::*;
    matches!(
        (from, to),
        (Backlog, Planning)
            | (Backlog, Active)
            | (Planning, Active)
            | (Active, Paused)
            | (Paused, Active)
            | (Abandoned, Active)
            | (Active, Completed)
            | (Paused, Completed)
            | (Backlog, Abandoned)
            | (Planning, Abandoned)
            | (Active, Abandoned)
            | (Paused, Abandoned)
    )
}

impl StatusStateMachine {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    // -----------------------------------------------------------------------
    // Operator actions
    // -----------------------------------------------------------------------

    pub fn pause(&self, id: &str, reason: Option<&str>) -> Result<()> {
        self.validate(id)?;
        let mut meta = self.load_for_transition(id, Status::Paused)?;
        let now = Utc::now();
        meta.status = Status::Paused;
        meta.paused_at = Some(now);
        meta.pause_reason = reason.map(String::from);
        meta.last_activity = now;
        self.write_both(meta)?;
        tracing::info!(id, "increment paused");
        Ok(())
    }

    /// Resume from paused or abandoned back to active. Clears the pause
    /// bookkeeping fields.
    pub fn resume(&self, id: &str) -> Result<()> {
        self.validate(id)?;
        let mut meta = self.load_for_transition(id, Status::Active)?;
        meta.status = Status::Active;
        meta.paused_at = None;
        meta.pause_reason = None;
        meta.abandon_reason = None;
        meta.last_activity = Utc::now();
        self.write_both(meta)?;
        tracing::info!(id, "increment resumed");
        Ok(())
    }

    pub fn abandon(&self, id: &str, reason: Option<&str>) -> Result<()> {
        self.validate(id)?;
        let mut meta = self.load_for_transition(id, Status::Abandoned)?;
        meta.status = Status::Abandoned;
        meta.abandon_reason = reason.map(String::from);
        meta.last_activity = Utc::now();
        self.write_both(meta)?;
        tracing::info!(id, "increment abandoned");
        Ok(())
    }

    /// Complete an increment. Requires every task in the task list to be
    /// checked off. Metadata is written first; a spec-document write
    /// failure is reported as-is and the resulting split state is left
    /// for the desync detector to find.
    pub fn close(&self, id: &str) -> Result<()> {
        self.validate(id)?;
        let mut meta = self.load_for_transition(id, Status::Completed)?;

        let stats = tasks::stats(&self.root, id)?;
        if !stats.all_complete() {
            return Err(IncsyncError::InvalidTransition {
                from: meta.status.to_string(),
                to: Status::Completed.to_string(),
                reason: format!(
                    "{} of {} tasks complete; all tasks must be complete to close",
                    stats.completed, stats.total
                ),
            });
        }

        let now = Utc::now();
        meta.status = Status::Completed;
        meta.completed_at = Some(now);
        meta.last_activity = now;
        self.write_both(meta)?;
        tracing::info!(id, "increment closed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Automatic transitions
    // -----------------------------------------------------------------------

    /// Re-evaluate the automatic rules for one increment. Idempotent:
    /// returns true only when the status actually changed.
    ///
    /// Rules, in evaluation order:
    /// - any in-progress task forces backlog/planning to active
    /// - backlog becomes planning once a spec document exists
    /// - planning becomes active once a task list document exists
    pub fn auto_transition(&self, id: &str) -> Result<bool> {
        let meta = IncrementMetadata::load(&self.root, id)?;
        let mut target = meta.status;

        if matches!(target, Status::Backlog | Status::Planning)
            && tasks::stats(&self.root, id)?.any_in_progress()
        {
            target = Status::Active;
        }
        if target == Status::Backlog && SpecDocument::exists(&self.root, id) {
            target = Status::Planning;
        }
        if target == Status::Planning && tasks::exists(&self.root, id) {
            target = Status::Active;
        }

        if target == meta.status {
            return Ok(false);
        }

        let mut meta = meta;
        meta.status = target;
        meta.last_activity = Utc::now();
        self.write_both(meta)?;
        tracing::debug!(id, status = %target, "auto-transition applied");
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Legacy migration
    // -----------------------------------------------------------------------

    /// Rewrite legacy status values (`planned` becomes `planning`) across
    /// the active root. Only records whose status is outside the valid
    /// set are touched; `_archive` is never migrated. Returns the ids
    /// that were rewritten.
    pub fn migrate_legacy(&self) -> Result<Vec<String>> {
        let mut migrated = Vec::new();

        for id in crate::desync::list_increment_ids(&paths::increments_root(&self.root))? {
            let Some(raw) = metadata::read_raw_status(&self.root, &id)? else {
                continue;
            };
            if raw.parse::<Status>().is_ok() {
                continue;
            }
            let Some(status) = migrate_legacy_status(&raw) else {
                tracing::warn!(id, raw, "legacy status with no migration target");
                continue;
            };

            metadata::write_raw_status(&self.root, &id, status)?;
            if SpecDocument::exists(&self.root, &id) {
                let mut doc = SpecDocument::load(&self.root, &id)?;
                if doc.raw_status().as_deref() == Some(raw.as_str()) {
                    doc.set_status(status);
                    doc.save(&self.root, &id)?;
                }
            }
            tracing::info!(id, from = raw, to = %status, "migrated legacy status");
            migrated.push(id);
        }

        Ok(migrated)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn validate(&self, id: &str) -> Result<()> {
        DesyncDetector::new(&self.root).validate_or_throw(id)
    }

    fn load_for_transition(&self, id: &str, to: Status) -> Result<IncrementMetadata> {
        let meta = IncrementMetadata::load(&self.root, id)?;
        if !transition_legal(meta.status, to) {
            return Err(IncsyncError::InvalidTransition {
                from: meta.status.to_string(),
                to: to.to_string(),
                reason: "not a legal status transition".to_string(),
            });
        }
        Ok(meta)
    }

    /// Metadata first, then the spec document if one exists. No rollback
    /// on a second-store failure.
    fn write_both(&self, meta: IncrementMetadata) -> Result<()> {
        let id = meta.id.clone();
        let status = meta.status;
        meta.save(&self.root)?;
        if SpecDocument::exists(&self.root, &id) {
            let mut doc = SpecDocument::load(&self.root, &id)?;
            doc.set_status(status);
            doc.save(&self.root, &id)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
