use crate::catalog::LocationCatalog;
use crate::config::Config;
use crate::error::{IncsyncError, Result};
use crate::metadata::IncrementMetadata;
use crate::paths;
use crate::spec_doc::SpecDocument;
use crate::tasks::{self, TaskStats};
use crate::types::{IncrementType, Status};
use std::path::Path;

pub fn is_initialized(root: &Path) -> bool {
    root.join(paths::INCSYNC_DIR).is_dir()
}

/// Create the project layout and a default config. Idempotent.
pub fn init(root: &Path) -> Result<()> {
    crate::io::ensure_dir(&paths::increments_root(root))?;
    crate::io::ensure_dir(&paths::archive_root(root))?;
    crate::io::ensure_dir(&paths::abandoned_root(root))?;
    if !paths::config_path(root).exists() {
        Config::default().save(root)?;
    }
    tracing::info!(root = %root.display(), "workspace initialized");
    Ok(())
}

fn require_initialized(root: &Path) -> Result<()> {
    if !is_initialized(root) {
        return Err(IncsyncError::NotInitialized);
    }
    Ok(())
}

/// Next free sequence number across all three roots.
pub fn next_number(root: &Path) -> Result<String> {
    let max = LocationCatalog::new(root)
        .scan()?
        .iter()
        .filter_map(|e| e.number.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    Ok(format!("{:04}", max + 1))
}

/// Create a new increment. The number must not already exist anywhere,
/// including `_archive` and `_abandoned`. Initial status is backlog or
/// planning; a spec document is written only for planning, so a fresh
/// backlog increment stays backlog until one appears.
pub fn create(
    root: &Path,
    number: Option<&str>,
    slug: &str,
    title: &str,
    increment_type: IncrementType,
    initial: Status,
) -> Result<String> {
    require_initialized(root)?;
    if !matches!(initial, Status::Backlog | Status::Planning) {
        return Err(IncsyncError::InvalidTransition {
            from: "<new>".to_string(),
            to: initial.to_string(),
            reason: "increments start at backlog or planning".to_string(),
        });
    }

    let number = match number {
        Some(n) => paths::display_number(n),
        None => next_number(root)?,
    };
    let id = format!("{number}-{slug}");
    paths::validate_id(&id)?;

    let taken = crate::duplicates::detect_duplicates_by_number(&number, root)?;
    if let Some(existing) = taken.first() {
        return Err(IncsyncError::IncrementExists(format!(
            "number {number} already used by {}",
            existing.path.display()
        )));
    }

    IncrementMetadata::new(id.clone(), initial, increment_type).save(root)?;
    if initial == Status::Planning {
        SpecDocument::new(&id, title, increment_type, initial).save(root, &id)?;
    }
    tracing::info!(id, status = %initial, "increment created");
    Ok(id)
}

/// One row of the status overview.
pub struct IncrementSummary {
    pub metadata: IncrementMetadata,
    pub tasks: TaskStats,
}

/// All increments under the active root, with task progress.
pub fn list(root: &Path) -> Result<Vec<IncrementSummary>> {
    require_initialized(root)?;
    let mut rows = Vec::new();
    for id in crate::desync::list_increment_ids(&paths::increments_root(root))? {
        let metadata = IncrementMetadata::load(root, &id)?;
        let tasks = tasks::stats(root, &id)?;
        rows.push(IncrementSummary { metadata, tasks });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_is_idempotent() {
        let dir = TempDir::new().unwrap();
        init(dir.path()).unwrap();
        init(dir.path()).unwrap();
        assert!(is_initialized(dir.path()));
        assert!(paths::config_path(dir.path()).exists());
    }

    #[test]
    fn create_requires_init() {
        let dir = TempDir::new().unwrap();
        let err = create(
            dir.path(),
            None,
            "auth",
            "Auth",
            IncrementType::Feature,
            Status::Backlog,
        )
        .unwrap_err();
        assert!(matches!(err, IncsyncError::NotInitialized));
    }

    #[test]
    fn create_backlog_has_no_spec_document() {
        let dir = TempDir::new().unwrap();
        init(dir.path()).unwrap();

        let id = create(
            dir.path(),
            None,
            "auth",
            "Auth",
            IncrementType::Feature,
            Status::Backlog,
        )
        .unwrap();
        assert_eq!(id, "0001-auth");
        assert!(!SpecDocument::exists(dir.path(), &id));
        assert_eq!(
            IncrementMetadata::load(dir.path(), &id).unwrap().status,
            Status::Backlog
        );
    }

    #[test]
    fn create_planning_writes_spec_document() {
        let dir = TempDir::new().unwrap();
        init(dir.path()).unwrap();

        let id = create(
            dir.path(),
            Some("7"),
            "cache",
            "Cache Layer",
            IncrementType::Refactor,
            Status::Planning,
        )
        .unwrap();
        assert_eq!(id, "0007-cache");
        let doc = SpecDocument::load(dir.path(), &id).unwrap();
        assert_eq!(doc.status().unwrap(), Some(Status::Planning));
        assert_eq!(doc.title(), Some("Cache Layer"));
    }

    #[test]
    fn create_rejects_taken_number_even_in_archive() {
        let dir = TempDir::new().unwrap();
        init(dir.path()).unwrap();
        crate::io::atomic_write(
            &paths::archive_root(dir.path())
                .join("0009-old")
                .join("metadata.json"),
            br#"{"id":"0009-old","status":"completed","type":"feature"}"#,
        )
        .unwrap();

        let err = create(
            dir.path(),
            Some("0009"),
            "new",
            "New",
            IncrementType::Feature,
            Status::Backlog,
        )
        .unwrap_err();
        assert!(matches!(err, IncsyncError::IncrementExists(_)));
    }

    #[test]
    fn create_rejects_non_initial_status() {
        let dir = TempDir::new().unwrap();
        init(dir.path()).unwrap();
        assert!(create(
            dir.path(),
            None,
            "x",
            "X",
            IncrementType::Feature,
            Status::Active
        )
        .is_err());
    }

    #[test]
    fn next_number_skips_archived_numbers() {
        let dir = TempDir::new().unwrap();
        init(dir.path()).unwrap();
        create(
            dir.path(),
            None,
            "one",
            "One",
            IncrementType::Feature,
            Status::Backlog,
        )
        .unwrap();
        crate::io::atomic_write(
            &paths::archive_root(dir.path())
                .join("0005-old")
                .join("metadata.json"),
            br#"{"id":"0005-old","status":"completed","type":"feature"}"#,
        )
        .unwrap();

        assert_eq!(next_number(dir.path()).unwrap(), "0006");
    }

    #[test]
    fn list_reports_task_progress() {
        let dir = TempDir::new().unwrap();
        init(dir.path()).unwrap();
        let id = create(
            dir.path(),
            None,
            "auth",
            "Auth",
            IncrementType::Feature,
            Status::Planning,
        )
        .unwrap();
        crate::io::atomic_write(
            &paths::tasks_path(dir.path(), &id),
            b"- [x] a\n- [ ] b\n",
        )
        .unwrap();

        let rows = list(dir.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tasks.total, 2);
        assert_eq!(rows[0].tasks.completed, 1);
    }
}
