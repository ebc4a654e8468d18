use crate::error::{IncsyncError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const INCSYNC_DIR: &str = ".incsync";
pub const INCREMENTS_DIR: &str = ".incsync/increments";
pub const CONFIG_FILE: &str = ".incsync/config.yaml";

/// Sibling directories under the increments root that hold historical
/// copies. Order matters: it is the location precedence used by
/// duplicate resolution (active root first).
pub const ARCHIVE_DIR: &str = "_archive";
pub const ABANDONED_DIR: &str = "_abandoned";

pub const METADATA_FILE: &str = "metadata.json";
pub const SPEC_FILE: &str = "spec.md";
pub const TASKS_FILE: &str = "tasks.md";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn increments_root(root: &Path) -> PathBuf {
    root.join(INCREMENTS_DIR)
}

pub fn archive_root(root: &Path) -> PathBuf {
    increments_root(root).join(ARCHIVE_DIR)
}

pub fn abandoned_root(root: &Path) -> PathBuf {
    increments_root(root).join(ABANDONED_DIR)
}

pub fn increment_dir(root: &Path, id: &str) -> PathBuf {
    increments_root(root).join(id)
}

pub fn metadata_path(root: &Path, id: &str) -> PathBuf {
    increment_dir(root, id).join(METADATA_FILE)
}

pub fn spec_path(root: &Path, id: &str) -> PathBuf {
    increment_dir(root, id).join(SPEC_FILE)
}

pub fn tasks_path(root: &Path, id: &str) -> PathBuf {
    increment_dir(root, id).join(TASKS_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// Increment id handling
// ---------------------------------------------------------------------------

static ID_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^(\d{4})-[a-z0-9][a-z0-9\-]*$").unwrap())
}

pub fn validate_id(id: &str) -> Result<()> {
    if id.len() > 80 || !id_re().is_match(id) {
        return Err(IncsyncError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Extract the 4-digit sequence prefix from a directory name, if it
/// matches the increment naming pattern.
pub fn extract_number(name: &str) -> Option<&str> {
    id_re().captures(name).map(|c| c.get(1).unwrap().as_str())
}

/// Normalize an increment number for comparison: leading zeros stripped.
/// "0009", "009" and "9" all normalize to "9".
pub fn normalize_number(number: &str) -> String {
    let trimmed = number.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Canonical 4-digit zero-padded display form.
pub fn display_number(number: &str) -> String {
    format!("{:0>4}", normalize_number(number))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ids() {
        for id in ["0001-auth-login", "0047-us-task-linkage", "9999-x"] {
            validate_id(id).unwrap_or_else(|_| panic!("expected valid: {id}"));
        }
    }

    #[test]
    fn invalid_ids() {
        for id in [
            "",
            "001-too-short",
            "00001-too-long",
            "0001",
            "0001-",
            "0001-UPPER",
            "abcd-no-number",
            "0001 spaces",
        ] {
            assert!(validate_id(id).is_err(), "expected invalid: {id}");
        }
    }

    #[test]
    fn extract_number_matches_pattern_only() {
        assert_eq!(extract_number("0009-cache-layer"), Some("0009"));
        assert_eq!(extract_number("_archive"), None);
        assert_eq!(extract_number("templates"), None);
        assert_eq!(extract_number(".hidden"), None);
    }

    #[test]
    fn number_normalization() {
        assert_eq!(normalize_number("0009"), "9");
        assert_eq!(normalize_number("0000"), "0");
        assert_eq!(normalize_number("0120"), "120");
        assert_eq!(display_number("9"), "0009");
        assert_eq!(display_number("0009"), "0009");
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            metadata_path(root, "0001-auth"),
            PathBuf::from("/tmp/proj/.incsync/increments/0001-auth/metadata.json")
        );
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.incsync/config.yaml")
        );
        assert_eq!(
            archive_root(root),
            PathBuf::from("/tmp/proj/.incsync/increments/_archive")
        );
    }
}
