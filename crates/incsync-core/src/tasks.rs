use crate::error::Result;
use crate::paths;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Checkbox grammar for the task list document:
/// `- [ ]` pending, `- [~]` in progress, `- [x]` complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
}

impl TaskStats {
    pub fn all_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }

    pub fn any_in_progress(&self) -> bool {
        self.in_progress > 0
    }
}

static CHECKBOX_RE: OnceLock<Regex> = OnceLock::new();

fn checkbox_re() -> &'static Regex {
    CHECKBOX_RE.get_or_init(|| Regex::new(r"(?m)^\s*[-*]\s+\[([ xX~])\]").unwrap())
}

pub fn parse(content: &str) -> TaskStats {
    let mut stats = TaskStats::default();
    for cap in checkbox_re().captures_iter(content) {
        stats.total += 1;
        match &cap[1] {
            "x" | "X" => stats.completed += 1,
            "~" => stats.in_progress += 1,
            _ => {}
        }
    }
    stats
}

pub fn exists(root: &Path, id: &str) -> bool {
    paths::tasks_path(root, id).exists()
}

/// Stats for an increment's task list. A missing document counts as an
/// empty list, not an error.
pub fn stats(root: &Path, id: &str) -> Result<TaskStats> {
    let path = paths::tasks_path(root, id);
    if !path.exists() {
        return Ok(TaskStats::default());
    }
    let content = std::fs::read_to_string(&path)?;
    Ok(parse(&content))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
