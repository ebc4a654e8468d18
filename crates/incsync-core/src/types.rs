use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// The one place the status string set is defined. Every other module
/// consumes this as a value type; none may redefine the strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Backlog,
    Planning,
    Active,
    Paused,
    Completed,
    Abandoned,
}

impl Status {
    pub fn all() -> &'static [Status] {
        &[
            Status::Backlog,
            Status::Planning,
            Status::Active,
            Status::Paused,
            Status::Completed,
            Status::Abandoned,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Backlog => "backlog",
            Status::Planning => "planning",
            Status::Active => "active",
            Status::Paused => "paused",
            Status::Completed => "completed",
            Status::Abandoned => "abandoned",
        }
    }

    /// Terminal states admit no automatic transition out.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Abandoned)
    }

    /// Priority rank used by duplicate winner selection:
    /// active beats completed beats everything else.
    pub fn rank(self) -> u8 {
        match self {
            Status::Active => 3,
            Status::Completed => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = crate::error::IncsyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(Status::Backlog),
            "planning" => Ok(Status::Planning),
            "active" => Ok(Status::Active),
            "paused" => Ok(Status::Paused),
            "completed" => Ok(Status::Completed),
            "abandoned" => Ok(Status::Abandoned),
            _ => Err(crate::error::IncsyncError::InvalidStatus(s.to_string())),
        }
    }
}

/// Map a legacy status string onto the nearest valid value, if one exists.
/// Only values outside the valid set are considered legacy.
pub fn migrate_legacy_status(raw: &str) -> Option<Status> {
    match raw {
        "planned" => Some(Status::Planning),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// IncrementType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncrementType {
    Feature,
    Bug,
    Hotfix,
    ChangeRequest,
    Refactor,
    Experiment,
}

impl IncrementType {
    pub fn as_str(self) -> &'static str {
        match self {
            IncrementType::Feature => "feature",
            IncrementType::Bug => "bug",
            IncrementType::Hotfix => "hotfix",
            IncrementType::ChangeRequest => "change-request",
            IncrementType::Refactor => "refactor",
            IncrementType::Experiment => "experiment",
        }
    }
}

impl fmt::Display for IncrementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IncrementType {
    type Err = crate::error::IncsyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feature" => Ok(IncrementType::Feature),
            "bug" => Ok(IncrementType::Bug),
            "hotfix" => Ok(IncrementType::Hotfix),
            "change-request" | "change_request" => Ok(IncrementType::ChangeRequest),
            "refactor" => Ok(IncrementType::Refactor),
            "experiment" => Ok(IncrementType::Experiment),
            _ => Err(crate::error::IncsyncError::InvalidType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// TrackerTool
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerTool {
    Github,
    Jira,
    Ado,
}

impl fmt::Display for TrackerTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrackerTool::Github => "github",
            TrackerTool::Jira => "jira",
            TrackerTool::Ado => "ado",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
