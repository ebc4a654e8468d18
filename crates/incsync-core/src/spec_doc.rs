use crate::error::{IncsyncError, Result};
use crate::paths;
use crate::types::{IncrementType, Status};
use chrono::Utc;
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// The human-editable spec document: a YAML header block delimited by
/// `---` lines, followed by free-form markdown.
///
/// The header is parsed into a full document model and re-serialized on
/// write. Mutating one field never touches the markdown body and never
/// regex-edits the header in place.
#[derive(Debug, Clone)]
pub struct SpecDocument {
    header: Mapping,
    body: String,
}

impl SpecDocument {
    /// Build a fresh spec document with the minimal required header.
    pub fn new(
        id: &str,
        title: &str,
        increment_type: IncrementType,
        status: Status,
    ) -> Self {
        let mut header = Mapping::new();
        header.insert(Value::from("increment"), Value::from(id));
        header.insert(Value::from("title"), Value::from(title));
        header.insert(Value::from("type"), Value::from(increment_type.as_str()));
        header.insert(Value::from("priority"), Value::from("medium"));
        header.insert(Value::from("status"), Value::from(status.as_str()));
        header.insert(
            Value::from("created"),
            Value::from(Utc::now().format("%Y-%m-%d").to_string()),
        );
        Self {
            header,
            body: format!("\n# {title}\n"),
        }
    }

    pub fn exists(root: &Path, id: &str) -> bool {
        paths::spec_path(root, id).exists()
    }

    pub fn load(root: &Path, id: &str) -> Result<Self> {
        let path = paths::spec_path(root, id);
        if !path.exists() {
            return Err(IncsyncError::MissingFile {
                id: id.to_string(),
                store: "spec.md",
            });
        }
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content).map_err(|detail| IncsyncError::InvalidRecord {
            id: id.to_string(),
            detail,
        })
    }

    pub fn save(&self, root: &Path, id: &str) -> Result<()> {
        let path = paths::spec_path(root, id);
        crate::io::atomic_write(&path, self.render()?.as_bytes())
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        let rest = content
            .strip_prefix("---\n")
            .or_else(|| content.strip_prefix("---\r\n"))
            .ok_or_else(|| "missing YAML header block".to_string())?;

        let end = rest
            .find("\n---\n")
            .map(|i| (i + 1, i + 5))
            .or_else(|| rest.find("\n---\r\n").map(|i| (i + 1, i + 6)))
            .ok_or_else(|| "unterminated YAML header block".to_string())?;

        let header: Mapping =
            serde_yaml::from_str(&rest[..end.0]).map_err(|e| e.to_string())?;
        let body = rest[end.1..].to_string();
        Ok(Self { header, body })
    }

    fn render(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(&self.header)?;
        Ok(format!("---\n{yaml}---\n{}", self.body))
    }

    /// The raw status string as written in the header, if present.
    /// Desync comparison works on raw values so that legacy strings are
    /// visible rather than rejected.
    pub fn raw_status(&self) -> Option<String> {
        self.header
            .get(Value::from("status"))
            .and_then(|v| v.as_str())
            .map(String::from)
    }

    pub fn status(&self) -> Result<Option<Status>> {
        match self.raw_status() {
            Some(raw) => raw.parse().map(Some),
            None => Ok(None),
        }
    }

    /// Overwrite only the `status` header field. All other header fields
    /// and the entire body are preserved.
    pub fn set_status(&mut self, status: Status) {
        self.header
            .insert(Value::from("status"), Value::from(status.as_str()));
    }

    pub fn title(&self) -> Option<&str> {
        self.header
            .get(Value::from("title"))
            .and_then(|v| v.as_str())
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
