use thiserror::Error;

#[derive(Debug, Error)]
pub enum IncsyncError {
    #[error("not initialized: run 'incsync init'")]
    NotInitialized,

    #[error("increment already exists: {0}")]
    IncrementExists(String),

    #[error("invalid increment id '{0}': expected NNNN-slug (4-digit number, lowercase slug)")]
    InvalidId(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid increment type: {0}")]
    InvalidType(String),

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("{store} missing for increment {id}")]
    MissingFile { id: String, store: &'static str },

    #[error("unreadable record for increment {id}: {detail}")]
    InvalidRecord { id: String, detail: String },

    #[error(
        "status desync for {id}: metadata.json={metadata}, spec.md={spec} — \
         run 'incsync check {id} --fix' before retrying"
    )]
    StatusMismatch {
        id: String,
        metadata: String,
        spec: String,
    },

    #[error("permission denied: operation requires {permission}=true in sync settings")]
    PermissionDenied { permission: &'static str },

    #[error("invalid sync settings: {0}")]
    InvalidSyncSettings(String),

    #[error(
        "structural config error: incrementToLivingDocs is immutable and must be \"one-way\", got \"{0}\""
    )]
    StructuralConfig(String),

    #[error("external tracker error: {0}")]
    Tracker(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IncsyncError>;
