use config_model::ValidationError;
use thiserror::Error;

/// Errors surfaced by the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Uniqueness violation on insert: another writer created the key first.
    #[error("configuration key already exists: {0}")]
    DuplicateKey(String),

    /// The `(config_id, version)` constraint caught two writers computing
    /// the same next version. Retrying recomputes a fresh number.
    #[error("version {version} already recorded for config {config_id}")]
    DuplicateVersion { config_id: u64, version: u32 },

    #[error("invalid config id: {0}")]
    InvalidId(u64),

    #[error("configuration not found: {0}")]
    NotFound(String),

    #[error("value codec error: {0}")]
    Codec(String),

    /// Any other storage failure, with the underlying cause attached.
    #[error("storage backend error")]
    Backend(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Conflict errors are worth a retry with fresh state; the rest are not.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::DuplicateKey(_) | StoreError::DuplicateVersion { .. }
        )
    }
}
