use config_model::ValidationError;
use config_store::StoreError;
use thiserror::Error;

/// Errors surfaced by the configuration manager.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("configuration not found: {0}")]
    NotFound(String),

    /// Load and projection paths pass persistence failures through.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A `set`/`delete` failed; the snapshot was left as it was and the
    /// original cause rides along.
    #[error("configuration write failed for {key}")]
    Write {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ManagerError {
    pub(crate) fn write(key: &str, source: impl Into<anyhow::Error>) -> Self {
        Self::Write {
            key: key.to_string(),
            source: source.into(),
        }
    }
}
