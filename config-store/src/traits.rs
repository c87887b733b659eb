use async_trait::async_trait;
use config_model::{
    ConfigAudit, ConfigCategory, ConfigEntry, ConfigKey, ConfigValue, ConfigVersion, ValueSource,
};

use crate::error::Result;

/// A single write through the store: create, update, or restore, decided by
/// the current state of the key.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub key: ConfigKey,
    pub value: ConfigValue,
    pub category: Option<ConfigCategory>,
    pub note: Option<String>,
    pub source: ValueSource,
    pub user_id: Option<i64>,
    pub create_version: bool,
    pub create_audit: bool,
    /// Value the caller observed before the write, recorded as the audit
    /// row's `old_value`. Forced to `None` when the write creates the entry.
    pub old_value: Option<ConfigValue>,
}

impl SaveRequest {
    pub fn new(key: ConfigKey, value: impl Into<ConfigValue>) -> Self {
        Self {
            key,
            value: value.into(),
            category: None,
            note: None,
            source: ValueSource::Manual,
            user_id: None,
            create_version: true,
            create_audit: true,
            old_value: None,
        }
    }

    pub fn category(mut self, category: ConfigCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn source(mut self, source: ValueSource) -> Self {
        self.source = source;
        self
    }

    pub fn user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn versioned(mut self, create_version: bool) -> Self {
        self.create_version = create_version;
        self
    }

    pub fn audited(mut self, create_audit: bool) -> Self {
        self.create_audit = create_audit;
        self
    }

    pub fn old_value(mut self, value: ConfigValue) -> Self {
        self.old_value = Some(value);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Version,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Ordering for version history queries. Unknown parameter strings fall
/// back to version/descending rather than erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl VersionSort {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn from_params(field: &str, direction: &str) -> Self {
        let field = match field.to_ascii_lowercase().as_str() {
            "created_at" | "createdat" => SortField::CreatedAt,
            _ => SortField::Version,
        };
        let direction = match direction.to_ascii_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            _ => SortDirection::Desc,
        };
        Self { field, direction }
    }
}

/// The persistence port. The only component allowed to mutate stored
/// configuration; every backend guarantees that the entry mutation and its
/// version/audit rows land atomically.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// All active (non-deleted) entries.
    async fn get_all(&self) -> Result<Vec<ConfigEntry>>;

    /// Active entry for `key`. An empty key returns `None` without touching
    /// storage.
    async fn get_by_key(&self, key: &str) -> Result<Option<ConfigEntry>>;

    /// Entry by id; soft-deleted entries only show up when `include_deleted`.
    async fn get_by_id(&self, id: u64, include_deleted: bool) -> Result<Option<ConfigEntry>>;

    /// The core write path: create, update, or restore the key, then record
    /// the version snapshot and audit row inside the same transaction.
    async fn save(&self, req: SaveRequest) -> Result<ConfigEntry>;

    /// Soft-deletes the active entry for `key`. `Ok(false)` when there is no
    /// active entry; that is a no-op, not an error.
    async fn delete_by_key(
        &self,
        key: &str,
        user_id: Option<i64>,
        create_audit: bool,
    ) -> Result<bool>;

    /// Audit trail for an entry, most recent first.
    async fn audits_for(&self, config_id: u64) -> Result<Vec<ConfigAudit>>;

    /// Version history for an entry in the requested order.
    async fn versions_for(&self, config_id: u64, sort: VersionSort) -> Result<Vec<ConfigVersion>>;
}
