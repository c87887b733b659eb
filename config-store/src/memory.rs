//! Embedded in-memory backend.
//!
//! Tables live behind one async mutex. Each write clones the tables,
//! applies the whole mutation to the scratch copy, and swaps it back in only
//! when every step succeeded, so the entry mutation and its version/audit
//! rows commit or roll back together.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use config_model::{
    AuditAction, ConfigAudit, ConfigCategory, ConfigEntry, ConfigKey, ConfigVersion, EntryState,
    ValueSource,
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::audit::{self, Transition};
use crate::codec::{JsonCodec, ValueCodec};
use crate::error::{Result, StoreError};
use crate::traits::{ConfigStore, SaveRequest, SortDirection, SortField, VersionSort};
use crate::version;

#[derive(Clone)]
struct EntryRow {
    id: u64,
    key: String,
    value: Vec<u8>,
    category: Option<ConfigCategory>,
    note: Option<String>,
    source: ValueSource,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone)]
struct VersionRow {
    id: u64,
    config_id: u64,
    version: u32,
    key: String,
    value: Vec<u8>,
    category: Option<ConfigCategory>,
    note: Option<String>,
    user_id: Option<i64>,
    created_at: DateTime<Utc>,
}

#[derive(Clone)]
struct AuditRow {
    id: u64,
    config_id: u64,
    action: AuditAction,
    old_value: Option<Vec<u8>>,
    new_value: Option<Vec<u8>>,
    user_id: Option<i64>,
    source: ValueSource,
    created_at: DateTime<Utc>,
}

#[derive(Clone)]
struct Tables {
    entries: Vec<EntryRow>,
    versions: Vec<VersionRow>,
    audits: Vec<AuditRow>,
    next_entry_id: u64,
    next_version_id: u64,
    next_audit_id: u64,
}

impl Tables {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            versions: Vec::new(),
            audits: Vec::new(),
            next_entry_id: 1,
            next_version_id: 1,
            next_audit_id: 1,
        }
    }

    fn take_entry_id(&mut self) -> u64 {
        let id = self.next_entry_id;
        self.next_entry_id += 1;
        id
    }

    fn take_version_id(&mut self) -> u64 {
        let id = self.next_version_id;
        self.next_version_id += 1;
        id
    }

    fn take_audit_id(&mut self) -> u64 {
        let id = self.next_audit_id;
        self.next_audit_id += 1;
        id
    }
}

/// In-memory [`ConfigStore`] backend.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    codec: Arc<dyn ValueCodec>,
}

impl MemoryStore {
    /// Store with the transparent [`JsonCodec`].
    pub fn new() -> Self {
        Self::with_codec(Arc::new(JsonCodec))
    }

    pub fn with_codec(codec: Arc<dyn ValueCodec>) -> Self {
        Self {
            tables: Mutex::new(Tables::new()),
            codec,
        }
    }

    /// Runs `f` against a scratch copy of the tables and commits the copy
    /// back only when `f` returns `Ok`. An error leaves the tables untouched.
    async fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tables, &dyn ValueCodec) -> Result<T>,
    {
        let mut guard = self.tables.lock().await;
        let mut scratch = guard.clone();
        let out = f(&mut scratch, self.codec.as_ref())?;
        *guard = scratch;
        Ok(out)
    }

    fn entry_from_row(&self, row: &EntryRow) -> Result<ConfigEntry> {
        row_to_entry(row, self.codec.as_ref())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn row_to_entry(row: &EntryRow, codec: &dyn ValueCodec) -> Result<ConfigEntry> {
    Ok(ConfigEntry {
        id: row.id,
        key: ConfigKey::new(row.key.clone())?,
        value: codec.decode(&row.value)?,
        category: row.category,
        note: row.note.clone(),
        source: row.source.clone(),
        state: match row.deleted_at {
            None => EntryState::Active,
            Some(at) => EntryState::Deleted { at },
        },
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn row_to_version(row: &VersionRow, codec: &dyn ValueCodec) -> Result<ConfigVersion> {
    Ok(ConfigVersion {
        id: row.id,
        config_id: row.config_id,
        version: row.version,
        key: ConfigKey::new(row.key.clone())?,
        value: codec.decode(&row.value)?,
        category: row.category,
        note: row.note.clone(),
        user_id: row.user_id,
        created_at: row.created_at,
    })
}

fn row_to_audit(row: &AuditRow, codec: &dyn ValueCodec) -> Result<ConfigAudit> {
    Ok(ConfigAudit {
        id: row.id,
        config_id: row.config_id,
        action: row.action,
        old_value: row.old_value.as_ref().map(|v| codec.decode(v)).transpose()?,
        new_value: row.new_value.as_ref().map(|v| codec.decode(v)).transpose()?,
        user_id: row.user_id,
        source: row.source.clone(),
        created_at: row.created_at,
    })
}

fn audit_to_row(audit: &ConfigAudit, codec: &dyn ValueCodec) -> Result<AuditRow> {
    Ok(AuditRow {
        id: audit.id,
        config_id: audit.config_id,
        action: audit.action,
        old_value: audit
            .old_value
            .as_ref()
            .map(|v| codec.encode(v))
            .transpose()?,
        new_value: audit
            .new_value
            .as_ref()
            .map(|v| codec.encode(v))
            .transpose()?,
        user_id: audit.user_id,
        source: audit.source.clone(),
        created_at: audit.created_at,
    })
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get_all(&self) -> Result<Vec<ConfigEntry>> {
        let tables = self.tables.lock().await;
        tables
            .entries
            .iter()
            .filter(|r| r.deleted_at.is_none())
            .map(|r| row_to_entry(r, self.codec.as_ref()))
            .collect()
    }

    async fn get_by_key(&self, key: &str) -> Result<Option<ConfigEntry>> {
        if key.is_empty() {
            return Ok(None);
        }
        let tables = self.tables.lock().await;
        tables
            .entries
            .iter()
            .find(|r| r.key == key && r.deleted_at.is_none())
            .map(|r| row_to_entry(r, self.codec.as_ref()))
            .transpose()
    }

    async fn get_by_id(&self, id: u64, include_deleted: bool) -> Result<Option<ConfigEntry>> {
        let tables = self.tables.lock().await;
        tables
            .entries
            .iter()
            .find(|r| r.id == id && (include_deleted || r.deleted_at.is_none()))
            .map(|r| row_to_entry(r, self.codec.as_ref()))
            .transpose()
    }

    async fn save(&self, req: SaveRequest) -> Result<ConfigEntry> {
        let row = self
            .transaction(|tables, codec| {
                let now = Utc::now();
                let encoded = codec.encode(&req.value)?;

                let idx = tables
                    .entries
                    .iter()
                    .position(|r| r.key == req.key.as_str());
                let (entry_id, transition) = match idx {
                    None => {
                        let id = tables.take_entry_id();
                        tables.entries.push(EntryRow {
                            id,
                            key: req.key.to_string(),
                            value: encoded.clone(),
                            category: req.category,
                            note: req.note.clone(),
                            source: req.source.clone(),
                            deleted_at: None,
                            created_at: now,
                            updated_at: now,
                        });
                        (id, Transition::Created)
                    }
                    Some(i) => {
                        let was_deleted = tables.entries[i].deleted_at.is_some();
                        let row = &mut tables.entries[i];
                        row.deleted_at = None;
                        row.value = encoded.clone();
                        row.category = req.category;
                        row.note = req.note.clone();
                        row.source = req.source.clone();
                        row.updated_at = now;
                        let transition = if was_deleted {
                            Transition::Restored
                        } else {
                            Transition::Updated
                        };
                        (row.id, transition)
                    }
                };

                if req.create_version {
                    let next = version::next_version(
                        entry_id,
                        tables
                            .versions
                            .iter()
                            .filter(|v| v.config_id == entry_id)
                            .map(|v| v.version),
                    )?;
                    version::check_unique(
                        entry_id,
                        next,
                        tables
                            .versions
                            .iter()
                            .filter(|v| v.config_id == entry_id)
                            .map(|v| v.version),
                    )?;
                    let id = tables.take_version_id();
                    tables.versions.push(VersionRow {
                        id,
                        config_id: entry_id,
                        version: next,
                        key: req.key.to_string(),
                        value: encoded.clone(),
                        category: req.category,
                        note: req.note.clone(),
                        user_id: req.user_id,
                        created_at: now,
                    });
                }

                if req.create_audit {
                    let id = tables.take_audit_id();
                    let audit = audit::record(
                        id,
                        entry_id,
                        transition,
                        req.old_value.clone(),
                        Some(req.value.clone()),
                        req.user_id,
                        req.source.clone(),
                    )?;
                    tables.audits.push(audit_to_row(&audit, codec)?);
                }

                debug!(key = %req.key, action = %transition.action(), "configuration saved");
                tables
                    .entries
                    .iter()
                    .find(|r| r.id == entry_id)
                    .cloned()
                    .ok_or_else(|| StoreError::NotFound(req.key.to_string()))
            })
            .await?;
        self.entry_from_row(&row)
    }

    async fn delete_by_key(
        &self,
        key: &str,
        user_id: Option<i64>,
        create_audit: bool,
    ) -> Result<bool> {
        if key.is_empty() {
            return Ok(false);
        }
        self.transaction(|tables, codec| {
            let Some(i) = tables
                .entries
                .iter()
                .position(|r| r.key == key && r.deleted_at.is_none())
            else {
                return Ok(false);
            };

            let now = Utc::now();
            let old_value = codec.decode(&tables.entries[i].value)?;
            let config_id = tables.entries[i].id;
            let source = tables.entries[i].source.clone();
            tables.entries[i].deleted_at = Some(now);
            tables.entries[i].updated_at = now;

            if create_audit {
                let id = tables.take_audit_id();
                let audit = audit::record(
                    id,
                    config_id,
                    Transition::Deleted,
                    Some(old_value),
                    None,
                    user_id,
                    source,
                )?;
                tables.audits.push(audit_to_row(&audit, codec)?);
            }

            debug!(key, "configuration soft-deleted");
            Ok(true)
        })
        .await
    }

    async fn audits_for(&self, config_id: u64) -> Result<Vec<ConfigAudit>> {
        let tables = self.tables.lock().await;
        let mut audits = tables
            .audits
            .iter()
            .filter(|r| r.config_id == config_id)
            .map(|r| row_to_audit(r, self.codec.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        audits.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(audits)
    }

    async fn versions_for(&self, config_id: u64, sort: VersionSort) -> Result<Vec<ConfigVersion>> {
        let tables = self.tables.lock().await;
        let mut versions = tables
            .versions
            .iter()
            .filter(|r| r.config_id == config_id)
            .map(|r| row_to_version(r, self.codec.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        match sort.field {
            SortField::Version => versions.sort_by_key(|v| v.version),
            SortField::CreatedAt => versions.sort_by_key(|v| (v.created_at, v.id)),
        }
        if sort.direction == SortDirection::Desc {
            versions.reverse();
        }
        Ok(versions)
    }
}
