//! The configuration manager: in-memory reads, write-through mutations, and
//! the cache refresh protocol.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};

use config_model::{
    ConfigAudit, ConfigCategory, ConfigEntry, ConfigKey, ConfigValue, ConfigVersion, ValueSource,
};
use config_store::{ConfigStore, SaveRequest, VersionSort};

use crate::cache::ConfigCache;
use crate::error::ManagerError;
use crate::settings::ManagerSettings;

/// One snapshot slot: the value and the category it was filed under. Also
/// the per-key shape of the cache blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub value: ConfigValue,
    pub category: Option<ConfigCategory>,
}

/// Options for a [`ConfigManager::set`] call.
#[derive(Debug, Clone)]
pub struct SetOptions {
    pub category: Option<ConfigCategory>,
    pub user_id: Option<i64>,
    pub source: ValueSource,
    /// Record a version snapshot for this write.
    pub version: bool,
    /// Record an audit row for this write.
    pub audit: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            category: None,
            user_id: None,
            source: ValueSource::Manual,
            version: true,
            audit: true,
        }
    }
}

/// Row shape for configuration listing surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayEntry {
    pub id: u64,
    pub key: String,
    pub value: ConfigValue,
    pub category: Option<ConfigCategory>,
    pub category_label: String,
    pub source: String,
    pub updated_at: DateTime<Utc>,
    pub version_count: usize,
    pub audit_count: usize,
}

/// An entry together with its version history, for edit surfaces.
#[derive(Debug, Clone)]
pub struct EditView {
    pub entry: ConfigEntry,
    pub versions: Vec<ConfigVersion>,
}

/// An entry together with its audit trail.
#[derive(Debug, Clone)]
pub struct AuditView {
    pub entry: ConfigEntry,
    pub audits: Vec<ConfigAudit>,
}

/// The single in-process authority for configuration reads.
///
/// Reads come straight out of the snapshot, no I/O and no failure path.
/// Writes go through the store first; the snapshot and the external cache
/// only move after the store commit, so a failed write leaves both exactly
/// as they were. One instance per process, owned by the application's
/// dependency graph; mutating methods take `&mut self`, which is all the
/// in-process locking a single-threaded owner needs.
pub struct ConfigManager {
    store: Arc<dyn ConfigStore>,
    cache: Arc<dyn ConfigCache>,
    settings: ManagerSettings,
    environment: HashMap<String, String>,
    snapshot: HashMap<ConfigKey, SnapshotEntry>,
}

impl ConfigManager {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        cache: Arc<dyn ConfigCache>,
        settings: ManagerSettings,
    ) -> Self {
        let environment = if settings.load_environment {
            std::env::vars()
                .filter(|(name, _)| config_model::validate_key(name).is_ok())
                .collect()
        } else {
            HashMap::new()
        };
        Self {
            store,
            cache,
            settings,
            environment,
            snapshot: HashMap::new(),
        }
    }

    /// Replaces the environment overlay wholesale. Tests inject fixed maps
    /// here; callers embedding the manager can scope it down.
    pub fn with_environment(mut self, environment: HashMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    /// Value for `key`, or `None` when not loaded. Never touches the store
    /// or cache.
    pub fn get(&self, key: &str) -> Option<ConfigValue> {
        match self.snapshot.get(key) {
            Some(slot) => Some(slot.value.clone()),
            None => {
                trace!(key, "configuration miss");
                None
            }
        }
    }

    /// Like [`get`](Self::get), with a fallback.
    pub fn get_or(&self, key: &str, default: ConfigValue) -> ConfigValue {
        self.get(key).unwrap_or(default)
    }

    pub fn has(&self, key: &str) -> bool {
        self.snapshot.contains_key(key)
    }

    /// Flat key-to-value projection of the snapshot.
    pub fn all(&self) -> HashMap<String, ConfigValue> {
        self.snapshot
            .iter()
            .map(|(k, slot)| (k.to_string(), slot.value.clone()))
            .collect()
    }

    /// Writes `key` through the store, then brings the snapshot and the
    /// cached blob up to date. The snapshot is only touched after the store
    /// commit succeeds.
    #[instrument(skip(self, value, opts))]
    pub async fn set(
        &mut self,
        key: &str,
        value: ConfigValue,
        opts: SetOptions,
    ) -> Result<(), ManagerError> {
        let key = ConfigKey::new(key)?;
        let old_value = self.snapshot.get(key.as_str()).map(|slot| slot.value.clone());

        let mut req = SaveRequest::new(key.clone(), value.clone())
            .source(opts.source)
            .versioned(opts.version)
            .audited(opts.audit);
        if let Some(category) = opts.category {
            req = req.category(category);
        }
        if let Some(user) = opts.user_id {
            req = req.user(user);
        }
        if let Some(old) = old_value {
            req = req.old_value(old);
        }

        self.store
            .save(req)
            .await
            .map_err(|e| ManagerError::write(key.as_str(), e))?;

        self.snapshot.insert(
            key.clone(),
            SnapshotEntry {
                value,
                category: opts.category,
            },
        );
        self.refresh_cache(Some(&key)).await;
        info!(key = %key, "configuration set");
        Ok(())
    }

    /// Soft-deletes `key`. Returns whether the store had an active entry;
    /// either way the snapshot and cache stop serving the key, so "present"
    /// stays consistent even when the store had already lost track of it.
    #[instrument(skip(self))]
    pub async fn delete(
        &mut self,
        key: &str,
        user_id: Option<i64>,
        audit: bool,
    ) -> Result<bool, ManagerError> {
        let key = ConfigKey::new(key)?;
        let removed = self
            .store
            .delete_by_key(key.as_str(), user_id, audit)
            .await
            .map_err(|e| ManagerError::write(key.as_str(), e))?;
        if !removed {
            debug!(key = %key, "no active entry to delete");
        }

        self.snapshot.remove(key.as_str());
        self.refresh_cache(Some(&key)).await;
        info!(key = %key, removed, "configuration deleted");
        Ok(removed)
    }

    /// Populates the snapshot: from the cache when enabled and readable,
    /// otherwise from the store merged with the process environment (store
    /// wins on conflict), writing the merged result back to the cache.
    #[instrument(skip(self))]
    pub async fn load_config(&mut self) -> Result<(), ManagerError> {
        if self.settings.cache_enabled {
            match self.cache.get(&self.settings.cache_key).await {
                Ok(Some(raw)) => match decode_snapshot(&raw) {
                    Ok(snapshot) => {
                        self.snapshot = snapshot;
                        info!(entries = self.snapshot.len(), "configuration loaded from cache");
                        return Ok(());
                    }
                    Err(e) => warn!(error = %e, "cached configuration unreadable, rebuilding"),
                },
                Ok(None) => debug!("configuration cache miss"),
                Err(e) => warn!(error = %e, "cache read failed, rebuilding"),
            }
        }

        self.snapshot = self.build_from_source().await?;
        if self.settings.cache_enabled {
            self.write_cache_blob(&self.snapshot).await;
        }
        info!(entries = self.snapshot.len(), "configuration loaded from store");
        Ok(())
    }

    /// Rebuilds the snapshot from store + environment, bypassing any cache
    /// read. With `invalidate_cache`, also evicts the cached blob so other
    /// consumers rebuild from source on their next load.
    #[instrument(skip(self))]
    pub async fn reload(&mut self, invalidate_cache: bool) -> Result<(), ManagerError> {
        self.snapshot = self.build_from_source().await?;
        if invalidate_cache && self.settings.cache_enabled {
            if let Err(e) = self.cache.forget(&self.settings.cache_key).await {
                warn!(error = %e, "cache invalidation failed");
            }
        }
        info!(entries = self.snapshot.len(), "configuration reloaded");
        Ok(())
    }

    /// Brings the external cache in line with the snapshot.
    ///
    /// With a key: read-patch-write of that single slot, no lock taken.
    /// Without: full rebuild from store + environment under the advisory
    /// lock, skipped entirely when the lock is contended. Cache trouble is
    /// logged and swallowed; the snapshot stays authoritative either way.
    pub async fn refresh_cache(&self, key: Option<&ConfigKey>) {
        if !self.settings.cache_enabled {
            return;
        }
        match key {
            Some(key) => self.refresh_single(key).await,
            None => self.refresh_full().await,
        }
    }

    async fn refresh_single(&self, key: &ConfigKey) {
        let mut cached = match self.cache.get(&self.settings.cache_key).await {
            Ok(Some(raw)) => match decode_snapshot(&raw) {
                Ok(cached) => cached,
                Err(e) => {
                    warn!(error = %e, "cached configuration unreadable, rewriting from empty");
                    HashMap::new()
                }
            },
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!(error = %e, "cache read failed during refresh");
                HashMap::new()
            }
        };

        match self.snapshot.get(key.as_str()) {
            Some(slot) => {
                cached.insert(key.clone(), slot.clone());
            }
            None => {
                cached.remove(key.as_str());
            }
        }
        self.write_cache_blob(&cached).await;
        debug!(key = %key, "cache refreshed incrementally");
    }

    async fn refresh_full(&self) {
        let lock_key = self.settings.lock_key();
        let lock = match self
            .cache
            .try_lock(&lock_key, self.settings.lock_timeout)
            .await
        {
            Ok(Some(lock)) => lock,
            Ok(None) => {
                warn!("full cache refresh skipped, lock held elsewhere");
                return;
            }
            Err(e) => {
                warn!(error = %e, "full cache refresh skipped, lock unavailable");
                return;
            }
        };

        match self.build_from_source().await {
            Ok(rebuilt) => {
                self.write_cache_blob(&rebuilt).await;
                info!(entries = rebuilt.len(), "cache fully refreshed");
            }
            Err(e) => warn!(error = %e, "full cache refresh failed to rebuild"),
        }
        drop(lock);
    }

    /// Entries from the store overlaid with environment variables;
    /// environment only fills keys the store does not have.
    async fn build_from_source(
        &self,
    ) -> Result<HashMap<ConfigKey, SnapshotEntry>, ManagerError> {
        let entries = self.store.get_all().await?;
        let mut snapshot: HashMap<ConfigKey, SnapshotEntry> = entries
            .into_iter()
            .map(|entry| {
                (
                    entry.key,
                    SnapshotEntry {
                        value: entry.value,
                        category: entry.category,
                    },
                )
            })
            .collect();

        for (name, value) in &self.environment {
            let Ok(key) = ConfigKey::new(name.clone()) else {
                continue;
            };
            snapshot.entry(key).or_insert_with(|| SnapshotEntry {
                value: ConfigValue::String(value.clone()),
                category: None,
            });
        }
        Ok(snapshot)
    }

    async fn write_cache_blob(&self, snapshot: &HashMap<ConfigKey, SnapshotEntry>) {
        let raw = match serde_json::to_vec(snapshot) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "snapshot serialization failed");
                return;
            }
        };
        if let Err(e) = self
            .cache
            .put(&self.settings.cache_key, raw, self.settings.cache_ttl)
            .await
        {
            warn!(error = %e, "cache write failed");
        }
    }

    /// All active entries with their category labels and history counts.
    pub async fn list_for_display(&self) -> Result<Vec<DisplayEntry>, ManagerError> {
        let entries = self.store.get_all().await?;
        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            // A failing side query hides the counts, not the entry.
            let version_count = match self
                .store
                .versions_for(entry.id, VersionSort::default())
                .await
            {
                Ok(versions) => versions.len(),
                Err(e) => {
                    warn!(id = entry.id, error = %e, "version count unavailable");
                    0
                }
            };
            let audit_count = match self.store.audits_for(entry.id).await {
                Ok(audits) => audits.len(),
                Err(e) => {
                    warn!(id = entry.id, error = %e, "audit count unavailable");
                    0
                }
            };
            rows.push(DisplayEntry {
                id: entry.id,
                key: entry.key.to_string(),
                value: entry.value,
                category: entry.category,
                category_label: entry
                    .category
                    .map_or("Uncategorized", ConfigCategory::label)
                    .to_string(),
                source: entry.source.to_string(),
                updated_at: entry.updated_at,
                version_count,
                audit_count,
            });
        }
        Ok(rows)
    }

    /// Entry (live or soft-deleted) plus its version history.
    pub async fn find_for_edit(&self, id: u64) -> Result<EditView, ManagerError> {
        let entry = self
            .store
            .get_by_id(id, true)
            .await?
            .ok_or_else(|| ManagerError::NotFound(format!("config id {id}")))?;
        let versions = self.store.versions_for(id, VersionSort::default()).await?;
        Ok(EditView { entry, versions })
    }

    /// Entry (live or soft-deleted) plus its audit trail, most recent first.
    pub async fn find_for_audit(&self, id: u64) -> Result<AuditView, ManagerError> {
        let entry = self
            .store
            .get_by_id(id, true)
            .await?
            .ok_or_else(|| ManagerError::NotFound(format!("config id {id}")))?;
        let audits = self.store.audits_for(id).await?;
        Ok(AuditView { entry, audits })
    }
}

fn decode_snapshot(raw: &[u8]) -> serde_json::Result<HashMap<ConfigKey, SnapshotEntry>> {
    serde_json::from_slice(raw)
}
