//! Key-value cache port with TTL expiry and advisory locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;

/// External cache the manager mirrors its snapshot into. Implementations
/// wrap whatever shared store the deployment uses; [`MemoryCache`] covers
/// single-process setups and tests.
#[async_trait]
pub trait ConfigCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    async fn forget(&self, key: &str) -> Result<()>;

    /// Attempts to take the advisory lock named `key` without blocking.
    ///
    /// Returns `None` when somebody else holds it. A held lock expires after
    /// `hold`, so a crashed holder cannot wedge other processes forever.
    async fn try_lock(&self, key: &str, hold: Duration) -> Result<Option<CacheLock>>;
}

/// Guard for an advisory cache lock; the lock is released when the guard is
/// dropped, whichever way the holding scope exits.
pub struct CacheLock {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl CacheLock {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

struct ValueSlot {
    value: Vec<u8>,
    expires_at: Instant,
}

struct LockSlot {
    token: u64,
    expires_at: Instant,
}

#[derive(Default)]
struct CacheTables {
    values: HashMap<String, ValueSlot>,
    locks: HashMap<String, LockSlot>,
    next_token: u64,
}

/// In-process [`ConfigCache`] with lazy TTL expiry.
#[derive(Default)]
pub struct MemoryCache {
    inner: Arc<Mutex<CacheTables>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut tables = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match tables.values.get(key) {
            Some(slot) if slot.expires_at > Instant::now() => Ok(Some(slot.value.clone())),
            Some(_) => {
                tables.values.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut tables = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        tables.values.insert(
            key.to_string(),
            ValueSlot {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<()> {
        let mut tables = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        tables.values.remove(key);
        Ok(())
    }

    async fn try_lock(&self, key: &str, hold: Duration) -> Result<Option<CacheLock>> {
        let mut tables = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        if let Some(slot) = tables.locks.get(key) {
            if slot.expires_at > now {
                return Ok(None);
            }
        }

        let token = tables.next_token;
        tables.next_token += 1;
        tables.locks.insert(
            key.to_string(),
            LockSlot {
                token,
                expires_at: now + hold,
            },
        );

        let inner = Arc::clone(&self.inner);
        let key = key.to_string();
        Ok(Some(CacheLock::new(move || {
            let mut tables = inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Only remove the lock if it is still ours; an expired lock may
            // have been re-acquired by someone else in the meantime.
            if tables.locks.get(&key).is_some_and(|slot| slot.token == token) {
                tables.locks.remove(&key);
            }
        })))
    }
}
