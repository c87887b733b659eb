//! The in-process configuration authority.
//!
//! [`ConfigManager`] serves every read from its in-memory snapshot and pushes
//! every write through the persistence port before touching that snapshot or
//! the external cache. The cache itself is a port ([`ConfigCache`]) with a
//! TTL'd key-value surface and advisory locks; [`MemoryCache`] is the
//! in-process implementation.
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod cache;
mod error;
mod manager;
mod settings;

#[cfg(test)]
mod tests;

pub use cache::{CacheLock, ConfigCache, MemoryCache};
pub use error::ManagerError;
pub use manager::{
    AuditView, ConfigManager, DisplayEntry, EditView, SetOptions, SnapshotEntry,
};
pub use settings::{ManagerSettings, DEFAULT_CACHE_KEY};
