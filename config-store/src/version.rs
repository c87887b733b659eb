//! Version numbering for configuration entries.
//!
//! Numbers are assigned as `max(existing) + 1`, starting at 1, and must stay
//! unique per entry. Both the computation and the uniqueness check run
//! inside the caller's write transaction, so two writers racing on the same
//! entry cannot both commit the same number.

use crate::error::{Result, StoreError};

/// Next version for the entry: `max(existing) + 1`, or 1 with no history.
pub(crate) fn next_version<I>(config_id: u64, existing: I) -> Result<u32>
where
    I: IntoIterator<Item = u32>,
{
    if config_id == 0 {
        return Err(StoreError::InvalidId(config_id));
    }
    Ok(existing.into_iter().max().unwrap_or(0) + 1)
}

/// Enforces the unique `(config_id, version)` constraint before an insert.
pub(crate) fn check_unique<I>(config_id: u64, version: u32, existing: I) -> Result<()>
where
    I: IntoIterator<Item = u32>,
{
    if existing.into_iter().any(|v| v == version) {
        return Err(StoreError::DuplicateVersion { config_id, version });
    }
    Ok(())
}
