use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::ConfigCategory;
use crate::error::ValidationError;
use crate::key::ConfigKey;
use crate::value::ConfigValue;

/// Where a configuration value came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// Entered by hand (console, direct API call).
    #[default]
    Manual,
    /// Imported from the named file.
    File(String),
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => f.write_str("manual"),
            Self::File(name) => f.write_str(name),
        }
    }
}

/// Soft-delete state of an entry. A deleted entry keeps its row and can be
/// reactivated by a later write to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryState {
    Active,
    Deleted { at: DateTime<Utc> },
}

impl EntryState {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn deleted_at(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Active => None,
            Self::Deleted { at } => Some(at),
        }
    }
}

/// A named configuration value as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub id: u64,
    pub key: ConfigKey,
    pub value: ConfigValue,
    pub category: Option<ConfigCategory>,
    pub note: Option<String>,
    pub source: ValueSource,
    pub state: EntryState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An immutable snapshot of an entry at one point in its version sequence.
///
/// Version numbers for a given `config_id` run 1..N with no gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigVersion {
    pub id: u64,
    pub config_id: u64,
    pub version: u32,
    pub key: ConfigKey,
    pub value: ConfigValue,
    pub category: Option<ConfigCategory>,
    pub note: Option<String>,
    /// Acting user; `None` means the system itself.
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// The four actions an audit row can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    Restored,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Restored => "restored",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "updated" => Ok(Self::Updated),
            "deleted" => Ok(Self::Deleted),
            "restored" => Ok(Self::Restored),
            other => Err(ValidationError::UnknownAction(other.to_string())),
        }
    }
}

/// An immutable log record of a single mutating action on an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigAudit {
    pub id: u64,
    pub config_id: u64,
    pub action: AuditAction,
    pub old_value: Option<ConfigValue>,
    pub new_value: Option<ConfigValue>,
    pub user_id: Option<i64>,
    pub source: ValueSource,
    pub created_at: DateTime<Utc>,
}

impl ConfigAudit {
    /// Builds an audit record, enforcing the per-action value invariants:
    /// `Created` carries no prior value, `Deleted` carries no new value.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        config_id: u64,
        action: AuditAction,
        old_value: Option<ConfigValue>,
        new_value: Option<ConfigValue>,
        user_id: Option<i64>,
        source: ValueSource,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        match action {
            AuditAction::Created if old_value.is_some() => Err(ValidationError::InvalidAudit(
                "created entries have no prior value",
            )),
            AuditAction::Deleted if new_value.is_some() => Err(ValidationError::InvalidAudit(
                "deleted entries have no new value",
            )),
            _ => Ok(Self {
                id,
                config_id,
                action,
                old_value,
                new_value,
                user_id,
                source,
                created_at,
            }),
        }
    }
}
