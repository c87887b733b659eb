//! Audit recording for configuration mutations.
//!
//! Every mutating operation maps to exactly one of the four audit actions;
//! the recorder normalizes the before/after values for the action and leans
//! on [`ConfigAudit::new`] for the per-action invariants.

use chrono::Utc;
use config_model::{AuditAction, ConfigAudit, ConfigValue, ValueSource};

use crate::error::Result;

/// How a write changed the entry's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Created,
    Updated,
    Restored,
    Deleted,
}

impl Transition {
    pub(crate) fn action(self) -> AuditAction {
        match self {
            Self::Created => AuditAction::Created,
            Self::Updated => AuditAction::Updated,
            Self::Restored => AuditAction::Restored,
            Self::Deleted => AuditAction::Deleted,
        }
    }
}

/// Builds the audit record for one transition.
///
/// A freshly created entry has no prior value no matter what the caller
/// passed along, so `old_value` is dropped for `Created`.
pub(crate) fn record(
    id: u64,
    config_id: u64,
    transition: Transition,
    old_value: Option<ConfigValue>,
    new_value: Option<ConfigValue>,
    user_id: Option<i64>,
    source: ValueSource,
) -> Result<ConfigAudit> {
    let old_value = match transition {
        Transition::Created => None,
        _ => old_value,
    };
    ConfigAudit::new(
        id,
        config_id,
        transition.action(),
        old_value,
        new_value,
        user_id,
        source,
        Utc::now(),
    )
    .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_drops_caller_old_value() {
        let audit = record(
            1,
            1,
            Transition::Created,
            Some(ConfigValue::from("stale")),
            Some(ConfigValue::from("fresh")),
            None,
            ValueSource::Manual,
        )
        .unwrap();
        assert_eq!(audit.action, AuditAction::Created);
        assert_eq!(audit.old_value, None);
        assert_eq!(audit.new_value, Some(ConfigValue::from("fresh")));
    }

    #[test]
    fn test_transition_actions() {
        assert_eq!(Transition::Created.action(), AuditAction::Created);
        assert_eq!(Transition::Updated.action(), AuditAction::Updated);
        assert_eq!(Transition::Restored.action(), AuditAction::Restored);
        assert_eq!(Transition::Deleted.action(), AuditAction::Deleted);
    }

    #[test]
    fn test_deleted_keeps_old_value_only() {
        let audit = record(
            2,
            9,
            Transition::Deleted,
            Some(ConfigValue::from(42_i64)),
            None,
            Some(1),
            ValueSource::Manual,
        )
        .unwrap();
        assert_eq!(audit.old_value, Some(ConfigValue::from(42_i64)));
        assert_eq!(audit.new_value, None);
    }
}
