//! Shared data model for the configuration store.
//!
//! Everything here is plain data: validated keys, tagged values, the entry /
//! version / audit records, and the validation errors raised at their
//! construction boundaries. Persistence and caching live in the sibling
//! crates.
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod category;
mod error;
mod key;
mod record;
mod value;

pub use category::ConfigCategory;
pub use error::ValidationError;
pub use key::{validate_key, ConfigKey};
pub use record::{
    AuditAction, ConfigAudit, ConfigEntry, ConfigVersion, EntryState, ValueSource,
};
pub use value::ConfigValue;
