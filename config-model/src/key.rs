use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Validate that a key is well-formed: non-empty, characters limited to
/// ASCII alphanumerics, `_`, `.` and `-`.
pub fn validate_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::EmptyKey);
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(ValidationError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// A validated configuration key.
///
/// Keys identify entries for their whole lifetime; there is no operation
/// that renames one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ConfigKey(String);

impl ConfigKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ConfigKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ConfigKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets `HashMap<ConfigKey, _>` be queried with a plain `&str`.
impl Borrow<str> for ConfigKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ConfigKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        assert!(ConfigKey::new("app.timezone").is_ok());
        assert!(ConfigKey::new("FEATURE_FLAG-1").is_ok());
        assert!(ConfigKey::new("a").is_ok());
    }

    #[test]
    fn test_empty_key_rejected() {
        assert_eq!(ConfigKey::new("").unwrap_err(), ValidationError::EmptyKey);
    }

    #[test]
    fn test_invalid_characters_rejected() {
        for bad in ["bad key", "semi;colon", "slash/ed", "tab\tkey", "ünïcode"] {
            assert!(
                matches!(ConfigKey::new(bad), Err(ValidationError::InvalidKey(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_deserialize_revalidates() {
        let ok: Result<ConfigKey, _> = serde_json::from_str("\"app.name\"");
        assert!(ok.is_ok());
        let bad: Result<ConfigKey, _> = serde_json::from_str("\"not a key\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_map_lookup_by_str() {
        let mut map = std::collections::HashMap::new();
        map.insert(ConfigKey::new("app.name").unwrap(), 1);
        assert_eq!(map.get("app.name"), Some(&1));
        assert_eq!(map.get("app.other"), None);
    }
}
