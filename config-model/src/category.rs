use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Grouping for configuration entries. Entries may also carry no category
/// at all (`Option<ConfigCategory>::None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigCategory {
    System,
    Application,
    Security,
    Performance,
}

impl ConfigCategory {
    pub const ALL: [Self; 4] = [
        Self::System,
        Self::Application,
        Self::Security,
        Self::Performance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Application => "application",
            Self::Security => "security",
            Self::Performance => "performance",
        }
    }

    /// Human-readable label for display surfaces.
    pub fn label(self) -> &'static str {
        match self {
            Self::System => "System",
            Self::Application => "Application",
            Self::Security => "Security",
            Self::Performance => "Performance",
        }
    }
}

impl fmt::Display for ConfigCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "application" => Ok(Self::Application),
            "security" => Ok(Self::Security),
            "performance" => Ok(Self::Performance),
            other => Err(ValidationError::UnknownCategory(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_categories() {
        for category in ConfigCategory::ALL {
            assert_eq!(category.as_str().parse::<ConfigCategory>(), Ok(category));
        }
        assert_eq!("SYSTEM".parse::<ConfigCategory>(), Ok(ConfigCategory::System));
    }

    #[test]
    fn test_parse_unknown_category() {
        assert!(matches!(
            "network".parse::<ConfigCategory>(),
            Err(ValidationError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_labels() {
        assert_eq!(ConfigCategory::System.label(), "System");
        assert_eq!(ConfigCategory::Performance.as_str(), "performance");
    }
}
