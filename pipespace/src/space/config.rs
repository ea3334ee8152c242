//! Space configuration.

use crate::core::NAME_SEPARATOR;
use crate::errors::SpaceError;
use serde::{Deserialize, Serialize};

/// Configuration for a [`Space`](super::Space).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    /// Label attached to log events emitted by the space.
    pub label: String,
    /// Whether step and pipeline names are validated on creation.
    pub validate_names: bool,
    /// Longest accepted name, in characters.
    pub max_name_length: usize,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            label: "default".to_string(),
            validate_names: true,
            max_name_length: 128,
        }
    }
}

impl SpaceConfig {
    /// Creates a new space config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Enables or disables name validation.
    #[must_use]
    pub fn with_validate_names(mut self, validate: bool) -> Self {
        self.validate_names = validate;
        self
    }

    /// Sets the maximum name length.
    #[must_use]
    pub fn with_max_name_length(mut self, length: usize) -> Self {
        self.max_name_length = length;
        self
    }

    /// Checks a step or pipeline name against this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::InvalidName`] when validation is enabled and the
    /// name is blank, contains the separator, or is too long.
    pub fn validate_name(&self, name: &str) -> Result<(), SpaceError> {
        if !self.validate_names {
            return Ok(());
        }

        let reason = if name.trim().is_empty() {
            Some("name must not be blank")
        } else if name.contains(NAME_SEPARATOR) {
            Some("name must not contain '/'")
        } else if name.chars().count() > self.max_name_length {
            Some("name exceeds the configured maximum length")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(SpaceError::InvalidName {
                name: name.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SpaceConfig::default();
        assert_eq!(config.label, "default");
        assert!(config.validate_names);
        assert_eq!(config.max_name_length, 128);
    }

    #[test]
    fn test_builder() {
        let config = SpaceConfig::new()
            .with_label("orders")
            .with_validate_names(false)
            .with_max_name_length(8);

        assert_eq!(config.label, "orders");
        assert!(!config.validate_names);
        assert_eq!(config.max_name_length, 8);
    }

    #[test]
    fn test_validate_name() {
        let config = SpaceConfig::new().with_max_name_length(5);

        assert!(config.validate_name("parse").is_ok());
        assert!(config.validate_name("").is_err());
        assert!(config.validate_name("   ").is_err());
        assert!(config.validate_name("a/b").is_err());

        let err = config.validate_name("toolong").unwrap_err();
        assert_eq!(err.code(), "SPACE-008-INVALID_NAME");
    }

    #[test]
    fn test_validation_disabled() {
        let config = SpaceConfig::new().with_validate_names(false);
        assert!(config.validate_name("").is_ok());
        assert!(config.validate_name("a/b").is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SpaceConfig = serde_json::from_str(r#"{"label": "billing"}"#).unwrap();
        assert_eq!(config.label, "billing");
        assert!(config.validate_names);
    }
}
