//! Registry configuration.

use serde::{Deserialize, Serialize};

use crate::element::ConstructorKind;
use crate::error::ConfigError;
use crate::install::HostCapabilities;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistryConfig {
    /// The host already implements the custom element lifecycle.
    pub native_lifecycle: bool,
    /// Kind of constructor the application will define, when known up front.
    /// Without it the install mode is decided by the first definition.
    pub sample_constructor: Option<ConstructorKind>,
}

impl RegistryConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn host(&self) -> HostCapabilities {
        HostCapabilities {
            native_lifecycle: self.native_lifecycle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_camel_case() {
        let config =
            RegistryConfig::from_json(r#"{"nativeLifecycle": true, "sampleConstructor": "transpiled"}"#)
                .unwrap();
        assert!(config.native_lifecycle);
        assert_eq!(config.sample_constructor, Some(ConstructorKind::Transpiled));
    }

    #[test]
    fn test_missing_fields_default() {
        let config = RegistryConfig::from_json("{}").unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert!(!config.host().native_lifecycle);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = RegistryConfig::from_json(r#"{"nativeLifecycle": "yes"}"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid registry config"));
    }
}
