// crates/ethercat-esi/src/config.rs

//! Construction-time configuration of an [`crate::EsiDevice`].

use crate::error::EsiError;
use crate::types::DeviceIdentity;
use alloc::string::String;
use serde::Deserialize;

/// How the indexer treats numeric fields that fail to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericPolicy {
    /// Malformed numbers read as 0 and are logged as a warning.
    #[default]
    Lenient,
    /// Malformed numbers fail indexing with `EsiError::InvalidNumber`.
    Strict,
}

/// Configuration for one SubDevice.
///
/// ```json
/// {
///   "identity": { "vendor_id": 2, "product_code": 131608658, "revision": 1048576 },
///   "bundle_ref": "esi/beckhoff-el1008",
///   "numeric_policy": "strict"
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub identity: Option<DeviceIdentity>,

    /// Dependency reference handed to the data-asset client.
    #[serde(default)]
    pub bundle_ref: Option<String>,

    #[serde(default)]
    pub numeric_policy: NumericPolicy,
}

impl DeviceConfig {
    pub fn new(identity: DeviceIdentity) -> Self {
        Self {
            identity: Some(identity),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, EsiError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the identity, or `EsiError::MissingIdentity`.
    pub fn require_identity(&self) -> Result<DeviceIdentity, EsiError> {
        self.identity.ok_or(EsiError::MissingIdentity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_from_json_str() {
        let config = DeviceConfig::from_json_str(
            r#"{"identity": {"vendor_id": 2, "product_code": 16, "revision": 1}, "numeric_policy": "strict"}"#,
        )
        .unwrap();
        assert_eq!(config.require_identity().unwrap(), DeviceIdentity::new(2, 16, 1));
        assert_eq!(config.numeric_policy, NumericPolicy::Strict);
        assert_eq!(config.bundle_ref, None);
    }

    #[test]
    fn test_missing_identity() {
        let config = DeviceConfig::from_json_str("{}").unwrap();
        assert_eq!(config.numeric_policy, NumericPolicy::Lenient);
        assert_eq!(config.require_identity().unwrap_err(), ErrorKind::MissingIdentity);
    }
}
