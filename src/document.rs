//! Document shaping parameters
//!
//! A context mode picks which document shape the encoder produces. Only
//! API versus non-API differs structurally; GATEWAY and SNAPSHOT share the
//! persisted shape.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{MetadataError, MetadataResult};

/// Document shape variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContextMode {
    /// REST responses
    #[default]
    Api,
    /// On-disk cluster state
    Gateway,
    /// Snapshot and remote blob storage
    Snapshot,
}

impl ContextMode {
    /// Parameter name carrying the mode in a string parameter map.
    pub const PARAM_KEY: &'static str = "context_mode";

    pub fn is_api(&self) -> bool {
        matches!(self, ContextMode::Api)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextMode::Api => "API",
            ContextMode::Gateway => "GATEWAY",
            ContextMode::Snapshot => "SNAPSHOT",
        }
    }
}

impl fmt::Display for ContextMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextMode {
    type Err = MetadataError;

    fn from_str(s: &str) -> MetadataResult<Self> {
        match s {
            "API" => Ok(ContextMode::Api),
            "GATEWAY" => Ok(ContextMode::Gateway),
            "SNAPSHOT" => Ok(ContextMode::Snapshot),
            other => Err(MetadataError::configuration(format!(
                "unknown context mode [{}], expected one of API, GATEWAY, SNAPSHOT",
                other
            ))),
        }
    }
}

/// Caller choices for document encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentParams {
    pub context_mode: ContextMode,
    /// API mode only: emit settings with dotted keys
    pub flat_settings: bool,
    /// Non-API mode only: emit mapping sources as base64 compressed bytes
    pub binary: bool,
}

impl DocumentParams {
    pub const FLAT_SETTINGS: &'static str = "flat_settings";
    pub const BINARY: &'static str = "binary";

    pub fn api() -> Self {
        Self::default()
    }

    pub fn with_mode(context_mode: ContextMode) -> Self {
        Self {
            context_mode,
            ..Self::default()
        }
    }

    pub fn flat_settings(mut self, flat: bool) -> Self {
        self.flat_settings = flat;
        self
    }

    pub fn binary(mut self, binary: bool) -> Self {
        self.binary = binary;
        self
    }

    /// Reads `context_mode`, `flat_settings` and `binary` from request-style
    /// string parameters. Missing keys take their defaults.
    pub fn from_params(params: &HashMap<String, String>) -> MetadataResult<Self> {
        let context_mode = match params.get(ContextMode::PARAM_KEY) {
            Some(mode) => mode.parse()?,
            None => ContextMode::default(),
        };
        Ok(Self {
            context_mode,
            flat_settings: param_as_bool(params, Self::FLAT_SETTINGS)?,
            binary: param_as_bool(params, Self::BINARY)?,
        })
    }

    /// Whether settings are written with dotted keys.
    pub fn settings_flat(&self) -> bool {
        !self.context_mode.is_api() || self.flat_settings
    }
}

fn param_as_bool(params: &HashMap<String, String>, key: &str) -> MetadataResult<bool> {
    match params.get(key).map(String::as_str) {
        None | Some("false") => Ok(false),
        Some("true") | Some("") => Ok(true),
        Some(other) => Err(MetadataError::configuration(format!(
            "failed to parse value [{}] as only [true] or [false] are allowed for [{}]",
            other, key
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_api_nested_text() {
        let params = DocumentParams::from_params(&HashMap::new()).unwrap();
        assert_eq!(params, DocumentParams::api());
        assert!(!params.settings_flat());
    }

    #[test]
    fn test_from_params() {
        let mut raw = HashMap::new();
        raw.insert("context_mode".to_string(), "GATEWAY".to_string());
        raw.insert("binary".to_string(), "true".to_string());

        let params = DocumentParams::from_params(&raw).unwrap();
        assert_eq!(params.context_mode, ContextMode::Gateway);
        assert!(params.binary);
        assert!(!params.flat_settings);
        // non-API always writes dotted settings
        assert!(params.settings_flat());
    }

    #[test]
    fn test_bad_params_rejected() {
        let mut raw = HashMap::new();
        raw.insert("context_mode".to_string(), "api".to_string());
        assert!(DocumentParams::from_params(&raw).is_err());

        let mut raw = HashMap::new();
        raw.insert("flat_settings".to_string(), "yes".to_string());
        assert!(DocumentParams::from_params(&raw).is_err());
    }
}
