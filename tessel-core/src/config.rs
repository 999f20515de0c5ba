//! Engine configuration.
//!
//! Configuration is plain data with serde support so hosts can keep it next
//! to the rest of their settings. Every field has a default; a partial JSON
//! object only overrides what it names.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Limits applied by a reactive runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactiveConfig {
    /// Maximum notification passes a single write may run. A subscriber that
    /// writes back into the signal it reacts to schedules another pass; past
    /// this cap the write is treated as a cycle and propagation stops.
    pub max_notify_passes: usize,
}

impl Default for ReactiveConfig {
    fn default() -> Self {
        Self {
            max_notify_passes: 32,
        }
    }
}

/// Configuration for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Settings for the engine's reactive runtime.
    pub reactive: ReactiveConfig,

    /// Move `<style>` elements out of templates into the document head.
    pub hoist_styles: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reactive: ReactiveConfig::default(),
            hoist_styles: true,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "hoist_styles": false }"#).unwrap();
        assert!(!config.hoist_styles);
        assert_eq!(config.reactive, ReactiveConfig::default());

        let config = EngineConfig::from_json(r#"{ "reactive": { "max_notify_passes": 4 } }"#).unwrap();
        assert!(config.hoist_styles);
        assert_eq!(config.reactive.max_notify_passes, 4);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = EngineConfig::from_json("{ nope").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }
}
