//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! The `load` module converts them into the public `types` structs.

use serde::Deserialize;

/// Raw TOML shape: serde target before resolution.
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub(super) struct RawConfig {
    /// Only read while following the `base` chain; ignored afterwards.
    #[serde(default)]
    #[allow(dead_code)]
    pub meta: Option<toml::Value>,
    #[serde(default)]
    pub resolver: RawResolver,
    #[serde(default)]
    pub logging: RawLogging,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RawResolver {
    #[serde(default)]
    pub search_paths: Vec<String>,
    #[serde(default = "default_false")]
    pub strict: bool,
    #[serde(default)]
    pub bindings: Vec<String>,
}

impl Default for RawResolver {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            strict: default_false(),
            bindings: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RawLogging {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for RawLogging {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

fn default_false() -> bool {
    false
}
