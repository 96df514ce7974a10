//! Caller capabilities — what the embedding runner can execute natively.
//!
//! Babel reads these flags to decide which module syntax it must lower.
//! The adapter carries one baseline set; the runner may override single
//! flags for a single call.

use serde::{Deserialize, Serialize};

/// Name reported to Babel as the calling tool.
pub const CALLER_NAME: &str = "babel-jest";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerCapabilities {
    pub name: String,
    pub supports_dynamic_import: bool,
    pub supports_export_namespace_from: bool,
    #[serde(rename = "supportsStaticESM")]
    pub supports_static_esm: bool,
    pub supports_top_level_await: bool,
}

impl Default for CallerCapabilities {
    fn default() -> Self {
        Self {
            name: CALLER_NAME.into(),
            supports_dynamic_import: false,
            supports_export_namespace_from: false,
            supports_static_esm: false,
            supports_top_level_await: false,
        }
    }
}

/// Per-call capability flags supplied by the runner. `None` keeps the
/// adapter default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_dynamic_import: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_export_namespace_from: Option<bool>,
    #[serde(
        default,
        rename = "supportsStaticESM",
        skip_serializing_if = "Option::is_none"
    )]
    pub supports_static_esm: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_top_level_await: Option<bool>,
}

impl CallerCapabilities {
    /// Apply per-call overrides on top of these defaults. The name is never
    /// overridden.
    pub fn with_overrides(&self, overrides: &CapabilityOverrides) -> Self {
        Self {
            name: self.name.clone(),
            supports_dynamic_import: overrides
                .supports_dynamic_import
                .unwrap_or(self.supports_dynamic_import),
            supports_export_namespace_from: overrides
                .supports_export_namespace_from
                .unwrap_or(self.supports_export_namespace_from),
            supports_static_esm: overrides
                .supports_static_esm
                .unwrap_or(self.supports_static_esm),
            supports_top_level_await: overrides
                .supports_top_level_await
                .unwrap_or(self.supports_top_level_await),
        }
    }
}
