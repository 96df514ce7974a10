//! Compiler options: the user-facing input, the adapter baseline built
//! from it, and the resolved per-file options Babel hands back.

use crate::caller::CallerCapabilities;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Preset appended after every user preset.
pub const BASE_PRESET: &str = "babel-preset-jest";
/// Coverage plugin injected when the runner asks for instrumentation.
pub const COVERAGE_PLUGIN: &str = "babel-plugin-istanbul";
/// Comment placed ahead of helper code so coverage skips it.
pub const IGNORE_NEXT_COMMENT: &str = " istanbul ignore next ";

/// Keys the adapter owns; user values for them are discarded.
const RESERVED_KEYS: &[&str] = &[
    "caller",
    "compact",
    "cwd",
    "filename",
    "plugins",
    "presets",
    "sourceMaps",
];

/// A plugin or preset reference: a bare name, `[name, options]`,
/// `[name, options, uniqueName]`, or any other shape the compiler accepts.
/// Unrecognized shapes are carried as raw JSON and never rejected here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginItem {
    Name(String),
    WithName(String, Value, String),
    WithOptions(String, Value),
    Raw(Value),
}

impl PluginItem {
    /// The module reference, when the entry has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            PluginItem::Name(name)
            | PluginItem::WithOptions(name, _)
            | PluginItem::WithName(name, _, _) => Some(name),
            PluginItem::Raw(_) => None,
        }
    }

    pub fn options(&self) -> Option<&Value> {
        match self {
            PluginItem::WithOptions(_, options) | PluginItem::WithName(_, options, _) => {
                Some(options)
            }
            PluginItem::Name(_) | PluginItem::Raw(_) => None,
        }
    }

    /// The `uniqueName` that lets the same plugin appear twice.
    pub fn unique_name(&self) -> Option<&str> {
        match self {
            PluginItem::WithName(_, _, unique) => Some(unique),
            _ => None,
        }
    }
}

impl From<&str> for PluginItem {
    fn from(name: &str) -> Self {
        PluginItem::Name(name.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMaps {
    Inline,
    Both,
}

/// Options as written by the user (e.g. in `jest.config.js` transform
/// entries). Unknown keys are forwarded to Babel as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserOptions {
    #[serde(default)]
    pub plugins: Vec<PluginItem>,
    #[serde(default)]
    pub presets: Vec<PluginItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Immutable per-transformer baseline.
///
/// The base preset is always present and always last; `compact`,
/// `sourceMaps` and `caller` are fixed by the adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterConfig {
    pub caller: CallerCapabilities,
    pub compact: bool,
    pub plugins: Vec<PluginItem>,
    pub presets: Vec<PluginItem>,
    pub source_maps: SourceMaps,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AdapterConfig {
    pub fn from_user(options: Option<UserOptions>) -> Self {
        let UserOptions {
            plugins,
            mut presets,
            mut extra,
        } = options.unwrap_or_default();

        for key in RESERVED_KEYS {
            extra.remove(*key);
        }
        presets.push(PluginItem::from(BASE_PRESET));

        Self {
            caller: CallerCapabilities::default(),
            compact: false,
            plugins,
            presets,
            source_maps: SourceMaps::Both,
            extra,
        }
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self::from_user(None)
    }
}

/// Materialized, file-specific options as produced by Babel's
/// partial-config loader and consumed by its transform call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    #[serde(default)]
    pub plugins: Vec<PluginItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auxiliary_comment_before: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl CompilerOptions {
    /// A copy of these options with coverage instrumentation enabled.
    /// `self` is left untouched.
    pub fn instrumented(&self, root_dir: &Path) -> Self {
        let mut options = self.clone();
        options.auxiliary_comment_before = Some(IGNORE_NEXT_COMMENT.into());
        options.plugins.push(PluginItem::WithOptions(
            COVERAGE_PLUGIN.into(),
            serde_json::json!({
                "cwd": root_dir.to_string_lossy(),
                "exclude": [],
            }),
        ));
        options
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name() == Some(name))
    }
}
