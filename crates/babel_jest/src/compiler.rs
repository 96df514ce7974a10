//! The compiler boundary. Babel itself lives on the other side; the
//! adapter only shapes what goes in and interprets what comes out.

use crate::options::{AdapterConfig, CompilerOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Input to the partial-config loader: the adapter baseline (with the
/// per-call caller flags already applied) plus `cwd` and the absolute
/// filename.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadOptions {
    pub cwd: PathBuf,
    pub filename: PathBuf,
    #[serde(flatten)]
    pub config: AdapterConfig,
}

/// File-specific configuration returned by the loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialConfig {
    pub options: CompilerOptions,
    /// Project-wide config file consulted, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    /// File-relative `.babelrc` consulted, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub babelrc: Option<String>,
}

impl PartialConfig {
    /// Config file paths concatenated, empty for whichever is absent.
    pub fn config_files(&self) -> String {
        format!(
            "{}{}",
            self.config.as_deref().unwrap_or_default(),
            self.babelrc.as_deref().unwrap_or_default()
        )
    }
}

/// What a transform call produced. `code` is `None` when the compiler ran
/// but emitted nothing executable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformOutput {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<Value>,
}

/// A source compiler with Babel's configuration model.
///
/// Both calls may return `Ok(None)`: from the loader it means the file is
/// excluded by the compiler's ignore rules, from `transform` it means no
/// output was produced. Errors are passed to the caller untranslated.
pub trait Compiler: Send + Sync {
    fn load_partial_config(&self, options: &LoadOptions) -> anyhow::Result<Option<PartialConfig>>;

    fn transform(
        &self,
        src: &str,
        options: &CompilerOptions,
    ) -> anyhow::Result<Option<TransformOutput>>;
}
