//! The runner-facing transformer: `can_instrument`, `get_cache_key`,
//! `process`.

use crate::cache_key::{CacheKeyParts, EnvContext, ADAPTER_VERSION};
use crate::caller::CapabilityOverrides;
use crate::compiler::{Compiler, LoadOptions, PartialConfig};
use crate::error::{Result, TransformError};
use crate::options::AdapterConfig;
use crate::paths;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// The slice of the runner's project config the adapter reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub cwd: PathBuf,
    pub root_dir: PathBuf,
}

/// Options passed by the runner to `get_cache_key`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheKeyOptions {
    pub config: ProjectConfig,
    #[serde(default)]
    pub instrument: bool,
    #[serde(flatten)]
    pub capabilities: CapabilityOverrides,
}

/// Options passed by the runner to `process`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOptions {
    #[serde(default)]
    pub instrument: bool,
    #[serde(flatten)]
    pub capabilities: CapabilityOverrides,
}

/// Result of `process`: compiled output, or the input handed back
/// verbatim when the compiler produced nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProcessOutput {
    Compiled {
        code: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        map: Option<Value>,
    },
    Unchanged(String),
}

impl ProcessOutput {
    pub fn code(&self) -> &str {
        match self {
            ProcessOutput::Compiled { code, .. } => code,
            ProcessOutput::Unchanged(src) => src,
        }
    }

    pub fn map(&self) -> Option<&Value> {
        match self {
            ProcessOutput::Compiled { map, .. } => map.as_ref(),
            ProcessOutput::Unchanged(_) => None,
        }
    }

    pub fn is_compiled(&self) -> bool {
        matches!(self, ProcessOutput::Compiled { .. })
    }
}

/// One adapter instance: a fixed baseline config, a compiler, and the
/// environment captured at construction. Cheap to clone.
#[derive(Clone)]
pub struct Transformer {
    config: Arc<AdapterConfig>,
    compiler: Arc<dyn Compiler>,
    env: EnvContext,
}

impl std::fmt::Debug for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transformer")
            .field("config", &self.config)
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}

impl Transformer {
    pub fn new(compiler: Arc<dyn Compiler>, config: AdapterConfig) -> Self {
        Self {
            config: Arc::new(config),
            compiler,
            env: EnvContext::from_env(),
        }
    }

    /// Replace the captured environment.
    pub fn with_env(mut self, env: EnvContext) -> Self {
        self.env = env;
        self
    }

    pub fn can_instrument(&self) -> bool {
        true
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn env(&self) -> &EnvContext {
        &self.env
    }

    /// Resolve the file-specific compiler configuration.
    ///
    /// Fails with [`TransformError::Ignored`] when the compiler's ignore
    /// rules exclude `filename`.
    pub fn load_config(
        &self,
        cwd: &Path,
        filename: &Path,
        capabilities: &CapabilityOverrides,
    ) -> Result<PartialConfig> {
        let filename = paths::absolute(cwd, filename);
        let mut config = AdapterConfig::clone(&self.config);
        config.caller = config.caller.with_overrides(capabilities);

        let load = LoadOptions {
            cwd: cwd.to_path_buf(),
            filename,
            config,
        };
        match self.compiler.load_partial_config(&load)? {
            Some(partial) => {
                debug!(
                    filename = %load.filename.display(),
                    config = ?partial.config,
                    babelrc = ?partial.babelrc,
                    "resolved compiler config"
                );
                Ok(partial)
            }
            None => Err(TransformError::Ignored {
                path: paths::relative_slash(cwd, &load.filename),
            }),
        }
    }

    pub fn get_cache_key(
        &self,
        file_data: &[u8],
        filename: impl AsRef<Path>,
        config_string: &str,
        options: &CacheKeyOptions,
    ) -> Result<String> {
        let filename = filename.as_ref();
        let project = &options.config;
        let partial = self.load_config(&project.cwd, filename, &options.capabilities)?;

        let options_json = serde_json::to_string(&partial.options)?;
        let relative_filename =
            paths::relative_slash(&project.root_dir, &paths::absolute(&project.cwd, filename));
        let config_files = partial.config_files();

        let key = CacheKeyParts {
            version: ADAPTER_VERSION,
            options_json: &options_json,
            file_data,
            relative_filename: &relative_filename,
            config_string,
            config_files: &config_files,
            instrument: options.instrument,
            env: &self.env,
        }
        .digest();

        debug!(file = %relative_filename, %key, instrument = options.instrument, "cache key");
        Ok(key)
    }

    pub fn process(
        &self,
        src: &str,
        filename: impl AsRef<Path>,
        config: &ProjectConfig,
        transform_options: Option<&TransformOptions>,
    ) -> Result<ProcessOutput> {
        let filename = filename.as_ref();
        let default_options = TransformOptions::default();
        let transform_options = transform_options.unwrap_or(&default_options);
        let partial = self.load_config(&config.cwd, filename, &transform_options.capabilities)?;

        let output = if transform_options.instrument {
            let options = partial.options.instrumented(&config.root_dir);
            self.compiler.transform(src, &options)?
        } else {
            self.compiler.transform(src, &partial.options)?
        };

        match output {
            Some(out) => match out.code {
                Some(code) => {
                    debug!(filename = %filename.display(), has_map = out.map.is_some(), "compiled");
                    Ok(ProcessOutput::Compiled { code, map: out.map })
                }
                None => {
                    warn!(filename = %filename.display(), "compiler produced no code; passing source through");
                    Ok(ProcessOutput::Unchanged(src.to_owned()))
                }
            },
            None => {
                warn!(filename = %filename.display(), "compiler returned no result; passing source through");
                Ok(ProcessOutput::Unchanged(src.to_owned()))
            }
        }
    }
}

#[cfg(feature = "async")]
impl Transformer {
    /// [`Transformer::get_cache_key`] on tokio's blocking pool.
    pub async fn get_cache_key_async(
        &self,
        file_data: Vec<u8>,
        filename: PathBuf,
        config_string: String,
        options: CacheKeyOptions,
    ) -> Result<String> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || {
            this.get_cache_key(&file_data, &filename, &config_string, &options)
        })
        .await
        .map_err(join_error)?
    }

    /// [`Transformer::process`] on tokio's blocking pool.
    pub async fn process_async(
        &self,
        src: String,
        filename: PathBuf,
        config: ProjectConfig,
        transform_options: Option<TransformOptions>,
    ) -> Result<ProcessOutput> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || {
            this.process(&src, &filename, &config, transform_options.as_ref())
        })
        .await
        .map_err(join_error)?
    }
}

#[cfg(feature = "async")]
fn join_error(err: tokio::task::JoinError) -> TransformError {
    TransformError::Compiler(anyhow::Error::new(err).context("blocking transform task"))
}
