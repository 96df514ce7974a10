//! babel-jest — Babel as a Jest transformer.
//!
//! The adapter owns no compilation logic. It shapes Babel's configuration
//! the same way on every call, fingerprints the inputs so the runner can
//! reuse cached output, and optionally adds coverage instrumentation.
//!
//! # Architecture
//!
//! ```text
//! Runner (Jest transform pipeline)
//!   │  get_cache_key / process
//!   ▼
//! Transformer { AdapterConfig (immutable), EnvContext }
//!   │  load_config: baseline + cwd + filename + caller overrides
//!   ▼
//! Compiler::load_partial_config ──► None ⇒ TransformError::Ignored
//!   │
//!   ├─► cache key: SHA-256 over NUL-separated inputs, 32 hex chars
//!   │
//!   └─► Compiler::transform (+ istanbul plugin if instrumenting)
//!         │
//!         ▼
//!       ProcessOutput::Compiled { code, map } | ProcessOutput::Unchanged(src)
//! ```
//!
//! Caching itself is the runner's job; nothing here is memoized.

pub mod cache_key;
pub mod caller;
pub mod command;
pub mod compiler;
pub mod error;
pub mod factory;
pub mod options;
pub mod paths;
pub mod transformer;

pub use cache_key::{EnvContext, Fingerprint, ADAPTER_VERSION};
pub use caller::{CallerCapabilities, CapabilityOverrides};
pub use command::CommandCompiler;
pub use compiler::{Compiler, LoadOptions, PartialConfig, TransformOutput};
pub use error::{Result, TransformError};
pub use factory::{create_transformer, TransformerModule};
pub use options::{AdapterConfig, CompilerOptions, PluginItem, UserOptions};
pub use transformer::{CacheKeyOptions, ProcessOutput, ProjectConfig, TransformOptions, Transformer};
