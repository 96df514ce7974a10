//! Transformer construction.
//!
//! [`TransformerModule`] is the top-level export: it behaves like a
//! default-configured [`Transformer`] and can also build differently
//! configured ones. The transformers it builds do not carry the factory.

use crate::compiler::Compiler;
use crate::options::{AdapterConfig, UserOptions};
use crate::transformer::Transformer;
use std::ops::Deref;
use std::sync::Arc;

/// Build a transformer whose baseline merges `options` with the fixed
/// defaults and the base preset.
pub fn create_transformer(compiler: Arc<dyn Compiler>, options: Option<UserOptions>) -> Transformer {
    Transformer::new(compiler, AdapterConfig::from_user(options))
}

pub struct TransformerModule {
    default: Transformer,
    compiler: Arc<dyn Compiler>,
}

impl TransformerModule {
    pub fn new(compiler: Arc<dyn Compiler>) -> Self {
        Self {
            default: create_transformer(compiler.clone(), None),
            compiler,
        }
    }

    /// A new, independently configured transformer sharing this module's
    /// compiler.
    pub fn create_transformer(&self, options: Option<UserOptions>) -> Transformer {
        create_transformer(self.compiler.clone(), options)
    }
}

impl Deref for TransformerModule {
    type Target = Transformer;

    fn deref(&self) -> &Transformer {
        &self.default
    }
}
