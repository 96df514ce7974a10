#![allow(dead_code)]

use babel_jest::{Compiler, CompilerOptions, LoadOptions, PartialConfig, TransformOutput};
use serde_json::json;
use std::sync::Mutex;

/// What the fake compiler's transform call hands back.
#[derive(Clone, Copy)]
pub enum Output {
    /// `{ code: "/* compiled */\n<src>", map: {...} }`
    Compile,
    /// No result at all.
    Nothing,
    /// A result without code.
    NoCode,
}

/// In-memory compiler: materializes load options into compiler options
/// and records every call.
pub struct RecordingCompiler {
    pub ignore_suffix: Option<&'static str>,
    pub config_file: Option<&'static str>,
    pub output: Output,
    pub loads: Mutex<Vec<LoadOptions>>,
    pub transforms: Mutex<Vec<(String, CompilerOptions)>>,
}

impl RecordingCompiler {
    pub fn new() -> Self {
        Self {
            ignore_suffix: None,
            config_file: None,
            output: Output::Compile,
            loads: Mutex::new(Vec::new()),
            transforms: Mutex::new(Vec::new()),
        }
    }

    pub fn ignoring(mut self, suffix: &'static str) -> Self {
        self.ignore_suffix = Some(suffix);
        self
    }

    pub fn with_config_file(mut self, path: &'static str) -> Self {
        self.config_file = Some(path);
        self
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    pub fn loads(&self) -> Vec<LoadOptions> {
        self.loads.lock().unwrap().clone()
    }

    pub fn transforms(&self) -> Vec<(String, CompilerOptions)> {
        self.transforms.lock().unwrap().clone()
    }
}

impl Compiler for RecordingCompiler {
    fn load_partial_config(&self, options: &LoadOptions) -> anyhow::Result<Option<PartialConfig>> {
        self.loads.lock().unwrap().push(options.clone());
        if let Some(suffix) = self.ignore_suffix {
            if options.filename.to_string_lossy().ends_with(suffix) {
                return Ok(None);
            }
        }
        let materialized: CompilerOptions = serde_json::from_value(serde_json::to_value(options)?)?;
        Ok(Some(PartialConfig {
            options: materialized,
            config: self.config_file.map(str::to_owned),
            babelrc: None,
        }))
    }

    fn transform(
        &self,
        src: &str,
        options: &CompilerOptions,
    ) -> anyhow::Result<Option<TransformOutput>> {
        self.transforms
            .lock()
            .unwrap()
            .push((src.to_owned(), options.clone()));
        Ok(match self.output {
            Output::Compile => Some(TransformOutput {
                code: Some(format!("/* compiled */\n{src}")),
                map: Some(json!({"version": 3, "mappings": ""})),
            }),
            Output::Nothing => None,
            Output::NoCode => Some(TransformOutput::default()),
        })
    }
}
