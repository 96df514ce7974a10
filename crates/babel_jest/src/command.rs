//! Process compiler — drives Babel in an external program.
//!
//! Each call spawns the configured command, writes one JSON request to its
//! stdin, closes it, and reads one JSON response from stdout:
//!
//! ```text
//! → {"op":"loadPartialConfig","options":{...}}
//! ← {"result": null | {"options":{...},"config":"...","babelrc":"..."}}
//!
//! → {"op":"transform","code":"...","options":{...}}
//! ← {"result": null | {"code":"...","map":{...}}}
//!
//! ← {"error":"..."}            (either op)
//! ```
//!
//! The peer must read its whole stdin before writing; see
//! `bridge/babel-bridge.js`.

use crate::compiler::{Compiler, LoadOptions, PartialConfig, TransformOutput};
use crate::options::CompilerOptions;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

#[derive(Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
enum Request<'a> {
    LoadPartialConfig {
        options: &'a LoadOptions,
    },
    Transform {
        code: &'a str,
        options: &'a CompilerOptions,
    },
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Raw transform result; `code` may be any JSON value.
#[derive(Deserialize)]
struct WireOutput {
    #[serde(default)]
    code: Value,
    #[serde(default)]
    map: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl CommandCompiler {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            current_dir: None,
        }
    }

    /// Split a whitespace-separated command line, e.g.
    /// `node bridge/babel-bridge.js`.
    pub fn parse(command_line: &str) -> anyhow::Result<Self> {
        let mut words = command_line.split_whitespace();
        let program = words.next().context("missing compiler command")?;
        Ok(Self::new(program, words))
    }

    /// Directory the compiler process runs in.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    fn call(&self, request: &Request<'_>) -> anyhow::Result<Option<Value>> {
        let body = serde_json::to_vec(request).context("encode compiler request")?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawn compiler `{}`", self.program))?;

        // A child that exits early closes the pipe; its status and stderr
        // outrank the write error.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&body),
            None => Err(std::io::Error::other("compiler stdin unavailable")),
        };

        let output = child.wait_with_output().context("wait for compiler")?;
        if !output.status.success() {
            let msg = format!(
                "compiler `{}` exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(match written {
                Ok(()) => anyhow::anyhow!(msg),
                Err(err) => anyhow::Error::new(err).context(msg),
            });
        }
        written.context("write compiler request")?;
        debug!(program = %self.program, bytes = output.stdout.len(), "compiler responded");

        let response: Response =
            serde_json::from_slice(&output.stdout).context("parse compiler response")?;
        if let Some(err) = response.error {
            bail!(err);
        }
        Ok(response.result.filter(|v| !v.is_null()))
    }
}

impl Compiler for CommandCompiler {
    fn load_partial_config(&self, options: &LoadOptions) -> anyhow::Result<Option<PartialConfig>> {
        match self.call(&Request::LoadPartialConfig { options })? {
            Some(v) => Ok(Some(
                serde_json::from_value(v).context("parse partial config")?,
            )),
            None => Ok(None),
        }
    }

    fn transform(
        &self,
        src: &str,
        options: &CompilerOptions,
    ) -> anyhow::Result<Option<TransformOutput>> {
        match self.call(&Request::Transform { code: src, options })? {
            Some(v) => {
                let wire: WireOutput =
                    serde_json::from_value(v).context("parse transform result")?;
                Ok(Some(TransformOutput {
                    code: wire.code.as_str().map(str::to_owned),
                    map: wire.map.filter(|m| !m.is_null()),
                }))
            }
            None => Ok(None),
        }
    }
}
