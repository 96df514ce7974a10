use anyhow::Context;
use babel_jest::paths;
use babel_jest::{
    create_transformer, CacheKeyOptions, CapabilityOverrides, CommandCompiler, ProcessOutput,
    ProjectConfig, TransformOptions, Transformer, UserOptions,
};
use colored::Colorize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Marks failures to read or parse what the user pointed the CLI at.
/// Attached as context so the exit code can tell them from runtime faults.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("read {}", .0.display())]
    Read(PathBuf),
    #[error("parse options {}", .0.display())]
    Parse(PathBuf),
}

/// One CLI invocation's transformer plus the runner-side settings.
pub struct Session {
    transformer: Transformer,
    project: ProjectConfig,
    caps: CapabilityOverrides,
}

impl Session {
    pub fn open(
        compiler: &str,
        cwd: Option<PathBuf>,
        root_dir: Option<PathBuf>,
        options: Option<&Path>,
        caps: CapabilityOverrides,
    ) -> anyhow::Result<Self> {
        let cwd = match cwd {
            Some(dir) => dir,
            None => std::env::current_dir().context("read current dir")?,
        };
        let root_dir = root_dir.unwrap_or_else(|| cwd.clone());
        let user = options.map(load_user_options).transpose()?;

        let compiler = CommandCompiler::parse(compiler)?.current_dir(&cwd);
        let transformer = create_transformer(Arc::new(compiler), user);
        info!(cwd = %cwd.display(), root_dir = %root_dir.display(), "session ready");

        Ok(Self {
            transformer,
            project: ProjectConfig { cwd, root_dir },
            caps,
        })
    }

    /// Source paths are relative to `--cwd`, not the process directory.
    fn resolve(&self, file: &Path) -> PathBuf {
        paths::absolute(&self.project.cwd, file)
    }

    // ── cache-key ───────────────────────────────────────────────────

    pub fn cache_key(&self, file: &Path, config_string: &str, instrument: bool) -> anyhow::Result<()> {
        let key = self.key_for(file, config_string, instrument)?;
        println!("{key}");
        Ok(())
    }

    fn key_for(&self, file: &Path, config_string: &str, instrument: bool) -> anyhow::Result<String> {
        let file = self.resolve(file);
        let data = fs::read(&file).with_context(|| InputError::Read(file.clone()))?;
        let options = CacheKeyOptions {
            config: self.project.clone(),
            instrument,
            capabilities: self.caps,
        };
        let key = self
            .transformer
            .get_cache_key(&data, &file, config_string, &options)?;
        Ok(key)
    }

    // ── process ─────────────────────────────────────────────────────

    pub fn process(
        &self,
        file: &Path,
        instrument: bool,
        out: Option<&Path>,
        map: Option<&Path>,
    ) -> anyhow::Result<()> {
        let file = self.resolve(file);
        let src = fs::read_to_string(&file).with_context(|| InputError::Read(file.clone()))?;
        let options = TransformOptions {
            instrument,
            capabilities: self.caps,
        };
        let result = self
            .transformer
            .process(&src, &file, &self.project, Some(&options))?;

        if let ProcessOutput::Unchanged(_) = result {
            eprintln!(
                "{} {}",
                "note:".yellow().bold(),
                "Babel produced no code; emitting the source unchanged".dimmed()
            );
        }

        match out {
            Some(path) => fs::write(path, result.code())
                .with_context(|| format!("write {}", path.display()))?,
            None => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(result.code().as_bytes())?;
                stdout.flush()?;
            }
        }

        if let Some(path) = map {
            match result.map() {
                Some(source_map) => {
                    let body = serde_json::to_string(source_map)?;
                    fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
                }
                None => eprintln!("{}", "  (no source map produced)".dimmed()),
            }
        }
        Ok(())
    }

    // ── config ──────────────────────────────────────────────────────

    pub fn config(&self, file: &Path) -> anyhow::Result<()> {
        let partial = self
            .transformer
            .load_config(&self.project.cwd, file, &self.caps)?;

        let files = [("config ", &partial.config), ("babelrc", &partial.babelrc)];
        for (label, path) in files {
            let shown = path.as_deref().unwrap_or("—");
            eprintln!("{} {}", label.dimmed(), shown.cyan());
        }
        println!("{}", serde_json::to_string_pretty(&partial.options)?);
        Ok(())
    }
}

fn load_user_options(path: &Path) -> anyhow::Result<UserOptions> {
    let raw = fs::read_to_string(path).with_context(|| InputError::Read(path.to_path_buf()))?;
    let options =
        serde_json::from_str(&raw).with_context(|| InputError::Parse(path.to_path_buf()))?;
    Ok(options)
}
