use babel_jest::{CapabilityOverrides, TransformError};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing::Level;

mod commands;

/// Exit codes: 0 = OK, 2 = input error, 3 = file ignored by Babel, 1 = other.
#[allow(dead_code)]
const EXIT_OK: i32 = 0;
const EXIT_OTHER: i32 = 1;
const EXIT_INPUT: i32 = 2;
const EXIT_IGNORED: i32 = 3;

#[derive(Parser)]
#[command(name = "bjx", version, about = "babel-jest CLI — cache keys, transforms, resolved config")]
struct Cli {
    /// Command that speaks the compiler bridge protocol
    #[arg(long, env = "BJX_COMPILER", default_value = "node bridge/babel-bridge.js")]
    compiler: String,

    /// Working directory Babel resolves config from (default: current dir)
    #[arg(long, env = "BJX_CWD")]
    cwd: Option<PathBuf>,

    /// Project root used for relative paths and coverage (default: cwd)
    #[arg(long)]
    root_dir: Option<PathBuf>,

    /// JSON file with user Babel options (plugins, presets, ...)
    #[arg(long)]
    options: Option<PathBuf>,

    #[command(flatten)]
    caps: CapabilityArgs,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Runner capabilities to report to Babel for this invocation.
#[derive(Args)]
struct CapabilityArgs {
    /// Runner supports dynamic import()
    #[arg(long)]
    dynamic_import: bool,
    /// Runner supports `export * as ns from`
    #[arg(long)]
    export_namespace_from: bool,
    /// Runner executes native ES modules
    #[arg(long)]
    static_esm: bool,
    /// Runner supports top-level await
    #[arg(long)]
    top_level_await: bool,
}

impl CapabilityArgs {
    /// Only flags actually passed become overrides.
    fn overrides(&self) -> CapabilityOverrides {
        let on = |flag: bool| flag.then_some(true);
        CapabilityOverrides {
            supports_dynamic_import: on(self.dynamic_import),
            supports_export_namespace_from: on(self.export_namespace_from),
            supports_static_esm: on(self.static_esm),
            supports_top_level_await: on(self.top_level_await),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cache key Jest would use for a file
    CacheKey {
        /// Source file
        file: PathBuf,
        /// Runner configuration fingerprint
        #[arg(long, default_value = "")]
        config_string: String,
        /// Key for an instrumented (coverage) build
        #[arg(long)]
        instrument: bool,
    },
    /// Transform a file with Babel
    Process {
        /// Source file
        file: PathBuf,
        /// Add coverage instrumentation
        #[arg(long)]
        instrument: bool,
        /// Write code here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write the source map here
        #[arg(long)]
        map: Option<PathBuf>,
    },
    /// Print the resolved Babel config for a file
    Config {
        /// Source file
        file: PathBuf,
    },
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(TransformError::Ignored { .. }) = err.downcast_ref::<TransformError>() {
        EXIT_IGNORED
    } else if err.downcast_ref::<commands::InputError>().is_some() {
        EXIT_INPUT
    } else {
        EXIT_OTHER
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = commands::Session::open(
        &cli.compiler,
        cli.cwd,
        cli.root_dir,
        cli.options.as_deref(),
        cli.caps.overrides(),
    )
    .and_then(|session| match cli.command {
        Commands::CacheKey {
            file,
            config_string,
            instrument,
        } => session.cache_key(&file, &config_string, instrument),
        Commands::Process {
            file,
            instrument,
            out,
            map,
        } => session.process(&file, instrument, out.as_deref(), map.as_deref()),
        Commands::Config { file } => session.config(&file),
    });

    if let Err(e) = result {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        process::exit(exit_code_for(&e));
    }
}
