use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use testsift::cache::CacheStore;
use testsift::change::{self, ChangedFile};
use testsift::config::Config;
use testsift::error::Error;
use testsift::logger::TracingLogger;
use testsift::pipeline::{self, RunOptions};
use testsift::{git, report};

#[derive(Parser)]
#[command(
    name = "testsift",
    version,
    about = "Static, explainable test impact analysis for TypeScript/JavaScript"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the tests impacted by a set of changed files
    Analyze {
        /// Changed files, relative to the project root
        paths: Vec<String>,

        /// Project root
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Config file (default: <root>/testsift.config.json)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Read changes from a `git diff --name-status` listing or a plain
        /// path list; `-` reads stdin
        #[arg(long)]
        changes: Option<PathBuf>,

        /// Diff the working tree against this git ref
        #[arg(long, conflicts_with = "changes")]
        base: Option<String>,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,

        /// Force full re-parse, ignoring cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Manage the dependency cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Drop every cached entry
    Clear {
        /// Project root
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Config file (default: <root>/testsift.config.json)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // stderr keeps stdout clean for --json
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fail(e: &Error) -> ! {
    eprintln!("error: {e}");
    if let Some(hint) = e.hint() {
        eprintln!("hint: {hint}");
    }
    std::process::exit(1);
}

fn read_changes(root: &Path, source: &Path) -> Result<Vec<ChangedFile>, Error> {
    let text = if source == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| Error::ChangesRead(source.to_path_buf(), e))?;
        buf
    } else {
        let path = if source.is_absolute() {
            source.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| root.join(source), |cwd| cwd.join(source))
        };
        std::fs::read_to_string(&path).map_err(|e| Error::ChangesRead(path.clone(), e))?
    };
    Ok(change::parse_name_status(&text))
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let logger = TracingLogger;

    match cli.command {
        Commands::Analyze {
            paths,
            root,
            config,
            changes,
            base,
            json,
            no_cache,
        } => {
            let start = Instant::now();
            let root = pipeline::resolve_root(&root).unwrap_or_else(|e| fail(&e));
            let config = Config::load(&root, config.as_deref()).unwrap_or_else(|e| fail(&e));

            let mut changed = match (&changes, &base) {
                (Some(source), _) => read_changes(&root, source).unwrap_or_else(|e| fail(&e)),
                (None, Some(base)) => git::changed_files(&root, base).unwrap_or_else(|e| fail(&e)),
                (None, None) => Vec::new(),
            };
            changed.extend(change::from_paths(&paths));
            if changed.is_empty() {
                eprintln!("error: no changed files given");
                eprintln!("hint: pass paths, --changes <file|->, or --base <ref>");
                std::process::exit(1);
            }

            let result = pipeline::run(&root, &changed, &config, RunOptions { no_cache }, &logger)
                .unwrap_or_else(|e| fail(&e));

            if json {
                report::print_report_json(&result).unwrap_or_else(|e| fail(&e));
            } else {
                report::print_report(&result);
                eprintln!("\n{:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
            }
        }
        Commands::Cache {
            action: CacheAction::Clear { root, config },
        } => {
            let root = pipeline::resolve_root(&root).unwrap_or_else(|e| fail(&e));
            let config = Config::load(&root, config.as_deref()).unwrap_or_else(|e| fail(&e));
            let dir = config.cache_dir(&root);
            let mut cache = CacheStore::load(&dir, &logger);
            cache.clear(&logger);
            println!("cleared {}", cache.path().display());
        }
    }
}
