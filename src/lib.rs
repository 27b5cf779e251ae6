pub mod config;
pub mod daemon;
pub mod indexer;
pub mod model;
pub mod render;
pub mod search;
pub mod sync;

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use config::ServiceConfig;
use indexer::{GenerationManager, STAGING_OUTPUT, parse_entity_list};
use model::{EntityType, OutputFormat};
use render::RenderOptions;
use search::facade::EntitySearch;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "mbsearch",
    version,
    about = "Catalog text search over rotating index generations"
)]
pub struct Cli {
    /// Config file (defaults to $MBSEARCH_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Also write logs to a daily-rolling file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one query against the current generation and print the rendered page
    Search {
        #[arg(long, value_enum)]
        entity: EntityType,

        /// Raw query text, passed through unchanged
        query: OsString,

        #[arg(long, value_enum, default_value_t = OutputFormat::Html)]
        format: OutputFormat,

        /// Page size; values below 1 mean 25
        #[arg(long, default_value_t = 25, allow_negative_numbers = true)]
        max_hits: i64,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Label to read from (defaults to the first label containing the entity)
        #[arg(long, conflicts_with = "generation")]
        label: Option<String>,

        /// Read this generation directory instead of the newest published one
        #[arg(long)]
        generation: Option<PathBuf>,

        #[arg(long, default_value_t = 0)]
        tagger_port: u16,

        #[arg(long)]
        relationship_link: bool,

        /// Length of the track being looked up, in milliseconds
        #[arg(long)]
        duration_ms: Option<u64>,
    },
    /// Build indexes from JSON-lines exports (usable as the generation builder)
    Load {
        /// Directory holding `<entity>.jsonl` files
        #[arg(long)]
        source: PathBuf,

        /// Where per-entity indexes are written
        #[arg(long, default_value = STAGING_OUTPUT)]
        output: PathBuf,

        /// Comma-separated entity types
        entities: String,
    },
    /// Run a single build/publish/retain cycle for one label
    Cycle {
        #[arg(long)]
        label: String,
    },
    /// Start the sync daemon and rebuild every label forever
    Run,
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate man page to stdout
    Man,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = ServiceConfig::load(cli.config.as_deref()).context("loading configuration")?;

    let default_level = match cli.command {
        Commands::Cycle { .. } | Commands::Run | Commands::Load { .. } => "info",
        _ => "warn",
    };
    let log_dir = cli.log_dir.clone().or_else(|| config.log_dir.clone());
    let _guard = init_tracing(default_level, log_dir.as_deref())?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        built = option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown"),
        "mbsearch starting"
    );

    match cli.command {
        Commands::Search {
            entity,
            query,
            format,
            max_hits,
            offset,
            label,
            generation,
            tagger_port,
            relationship_link,
            duration_ms,
        } => {
            let render = RenderOptions {
                tagger_port,
                show_relationship_link: relationship_link,
                duration_ms,
                link_timestamp: None,
            };
            let options = config.search_options(render);
            let facade = match generation {
                Some(dir) => EntitySearch::open(&dir, entity, options)?,
                None => {
                    let label = match label {
                        Some(name) => config.label(&name)?,
                        None => config
                            .labels()?
                            .into_iter()
                            .find(|l| l.entities.contains(&entity))
                            .ok_or_else(|| anyhow::anyhow!("no configured label builds {entity}"))?,
                    };
                    EntitySearch::open_current(&config.layout(), &label.name, entity, options)?
                }
            };
            let body = facade.search(&query_bytes(&query), max_hits, offset, format)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&body)?;
            stdout.flush()?;
            Ok(())
        }
        Commands::Load {
            source,
            output,
            entities,
        } => {
            let entities = parse_entity_list(&entities)?;
            let reports = indexer::load::load_generation(&source, &output, &entities)?;
            for report in reports {
                info!(entity = %report.entity, documents = report.documents, skipped = report.skipped, "loaded");
            }
            Ok(())
        }
        Commands::Cycle { label } => {
            let label = config.label(&label)?;
            let mut manager = GenerationManager::new(config.layout(), label, config.builder()?);
            let published = tokio::task::spawn_blocking(move || manager.run_cycle())
                .await
                .context("cycle task panicked")??;
            println!("{}", published.path.display());
            Ok(())
        }
        Commands::Run => {
            if let Some(daemon) = config.sync_daemon() {
                daemon.start().context("starting sync daemon")?;
            }
            let builder = config.builder()?;
            let managers = config
                .labels()?
                .into_iter()
                .map(|label| GenerationManager::new(config.layout(), label, builder.clone()))
                .collect();
            daemon::run_forever(managers, config.backoff()).await
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "mbsearch", &mut std::io::stdout());
            Ok(())
        }
        Commands::Man => {
            let cmd = Cli::command();
            let man = clap_mangen::Man::new(cmd);
            let mut out = std::io::stdout();
            man.render(&mut out)?;
            Ok(())
        }
    }
}

/// Stderr logging filtered by `RUST_LOG`, plus an optional daily file.
fn init_tracing(default_level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).with_context(|| format!("creating log dir {}", dir.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "mbsearch.log"));
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;
    Ok(guard)
}

#[cfg(unix)]
fn query_bytes(query: &OsString) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    query.as_bytes().to_vec()
}

#[cfg(not(unix))]
fn query_bytes(query: &OsString) -> Vec<u8> {
    query.to_string_lossy().into_owned().into_bytes()
}
