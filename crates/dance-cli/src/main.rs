//! `dance-cli`: drive the dance playback core from a terminal.
//!
//! Commands:
//! - `list`: print the catalog
//! - `select <id>`: highlight a dance and print its item view
//! - `play <id>...`: request each dance `--gap-ms` apart, show download
//!   progress, and wait until playback returns to idle

mod config;
mod storage;
mod viewer;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use futures_util::future::join_all;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use dance_core::{Catalog, DanceEvent, DanceLibrary, FetchError, PlayOutcome};
use dance_types::PlaybackPhase;

use crate::config::CliConfig;
use crate::storage::HttpAssetStorage;
use crate::viewer::TimedViewer;

const DEFAULT_CONFIG: &str = "dance.toml";

#[derive(Parser, Debug)]
#[command(name = "dance-cli", version)]
struct Args {
    /// Config file (TOML); `dance.toml` in the working directory is used when present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dance catalog (JSON), overrides the config value
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Base URL for relative asset references, overrides the config value
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List dances in the catalog.
    List,
    /// Highlight a dance without playing it.
    Select { dance_id: String },
    /// Request playback for one or more dances in sequence.
    Play {
        #[arg(required = true)]
        dance_ids: Vec<String>,

        /// Delay between consecutive requests in milliseconds
        #[arg(long, default_value_t = 500)]
        gap_ms: u64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,dance_core=info,dance_cli=info")
        }))
        .init();

    let cfg = load_config(args.config.as_deref())?;
    let catalog_path = config::catalog_from_config(&cfg, args.catalog.as_deref())?;
    let catalog = Catalog::load(&catalog_path)
        .with_context(|| format!("load catalog {:?}", catalog_path))?;
    let base_url = config::base_url_from_config(&cfg, args.base_url.as_deref());
    let cache_dir = config::cache_dir_from_config(&cfg);
    tracing::info!(
        catalog = %catalog_path.display(),
        dances = catalog.len(),
        base_url = ?base_url,
        cache_dir = %cache_dir.display(),
        "starting dance-cli"
    );

    let storage = HttpAssetStorage::new(base_url, cache_dir, config::timeout_from_config(&cfg))?;
    let viewer = TimedViewer::new(config::playback_from_config(&cfg));
    let library = DanceLibrary::new(catalog, Arc::new(storage), Arc::new(viewer));

    match args.command {
        Command::List => {
            list(&library);
            Ok(())
        }
        Command::Select { dance_id } => select(&library, &dance_id),
        Command::Play { dance_ids, gap_ms } => {
            play(&library, &dance_ids, Duration::from_millis(gap_ms)).await
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    match path {
        Some(path) => CliConfig::load(path),
        None => {
            let auto_path = Path::new(DEFAULT_CONFIG);
            if auto_path.exists() {
                CliConfig::load(auto_path)
            } else {
                Ok(CliConfig::default())
            }
        }
    }
}

fn list(library: &DanceLibrary) {
    for item in library.catalog().items() {
        println!("{}\t{}\t{}", item.dance_id, item.name, item.author);
    }
}

fn select(library: &DanceLibrary, dance_id: &str) -> Result<()> {
    let controller = library
        .controller(dance_id)
        .ok_or_else(|| anyhow!("unknown dance id {dance_id}"))?;
    controller.select();
    let view = serde_json::to_string_pretty(&controller.view()).context("encode item view")?;
    println!("{view}");
    Ok(())
}

async fn play(library: &DanceLibrary, dance_ids: &[String], gap: Duration) -> Result<()> {
    let coordinator = library.coordinator().clone();
    ctrlc::set_handler(move || {
        coordinator.pause();
        std::process::exit(130);
    })
    .context("install ctrl-c handler")?;

    let renderer = tokio::spawn(render_progress(library.clone()));
    let results = run_requests(library, dance_ids, gap).await;
    renderer.abort();

    let mut failures = 0usize;
    for (dance_id, result) in results? {
        match result {
            Ok(outcome) => println!("{dance_id}: {outcome:?}"),
            Err(err) => {
                failures += 1;
                eprintln!("{dance_id}: {err}");
            }
        }
    }
    if failures > 0 {
        bail!("{failures} play request(s) failed");
    }
    Ok(())
}

/// Issue one play request per id, `gap` apart, then wait until playback is
/// idle again.
async fn run_requests(
    library: &DanceLibrary,
    dance_ids: &[String],
    gap: Duration,
) -> Result<Vec<(String, Result<PlayOutcome, FetchError>)>> {
    let controllers = dance_ids
        .iter()
        .map(|id| {
            library
                .controller(id)
                .ok_or_else(|| anyhow!("unknown dance id {id}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let requests = controllers.iter().enumerate().map(|(idx, controller)| async move {
        tokio::time::sleep(gap * idx as u32).await;
        (controller.item().dance_id.clone(), controller.request_play().await)
    });
    let results = join_all(requests).await;

    wait_for_idle(library).await;
    Ok(results)
}

/// Print combined download progress as loader events arrive.
async fn render_progress(library: DanceLibrary) {
    let mut events = library.events().subscribe();
    loop {
        match events.recv().await {
            Ok(DanceEvent::Progress { dance_id, .. }) => {
                let Some(controller) = library.controller(&dance_id) else {
                    continue;
                };
                let view = controller.view();
                if view.show_progress {
                    eprintln!("{dance_id}: {}%", view.progress);
                }
            }
            Ok(DanceEvent::StaleResultIgnored { dance_id }) => {
                eprintln!("{dance_id}: superseded");
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "progress renderer lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn wait_for_idle(library: &DanceLibrary) {
    let mut events = library.events().subscribe();
    while library.coordinator().phase() != PlaybackPhase::Idle {
        match events.recv().await {
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => break,
        }
    }
}
