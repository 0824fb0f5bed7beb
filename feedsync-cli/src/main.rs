use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use feedsync_core::{
    spawn_scheduler, AppConfig, FeedSync, HttpFetcher, JobHandle, JobKind, JobProgress, JsonStore,
};
use futures_util::StreamExt;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

type Service = FeedSync<JsonStore, HttpFetcher>;

#[derive(Debug, Parser)]
#[command(name = "feedsync", version, about = "Fetch, normalize and store RSS/Atom feeds")]
struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sync one feed URL and print the stored feed.
    Sync { url: String },
    /// Re-sync every stored feed.
    Refresh,
    /// Import feed URLs, or the curated list when none are given.
    Curated { urls: Vec<String> },
    /// Start a job and print progress snapshots until it finishes.
    Watch {
        #[arg(value_enum)]
        job: Job,
    },
    /// Print feed and item counts.
    Stats,
    /// Delete a feed and its items.
    Delete { id: Uuid },
    /// Refresh all feeds on the configured interval until interrupted.
    Serve,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Job {
    Refresh,
    Curated,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let data_dir = config
        .data_dir()
        .context("could not resolve the data directory")?;
    let store = JsonStore::load_from_dir(&data_dir).await;
    let fetcher = HttpFetcher::from_config(&config.sync).context("failed to build HTTP client")?;
    let service = FeedSync::new(store, fetcher, config.sync);
    info!(data_dir = %data_dir.display(), "feedsync ready");

    match cli.command {
        Command::Sync { url } => {
            let synced = service.sync_single_feed(&url).await?;
            print_json(&synced)?;
        }
        Command::Refresh => {
            let progress = service.start_refresh_all().wait().await?;
            print_json(&progress)?;
        }
        Command::Curated { urls } => {
            let urls = if urls.is_empty() {
                service.curated_feeds()
            } else {
                urls
            };
            let progress = service.start_load_curated(urls).wait().await?;
            print_json(&progress)?;
        }
        Command::Watch { job } => {
            let (kind, handle) = match job {
                Job::Refresh => (JobKind::RefreshAll, service.start_refresh_all()),
                Job::Curated => (
                    JobKind::LoadCurated,
                    service.start_load_curated(service.curated_feeds()),
                ),
            };
            watch_until_done(&service, kind, handle).await?;
        }
        Command::Stats => print_json(&service.stats().await?)?,
        Command::Delete { id } => {
            let deleted = service.delete_feed(id).await?;
            if deleted.feed.is_none() {
                warn!(feed = %id, "no such feed");
            }
            print_json(&deleted)?;
        }
        Command::Serve => serve(service).await?,
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(AppConfig::load()),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

async fn watch_until_done(service: &Service, kind: JobKind, handle: JobHandle) -> anyhow::Result<()> {
    if !handle.started() {
        info!(job = %kind, "job already running, attaching");
    }
    let mut updates = Box::pin(service.watch_progress(kind));
    while let Some(progress) = updates.next().await {
        print_json(&progress)?;
        if !progress.is_running {
            break;
        }
    }
    let last: JobProgress = handle.wait().await?;
    print_json(&last)?;
    Ok(())
}

async fn serve(service: Service) -> anyhow::Result<()> {
    let interval = service.config().refresh_interval();
    info!(interval_secs = interval.as_secs(), "starting refresh scheduler");
    let scheduler = spawn_scheduler(service.clone(), interval);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    scheduler.stop().await?;

    let progress = service.progress(JobKind::RefreshAll);
    if progress.is_running {
        info!(processed = progress.processed, total = progress.total, "refresh still running, exiting");
    }
    Ok(())
}
