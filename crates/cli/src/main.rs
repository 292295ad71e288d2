//! roomwatch entry point.
//!
//! Polls every tracked room once and prints the batch report as JSON on
//! stdout. Logging goes to stderr so stdout stays machine-readable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use roomwatch_client::{HttpClient, HttpConfig, Registry, update_rooms};
use roomwatch_core::{AppConfig, CacheDb};

#[derive(Debug, Parser)]
#[command(name = "roomwatch", about = "Poll tracked live rooms and print a JSON report")]
struct Args {
    /// JSON file holding the tracked room URLs.
    rooms_file: PathBuf,

    /// Tenant key for the snapshot cache.
    #[arg(long, default_value = "default")]
    user: String,

    /// Delete expired cache entries after the update.
    #[arg(long)]
    sweep: bool,
}

/// Tracked-rooms file: either a plain URL array or the legacy
/// `[{"url": ...}]` object form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RoomsFile {
    Urls(Vec<String>),
    Entries(Vec<RoomEntry>),
}

#[derive(Debug, Deserialize)]
struct RoomEntry {
    url: String,
}

fn load_rooms(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let parsed: RoomsFile = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    Ok(match parsed {
        RoomsFile::Urls(urls) => urls,
        RoomsFile::Entries(entries) => entries.into_iter().map(|e| e.url).collect(),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::load()?;

    let urls = load_rooms(&args.rooms_file)?;
    tracing::info!(rooms = urls.len(), user = %args.user, "starting batch update");

    let cache = CacheDb::open(&config.db_path, config.cache_ttl()).await?;
    let http = HttpClient::new(HttpConfig {
        user_agent: config.user_agent.clone(),
        timeout: config.timeout(),
        ..Default::default()
    })?;
    let registry = Arc::new(Registry::new(http, Some(config.douyin_api_base.clone())));

    let report = update_rooms(&registry, &cache, &args.user, &urls, config.max_concurrency).await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if args.sweep {
        let removed = cache.sweep().await?;
        tracing::info!(removed, "cache sweep complete");
    }

    Ok(())
}
