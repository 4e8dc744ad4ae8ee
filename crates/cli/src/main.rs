//! moviefinder - find a movie, pick a torrent, send it to Transmission.

mod display;
mod flow;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use dialoguer::{Input, Password, Select};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use moviefinder_core::{
    config::TransmissionConfig, load_config, load_config_from_env, validate_config, Aggregator,
    Config, ProviderSelection, SanitizedConfig, SearchTarget, TmdbClient, TransmissionClient,
};

/// Config file looked up in the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "moviefinder.toml";

#[derive(Debug, Parser)]
#[command(name = "moviefinder", version)]
#[command(about = "Search a movie, pick a torrent, hand it to Transmission")]
struct Cli {
    /// Search movie by title
    #[arg(short, long, conflicts_with = "id")]
    title: Option<String>,

    /// Search movie by ID: IMDb (`tt0083658`, or just the digits) or TMDB (`tmdb:78`)
    #[arg(short, long)]
    id: Option<String>,

    /// Search torrents on YTS and Jackett, otherwise only YTS is used
    #[arg(short, long)]
    all: bool,

    /// Maximum number of metadata results
    #[arg(short, long)]
    num: Option<usize>,

    /// Include TV shows in search
    #[arg(long)]
    tv: bool,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration (secrets redacted) and exit
    #[arg(long)]
    show_config: bool,

    /// Print torrent results as JSON instead of prompting
    #[arg(long)]
    json: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            load_config(Path::new(DEFAULT_CONFIG_FILE)).with_context(|| {
                format!("Failed to load config from {:?}", DEFAULT_CONFIG_FILE)
            })?
        }
        None => load_config_from_env().context("Failed to load config from environment")?,
    };
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load(cli.config.as_deref())?;

    if cli.show_config {
        let sanitized = SanitizedConfig::from(&config);
        println!("{}", serde_json::to_string_pretty(&sanitized)?);
        return Ok(());
    }

    if cli.title.is_none() && cli.id.is_none() {
        Cli::command()
            .error(
                clap::error::ErrorKind::MissingRequiredArgument,
                "one of --title or --id is required",
            )
            .exit();
    }

    let tmdb = config
        .tmdb
        .clone()
        .context("Metadata lookup needs a TMDB API key, set [tmdb] api_key")?;
    let lookup = TmdbClient::new(tmdb).context("Failed to create TMDB client")?;

    // 1. Metadata lookup
    let Some(target) = pick_title(&cli, &config, &lookup).await? else {
        println!("No metadata results");
        return Ok(());
    };
    info!(id = %target.id, title = %target.title, "Searching torrents");

    // 2. Torrent aggregation
    let aggregator = Aggregator::from_config(&config);
    let selection = ProviderSelection::from_config(&config, cli.all);
    if let Err(e) = aggregator.configure(target, &selection).await {
        warn!(error = %e, "Provider configuration incomplete");
        eprintln!("warning: {}", e);
    }
    let outcome = aggregator.run().await?;
    for failure in &outcome.errors {
        eprintln!("warning: {}", failure);
    }

    let results = outcome.record.results().await;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }
    if results.is_empty() {
        println!("No torrents found");
        return Ok(());
    }

    let rows: Vec<String> = results.iter().map(display::torrent_row).collect();
    let Some(choice) = Select::new()
        .with_prompt("Pick a torrent")
        .items(&rows)
        .default(0)
        .interact_opt()?
    else {
        return Ok(());
    };
    let chosen = &results[choice];

    // 3. Hand-off
    let transmission = match &config.transmission {
        Some(transmission) => {
            info!("Using configured Transmission endpoint");
            transmission.clone()
        }
        None => prompt_transmission(chosen.url())?,
    };
    let daemon = TransmissionClient::new(transmission)?;
    let message = flow::hand_off(&daemon, chosen.url()).await?;
    println!("{}", message);

    Ok(())
}

async fn pick_title(
    cli: &Cli,
    config: &Config,
    lookup: &TmdbClient,
) -> Result<Option<SearchTarget>> {
    if let Some(id) = &cli.id {
        return Ok(flow::target_by_id(lookup, id).await);
    }

    let title = cli.title.as_deref().unwrap_or_default();
    let max_results = cli.num.unwrap_or(config.search.max_results);
    let include_tv = cli.tv || config.search.include_tv;

    let candidates = flow::search_titles(lookup, title, max_results, include_tv).await;
    if candidates.is_empty() {
        return Ok(None);
    }

    let labels: Vec<String> = candidates.iter().map(|c| c.label()).collect();
    let Some(choice) = Select::new()
        .with_prompt("Pick a title")
        .items(&labels)
        .default(0)
        .interact_opt()?
    else {
        return Ok(None);
    };

    Ok(Some(flow::target_for(lookup, &candidates[choice]).await))
}

fn prompt_transmission(magnet: &str) -> Result<TransmissionConfig> {
    eprintln!("No [transmission] section configured, enter RPC settings:");
    eprintln!("Or download the magnet directly: {}", magnet);

    let url: String = Input::new()
        .with_prompt("RPC address")
        .default("http://localhost:9091/transmission/rpc".to_string())
        .interact_text()?;
    let username: String = Input::new()
        .with_prompt("Username")
        .allow_empty(true)
        .interact_text()?;
    let password = Password::new()
        .with_prompt("Password")
        .allow_empty_password(true)
        .interact()?;

    Ok(TransmissionConfig {
        url,
        username: Some(username).filter(|u| !u.is_empty()),
        password: Some(password).filter(|p| !p.is_empty()),
        download_dir: None,
        timeout_secs: 30,
    })
}
