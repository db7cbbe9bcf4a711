use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chartmetric::{
    Chartmetric, ClientConfig, DEFAULT_API_URL, ProxySettings, RefreshTokenManager,
    api::DEFAULT_PLAYLIST_SPAN,
    http::ReqwestTransport,
    id::{ResourceKind, normalize_id},
};
use clap::Parser;
use serde_json::Value;

/// chartmetric - query the Chartmetric API from the command line
///
/// Authenticates with CHARTMETRIC_TOKEN (an access token) or
/// CHARTMETRIC_REFRESH_TOKEN (exchanged for access tokens as needed).
/// Responses are printed as JSON.
///
/// Examples:
///   chartmetric artist 439
///   chartmetric track-stats 123 spotify --param since=2024-01-01
#[derive(Parser, Debug)]
#[command(author, version = env!("CHARTMETRIC_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Access token (also via CHARTMETRIC_TOKEN)
    #[arg(long, env = "CHARTMETRIC_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Refresh token, used when no access token is given (also via CHARTMETRIC_REFRESH_TOKEN)
    #[arg(
        long,
        env = "CHARTMETRIC_REFRESH_TOKEN",
        hide_env_values = true,
        global = true
    )]
    refresh_token: Option<String>,

    /// API base URL (defaults to https://api.chartmetric.com/api/)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    api_url: Option<String>,

    /// Proxy for all requests
    #[arg(long, value_name = "URL", global = true)]
    proxy: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<u64>,

    /// Attempts for read calls before giving up on 429/5xx
    #[arg(long = "max-retries", value_name = "N", global = true)]
    max_retries: Option<usize>,

    /// Log requests and responses
    #[arg(long, global = true)]
    trace: bool,

    /// Extra query parameter, repeatable
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param, global = true)]
    params: Vec<(String, String)>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Artist metadata
    Artist { id: String },
    /// Social and streaming URLs of an artist
    ArtistUrls { id: String },
    /// Chart entries of an artist
    ArtistCharts { id: String, chart_type: String },
    /// Track metadata
    Track { id: String },
    /// Search everything
    Search { query: String },
    /// Chart entries of a track on a platform
    TrackCharts { id: String, platform: String },
    /// Stats of a track on a platform
    TrackStats { id: String, platform: String },
    /// Playlist metadata
    Playlist { platform: String, id: String },
    /// Playlist history
    PlaylistEvolution { platform: String, id: String },
    /// Tracks on a playlist
    PlaylistTracks {
        platform: String,
        id: String,
        /// "current" or "past"
        #[arg(long, default_value = DEFAULT_PLAYLIST_SPAN)]
        span: String,
    },
    /// Curator metadata
    Curator { platform: String, id: String },
    /// Curators on a platform
    CuratorLists { platform: String },
    /// Raw GET of any API path or absolute URL
    Get { path: String },
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("invalid parameter '{}', expected KEY=VALUE", s))
}

fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let api_url = cli
        .api_url
        .clone()
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let mut config = ClientConfig::new()
        .with_api_url(api_url.clone())
        .with_trace(cli.trace, cli.trace)
        .with_proxy(ProxySettings {
            all: cli.proxy.clone(),
            ..Default::default()
        });

    if let Some(timeout) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(timeout));
    }
    if let Some(max_retries) = cli.max_retries {
        config = config.with_max_retries(max_retries);
    }

    if let Some(token) = &cli.token {
        config = config.with_token(token.clone());
    } else if let Some(refresh_token) = &cli.refresh_token {
        let transport = ReqwestTransport::from_settings(&config.user_agent, &config.proxy)?;
        let manager =
            RefreshTokenManager::new(Arc::new(transport), &api_url, refresh_token.clone());
        config = config.with_credential_manager(Arc::new(manager));
    }

    Ok(config)
}

async fn run(
    client: &Chartmetric,
    command: Commands,
    params: &[(&str, &str)],
) -> Result<Option<Value>> {
    match command {
        Commands::Artist { id } => client.artist(&normalize_id(ResourceKind::Artist, &id)).await,
        Commands::ArtistUrls { id } => {
            client
                .artist_urls(&normalize_id(ResourceKind::Artist, &id))
                .await
        }
        Commands::ArtistCharts { id, chart_type } => {
            client
                .artist_charts(&normalize_id(ResourceKind::Artist, &id), &chart_type, params)
                .await
        }
        Commands::Track { id } => client.track(&normalize_id(ResourceKind::Track, &id)).await,
        Commands::Search { query } => client.search(&query, params).await,
        Commands::TrackCharts { id, platform } => {
            client
                .track_charts(&normalize_id(ResourceKind::Track, &id), &platform, params)
                .await
        }
        Commands::TrackStats { id, platform } => {
            client
                .track_stats(&normalize_id(ResourceKind::Track, &id), &platform, params)
                .await
        }
        Commands::Playlist { platform, id } => {
            client
                .playlist(&platform, &normalize_id(ResourceKind::Playlist, &id))
                .await
        }
        Commands::PlaylistEvolution { platform, id } => {
            client
                .playlist_evolution(&platform, &normalize_id(ResourceKind::Playlist, &id), params)
                .await
        }
        Commands::PlaylistTracks { platform, id, span } => {
            client
                .playlist_tracks(
                    &platform,
                    &normalize_id(ResourceKind::Playlist, &id),
                    Some(span.as_str()),
                )
                .await
        }
        Commands::Curator { platform, id } => {
            client
                .curator(&platform, &normalize_id(ResourceKind::Curator, &id))
                .await
        }
        Commands::CuratorLists { platform } => client.curator_lists(&platform).await,
        Commands::Get { path } => client.get(&path, params, None).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.trace { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let client = Chartmetric::new(build_config(&cli)?)?;
    let params: Vec<(&str, &str)> = cli
        .params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let result = run(&client, cli.command, &params).await?;
    let output = match result {
        Some(value) => serde_json::to_string_pretty(&value).context("Failed to format response")?,
        None => "null".to_string(),
    };
    println!("{}", output);
    Ok(())
}
