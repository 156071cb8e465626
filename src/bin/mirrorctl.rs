//! MirrorCtl - Command line client for a running MirrorLink relay
//!
//! Usage:
//!   mirrorctl status          - Check that the relay is online
//!   mirrorctl list            - Show the visible mirror sites
//!   mirrorctl get <url>       - Resolve a URL into its mirrors
//!   mirrorctl check-config    - Validate a configuration file locally

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;

use mirrorlink::api::{ErrorResponse, GetRequest, OnlineResponse};
use mirrorlink::config::MirrorConfig;
use mirrorlink::site::SiteInfo;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:27645";

/// MirrorLink Control Tool
#[derive(Parser)]
#[command(name = "mirrorctl")]
#[command(about = "Query a MirrorLink relay", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "mirrorlink.toml")]
    config: PathBuf,

    /// API endpoint to connect to (overrides config)
    #[arg(short, long)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the relay is online
    Status,
    /// List visible mirror sites
    List,
    /// Resolve a URL into its mirror equivalents
    Get {
        /// Resource URL on any known mirror
        url: String,
    },
    /// Check configuration file for errors
    CheckConfig {
        /// Path to config file to check (defaults to --config path)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

// ============ Config ============

#[derive(Debug, Deserialize)]
struct Config {
    #[serde(default)]
    server: ServerSection,
}

#[derive(Debug, Deserialize, Default)]
struct ServerSection {
    #[serde(default)]
    bind_address: Option<String>,
}

/// Turn a server bind address into a URL reachable from this host
fn endpoint_from_bind(addr: &str) -> String {
    match addr.strip_prefix("0.0.0.0") {
        Some(port) => format!("http://127.0.0.1{}", port),
        None => format!("http://{}", addr),
    }
}

fn endpoint_from_config(path: &PathBuf) -> String {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return DEFAULT_ENDPOINT.to_string(),
    };
    match toml::from_str::<Config>(&content) {
        Ok(Config { server: ServerSection { bind_address: Some(addr) } }) => endpoint_from_bind(&addr),
        _ => DEFAULT_ENDPOINT.to_string(),
    }
}

// ============ Main ============

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let endpoint = match &cli.endpoint {
        Some(e) => e.trim_end_matches('/').to_string(),
        None => endpoint_from_config(&cli.config),
    };

    let result = match &cli.command {
        Commands::Status => show_status(&endpoint).await,
        Commands::List => list_sites(&endpoint).await,
        Commands::Get { url } => get_mirrors(&endpoint, url).await,
        Commands::CheckConfig { file } => {
            let config_path = file.clone().unwrap_or_else(|| cli.config.clone());
            check_config(&config_path)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// ============ Commands ============

async fn show_status(endpoint: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!("{}/", endpoint);
    let response = reqwest::Client::new().get(&url).send().await?;

    if !response.status().is_success() {
        return Err(format!("API error: {}", response.status()).into());
    }

    let status: OnlineResponse = response.json().await?;
    println!("{}: {}", endpoint, status.message);

    Ok(())
}

async fn list_sites(endpoint: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!("{}/api/list", endpoint);
    let response = reqwest::Client::new().get(&url).send().await?;

    if !response.status().is_success() {
        return Err(format!("API error: {}", response.status()).into());
    }

    let sites: Vec<SiteInfo> = response.json().await?;

    println!();
    println!("MirrorLink Sites (mirrorctl v{})", env!("CARGO_PKG_VERSION"));
    println!("==================================");
    println!();
    println!("{:<24} {}", "NAME", "URL");
    println!("{}", "-".repeat(65));
    for site in &sites {
        println!("{:<24} {}", site.name, site.url);
    }
    println!();
    println!("Total: {} sites", sites.len());

    Ok(())
}

async fn get_mirrors(endpoint: &str, resource: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!("{}/api/get", endpoint);
    let response = reqwest::Client::new()
        .post(&url)
        .json(&GetRequest { url: resource.to_string() })
        .send()
        .await?;

    let status = response.status();
    let body: serde_json::Value = response.json().await?;

    if status.is_success() {
        let mirrors: Vec<String> = serde_json::from_value(body)?;
        for mirror in mirrors {
            println!("{}", mirror);
        }
        return Ok(());
    }

    match serde_json::from_value::<ErrorResponse>(body) {
        Ok(err) => Err(format!("Bad request: {}", err.error).into()),
        Err(_) if status == reqwest::StatusCode::BAD_REQUEST => {
            Err(format!("No mirror site matches {}", resource).into())
        }
        Err(_) => Err(format!("API error: {}", status).into()),
    }
}

fn check_config(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("Checking {}", path.display());
    let config = MirrorConfig::from_file(path)?;

    let visible = config.sites.iter().filter(|s| s.visible).count();
    println!("✓ Configuration is valid");
    println!("  Bind Address: {}", config.server.bind_address);
    println!("  Sites:        {} ({} visible)", config.sites.len(), visible);

    let overlaps = mirrorlink::site::overlapping_proxies(&config.sites);
    for (a, b) in overlaps {
        println!(
            "  ⚠ '{}' overlaps '{}' (first match wins)",
            config.sites[a].name, config.sites[b].name
        );
    }

    Ok(())
}
