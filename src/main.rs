//! MirrorLink - Mirror URL Relay
//!
//! Serves the site listing and mirror resolution API, and offers offline
//! tooling for the site table.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mirrorlink::api::HttpServer;
use mirrorlink::config::MirrorConfig;
use mirrorlink::error::{Error, Result};

/// MirrorLink - Mirror URL Relay
#[derive(Parser)]
#[command(name = "mirrorlink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (built-in defaults if missing)
    #[arg(short, long, default_value = "mirrorlink.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error), overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable verbose request logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Start {
        /// Address to listen on (overrides server.bind_address)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Write a configuration file with the built-in site table
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "mirrorlink.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate configuration file
    Validate,

    /// Print the site table
    Sites {
        /// Include hidden sites
        #[arg(long)]
        all: bool,
    },

    /// Resolve a URL into its mirrors without starting the server
    Resolve {
        /// Resource URL on any known mirror
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match MirrorConfig::load_or_default(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration from {:?}: {}", cli.config, e);
            return Err(e);
        }
    };

    let debug_mode = cli.debug || config.server.debug;
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    init_logging(level, debug_mode, &config.logging.format);

    if cli.config.exists() {
        tracing::debug!("Loaded configuration from {:?}", cli.config);
    } else {
        tracing::debug!("No configuration at {:?}, using built-in defaults", cli.config);
    }

    match cli.command {
        Commands::Start { bind } => run_start(config, bind, debug_mode).await,
        Commands::Init { output, force } => run_init(output, force),
        Commands::Validate => run_validate(&cli.config, &config),
        Commands::Sites { all } => run_sites(&config, all),
        Commands::Resolve { url } => run_resolve(&config, &url),
    }
}

/// Initialize logging
fn init_logging(level: &str, debug_mode: bool, format: &str) {
    let directives = if debug_mode {
        format!("{},mirrorlink=debug,tower_http=debug", level)
    } else {
        level.to_string()
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| directives.into());

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        "compact" => registry.with(tracing_subscriber::fmt::layer().compact()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Start the HTTP API
async fn run_start(mut config: MirrorConfig, bind: Option<String>, debug_mode: bool) -> Result<()> {
    let mode = if debug_mode { "enabled" } else { "disabled" };
    tracing::info!("Resource Mirror Backend");
    tracing::info!("Debug mode {}", mode);

    if let Some(bind) = bind {
        config.server.bind_address = bind;
    }
    config.report_overlaps();

    let resolver = config.build_resolver();
    tracing::info!(
        "Loaded {} sites ({} visible)",
        resolver.sites().len(),
        resolver.list_visible_sites().len()
    );
    if config.cors.enabled {
        tracing::info!("CORS origins: {:?}", config.cors.allowed_origins);
    }

    let server = HttpServer::new(&config, resolver);
    if let Err(e) = server.start().await {
        tracing::error!("HTTP API error: {}", e);
        return Err(e);
    }

    Ok(())
}

/// Generate a configuration file
fn run_init(output: PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists (use --force to overwrite)",
            output.display()
        )));
    }

    let body = MirrorConfig::default().to_toml()?;
    let config_content = format!(
        "# MirrorLink Configuration\n\
         # Generated configuration file\n\
         #\n\
         # Site kinds: \"download_proxy\" sites are rewritten by base_url prefix,\n\
         # \"share_link\" sites are returned when the remainder starts with base_url.\n\
         # Download proxies are matched in table order; the first match wins.\n\n{}",
        body
    );

    std::fs::write(&output, config_content)?;
    println!("Configuration file created: {}", output.display());
    println!("\nEdit the site table and CORS origins as needed.");
    println!("Then start with: mirrorlink --config {} start", output.display());

    Ok(())
}

/// Validate configuration
fn run_validate(path: &std::path::Path, config: &MirrorConfig) -> Result<()> {
    let overlaps = config.report_overlaps();
    let proxies = config.sites.iter().filter(|s| s.is_download_proxy()).count();

    println!("✓ Configuration is valid");
    if !path.exists() {
        println!("  (no file at {}, built-in defaults)", path.display());
    }
    println!("  Bind Address:   {}", config.server.bind_address);
    println!("  Debug:          {}", config.server.debug);
    println!("  CORS:           {}", if config.cors.enabled { "enabled" } else { "disabled" });
    println!("  Sites:          {} ({} download proxies, {} share links)",
        config.sites.len(),
        proxies,
        config.sites.len() - proxies);
    println!("  Preview paths:  {}", if config.resolver.rewrite_preview_paths { "rewritten" } else { "kept" });
    if overlaps > 0 {
        println!("  Overlapping download proxies: {} (first match wins)", overlaps);
    }

    Ok(())
}

/// Print the site table
fn run_sites(config: &MirrorConfig, all: bool) -> Result<()> {
    println!("{:<4} {:<16} {:<8} {:<6} {}", "#", "KIND", "VISIBLE", "", "NAME / URL");
    println!("{}", "-".repeat(72));

    for (i, site) in config.sites.iter().enumerate() {
        if !all && !site.visible {
            continue;
        }
        let kind = if site.is_download_proxy() { "download_proxy" } else { "share_link" };
        println!("{:<4} {:<16} {:<8} {:<6} {}", i, kind, site.visible, "", site.name);
        println!("{:<36} url:  {}", "", site.url);
        println!("{:<36} base: {}", "", site.base_url);
    }

    Ok(())
}

/// Resolve a URL offline
fn run_resolve(config: &MirrorConfig, url: &str) -> Result<()> {
    let resolver = config.build_resolver();
    match resolver.resolve(url) {
        Ok(mirrors) => {
            for mirror in mirrors {
                println!("{}", mirror);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            Err(e)
        }
    }
}
