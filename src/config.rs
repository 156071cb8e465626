//! MirrorLink Configuration
//!
//! This module provides configuration structures for the MirrorLink
//! relay. Every section is optional; a missing `[[sites]]` list falls back
//! to the built-in production table.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::resolver::{MirrorResolver, ResolverOptions};
use crate::site::{self, Site};

/// Main MirrorLink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// CORS policy
    #[serde(default)]
    pub cors: CorsConfig,

    /// Resolver options
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Ordered site table
    #[serde(default = "site::builtin_sites")]
    pub sites: Vec<Site>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Verbose request and framework logging
    #[serde(default)]
    pub debug: bool,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Enable the CORS layer
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Origins allowed to call the API
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Preflight cache lifetime in seconds
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
}

/// Resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Rewrite `/p/` preview paths to `/d/` download paths before matching
    #[serde(default = "default_true")]
    pub rewrite_preview_paths: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:27645".to_string()
}

fn default_true() -> bool {
    true
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "https://mirror.yearnstudio.cn".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

fn default_max_age_secs() -> u64 {
    12 * 60 * 60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            debug: false,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: default_allowed_origins(),
            max_age_secs: default_max_age_secs(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            rewrite_preview_paths: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            cors: CorsConfig::default(),
            resolver: ResolverConfig::default(),
            logging: LoggingConfig::default(),
            sites: site::builtin_sites(),
        }
    }
}

impl CorsConfig {
    /// Preflight cache lifetime as Duration
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

impl MirrorConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML file, or use defaults if it does not exist
    pub fn load_or_default(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> crate::Result<Self> {
        let config: MirrorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.server.bind_address.is_empty() {
            return Err(crate::Error::Config("server.bind_address cannot be empty".into()));
        }

        for (i, site) in self.sites.iter().enumerate() {
            if site.name.is_empty() {
                return Err(crate::Error::Config(format!("sites[{}].name cannot be empty", i)));
            }
            if site.base_url.is_empty() {
                return Err(crate::Error::Config(format!(
                    "sites[{}] ({}): base_url cannot be empty",
                    i, site.name
                )));
            }
        }

        if self.cors.enabled {
            if self.cors.max_age_secs == 0 {
                return Err(crate::Error::Config("cors.max_age_secs must be positive".into()));
            }
            for origin in &self.cors.allowed_origins {
                if origin == "*" || origin.parse::<axum::http::HeaderValue>().is_err() {
                    return Err(crate::Error::Config(format!(
                        "cors.allowed_origins: invalid origin {:?}",
                        origin
                    )));
                }
            }
        }

        Ok(())
    }

    /// Log a warning for every pair of overlapping download proxies
    pub fn report_overlaps(&self) -> usize {
        let overlaps = site::overlapping_proxies(&self.sites);
        for &(a, b) in &overlaps {
            tracing::warn!(
                "Download proxy '{}' overlaps '{}'; URLs matching both resolve against '{}'",
                self.sites[a].name,
                self.sites[b].name,
                self.sites[a].name
            );
        }
        overlaps.len()
    }

    /// Resolver options from the `[resolver]` section
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            rewrite_preview_paths: self.resolver.rewrite_preview_paths,
        }
    }

    /// Build the resolver for this configuration
    pub fn build_resolver(&self) -> MirrorResolver {
        MirrorResolver::new(self.sites.clone(), self.resolver_options())
    }

    /// Render this configuration as a TOML document
    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::SiteKind;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = MirrorConfig::from_str("").unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:27645");
        assert!(!config.server.debug);
        assert!(config.cors.enabled);
        assert_eq!(config.cors.max_age(), Duration::from_secs(43200));
        assert_eq!(config.cors.allowed_origins.len(), 2);
        assert!(config.resolver.rewrite_preview_paths);
        assert_eq!(config.sites.len(), 8);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
bind_address = "127.0.0.1:9000"
debug = true

[cors]
allowed_origins = ["https://mirror.example.com"]
max_age_secs = 600

[resolver]
rewrite_preview_paths = false

[[sites]]
name = "Main"
url = "https://resource.example.com"
base_url = "https://resource.example.com/d/pan"
kind = "download_proxy"

[[sites]]
name = "Share"
url = "https://share.example.com/s/abc"
base_url = "/music/"
visible = false
kind = "share_link"
"#;

        let config = MirrorConfig::from_str(toml).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert!(config.server.debug);
        assert_eq!(config.cors.max_age_secs, 600);
        assert!(!config.resolver_options().rewrite_preview_paths);
        assert_eq!(config.sites.len(), 2);
        assert!(config.sites[0].visible);
        assert_eq!(config.sites[1].kind, SiteKind::ShareLink);

        let resolver = config.build_resolver();
        assert_eq!(
            resolver.resolve("https://resource.example.com/d/pan/music/a.mp3").unwrap(),
            vec![
                "https://resource.example.com/d/pan/music/a.mp3",
                "https://share.example.com/s/abc",
            ]
        );
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let toml = r#"
[[sites]]
name = "Broken"
url = "https://broken.example.com"
base_url = ""
kind = "download_proxy"
"#;
        let err = MirrorConfig::from_str(toml).unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn test_wildcard_origin_rejected() {
        let toml = r#"
[cors]
allowed_origins = ["*"]
"#;
        assert!(MirrorConfig::from_str(toml).is_err());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let toml = r#"
[[sites]]
name = "x"
url = "https://x"
base_url = "https://x/d"
kind = "torrent"
"#;
        assert!(matches!(
            MirrorConfig::from_str(toml),
            Err(crate::Error::ConfigParse(_))
        ));
    }

    #[test]
    fn test_round_trip_through_file() {
        let rendered = MirrorConfig::default().to_toml().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(rendered.as_bytes()).unwrap();

        let loaded = MirrorConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded.sites, site::builtin_sites());
        assert_eq!(loaded.server.bind_address, "0.0.0.0:27645");
    }

    #[test]
    fn test_report_overlaps() {
        let toml = r#"
[[sites]]
name = "a"
url = "https://a"
base_url = "https://a.example/d"
kind = "download_proxy"

[[sites]]
name = "b"
url = "https://a"
base_url = "https://a.example/d/b"
kind = "download_proxy"
"#;
        let config = MirrorConfig::from_str(toml).unwrap();
        assert_eq!(config.report_overlaps(), 1);
        assert_eq!(MirrorConfig::default().report_overlaps(), 0);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = MirrorConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.sites.len(), 8);
    }
}
