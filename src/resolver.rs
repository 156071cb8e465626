//! Mirror Resolver
//!
//! Rewrites a resource URL on one mirror into the equivalent URLs on every
//! mirror in the site table, plus the share links whose scope covers it.

use crate::error::{Error, Result};
use crate::site::{Site, SiteInfo, SiteKind};

/// Resolver behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Rewrite the first `/p/` (preview) segment to `/d/` (download)
    pub rewrite_preview_paths: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            rewrite_preview_paths: true,
        }
    }
}

/// Resolves mirror URLs over an immutable, ordered site table
#[derive(Debug, Clone)]
pub struct MirrorResolver {
    sites: Vec<Site>,
    options: ResolverOptions,
}

impl MirrorResolver {
    /// Create a resolver over the given table
    pub fn new(sites: Vec<Site>, options: ResolverOptions) -> Self {
        Self { sites, options }
    }

    /// The full site table, in order
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Name and display URL of every visible site, in table order
    pub fn list_visible_sites(&self) -> Vec<SiteInfo> {
        self.sites
            .iter()
            .filter(|s| s.visible)
            .map(Site::info)
            .collect()
    }

    /// Normalize an incoming URL before matching
    pub fn normalize(&self, url: &str) -> String {
        let mut url = match url.strip_prefix("http://") {
            Some(rest) => format!("https://{}", rest),
            None => url.to_string(),
        };
        if self.options.rewrite_preview_paths {
            url = url.replacen("/p/", "/d/", 1);
        }
        url
    }

    /// First DownloadProxy site whose base URL prefixes `normalized`.
    ///
    /// Ties between overlapping base URLs go to the earliest site in the table.
    pub fn match_site(&self, normalized: &str) -> Option<&Site> {
        self.sites
            .iter()
            .find(|s| s.is_download_proxy() && normalized.starts_with(&s.base_url))
    }

    /// All mirror URLs equivalent to `url`
    pub fn resolve(&self, url: &str) -> Result<Vec<String>> {
        let normalized = self.normalize(url);
        let matched = self
            .match_site(&normalized)
            .ok_or_else(|| Error::NoMatchingSite(url.to_string()))?;

        let remainder = &normalized[matched.base_url.len()..];
        tracing::debug!(
            "Matched {} against site '{}', remainder {}",
            url,
            matched.name,
            remainder
        );

        let mirrors = self
            .sites
            .iter()
            .filter_map(|site| match site.kind {
                SiteKind::DownloadProxy => Some(format!("{}{}", site.base_url, remainder)),
                SiteKind::ShareLink if remainder.starts_with(&site.base_url) => {
                    Some(site.url.clone())
                }
                SiteKind::ShareLink => None,
            })
            .collect();

        Ok(mirrors)
    }
}

impl Default for MirrorResolver {
    fn default() -> Self {
        Self::new(crate::site::builtin_sites(), ResolverOptions::default())
    }
}
