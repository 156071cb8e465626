//! Mirror Site Table
//!
//! Site records and the built-in production table used when the
//! configuration does not provide its own `[[sites]]` list.

use serde::{Deserialize, Serialize};

/// How a site participates in mirror resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    /// Full URLs are `base_url + remainder`
    DownloadProxy,
    /// A single public share link, matched when the remainder starts with `base_url`
    ShareLink,
}

/// A single mirror or share endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Display label
    pub name: String,

    /// Human-facing URL (DownloadProxy) or the share link itself (ShareLink)
    pub url: String,

    /// Download prefix (DownloadProxy) or path scope of the share (ShareLink)
    pub base_url: String,

    /// Whether the site is returned by the site listing
    #[serde(default = "default_visible")]
    pub visible: bool,

    /// Site kind
    pub kind: SiteKind,
}

/// Public projection of a visible site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteInfo {
    pub name: String,
    pub url: String,
}

fn default_visible() -> bool {
    true
}

impl Site {
    /// Create a download proxy site
    pub fn download_proxy(name: &str, url: &str, base_url: &str, visible: bool) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            base_url: base_url.to_string(),
            visible,
            kind: SiteKind::DownloadProxy,
        }
    }

    /// Create a share link site
    pub fn share_link(name: &str, url: &str, base_url: &str, visible: bool) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            base_url: base_url.to_string(),
            visible,
            kind: SiteKind::ShareLink,
        }
    }

    pub fn is_download_proxy(&self) -> bool {
        self.kind == SiteKind::DownloadProxy
    }

    /// Listing projection of this site
    pub fn info(&self) -> SiteInfo {
        SiteInfo {
            name: self.name.clone(),
            url: self.url.clone(),
        }
    }
}

/// The production site table
pub fn builtin_sites() -> Vec<Site> {
    vec![
        Site::download_proxy(
            "主站",
            "https://resource.yearnstudio.cn",
            "https://resource.yearnstudio.cn/d/123pan/pan",
            true,
        ),
        Site::download_proxy(
            "厚浪云镜像",
            "https://yearnstudio.cdn.houlang.cloud",
            "https://yearnstudio.cdn.houlang.cloud/d/123-test",
            true,
        ),
        Site::download_proxy(
            "EdgeOne海外线路",
            "https://list.yearnstudio.cn",
            "https://list.yearnstudio.cn/d/123pan/pan",
            true,
        ),
        Site::download_proxy(
            "123直链",
            "https://vip.123pan.cn",
            "https://dl.yearnstudio.cn/1814376442/alist/%E5%88%86%E4%BA%AB%E7%94%A8",
            true,
        ),
        Site::share_link(
            "音乐 - 123云盘分享",
            "https://www.123865.com/s/km6bVv-cJ1W3",
            "/%F0%9F%8E%B5%E9%9F%B3%E4%B9%90%20%C2%B7%20Music%E2%80%8E%E2%80%8E%E2%80%8E/",
            false,
        ),
        Site::share_link(
            "游戏 - 123云盘分享",
            "https://www.123865.com/s/km6bVv-bJ1W3",
            "/%F0%9F%8E%AE%E6%B8%B8%E6%88%8F%20%C2%B7%20Game%E2%80%8E%E2%80%8E%E2%80%8E%E2%80%8E%E2%80%8E%E2%80%8E",
            false,
        ),
        Site::share_link(
            "软件 - 123云盘分享",
            "https://www.123865.com/s/km6bVv-7J1W3",
            "/%F0%9F%92%BE%E8%BD%AF%E4%BB%B6%20%C2%B7%20Software%E2%80%8E%E2%80%8E%E2%80%8E/%E5%85%B6%E4%BB%96",
            false,
        ),
        Site::share_link(
            "系统镜像 - 123云盘分享",
            "https://www.123865.com/s/km6bVv-SB1W3",
            "/%E7%B3%BB%E7%BB%9F%E9%95%9C%E5%83%8F%20%C2%B7%20System%20Images%E2%80%8E%E2%80%8E%E2%80%8E%E2%80%8E%E2%80%8E%E2%80%8E",
            false,
        ),
    ]
}

/// Pairs of DownloadProxy sites where one base URL is a prefix of the other.
///
/// Returned as `(earlier, later)` table indices. Resolution picks the earlier
/// site for any input both could match.
pub fn overlapping_proxies(sites: &[Site]) -> Vec<(usize, usize)> {
    let mut overlaps = Vec::new();
    for (i, a) in sites.iter().enumerate() {
        if !a.is_download_proxy() {
            continue;
        }
        for (j, b) in sites.iter().enumerate().skip(i + 1) {
            if !b.is_download_proxy() {
                continue;
            }
            if a.base_url.starts_with(&b.base_url) || b.base_url.starts_with(&a.base_url) {
                overlaps.push((i, j));
            }
        }
    }
    overlaps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_shape() {
        let sites = builtin_sites();
        assert_eq!(sites.len(), 8);

        let proxies: Vec<_> = sites.iter().filter(|s| s.is_download_proxy()).collect();
        assert_eq!(proxies.len(), 4);
        assert!(proxies.iter().all(|s| s.visible));

        // Share links are hidden and follow the proxies
        assert!(sites[4..].iter().all(|s| s.kind == SiteKind::ShareLink && !s.visible));
    }

    #[test]
    fn test_builtin_proxies_do_not_overlap() {
        assert!(overlapping_proxies(&builtin_sites()).is_empty());
    }

    #[test]
    fn test_overlapping_proxies() {
        let sites = vec![
            Site::download_proxy("a", "https://a", "https://a.example/d", true),
            Site::share_link("s", "https://share", "/", false),
            Site::download_proxy("b", "https://a", "https://a.example/d/sub", true),
            Site::download_proxy("c", "https://c", "https://c.example/d", true),
        ];
        assert_eq!(overlapping_proxies(&sites), vec![(0, 2)]);
    }

    #[test]
    fn test_kind_serde_names() {
        let site: Site = toml::from_str(
            r#"
name = "mirror"
url = "https://m.example"
base_url = "https://m.example/d"
kind = "download_proxy"
"#,
        )
        .unwrap();
        assert!(site.visible);
        assert_eq!(site.kind, SiteKind::DownloadProxy);

        let json = serde_json::to_value(SiteKind::ShareLink).unwrap();
        assert_eq!(json, serde_json::json!("share_link"));
    }

    #[test]
    fn test_info_projection() {
        let info = builtin_sites()[1].info();
        assert_eq!(info.name, "厚浪云镜像");
        assert_eq!(info.url, "https://yearnstudio.cdn.houlang.cloud");
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            serde_json::json!({"name": "厚浪云镜像", "url": "https://yearnstudio.cdn.houlang.cloud"})
        );
    }
}
