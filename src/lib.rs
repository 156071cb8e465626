//! MirrorLink - Mirror URL Relay
//!
//! Given a resource URL on one mirror of a multi-mirror file-hosting setup,
//! MirrorLink returns the equivalent URLs on every other known mirror, plus
//! the public share links whose path scope covers the resource.
//!
//! # Architecture
//!
//! A single [`MirrorResolver`] holds an ordered, immutable site table and
//! answers two questions: which sites are visible, and which mirror URLs
//! correspond to a given URL. The HTTP API wraps it in an axum router with a
//! fixed CORS policy.
//!
//! # Features
//!
//! - Download-proxy mirrors rewritten by base URL prefix
//! - Share-link sites matched by path scope
//! - `http://` and `/p/` preview path normalization
//! - TOML configuration with a built-in production site table

pub mod config;
pub mod error;
pub mod site;
pub mod resolver;
pub mod api;

pub use config::MirrorConfig;
pub use error::{Error, Result};
pub use resolver::{MirrorResolver, ResolverOptions};
pub use site::{Site, SiteInfo, SiteKind};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::MirrorConfig;
    pub use crate::error::{Error, Result};
    pub use crate::resolver::{MirrorResolver, ResolverOptions};
    pub use crate::site::{Site, SiteInfo, SiteKind};
    pub use crate::api::HttpServer;
}
