//! HTTP API Module
//!
//! Exposes the site listing and mirror resolution over HTTP.

mod http;

pub use http::{AppState, ErrorResponse, GetRequest, HttpServer, OnlineResponse};
