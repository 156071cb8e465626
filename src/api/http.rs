//! HTTP API Server
//!
//! Liveness probe, site listing and mirror resolution over JSON.

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Json, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::{CorsConfig, MirrorConfig, ServerConfig};
use crate::error::{Error, Result};
use crate::resolver::MirrorResolver;

/// Shared application state
pub struct AppState {
    /// Resolver over the immutable site table
    pub resolver: MirrorResolver,
}

/// HTTP API server
pub struct HttpServer {
    server: ServerConfig,
    cors: CorsConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: &MirrorConfig, resolver: MirrorResolver) -> Self {
        let state = Arc::new(AppState { resolver });

        Self {
            server: config.server.clone(),
            cors: config.cors.clone(),
            state,
        }
    }

    /// Create the router with CORS and request tracing applied
    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/", get(handle_online))
            .route("/api/list", get(handle_list))
            .route("/api/get", post(handle_get))
            .with_state(Arc::clone(&self.state))
            .layer(TraceLayer::new_for_http());

        if self.cors.enabled {
            router.layer(build_cors_layer(&self.cors))
        } else {
            router
        }
    }

    /// Start the HTTP server and run until Ctrl+C
    pub async fn start(&self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.server.bind_address).await?;
        tracing::info!("HTTP API listening on {}", self.server.bind_address);

        self.serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            tracing::info!("Received shutdown signal");
        })
        .await
    }

    /// Serve on an already bound listener until `shutdown` completes
    pub async fn serve<F>(&self, listener: tokio::net::TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| Error::Network(format!("HTTP server error: {}", e)))?;

        tracing::info!("HTTP API stopped");
        Ok(())
    }
}

/// Build the CORS layer from configuration
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            // Wildcards cannot be combined with credentials
            if origin == "*" {
                tracing::warn!("Ignoring wildcard CORS origin; credentials are allowed");
                return None;
            }
            match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                    None
                }
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
        .max_age(config.max_age())
}

// ============ Request/Response Types ============

/// Mirror resolution request
#[derive(Debug, Deserialize, Serialize)]
pub struct GetRequest {
    pub url: String,
}

/// Liveness response
#[derive(Debug, Serialize, Deserialize)]
pub struct OnlineResponse {
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============ Handlers ============

async fn handle_online() -> impl IntoResponse {
    Json(OnlineResponse {
        message: "Online".to_string(),
    })
}

async fn handle_list(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.resolver.list_visible_sites())
}

/// Resolve a URL into its mirror equivalents.
///
/// Malformed bodies answer 400 with `{"error": ...}`; a URL no site matches
/// answers 400 with `{}`.
async fn handle_get(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let req: GetRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => return bad_request(format!("Invalid request body: {}", e)),
    };

    if req.url.is_empty() {
        return bad_request("url is required".to_string());
    }

    match state.resolver.resolve(&req.url) {
        Ok(mirrors) => {
            tracing::debug!("Resolved {} into {} mirrors", req.url, mirrors.len());
            Json(mirrors).into_response()
        }
        Err(e) => {
            tracing::debug!("{}", e);
            (StatusCode::BAD_REQUEST, Json(serde_json::json!({}))).into_response()
        }
    }
}

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
}
