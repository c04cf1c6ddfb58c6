//! Axum router construction for the Review Board server.
//!
//! Assembles all routes (REST, pages, event stream, static assets) into a
//! single [`Router`] with CORS and request tracing.

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::ServerConfig;
use crate::handlers;
use crate::sse;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// List names are taken from the rest of the path, so they may contain
/// `/`. Unknown paths receive the usage text with `400`.
pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allow_origin(&config.cors_origin))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // Pages
        .route("/", get(handlers::index))
        .route("/index.html", get(handlers::index))
        .route("/test", get(handlers::test_page))
        // Board
        .route("/meta", get(handlers::meta))
        .route("/timeout/{seconds}", get(handlers::set_timeout))
        .route(
            "/add/{*name}",
            get(handlers::create_list).post(handlers::seed_list),
        )
        .route("/delete/{*name}", get(handlers::delete_list))
        .route("/list/{*name}", get(handlers::get_list))
        .route("/open/{*name}", get(handlers::open_item))
        .route("/close/{*name}", get(handlers::close_item))
        // Event stream
        .route("/mcp", post(handlers::handshake))
        .route("/mcp/sse", get(sse::event_stream))
        .route("/mcp/sse/", get(sse::event_stream))
        // Static assets
        .nest_service("/assets", ServeDir::new(&config.assets_dir))
        .fallback(handlers::usage)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn allow_origin(origin: &str) -> AllowOrigin {
    if origin == "*" {
        return AllowOrigin::any();
    }
    HeaderValue::from_str(origin).map_or_else(
        |e| {
            warn!(origin, "Invalid CORS origin, allowing any: {e}");
            AllowOrigin::any()
        },
        AllowOrigin::exact,
    )
}
