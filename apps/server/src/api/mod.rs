//! HTTP layer

pub mod handlers;
pub mod middleware;
pub mod routes;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::path::Path;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};

use crate::state::AppState;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(parsed)
}

pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let static_dir = server.static_dir.clone();
    let cors = cors_layer(&server.cors_origins);
    let body_limit = server.max_request_body_size;

    let mut router = Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/api", routes::lookup_routes());

    if Path::new(&static_dir).is_dir() {
        tracing::info!(dir = %static_dir, "Serving static frontend");
        router = router.fallback_service(ServeDir::new(&static_dir));
    } else {
        tracing::debug!(dir = %static_dir, "Static directory not found, frontend disabled");
    }

    router
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
