//! HTTP routes for the localization and cache stores

use axum::http::{header, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::routes;
use crate::state::AppState;

/// CORS policy: `*` allows any origin, otherwise only the listed ones
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
    }
}

/// Create the HTTP router
pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        // Localization
        .route("/api/i18n/translate", get(routes::i18n::translate))
        .route(
            "/api/i18n/language",
            get(routes::i18n::get_language).put(routes::i18n::set_language),
        )
        .route("/api/i18n/dictionary", get(routes::i18n::get_dictionary))
        // Image-seen set
        .route(
            "/api/images/{*id}",
            get(routes::images::get_image).put(routes::images::mark_image),
        )
        // Cache maintenance
        .route("/api/cache", delete(routes::cache::clear))
        .route("/api/cache/stats", get(routes::cache::stats))
        .route("/api/cache/cleanup", post(routes::cache::cleanup))
        .layer(cors)
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn start_server(
    router: Router,
    port: u16,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
