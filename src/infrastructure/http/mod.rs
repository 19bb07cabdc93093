pub mod request_id;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::controllers::{generator::GeneratorController, health};
use crate::infrastructure::config::Config;
use crate::infrastructure::repositories::ContentRepository;

pub use request_id::{request_id_middleware, RequestId, X_REQUEST_ID};

/// Build the application router with all routes configured
pub fn create_router(
    generator_controller: Arc<GeneratorController>,
    content_repo: Arc<dyn ContentRepository>,
) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(content_repo);

    let generator_routes = Router::new()
        .route("/api/generator/queue", post(GeneratorController::generate_queue))
        .route(
            "/api/generator/article",
            post(GeneratorController::generate_article),
        )
        .with_state(generator_controller);

    Router::new()
        .merge(health_routes)
        .merge(generator_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_id_middleware)),
        )
}

/// Serve `router` until `shutdown` is cancelled
pub async fn start_http_server(
    config: Arc<Config>,
    router: Router,
    shutdown: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Server stopped");

    Ok(())
}
