//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the post handlers
//! - Wire up middleware (tracing, request ID, timeout, body limit, metrics)
//! - Bind server to listener
//! - Stop accepting and drain on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ApiConfig;
use crate::http::handlers;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::http::response::envelope_bare_errors;
use crate::observability::metrics;
use crate::repository::PostRepository;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn PostRepository>,
}

impl AppState {
    pub fn new(repository: Arc<dyn PostRepository>) -> Self {
        Self { repository }
    }
}

/// HTTP server for the blog API.
pub struct HttpServer {
    router: Router,
    config: ApiConfig,
}

impl HttpServer {
    /// Create a new HTTP server over an already connected repository.
    pub fn new(config: ApiConfig, repository: Arc<dyn PostRepository>) -> Self {
        let router = build_router(&config, AppState::new(repository));
        Self { router, config }
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.timeouts.request_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &ApiConfig, state: AppState) -> Router {
    Router::new()
        .route(
            "/posts",
            get(handlers::get_all)
                .post(handlers::insert_one)
                .put(handlers::update_many)
                .patch(handlers::update_many),
        )
        .route(
            "/posts/{id}",
            get(handlers::get_one)
                .put(handlers::update_one)
                .patch(handlers::update_one)
                .delete(handlers::delete_one),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
        .layer(middleware::from_fn(metrics::track_requests))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(middleware::from_fn(envelope_bare_errors))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(set_request_id_layer())
}
