//! REST API for running composer wizards.
//!
//! Exposes wizard definitions, stored drafts and in-memory wizard sessions over
//! HTTP so a form front end can drive the step flow.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod dto;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::ApiState;

/// Build the API router with all routes
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/api/v1/health", get(routes::health::health))
        .route("/api/v1/status", get(routes::health::status))
        .route("/api/v1/openapi.json", get(routes::health::openapi))
        // Wizard endpoints
        .route("/api/v1/wizards", get(routes::wizards::list))
        .route("/api/v1/wizards/:kind/steps", get(routes::wizards::steps))
        // Draft endpoints
        .route("/api/v1/wizards/:kind/drafts", get(routes::drafts::list))
        .route(
            "/api/v1/wizards/:kind/drafts/:index",
            delete(routes::drafts::discard),
        )
        // Session endpoints
        .route(
            "/api/v1/wizards/:kind/sessions",
            post(routes::sessions::create),
        )
        .route("/api/v1/sessions/:id", get(routes::sessions::get_one))
        .route("/api/v1/sessions/:id", delete(routes::sessions::discard))
        .route(
            "/api/v1/sessions/:id/steps/:step_id",
            post(routes::sessions::submit_step),
        )
        .route("/api/v1/sessions/:id/back", post(routes::sessions::back))
        .route(
            "/api/v1/sessions/:id/current/:step_id",
            put(routes::sessions::go_to),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the REST API server and run until Ctrl-C
pub async fn serve(state: ApiState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind REST API to {}", addr))?;
    tracing::info!("REST API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
        .context("REST API server failed")?;

    tracing::info!("REST API stopped");
    Ok(())
}
