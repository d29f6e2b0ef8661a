// rest/mod.rs — public HTTP JSON API.
//
// Axum router under /api, CORS permissive (the browser UI is served from a
// different origin).
//
// Endpoints:
//   POST /api/predict-timeline
//   POST /api/generate-contract-content
//   GET  /api/clients            POST /api/clients    PUT /api/clients/{id}
//   GET  /api/projects           POST /api/projects
//   GET  /api/tasks              POST /api/tasks      PUT /api/tasks/{id}
//   GET  /api/tasks/pending-count
//   GET  /api/health
//   GET  /                        (plain-text liveness banner)

pub mod error;
pub mod routes;

use anyhow::Result;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(routes::health::root))
        .route("/api/health", get(routes::health::health))
        // AI
        .route("/api/predict-timeline", post(routes::ai::predict_timeline))
        .route(
            "/api/generate-contract-content",
            post(routes::ai::generate_contract_content),
        )
        // Clients
        .route(
            "/api/clients",
            get(routes::clients::list_clients).post(routes::clients::create_client),
        )
        .route("/api/clients/{id}", put(routes::clients::update_client))
        // Projects
        .route(
            "/api/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        // Tasks
        .route(
            "/api/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/api/tasks/pending-count", get(routes::tasks::pending_count))
        .route("/api/tasks/{id}", put(routes::tasks::update_task))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

pub async fn serve(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
