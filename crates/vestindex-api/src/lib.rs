//! vestindex-api: read-only HTTP endpoints over [`QueryFacade`].
//!
//! | Route | Body |
//! |---|---|
//! | `GET /balances` | `{ "<address>": "<decimal>" }` |
//! | `GET /transfers` | recent transfers, newest first |
//! | `GET /vesting?height=N` | vesting views at `N` (default: cursor) |
//! | `GET /status` | cursor height and view sizes |
//! | `GET /token` | token metadata, 404 if it was not fetched |
//! | `GET /health` | `ok` |

use std::net::SocketAddr;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use vestindex_core::query::QueryFacade;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct VestingQuery {
    height: Option<u64>,
}

async fn balances(State(facade): State<QueryFacade>) -> Response {
    Json(facade.balances().await).into_response()
}

async fn transfers(State(facade): State<QueryFacade>) -> Response {
    Json(facade.recent_transfers().await).into_response()
}

async fn vesting(State(facade): State<QueryFacade>, Query(q): Query<VestingQuery>) -> Response {
    Json(facade.vesting_views(q.height).await).into_response()
}

async fn status(State(facade): State<QueryFacade>) -> Response {
    Json(facade.status().await).into_response()
}

async fn token(State(facade): State<QueryFacade>) -> Response {
    match facade.token() {
        Some(info) => Json(info.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "token metadata unavailable" })),
        )
            .into_response(),
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Create the API router with all endpoints.
pub fn create_router(facade: QueryFacade) -> Router {
    Router::new()
        .route("/balances", get(balances))
        .route("/transfers", get(transfers))
        .route("/vesting", get(vesting))
        .route("/status", get(status))
        .route("/token", get(token))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(facade)
}

/// Serve the API on `addr` until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, facade: QueryFacade, shutdown: F) -> Result<(), ApiError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ApiError::Bind { addr, source })?;
    tracing::info!(%addr, "API server listening");

    axum::serve(listener, create_router(facade))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}
