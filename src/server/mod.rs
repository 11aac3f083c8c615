//! HTTP server
//!
//! Axum router over a shared [`Hackboard`], with request tracing and
//! graceful shutdown on Ctrl+C or SIGTERM.

pub mod routes;
mod session;

pub use session::bearer_token;

use crate::service::Hackboard;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state for every handler
pub type AppState = Arc<Hackboard>;

/// Create the HTTP router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/events", get(routes::list_events))
        .route("/api/invite/generate", post(routes::generate_invite))
        .route("/api/invite/accept", post(routes::accept_invite))
        .route("/api/roles/set-password", post(routes::set_role_password))
        .route("/api/roles/verify", post(routes::verify_role))
        .route("/api/projects/submit", post(routes::submit_project))
        .route("/api/projects/{id}/invite-link", get(routes::project_invite_link))
        .route(
            "/api/projects/{id}/feedback",
            get(routes::project_feedback).post(routes::submit_feedback),
        )
        .route(
            "/api/projects/{id}/scores",
            get(routes::project_scores).post(routes::submit_score),
        )
        .route("/api/projects/join/{id}/{hash}", post(routes::join_project))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until a shutdown signal arrives
pub async fn run_server(bind_addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
