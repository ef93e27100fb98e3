//! Membership-analytics dashboard backend.
//!
//! Serves the session-gated JSON API consumed by the dashboard frontend:
//! Discord OAuth login, cached current-user reads, and guild-scoped
//! membership listings and statistics translated into queries against the
//! bot's Redis store.

mod config;
mod controller;
mod error;
mod middleware;
mod model;
mod router;
mod service;
mod startup;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use crate::{config::Config, error::AppError, state::AppState};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let store = startup::connect_to_store(&config).await?;
    let session_layer = startup::session_layer(&config)?;
    let http_client = startup::setup_reqwest_client()?;
    let oauth_client = startup::setup_oauth_client(&config)?;

    let app = router::router()
        .with_state(AppState::new(http_client, oauth_client, Arc::new(store)))
        .layer(session_layer)
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
