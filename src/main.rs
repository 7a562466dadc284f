//! Coffee POS Server - Main Application Entry Point
//!
//! REST API for a small coffee delivery shop: staff take orders and move
//! them through the delivery lifecycle, hand customers single-use order
//! links, and customers follow their order on a public tracking page.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Storage**: JSON documents in PostgreSQL via sqlx, or in memory
//! - **Authentication**: staff sessions, SHA-256 hashed bearer secrets
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Connect the document store (and run migrations for Postgres)
//! 3. Seed the bootstrap staff account, if configured
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port

mod clock;
mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{clock::SystemClock, services::auth_service::StoreAuthProvider, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let store = db::connect_store(&config).await?;
    let clock = Arc::new(SystemClock);

    let auth = Arc::new(StoreAuthProvider::new(
        store.clone(),
        clock.clone(),
        config.session_ttl_hours,
    ));
    if let Some((email, password)) = config.bootstrap_staff() {
        auth.ensure_staff(email, password).await?;
    }

    let state = AppState::new(&config, store, clock, auth)?;
    let app = routes::router(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
