//! Library Server
//!
//! HTTP service for a book-lending catalog. It keeps the book and user
//! records, lends and takes back books, and reports which borrowers have a
//! book due within the next day.

pub mod api;
pub mod config;
pub mod error;
pub mod seed;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::Router;
use book_store::BookStore;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::services::clock::Clock;
use crate::state::{create_shared_state, AppState};

/// Creates the application router with all routes configured.
pub fn create_app<S: BookStore + 'static>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::create_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Creates the application state with the given configuration, store and clock.
pub fn create_state<S: BookStore>(
    config: Config,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
) -> Arc<AppState<S>> {
    create_shared_state(config, store, clock)
}

/// Initializes tracing with the given log level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
