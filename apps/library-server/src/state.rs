//! Application state.

use std::sync::Arc;

use book_store::BookStore;

use crate::config::Config;
use crate::services::book_service::BookService;
use crate::services::clock::Clock;

/// Shared application state.
pub struct AppState<S: BookStore> {
    /// Server configuration.
    pub config: Config,
    /// Book lending service.
    pub books: BookService<S>,
}

impl<S: BookStore> AppState<S> {
    /// Creates new application state.
    pub fn new(config: Config, store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            books: BookService::new(store, clock),
        }
    }
}

/// Type alias for shared state.
pub type SharedState<S> = Arc<AppState<S>>;

/// Creates shared state from config, store and clock.
pub fn create_shared_state<S: BookStore>(
    config: Config,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
) -> SharedState<S> {
    Arc::new(AppState::new(config, store, clock))
}
