//! Library Server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use book_store::{BookStore, MemoryBookStore, SqliteBookStore};
use library_notifier::{shutdown_signal, LibraryClient, LogDispatcher, NoticeScheduler};
use library_server::{
    config::Config,
    create_app, create_state, init_tracing,
    seed::seed_if_empty,
    services::clock::{Clock, SystemClock},
};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    tracing::info!(
        database_url = %config.database_url,
        embedded_notifier = config.embedded_notifier,
        "Starting Library Server"
    );

    if config.uses_memory_store() {
        serve(config, MemoryBookStore::new()).await
    } else {
        let store = SqliteBookStore::connect(&config.database_url).await?;
        serve(config, store).await
    }
}

async fn serve<S: BookStore + 'static>(config: Config, store: S) -> anyhow::Result<()> {
    let store = Arc::new(store);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    if config.seed_data {
        seed_if_empty(store.as_ref(), clock.now()).await?;
    }

    // Create application state and router
    let state = create_state(config.clone(), store, clock);
    let app = create_app(state);

    // Parse server address
    let addr: SocketAddr = config.server_addr().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    // Start the in-process notice scheduler
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let notifier = config.embedded_notifier.then(|| {
        let client = LibraryClient::new(&config.local_url());
        tokio::spawn(NoticeScheduler::new(client, LogDispatcher, shutdown_rx).run())
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");

    let _ = shutdown_tx.send(true);
    if let Some(handle) = notifier {
        handle.await?;
    }

    Ok(())
}
