//! Library Notifier
//!
//! Sends due-date notices to borrowers once a day. Exposed as a library so
//! the server can embed the scheduler in its own process.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod scheduler;

pub use client::{ClientError, LibraryClient};
pub use config::NotifierConfig;
pub use dispatcher::{DispatchError, LogDispatcher, NoticeDispatcher};
pub use scheduler::{following_run, next_run_after, NoticeScheduler, NoticeSource, RunReport};

use tokio::signal;
use tracing::{error, info};

/// Resolves when the process receives Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
