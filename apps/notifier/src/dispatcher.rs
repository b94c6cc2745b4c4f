//! Delivery of due-date notices.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

/// A notice could not be delivered.
#[derive(Debug, Error)]
#[error("Failed to notify {email}: {reason}")]
pub struct DispatchError {
    pub email: String,
    pub reason: String,
}

/// Delivers a due-date notice to one borrower.
#[async_trait]
pub trait NoticeDispatcher: Send + Sync {
    async fn dispatch(&self, email: &str) -> Result<(), DispatchError>;
}

/// Dispatcher that records each notice in the log instead of sending mail.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDispatcher;

#[async_trait]
impl NoticeDispatcher for LogDispatcher {
    async fn dispatch(&self, email: &str) -> Result<(), DispatchError> {
        info!(email = %email, "Sending due-date notice");
        Ok(())
    }
}
