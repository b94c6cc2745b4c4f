//! Client for the library server's HTTP API

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::scheduler::NoticeSource;

/// Client for communication with the library server
#[derive(Debug, Clone)]
pub struct LibraryClient {
    /// Server URL
    server_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl LibraryClient {
    /// Create a new library server client
    pub fn new(server_url: &str) -> Self {
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Returns the base URL requests are sent to
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Fetch the emails of borrowers whose books are due within a day
    pub async fn check_notices(&self) -> Result<Vec<String>, ClientError> {
        let url = format!("{}/Book/checknotices", self.server_url);
        debug!(url = %url, "Requesting due-date notices");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::ServerError(format!(
                "Server returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Deserialization(e.to_string()))
    }

    /// Check server health
    pub async fn health_check(&self) -> Result<(), ClientError> {
        let response = self
            .http_client
            .get(format!("{}/health", self.server_url))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::ServerError(format!(
                "Health check failed with status {}",
                response.status()
            )))
        }
    }
}

#[async_trait]
impl NoticeSource for LibraryClient {
    async fn fetch_notices(&self) -> Result<Vec<String>, ClientError> {
        self.check_notices().await
    }
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}
