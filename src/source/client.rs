//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable per-call timeout and User-Agent
//! - Classification of transport failures and non-success statuses
//!
//! Failed calls are never retried; the entry is reported and skipped.

use crate::error::SourceError;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
pub const DEFAULT_USER_AGENT: &str = concat!("verbump/", env!("CARGO_PKG_VERSION"));

/// HTTP client wrapper used by all version sources
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, SourceError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                SourceError::unavailable(
                    "HTTP client",
                    "",
                    format!("failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self { client, timeout })
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the configured per-call timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform a GET request, failing on anything but a success status
    pub async fn get_with_context(
        &self,
        url: &str,
        id: &str,
        registry: &str,
    ) -> Result<reqwest::Response, SourceError> {
        debug!(%url, %registry, "querying version source");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::unavailable(
                    registry,
                    id,
                    format!("timed out after {}s", self.timeout.as_secs()),
                )
            } else {
                SourceError::unavailable(registry, id, e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::unavailable(
                registry,
                id,
                format!("HTTP {}", status),
            ));
        }

        Ok(response)
    }

    /// Perform a GET request and return the body as text
    pub async fn get_text(&self, url: &str, id: &str, registry: &str) -> Result<String, SourceError> {
        let response = self.get_with_context(url, id, registry).await?;

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::unavailable(
                    registry,
                    id,
                    format!("timed out after {}s", self.timeout.as_secs()),
                )
            } else {
                SourceError::unavailable(registry, id, e.to_string())
            }
        })
    }

    /// Perform a GET request and parse the JSON response
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        id: &str,
        registry: &str,
    ) -> Result<T, SourceError> {
        let response = self.get_with_context(url, id, registry).await?;

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::unavailable(
                    registry,
                    id,
                    format!("timed out after {}s", self.timeout.as_secs()),
                )
            } else {
                SourceError::invalid_response(registry, id, format!("failed to parse JSON: {}", e))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Body {
        version: String,
    }

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_http_client_with_config() {
        let client = HttpClient::with_config(Duration::from_secs(5), "test-agent/1.0").unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(30));
        assert!(DEFAULT_USER_AGENT.starts_with("verbump/"));
    }

    #[tokio::test]
    async fn test_get_json_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pkg")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"version": "1.2.3"}"#)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let body: Body = client
            .get_json(&format!("{}/pkg", server.url()), "pkg", "test")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body.version, "1.2.3");
    }

    #[tokio::test]
    async fn test_get_json_non_success_is_unavailable() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/pkg")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let result: Result<Body, _> = client
            .get_json(&format!("{}/pkg", server.url()), "pkg", "test")
            .await;

        // exactly one request: no retry loop
        mock.assert_async().await;
        match result {
            Err(SourceError::Unavailable { message, .. }) => assert!(message.contains("503")),
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_json_bad_body_is_invalid_response() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/pkg")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let result: Result<Body, _> = client
            .get_json(&format!("{}/pkg", server.url()), "pkg", "test")
            .await;

        assert!(matches!(result, Err(SourceError::InvalidResponse { .. })));
    }
}
