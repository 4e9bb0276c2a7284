//! Fetch seam between the pipeline and the network

use async_trait::async_trait;
use thiserror::Error;

/// How a page should be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Plain browser-style GET
    #[default]
    Html,
    /// API request: adds `Accept: application/json` and `X-Requested-With: XMLHttpRequest`
    Json,
}

#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("HTTP request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("HTTP error {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read response body from {url}: {reason}")]
    Body { url: String, reason: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Source of raw page text
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str, mode: FetchMode) -> Result<String, FetchError>;
}
