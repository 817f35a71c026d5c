//! Adapter interfaces for external systems.
//!
//! Adapters provide a unified interface for the two network collaborators
//! of the harvester: fetching pages/bytes, and listing posts from feeds.

pub mod http;
pub mod reddit;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{EntityKind, Post, SortToggle, SortType};

// Re-export the concrete adapters
pub use http::HttpFetcher;
pub use reddit::RedditClient;

/// Network failures
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Rate limited: reset in {reset_secs}s exceeds max wait of {max_wait_secs}s")]
    RateLimited { reset_secs: u64, max_wait_secs: u64 },

    #[error("Unrecoverable feed error: {0}")]
    Unrecoverable(String),

    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
}

impl FetchError {
    /// Whether the failure should end harvesting of the current entity
    pub fn aborts_entity(&self) -> bool {
        matches!(
            self,
            FetchError::RateLimited { .. } | FetchError::Unrecoverable(_)
        )
    }
}

/// Fetches raw pages and resources
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a page as text
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;

    /// Fetch a resource as raw bytes
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// One listing request against a feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub kind: EntityKind,
    pub name: String,
    /// `Stream` is never sent upstream; the harvester polls `New` instead
    pub sort: SortType,
    pub toggle: Option<SortToggle>,
    pub limit: u32,
}

/// Lists posts for an entity
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Fetch up to `query.limit` posts in the requested order
    async fn fetch_posts(&self, query: &FeedQuery) -> Result<Vec<Post>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rate_limit_and_unrecoverable_abort_entity() {
        assert!(FetchError::RateLimited {
            reset_secs: 500,
            max_wait_secs: 120
        }
        .aborts_entity());
        assert!(FetchError::Unrecoverable("banned".into()).aborts_entity());
        assert!(!FetchError::Status {
            url: "https://x".into(),
            status: 500
        }
        .aborts_entity());
    }
}
