//! Cache invalidation after a trust-list change
//!
//! Public endpoints serving the trusted set sit behind a CDN. After a download
//! run commits a non-empty list, the configured URLs are purged so relying
//! parties pick up the new set.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Purges externally cached URLs
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// Returns true if the purge was accepted
    async fn invalidate(&self, urls: &[String]) -> bool;
}

/// Invalidator for deployments without a CDN
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInvalidator;

#[async_trait]
impl CacheInvalidator for NoopInvalidator {
    async fn invalidate(&self, urls: &[String]) -> bool {
        debug!(urls = urls.len(), "No cache configured, nothing to purge");
        true
    }
}

#[derive(Serialize)]
struct PurgeRequest<'a> {
    objects: &'a [String],
}

/// Purges through an HTTP endpoint accepting `{"objects": [...]}`
#[derive(Debug, Clone)]
pub struct HttpCacheInvalidator {
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpCacheInvalidator {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            endpoint: endpoint.into(),
            http_client: builder.build()?,
        })
    }
}

#[async_trait]
impl CacheInvalidator for HttpCacheInvalidator {
    async fn invalidate(&self, urls: &[String]) -> bool {
        if urls.is_empty() {
            return true;
        }

        let result = self
            .http_client
            .post(&self.endpoint)
            .json(&PurgeRequest { objects: urls })
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!(urls = urls.len(), status = response.status().as_u16(), "Cache purged");
                true
            }
            Ok(response) => {
                warn!(status = response.status().as_u16(), "Cache purge refused");
                false
            }
            Err(e) => {
                warn!(error = %e, "Cache purge failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let urls = vec!["https://cdn.example/trustlist".to_string()];
        let body = serde_json::to_value(PurgeRequest { objects: &urls }).unwrap();
        assert_eq!(body, serde_json::json!({ "objects": ["https://cdn.example/trustlist"] }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_reports_failure() {
        let invalidator =
            HttpCacheInvalidator::new("http://127.0.0.1:1/purge", Some(Duration::from_secs(2)))
                .unwrap();
        assert!(!invalidator.invalidate(&["https://cdn.example/a".to_string()]).await);
    }

    #[tokio::test]
    async fn test_noop_always_succeeds() {
        assert!(NoopInvalidator.invalidate(&[]).await);
    }
}
