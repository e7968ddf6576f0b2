//! Gateway client contract

use async_trait::async_trait;
use trustlist_core::RemoteTrustListItem;

use crate::error::Result;

/// Status signalling that the gateway durably recorded the operation
pub const BATCH_ACCEPTED: u16 = 200;

/// Status code plus optional typed payload returned by every remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse<T> {
    pub status: u16,
    pub data: Option<T>,
}

impl<T> GatewayResponse<T> {
    pub fn new(status: u16, data: Option<T>) -> Self {
        Self { status, data }
    }

    /// Accepted response carrying `data`
    pub fn accepted(data: T) -> Self {
        Self::new(BATCH_ACCEPTED, Some(data))
    }

    /// Response with a status and no payload
    pub fn status(status: u16) -> Self {
        Self::new(status, None)
    }

    /// Whether the gateway committed the operation
    pub fn is_accepted(&self) -> bool {
        self.status == BATCH_ACCEPTED
    }

    /// Report string recorded in the audit log
    pub fn report(&self) -> String {
        self.status.to_string()
    }
}

/// Typed facade over the central trust-list gateway
///
/// Implementations never retry; a failed call is retried by the next
/// scheduled run.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Publish a signed signer certificate on behalf of `country`
    async fn upload(&self, signed: &str, country: &str) -> Result<GatewayResponse<String>>;

    /// Withdraw a previously published signer certificate
    async fn revoke(&self, signed: &str, country: &str) -> Result<GatewayResponse<String>>;

    /// Fetch the consolidated trust list
    async fn download_trust_list(&self) -> Result<GatewayResponse<Vec<RemoteTrustListItem>>>;

    /// Description of this client (for logging)
    fn description(&self) -> &str {
        "gateway client"
    }
}
