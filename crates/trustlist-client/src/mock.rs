//! Scriptable in-process gateway
//!
//! For tests and dry-run deployments. Unless a reply has been queued, uploads
//! and revocations are accepted and downloads serve the currently published
//! trust list.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use trustlist_core::RemoteTrustListItem;

use crate::client::{GatewayClient, GatewayResponse};
use crate::error::Result;

/// A call received by the mock gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Upload { signed: String, country: String },
    Revoke { signed: String, country: String },
    Download,
}

type Reply<T> = Result<GatewayResponse<T>>;

#[derive(Default)]
struct MockState {
    published: Vec<RemoteTrustListItem>,
    upload_replies: VecDeque<Reply<String>>,
    revoke_replies: VecDeque<Reply<String>>,
    download_replies: VecDeque<Reply<Vec<RemoteTrustListItem>>>,
    calls: Vec<MockCall>,
}

/// Mock gateway client
#[derive(Default)]
pub struct MockGatewayClient {
    state: Mutex<MockState>,
}

impl MockGatewayClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the trust list served by default downloads
    pub fn publish(&self, items: Vec<RemoteTrustListItem>) {
        self.state.lock().unwrap().published = items;
    }

    /// Queue the reply for the next upload
    pub fn push_upload_reply(&self, reply: Reply<String>) {
        self.state.lock().unwrap().upload_replies.push_back(reply);
    }

    /// Queue the reply for the next revocation
    pub fn push_revoke_reply(&self, reply: Reply<String>) {
        self.state.lock().unwrap().revoke_replies.push_back(reply);
    }

    /// Queue the reply for the next download
    pub fn push_download_reply(&self, reply: Reply<Vec<RemoteTrustListItem>>) {
        self.state.lock().unwrap().download_replies.push_back(reply);
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl GatewayClient for MockGatewayClient {
    async fn upload(&self, signed: &str, country: &str) -> Result<GatewayResponse<String>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(MockCall::Upload {
            signed: signed.to_string(),
            country: country.to_string(),
        });
        state
            .upload_replies
            .pop_front()
            .unwrap_or_else(|| Ok(GatewayResponse::accepted(signed.to_string())))
    }

    async fn revoke(&self, signed: &str, country: &str) -> Result<GatewayResponse<String>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(MockCall::Revoke {
            signed: signed.to_string(),
            country: country.to_string(),
        });
        state
            .revoke_replies
            .pop_front()
            .unwrap_or_else(|| Ok(GatewayResponse::accepted(signed.to_string())))
    }

    async fn download_trust_list(&self) -> Result<GatewayResponse<Vec<RemoteTrustListItem>>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(MockCall::Download);
        match state.download_replies.pop_front() {
            Some(reply) => reply,
            None => Ok(GatewayResponse::accepted(state.published.clone())),
        }
    }

    fn description(&self) -> &str {
        "mock gateway client"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use trustlist_core::CertificateType;

    #[tokio::test]
    async fn test_default_replies() {
        let mock = MockGatewayClient::new();
        mock.publish(vec![RemoteTrustListItem::new("K1", "IT", CertificateType::Anchor, vec![1])]);

        let up = mock.upload("signed", "IT").await.unwrap();
        assert!(up.is_accepted());
        assert_eq!(up.data.as_deref(), Some("signed"));

        let down = mock.download_trust_list().await.unwrap();
        assert_eq!(down.data.unwrap().len(), 1);

        assert_eq!(
            mock.calls(),
            vec![
                MockCall::Upload {
                    signed: "signed".into(),
                    country: "IT".into()
                },
                MockCall::Download
            ]
        );
    }

    #[tokio::test]
    async fn test_queued_replies_are_consumed_in_order() {
        let mock = MockGatewayClient::new();
        mock.push_revoke_reply(Ok(GatewayResponse::status(409)));
        mock.push_revoke_reply(Err(GatewayError::Transport("connection reset".into())));

        assert_eq!(mock.revoke("a", "IT").await.unwrap().status, 409);
        assert!(mock.revoke("b", "IT").await.is_err());
        assert!(mock.revoke("c", "IT").await.unwrap().is_accepted());
    }
}
