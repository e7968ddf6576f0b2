//! HTTP implementation of the gateway client

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};
use trustlist_core::RemoteTrustListItem;

use crate::client::{GatewayClient, GatewayResponse};
use crate::error::{GatewayError, Result};
use crate::types::decode_trust_list;

/// Header carrying the origin country of an upload or revocation
pub const ORIGIN_COUNTRY_HEADER: &str = "X-Origin-Country";

const SIGNER_CERTIFICATE_PATH: &str = "/signerCertificate";
const TRUST_LIST_PATH: &str = "/trustlist";

/// Connection settings for [`HttpGatewayClient`]
#[derive(Debug, Clone)]
pub struct HttpGatewayConfig {
    /// Base URL of the gateway, e.g. `https://gateway.example.eu`
    pub base_url: String,
    /// Transport-level request timeout
    pub timeout: Option<Duration>,
}

impl HttpGatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Gateway client speaking HTTP
pub struct HttpGatewayClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpGatewayClient {
    pub fn new(config: HttpGatewayConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(GatewayError::Configuration("gateway base URL is empty".into()));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        info!(base_url = %base_url, timeout = ?config.timeout, "Gateway client configured");
        Ok(Self {
            base_url,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_signed(
        &self,
        method: reqwest::Method,
        signed: &str,
        country: &str,
    ) -> Result<GatewayResponse<String>> {
        let url = self.url(SIGNER_CERTIFICATE_PATH);
        debug!(method = %method, url = %url, country = %country, "Sending signed certificate");

        let response = self
            .http_client
            .request(method, &url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .header(ORIGIN_COUNTRY_HEADER, country)
            .body(signed.to_string())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        if !response_is_success(status) {
            warn!(status = status, body = %body, "Gateway did not accept signed certificate");
        }

        let data = if body.is_empty() { None } else { Some(body) };
        Ok(GatewayResponse::new(status, data))
    }
}

fn response_is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[async_trait]
impl GatewayClient for HttpGatewayClient {
    async fn upload(&self, signed: &str, country: &str) -> Result<GatewayResponse<String>> {
        self.send_signed(reqwest::Method::POST, signed, country).await
    }

    async fn revoke(&self, signed: &str, country: &str) -> Result<GatewayResponse<String>> {
        self.send_signed(reqwest::Method::DELETE, signed, country).await
    }

    async fn download_trust_list(&self) -> Result<GatewayResponse<Vec<RemoteTrustListItem>>> {
        let url = self.url(TRUST_LIST_PATH);
        debug!(url = %url, "Downloading trust list");

        let response = self
            .http_client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response_is_success(status) {
            warn!(status = status, "Gateway refused trust list download");
            return Ok(GatewayResponse::status(status));
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(GatewayResponse::status(status));
        }

        let items = decode_trust_list(&body)?;
        info!(status = status, items = items.len(), "Downloaded trust list");
        Ok(GatewayResponse::new(status, Some(items)))
    }

    fn description(&self) -> &str {
        "http gateway client"
    }
}
