//! Wire types for the gateway's trust-list endpoint

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trustlist_core::{CertificateType, RemoteTrustListItem};

use crate::error::GatewayError;

/// One trust-list entry as published by the gateway
///
/// The wire type carries no verification flag; verification is computed
/// locally after download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustListItemDto {
    pub kid: String,
    pub country: String,
    pub certificate_type: CertificateType,
    /// Base64-encoded certificate envelope
    pub raw_data: String,
    /// Signature supplied by the uploading country
    #[serde(default)]
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TryFrom<TrustListItemDto> for RemoteTrustListItem {
    type Error = GatewayError;

    fn try_from(dto: TrustListItemDto) -> Result<Self, Self::Error> {
        let raw_data = STANDARD.decode(dto.raw_data.trim()).map_err(|e| {
            GatewayError::MalformedResponse(format!("rawData of {} is not base64: {}", dto.kid, e))
        })?;

        Ok(RemoteTrustListItem::new(dto.kid, dto.country, dto.certificate_type, raw_data)
            .with_signature(dto.signature))
    }
}

impl From<&RemoteTrustListItem> for TrustListItemDto {
    fn from(item: &RemoteTrustListItem) -> Self {
        Self {
            kid: item.kid.clone(),
            country: item.country.clone(),
            certificate_type: item.certificate_type,
            raw_data: STANDARD.encode(&item.raw_data),
            signature: item.signature.clone(),
            thumbprint: None,
            timestamp: None,
        }
    }
}

/// Decode a downloaded trust-list body
pub fn decode_trust_list(body: &[u8]) -> Result<Vec<RemoteTrustListItem>, GatewayError> {
    let dtos: Vec<TrustListItemDto> = serde_json::from_slice(body)?;
    dtos.into_iter().map(RemoteTrustListItem::try_from).collect()
}
