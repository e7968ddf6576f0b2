//! Entities shared by the gateway client, the trust store and the sync engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a certificate in the two-tier trust chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificateType {
    /// Self-signed country authority (CSCA)
    #[serde(rename = "CSCA", alias = "ANCHOR")]
    Anchor,
    /// Document signer issued by an anchor (DSC)
    #[serde(rename = "DSC", alias = "LEAF")]
    Leaf,
}

impl std::fmt::Display for CertificateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CertificateType::Anchor => write!(f, "CSCA"),
            CertificateType::Leaf => write!(f, "DSC"),
        }
    }
}

impl std::str::FromStr for CertificateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CSCA" | "ANCHOR" => Ok(CertificateType::Anchor),
            "DSC" | "LEAF" => Ok(CertificateType::Leaf),
            _ => Err(format!("Unknown certificate type: {}", s)),
        }
    }
}

/// Kind of operation a batch tag / audit record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationType {
    Upload,
    Revoke,
    Download,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Upload => "UPLOAD",
            OperationType::Revoke => "REVOKE",
            OperationType::Download => "DOWNLOAD",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OperationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPLOAD" => Ok(OperationType::Upload),
            "REVOKE" => Ok(OperationType::Revoke),
            "DOWNLOAD" => Ok(OperationType::Download),
            _ => Err(format!("Unknown operation: {}", s)),
        }
    }
}

/// A certificate admitted into the local trust store
///
/// A non-revoked entry never carries `revoked_date` or `revoked_batch_tag`;
/// use [`TrustedEntry::revoke`] and [`TrustedEntry::reinstate`] to keep the
/// three fields in step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedEntry {
    /// Key identifier, unique across the store
    pub kid: String,
    /// ISO 3166 alpha-2 country of the issuing authority
    pub country: String,
    pub certificate_type: CertificateType,
    /// Encoded certificate envelope
    pub raw_data: Vec<u8>,
    /// Signature published alongside the item by the remote authority
    pub signature: String,
    /// Monotonic publication index, unique across the store
    pub index: i64,
    pub revoked: bool,
    pub revoked_date: Option<DateTime<Utc>>,
    pub revoked_batch_tag: Option<String>,
    /// Batch tag of the download run that admitted this entry
    pub download_batch_tag: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TrustedEntry {
    /// Mark the entry revoked by the given batch
    pub fn revoke(&mut self, batch_tag: &str, at: DateTime<Utc>) {
        self.revoked = true;
        self.revoked_date = Some(at);
        self.revoked_batch_tag = Some(batch_tag.to_string());
    }

    /// Undo a revocation
    pub fn reinstate(&mut self) {
        self.revoked = false;
        self.revoked_date = None;
        self.revoked_batch_tag = None;
    }

    pub fn is_active(&self) -> bool {
        !self.revoked
    }
}

/// Audit record for a remote item that failed chain verification
///
/// Written once per download cycle and never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidEntry {
    pub kid: String,
    pub country: String,
    pub certificate_type: CertificateType,
    pub raw_data: Vec<u8>,
    pub signature: String,
    pub download_batch_tag: String,
    pub created_at: DateTime<Utc>,
}

/// A locally-issued signer certificate awaiting propagation to the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUploadEntry {
    /// Local identifier
    pub id: String,
    /// Key identifier, when known to the issuer
    pub kid: Option<String>,
    pub raw_data: Vec<u8>,
    /// Set by the issuance process when the certificate is withdrawn
    pub revoked: bool,
    /// Set once the gateway accepted the upload
    pub upload_batch_tag: Option<String>,
    /// Set once the gateway accepted the revocation
    pub revoked_batch_tag: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PendingUploadEntry {
    /// Create a fresh, not yet uploaded entry
    pub fn new(raw_data: Vec<u8>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kid: None,
            raw_data,
            revoked: false,
            upload_batch_tag: None,
            revoked_batch_tag: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Entry still needs to be uploaded
    pub fn is_to_send(&self) -> bool {
        !self.revoked && self.upload_batch_tag.is_none()
    }

    /// Entry was uploaded, then withdrawn, and the withdrawal is not yet propagated
    pub fn is_to_revoke(&self) -> bool {
        self.revoked && self.upload_batch_tag.is_some() && self.revoked_batch_tag.is_none()
    }
}

/// One item of a downloaded trust list
///
/// `verified_sign` is computed locally during reconciliation and never taken
/// from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrustListItem {
    pub kid: String,
    pub country: String,
    pub certificate_type: CertificateType,
    pub raw_data: Vec<u8>,
    pub signature: String,
    pub verified_sign: bool,
}

impl RemoteTrustListItem {
    pub fn new(
        kid: impl Into<String>,
        country: impl Into<String>,
        certificate_type: CertificateType,
        raw_data: Vec<u8>,
    ) -> Self {
        Self {
            kid: kid.into(),
            country: country.into(),
            certificate_type,
            raw_data,
            signature: String::new(),
            verified_sign: false,
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }
}

/// Counters recorded for every download run
///
/// `num_revoked_doc` is derived as `num_tot_doc - num_new_doc - num_old_doc
/// - num_invalid_doc` and is signed because a run admitting many new entries
/// drives it below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadCounts {
    /// Entries active before the tombstone sweep
    pub num_tot_doc: i64,
    /// Items in the downloaded list
    pub num_doc_flusso: i64,
    pub num_new_doc: i64,
    pub num_invalid_doc: i64,
    pub num_old_doc: i64,
    pub num_revoked_doc: i64,
}

impl DownloadCounts {
    /// Fill in the derived revocation count
    pub fn with_derived_revoked(mut self) -> Self {
        self.num_revoked_doc =
            self.num_tot_doc - self.num_new_doc - self.num_old_doc - self.num_invalid_doc;
        self
    }
}

/// Outcome record written once per upload item, revoke item or download run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogRecord {
    pub id: String,
    pub operation: OperationType,
    pub country: String,
    pub batch_tag: String,
    /// Status code of the remote call, or the error message
    pub report: String,
    /// Present for download runs only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_info: Option<DownloadCounts>,
    pub created_at: DateTime<Utc>,
}

impl AuditLogRecord {
    fn build(
        operation: OperationType,
        country: &str,
        batch_tag: &str,
        report: impl Into<String>,
        download_info: Option<DownloadCounts>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            operation,
            country: country.to_string(),
            batch_tag: batch_tag.to_string(),
            report: report.into(),
            download_info,
            created_at: Utc::now(),
        }
    }

    pub fn upload(country: &str, batch_tag: &str, report: impl Into<String>) -> Self {
        Self::build(OperationType::Upload, country, batch_tag, report, None)
    }

    pub fn revoke(country: &str, batch_tag: &str, report: impl Into<String>) -> Self {
        Self::build(OperationType::Revoke, country, batch_tag, report, None)
    }

    pub fn download(
        country: &str,
        batch_tag: &str,
        counts: DownloadCounts,
        report: impl Into<String>,
    ) -> Self {
        Self::build(OperationType::Download, country, batch_tag, report, Some(counts))
    }
}
