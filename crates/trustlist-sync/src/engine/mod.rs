//! Synchronization engine
//!
//! Orchestrates the two flows against the gateway:
//!
//! - **upload** (`upload.rs`): propagate locally issued certificates and
//!   their withdrawals, one audit record per item
//! - **download** (`download.rs`): fetch the trust list, verify it and
//!   reconcile the trust store, one audit record per run
//!
//! Failures never escape a flow. Transport, signing and persistence errors are
//! turned into the report string of the audit record and returned as an
//! [`Outcome`]. The engine itself holds no lock; callers must run each flow
//! under the coordinator.

pub mod download;
pub mod upload;

pub use download::DownloadSummary;
pub use upload::{ItemOutcome, UploadSummary};

use std::sync::Arc;
use thiserror::Error;
use tracing::error;
use trustlist_client::{GatewayClient, GatewayError, BATCH_ACCEPTED};
use trustlist_core::{
    AuditLogRecord, CertificateSignatureVerifier, ChainVerifier, PayloadSigner, SigningError,
};

use crate::purge::{CacheInvalidator, NoopInvalidator};
use crate::storage::{StorageError, TrustStore};

/// Failure inside a flow, converted to a report string at the flow boundary
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Transport(#[from] GatewayError),

    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),
}

/// Result of one remote operation as seen by the audit log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The gateway committed the operation
    Accepted { status: u16 },
    /// The gateway answered but did not commit
    Rejected { status: u16 },
    /// A transport, signing or persistence error stopped the operation
    Failed { error: String },
}

impl Outcome {
    pub fn from_status(status: u16) -> Self {
        if status == BATCH_ACCEPTED {
            Outcome::Accepted { status }
        } else {
            Outcome::Rejected { status }
        }
    }

    pub fn failed(error: &SyncError) -> Self {
        Outcome::Failed {
            error: error.to_string(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted { .. })
    }

    /// Status code or error message, as written to the audit record
    pub fn report(&self) -> String {
        match self {
            Outcome::Accepted { status } | Outcome::Rejected { status } => status.to_string(),
            Outcome::Failed { error } => error.clone(),
        }
    }
}

/// The synchronization engine and its collaborators
pub struct SyncEngine {
    store: Arc<dyn TrustStore>,
    client: Arc<dyn GatewayClient>,
    signer: Arc<dyn PayloadSigner>,
    verifier: Arc<dyn ChainVerifier>,
    invalidator: Arc<dyn CacheInvalidator>,
    purge_targets: Vec<String>,
    country: String,
}

impl SyncEngine {
    /// Engine for `country` with signature verification and no cache purge
    pub fn new(
        store: Arc<dyn TrustStore>,
        client: Arc<dyn GatewayClient>,
        signer: Arc<dyn PayloadSigner>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            store,
            client,
            signer,
            verifier: Arc::new(CertificateSignatureVerifier::new()),
            invalidator: Arc::new(NoopInvalidator),
            purge_targets: Vec::new(),
            country: country.into(),
        }
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn ChainVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Purge `targets` through `invalidator` after every changed download
    pub fn with_invalidator(
        mut self,
        invalidator: Arc<dyn CacheInvalidator>,
        targets: Vec<String>,
    ) -> Self {
        self.invalidator = invalidator;
        self.purge_targets = targets;
        self
    }

    /// Origin country sent with uploads and stamped on audit records
    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn store(&self) -> &Arc<dyn TrustStore> {
        &self.store
    }

    pub fn signer(&self) -> &Arc<dyn PayloadSigner> {
        &self.signer
    }

    /// Purge the configured cache targets, returning whether the purge succeeded
    pub async fn purge(&self) -> bool {
        self.invalidator.invalidate(&self.purge_targets).await
    }

    async fn audit(&self, record: AuditLogRecord) {
        let batch_tag = record.batch_tag.clone();
        if let Err(e) = self.store.insert_audit(record).await {
            error!(batch_tag = %batch_tag, error = %e, "Failed to write audit record");
        }
    }
}
