//! Shared fixtures for the worker integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use trustlist_client::MockGatewayClient;
use trustlist_core::{
    AuditLogRecord, Certificate, CertificateType, ChainVerifier, CoseSigner, InvalidEntry,
    KeyPair, PendingUploadEntry, RemoteTrustListItem, TrustedEntry,
};
use trustlist_sync::{
    CacheInvalidator, MemoryStore, ReconcilePlan, StorageError, SyncEngine, TrustStore,
};

// =============================================================================
// Certificates
// =============================================================================

pub fn anchor_item(key: &KeyPair, country: &str) -> RemoteTrustListItem {
    let raw = Certificate::self_signed_anchor(key, country).unwrap();
    RemoteTrustListItem::new(key.kid(), country, CertificateType::Anchor, raw)
}

pub fn leaf_item(anchor: &KeyPair, subject: &KeyPair, country: &str) -> RemoteTrustListItem {
    let raw = Certificate::issue_leaf(anchor, subject, country).unwrap();
    RemoteTrustListItem::new(subject.kid(), country, CertificateType::Leaf, raw)
}

pub fn trusted(kid: &str, country: &str, index: i64) -> TrustedEntry {
    TrustedEntry {
        kid: kid.to_string(),
        country: country.to_string(),
        certificate_type: CertificateType::Anchor,
        raw_data: vec![0xCA],
        signature: String::new(),
        index,
        revoked: false,
        revoked_date: None,
        revoked_batch_tag: None,
        download_batch_tag: None,
        created_at: Utc::now(),
    }
}

/// Verifier deciding on raw bytes alone: `b"ok"` verifies, anything else fails
#[derive(Debug, Default)]
pub struct FlagVerifier;

impl ChainVerifier for FlagVerifier {
    fn verify_anchor(&self, anchor: &RemoteTrustListItem) -> bool {
        anchor.raw_data == b"ok"
    }

    fn verify_leaf_against_anchor(
        &self,
        leaf: &RemoteTrustListItem,
        _anchor: &RemoteTrustListItem,
    ) -> bool {
        leaf.raw_data == b"ok"
    }
}

// =============================================================================
// Collaborators
// =============================================================================

/// Records every purge request
#[derive(Debug, Default)]
pub struct RecordingInvalidator {
    pub calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingInvalidator {
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CacheInvalidator for RecordingInvalidator {
    async fn invalidate(&self, urls: &[String]) -> bool {
        self.calls.lock().unwrap().push(urls.to_vec());
        true
    }
}

/// Memory store whose commit or audit writes can be made to fail
#[derive(Debug, Default)]
pub struct FailingStore {
    pub inner: MemoryStore,
    pub fail_commit: AtomicBool,
    pub fail_audit: AtomicBool,
    pub fail_save_pending: AtomicBool,
}

fn unavailable() -> StorageError {
    StorageError::Connection("store unavailable".into())
}

#[async_trait]
impl TrustStore for FailingStore {
    async fn pending_to_send(&self) -> Result<Vec<PendingUploadEntry>, StorageError> {
        self.inner.pending_to_send().await
    }

    async fn pending_to_revoke(&self) -> Result<Vec<PendingUploadEntry>, StorageError> {
        self.inner.pending_to_revoke().await
    }

    async fn save_pending(&self, entry: PendingUploadEntry) -> Result<(), StorageError> {
        if self.fail_save_pending.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.save_pending(entry).await
    }

    async fn get_trusted_by_kid(&self, kid: &str) -> Result<Option<TrustedEntry>, StorageError> {
        self.inner.get_trusted_by_kid(kid).await
    }

    async fn max_index(&self) -> Result<Option<i64>, StorageError> {
        self.inner.max_index().await
    }

    async fn revoke_all_active(&self, batch_tag: &str) -> Result<u64, StorageError> {
        self.inner.revoke_all_active(batch_tag).await
    }

    async fn upsert_trusted(&self, entry: TrustedEntry) -> Result<(), StorageError> {
        self.inner.upsert_trusted(entry).await
    }

    async fn list_trusted(&self) -> Result<Vec<TrustedEntry>, StorageError> {
        self.inner.list_trusted().await
    }

    async fn insert_invalid(&self, entry: InvalidEntry) -> Result<(), StorageError> {
        self.inner.insert_invalid(entry).await
    }

    async fn list_invalid(&self) -> Result<Vec<InvalidEntry>, StorageError> {
        self.inner.list_invalid().await
    }

    async fn insert_audit(&self, record: AuditLogRecord) -> Result<(), StorageError> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.insert_audit(record).await
    }

    async fn list_audit(&self) -> Result<Vec<AuditLogRecord>, StorageError> {
        self.inner.list_audit().await
    }

    async fn commit_download(&self, plan: &ReconcilePlan) -> Result<u64, StorageError> {
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.commit_download(plan).await
    }
}

// =============================================================================
// Engine
// =============================================================================

pub fn engine(store: Arc<dyn TrustStore>, client: Arc<MockGatewayClient>) -> SyncEngine {
    SyncEngine::new(
        store,
        client,
        Arc::new(CoseSigner::new(KeyPair::generate("it-worker"))),
        "IT",
    )
}
