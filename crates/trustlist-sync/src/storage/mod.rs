//! Storage abstraction for the trust-list worker
//!
//! This module provides a trait-based abstraction for the trust store,
//! enabling both in-memory (default) and persistent (PostgreSQL) backends.
//!
//! Replicated deployments require persistent storage so that:
//! - every instance reconciles against the same trusted set
//! - the publication index counter is shared
//! - pending uploads and audit records survive restarts

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

use async_trait::async_trait;
use std::fmt::Debug;
use trustlist_core::{AuditLogRecord, InvalidEntry, PendingUploadEntry, TrustedEntry};

use crate::reconcile::ReconcilePlan;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Entry already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

/// Storage backend trait for trust-list state
///
/// Implementations must be thread-safe and support concurrent access. The
/// reconciliation itself is only safe while the download lock is held.
#[async_trait]
pub trait TrustStore: Send + Sync + Debug {
    // =========================================================================
    // Pending uploads
    // =========================================================================

    /// Entries not withdrawn and not yet accepted by the gateway
    async fn pending_to_send(&self) -> Result<Vec<PendingUploadEntry>, StorageError>;

    /// Entries withdrawn after upload whose revocation is not yet accepted
    async fn pending_to_revoke(&self) -> Result<Vec<PendingUploadEntry>, StorageError>;

    /// Insert or replace a pending entry by id
    async fn save_pending(&self, entry: PendingUploadEntry) -> Result<(), StorageError>;

    /// Register a newly issued certificate for propagation
    async fn insert_pending(&self, entry: PendingUploadEntry) -> Result<(), StorageError> {
        if self
            .pending_to_send()
            .await?
            .iter()
            .chain(self.pending_to_revoke().await?.iter())
            .any(|e| e.id == entry.id)
        {
            return Err(StorageError::AlreadyExists(entry.id));
        }
        self.save_pending(entry).await
    }

    // =========================================================================
    // Trusted entries
    // =========================================================================

    /// Look up a trusted entry by key identifier, revoked or not
    async fn get_trusted_by_kid(&self, kid: &str) -> Result<Option<TrustedEntry>, StorageError>;

    /// Highest publication index in use, if any entry exists
    async fn max_index(&self) -> Result<Option<i64>, StorageError>;

    /// Revoke every active entry with `batch_tag`, returning how many were active
    async fn revoke_all_active(&self, batch_tag: &str) -> Result<u64, StorageError>;

    /// Insert or replace a trusted entry by kid
    async fn upsert_trusted(&self, entry: TrustedEntry) -> Result<(), StorageError>;

    /// All trusted entries ordered by index
    async fn list_trusted(&self) -> Result<Vec<TrustedEntry>, StorageError>;

    // =========================================================================
    // Invalid entries and audit log
    // =========================================================================

    async fn insert_invalid(&self, entry: InvalidEntry) -> Result<(), StorageError>;

    async fn list_invalid(&self) -> Result<Vec<InvalidEntry>, StorageError>;

    async fn insert_audit(&self, record: AuditLogRecord) -> Result<(), StorageError>;

    /// Audit records in insertion order
    async fn list_audit(&self) -> Result<Vec<AuditLogRecord>, StorageError>;

    // =========================================================================
    // Download reconciliation
    // =========================================================================

    /// Apply the tombstone sweep and a reconciliation plan, returning the
    /// number of entries that were active before the sweep
    ///
    /// The default implementation composes the primitives above and is not
    /// atomic; backends that can should override it so a failure leaves the
    /// store untouched.
    async fn commit_download(&self, plan: &ReconcilePlan) -> Result<u64, StorageError> {
        let active_before = self.revoke_all_active(&plan.batch_tag).await?;

        for kid in &plan.reinstate {
            let mut entry = self
                .get_trusted_by_kid(kid)
                .await?
                .ok_or_else(|| StorageError::NotFound(kid.clone()))?;
            entry.reinstate();
            self.upsert_trusted(entry).await?;
        }

        for entry in &plan.admit {
            self.upsert_trusted(entry.clone()).await?;
        }

        for entry in &plan.invalid {
            self.insert_invalid(entry.clone()).await?;
        }

        Ok(active_before)
    }
}
