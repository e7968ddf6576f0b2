//! In-memory storage backend
//!
//! Default storage implementation. All state lives behind a single lock so a
//! download commit is observed either entirely or not at all. Suitable for
//! development and single-instance deployments; data is lost on restart.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use tracing::{debug, info};
use trustlist_core::{AuditLogRecord, InvalidEntry, PendingUploadEntry, TrustedEntry};

use super::{StorageError, TrustStore};
use crate::reconcile::ReconcilePlan;

#[derive(Debug, Default)]
struct MemoryState {
    trusted: HashMap<String, TrustedEntry>,
    invalid: Vec<InvalidEntry>,
    /// Insertion ordered; replaced in place by id
    pending: Vec<PendingUploadEntry>,
    audit: Vec<AuditLogRecord>,
}

impl MemoryState {
    fn revoke_all_active(&mut self, batch_tag: &str) -> u64 {
        let now = Utc::now();
        let mut swept = 0;
        for entry in self.trusted.values_mut().filter(|e| e.is_active()) {
            entry.revoke(batch_tag, now);
            swept += 1;
        }
        swept
    }

    fn check_insert(&self, entry: &TrustedEntry) -> Result<(), StorageError> {
        let clash = self
            .trusted
            .values()
            .any(|e| e.index == entry.index && e.kid != entry.kid);
        if clash {
            return Err(StorageError::AlreadyExists(format!("index {}", entry.index)));
        }
        Ok(())
    }
}

/// In-memory trust store implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TrustStore for MemoryStore {
    // =========================================================================
    // Pending uploads
    // =========================================================================

    async fn pending_to_send(&self) -> Result<Vec<PendingUploadEntry>, StorageError> {
        let state = self.state.read().unwrap();
        Ok(state.pending.iter().filter(|e| e.is_to_send()).cloned().collect())
    }

    async fn pending_to_revoke(&self) -> Result<Vec<PendingUploadEntry>, StorageError> {
        let state = self.state.read().unwrap();
        Ok(state.pending.iter().filter(|e| e.is_to_revoke()).cloned().collect())
    }

    async fn save_pending(&self, entry: PendingUploadEntry) -> Result<(), StorageError> {
        let mut state = self.state.write().unwrap();
        match state.pending.iter_mut().find(|e| e.id == entry.id) {
            Some(slot) => *slot = entry,
            None => {
                debug!(id = %entry.id, "Queued pending upload");
                state.pending.push(entry);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Trusted entries
    // =========================================================================

    async fn get_trusted_by_kid(&self, kid: &str) -> Result<Option<TrustedEntry>, StorageError> {
        let state = self.state.read().unwrap();
        Ok(state.trusted.get(kid).cloned())
    }

    async fn max_index(&self) -> Result<Option<i64>, StorageError> {
        let state = self.state.read().unwrap();
        Ok(state.trusted.values().map(|e| e.index).max())
    }

    async fn revoke_all_active(&self, batch_tag: &str) -> Result<u64, StorageError> {
        let mut state = self.state.write().unwrap();
        Ok(state.revoke_all_active(batch_tag))
    }

    async fn upsert_trusted(&self, entry: TrustedEntry) -> Result<(), StorageError> {
        let mut state = self.state.write().unwrap();
        state.check_insert(&entry)?;
        state.trusted.insert(entry.kid.clone(), entry);
        Ok(())
    }

    async fn list_trusted(&self) -> Result<Vec<TrustedEntry>, StorageError> {
        let state = self.state.read().unwrap();
        let mut entries: Vec<TrustedEntry> = state.trusted.values().cloned().collect();
        entries.sort_by_key(|e| e.index);
        Ok(entries)
    }

    // =========================================================================
    // Invalid entries and audit log
    // =========================================================================

    async fn insert_invalid(&self, entry: InvalidEntry) -> Result<(), StorageError> {
        self.state.write().unwrap().invalid.push(entry);
        Ok(())
    }

    async fn list_invalid(&self) -> Result<Vec<InvalidEntry>, StorageError> {
        Ok(self.state.read().unwrap().invalid.clone())
    }

    async fn insert_audit(&self, record: AuditLogRecord) -> Result<(), StorageError> {
        self.state.write().unwrap().audit.push(record);
        Ok(())
    }

    async fn list_audit(&self) -> Result<Vec<AuditLogRecord>, StorageError> {
        Ok(self.state.read().unwrap().audit.clone())
    }

    // =========================================================================
    // Download reconciliation
    // =========================================================================

    async fn commit_download(&self, plan: &ReconcilePlan) -> Result<u64, StorageError> {
        let mut state = self.state.write().unwrap();

        // Validate everything before the first mutation
        for kid in &plan.reinstate {
            if !state.trusted.contains_key(kid) {
                return Err(StorageError::NotFound(kid.clone()));
            }
        }
        let mut indices = HashSet::new();
        for entry in &plan.admit {
            if state.trusted.contains_key(&entry.kid) {
                return Err(StorageError::AlreadyExists(entry.kid.clone()));
            }
            if !indices.insert(entry.index) {
                return Err(StorageError::AlreadyExists(format!("index {}", entry.index)));
            }
            state.check_insert(entry)?;
        }

        let active_before = state.revoke_all_active(&plan.batch_tag);
        for kid in &plan.reinstate {
            if let Some(entry) = state.trusted.get_mut(kid) {
                entry.reinstate();
            }
        }
        for entry in &plan.admit {
            state.trusted.insert(entry.kid.clone(), entry.clone());
        }
        state.invalid.extend(plan.invalid.iter().cloned());

        info!(
            batch_tag = %plan.batch_tag,
            active_before = active_before,
            reinstated = plan.reinstate.len(),
            admitted = plan.admit.len(),
            invalid = plan.invalid.len(),
            "Committed download reconciliation"
        );
        Ok(active_before)
    }
}
