//! In-process lease backend
//!
//! Only excludes runs within one process. Replicated deployments use the
//! `shedlock` table of the PostgreSQL store instead.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use super::{lease, LockProvider};
use crate::storage::StorageError;

#[derive(Debug, Clone)]
struct LeaseRow {
    lock_until: DateTime<Utc>,
    locked_at: DateTime<Utc>,
    locked_by: String,
}

/// Lease table kept in memory
#[derive(Debug, Default)]
pub struct MemoryLockProvider {
    leases: Mutex<HashMap<String, LeaseRow>>,
}

impl MemoryLockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current holder of `name`, if the lease is live
    pub fn holder_of(&self, name: &str) -> Option<String> {
        let leases = self.leases.lock().unwrap();
        leases
            .get(name)
            .filter(|row| row.lock_until > Utc::now())
            .map(|row| row.locked_by.clone())
    }
}

#[async_trait]
impl LockProvider for MemoryLockProvider {
    async fn try_acquire(
        &self,
        name: &str,
        holder: &str,
        lock_at_most: Duration,
    ) -> Result<bool, StorageError> {
        let now = Utc::now();
        let mut leases = self.leases.lock().unwrap();

        if let Some(row) = leases.get(name) {
            if row.lock_until > now {
                return Ok(false);
            }
        }

        leases.insert(
            name.to_string(),
            LeaseRow {
                lock_until: now + lease(lock_at_most),
                locked_at: now,
                locked_by: holder.to_string(),
            },
        );
        debug!(name = %name, holder = %holder, "Lease acquired");
        Ok(true)
    }

    async fn release(
        &self,
        name: &str,
        holder: &str,
        lock_at_least: Duration,
    ) -> Result<(), StorageError> {
        let now = Utc::now();
        let mut leases = self.leases.lock().unwrap();

        match leases.get_mut(name) {
            Some(row) if row.locked_by == holder => {
                row.lock_until = now.max(row.locked_at + lease(lock_at_least));
                debug!(name = %name, holder = %holder, "Lease released");
                Ok(())
            }
            _ => Err(StorageError::NotFound(format!("lease {} for {}", name, holder))),
        }
    }
}
