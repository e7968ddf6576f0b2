//! Cluster-wide run coordination
//!
//! Each scheduled flow runs under a named lease. An instance that cannot take
//! the lease skips the tick; the next tick tries again. Leases follow the
//! ShedLock model:
//!
//! - a lease row `{name, lock_until, locked_at, locked_by}` is taken iff it is
//!   absent or `lock_until <= now`
//! - `lock_at_most` bounds the lease so a crashed holder cannot block the
//!   cluster forever
//! - on release `lock_until = max(now, locked_at + lock_at_least)`, so a run
//!   that finishes quickly still keeps other instances off the same tick

pub mod memory;

pub use memory::MemoryLockProvider;

use async_trait::async_trait;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::storage::StorageError;

/// Lease name of the upload/revoke flow
pub const UPLOAD_JOB: &str = "TrustListWorker_upload";
/// Lease name of the download flow
pub const DOWNLOAD_JOB: &str = "TrustListWorker_download";

/// Backend holding named leases
#[async_trait]
pub trait LockProvider: Send + Sync + Debug {
    /// Take the lease `name` for `holder`, returning false if someone else holds it
    async fn try_acquire(
        &self,
        name: &str,
        holder: &str,
        lock_at_most: Duration,
    ) -> Result<bool, StorageError>;

    /// Give up the lease, keeping it for at least `lock_at_least` after acquisition
    async fn release(
        &self,
        name: &str,
        holder: &str,
        lock_at_least: Duration,
    ) -> Result<(), StorageError>;
}

/// Convert a lease duration for timestamp arithmetic, saturating at one year
pub(crate) fn lease(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::days(365))
}

/// Runs futures under a named lease
#[derive(Debug, Clone)]
pub struct RunCoordinator {
    provider: Arc<dyn LockProvider>,
    holder: String,
    lock_at_most: Duration,
    lock_at_least: Duration,
}

impl RunCoordinator {
    pub fn new(
        provider: Arc<dyn LockProvider>,
        holder: impl Into<String>,
        lock_at_most: Duration,
        lock_at_least: Duration,
    ) -> Self {
        Self {
            provider,
            holder: holder.into(),
            lock_at_most,
            lock_at_least,
        }
    }

    /// Identity recorded as `locked_by`
    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Run `fut` if the lease `job` can be taken
    ///
    /// Returns `None` without running `fut` when another holder has the lease
    /// or the lease backend is unreachable.
    pub async fn run_exclusive<F, T>(&self, job: &str, fut: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        match self
            .provider
            .try_acquire(job, &self.holder, self.lock_at_most)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                debug!(job = %job, holder = %self.holder, "Lease held elsewhere, skipping run");
                return None;
            }
            Err(e) => {
                warn!(job = %job, error = %e, "Could not query lease, skipping run");
                return None;
            }
        }

        let output = fut.await;

        if let Err(e) = self
            .provider
            .release(job, &self.holder, self.lock_at_least)
            .await
        {
            warn!(job = %job, error = %e, "Failed to release lease, it expires on its own");
        }

        Some(output)
    }
}
