//! Trust-List Synchronization Worker
//!
//! Keeps a national gateway in step with the central trust-list authority:
//! - Uploads locally issued signer certificates and revokes withdrawn ones
//! - Downloads the consolidated trust list, verifies every certificate chain
//!   and reconciles the local trust store against it
//! - Writes one audit record per uploaded item, revoked item and download run
//! - Runs each flow under a cluster-wide lease so replicas never overlap
//!
//! ## Reconciliation
//!
//! 1. **Tombstone sweep**: every active trusted entry is revoked with the run's batch tag
//! 2. **Reinstate**: incoming items whose kid is already known are un-revoked
//! 3. **Admit**: unknown, verified items get the next publication indices
//! 4. **Invalid**: unknown items failing verification are recorded for audit
//!
//! The sweep and the reconciliation commit together; a failed run leaves the
//! store as it was.
//!
//! ## API Endpoints
//!
//! - `GET /health` - Liveness check
//! - `GET /testUpload` - Run the upload flow now
//! - `GET /testDownload` - Run the download flow now
//! - `GET /testSign` - Sign the first pending entry without sending it
//! - `GET /testPurge` - Purge the configured cache targets

pub mod api;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod purge;
pub mod reconcile;
pub mod scheduler;
pub mod storage;
pub mod worker;

pub use api::{create_router, AppState};
pub use config::{ConfigError, WorkerConfig};
pub use coordinator::{LockProvider, MemoryLockProvider, RunCoordinator, DOWNLOAD_JOB, UPLOAD_JOB};
pub use engine::{DownloadSummary, ItemOutcome, Outcome, SyncEngine, SyncError, UploadSummary};
pub use purge::{CacheInvalidator, HttpCacheInvalidator, NoopInvalidator};
pub use reconcile::{Disposition, ReconcilePlan};
pub use storage::{MemoryStore, StorageError, TrustStore};
pub use worker::Worker;
