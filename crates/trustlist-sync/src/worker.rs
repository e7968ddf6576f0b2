//! Lease-guarded entry points for schedulers and operators

use std::sync::Arc;

use crate::coordinator::{RunCoordinator, DOWNLOAD_JOB, UPLOAD_JOB};
use crate::engine::{DownloadSummary, SyncEngine, UploadSummary};

/// The sync engine behind the run coordinator
pub struct Worker {
    engine: Arc<SyncEngine>,
    coordinator: RunCoordinator,
}

impl Worker {
    pub fn new(engine: Arc<SyncEngine>, coordinator: RunCoordinator) -> Self {
        Self {
            engine,
            coordinator,
        }
    }

    /// Run the upload flow unless another instance holds its lease
    pub async fn upload_worker(&self) -> Option<UploadSummary> {
        self.coordinator
            .run_exclusive(UPLOAD_JOB, self.engine.run_upload())
            .await
    }

    /// Run the download flow unless another instance holds its lease
    pub async fn download_worker(&self) -> Option<DownloadSummary> {
        self.coordinator
            .run_exclusive(DOWNLOAD_JOB, self.engine.run_download())
            .await
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn coordinator(&self) -> &RunCoordinator {
        &self.coordinator
    }
}
