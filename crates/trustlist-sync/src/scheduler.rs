//! Fixed-interval scheduling of the two flows

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::worker::Worker;

/// Handles of the running flow tasks
pub struct Scheduler {
    pub upload: JoinHandle<()>,
    pub download: JoinHandle<()>,
}

impl Scheduler {
    pub fn abort(&self) {
        self.upload.abort();
        self.download.abort();
    }
}

const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Start one task per flow; the first run of each happens immediately
pub fn spawn(worker: Arc<Worker>, upload_every: Duration, download_every: Duration) -> Scheduler {
    let upload_every = upload_every.max(MIN_PERIOD);
    let download_every = download_every.max(MIN_PERIOD);
    info!(
        upload_every_secs = upload_every.as_secs(),
        download_every_secs = download_every.as_secs(),
        "Starting scheduler"
    );

    let upload_worker = worker.clone();
    let upload = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(upload_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if upload_worker.upload_worker().await.is_none() {
                debug!("Upload tick skipped");
            }
        }
    });

    let download = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(download_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if worker.download_worker().await.is_none() {
                debug!("Download tick skipped");
            }
        }
    });

    Scheduler { upload, download }
}
