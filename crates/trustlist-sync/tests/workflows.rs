//! Upload flow, lease gating and diagnostic endpoints

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use common::*;
use trustlist_client::{GatewayResponse, MockCall, MockGatewayClient};
use trustlist_core::{KeyPair, OperationType, PendingUploadEntry};
use trustlist_sync::{
    create_router, AppState, LockProvider, MemoryLockProvider, MemoryStore, Outcome,
    RunCoordinator, TrustStore, Worker, DOWNLOAD_JOB, UPLOAD_JOB,
};

fn worker(
    store: Arc<dyn TrustStore>,
    client: Arc<MockGatewayClient>,
    locks: Arc<MemoryLockProvider>,
) -> Arc<Worker> {
    let coordinator = RunCoordinator::new(
        locks,
        "node-a",
        Duration::from_secs(60),
        Duration::ZERO,
    );
    Arc::new(Worker::new(Arc::new(engine(store, client)), coordinator))
}

async fn get(worker: Arc<Worker>, uri: &str) -> (StatusCode, String) {
    let app = create_router(Arc::new(AppState { worker }));
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

// =============================================================================
// Upload flow
// =============================================================================

#[tokio::test]
async fn test_every_item_gets_its_own_audit_record() {
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(MockGatewayClient::new());
    client.push_upload_reply(Ok(GatewayResponse::accepted("echo".into())));
    client.push_upload_reply(Ok(GatewayResponse::status(400)));
    store.save_pending(PendingUploadEntry::new(vec![1])).await.unwrap();
    store.save_pending(PendingUploadEntry::new(vec![2])).await.unwrap();

    let mut withdrawn = PendingUploadEntry::new(vec![3]);
    withdrawn.upload_batch_tag = Some("earlier".into());
    withdrawn.revoked = true;
    store.save_pending(withdrawn).await.unwrap();

    let summary = engine(store.clone(), client.clone()).run_upload().await;

    assert_eq!(summary.report(), "sent 1/2, revoked 1/1");
    assert_eq!(client.calls().len(), 3);

    let audit = store.list_audit().await.unwrap();
    let tags: Vec<&str> = audit.iter().map(|r| r.batch_tag.as_str()).collect();
    assert_eq!(audit.len(), 3);
    assert_eq!(audit.iter().filter(|r| r.operation == OperationType::Upload).count(), 2);
    assert_eq!(audit.iter().filter(|r| r.operation == OperationType::Revoke).count(), 1);
    assert!(tags.windows(2).all(|w| w[0] != w[1]));
    assert!(audit.iter().all(|r| r.download_info.is_none()));
}

#[tokio::test]
async fn test_failed_stamp_leaves_entry_pending() {
    let store = Arc::new(FailingStore::default());
    store.inner.save_pending(PendingUploadEntry::new(vec![1])).await.unwrap();
    store.fail_save_pending.store(true, Ordering::SeqCst);
    let client = Arc::new(MockGatewayClient::new());

    let summary = engine(store.clone(), client).run_upload().await;

    assert!(matches!(summary.sent[0].outcome, Outcome::Failed { .. }));
    let pending = store.pending_to_send().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert!(pending[0].upload_batch_tag.is_none());
    assert_eq!(store.list_audit().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_uploads_carry_origin_country_and_signed_payload() {
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(MockGatewayClient::new());
    store.save_pending(PendingUploadEntry::new(vec![9, 9])).await.unwrap();

    engine(store, client.clone()).run_upload().await;

    match &client.calls()[0] {
        MockCall::Upload { signed, country } => {
            assert_eq!(country, "IT");
            assert!(!signed.is_empty());
        }
        other => panic!("unexpected call {:?}", other),
    }
}

// =============================================================================
// Lease gating
// =============================================================================

#[tokio::test]
async fn test_busy_lease_is_a_silent_no_op() {
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(MockGatewayClient::new());
    let locks = Arc::new(MemoryLockProvider::new());
    locks
        .try_acquire(DOWNLOAD_JOB, "node-b", Duration::from_secs(60))
        .await
        .unwrap();

    let worker = worker(store.clone(), client.clone(), locks);

    assert!(worker.download_worker().await.is_none());
    assert!(client.calls().is_empty());
    assert!(store.list_audit().await.unwrap().is_empty());

    // the upload lease is independent
    assert!(worker.upload_worker().await.is_some());
}

#[tokio::test]
async fn test_lease_is_released_after_run() {
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(MockGatewayClient::new());
    let locks = Arc::new(MemoryLockProvider::new());
    let worker = worker(store, client, locks.clone());

    assert!(worker.upload_worker().await.is_some());
    assert!(locks.holder_of(UPLOAD_JOB).is_none());
    assert!(worker.upload_worker().await.is_some());
}

// =============================================================================
// Diagnostic endpoints
// =============================================================================

#[tokio::test]
async fn test_health() {
    let worker = worker(
        Arc::new(MemoryStore::new()),
        Arc::new(MockGatewayClient::new()),
        Arc::new(MemoryLockProvider::new()),
    );
    let (status, body) = get(worker, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"status\":\"ok\""));
}

#[tokio::test]
async fn test_download_endpoint_echoes_counts() {
    let client = Arc::new(MockGatewayClient::new());
    client.publish(vec![anchor_item(&KeyPair::generate("IT-CSCA"), "IT")]);
    let worker = worker(
        Arc::new(MemoryStore::new()),
        client,
        Arc::new(MemoryLockProvider::new()),
    );

    let (status, body) = get(worker, "/testDownload").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "testDownload: 200 (tot=0 new=1 old=0 invalid=0 revoked=-1)");
}

#[tokio::test]
async fn test_upload_endpoint_reports_skip() {
    let locks = Arc::new(MemoryLockProvider::new());
    locks
        .try_acquire(UPLOAD_JOB, "node-b", Duration::from_secs(60))
        .await
        .unwrap();
    let worker = worker(
        Arc::new(MemoryStore::new()),
        Arc::new(MockGatewayClient::new()),
        locks,
    );

    let (_, body) = get(worker, "/testUpload").await;
    assert_eq!(body, "testUpload: SKIPPED (lock held by another instance)");
}

#[tokio::test]
async fn test_sign_endpoint() {
    let store = Arc::new(MemoryStore::new());
    let worker = worker(
        store.clone(),
        Arc::new(MockGatewayClient::new()),
        Arc::new(MemoryLockProvider::new()),
    );

    let (_, body) = get(worker.clone(), "/testSign").await;
    assert_eq!(body, "testSign: nothing to sign");

    store.save_pending(PendingUploadEntry::new(vec![1, 2, 3])).await.unwrap();
    let (status, body) = get(worker, "/testSign").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("testSign: OK"));
    assert!(store.pending_to_send().await.unwrap()[0].upload_batch_tag.is_none());
}

#[tokio::test]
async fn test_purge_endpoint() {
    let worker = worker(
        Arc::new(MemoryStore::new()),
        Arc::new(MockGatewayClient::new()),
        Arc::new(MemoryLockProvider::new()),
    );
    let (_, body) = get(worker, "/testPurge").await;
    assert_eq!(body, "testPurge: OK");
}
