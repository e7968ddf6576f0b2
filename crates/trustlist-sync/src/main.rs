//! Trust-List Synchronization Worker Binary
//!
//! Runs the scheduled upload and download flows and serves the diagnostic
//! endpoints.

use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use trustlist_client::{GatewayClient, HttpGatewayClient, HttpGatewayConfig, MockGatewayClient};
use trustlist_core::{CoseSigner, KeyPair};
use trustlist_sync::{
    create_router, scheduler, AppState, CacheInvalidator, HttpCacheInvalidator, LockProvider,
    MemoryLockProvider, MemoryStore, NoopInvalidator, RunCoordinator, SyncEngine, TrustStore,
    Worker, WorkerConfig,
};

#[tokio::main]
async fn main() {
    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("trustlist-sync: {}", e);
            std::process::exit(2);
        }
    };

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    // Storage and leases
    let (store, locks) = open_store(&config).await;

    // Signing
    let signer = match &config.signing_key {
        Some(encoded) => {
            let key_pair = KeyPair::from_base64(&config.signing_kid, encoded)
                .expect("TRUSTLIST_SIGNING_KEY must be a base64 Ed25519 seed");
            CoseSigner::new(key_pair)
        }
        None => {
            warn!("No signing key configured, uploads will fail until one is provided");
            CoseSigner::unconfigured()
        }
    };

    // Gateway
    let client: Arc<dyn GatewayClient> = match &config.gateway_url {
        Some(url) => {
            let mut gateway = HttpGatewayConfig::new(url.clone());
            if let Some(timeout) = config.gateway_timeout {
                gateway = gateway.with_timeout(timeout);
            }
            Arc::new(HttpGatewayClient::new(gateway).expect("Failed to build gateway client"))
        }
        None => {
            warn!("No gateway configured, running against the in-process mock");
            Arc::new(MockGatewayClient::new())
        }
    };

    // Cache invalidation
    let invalidator: Arc<dyn CacheInvalidator> = match &config.purge_url {
        Some(url) => Arc::new(
            HttpCacheInvalidator::new(url.clone(), config.gateway_timeout)
                .expect("Failed to build cache purge client"),
        ),
        None => Arc::new(NoopInvalidator),
    };

    info!(
        country = %config.origin_country,
        instance = %config.instance_id,
        gateway = client.description(),
        signing_kid = ?signer.kid(),
        port = config.port,
        "Starting trust-list worker"
    );

    let engine = SyncEngine::new(store, client, Arc::new(signer), config.origin_country.clone())
        .with_invalidator(invalidator, config.purge_targets.clone());
    let coordinator = RunCoordinator::new(
        locks,
        config.instance_id.clone(),
        config.lock_at_most,
        config.lock_at_least,
    );
    let worker = Arc::new(Worker::new(Arc::new(engine), coordinator));

    let _scheduler = scheduler::spawn(
        worker.clone(),
        config.upload_interval,
        config.download_interval,
    );

    // Build router
    let app = create_router(Arc::new(AppState { worker }));

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!(addr = %addr, "Diagnostics listening");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}

#[cfg(feature = "postgres")]
async fn open_store(config: &WorkerConfig) -> (Arc<dyn TrustStore>, Arc<dyn LockProvider>) {
    match &config.database_url {
        Some(url) => {
            let store = Arc::new(
                trustlist_sync::storage::PostgresStore::new(url)
                    .await
                    .expect("Failed to connect to PostgreSQL"),
            );
            let trust: Arc<dyn TrustStore> = store.clone();
            let locks: Arc<dyn LockProvider> = store;
            (trust, locks)
        }
        None => memory_store(),
    }
}

#[cfg(not(feature = "postgres"))]
async fn open_store(config: &WorkerConfig) -> (Arc<dyn TrustStore>, Arc<dyn LockProvider>) {
    if config.database_url.is_some() {
        warn!("TRUSTLIST_DATABASE_URL ignored: built without the postgres feature");
    }
    memory_store()
}

fn memory_store() -> (Arc<dyn TrustStore>, Arc<dyn LockProvider>) {
    warn!("Using in-memory storage; state is lost on restart and leases are process-local");
    (Arc::new(MemoryStore::new()), Arc::new(MemoryLockProvider::new()))
}
