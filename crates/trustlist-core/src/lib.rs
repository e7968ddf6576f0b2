//! # Trust-list core
//!
//! Types and cryptographic building blocks shared by the trust-list gateway
//! client and the synchronization worker.
//!
//! ## Key Concepts
//!
//! - **Anchor (CSCA)**: a self-signed country authority acting as a trust root
//! - **Leaf (DSC)**: a document signer certificate issued by an anchor
//! - **kid**: key identifier, the lookup key of every certificate entry
//! - **Batch tag**: correlation token stamped on everything one operation produces
//!
//! ## Modules
//!
//! - `types` - trusted, invalid and pending entries, audit records
//! - `certificate` - COSE certificate envelopes
//! - `crypto` - Ed25519 keys and the outbound signing capability
//! - `verifier` - anchor and leaf-over-anchor signature checks
//! - `batch` - batch tag generation

pub mod batch;
pub mod certificate;
pub mod crypto;
pub mod error;
pub mod types;
pub mod verifier;

pub use batch::batch_tag;
pub use certificate::{Certificate, CertificateBody};
pub use crypto::{CoseSigner, KeyPair, PayloadSigner, PublicKey, SignedEnvelope};
pub use error::{CoreError, Result, SigningError};
pub use types::{
    AuditLogRecord, CertificateType, DownloadCounts, InvalidEntry, OperationType,
    PendingUploadEntry, RemoteTrustListItem, TrustedEntry,
};
pub use verifier::{verify_chain, CertificateSignatureVerifier, ChainVerifier};
