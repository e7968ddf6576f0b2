//! Two-tier signature chain verification
//!
//! Anchors must be self-signed; leaves must be signed by a verified anchor of
//! the same country. The signed body must also carry the kid, country and type
//! the item was delivered under, so relabelled bytes never verify. Malformed input never raises: it is simply not verified,
//! so one bad remote item cannot abort a reconciliation.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::certificate::Certificate;
use crate::error::CoreError;
use crate::types::{CertificateType, RemoteTrustListItem};

/// Predicates over certificate bytes used by reconciliation
pub trait ChainVerifier: Send + Sync {
    /// True iff the anchor's signature validates against its own key and its
    /// signed body matches the item's labels
    fn verify_anchor(&self, anchor: &RemoteTrustListItem) -> bool;

    /// True iff `leaf` was issued by `anchor` and validates with its public key
    fn verify_leaf_against_anchor(
        &self,
        leaf: &RemoteTrustListItem,
        anchor: &RemoteTrustListItem,
    ) -> bool;
}

/// Verifier for COSE certificate envelopes
#[derive(Debug, Clone, Copy, Default)]
pub struct CertificateSignatureVerifier;

impl CertificateSignatureVerifier {
    pub fn new() -> Self {
        Self
    }
}

impl ChainVerifier for CertificateSignatureVerifier {
    fn verify_anchor(&self, anchor: &RemoteTrustListItem) -> bool {
        let result = Certificate::from_bytes(&anchor.raw_data).and_then(|cert| {
            cert.check_labels(anchor)?;
            if cert.body().issuer_kid != cert.body().kid {
                return Err(CoreError::LabelMismatch(format!(
                    "anchor {} issued by {}",
                    cert.body().kid,
                    cert.body().issuer_kid
                )));
            }
            let own_key = cert.subject_key()?;
            cert.verify_signed_by(&own_key)
        });

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(kid = %anchor.kid, country = %anchor.country, error = %e, "Anchor self-signature check failed");
                false
            }
        }
    }

    fn verify_leaf_against_anchor(
        &self,
        leaf: &RemoteTrustListItem,
        anchor: &RemoteTrustListItem,
    ) -> bool {
        let result = Certificate::from_bytes(&anchor.raw_data).and_then(|anchor_cert| {
            anchor_cert.check_labels(anchor)?;
            let leaf_cert = Certificate::from_bytes(&leaf.raw_data)?;
            leaf_cert.check_labels(leaf)?;
            if leaf_cert.body().issuer_kid != anchor_cert.body().kid {
                return Err(CoreError::LabelMismatch(format!(
                    "leaf {} issued by {}, not {}",
                    leaf.kid,
                    leaf_cert.body().issuer_kid,
                    anchor_cert.body().kid
                )));
            }
            leaf_cert.verify_signed_by(&anchor_cert.subject_key()?)
        });

        match result {
            Ok(()) => true,
            Err(e) => {
                debug!(leaf = %leaf.kid, anchor = %anchor.kid, error = %e, "Leaf not signed by anchor");
                false
            }
        }
    }
}

/// Compute `verified_sign` for every item of a downloaded list
///
/// Anchors are checked for a valid self-signature. Every leaf starts
/// unverified and is tried against the verified anchors of its own country,
/// stopping at the first one that validates it. The order in which
/// same-country anchors are tried is not significant.
pub fn verify_chain<V: ChainVerifier + ?Sized>(items: &mut [RemoteTrustListItem], verifier: &V) {
    for item in items.iter_mut() {
        if item.certificate_type == CertificateType::Anchor {
            item.verified_sign = verifier.verify_anchor(item);
        }
    }

    let mut anchors_by_country: HashMap<String, Vec<RemoteTrustListItem>> = HashMap::new();
    for anchor in items
        .iter()
        .filter(|i| i.certificate_type == CertificateType::Anchor && i.verified_sign)
    {
        anchors_by_country
            .entry(anchor.country.clone())
            .or_default()
            .push(anchor.clone());
    }

    for leaf in items
        .iter_mut()
        .filter(|i| i.certificate_type == CertificateType::Leaf)
    {
        leaf.verified_sign = anchors_by_country
            .get(&leaf.country)
            .map(|anchors| {
                anchors
                    .iter()
                    .any(|anchor| verifier.verify_leaf_against_anchor(leaf, anchor))
            })
            .unwrap_or(false);
    }
}
