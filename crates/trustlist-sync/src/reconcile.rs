//! Reconciliation of a downloaded trust list against the local trust store
//!
//! Every incoming item ends up in exactly one disposition:
//! - **Reinstated**: its kid is already known; the entry survives the sweep
//! - **Admitted**: unknown kid with a verified signature; inserted with the
//!   next publication index
//! - **Invalid**: unknown kid failing verification; recorded for audit
//!
//! Known entries absent from the list stay revoked by the tombstone sweep.
//! The plan is computed without touching the store and then committed in one
//! step by [`TrustStore::commit_download`](crate::storage::TrustStore::commit_download).

use chrono::Utc;
use std::collections::HashSet;
use trustlist_core::{
    verify_chain, ChainVerifier, DownloadCounts, InvalidEntry, RemoteTrustListItem, TrustedEntry,
};

/// Compute `verified_sign` for every downloaded item
///
/// Whatever the wire carried is discarded. Anchors are checked for their
/// self-signature, leaves against the verified anchors of their country.
pub fn prepare<V: ChainVerifier + ?Sized>(
    mut items: Vec<RemoteTrustListItem>,
    verifier: &V,
) -> Vec<RemoteTrustListItem> {
    verify_chain(&mut items, verifier);
    items
}

/// Outcome for one incoming item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Reinstated,
    Admitted { index: i64 },
    Invalid,
}

/// Mutations a download run applies after the tombstone sweep
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    /// Batch tag of the run, stamped on revocations, admissions and invalid entries
    pub batch_tag: String,
    /// Known kids to reinstate
    pub reinstate: Vec<String>,
    /// New entries, indices already assigned
    pub admit: Vec<TrustedEntry>,
    pub invalid: Vec<InvalidEntry>,
    /// Disposition of every incoming item, in incoming order
    pub dispositions: Vec<(String, Disposition)>,
}

impl ReconcilePlan {
    /// Build the plan for verified `items`
    ///
    /// `known_kids` holds the kids of incoming items that already exist in the
    /// trust store, revoked or not. New entries receive the contiguous index
    /// range following `max_index`, in incoming order. Items are classified in
    /// order, each seeing the admissions before it: once a kid is admitted its
    /// later repeats count as reinstated, while a repeat of an invalid kid is
    /// judged on its own signature.
    pub fn build(
        batch_tag: &str,
        items: &[RemoteTrustListItem],
        known_kids: &HashSet<String>,
        max_index: Option<i64>,
    ) -> Self {
        let now = Utc::now();
        let mut next_index = max_index.unwrap_or(0);
        let mut admitted: HashSet<&str> = HashSet::new();
        let mut reinstated: HashSet<&str> = HashSet::new();
        let mut plan = ReconcilePlan {
            batch_tag: batch_tag.to_string(),
            ..Default::default()
        };

        for item in items {
            let disposition = if known_kids.contains(&item.kid) {
                if reinstated.insert(item.kid.as_str()) {
                    plan.reinstate.push(item.kid.clone());
                }
                Disposition::Reinstated
            } else if admitted.contains(item.kid.as_str()) {
                Disposition::Reinstated
            } else if item.verified_sign {
                next_index += 1;
                admitted.insert(item.kid.as_str());
                plan.admit.push(TrustedEntry {
                    kid: item.kid.clone(),
                    country: item.country.clone(),
                    certificate_type: item.certificate_type,
                    raw_data: item.raw_data.clone(),
                    signature: item.signature.clone(),
                    index: next_index,
                    revoked: false,
                    revoked_date: None,
                    revoked_batch_tag: None,
                    download_batch_tag: Some(batch_tag.to_string()),
                    created_at: now,
                });
                Disposition::Admitted { index: next_index }
            } else {
                plan.invalid.push(InvalidEntry {
                    kid: item.kid.clone(),
                    country: item.country.clone(),
                    certificate_type: item.certificate_type,
                    raw_data: item.raw_data.clone(),
                    signature: item.signature.clone(),
                    download_batch_tag: batch_tag.to_string(),
                    created_at: now,
                });
                Disposition::Invalid
            };

            plan.dispositions.push((item.kid.clone(), disposition));
        }

        plan
    }

    fn count(&self, pred: impl Fn(&Disposition) -> bool) -> i64 {
        self.dispositions.iter().filter(|(_, d)| pred(d)).count() as i64
    }

    pub fn num_old(&self) -> i64 {
        self.count(|d| matches!(d, Disposition::Reinstated))
    }

    pub fn num_new(&self) -> i64 {
        self.count(|d| matches!(d, Disposition::Admitted { .. }))
    }

    pub fn num_invalid(&self) -> i64 {
        self.count(|d| matches!(d, Disposition::Invalid))
    }

    /// Run counters once the sweep reported `active_before`
    pub fn counts(&self, active_before: u64) -> DownloadCounts {
        DownloadCounts {
            num_tot_doc: active_before as i64,
            num_doc_flusso: self.dispositions.len() as i64,
            num_new_doc: self.num_new(),
            num_invalid_doc: self.num_invalid(),
            num_old_doc: self.num_old(),
            num_revoked_doc: 0,
        }
        .with_derived_revoked()
    }
}
