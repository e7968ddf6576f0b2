//! Download and reconciliation flow

use std::collections::HashSet;
use tracing::{error, info, warn};
use trustlist_core::{batch_tag, AuditLogRecord, DownloadCounts, OperationType};

use super::{Outcome, SyncEngine, SyncError};
use crate::reconcile::{prepare, ReconcilePlan};

/// Result of one download run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    pub batch_tag: String,
    pub outcome: Outcome,
    /// Zeroed unless the run committed a trust list
    pub counts: DownloadCounts,
}

impl DownloadSummary {
    /// Report string with the run counters, for diagnostics
    pub fn report(&self) -> String {
        format!(
            "{} (tot={} new={} old={} invalid={} revoked={})",
            self.outcome.report(),
            self.counts.num_tot_doc,
            self.counts.num_new_doc,
            self.counts.num_old_doc,
            self.counts.num_invalid_doc,
            self.counts.num_revoked_doc
        )
    }
}

struct Reconciled {
    outcome: Outcome,
    counts: DownloadCounts,
    changed: bool,
}

impl SyncEngine {
    /// Download the trust list and reconcile the trust store against it
    ///
    /// Exactly one audit record is written, whatever happens. The cache is
    /// purged only after a committed, non-empty list.
    pub async fn run_download(&self) -> DownloadSummary {
        let tag = batch_tag(OperationType::Download);
        info!(batch_tag = %tag, "Download run started");

        let reconciled = match self.reconcile(&tag).await {
            Ok(r) => r,
            Err(e) => {
                error!(batch_tag = %tag, error = %e, "Download run failed");
                Reconciled {
                    outcome: Outcome::failed(&e),
                    counts: DownloadCounts::default(),
                    changed: false,
                }
            }
        };

        self.audit(AuditLogRecord::download(
            &self.country,
            &tag,
            reconciled.counts,
            reconciled.outcome.report(),
        ))
        .await;

        if reconciled.changed && !self.purge().await {
            warn!(batch_tag = %tag, "Cache invalidation failed");
        }

        let summary = DownloadSummary {
            batch_tag: tag,
            outcome: reconciled.outcome,
            counts: reconciled.counts,
        };
        info!(batch_tag = %summary.batch_tag, report = %summary.report(), "Download run finished");
        summary
    }

    async fn reconcile(&self, tag: &str) -> Result<Reconciled, SyncError> {
        let response = self.client.download_trust_list().await?;
        let outcome = Outcome::from_status(response.status);

        let items = match response.data {
            Some(items) if outcome.is_accepted() => items,
            _ => {
                if !outcome.is_accepted() {
                    warn!(batch_tag = %tag, status = response.status, "Gateway refused trust list download");
                }
                return Ok(Reconciled {
                    outcome,
                    counts: DownloadCounts::default(),
                    changed: false,
                });
            }
        };

        let items = prepare(items, self.verifier.as_ref());

        let mut known = HashSet::new();
        for item in &items {
            if !known.contains(&item.kid) && self.store.get_trusted_by_kid(&item.kid).await?.is_some() {
                known.insert(item.kid.clone());
            }
        }
        let max_index = self.store.max_index().await?;

        let plan = ReconcilePlan::build(tag, &items, &known, max_index);
        let active_before = self.store.commit_download(&plan).await?;

        Ok(Reconciled {
            outcome,
            counts: plan.counts(active_before),
            changed: !items.is_empty(),
        })
    }
}
