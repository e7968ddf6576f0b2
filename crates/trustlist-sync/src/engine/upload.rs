//! Upload and revoke flow

use tracing::{error, info, warn};
use trustlist_core::{batch_tag, AuditLogRecord, OperationType, PendingUploadEntry};

use super::{Outcome, SyncEngine, SyncError};

/// Result of propagating one pending entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub id: String,
    pub batch_tag: String,
    pub outcome: Outcome,
}

/// Result of one upload flow run
#[derive(Debug, Clone, Default)]
pub struct UploadSummary {
    pub sent: Vec<ItemOutcome>,
    pub revoked: Vec<ItemOutcome>,
}

impl UploadSummary {
    fn accepted(items: &[ItemOutcome]) -> usize {
        items.iter().filter(|i| i.outcome.is_accepted()).count()
    }

    /// One line per flow, e.g. `sent 2/3, revoked 0/0`
    pub fn report(&self) -> String {
        format!(
            "sent {}/{}, revoked {}/{}",
            Self::accepted(&self.sent),
            self.sent.len(),
            Self::accepted(&self.revoked),
            self.revoked.len()
        )
    }
}

impl SyncEngine {
    /// Send every pending entry, then revoke every withdrawn one
    pub async fn run_upload(&self) -> UploadSummary {
        let mut summary = UploadSummary::default();

        match self.store.pending_to_send().await {
            Ok(entries) => {
                for entry in entries {
                    summary.sent.push(self.send(entry).await);
                }
            }
            Err(e) => error!(error = %e, "Failed to query entries to send"),
        }

        match self.store.pending_to_revoke().await {
            Ok(entries) => {
                for entry in entries {
                    summary.revoked.push(self.revoke(entry).await);
                }
            }
            Err(e) => error!(error = %e, "Failed to query entries to revoke"),
        }

        info!(report = %summary.report(), "Upload run finished");
        summary
    }

    /// Upload one entry, stamping `upload_batch_tag` once accepted
    pub async fn send(&self, entry: PendingUploadEntry) -> ItemOutcome {
        self.propagate(entry, OperationType::Upload).await
    }

    /// Revoke one entry, stamping `revoked_batch_tag` once accepted
    pub async fn revoke(&self, entry: PendingUploadEntry) -> ItemOutcome {
        self.propagate(entry, OperationType::Revoke).await
    }

    async fn propagate(&self, entry: PendingUploadEntry, operation: OperationType) -> ItemOutcome {
        let tag = batch_tag(operation);
        let id = entry.id.clone();

        let outcome = match self.try_propagate(entry, operation, &tag).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(id = %id, batch_tag = %tag, operation = %operation, error = %e, "Propagation failed");
                Outcome::failed(&e)
            }
        };

        let record = match operation {
            OperationType::Revoke => AuditLogRecord::revoke(&self.country, &tag, outcome.report()),
            _ => AuditLogRecord::upload(&self.country, &tag, outcome.report()),
        };
        self.audit(record).await;

        ItemOutcome {
            id,
            batch_tag: tag,
            outcome,
        }
    }

    /// Sign, call the gateway, and persist the stamp only on acceptance
    async fn try_propagate(
        &self,
        mut entry: PendingUploadEntry,
        operation: OperationType,
        tag: &str,
    ) -> Result<Outcome, SyncError> {
        let signed = self.signer.sign(&entry.raw_data)?;

        let response = match operation {
            OperationType::Revoke => self.client.revoke(&signed, &self.country).await?,
            _ => self.client.upload(&signed, &self.country).await?,
        };

        let outcome = Outcome::from_status(response.status);
        if !outcome.is_accepted() {
            warn!(id = %entry.id, batch_tag = %tag, status = response.status, "Gateway did not accept entry, will retry");
            return Ok(outcome);
        }

        match operation {
            OperationType::Revoke => entry.revoked_batch_tag = Some(tag.to_string()),
            _ => entry.upload_batch_tag = Some(tag.to_string()),
        }
        self.store.save_pending(entry).await?;

        info!(batch_tag = %tag, operation = %operation, "Entry propagated");
        Ok(outcome)
    }
}
