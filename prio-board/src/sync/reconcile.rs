//! Push reconciliation
//!
//! Takes the locally selected records and makes the remote board agree with
//! them. Records without a linked card are created in the destination list;
//! linked records are updated in place, falling back to copy-into-list when
//! the update is refused and a destination was given. Each record succeeds or
//! fails on its own.

use crate::gateway::{CardGateway, CreateCard, GatewayError, UpdateCard};
use crate::store::RecordStore;
use prio_common::codec;
use prio_common::model::{RemoteCard, ScoringScheme, UseCaseRecord};
use prio_common::{Error, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Outcome counts for one push
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records that got a brand-new card
    pub created: usize,
    /// Records whose existing card was updated in place
    pub updated: usize,
    /// Records re-pointed at a copy after the in-place update was refused
    pub copied: usize,
    /// Records left untouched remotely
    pub failed: usize,
    /// First failure message, for the status line
    pub first_error: Option<String>,
}

impl SyncReport {
    fn record_failure(&mut self, error: &GatewayError) {
        self.failed += 1;
        if self.first_error.is_none() {
            self.first_error = Some(error.to_string());
        }
    }
}

/// Pushes selected records onto the remote board
pub struct RemoteSyncReconciler {
    gateway: Arc<dyn CardGateway>,
    store: Arc<RwLock<RecordStore>>,
}

impl RemoteSyncReconciler {
    pub fn new(gateway: Arc<dyn CardGateway>, store: Arc<RwLock<RecordStore>>) -> Self {
        Self { gateway, store }
    }

    /// Push every selected record
    ///
    /// Validation happens before the first remote call: an empty selection is
    /// an error, and so is a selection that needs card creation when no
    /// destination list was given. After that, records are processed
    /// sequentially in display order and one failure never stops the rest.
    pub async fn push_selected(&self, dest_list: Option<&str>) -> Result<SyncReport> {
        let (selected, scheme) = {
            let store = self.store.read().await;
            (store.selected(), store.scheme().clone())
        };

        if selected.is_empty() {
            return Err(Error::Validation("no records selected".to_string()));
        }
        if dest_list.is_none() && selected.iter().any(|r| r.remote.is_none()) {
            return Err(Error::Validation(
                "selection includes unlinked records but no destination list is set".to_string(),
            ));
        }

        let mut report = SyncReport::default();
        for record in &selected {
            match &record.remote {
                None => {
                    // Checked above.
                    let list_id = match dest_list {
                        Some(list) => list,
                        None => continue,
                    };
                    self.create(record, &scheme, list_id, &mut report).await;
                }
                Some(remote) => {
                    let remote = remote.clone();
                    let desc = codec::encode(
                        &record.notes,
                        &record.factors,
                        &scheme,
                        remote.ref_token(),
                    );
                    let update = UpdateCard {
                        name: Some(record.name.clone()),
                        desc: Some(desc.clone()),
                        list_id: dest_list.map(str::to_string),
                    };
                    match self.gateway.update_card(&remote.card_id, update).await {
                        Ok(_) => report.updated += 1,
                        Err(e) => match dest_list {
                            // Card became unreachable (archived, permissions,
                            // moved boards): copy it into the target list and
                            // repoint the record.
                            Some(list_id) => {
                                self.copy_fallback(record, &scheme, &remote.card_id, list_id, &desc, e, &mut report)
                                    .await
                            }
                            None => {
                                tracing::warn!(
                                    record = %record.id,
                                    card_id = %remote.card_id,
                                    error = %e,
                                    "Card update failed"
                                );
                                report.record_failure(&e);
                            }
                        },
                    }
                }
            }
        }

        tracing::info!(
            created = report.created,
            updated = report.updated,
            copied = report.copied,
            failed = report.failed,
            "Push complete"
        );
        Ok(report)
    }

    async fn create(
        &self,
        record: &UseCaseRecord,
        scheme: &ScoringScheme,
        list_id: &str,
        report: &mut SyncReport,
    ) {
        // The card starts out tagged with a temporary local token; once the
        // remote assigns a short link the description is rewritten with it.
        let temp_token = format!("uc-{}", record.id.short());
        let desc = codec::encode(&record.notes, &record.factors, scheme, &temp_token);
        let request = CreateCard {
            list_id: list_id.to_string(),
            name: record.name.clone(),
            desc,
            source_card_id: None,
        };
        match self.gateway.create_card(request).await {
            Ok(card) => {
                report.created += 1;
                self.finalize_link(record, scheme, card).await;
            }
            Err(e) => {
                tracing::warn!(record = %record.id, error = %e, "Card creation failed");
                report.record_failure(&e);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn copy_fallback(
        &self,
        record: &UseCaseRecord,
        scheme: &ScoringScheme,
        old_card_id: &str,
        list_id: &str,
        desc: &str,
        update_error: GatewayError,
        report: &mut SyncReport,
    ) {
        tracing::warn!(
            record = %record.id,
            card_id = %old_card_id,
            error = %update_error,
            "Card update failed; copying into destination list"
        );
        let request = CreateCard {
            list_id: list_id.to_string(),
            name: record.name.clone(),
            desc: desc.to_string(),
            source_card_id: Some(old_card_id.to_string()),
        };
        match self.gateway.create_card(request).await {
            Ok(card) => {
                report.copied += 1;
                self.finalize_link(record, scheme, card).await;
            }
            Err(e) => {
                tracing::warn!(record = %record.id, error = %e, "Copy fallback failed");
                report.record_failure(&e);
            }
        }
    }

    /// Attach the new card to the record and, best effort, rewrite its
    /// description with the remote-assigned reference token. A rewrite
    /// failure leaves the temporary token in place; the next push fixes it.
    async fn finalize_link(&self, record: &UseCaseRecord, scheme: &ScoringScheme, card: RemoteCard) {
        let remote = card.to_ref();
        if card.short_link.is_some() {
            let desc = codec::encode(&record.notes, &record.factors, scheme, remote.ref_token());
            let rewrite = UpdateCard {
                desc: Some(desc),
                ..UpdateCard::default()
            };
            if let Err(e) = self.gateway.update_card(&card.id, rewrite).await {
                tracing::warn!(card_id = %card.id, error = %e, "Reference token rewrite failed");
            }
        }
        if let Err(e) = self.store.write().await.attach_remote(record.id, remote) {
            tracing::warn!(record = %record.id, error = %e, "Remote link refused");
        }
    }
}
