//! Board ordering replay
//!
//! The remote exposes exactly one ordering primitive, move-to-top. Replaying
//! the ranked order bottom-up (last record first) leaves the list in the
//! desired top-down order without ever computing positions.

use crate::gateway::CardGateway;
use prio_common::model::UseCaseRecord;
use std::sync::Arc;

/// Outcome of one ordering replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderReport {
    /// Cards moved to the top, in replay order
    pub moved: usize,
    /// Records without a linked card, silently skipped
    pub skipped: usize,
    /// Records considered
    pub total: usize,
    /// Failure that stopped the replay, if any
    pub error: Option<String>,
}

/// Replays a local ranking onto the remote list
pub struct OrderSynchronizer {
    gateway: Arc<dyn CardGateway>,
}

impl OrderSynchronizer {
    pub fn new(gateway: Arc<dyn CardGateway>) -> Self {
        Self { gateway }
    }

    /// Apply `ordered` (desired top-down order) to the board
    ///
    /// Stops at the first failure: moves already applied are not rolled back,
    /// and a partial replay leaves the unprocessed prefix in its old order
    /// rather than interleaving a half-applied one.
    pub async fn replay(&self, ordered: &[UseCaseRecord]) -> OrderReport {
        let mut report = OrderReport {
            total: ordered.len(),
            ..OrderReport::default()
        };

        for record in ordered.iter().rev() {
            let Some(remote) = &record.remote else {
                report.skipped += 1;
                continue;
            };
            match self.gateway.move_card_to_top(&remote.card_id).await {
                Ok(()) => report.moved += 1,
                Err(e) => {
                    tracing::warn!(
                        record = %record.id,
                        card_id = %remote.card_id,
                        error = %e,
                        "Move failed; stopping ordering replay"
                    );
                    report.error = Some(e.to_string());
                    break;
                }
            }
        }

        tracing::info!(
            moved = report.moved,
            skipped = report.skipped,
            total = report.total,
            "Ordering replay complete"
        );
        report
    }
}
