use std::sync::Arc;

use tokio::spawn;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::adapters::{adapt_push, AdaptContext, RawPushTransaction};
use crate::models::ProviderKind;
use crate::session::{MergeOutcome, Session};

/// Counters reported when the push channel closes.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct MergeStats {
    pub received: usize,
    pub merged: usize,
    pub duplicates: usize,
    /// Events the adapter rejected or filtered out.
    pub dropped: usize
}

/// Adapts push events for one provider and merges them into the session set.
pub struct LiveMergeHandler {
    session: Arc<Session>,
    context: AdaptContext,
    provider: ProviderKind,
    stats: MergeStats
}

impl LiveMergeHandler {
    pub fn new(session: Arc<Session>, context: AdaptContext, provider: ProviderKind) -> Self {
        Self { session, context, provider, stats: MergeStats::default() }
    }

    pub fn stats(&self) -> MergeStats {
        self.stats
    }

    /// Merges a single event. Duplicates of already known settlements are discarded.
    pub async fn handle(&mut self, event: RawPushTransaction) -> Option<MergeOutcome> {
        let sequence = self.stats.received;
        self.stats.received += 1;

        let transaction = match adapt_push(event, self.provider, &self.context, sequence) {
            Ok(Some(transaction)) => transaction,
            Ok(None) => {
                self.stats.dropped += 1;
                return None;
            }
            Err(error) => {
                warn!("{error}");
                self.stats.dropped += 1;
                return None;
            }
        };

        let end_to_end_id = transaction.end_to_end_id.clone();
        let outcome = self.session.merge_live(transaction).await;

        match outcome {
            MergeOutcome::Inserted => {
                self.stats.merged += 1;
                debug!("Push event [{sequence}] with end-to-end id [{end_to_end_id}] merged");
            }
            MergeOutcome::Duplicate => {
                self.stats.duplicates += 1;
                debug!("Push event [{sequence}] with end-to-end id [{end_to_end_id}] already known, discarded");
            }
        }

        Some(outcome)
    }

    /// Drains `receiver` on a spawned task until every sender is dropped.
    pub fn spawn(mut self, mut receiver: mpsc::Receiver<RawPushTransaction>) -> JoinHandle<MergeStats> {
        spawn(async move {
            while let Some(event) = receiver.recv().await {
                self.handle(event).await;
            }

            //NOTE: The channel closing is the only shutdown signal, everything queued before it is merged
            info!("Push channel for [{}] closed: {:?}", self.provider, self.stats);

            self.stats
        })
    }
}
