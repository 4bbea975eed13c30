mod transaction_set;

use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::models::CanonicalTransaction;

pub use transaction_set::{MergeOutcome, TransactionSet};

/// Handle for one fetch session. Results are only applied while it is the latest one.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub generation: u64,
    /// Set version observed when the fetch started.
    pub since_version: u64,
    pub token: CancellationToken
}

#[derive(Debug)]
struct FetchState {
    generation: u64,
    token: CancellationToken
}

impl FetchState {
    fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation && !ticket.token.is_cancelled()
    }
}

/// The single owner of the canonical transaction set for one console session.
///
/// Fetches and live merges never overwrite each other blindly: a fetch result is dropped
/// when a newer fetch has started (or the fetch was cancelled), and live records merged
/// during a fetch survive that fetch's snapshot.
#[derive(Debug)]
pub struct Session {
    set: RwLock<TransactionSet>,
    fetch: Mutex<FetchState>
}

impl Session {
    pub fn new() -> Self {
        Self {
            set: RwLock::new(TransactionSet::new()),
            fetch: Mutex::new(FetchState { generation: 0, token: CancellationToken::new() })
        }
    }

    /// Starts a fetch session, cancelling whichever one was running.
    pub async fn begin_fetch(&self) -> FetchTicket {
        let mut fetch = self.fetch.lock().await;
        fetch.token.cancel();
        fetch.generation += 1;
        fetch.token = CancellationToken::new();

        let mut set = self.set.write().await;
        let since_version = set.version();
        set.track_live_since(since_version);

        debug!("Fetch generation [{}] started at set version [{since_version}]", fetch.generation);

        FetchTicket { generation: fetch.generation, since_version, token: fetch.token.clone() }
    }

    /// Cancels the running fetch so its result, if it still arrives, is discarded.
    pub async fn cancel_fetch(&self) {
        let fetch = self.fetch.lock().await;
        fetch.token.cancel();
        self.set.write().await.stop_tracking_live();
    }

    /// Ends a fetch that produced no snapshot. Returns false when `ticket` was already stale,
    /// in which case its outcome must not be reported.
    pub async fn finish_fetch(&self, ticket: &FetchTicket) -> bool {
        let fetch = self.fetch.lock().await;

        if !fetch.is_current(ticket) {
            return false;
        }

        self.set.write().await.stop_tracking_live();

        true
    }

    /// Applies a snapshot if `ticket` is still current. Returns whether it was applied.
    pub async fn apply_snapshot(&self, ticket: &FetchTicket, snapshot: Vec<CanonicalTransaction>) -> bool {
        let fetch = self.fetch.lock().await;

        if !fetch.is_current(ticket) {
            info!("Discarding stale result of fetch generation [{}] ([{}] records)", ticket.generation, snapshot.len());
            return false;
        }

        let mut set = self.set.write().await;
        let duplicates = set.replace_with_snapshot(snapshot, ticket.since_version);

        if duplicates > 0 {
            debug!("Snapshot of generation [{}] carried [{duplicates}] duplicate records", ticket.generation);
        }

        true
    }

    pub async fn merge_live(&self, transaction: CanonicalTransaction) -> MergeOutcome {
        self.set.write().await.merge_live(transaction)
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, TransactionSet> {
        self.set.read().await
    }

    pub async fn records(&self) -> Vec<CanonicalTransaction> {
        self.set.read().await.records().to_vec()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
