mod debounce;
#[cfg(test)]
mod tests;

use std::io::Write;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::adapters::{AdaptContext, RawPushTransaction};
use crate::compensation::{
    CompensationDetails, CompensationError, CompensationGateway, CompensationKey, CompensationState, CompensationStore,
    CompensationTracker, CompensationWorkflow, DialogContext, SessionCompensationStore, VerificationLookup
};
use crate::config::ConsoleConfig;
use crate::export::{write_csv, ExportError};
use crate::filters::{filter_and_sort, FilterSpec, SortSpec};
use crate::metrics::{aggregate, Metrics};
use crate::models::{CanonicalTransaction, ProviderKind};
use crate::pagination::{PageRequest, PageView, PaginationController, TransactionSource, TransportError};
use crate::session::Session;
use crate::stream::{LiveMergeHandler, MergeStats};

pub use debounce::FilterDebouncer;

/// What one call to [`Console::refresh`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    /// Records adapted from the provider, including a partial result that was not applied.
    pub fetched: usize,
    pub pages_fetched: usize,
    /// Whether the session set was replaced.
    pub applied: bool,
    pub error: Option<TransportError>
}

/// The operations console of one session: fetches, live merges, filtering, paging,
/// metrics, export, and the compensation workflow, all over a single transaction set.
pub struct Console {
    config: ConsoleConfig,
    context: AdaptContext,
    session: Arc<Session>,
    pagination: Mutex<PaginationController>,
    compensation: CompensationWorkflow
}

impl Console {
    pub fn new(config: ConsoleConfig, verification: Arc<dyn VerificationLookup>, gateway: Arc<dyn CompensationGateway>) -> Self {
        Self::with_store(config, Arc::new(SessionCompensationStore::new()), verification, gateway)
    }

    /// Like [`Console::new`] with a caller-supplied compensation store.
    pub fn with_store(config: ConsoleConfig, store: Arc<dyn CompensationStore>, verification: Arc<dyn VerificationLookup>, gateway: Arc<dyn CompensationGateway>) -> Self {
        let compensation = CompensationWorkflow::new(CompensationTracker::new(store), verification, gateway)
            .with_verification_cache(config.verification_ttl, config.verification_capacity);
        let pagination = PaginationController::new(config.pagination, config.records_per_page, config.max_pages);

        Self {
            context: config.adapt_context(),
            session: Arc::new(Session::new()),
            pagination: Mutex::new(pagination),
            compensation,
            config
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn session(&self) -> Arc<Session> {
        self.session.clone()
    }

    /// Fetches from `source` and replaces the session set with the result.
    ///
    /// Any running fetch is cancelled first. A failed fetch leaves the set and the page
    /// position untouched and is reported on the next [`PageView`].
    pub async fn refresh(&self, source: &dyn TransactionSource, filter: &FilterSpec, request: PageRequest) -> RefreshReport {
        let ticket = self.session.begin_fetch().await;
        let plan = self.pagination.lock().await.plan(request);

        debug!("Refreshing page [{}] with [{}] records per page", plan.page, plan.limit);

        let outcome = plan.execute(source, filter, &self.context, &ticket.token).await;
        let mut report = RefreshReport {
            fetched: outcome.records.len(),
            pages_fetched: outcome.pages_fetched,
            applied: false,
            error: outcome.error.clone()
        };

        let mut pagination = self.pagination.lock().await;

        match outcome.error {
            Some(TransportError::Cancelled) => {
                debug!("Fetch generation [{}] was cancelled", ticket.generation);
            }
            Some(error) => {
                if self.session.finish_fetch(&ticket).await {
                    warn!("Refresh failed after [{}] records, keeping the previous set: {error}", report.fetched);
                    pagination.fail(error);
                } else {
                    debug!("Fetch generation [{}] failed after it was superseded: {error}", ticket.generation);
                }
            }
            None => {
                report.applied = self.session.apply_snapshot(&ticket, outcome.records).await;

                if report.applied {
                    pagination.commit(&plan, outcome.remote);
                    info!("Session refreshed with [{}] records from [{}] pages", report.fetched, report.pages_fetched);
                }
            }
        }

        report
    }

    /// Cancels the running fetch, if any; its result will be discarded.
    pub async fn cancel_refresh(&self) {
        self.session.cancel_fetch().await;
    }

    /// The visible page of the filtered and sorted set.
    ///
    /// In server mode the set already is the provider's page, so moving to another page
    /// takes a [`Console::refresh`].
    pub async fn get_filtered_sorted_page(&self, filter: &FilterSpec, sort: &SortSpec, request: PageRequest) -> PageView {
        let mut pagination = self.pagination.lock().await;
        let filtered = self.filtered(filter, sort).await;

        pagination.window(filtered, request)
    }

    /// Metrics over the whole filtered set, not just the visible page.
    pub async fn get_metrics(&self, filter: &FilterSpec) -> Metrics {
        let set = self.session.read().await;
        let local = &self.config.local_offset;

        aggregate(set.records().iter().filter(|transaction| filter.matches(transaction, local)))
    }

    pub fn get_compensation_status(&self, key: &CompensationKey) -> CompensationState {
        self.compensation.tracker().status(key)
    }

    pub async fn open_compensation(&self, transaction: &CanonicalTransaction) -> Result<DialogContext, CompensationError> {
        self.compensation.open(transaction).await
    }

    pub fn close_compensation(&self, key: &CompensationKey) -> CompensationState {
        self.compensation.close(key)
    }

    pub async fn submit_compensation(&self, transaction: &CanonicalTransaction, details: CompensationDetails) -> Result<CompensationState, CompensationError> {
        self.compensation.submit(transaction, details).await
    }

    pub fn live_merge_handler(&self, provider: ProviderKind) -> LiveMergeHandler {
        LiveMergeHandler::new(self.session.clone(), self.context.clone(), provider)
    }

    /// A debouncer for filter edits using the configured quiet period. Each spec it emits
    /// is the one to pass to the next [`Console::refresh`].
    pub fn filter_debouncer(&self) -> (FilterDebouncer, mpsc::Receiver<FilterSpec>) {
        FilterDebouncer::spawn(self.config.debounce)
    }

    /// Merges push events from `receiver` into the session until the channel closes.
    pub fn spawn_live_merge(&self, provider: ProviderKind, receiver: mpsc::Receiver<RawPushTransaction>) -> JoinHandle<MergeStats> {
        self.live_merge_handler(provider).spawn(receiver)
    }

    /// Writes the filtered and sorted set as CSV. Returns the number of rows written.
    pub async fn export_csv<W: Write>(&self, writer: W, filter: &FilterSpec, sort: &SortSpec) -> Result<usize, ExportError> {
        let filtered = self.filtered(filter, sort).await;

        write_csv(&filtered, writer)
    }

    async fn filtered(&self, filter: &FilterSpec, sort: &SortSpec) -> Vec<CanonicalTransaction> {
        let set = self.session.read().await;

        filter_and_sort(set.records(), filter, sort, &self.config.local_offset)
    }
}
