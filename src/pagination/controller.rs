use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::adapters::{adapt_batch, AdaptContext};
use crate::filters::FilterSpec;
use crate::models::CanonicalTransaction;
use crate::pagination::{PageQuery, PageRequest, PageView, PaginationMeta, RawPage, TransactionSource, TransportError};

/// How a provider's pages map onto the pages the console shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum PaginationMode {
    /// The provider windows the data and its `total`/`hasMore` are trusted.
    Server,
    /// The provider caps its page size far below the console's; everything is fetched
    /// until a short page, then filtered and windowed locally.
    FetchAll {
        #[serde(rename = "serverPageCap")]
        server_page_cap: usize
    }
}

/// Pagination metadata reported (or derived) from the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteMeta {
    pub total: Option<usize>,
    pub has_more: Option<bool>,
    pub total_pages: Option<usize>
}

#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub records: Vec<CanonicalTransaction>,
    pub remote: RemoteMeta,
    pub pages_fetched: usize,
    /// Set when a page failed; `records` then holds whatever was accumulated before it.
    pub error: Option<TransportError>
}

/// A fetch prepared by [`PaginationController::plan`]. Executing it does not touch the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPlan {
    pub mode: PaginationMode,
    pub page: usize,
    pub limit: usize,
    pub max_pages: usize
}

impl FetchPlan {
    pub async fn execute(&self, source: &dyn TransactionSource, filter: &FilterSpec, context: &AdaptContext, cancel: &CancellationToken) -> FetchOutcome {
        match self.mode {
            PaginationMode::Server => self.fetch_window(source, filter, context, cancel).await,
            PaginationMode::FetchAll { server_page_cap } => {
                self.fetch_all(server_page_cap.max(1), source, filter, context, cancel).await
            }
        }
    }

    async fn fetch_window(&self, source: &dyn TransactionSource, filter: &FilterSpec, context: &AdaptContext, cancel: &CancellationToken) -> FetchOutcome {
        let offset = self.page.saturating_sub(1) * self.limit;
        let query = PageQuery { from: filter.from, to: filter.to, page: self.page, limit: self.limit, offset };

        let raw = match fetch_cancellable(source, &query, cancel).await {
            Ok(raw) => raw,
            Err(error) => {
                warn!("Fetching page [{}] failed: {error}", self.page);
                return FetchOutcome { error: Some(error), ..FetchOutcome::default() };
            }
        };

        let raw_count = raw.records.len();
        let total_pages = raw.total_pages.or_else(|| raw.total.map(|total| total.div_ceil(self.limit)));
        let has_more = raw.has_more
            .or_else(|| total_pages.map(|pages| self.page < pages))
            .unwrap_or(raw_count >= self.limit);

        FetchOutcome {
            records: adapt_batch(raw.provider, raw.records, context, offset),
            remote: RemoteMeta { total: raw.total, has_more: Some(has_more), total_pages },
            pages_fetched: 1,
            error: None
        }
    }

    async fn fetch_all(&self, page_cap: usize, source: &dyn TransactionSource, filter: &FilterSpec, context: &AdaptContext, cancel: &CancellationToken) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();
        let mut raw_seen = 0;
        let mut exhausted = false;

        for page in 1..=self.max_pages {
            let query = PageQuery { from: filter.from, to: filter.to, page, limit: page_cap, offset: raw_seen };

            let raw = match fetch_cancellable(source, &query, cancel).await {
                Ok(raw) => raw,
                Err(error) => {
                    warn!("Accumulation stopped at page [{page}] with [{}] records: {error}", outcome.records.len());
                    outcome.error = Some(error);
                    return outcome;
                }
            };

            let raw_count = raw.records.len();
            outcome.records.extend(adapt_batch(raw.provider, raw.records, context, raw_seen));
            outcome.pages_fetched = page;
            raw_seen += raw_count;

            debug!("Accumulated page [{page}] with [{raw_count}] raw records");

            if raw_count < page_cap {
                exhausted = true;
                break;
            }
        }

        if !exhausted {
            warn!("Stopped accumulating after the [{}] page ceiling without a short page", self.max_pages);
        }

        outcome.remote = RemoteMeta {
            total: Some(raw_seen),
            has_more: Some(!exhausted),
            total_pages: Some(outcome.pages_fetched)
        };

        outcome
    }
}

async fn fetch_cancellable(source: &dyn TransactionSource, query: &PageQuery, cancel: &CancellationToken) -> Result<RawPage, TransportError> {
    if cancel.is_cancelled() {
        return Err(TransportError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TransportError::Cancelled),
        result = source.fetch_page(query) => result
    }
}

/// Presents "page N of M" over either pagination regime.
#[derive(Debug)]
pub struct PaginationController {
    mode: PaginationMode,
    records_per_page: usize,
    max_pages: usize,
    current_page: usize,
    remote: RemoteMeta,
    last_error: Option<TransportError>
}

impl PaginationController {
    pub fn new(mode: PaginationMode, records_per_page: usize, max_pages: usize) -> Self {
        Self {
            mode,
            records_per_page: records_per_page.max(1),
            max_pages: max_pages.max(1),
            current_page: 1,
            remote: RemoteMeta::default(),
            last_error: None
        }
    }

    pub fn mode(&self) -> PaginationMode {
        self.mode
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn records_per_page(&self) -> usize {
        self.records_per_page
    }

    pub fn last_error(&self) -> Option<&TransportError> {
        self.last_error.as_ref()
    }

    /// Changes the page size, resetting to the first page when it differs. Returns whether it reset.
    pub fn set_records_per_page(&mut self, records_per_page: usize) -> bool {
        let records_per_page = records_per_page.max(1);

        if records_per_page == self.records_per_page {
            return false;
        }

        self.records_per_page = records_per_page;
        self.current_page = 1;

        true
    }

    /// Prepares a fetch without changing any state; a new page size starts from the first page.
    pub fn plan(&self, request: PageRequest) -> FetchPlan {
        let limit = request.records_per_page.max(1);
        let page = if limit != self.records_per_page { 1 } else { request.page.max(1) };

        FetchPlan { mode: self.mode, page, limit, max_pages: self.max_pages }
    }

    /// Records a fetch whose records were applied. Page position and page size change together here.
    pub fn commit(&mut self, plan: &FetchPlan, remote: RemoteMeta) {
        if plan.mode == PaginationMode::Server {
            self.records_per_page = plan.limit;
            self.current_page = plan.page;
        }

        self.remote = remote;
        self.last_error = None;
    }

    /// Records a failed fetch. The previous page position and metadata stay in place.
    pub fn fail(&mut self, error: TransportError) {
        self.last_error = Some(error);
    }

    /// Builds the visible page from the filtered and sorted set.
    pub fn window(&mut self, filtered: Vec<CanonicalTransaction>, request: PageRequest) -> PageView {
        match self.mode {
            PaginationMode::Server => self.server_window(filtered),
            PaginationMode::FetchAll { .. } => self.local_window(filtered, request)
        }
    }

    fn server_window(&self, rows: Vec<CanonicalTransaction>) -> PageView {
        let total_records = self.remote.total
            .unwrap_or(self.current_page.saturating_sub(1) * self.records_per_page + rows.len());
        let total_pages = self.remote.total_pages
            .unwrap_or_else(|| total_records.div_ceil(self.records_per_page))
            .max(self.current_page);

        PageView {
            rows,
            meta: PaginationMeta {
                current_page: self.current_page,
                total_pages,
                total_records,
                records_per_page: self.records_per_page,
                has_more: self.remote.has_more.unwrap_or(self.current_page < total_pages)
            },
            error: self.last_error.clone()
        }
    }

    fn local_window(&mut self, filtered: Vec<CanonicalTransaction>, request: PageRequest) -> PageView {
        let requested = if self.set_records_per_page(request.records_per_page) { 1 } else { request.page.max(1) };

        let total_records = filtered.len();
        let total_pages = total_records.div_ceil(self.records_per_page).max(1);
        let page = requested.min(total_pages);

        let rows = filtered.into_iter()
            .skip((page - 1) * self.records_per_page)
            .take(self.records_per_page)
            .collect();

        self.current_page = page;

        PageView {
            rows,
            meta: PaginationMeta {
                current_page: page,
                total_pages,
                total_records,
                records_per_page: self.records_per_page,
                has_more: page < total_pages
            },
            error: self.last_error.clone()
        }
    }
}
