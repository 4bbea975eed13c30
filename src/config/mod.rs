#[cfg(test)]
mod tests;

use chrono::FixedOffset;
use std::time::Duration;

use crate::adapters::{brasilia_offset, AdaptContext, UnknownStatusPolicy};
use crate::pagination::PaginationMode;

const DEFAULT_RECORDS_PER_PAGE: usize = 20;
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
const DEFAULT_MAX_PAGES: usize = 200;
const DEFAULT_VERIFICATION_TTL: Duration = Duration::from_secs(300);
const DEFAULT_VERIFICATION_CAPACITY: u64 = 1_024;

/// Settings of one console session.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub pagination: PaginationMode,
    pub records_per_page: usize,
    /// Quiet period before a burst of filter edits triggers a refetch.
    pub debounce: Duration,
    /// Ceiling on pages fetched by one accumulation loop.
    pub max_pages: usize,
    pub unknown_status: UnknownStatusPolicy,
    pub local_offset: FixedOffset,
    /// Only show records carrying a reconciliation id.
    pub reconciled_only: bool,
    pub verification_ttl: Duration,
    pub verification_capacity: u64
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            pagination: PaginationMode::Server,
            records_per_page: DEFAULT_RECORDS_PER_PAGE,
            debounce: DEFAULT_DEBOUNCE,
            max_pages: DEFAULT_MAX_PAGES,
            unknown_status: UnknownStatusPolicy::default(),
            local_offset: brasilia_offset(),
            reconciled_only: false,
            verification_ttl: DEFAULT_VERIFICATION_TTL,
            verification_capacity: DEFAULT_VERIFICATION_CAPACITY
        }
    }
}

impl ConsoleConfig {
    pub fn with_pagination(mut self, pagination: PaginationMode) -> Self {
        self.pagination = pagination;
        self
    }

    /// Switches to fetch-all mode for a provider that caps its pages at `server_page_cap`.
    pub fn with_fetch_all(self, server_page_cap: usize) -> Self {
        self.with_pagination(PaginationMode::FetchAll { server_page_cap: server_page_cap.max(1) })
    }

    pub fn with_records_per_page(mut self, records_per_page: usize) -> Self {
        self.records_per_page = records_per_page.max(1);
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn with_unknown_status(mut self, unknown_status: UnknownStatusPolicy) -> Self {
        self.unknown_status = unknown_status;
        self
    }

    pub fn with_local_offset(mut self, local_offset: FixedOffset) -> Self {
        self.local_offset = local_offset;
        self
    }

    pub fn with_reconciled_only(mut self, reconciled_only: bool) -> Self {
        self.reconciled_only = reconciled_only;
        self
    }

    pub fn with_verification_cache(mut self, time_to_live: Duration, capacity: u64) -> Self {
        self.verification_ttl = time_to_live;
        self.verification_capacity = capacity;
        self
    }

    pub fn adapt_context(&self) -> AdaptContext {
        AdaptContext {
            unknown_status: self.unknown_status,
            local_offset: self.local_offset,
            require_reconciliation_id: self.reconciled_only
        }
    }
}
