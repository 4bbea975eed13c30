use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::adapters::{RawPushTransaction, UnknownStatusPolicy};
use crate::compensation::{CompensationGateway, CompensationRequest, Verification, VerificationLookup};
use crate::config::ConsoleConfig;
use crate::filters::{FilterSpec, SortSpec};
use crate::models::ProviderKind;
use crate::pagination::{PageQuery, PageRequest, PaginationMode, RawPage, TransactionSource, TransportError};

/// A recorded console session: provider pages, push events, and the view to render.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplayFile {
    pub pagination: Option<PaginationMode>,
    pub records_per_page: Option<usize>,
    pub max_pages: Option<usize>,
    pub unknown_status: Option<UnknownStatusPolicy>,
    pub reconciled_only: bool,
    pub pages: Vec<RawPage>,
    /// Rail the push events belong to; defaults to the rail of the first page.
    pub push_provider: Option<ProviderKind>,
    pub push: Vec<RawPushTransaction>,
    pub filter: FilterSpec,
    pub sort: SortSpec,
    pub page: Option<PageRequest>
}

impl ReplayFile {
    /// Applies the overrides of this file on top of `config`.
    pub fn configure(&self, mut config: ConsoleConfig) -> ConsoleConfig {
        if let Some(pagination) = self.pagination {
            config = config.with_pagination(pagination);
        }

        if let Some(records_per_page) = self.records_per_page {
            config = config.with_records_per_page(records_per_page);
        }

        if let Some(max_pages) = self.max_pages {
            config = config.with_max_pages(max_pages);
        }

        if let Some(unknown_status) = self.unknown_status {
            config = config.with_unknown_status(unknown_status);
        }

        config.with_reconciled_only(self.reconciled_only)
    }

    pub fn page_request(&self, config: &ConsoleConfig) -> PageRequest {
        self.page.unwrap_or_else(|| PageRequest::new(1, config.records_per_page))
    }

    pub fn push_provider(&self) -> ProviderKind {
        self.push_provider
            .or_else(|| self.pages.first().map(|page| page.provider))
            .unwrap_or(ProviderKind::CryptoExchange)
    }

    pub fn source(&self) -> ReplaySource {
        ReplaySource { pages: self.pages.clone() }
    }
}

/// Serves recorded pages by their 1-based index; past the last one it serves empty pages.
pub struct ReplaySource {
    pages: Vec<RawPage>
}

#[async_trait]
impl TransactionSource for ReplaySource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<RawPage, TransportError> {
        debug!("Replaying page [{}] (limit [{}], offset [{}])", query.page, query.limit, query.offset);

        let provider = self.pages.first()
            .map(|page| page.provider)
            .unwrap_or(ProviderKind::CryptoExchange);

        let page = query.page.checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .cloned()
            .unwrap_or_else(|| RawPage::new(provider, Vec::new()));

        Ok(page)
    }
}

/// Stand-in for the verification and compensation services when replaying offline.
pub struct OfflineCollaborators;

#[async_trait]
impl VerificationLookup for OfflineCollaborators {
    async fn lookup(&self, _end_to_end_id: &str) -> Result<Verification, TransportError> {
        Err(TransportError::Unavailable("verification is not available offline".to_string()))
    }
}

#[async_trait]
impl CompensationGateway for OfflineCollaborators {
    async fn submit(&self, _request: &CompensationRequest) -> Result<(), TransportError> {
        Err(TransportError::Unavailable("compensation is not available offline".to_string()))
    }
}
