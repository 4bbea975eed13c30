mod controller;
mod errors;
#[cfg(test)]
mod tests;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{CanonicalTransaction, ProviderKind};

pub use controller::{FetchOutcome, FetchPlan, PaginationController, PaginationMode, RemoteMeta};
pub use errors::TransportError;

/// Parameters handed to a provider fetch. Provider clients translate these into their own
/// names (`startDate`/`endDate`, `dataInicio`/`dataFim`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// 1-based page index.
    pub page: usize,
    pub limit: usize,
    pub offset: usize
}

/// One page as returned by a provider, before adaptation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPage {
    pub provider: ProviderKind,
    #[serde(default)]
    pub records: Vec<Value>,
    #[serde(default)]
    pub total: Option<usize>,
    #[serde(default)]
    pub has_more: Option<bool>,
    #[serde(default)]
    pub total_pages: Option<usize>
}

impl RawPage {
    pub fn new(provider: ProviderKind, records: Vec<Value>) -> Self {
        Self { provider, records, total: None, has_more: None, total_pages: None }
    }
}

#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn fetch_page(&self, query: &PageQuery) -> Result<RawPage, TransportError>;
}

/// The page the presentation layer asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageRequest {
    /// 1-based page index.
    pub page: usize,
    pub records_per_page: usize
}

impl PageRequest {
    pub fn new(page: usize, records_per_page: usize) -> Self {
        Self { page: page.max(1), records_per_page: records_per_page.max(1) }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 20)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_records: usize,
    pub records_per_page: usize,
    pub has_more: bool
}

/// Rows and pagination metadata produced together so they can never disagree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageView {
    pub rows: Vec<CanonicalTransaction>,
    pub meta: PaginationMeta,
    /// Last fetch failure; the rows are then the last-known-good set.
    pub error: Option<TransportError>
}
