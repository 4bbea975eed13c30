use super::{FetchPlan, PageQuery, PageRequest, PaginationController, PaginationMode, RawPage, RemoteMeta, TransactionSource, TransportError};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::adapters::AdaptContext;
use crate::filters::{filter_and_sort, FilterSpec, SortSpec};
use crate::models::ProviderKind;

/// Serves scripted pages by 1-based index and records every query it receives.
struct ScriptedSource {
    pages: Vec<Result<RawPage, TransportError>>,
    repeat_last: bool,
    queries: Mutex<Vec<PageQuery>>
}

impl ScriptedSource {
    fn new(pages: Vec<Result<RawPage, TransportError>>) -> Self {
        Self { pages, repeat_last: false, queries: Mutex::new(Vec::new()) }
    }

    fn endless(page: RawPage) -> Self {
        Self { pages: vec![Ok(page)], repeat_last: true, queries: Mutex::new(Vec::new()) }
    }

    fn queries(&self) -> Vec<PageQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionSource for ScriptedSource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<RawPage, TransportError> {
        self.queries.lock().unwrap().push(query.clone());

        let index = if self.repeat_last { 0 } else { query.page - 1 };

        self.pages.get(index).cloned()
            .unwrap_or_else(|| Ok(RawPage::new(ProviderKind::BankingService, Vec::new())))
    }
}

fn credits(amounts_in_cents: &[i64]) -> Vec<Value> {
    amounts_in_cents.iter()
        .map(|valor| json!({ "tipo": "credito", "valor": valor, "tipoStatusTransacao": "Sucesso" }))
        .collect()
}

fn page(amounts_in_cents: &[i64]) -> RawPage {
    RawPage::new(ProviderKind::BankingService, credits(amounts_in_cents))
}

#[tokio::test]
async fn test_server_mode_trusts_reported_totals() -> Result<()> {
    let mut reported = page(&[100, 200]);
    reported.total = Some(5);
    reported.has_more = Some(true);
    let source = ScriptedSource::new(vec![Ok(page(&[1, 2])), Ok(reported)]);

    let mut controller = PaginationController::new(PaginationMode::Server, 2, 10);
    let plan = controller.plan(PageRequest::new(2, 2));
    let outcome = plan.execute(&source, &FilterSpec::default(), &AdaptContext::default(), &CancellationToken::new()).await;

    assert!(outcome.error.is_none());
    assert_eq!(source.queries()[0].offset, 2);
    assert_eq!(outcome.remote, RemoteMeta { total: Some(5), has_more: Some(true), total_pages: Some(3) });

    controller.commit(&plan, outcome.remote);
    let view = controller.window(outcome.records, PageRequest::new(2, 2));

    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.meta.current_page, 2);
    assert_eq!(view.meta.total_pages, 3);
    assert_eq!(view.meta.total_records, 5);
    assert!(view.meta.has_more);

    Ok(())
}

#[tokio::test]
async fn test_server_mode_derives_has_more_from_total_pages() -> Result<()> {
    let mut last = page(&[100]);
    last.total_pages = Some(3);
    let source = ScriptedSource::new(vec![Ok(page(&[1])), Ok(page(&[2])), Ok(last)]);

    let controller = PaginationController::new(PaginationMode::Server, 1, 10);
    let outcome = controller.plan(PageRequest::new(3, 1))
        .execute(&source, &FilterSpec::default(), &AdaptContext::default(), &CancellationToken::new()).await;

    assert_eq!(outcome.remote.has_more, Some(false));
    assert_eq!(outcome.remote.total_pages, Some(3));

    Ok(())
}

#[test]
fn test_changing_records_per_page_resets_to_first_page() {
    let mut controller = PaginationController::new(PaginationMode::Server, 20, 10);
    let first = controller.plan(PageRequest::new(3, 20));
    controller.commit(&first, RemoteMeta::default());

    assert_eq!(controller.current_page(), 3);

    let resized = controller.plan(PageRequest::new(3, 50));

    assert_eq!(resized, FetchPlan { mode: PaginationMode::Server, page: 1, limit: 50, max_pages: 10 });
    assert_eq!(controller.current_page(), 3, "planning alone must not move the page");

    controller.commit(&resized, RemoteMeta::default());

    assert_eq!(controller.current_page(), 1);
    assert_eq!(controller.records_per_page(), 50);
}

#[tokio::test]
async fn test_fetch_all_accumulates_until_short_page() -> Result<()> {
    let source = ScriptedSource::new(vec![
        Ok(page(&[100, 200, 300])),
        Ok(page(&[400, 500, 600])),
        Ok(page(&[700])),
    ]);

    let controller = PaginationController::new(PaginationMode::FetchAll { server_page_cap: 3 }, 2, 50);
    let outcome = controller.plan(PageRequest::new(1, 2))
        .execute(&source, &FilterSpec::default(), &AdaptContext::default(), &CancellationToken::new()).await;

    let offsets: Vec<usize> = source.queries().iter().map(|query| query.offset).collect();

    assert!(outcome.error.is_none());
    assert_eq!(outcome.records.len(), 7);
    assert_eq!(outcome.pages_fetched, 3);
    assert_eq!(offsets, vec![0, 3, 6]);
    assert_eq!(outcome.remote.has_more, Some(false));

    let ids: Vec<i64> = outcome.records.iter().map(|transaction| transaction.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);

    Ok(())
}

#[tokio::test]
async fn test_local_pages_cover_the_filtered_set_exactly() -> Result<()> {
    let source = ScriptedSource::new(vec![
        Ok(page(&[500, 1500, 2500])),
        Ok(page(&[3500, 4500, 5500])),
        Ok(page(&[6500, 7500])),
    ]);
    let filter = FilterSpec { min_amount: Some(20.into()), ..FilterSpec::default() };
    let context = AdaptContext::default();

    let mut controller = PaginationController::new(PaginationMode::FetchAll { server_page_cap: 3 }, 2, 50);
    let plan = controller.plan(PageRequest::new(1, 2));
    let outcome = plan.execute(&source, &filter, &context, &CancellationToken::new()).await;
    controller.commit(&plan, outcome.remote);

    let filtered = filter_and_sort(&outcome.records, &filter, &SortSpec::default(), &context.local_offset);
    assert_eq!(filtered.len(), 6);

    let first = controller.window(filtered.clone(), PageRequest::new(1, 2));
    assert_eq!(first.meta.total_pages, 3);
    assert_eq!(first.meta.total_records, 6);

    let mut seen = 0;
    for page_number in 1..=first.meta.total_pages {
        let view = controller.window(filtered.clone(), PageRequest::new(page_number, 2));

        assert_eq!(view.meta.current_page, page_number);
        assert_eq!(view.meta.has_more, page_number < first.meta.total_pages);
        seen += view.rows.len();
    }

    assert_eq!(seen, filtered.len());

    let clamped = controller.window(filtered.clone(), PageRequest::new(99, 2));
    assert_eq!(clamped.meta.current_page, 3);
    assert_eq!(controller.current_page(), 3);

    let resized = controller.window(filtered, PageRequest::new(3, 4));
    assert_eq!(resized.meta.current_page, 1);
    assert_eq!(resized.rows.len(), 4);

    Ok(())
}

#[tokio::test]
async fn test_fetch_all_failure_keeps_partial_result_with_error() -> Result<()> {
    let failure = TransportError::Status { status: 502, message: "bad gateway".to_string() };
    let source = ScriptedSource::new(vec![Ok(page(&[100, 200])), Err(failure.clone()), Ok(page(&[300]))]);

    let controller = PaginationController::new(PaginationMode::FetchAll { server_page_cap: 2 }, 10, 50);
    let outcome = controller.plan(PageRequest::default())
        .execute(&source, &FilterSpec::default(), &AdaptContext::default(), &CancellationToken::new()).await;

    assert_eq!(outcome.error, Some(failure));
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(source.queries().len(), 2, "no automatic retry after a failure");

    Ok(())
}

#[tokio::test]
async fn test_fetch_all_stops_at_page_ceiling() -> Result<()> {
    let source = ScriptedSource::endless(page(&[100, 200]));

    let controller = PaginationController::new(PaginationMode::FetchAll { server_page_cap: 2 }, 10, 4);
    let outcome = controller.plan(PageRequest::default())
        .execute(&source, &FilterSpec::default(), &AdaptContext::default(), &CancellationToken::new()).await;

    assert!(outcome.error.is_none());
    assert_eq!(source.queries().len(), 4);
    assert_eq!(outcome.records.len(), 8);
    assert_eq!(outcome.remote.has_more, Some(true));

    Ok(())
}

#[tokio::test]
async fn test_cancelled_session_issues_no_requests() -> Result<()> {
    let source = ScriptedSource::new(vec![Ok(page(&[100]))]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let controller = PaginationController::new(PaginationMode::FetchAll { server_page_cap: 2 }, 10, 4);
    let outcome = controller.plan(PageRequest::default())
        .execute(&source, &FilterSpec::default(), &AdaptContext::default(), &cancel).await;

    assert_eq!(outcome.error, Some(TransportError::Cancelled));
    assert!(source.queries().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_remote_date_range_is_forwarded() -> Result<()> {
    let source = ScriptedSource::new(vec![Ok(page(&[]))]);
    let filter = FilterSpec {
        from: chrono::NaiveDate::from_ymd_opt(2024, 3, 1),
        to: chrono::NaiveDate::from_ymd_opt(2024, 3, 31),
        ..FilterSpec::default()
    };

    let controller = PaginationController::new(PaginationMode::Server, 10, 4);
    controller.plan(PageRequest::new(1, 10))
        .execute(&source, &filter, &AdaptContext::default(), &CancellationToken::new()).await;

    let query = &source.queries()[0];
    assert_eq!(query.from, filter.from);
    assert_eq!(query.to, filter.to);
    assert_eq!(query.limit, 10);

    Ok(())
}
