use super::{Console, FilterDebouncer};

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;

use crate::adapters::RawPushTransaction;
use crate::compensation::{
    CompensationDetails, CompensationGateway, CompensationKey, CompensationRequest, CompensationState, Verification, VerificationLookup
};
use crate::config::ConsoleConfig;
use crate::filters::{FilterSpec, SortKey, SortOrder, SortSpec};
use crate::models::{ProviderKind, TransactionType};
use crate::pagination::{PageQuery, PageRequest, RawPage, TransactionSource, TransportError};

struct PagedSource {
    pages: Vec<Result<RawPage, TransportError>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>
}

impl PagedSource {
    fn new(pages: Vec<Result<RawPage, TransportError>>) -> Arc<Self> {
        Arc::new(Self { pages, calls: AtomicUsize::new(0), gate: None })
    }

    fn gated(pages: Vec<Result<RawPage, TransportError>>, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self { pages, calls: AtomicUsize::new(0), gate: Some(gate) })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionSource for PagedSource {
    async fn fetch_page(&self, query: &PageQuery) -> Result<RawPage, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.pages.get(query.page - 1).cloned()
            .unwrap_or_else(|| Ok(RawPage::new(ProviderKind::CryptoExchange, Vec::new())))
    }
}

struct Offline;

#[async_trait]
impl VerificationLookup for Offline {
    async fn lookup(&self, _end_to_end_id: &str) -> Result<Verification, TransportError> {
        Err(TransportError::Unavailable("offline".to_string()))
    }
}

#[async_trait]
impl CompensationGateway for Offline {
    async fn submit(&self, _request: &CompensationRequest) -> Result<(), TransportError> {
        Ok(())
    }
}

fn create_console(config: ConsoleConfig) -> Console {
    Console::new(config, Arc::new(Offline), Arc::new(Offline))
}

fn record(id: i64, kind: &str, amount: &str, day: u32) -> Value {
    json!({
        "id": id,
        "type": kind,
        "amount": amount,
        "status": "CONFIRMED",
        "transactionId": format!("tx-{id}"),
        "endToEndId": format!("E2E-{id}"),
        "payerName": format!("Payer {id}"),
        "payeeName": format!("Payee {id}"),
        "createdAt": format!("2024-03-{day:02}T15:00:00Z")
    })
}

fn crypto_page(records: Vec<Value>) -> RawPage {
    RawPage::new(ProviderKind::CryptoExchange, records)
}

fn mixed_page() -> RawPage {
    crypto_page(vec![
        record(1, "DEPOSIT", "5.00", 1),
        record(2, "DEPOSIT", "10.00", 2),
        record(3, "WITHDRAWAL", "30.00", 3),
        record(4, "DEPOSIT", "50.00", 4),
        record(5, "DEPOSIT", "75.25", 5),
    ])
}

fn ids(rows: &[crate::models::CanonicalTransaction]) -> Vec<i64> {
    rows.iter().map(|transaction| transaction.id).collect()
}

fn push_event(transaction_id: &str, end_to_end_id: &str, amount: &str) -> RawPushTransaction {
    RawPushTransaction {
        transaction_type: Some("DEPOSIT".to_string()),
        amount: Some(json!(amount)),
        status: Some("COMPLETED".to_string()),
        transaction_id: Some(transaction_id.to_string()),
        end_to_end_id: Some(end_to_end_id.to_string()),
        created_at: Some("2024-03-06T12:00:00Z".to_string()),
        ..RawPushTransaction::default()
    }
}

#[tokio::test]
async fn test_refresh_then_filter_page_and_metrics_agree() -> Result<()> {
    let console = create_console(ConsoleConfig::default());
    let source = PagedSource::new(vec![Ok(mixed_page())]);

    let report = console.refresh(source.as_ref(), &FilterSpec::default(), PageRequest::new(1, 20)).await;
    assert!(report.applied);
    assert_eq!(report.fetched, 5);

    let filter = FilterSpec {
        transaction_type: Some(TransactionType::Funding),
        min_amount: Some(Decimal::from(10)),
        max_amount: Some(Decimal::from(50)),
        ..FilterSpec::default()
    };

    let view = console.get_filtered_sorted_page(&filter, &SortSpec::default(), PageRequest::new(1, 20)).await;
    assert_eq!(ids(&view.rows), vec![2, 4]);
    assert!(view.error.is_none());

    let metrics = console.get_metrics(&filter).await;
    assert_eq!(metrics.deposit_count, 2);
    assert_eq!(metrics.withdrawal_count, 0);
    assert_eq!(metrics.deposit_total.to_string(), "60.00");

    let everything = console.get_metrics(&FilterSpec::default()).await;
    assert_eq!(everything.deposit_total.to_string(), "140.25");
    assert_eq!(everything.withdrawal_total.to_string(), "30.00");

    Ok(())
}

#[tokio::test]
async fn test_failed_refresh_keeps_last_known_good_set() -> Result<()> {
    let console = create_console(ConsoleConfig::default());
    let good = PagedSource::new(vec![Ok(mixed_page())]);
    let failing = PagedSource::new(vec![Err(TransportError::Status { status: 503, message: "maintenance".to_string() })]);

    console.refresh(good.as_ref(), &FilterSpec::default(), PageRequest::default()).await;
    let report = console.refresh(failing.as_ref(), &FilterSpec::default(), PageRequest::default()).await;

    assert!(!report.applied);
    assert!(report.error.is_some());

    let view = console.get_filtered_sorted_page(&FilterSpec::default(), &SortSpec::default(), PageRequest::default()).await;
    assert_eq!(view.rows.len(), 5);
    assert_eq!(view.error, report.error);

    let retried = console.refresh(good.as_ref(), &FilterSpec::default(), PageRequest::default()).await;
    assert!(retried.applied);

    let view = console.get_filtered_sorted_page(&FilterSpec::default(), &SortSpec::default(), PageRequest::default()).await;
    assert!(view.error.is_none());

    Ok(())
}

#[tokio::test]
async fn test_newer_refresh_discards_the_older_one() -> Result<()> {
    let console = Arc::new(create_console(ConsoleConfig::default()));
    let slow = PagedSource::gated(vec![Ok(crypto_page(vec![record(9, "DEPOSIT", "1.00", 1)]))], Arc::new(Notify::new()));
    let fast = PagedSource::new(vec![Ok(mixed_page())]);

    let stale = {
        let console = console.clone();
        let slow = slow.clone();
        tokio::spawn(async move { console.refresh(slow.as_ref(), &FilterSpec::default(), PageRequest::default()).await })
    };

    while slow.calls() == 0 {
        tokio::task::yield_now().await;
    }

    let current = console.refresh(fast.as_ref(), &FilterSpec::default(), PageRequest::default()).await;
    let stale = stale.await?;

    assert!(current.applied);
    assert!(!stale.applied);
    assert_eq!(stale.error, Some(TransportError::Cancelled));

    let view = console.get_filtered_sorted_page(&FilterSpec::default(), &SortSpec::default(), PageRequest::default()).await;
    assert_eq!(ids(&view.rows), vec![1, 2, 3, 4, 5]);
    assert!(view.error.is_none());

    Ok(())
}

#[tokio::test]
async fn test_live_merge_lands_at_head_and_dedups_against_snapshot() -> Result<()> {
    let console = create_console(ConsoleConfig::default());
    console.refresh(PagedSource::new(vec![Ok(mixed_page())]).as_ref(), &FilterSpec::default(), PageRequest::default()).await;

    let (sender, receiver) = mpsc::channel(4);
    let handle = console.spawn_live_merge(ProviderKind::CryptoExchange, receiver);

    sender.send(push_event("push-1", "E2E-3", "30.00")).await?;
    sender.send(push_event("push-2", "E2E-NEW", "12.34")).await?;
    drop(sender);

    let stats = handle.await?;
    assert_eq!(stats.merged, 1);
    assert_eq!(stats.duplicates, 1);

    let view = console.get_filtered_sorted_page(&FilterSpec::default(), &SortSpec::default(), PageRequest::default()).await;
    assert_eq!(view.rows.len(), 6);
    assert_eq!(view.rows[0].transaction_id, "push-2");
    assert_eq!(view.rows[0].amount.to_string(), "12.34");

    Ok(())
}

#[tokio::test]
async fn test_fetch_all_pages_locally_over_filtered_set() -> Result<()> {
    let config = ConsoleConfig::default().with_fetch_all(2).with_records_per_page(2);
    let console = create_console(config);
    let source = PagedSource::new(vec![
        Ok(crypto_page(vec![record(1, "DEPOSIT", "5.00", 1), record(2, "DEPOSIT", "10.00", 2)])),
        Ok(crypto_page(vec![record(3, "WITHDRAWAL", "30.00", 3), record(4, "DEPOSIT", "50.00", 4)])),
        Ok(crypto_page(vec![record(5, "DEPOSIT", "75.25", 5)])),
    ]);

    let report = console.refresh(source.as_ref(), &FilterSpec::default(), PageRequest::new(1, 2)).await;
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(source.calls(), 3);

    let funding = FilterSpec { transaction_type: Some(TransactionType::Funding), ..FilterSpec::default() };
    let sort = SortSpec::new(SortKey::Amount, SortOrder::Desc);

    let first = console.get_filtered_sorted_page(&funding, &sort, PageRequest::new(1, 2)).await;
    assert_eq!(ids(&first.rows), vec![5, 4]);
    assert_eq!(first.meta.total_records, 4);
    assert_eq!(first.meta.total_pages, 2);
    assert!(first.meta.has_more);

    let second = console.get_filtered_sorted_page(&funding, &sort, PageRequest::new(2, 2)).await;
    assert_eq!(ids(&second.rows), vec![2, 1]);
    assert!(!second.meta.has_more);

    Ok(())
}

#[tokio::test]
async fn test_export_follows_filter_and_sort() -> Result<()> {
    let console = create_console(ConsoleConfig::default());
    console.refresh(PagedSource::new(vec![Ok(mixed_page())]).as_ref(), &FilterSpec::default(), PageRequest::default()).await;

    let mut buffer = Vec::new();
    let filter = FilterSpec { transaction_type: Some(TransactionType::Funding), ..FilterSpec::default() };
    let written = console.export_csv(&mut buffer, &filter, &SortSpec::new(SortKey::Date, SortOrder::Desc)).await?;

    let output = String::from_utf8(buffer)?;
    let first_columns: Vec<&str> = output.lines().skip(1).map(|line| line.split(',').next().unwrap_or_default()).collect();

    assert_eq!(written, 4);
    assert_eq!(first_columns, vec!["5", "4", "2", "1"]);

    Ok(())
}

#[tokio::test]
async fn test_compensation_through_console() -> Result<()> {
    let console = create_console(ConsoleConfig::default());
    console.refresh(PagedSource::new(vec![Ok(mixed_page())]).as_ref(), &FilterSpec::default(), PageRequest::default()).await;

    let view = console.get_filtered_sorted_page(&FilterSpec::default(), &SortSpec::default(), PageRequest::default()).await;
    let funding = &view.rows[0];
    let key = CompensationKey::from(funding);

    assert_eq!(console.get_compensation_status(&key), CompensationState::NotStarted);

    let dialog = console.open_compensation(funding).await?;
    assert!(dialog.manual_entry_required);
    assert_eq!(console.get_compensation_status(&key), CompensationState::InProgress);

    let details = CompensationDetails { owner_id: "client-9".to_string(), note: None };
    assert_eq!(console.submit_compensation(funding, details).await?, CompensationState::Completed);
    assert_eq!(console.close_compensation(&key), CompensationState::Completed);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_debouncer_emits_only_last_edit_of_a_burst() -> Result<()> {
    let quiet = Duration::from_millis(500);
    let (debouncer, mut receiver) = FilterDebouncer::spawn(quiet);
    let started = Instant::now();

    for query in ["m", "ma", "mar", "maria"] {
        debouncer.push(FilterSpec { query: Some(query.to_string()), ..FilterSpec::default() });
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let emitted = receiver.recv().await;

    assert_eq!(emitted.and_then(|filter| filter.query).as_deref(), Some("maria"));
    assert!(started.elapsed() >= Duration::from_millis(300) + quiet);

    drop(debouncer);
    assert!(receiver.recv().await.is_none());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_debouncer_separates_bursts_after_quiet_period() -> Result<()> {
    let (debouncer, mut receiver) = FilterDebouncer::spawn(Duration::from_millis(500));

    debouncer.push(FilterSpec { reversals_only: true, ..FilterSpec::default() });
    tokio::time::sleep(Duration::from_millis(600)).await;
    debouncer.push(FilterSpec { reconciled_only: true, ..FilterSpec::default() });

    let first = receiver.recv().await;
    let second = receiver.recv().await;

    assert!(first.is_some_and(|filter| filter.reversals_only));
    assert!(second.is_some_and(|filter| filter.reconciled_only));

    Ok(())
}

fn banking_page(records: Vec<Value>) -> RawPage {
    RawPage::new(ProviderKind::BankingService, records)
}

fn banking_credit(code: &str, cents: i64, hour: u32) -> Value {
    json!({
        "tipo": "credito",
        "valor": cents,
        "tipoStatusTransacao": "Sucesso",
        "codigoTransacao": code,
        "nomePagador": format!("Pagador {code}"),
        "dataTransacao": format!("2024-03-05 {hour:02}:00:00")
    })
}

#[tokio::test]
async fn test_completed_compensation_follows_its_record_across_refetches() -> Result<()> {
    let console = create_console(ConsoleConfig::default());
    let settled = banking_credit("abc-1", 4_000, 10);

    console.refresh(PagedSource::new(vec![Ok(banking_page(vec![settled.clone()]))]).as_ref(), &FilterSpec::default(), PageRequest::default()).await;

    let view = console.get_filtered_sorted_page(&FilterSpec::default(), &SortSpec::default(), PageRequest::default()).await;
    let compensated = view.rows[0].clone();
    let details = CompensationDetails { owner_id: "client-1".to_string(), note: None };

    console.open_compensation(&compensated).await?;
    assert_eq!(console.submit_compensation(&compensated, details).await?, CompensationState::Completed);

    let shifted = PagedSource::new(vec![Ok(banking_page(vec![banking_credit("abc-0", 9_000, 9), settled]))]);
    let report = console.refresh(shifted.as_ref(), &FilterSpec::default(), PageRequest::default()).await;
    assert!(report.applied);

    let view = console.get_filtered_sorted_page(&FilterSpec::default(), &SortSpec::default(), PageRequest::default()).await;
    assert_eq!(view.rows.len(), 2);

    for transaction in &view.rows {
        let state = console.get_compensation_status(&CompensationKey::from(transaction));

        match transaction.transaction_id.as_str() {
            "abc-1" => {
                assert_eq!(transaction.id, compensated.id);
                assert_eq!(state, CompensationState::Completed);
            }
            _ => assert_eq!(state, CompensationState::NotStarted)
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_failure_of_superseded_refresh_is_not_reported() -> Result<()> {
    let console = Arc::new(create_console(ConsoleConfig::default()));
    let gate = Arc::new(Notify::new());
    let failing = PagedSource::gated(vec![Err(TransportError::Status { status: 502, message: "bad gateway".to_string() })], gate.clone());

    let superseded = {
        let console = console.clone();
        let failing = failing.clone();
        tokio::spawn(async move { console.refresh(failing.as_ref(), &FilterSpec::default(), PageRequest::default()).await })
    };

    while failing.calls() == 0 {
        tokio::task::yield_now().await;
    }

    //NOTE: The failure arrives while the pagination state is busy and a newer fetch starts meanwhile
    let pagination = console.pagination.lock().await;
    gate.notify_one();

    for _ in 0..8 {
        tokio::task::yield_now().await;
    }

    console.session.begin_fetch().await;
    drop(pagination);

    let report = superseded.await?;
    assert!(!report.applied);

    let view = console.get_filtered_sorted_page(&FilterSpec::default(), &SortSpec::default(), PageRequest::default()).await;
    assert!(view.error.is_none());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_console_debouncer_uses_configured_quiet_period() -> Result<()> {
    let quiet = Duration::from_millis(200);
    let console = create_console(ConsoleConfig::default().with_debounce(quiet));
    let (debouncer, mut receiver) = console.filter_debouncer();
    let started = Instant::now();

    debouncer.push(FilterSpec { query: Some("maria".to_string()), ..FilterSpec::default() });
    let emitted = receiver.recv().await;

    assert_eq!(emitted.and_then(|filter| filter.query).as_deref(), Some("maria"));
    assert!(started.elapsed() >= quiet);
    assert!(started.elapsed() < Duration::from_millis(500));

    Ok(())
}
