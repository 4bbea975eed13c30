use super::ConsoleConfig;

use anyhow::{anyhow, Result};
use chrono::FixedOffset;
use std::time::Duration;

use crate::adapters::UnknownStatusPolicy;
use crate::pagination::PaginationMode;
use crate::replay::ReplayFile;

#[test]
fn test_defaults_match_console_behaviour() {
    let config = ConsoleConfig::default();

    assert_eq!(config.pagination, PaginationMode::Server);
    assert_eq!(config.records_per_page, 20);
    assert_eq!(config.debounce, Duration::from_millis(500));
    assert_eq!(config.unknown_status, UnknownStatusPolicy::Unknown);
    assert_eq!(config.local_offset.utc_minus_local(), 3 * 3600);
    assert!(!config.reconciled_only);
}

#[test]
fn test_builders_clamp_and_flow_into_adapt_context() -> Result<()> {
    let offset = FixedOffset::west_opt(4 * 3600).ok_or_else(|| anyhow!("invalid offset"))?;
    let config = ConsoleConfig::default()
        .with_fetch_all(0)
        .with_records_per_page(0)
        .with_max_pages(0)
        .with_unknown_status(UnknownStatusPolicy::Complete)
        .with_local_offset(offset)
        .with_reconciled_only(true);

    assert_eq!(config.pagination, PaginationMode::FetchAll { server_page_cap: 1 });
    assert_eq!(config.records_per_page, 1);
    assert_eq!(config.max_pages, 1);

    let context = config.adapt_context();
    assert_eq!(context.unknown_status, UnknownStatusPolicy::Complete);
    assert_eq!(context.local_offset, offset);
    assert!(context.require_reconciliation_id);

    Ok(())
}

#[test]
fn test_replay_file_overrides_configuration() -> Result<()> {
    let replay: ReplayFile = serde_json::from_str(r#"{
        "pagination": { "mode": "fetch-all", "serverPageCap": 50 },
        "recordsPerPage": 5,
        "unknownStatus": "complete",
        "reconciledOnly": true
    }"#)?;

    let config = replay.configure(ConsoleConfig::default());

    assert_eq!(config.pagination, PaginationMode::FetchAll { server_page_cap: 50 });
    assert_eq!(config.records_per_page, 5);
    assert_eq!(config.max_pages, 200);
    assert_eq!(config.unknown_status, UnknownStatusPolicy::Complete);
    assert!(config.reconciled_only);
    assert_eq!(replay.page_request(&config).records_per_page, 5);

    Ok(())
}
