mod banking_service;
mod crypto_exchange;
mod errors;
mod lenient;
mod payment_gateway;
mod push;
mod status;

use chrono::{FixedOffset, Offset, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{CanonicalTransaction, ProviderKind, TransactionType};
use crate::types::{Amount, RecordId};

pub use banking_service::BankingServiceRecord;
pub use crypto_exchange::CryptoExchangeRecord;
pub use errors::AdapterError;
pub use payment_gateway::PaymentGatewayRecord;
pub use push::{adapt_push, RawPushTransaction};
pub use status::{map_status, UnknownStatusPolicy};

const BRASILIA_OFFSET_SECONDS: i32 = 3 * 3600;

/// A raw provider record, resolved by an explicit provider tag rather than by its shape.
#[derive(Debug, Clone)]
pub enum RawTransaction {
    BankingService(BankingServiceRecord),
    CryptoExchange(CryptoExchangeRecord),
    PaymentGateway(PaymentGatewayRecord)
}

impl RawTransaction {
    /// Decodes one JSON value using the shape of the given provider.
    pub fn decode(provider: ProviderKind, value: Value, position: usize) -> Result<Self, AdapterError> {
        let decoded = match provider {
            ProviderKind::BankingService => serde_json::from_value(value).map(RawTransaction::BankingService),
            ProviderKind::CryptoExchange => serde_json::from_value(value).map(RawTransaction::CryptoExchange),
            ProviderKind::PaymentGateway => serde_json::from_value(value).map(RawTransaction::PaymentGateway)
        };

        decoded.map_err(|error| AdapterError::decode(provider, position, &error))
    }

    pub fn provider(&self) -> ProviderKind {
        match self {
            RawTransaction::BankingService(_) => ProviderKind::BankingService,
            RawTransaction::CryptoExchange(_) => ProviderKind::CryptoExchange,
            RawTransaction::PaymentGateway(_) => ProviderKind::PaymentGateway
        }
    }
}

/// Settings every adapter needs besides the record itself.
#[derive(Debug, Clone)]
pub struct AdaptContext {
    pub unknown_status: UnknownStatusPolicy,
    /// Offset used for provider timestamps that carry none.
    pub local_offset: FixedOffset,
    /// Drop records without a reconciliation id (the reconciled-only view).
    pub require_reconciliation_id: bool
}

impl Default for AdaptContext {
    fn default() -> Self {
        Self {
            unknown_status: UnknownStatusPolicy::default(),
            local_offset: brasilia_offset(),
            require_reconciliation_id: false
        }
    }
}

pub fn brasilia_offset() -> FixedOffset {
    FixedOffset::west_opt(BRASILIA_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

/// Adapts a single raw record.
///
/// `Ok(None)` means the record was deliberately left out (a balance row, or a record the
/// active view cannot show). `Err` means a required field was missing or malformed.
pub fn adapt(raw: RawTransaction, context: &AdaptContext, position: usize) -> Result<Option<CanonicalTransaction>, AdapterError> {
    let adapted = match raw {
        RawTransaction::BankingService(record) => banking_service::adapt(record, context, position)?,
        RawTransaction::CryptoExchange(record) => crypto_exchange::adapt(record, context, position)?,
        RawTransaction::PaymentGateway(record) => payment_gateway::adapt(record, context, position)?
    };

    Ok(adapted.and_then(|transaction| admit(transaction, context)))
}

/// Adapts a page of raw JSON records, dropping (and logging) any that fail.
///
/// `first_position` is the number of raw records already seen in this fetch session; it
/// only locates failures in the log.
pub fn adapt_batch(provider: ProviderKind, values: Vec<Value>, context: &AdaptContext, first_position: usize) -> Vec<CanonicalTransaction> {
    let mut adapted = Vec::with_capacity(values.len());

    for (index, value) in values.into_iter().enumerate() {
        let position = first_position + index;
        let result = RawTransaction::decode(provider, value, position)
            .and_then(|raw| adapt(raw, context, position));

        match result {
            Ok(Some(transaction)) => adapted.push(transaction),
            Ok(None) => {},
            Err(error) => warn!("{error}")
        }
    }

    adapted
}

pub(crate) fn admit(transaction: CanonicalTransaction, context: &AdaptContext) -> Option<CanonicalTransaction> {
    if context.require_reconciliation_id && !transaction.has_reconciliation_id() {
        debug!("Record [{}] from [{}] has no reconciliation id and was left out of the view", transaction.id, transaction.provider);
        return None;
    }

    Some(transaction.with_counterparty_enforced())
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Direction {
    Flow(TransactionType),
    Balance
}

/// Resolves the direction vocabularies of every rail: credito/debito, DEPOSIT/WITHDRAWAL, PAY_IN/PAY_OUT.
pub(crate) fn parse_direction(term: &str) -> Option<Direction> {
    match term.trim().to_uppercase().as_str() {
        "CREDITO" | "CRÉDITO" | "C" | "CREDIT" | "DEPOSIT" | "FUNDING" | "PAY_IN" | "PAYIN" | "IN" => {
            Some(Direction::Flow(TransactionType::Funding))
        }
        "DEBITO" | "DÉBITO" | "D" | "DEBIT" | "WITHDRAWAL" | "WITHDRAW" | "PAY_OUT" | "PAYOUT" | "OUT" => {
            Some(Direction::Flow(TransactionType::Withdrawal))
        }
        "SALDO" | "BALANCE" => Some(Direction::Balance),
        _ => None
    }
}

/// Reads a decimal amount that may arrive as a JSON string or number.
pub(crate) fn decimal_amount(value: &Value) -> Option<(Amount, bool)> {
    match value {
        Value::String(text) => Amount::parse_signed(text).ok(),
        Value::Number(number) => Amount::parse_signed(&number.to_string()).ok(),
        _ => None
    }
}

pub(crate) fn text(value: Option<String>) -> String {
    value.map(|value| value.trim().to_string()).unwrap_or_default()
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

/// The provider's id when it sent one, otherwise the fingerprint of the record's identity.
pub(crate) fn record_id(explicit: Option<RecordId>, transaction: &CanonicalTransaction) -> RecordId {
    explicit.unwrap_or_else(|| transaction.dedup_key().fingerprint())
}
