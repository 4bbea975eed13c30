use serde::Deserialize;
use serde_json::Value;

use crate::adapters::{decimal_amount, lenient, map_status, non_blank, parse_direction, record_id, text, AdaptContext, AdapterError, Direction};
use crate::models::{CanonicalTransaction, ProviderKind};
use crate::types::{parse_timestamp, RecordId};

const PROVIDER: ProviderKind = ProviderKind::CryptoExchange;

/// Transaction from the crypto-exchange rail. Amounts are decimal strings in major units.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CryptoExchangeRecord {
    #[serde(deserialize_with = "lenient::integer")]
    pub id: Option<RecordId>,
    /// `DEPOSIT`, `WITHDRAWAL`, or `BALANCE` for the synthetic current-balance row.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub amount: Option<Value>,
    pub fee: Option<Value>,
    pub currency: Option<String>,
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub transaction_id: Option<String>,
    pub end_to_end_id: Option<String>,
    pub reconciliation_id: Option<String>,
    pub method: Option<String>,
    pub method_name: Option<String>,
    pub payer_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub payer_tax_id: Option<String>,
    pub payer_bank_name: Option<String>,
    pub payee_name: Option<String>,
    pub created_at: Option<String>,
    pub received_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_reversal: Option<bool>,
    pub origin_end_to_end_id: Option<String>
}

pub(super) fn adapt(record: CryptoExchangeRecord, context: &AdaptContext, position: usize) -> Result<Option<CanonicalTransaction>, AdapterError> {
    let kind = record.kind.as_deref()
        .ok_or_else(|| AdapterError::missing_field(PROVIDER, position, "type"))?;

    let transaction_type = match parse_direction(kind) {
        Some(Direction::Flow(transaction_type)) => transaction_type,
        Some(Direction::Balance) => return Ok(None),
        None => return Err(AdapterError::malformed_field(PROVIDER, position, "type", kind))
    };

    let raw_amount = record.amount.as_ref()
        .ok_or_else(|| AdapterError::missing_field(PROVIDER, position, "amount"))?;
    let (amount, _) = decimal_amount(raw_amount)
        .ok_or_else(|| AdapterError::malformed_field(PROVIDER, position, "amount", raw_amount))?;

    let local = &context.local_offset;

    let mut transaction = CanonicalTransaction::new(PROVIDER, 0, transaction_type, amount);
    transaction.transaction_id = text(record.transaction_id);
    transaction.end_to_end_id = text(record.end_to_end_id);
    transaction.reconciliation_id = non_blank(record.reconciliation_id);
    transaction.status = map_status(record.status.as_deref().unwrap_or_default(), context.unknown_status);
    transaction.fee = record.fee.as_ref().and_then(decimal_amount).map(|(fee, _)| fee).unwrap_or_default();
    transaction.currency = non_blank(record.currency).unwrap_or_else(|| "BRL".to_string());
    transaction.method = text(record.method);
    transaction.method_name = text(record.method_name);
    transaction.payer_name = text(record.payer_name);
    transaction.payer_tax_id = text(record.payer_tax_id);
    transaction.payer_bank_name = text(record.payer_bank_name);
    transaction.payee_name = text(record.payee_name);
    transaction.created_at = record.created_at.as_deref().and_then(|value| parse_timestamp(value, local));
    transaction.received_at = record.received_at.as_deref().and_then(|value| parse_timestamp(value, local));
    transaction.updated_at = record.updated_at.as_deref().and_then(|value| parse_timestamp(value, local));
    transaction.is_reversal = record.is_reversal.unwrap_or(false);
    transaction.origin_end_to_end_id = non_blank(record.origin_end_to_end_id);

    transaction.id = record_id(record.id, &transaction);

    Ok(Some(transaction))
}
