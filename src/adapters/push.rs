use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapters::{admit, decimal_amount, lenient, map_status, non_blank, parse_direction, text, AdaptContext, AdapterError, Direction};
use crate::models::{CanonicalTransaction, ProviderKind};
use crate::types::{parse_timestamp, RecordId};

/// Newly settled transaction delivered over the push channel.
///
/// The same settlement may already be present in the REST snapshot under a different
/// `id`/`transactionId`; only `endToEndId` is stable between the two.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPushTransaction {
    #[serde(deserialize_with = "lenient::integer")]
    pub id: Option<RecordId>,
    pub transaction_type: Option<String>,
    pub amount: Option<Value>,
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub transaction_id: Option<String>,
    pub end_to_end_id: Option<String>,
    pub reconciliation_id: Option<String>,
    pub currency: Option<String>,
    pub payer_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub payer_tax_id: Option<String>,
    pub payer_bank_name: Option<String>,
    pub payee_name: Option<String>,
    pub created_at: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_reversal: Option<bool>,
    pub origin_end_to_end_id: Option<String>
}

/// Adapts a push event for `provider`.
///
/// Events without an `id` get the negated fingerprint of their identity, so they cannot
/// collide with the positive ids of snapshot records and two handlers agree on it.
/// `sequence` only locates failures in the log.
pub fn adapt_push(event: RawPushTransaction, provider: ProviderKind, context: &AdaptContext, sequence: usize) -> Result<Option<CanonicalTransaction>, AdapterError> {
    let kind = event.transaction_type.as_deref()
        .ok_or_else(|| AdapterError::missing_field(provider, sequence, "transactionType"))?;

    let transaction_type = match parse_direction(kind) {
        Some(Direction::Flow(transaction_type)) => transaction_type,
        Some(Direction::Balance) => return Ok(None),
        None => return Err(AdapterError::malformed_field(provider, sequence, "transactionType", kind))
    };

    let raw_amount = event.amount.as_ref()
        .ok_or_else(|| AdapterError::missing_field(provider, sequence, "amount"))?;
    let (amount, _) = decimal_amount(raw_amount)
        .ok_or_else(|| AdapterError::malformed_field(provider, sequence, "amount", raw_amount))?;

    let local = &context.local_offset;

    let mut transaction = CanonicalTransaction::new(provider, 0, transaction_type, amount);
    transaction.transaction_id = text(event.transaction_id);
    transaction.end_to_end_id = text(event.end_to_end_id);
    transaction.reconciliation_id = non_blank(event.reconciliation_id);
    transaction.status = map_status(event.status.as_deref().unwrap_or_default(), context.unknown_status);
    transaction.currency = non_blank(event.currency).unwrap_or_else(|| "BRL".to_string());
    transaction.method = "PIX".to_string();
    transaction.payer_name = text(event.payer_name);
    transaction.payer_tax_id = text(event.payer_tax_id);
    transaction.payer_bank_name = text(event.payer_bank_name);
    transaction.payee_name = text(event.payee_name);
    transaction.created_at = event.created_at.as_deref().and_then(|value| parse_timestamp(value, local));
    transaction.received_at = transaction.created_at;
    transaction.is_reversal = event.is_reversal.unwrap_or(false);
    transaction.origin_end_to_end_id = non_blank(event.origin_end_to_end_id);
    transaction.id = event.id.unwrap_or_else(|| -transaction.dedup_key().fingerprint());

    Ok(admit(transaction, context))
}
