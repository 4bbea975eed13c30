use serde::Deserialize;

use crate::adapters::{lenient, map_status, non_blank, parse_direction, record_id, text, AdaptContext, AdapterError, Direction};
use crate::models::{CanonicalTransaction, ProviderKind, TransactionType};
use crate::types::{parse_timestamp, Amount, RecordId};

const PROVIDER: ProviderKind = ProviderKind::PaymentGateway;

/// Settlement from the payment-gateway rail.
///
/// `amount_minor` is signed cents: negative values are pay-outs unless `operation`
/// says otherwise.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentGatewayRecord {
    #[serde(deserialize_with = "lenient::integer")]
    pub id: Option<RecordId>,
    pub amount_minor: Option<i64>,
    #[serde(deserialize_with = "lenient::integer")]
    pub fee_minor: Option<i64>,
    /// `PAY_IN` or `PAY_OUT`; wins over the amount sign when present.
    pub operation: Option<String>,
    pub state: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub external_id: Option<String>,
    pub end_to_end_id: Option<String>,
    pub reconciliation_id: Option<String>,
    pub counterparty_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub counterparty_document: Option<String>,
    pub counterparty_bank: Option<String>,
    pub currency: Option<String>,
    pub created_at: Option<String>,
    pub settled_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub reversal: Option<bool>,
    pub original_end_to_end_id: Option<String>
}

pub(super) fn adapt(record: PaymentGatewayRecord, context: &AdaptContext, position: usize) -> Result<Option<CanonicalTransaction>, AdapterError> {
    let amount_minor = record.amount_minor
        .ok_or_else(|| AdapterError::missing_field(PROVIDER, position, "amount_minor"))?;
    let (amount, negative) = Amount::from_minor(amount_minor);

    let transaction_type = match record.operation.as_deref().filter(|operation| !operation.trim().is_empty()) {
        Some(operation) => match parse_direction(operation) {
            Some(Direction::Flow(transaction_type)) => transaction_type,
            Some(Direction::Balance) => return Ok(None),
            None => return Err(AdapterError::malformed_field(PROVIDER, position, "operation", operation))
        },
        None if negative => TransactionType::Withdrawal,
        None => TransactionType::Funding
    };

    let local = &context.local_offset;
    let counterparty = text(record.counterparty_name);

    let mut transaction = CanonicalTransaction::new(PROVIDER, 0, transaction_type, amount);
    transaction.transaction_id = text(record.external_id);
    transaction.end_to_end_id = text(record.end_to_end_id);
    transaction.reconciliation_id = non_blank(record.reconciliation_id);
    transaction.status = map_status(record.state.as_deref().unwrap_or_default(), context.unknown_status);
    transaction.fee = record.fee_minor.map(|fee| Amount::from_minor(fee).0).unwrap_or_default();
    transaction.currency = non_blank(record.currency).unwrap_or_else(|| "BRL".to_string());
    transaction.method = "PIX".to_string();
    transaction.created_at = record.created_at.as_deref().and_then(|value| parse_timestamp(value, local));
    transaction.received_at = record.settled_at.as_deref().and_then(|value| parse_timestamp(value, local));
    transaction.updated_at = record.updated_at.as_deref().and_then(|value| parse_timestamp(value, local));
    transaction.is_reversal = record.reversal.unwrap_or(false);
    transaction.origin_end_to_end_id = non_blank(record.original_end_to_end_id);

    match transaction_type {
        TransactionType::Funding => {
            transaction.payer_name = counterparty;
            transaction.payer_tax_id = text(record.counterparty_document);
            transaction.payer_bank_name = text(record.counterparty_bank);
        }
        TransactionType::Withdrawal => transaction.payee_name = counterparty
    }

    transaction.id = record_id(record.id, &transaction);

    Ok(Some(transaction))
}
