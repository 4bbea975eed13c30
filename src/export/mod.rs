
use serde::Serialize;
use std::io::Write;
use thiserror::Error;
use tracing::debug;

use crate::models::{CanonicalTransaction, ProviderKind, TransactionStatus, TransactionType};
use crate::types::{Amount, RecordId};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("Export output failed: {0}")]
    Io(#[from] std::io::Error)
}

/// One exported line. The counterparty columns follow the record's direction.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRow<'a> {
    id: RecordId,
    provider: ProviderKind,
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    status: TransactionStatus,
    transaction_id: &'a str,
    end_to_end_id: &'a str,
    reconciliation_id: &'a str,
    amount: Amount,
    fee: Amount,
    currency: &'a str,
    method: &'a str,
    counterparty_name: &'a str,
    counterparty_tax_id: &'a str,
    counterparty_bank_name: &'a str,
    created_at: String,
    is_reversal: bool,
    origin_end_to_end_id: &'a str
}

impl<'a> From<&'a CanonicalTransaction> for ExportRow<'a> {
    fn from(transaction: &'a CanonicalTransaction) -> Self {
        let (counterparty_tax_id, counterparty_bank_name) = match transaction.transaction_type {
            TransactionType::Funding => (transaction.payer_tax_id.as_str(), transaction.payer_bank_name.as_str()),
            TransactionType::Withdrawal => ("", "")
        };

        Self {
            id: transaction.id,
            provider: transaction.provider,
            transaction_type: transaction.transaction_type,
            status: transaction.status,
            transaction_id: &transaction.transaction_id,
            end_to_end_id: &transaction.end_to_end_id,
            reconciliation_id: transaction.reconciliation_id.as_deref().unwrap_or_default(),
            amount: transaction.amount,
            fee: transaction.fee,
            currency: &transaction.currency,
            method: &transaction.method,
            counterparty_name: transaction.counterparty_name(),
            counterparty_tax_id,
            counterparty_bank_name,
            created_at: transaction.created_at.map(|created_at| created_at.to_rfc3339()).unwrap_or_default(),
            is_reversal: transaction.is_reversal,
            origin_end_to_end_id: transaction.origin_end_to_end_id.as_deref().unwrap_or_default()
        }
    }
}

/// Writes `records` as CSV with a header row, in the order given. Returns the number of rows written.
pub fn write_csv<'a, W: Write>(records: impl IntoIterator<Item = &'a CanonicalTransaction>, writer: W) -> Result<usize, ExportError> {
    let mut output = csv::Writer::from_writer(writer);
    let mut written = 0;

    for transaction in records {
        output.serialize(ExportRow::from(transaction))?;
        written += 1;
    }

    //NOTE: With no rows serde never sees a struct, so the header has to be written by hand
    if written == 0 {
        output.write_record(HEADER)?;
    }

    output.flush()?;

    debug!("Exported [{written}] records");

    Ok(written)
}

const HEADER: [&str; 17] = [
    "id",
    "provider",
    "type",
    "status",
    "transactionId",
    "endToEndId",
    "reconciliationId",
    "amount",
    "fee",
    "currency",
    "method",
    "counterpartyName",
    "counterpartyTaxId",
    "counterpartyBankName",
    "createdAt",
    "isReversal",
    "originEndToEndId"
];
