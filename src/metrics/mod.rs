
use serde::Serialize;

use crate::models::{CanonicalTransaction, TransactionType};
use crate::types::Amount;

/// Counts and sums over a filtered set, split by direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub deposit_count: usize,
    pub withdrawal_count: usize,
    pub deposit_total: Amount,
    pub withdrawal_total: Amount
}

impl Metrics {
    pub fn total_count(&self) -> usize {
        self.deposit_count + self.withdrawal_count
    }
}

/// Reduces `records` to [`Metrics`]. Callers pass the already-filtered set so the numbers
/// always agree with the rows on screen.
pub fn aggregate<'a>(records: impl IntoIterator<Item = &'a CanonicalTransaction>) -> Metrics {
    records.into_iter().fold(Metrics::default(), |mut metrics, transaction| {
        match transaction.transaction_type {
            TransactionType::Funding => {
                metrics.deposit_count += 1;
                metrics.deposit_total += transaction.amount;
            }
            TransactionType::Withdrawal => {
                metrics.withdrawal_count += 1;
                metrics.withdrawal_total += transaction.amount;
            }
        }

        metrics
    })
}
