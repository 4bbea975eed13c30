use chrono::{FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::{CanonicalTransaction, TransactionStatus, TransactionType};
use crate::types::local_date;

/// Tolerance used by the exact-amount predicate to absorb rounding noise.
pub const EXACT_AMOUNT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// The active set of console filters. Pure data; `None` means "all" for type and status.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    /// Inclusive first local day.
    pub from: Option<NaiveDate>,
    /// Inclusive last local day.
    pub to: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    pub exact_amount: Option<Decimal>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub query: Option<String>,
    pub reversals_only: bool,
    pub reconciled_only: bool
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmountPredicate {
    Any,
    Exact(Decimal),
    Range { min: Option<Decimal>, max: Option<Decimal> }
}

impl FilterSpec {
    /// `exact` wins whenever it is set, regardless of `min`/`max`.
    pub fn amount_predicate(&self) -> AmountPredicate {
        match (self.exact_amount, self.min_amount, self.max_amount) {
            (Some(exact), _, _) => AmountPredicate::Exact(exact),
            (None, None, None) => AmountPredicate::Any,
            (None, min, max) => AmountPredicate::Range { min, max }
        }
    }

    pub fn has_date_range(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Evaluates every predicate in the fixed order: type, status, amount, query, date range,
    /// reversal flag, reconciliation id.
    pub fn matches(&self, transaction: &CanonicalTransaction, local: &FixedOffset) -> bool {
        self.matches_type(transaction)
            && self.matches_status(transaction)
            && self.matches_amount(transaction)
            && self.matches_query(transaction)
            && self.matches_dates(transaction, local)
            && (!self.reversals_only || transaction.is_reversal)
            && (!self.reconciled_only || transaction.has_reconciliation_id())
    }

    fn matches_type(&self, transaction: &CanonicalTransaction) -> bool {
        self.transaction_type.is_none_or(|expected| transaction.transaction_type == expected)
    }

    fn matches_status(&self, transaction: &CanonicalTransaction) -> bool {
        self.status.is_none_or(|expected| transaction.status == expected)
    }

    fn matches_amount(&self, transaction: &CanonicalTransaction) -> bool {
        let amount = transaction.amount.as_decimal();

        match self.amount_predicate() {
            AmountPredicate::Any => true,
            AmountPredicate::Exact(exact) => transaction.amount.is_within(exact, EXACT_AMOUNT_TOLERANCE),
            AmountPredicate::Range { min, max } => {
                min.is_none_or(|min| amount >= min) && max.is_none_or(|max| amount <= max)
            }
        }
    }

    fn matches_query(&self, transaction: &CanonicalTransaction) -> bool {
        let Some(query) = self.query.as_deref().map(str::trim).filter(|query| !query.is_empty()) else {
            return true;
        };

        let needle = query.to_lowercase();
        let amount = transaction.amount.to_string();
        let reconciliation_id = transaction.reconciliation_id.as_deref().unwrap_or_default();

        [
            transaction.payer_name.as_str(),
            transaction.payee_name.as_str(),
            transaction.payer_tax_id.as_str(),
            transaction.transaction_id.as_str(),
            transaction.end_to_end_id.as_str(),
            reconciliation_id,
            amount.as_str()
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    fn matches_dates(&self, transaction: &CanonicalTransaction, local: &FixedOffset) -> bool {
        if !self.has_date_range() {
            return true;
        }

        let Some(created_at) = transaction.created_at else {
            return false;
        };

        let day = local_date(&created_at, local);

        self.from.is_none_or(|from| day >= from) && self.to.is_none_or(|to| day <= to)
    }
}
