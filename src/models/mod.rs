mod transaction;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

pub use transaction::{CanonicalTransaction, DedupKey};

/// Canonical direction of money flow relative to the monitored account.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Funding,
    Withdrawal
}

/// Canonical settlement state.
///
/// `Unknown` is produced only when the unknown-status policy asks for it; see
/// [`crate::adapters::UnknownStatusPolicy`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Complete,
    Failed,
    Cancelled,
    Unknown
}

/// The banking rail a record was adapted from.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    BankingService,
    CryptoExchange,
    PaymentGateway
}

impl ProviderKind {
    pub fn scope(&self) -> &'static str {
        match self {
            ProviderKind::BankingService => "banking-service",
            ProviderKind::CryptoExchange => "crypto-exchange",
            ProviderKind::PaymentGateway => "payment-gateway"
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.scope())
    }
}
