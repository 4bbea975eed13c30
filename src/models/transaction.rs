use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{ProviderKind, TransactionStatus, TransactionType};
use crate::types::{Amount, RecordId};

/// The provider-agnostic transaction every downstream component consumes.
///
/// Adapters are the only producers. By the time a record reaches this shape the amount
/// is in major units and only the counterparty side matching `transaction_type` is populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalTransaction {
    /// Locally unique within one provider's result set.
    pub id: RecordId,
    pub provider: ProviderKind,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Provider-native external identifier.
    pub transaction_id: String,
    /// PIX end-to-end identifier; empty when the provider did not report one.
    pub end_to_end_id: String,
    pub reconciliation_id: Option<String>,
    pub status: TransactionStatus,
    pub amount: Amount,
    pub fee: Amount,
    pub currency: String,
    pub method: String,
    pub method_name: String,
    pub payer_name: String,
    pub payer_tax_id: String,
    pub payer_bank_name: String,
    pub payee_name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub received_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_reversal: bool,
    /// Lookup reference to the reversed settlement, never ownership.
    pub origin_end_to_end_id: Option<String>
}

/// Identity used to recognise the same settlement reported twice.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum DedupKey {
    EndToEnd(String),
    Composite {
        provider: ProviderKind,
        transaction_id: String,
        amount: Amount,
        created_at: Option<DateTime<Utc>>
    }
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

impl DedupKey {
    /// A positive id derived from this identity alone, stable across fetches and processes.
    ///
    /// Records the provider sent without an id get this one, so a refetch that reorders
    /// rows still maps each settlement to the same compensation key.
    pub fn fingerprint(&self) -> RecordId {
        let text = match self {
            DedupKey::EndToEnd(end_to_end_id) => format!("e2e|{end_to_end_id}"),
            DedupKey::Composite { provider, transaction_id, amount, created_at } => {
                let created_at = created_at.map(|value| value.to_rfc3339()).unwrap_or_default();
                format!("{provider}|{transaction_id}|{amount}|{created_at}")
            }
        };

        let hash = text.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME));

        (hash % RecordId::MAX as u64) as RecordId + 1
    }
}

impl CanonicalTransaction {
    /// Creates a record with every descriptive field blank.
    pub fn new(provider: ProviderKind, id: RecordId, transaction_type: TransactionType, amount: Amount) -> Self {
        Self {
            id,
            provider,
            transaction_type,
            transaction_id: String::new(),
            end_to_end_id: String::new(),
            reconciliation_id: None,
            status: TransactionStatus::Complete,
            amount,
            fee: Amount::zero(),
            currency: String::new(),
            method: String::new(),
            method_name: String::new(),
            payer_name: String::new(),
            payer_tax_id: String::new(),
            payer_bank_name: String::new(),
            payee_name: String::new(),
            created_at: None,
            received_at: None,
            updated_at: None,
            is_reversal: false,
            origin_end_to_end_id: None
        }
    }

    /// Clears the counterparty side that does not belong to this direction.
    pub fn with_counterparty_enforced(mut self) -> Self {
        match self.transaction_type {
            TransactionType::Funding => self.payee_name.clear(),
            TransactionType::Withdrawal => {
                self.payer_name.clear();
                self.payer_tax_id.clear();
                self.payer_bank_name.clear();
            }
        }

        self
    }

    /// The meaningful counterparty name for this direction.
    pub fn counterparty_name(&self) -> &str {
        match self.transaction_type {
            TransactionType::Funding => &self.payer_name,
            TransactionType::Withdrawal => &self.payee_name
        }
    }

    pub fn has_reconciliation_id(&self) -> bool {
        self.reconciliation_id.as_deref().is_some_and(|value| !value.trim().is_empty())
    }

    /// End-to-end id when present, otherwise a composite of provider, external id, amount and creation time.
    pub fn dedup_key(&self) -> DedupKey {
        let end_to_end_id = self.end_to_end_id.trim();

        if !end_to_end_id.is_empty() {
            return DedupKey::EndToEnd(end_to_end_id.to_string());
        }

        DedupKey::Composite {
            provider: self.provider,
            transaction_id: self.transaction_id.clone(),
            amount: self.amount,
            created_at: self.created_at
        }
    }
}
