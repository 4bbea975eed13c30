use serde::Deserialize;

use crate::models::TransactionStatus;

//NOTE: Families are tested in this order and the first hit wins. A string such as
//      "PENDENTE - SUCESSO PARCIAL" must resolve to Complete, so success terms lead.
const SUCCESS_TERMS: &[&str] = &[
    "SUCESSO", "SUCCESS", "COMPLETE", "CONCLUID", "CONFIRMED", "CONFIRMAD", "APPROVED", "APROVAD",
    "LIQUIDAD", "SETTLED", "EFETIVAD"
];
const PENDING_TERMS: &[&str] = &[
    "PENDENTE", "PENDING", "PROCESSING", "PROCESSANDO", "PROCESSAMENTO", "AGUARDANDO", "WAITING",
    "EM ANDAMENTO", "EM_ANDAMENTO", "CREATED", "CRIAD"
];
const FAILURE_TERMS: &[&str] = &[
    "FALHA", "FAILED", "FAILURE", "ERRO", "REJECT", "REJEITAD", "RECUSAD", "DENIED", "NEGAD"
];
const CANCELLED_TERMS: &[&str] = &["CANCEL", "EXPIRED", "EXPIRAD"];

const FAMILIES: [(&[&str], TransactionStatus); 4] = [
    (SUCCESS_TERMS, TransactionStatus::Complete),
    (PENDING_TERMS, TransactionStatus::Pending),
    (FAILURE_TERMS, TransactionStatus::Failed),
    (CANCELLED_TERMS, TransactionStatus::Cancelled)
];

/// What to report when a provider status matches none of the known vocabularies.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownStatusPolicy {
    /// Legacy console behaviour: anything unrecognised is shown as settled.
    Complete,
    #[default]
    Unknown
}

/// Maps a provider status string onto the canonical status by case-insensitive keyword match.
pub fn map_status(raw: &str, policy: UnknownStatusPolicy) -> TransactionStatus {
    let status = raw.trim().to_uppercase();

    if !status.is_empty() {
        for (terms, canonical) in FAMILIES {
            if terms.iter().any(|term| status.contains(term)) {
                return canonical;
            }
        }
    }

    match policy {
        UnknownStatusPolicy::Complete => TransactionStatus::Complete,
        UnknownStatusPolicy::Unknown => TransactionStatus::Unknown
    }
}
