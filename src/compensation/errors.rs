use thiserror::Error;

use crate::compensation::{CompensationKey, CompensationState};
use crate::models::TransactionType;
use crate::pagination::TransportError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompensationError {
    #[error("Compensation for [{key}] is already completed")]
    AlreadyCompleted {
        key: CompensationKey
    },
    #[error("Compensation for [{key}] is not in progress (state [{state}])")]
    NotInProgress {
        key: CompensationKey,
        state: CompensationState
    },
    #[error("Record [{key}] is a [{transaction_type:?}] and cannot be compensated")]
    NotCompensable {
        key: CompensationKey,
        transaction_type: TransactionType
    },
    #[error("A compensation for [{key}] is already being submitted")]
    SubmissionInFlight {
        key: CompensationKey
    },
    #[error("Compensation for [{key}] needs an owner id")]
    MissingOwner {
        key: CompensationKey
    },
    #[error("Compensation for [{key}] failed: {source}")]
    SubmissionFailed {
        key: CompensationKey,
        source: TransportError
    }
}

impl CompensationError {
    pub fn already_completed(key: CompensationKey) -> Self {
        Self::AlreadyCompleted { key }
    }

    pub fn not_in_progress(key: CompensationKey, state: CompensationState) -> Self {
        Self::NotInProgress { key, state }
    }

    pub fn not_compensable(key: CompensationKey, transaction_type: TransactionType) -> Self {
        Self::NotCompensable { key, transaction_type }
    }

    pub fn submission_in_flight(key: CompensationKey) -> Self {
        Self::SubmissionInFlight { key }
    }

    pub fn missing_owner(key: CompensationKey) -> Self {
        Self::MissingOwner { key }
    }

    pub fn submission_failed(key: CompensationKey, source: TransportError) -> Self {
        Self::SubmissionFailed { key, source }
    }
}
