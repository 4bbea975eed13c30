mod errors;
mod session_store;
mod tracker;
mod workflow;

use serde::Serialize;
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::models::{CanonicalTransaction, ProviderKind};
use crate::types::RecordId;

pub use errors::CompensationError;
pub use session_store::SessionCompensationStore;
pub use tracker::CompensationTracker;
pub use workflow::{CompensationDetails, CompensationGateway, CompensationRequest, CompensationWorkflow, DialogContext, Verification, VerificationLookup};

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompensationState {
    #[default]
    NotStarted,
    InProgress,
    Completed
}

impl Display for CompensationState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            CompensationState::NotStarted => "not-started",
            CompensationState::InProgress => "in-progress",
            CompensationState::Completed => "completed"
        };

        formatter.write_str(label)
    }
}

/// Session-local key of a record's compensation state, rendered as `{provider-scope}-{id}`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct CompensationKey {
    pub provider: ProviderKind,
    pub id: RecordId
}

impl CompensationKey {
    pub fn new(provider: ProviderKind, id: RecordId) -> Self {
        Self { provider, id }
    }
}

impl From<&CanonicalTransaction> for CompensationKey {
    fn from(transaction: &CanonicalTransaction) -> Self {
        Self::new(transaction.provider, transaction.id)
    }
}

impl Display for CompensationKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}-{}", self.provider.scope(), self.id)
    }
}

/// Backing store of compensation states. Absent keys read as [`CompensationState::NotStarted`].
pub trait CompensationStore: Send + Sync + 'static {
    fn load(&self, key: &CompensationKey) -> Option<CompensationState>;

    /// Atomically moves `key` from `expected` to `next`.
    ///
    /// Returns the actual current state when it is not `expected`.
    fn compare_and_set(&self, key: &CompensationKey, expected: CompensationState, next: CompensationState) -> Result<(), CompensationState>;
}
