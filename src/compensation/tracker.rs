use std::sync::Arc;
use tracing::debug;

use crate::compensation::{CompensationError, CompensationKey, CompensationState, CompensationStore};

/// Per-record state machine guarding the manual compensation action.
///
/// `NotStarted -> InProgress -> Completed`, with `abort` returning `InProgress` to
/// `NotStarted`. `Completed` is terminal.
#[derive(Clone)]
pub struct CompensationTracker {
    store: Arc<dyn CompensationStore>
}

impl CompensationTracker {
    pub fn new(store: Arc<dyn CompensationStore>) -> Self {
        Self { store }
    }

    pub fn status(&self, key: &CompensationKey) -> CompensationState {
        self.store.load(key).unwrap_or_default()
    }

    pub fn is_completed(&self, key: &CompensationKey) -> bool {
        self.status(key) == CompensationState::Completed
    }

    /// Marks the dialog as opened. Reopening an in-progress record is a no-op.
    pub fn begin(&self, key: &CompensationKey) -> Result<CompensationState, CompensationError> {
        match self.store.compare_and_set(key, CompensationState::NotStarted, CompensationState::InProgress) {
            Ok(()) => {
                debug!("Compensation for [{key}] started");
                Ok(CompensationState::InProgress)
            }
            Err(CompensationState::Completed) => Err(CompensationError::already_completed(*key)),
            Err(current) => Ok(current)
        }
    }

    /// Closes the dialog without success. A completed record stays completed.
    pub fn abort(&self, key: &CompensationKey) -> CompensationState {
        match self.store.compare_and_set(key, CompensationState::InProgress, CompensationState::NotStarted) {
            Ok(()) => {
                debug!("Compensation for [{key}] aborted");
                CompensationState::NotStarted
            }
            Err(current) => current
        }
    }

    /// Records the gateway's success signal. Only valid from `InProgress`.
    pub fn complete(&self, key: &CompensationKey) -> Result<CompensationState, CompensationError> {
        match self.store.compare_and_set(key, CompensationState::InProgress, CompensationState::Completed) {
            Ok(()) => {
                debug!("Compensation for [{key}] completed");
                Ok(CompensationState::Completed)
            }
            Err(CompensationState::Completed) => Err(CompensationError::already_completed(*key)),
            Err(current) => Err(CompensationError::not_in_progress(*key, current))
        }
    }
}
