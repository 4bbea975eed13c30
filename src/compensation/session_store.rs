use dashmap::DashMap;
use std::sync::Arc;

use crate::compensation::{CompensationKey, CompensationState, CompensationStore};

/// In-memory store scoped to one console session; dropping it resets every record.
#[derive(Debug, Default)]
pub struct SessionCompensationStore {
    states: Arc<DashMap<CompensationKey, CompensationState>>
}

impl SessionCompensationStore {
    pub fn new() -> Self {
        Self {
            states: Arc::new(DashMap::new())
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl CompensationStore for SessionCompensationStore {
    fn load(&self, key: &CompensationKey) -> Option<CompensationState> {
        self.states.get(key).map(|state| *state)
    }

    fn compare_and_set(&self, key: &CompensationKey, expected: CompensationState, next: CompensationState) -> Result<(), CompensationState> {
        //NOTE: The entry guard holds the shard lock, so the check and the write cannot interleave
        let mut state = self.states.entry(*key).or_insert(CompensationState::NotStarted);

        if *state != expected {
            return Err(*state);
        }

        *state = next;

        Ok(())
    }
}
