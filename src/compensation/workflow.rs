use async_trait::async_trait;
use dashmap::DashSet;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::compensation::{CompensationError, CompensationKey, CompensationState, CompensationTracker};
use crate::models::{CanonicalTransaction, TransactionType};
use crate::pagination::TransportError;
use crate::types::Amount;

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const DEFAULT_CACHE_CAPACITY: u64 = 1_024;

/// Result of an account-owner lookup by end-to-end id.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Verification {
    pub found: bool,
    pub owner_id: Option<String>
}

#[async_trait]
pub trait VerificationLookup: Send + Sync {
    async fn lookup(&self, end_to_end_id: &str) -> Result<Verification, TransportError>;
}

/// What the external compensation workflow receives for one record.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompensationRequest {
    pub key: String,
    pub transaction_id: String,
    pub end_to_end_id: String,
    pub amount: Amount,
    pub owner_id: String,
    pub note: Option<String>
}

#[async_trait]
pub trait CompensationGateway: Send + Sync {
    async fn submit(&self, request: &CompensationRequest) -> Result<(), TransportError>;
}

/// Operator input collected by the action dialog.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct CompensationDetails {
    pub owner_id: String,
    pub note: Option<String>
}

/// What the action dialog opens with.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DialogContext {
    pub key: CompensationKey,
    pub state: CompensationState,
    /// Owner found by the verification lookup, if any.
    pub owner_id: Option<String>,
    /// The lookup failed or found nothing; the operator has to type the owner in.
    pub manual_entry_required: bool
}

/// Drives the compensation dialog: open, verify, submit, close.
pub struct CompensationWorkflow {
    tracker: CompensationTracker,
    verification: Arc<dyn VerificationLookup>,
    gateway: Arc<dyn CompensationGateway>,
    owners: Cache<String, String>,
    in_flight: DashSet<CompensationKey>
}

impl CompensationWorkflow {
    pub fn new(tracker: CompensationTracker, verification: Arc<dyn VerificationLookup>, gateway: Arc<dyn CompensationGateway>) -> Self {
        Self {
            tracker,
            verification,
            gateway,
            owners: build_cache(DEFAULT_CACHE_TTL, DEFAULT_CACHE_CAPACITY),
            in_flight: DashSet::new()
        }
    }

    pub fn with_verification_cache(mut self, time_to_live: Duration, capacity: u64) -> Self {
        self.owners = build_cache(time_to_live, capacity);
        self
    }

    pub fn tracker(&self) -> &CompensationTracker {
        &self.tracker
    }

    /// Opens the dialog for a FUNDING record. Verification problems never block it.
    pub async fn open(&self, transaction: &CanonicalTransaction) -> Result<DialogContext, CompensationError> {
        let key = compensable_key(transaction)?;
        let state = self.tracker.begin(&key)?;
        let owner_id = self.find_owner(&transaction.end_to_end_id).await;

        Ok(DialogContext {
            key,
            state,
            manual_entry_required: owner_id.is_none(),
            owner_id
        })
    }

    /// Closes the dialog without success. A submission still in flight keeps the record in progress.
    pub fn close(&self, key: &CompensationKey) -> CompensationState {
        if self.in_flight.contains(key) {
            debug!("Dialog for [{key}] closed while a submission is in flight");
            return self.tracker.status(key);
        }

        self.tracker.abort(key)
    }

    /// Submits the compensation and completes the record only when the gateway reports success.
    pub async fn submit(&self, transaction: &CanonicalTransaction, details: CompensationDetails) -> Result<CompensationState, CompensationError> {
        let key = compensable_key(transaction)?;
        let owner_id = details.owner_id.trim();

        if owner_id.is_empty() {
            return Err(CompensationError::missing_owner(key));
        }

        //NOTE: Held from the state check through completion
        let _guard = InFlight::acquire(&self.in_flight, key)
            .ok_or_else(|| CompensationError::submission_in_flight(key))?;

        match self.tracker.status(&key) {
            CompensationState::InProgress => {},
            CompensationState::Completed => return Err(CompensationError::already_completed(key)),
            state => return Err(CompensationError::not_in_progress(key, state))
        }

        let request = CompensationRequest {
            key: key.to_string(),
            transaction_id: transaction.transaction_id.clone(),
            end_to_end_id: transaction.end_to_end_id.clone(),
            amount: transaction.amount,
            owner_id: owner_id.to_string(),
            note: details.note.filter(|note| !note.trim().is_empty())
        };

        if let Err(error) = self.gateway.submit(&request).await {
            warn!("Compensation for [{key}] was rejected: {error}");
            return Err(CompensationError::submission_failed(key, error));
        }

        info!("Compensation for [{key}] of [{}] submitted for owner [{owner_id}]", transaction.amount);

        self.tracker.complete(&key)
    }

    async fn find_owner(&self, end_to_end_id: &str) -> Option<String> {
        let end_to_end_id = end_to_end_id.trim();

        if end_to_end_id.is_empty() {
            return None;
        }

        if let Some(owner_id) = self.owners.get(end_to_end_id).await {
            return Some(owner_id);
        }

        match self.verification.lookup(end_to_end_id).await {
            Ok(Verification { found: true, owner_id: Some(owner_id) }) if !owner_id.trim().is_empty() => {
                self.owners.insert(end_to_end_id.to_string(), owner_id.clone()).await;
                Some(owner_id)
            }
            Ok(_) => {
                debug!("No owner found for end-to-end id [{end_to_end_id}]");
                None
            }
            Err(error) => {
                warn!("Owner lookup for end-to-end id [{end_to_end_id}] failed, falling back to manual entry: {error}");
                None
            }
        }
    }
}

fn build_cache(time_to_live: Duration, capacity: u64) -> Cache<String, String> {
    Cache::builder()
        .time_to_live(time_to_live)
        .max_capacity(capacity)
        .build()
}

fn compensable_key(transaction: &CanonicalTransaction) -> Result<CompensationKey, CompensationError> {
    let key = CompensationKey::from(transaction);

    match transaction.transaction_type {
        TransactionType::Funding => Ok(key),
        other => Err(CompensationError::not_compensable(key, other))
    }
}

/// Marks a key as being submitted for as long as it lives.
struct InFlight<'a> {
    keys: &'a DashSet<CompensationKey>,
    key: CompensationKey
}

impl<'a> InFlight<'a> {
    fn acquire(keys: &'a DashSet<CompensationKey>, key: CompensationKey) -> Option<Self> {
        keys.insert(key).then(|| Self { keys, key })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.keys.remove(&self.key);
    }
}
