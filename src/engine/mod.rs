mod error;
mod mutations;
mod queries;
mod validate;

pub use error::{EngineError, ValidationError};
pub use mutations::{AcceptOutcome, CompleteOutcome, DeleteAllReport};
pub use queries::BookingFilter;

use std::sync::Arc;

use crate::availability::AvailabilityStore;
use crate::model::FeeSchedule;
use crate::notify::NotifyHub;
use crate::store::DocumentStore;

/// What `complete` does to the booking's span.
///
/// Releasing unconditionally ("stay is over, dates are free") ignores any
/// pending request that still wants those dates. Neither reading is clearly
/// right for every venue, so both behaviors sit behind this policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// Always restore the span to available.
    #[default]
    AlwaysRelease,
    /// Keep the span blocked while any pending booking overlaps it.
    KeepWhilePendingOverlap,
}

impl std::str::FromStr for CompletionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always_release" => Ok(CompletionPolicy::AlwaysRelease),
            "keep_while_pending_overlap" => Ok(CompletionPolicy::KeepWhilePendingOverlap),
            other => Err(format!("unknown completion policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineConfig {
    pub fees: FeeSchedule,
    pub completion: CompletionPolicy,
}

/// Deleting every booking is irreversible, so the API demands two explicit
/// confirmations. `confirm()` then `confirm_again()` is the only way to mint
/// the token `delete_all` accepts.
#[must_use = "a first confirmation does nothing until confirmed again"]
pub struct DeleteAllRequest(());

impl DeleteAllRequest {
    /// First confirmation.
    pub fn confirm() -> Self {
        Self(())
    }

    /// Second confirmation.
    pub fn confirm_again(self) -> DeleteAllConfirmed {
        DeleteAllConfirmed(())
    }
}

pub struct DeleteAllConfirmed(());

/// The booking lifecycle engine.
///
/// Owns the one place where bookings and the shared availability collection
/// are allowed to change together: create never reserves, accept is the
/// commit point that blocks the span, complete/delete restore it. All
/// validation is client-side and advisory; the store's write discipline is
/// last-writer-wins per date.
pub struct Engine {
    store: Arc<dyn DocumentStore>,
    availability: AvailabilityStore,
    notify: Arc<NotifyHub>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(store: Arc<dyn DocumentStore>, notify: Arc<NotifyHub>, config: EngineConfig) -> Self {
        let availability = AvailabilityStore::new(store.clone());
        Self {
            store,
            availability,
            notify,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn availability(&self) -> &AvailabilityStore {
        &self.availability
    }

    pub fn notify(&self) -> &Arc<NotifyHub> {
        &self.notify
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.config.fees
    }
}
