mod fs;
mod memory;
#[cfg(test)]
pub(crate) mod testing;

pub use fs::JsonStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ulid::Ulid;

use crate::model::{AvailabilityEntry, AvailabilitySnapshot, Booking, BookingStatus, Room, Settings};

/// The external document store failed a read or write — network, permission,
/// quota. Callers surface this as a retry-or-refresh message; nothing here is
/// retried automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(reason) => write!(f, "store unavailable: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// The read/write contract the core needs from the backend-as-a-service.
///
/// Four collections: `bookings`, `availability` (keyed by ISO date string),
/// `rooms`, and the `settings` singleton. Implementations are injected as
/// `Arc<dyn DocumentStore>`; the core never polls for an SDK to appear.
///
/// Per-date availability writes are idempotent and last-writer-wins; there is
/// no cross-document transaction (see the adapter for the fan-out discipline).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ── availability collection ──────────────────────────────────

    /// Read every availability entry. O(collection size), no pagination.
    async fn load_availability(&self) -> Result<AvailabilitySnapshot, StoreError>;

    /// Upsert the entry for one date.
    async fn put_availability(
        &self,
        date: NaiveDate,
        entry: AvailabilityEntry,
    ) -> Result<(), StoreError>;

    /// Delete the entry for one date. Deleting an absent date is not an error.
    async fn delete_availability(&self, date: NaiveDate) -> Result<(), StoreError>;

    // ── bookings collection ──────────────────────────────────────

    async fn insert_booking(&self, booking: Booking) -> Result<(), StoreError>;

    async fn get_booking(&self, id: Ulid) -> Result<Option<Booking>, StoreError>;

    async fn set_booking_status(
        &self,
        id: Ulid,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Remove one booking, returning the removed record if it existed.
    async fn remove_booking(&self, id: Ulid) -> Result<Option<Booking>, StoreError>;

    async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError>;

    /// Remove every booking, returning the removed records.
    async fn clear_bookings(&self) -> Result<Vec<Booking>, StoreError>;

    // ── rooms catalog ────────────────────────────────────────────

    async fn list_rooms(&self) -> Result<Vec<Room>, StoreError>;

    async fn upsert_room(&self, room: Room) -> Result<(), StoreError>;

    async fn remove_room(&self, id: Ulid) -> Result<(), StoreError>;

    // ── settings singleton ───────────────────────────────────────

    async fn get_settings(&self) -> Result<Option<Settings>, StoreError>;

    async fn put_settings(&self, settings: Settings) -> Result<(), StoreError>;
}
