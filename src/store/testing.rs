//! Failure-injecting store wrapper for exercising partial-mutation and
//! retry paths. Test builds only.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use ulid::Ulid;

use crate::model::{AvailabilityEntry, AvailabilitySnapshot, Booking, BookingStatus, Room, Settings};

use super::{DocumentStore, MemoryStore, StoreError};

/// Wraps a [`MemoryStore`] and fails selected operations on demand.
#[derive(Default)]
pub(crate) struct FlakyStore {
    inner: MemoryStore,
    fail_put_dates: Mutex<HashSet<NaiveDate>>,
    fail_next_inserts: AtomicUsize,
}

impl FlakyStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every `put_availability` for `date` will fail until cleared.
    pub(crate) fn fail_puts_for(&self, date: NaiveDate) {
        self.fail_put_dates.lock().unwrap().insert(date);
    }

    /// The next `n` calls to `insert_booking` fail with `StoreError`.
    pub(crate) fn fail_next_inserts(&self, n: usize) {
        self.fail_next_inserts.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn load_availability(&self) -> Result<AvailabilitySnapshot, StoreError> {
        self.inner.load_availability().await
    }

    async fn put_availability(
        &self,
        date: NaiveDate,
        entry: AvailabilityEntry,
    ) -> Result<(), StoreError> {
        if self.fail_put_dates.lock().unwrap().contains(&date) {
            return Err(StoreError::Unavailable(format!("injected failure for {date}")));
        }
        self.inner.put_availability(date, entry).await
    }

    async fn delete_availability(&self, date: NaiveDate) -> Result<(), StoreError> {
        self.inner.delete_availability(date).await
    }

    async fn insert_booking(&self, booking: Booking) -> Result<(), StoreError> {
        let remaining = self.fail_next_inserts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next_inserts.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Unavailable("injected insert failure".into()));
        }
        self.inner.insert_booking(booking).await
    }

    async fn get_booking(&self, id: Ulid) -> Result<Option<Booking>, StoreError> {
        self.inner.get_booking(id).await
    }

    async fn set_booking_status(
        &self,
        id: Ulid,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.inner.set_booking_status(id, status, updated_at).await
    }

    async fn remove_booking(&self, id: Ulid) -> Result<Option<Booking>, StoreError> {
        self.inner.remove_booking(id).await
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        self.inner.list_bookings().await
    }

    async fn clear_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        self.inner.clear_bookings().await
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, StoreError> {
        self.inner.list_rooms().await
    }

    async fn upsert_room(&self, room: Room) -> Result<(), StoreError> {
        self.inner.upsert_room(room).await
    }

    async fn remove_room(&self, id: Ulid) -> Result<(), StoreError> {
        self.inner.remove_room(id).await
    }

    async fn get_settings(&self) -> Result<Option<Settings>, StoreError> {
        self.inner.get_settings().await
    }

    async fn put_settings(&self, settings: Settings) -> Result<(), StoreError> {
        self.inner.put_settings(settings).await
    }
}
