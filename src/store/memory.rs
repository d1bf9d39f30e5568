use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use ulid::Ulid;

use crate::model::{AvailabilityEntry, AvailabilitySnapshot, Booking, BookingStatus, Room, Settings};

use super::{DocumentStore, StoreError};

/// In-memory document store. The substrate of [`super::JsonStore`] and the
/// backend every test runs against.
#[derive(Default)]
pub struct MemoryStore {
    availability: DashMap<NaiveDate, AvailabilityEntry>,
    bookings: DashMap<Ulid, Booking>,
    rooms: DashMap<Ulid, Room>,
    settings: RwLock<Option<Settings>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn availability_entries(&self) -> BTreeMap<NaiveDate, AvailabilityEntry> {
        self.availability
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect()
    }

    pub(super) fn booking_records(&self) -> Vec<Booking> {
        self.bookings.iter().map(|b| b.value().clone()).collect()
    }

    pub(super) fn room_records(&self) -> Vec<Room> {
        self.rooms.iter().map(|r| r.value().clone()).collect()
    }

    pub(super) fn settings_value(&self) -> Option<Settings> {
        self.settings.read().expect("settings lock").clone()
    }

    pub(super) fn seed_availability(&self, entries: BTreeMap<NaiveDate, AvailabilityEntry>) {
        for (date, entry) in entries {
            self.availability.insert(date, entry);
        }
    }

    pub(super) fn seed_bookings(&self, bookings: Vec<Booking>) {
        for b in bookings {
            self.bookings.insert(b.id, b);
        }
    }

    pub(super) fn seed_rooms(&self, rooms: Vec<Room>) {
        for r in rooms {
            self.rooms.insert(r.id, r);
        }
    }

    pub(super) fn seed_settings(&self, settings: Settings) {
        *self.settings.write().expect("settings lock") = Some(settings);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load_availability(&self) -> Result<AvailabilitySnapshot, StoreError> {
        Ok(AvailabilitySnapshot::from_entries(self.availability_entries()))
    }

    async fn put_availability(
        &self,
        date: NaiveDate,
        entry: AvailabilityEntry,
    ) -> Result<(), StoreError> {
        self.availability.insert(date, entry);
        Ok(())
    }

    async fn delete_availability(&self, date: NaiveDate) -> Result<(), StoreError> {
        self.availability.remove(&date);
        Ok(())
    }

    async fn insert_booking(&self, booking: Booking) -> Result<(), StoreError> {
        self.bookings.insert(booking.id, booking);
        Ok(())
    }

    async fn get_booking(&self, id: Ulid) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings.get(&id).map(|b| b.value().clone()))
    }

    async fn set_booking_status(
        &self,
        id: Ulid,
        status: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        match self.bookings.get_mut(&id) {
            Some(mut b) => {
                b.status = status;
                b.updated_at = updated_at;
                Ok(())
            }
            None => Err(StoreError::Unavailable(format!("booking {id} not in store"))),
        }
    }

    async fn remove_booking(&self, id: Ulid) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings.remove(&id).map(|(_, b)| b))
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        Ok(self.bookings.iter().map(|b| b.value().clone()).collect())
    }

    async fn clear_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        let ids: Vec<Ulid> = self.bookings.iter().map(|b| *b.key()).collect();
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some((_, b)) = self.bookings.remove(&id) {
                removed.push(b);
            }
        }
        Ok(removed)
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, StoreError> {
        Ok(self.rooms.iter().map(|r| r.value().clone()).collect())
    }

    async fn upsert_room(&self, room: Room) -> Result<(), StoreError> {
        self.rooms.insert(room.id, room);
        Ok(())
    }

    async fn remove_room(&self, id: Ulid) -> Result<(), StoreError> {
        self.rooms.remove(&id);
        Ok(())
    }

    async fn get_settings(&self) -> Result<Option<Settings>, StoreError> {
        Ok(self.settings.read().expect("settings lock").clone())
    }

    async fn put_settings(&self, settings: Settings) -> Result<(), StoreError> {
        *self.settings.write().expect("settings lock") = Some(settings);
        Ok(())
    }
}
