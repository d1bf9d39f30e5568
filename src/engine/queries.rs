use chrono::{DateTime, Utc};
use ulid::Ulid;

use crate::availability::AvailabilityError;
use crate::model::{AvailabilitySnapshot, Booking, BookingStatus};

use super::{Engine, EngineError};

/// Admin listing filter. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub since: Option<DateTime<Utc>>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        if let Some(status) = self.status {
            if booking.status != status {
                return false;
            }
        }
        if let Some(since) = self.since {
            if booking.created_at < since {
                return false;
            }
        }
        true
    }
}

impl Engine {
    pub async fn get(&self, id: Ulid) -> Result<Booking, EngineError> {
        self.store
            .get_booking(id)
            .await?
            .ok_or(EngineError::NotFound(id))
    }

    /// All bookings, newest first.
    pub async fn list_bookings(&self) -> Result<Vec<Booking>, EngineError> {
        let mut bookings = self.store.list_bookings().await?;
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    pub async fn list_filtered(&self, filter: BookingFilter) -> Result<Vec<Booking>, EngineError> {
        let mut bookings = self.list_bookings().await?;
        bookings.retain(|b| filter.matches(b));
        Ok(bookings)
    }

    /// Fresh full read of the availability collection.
    pub async fn load_snapshot(&self) -> Result<AvailabilitySnapshot, EngineError> {
        self.availability.load_all().await.map_err(|e| match e {
            AvailabilityError::Store(e) => EngineError::Store(e),
            AvailabilityError::Partial { failed } => EngineError::PartialMutation {
                action: "load",
                failed,
            },
        })
    }
}
