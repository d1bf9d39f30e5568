use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::dates;

/// Where a booking sits in its lifecycle. Deletion is a removal, not a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Completed => "completed",
        }
    }
}

/// One guest reservation, as stored in the `bookings` collection.
///
/// `check_in` is the first night; `check_out` is the departure day and is
/// never part of the reserved span (same-day turnover stays bookable).
/// All fee figures are integer pesos — nightly rate × nights and bed rate ×
/// beds are both exact, so there is no rounding anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub guest_name: String,
    pub email: String,
    pub phone: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub extra_beds: u32,
    pub room_fee_per_night: i64,
    pub extra_bed_fee_per_bed: i64,
    pub room_fee: i64,
    pub extra_bed_fee: i64,
    pub total_fee: i64,
    pub special_requests: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// The night-dates this booking covers: `[check_in, check_out)`.
    pub fn nights(&self) -> Vec<NaiveDate> {
        dates::enumerate_nights(self.check_in, self.check_out)
    }
}

/// What the guest form submits. Fees and status are computed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub guest_name: String,
    pub email: String,
    pub phone: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub extra_beds: u32,
    pub special_requests: Option<String>,
}

/// Per-night and per-bed rates. The defaults are the venue's published prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub room_fee_per_night: i64,
    pub extra_bed_fee_per_bed: i64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            room_fee_per_night: 3300,
            extra_bed_fee_per_bed: 300,
        }
    }
}

/// The only status an availability entry can carry. A date with no entry at
/// all is available — that default is what makes deletion a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    Unavailable,
}

/// One record in the `availability` collection, keyed by its ISO date string.
///
/// `booking_id` is a weak back-reference for attribution only; admin manual
/// blocks carry no booking at all and the engine must treat them the same.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityEntry {
    pub status: AvailabilityStatus,
    pub booking_id: Option<Ulid>,
    pub guest_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl AvailabilityEntry {
    pub fn for_booking(booking: &Booking, now: DateTime<Utc>) -> Self {
        Self {
            status: AvailabilityStatus::Unavailable,
            booking_id: Some(booking.id),
            guest_name: Some(booking.guest_name.clone()),
            updated_at: now,
        }
    }

    /// A manual admin block, not tied to any booking.
    pub fn manual_block(now: DateTime<Utc>) -> Self {
        Self {
            status: AvailabilityStatus::Unavailable,
            booking_id: None,
            guest_name: None,
            updated_at: now,
        }
    }
}

/// Point-in-time copy of the date → status mapping.
///
/// Each controller owns one and passes it by reference; it is never patched
/// incrementally from push updates, only replaced by a full reload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailabilitySnapshot {
    entries: BTreeMap<NaiveDate, AvailabilityEntry>,
}

impl AvailabilitySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: BTreeMap<NaiveDate, AvailabilityEntry>) -> Self {
        Self { entries }
    }

    /// Absent means available.
    pub fn is_available(&self, date: NaiveDate) -> bool {
        !self.entries.contains_key(&date)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&AvailabilityEntry> {
        self.entries.get(&date)
    }

    /// First date in `nights` that is blocked, if any. Checked per date so
    /// callers can tell the guest exactly which date collided.
    pub fn first_conflict(&self, nights: &[NaiveDate]) -> Option<NaiveDate> {
        nights.iter().copied().find(|d| !self.is_available(*d))
    }

    pub fn set_unavailable(&mut self, date: NaiveDate, entry: AvailabilityEntry) {
        self.entries.insert(date, entry);
    }

    pub fn set_available(&mut self, date: NaiveDate) {
        self.entries.remove(&date);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &AvailabilityEntry)> {
        self.entries.iter()
    }
}

/// Static catalog entry. `available` means "offered at all", nothing to do
/// with date-level availability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: Ulid,
    pub name: String,
    pub price_per_night: i64,
    pub max_guests: u32,
    pub available: bool,
    pub amenities: Vec<String>,
    pub description: String,
}

/// Singleton site configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub site_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub check_in_time: String,
    pub check_out_time: String,
}

/// What the notify hub broadcasts after each lifecycle transition or manual
/// calendar edit. Consumed by the admin alert path and the notification log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BookingEvent {
    Created {
        id: Ulid,
        guest_name: String,
        check_in: NaiveDate,
        check_out: NaiveDate,
        total_fee: i64,
    },
    Accepted {
        id: Ulid,
        guest_name: String,
        nights: usize,
    },
    Completed {
        id: Ulid,
        released: bool,
    },
    Deleted {
        id: Ulid,
    },
    DatesBlocked {
        dates: Vec<NaiveDate>,
    },
    DatesReleased {
        dates: Vec<NaiveDate>,
    },
}
