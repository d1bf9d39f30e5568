//! Guest-facing booking form controller: date picking against a snapshot,
//! a live fee summary, and submission through the engine.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::calendar::{DayState, day_state};
use crate::dates;
use crate::engine::{Engine, EngineError};
use crate::model::{Booking, BookingRequest};

/// Whether `submit` trusts the snapshot loaded when the form opened or
/// re-reads availability first.
///
/// Validating against the cached snapshot lets a request through when the
/// dates were blocked after the form opened. The fresh recheck narrows that
/// window at the cost of one extra read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RevalidatePolicy {
    #[default]
    CachedSnapshot,
    FreshSnapshot,
}

/// The contact half of the form. Dates are selected separately.
#[derive(Debug, Clone, PartialEq)]
pub struct GuestDetails {
    pub guest_name: String,
    pub email: String,
    pub phone: String,
    pub guests: u32,
    pub extra_beds: u32,
    pub special_requests: Option<String>,
}

/// What the fee panel shows before the guest submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingSummary {
    pub nights: i64,
    pub room_fee: i64,
    pub extra_bed_fee: i64,
    pub total_fee: i64,
}

/// One guest's form session.
pub struct BookingForm {
    engine: Arc<Engine>,
    snapshot: crate::model::AvailabilitySnapshot,
    today: NaiveDate,
    policy: RevalidatePolicy,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
}

impl BookingForm {
    pub async fn open(
        engine: Arc<Engine>,
        today: NaiveDate,
        policy: RevalidatePolicy,
    ) -> Result<Self, EngineError> {
        let snapshot = engine.load_snapshot().await?;
        Ok(Self {
            engine,
            snapshot,
            today,
            policy,
            check_in: None,
            check_out: None,
        })
    }

    pub fn day_state(&self, date: NaiveDate) -> DayState {
        day_state(date, &self.snapshot, self.today)
    }

    pub fn check_in(&self) -> Option<NaiveDate> {
        self.check_in
    }

    pub fn check_out(&self) -> Option<NaiveDate> {
        self.check_out
    }

    /// Earliest selectable checkout for the current check-in: the next day.
    pub fn checkout_min(&self) -> Option<NaiveDate> {
        self.check_in.and_then(|d| d.succ_opt())
    }

    /// Pick a check-in date. Past or blocked dates are rejected; a checkout
    /// at or before the new minimum is cleared rather than kept invalid.
    pub fn select_check_in(&mut self, date: NaiveDate) -> Result<(), EngineError> {
        match self.day_state(date) {
            DayState::Past => {
                return Err(crate::engine::ValidationError::DateInPast(date).into());
            }
            DayState::Unavailable => {
                return Err(crate::engine::ValidationError::DateUnavailable(date).into());
            }
            DayState::Available => {}
        }
        self.check_in = Some(date);
        if let Some(out) = self.check_out {
            if out <= date {
                self.check_out = None;
            }
        }
        Ok(())
    }

    /// Pick a checkout date. The whole night span is walked so the error
    /// names the first blocked date inside it, and a blocked checkout date
    /// is itself rejected; departing onto another booking's checkout day
    /// (no entry) is fine.
    pub fn select_check_out(&mut self, date: NaiveDate) -> Result<(), EngineError> {
        let check_in = self
            .check_in
            .ok_or(EngineError::Validation(
                crate::engine::ValidationError::MissingField("check-in date"),
            ))?;
        if dates::duration_nights(check_in, date).is_none() {
            return Err(crate::engine::ValidationError::InvalidDateRange {
                check_in,
                check_out: date,
            }
            .into());
        }
        let nights = dates::enumerate_nights(check_in, date);
        if let Some(conflict) = self.snapshot.first_conflict(&nights) {
            return Err(crate::engine::ValidationError::DateUnavailable(conflict).into());
        }
        if !self.snapshot.is_available(date) {
            return Err(crate::engine::ValidationError::DateUnavailable(date).into());
        }
        self.check_out = Some(date);
        Ok(())
    }

    /// Live fee figures for the current date pair, or `None` until both
    /// dates are picked.
    pub fn summary(&self, extra_beds: u32) -> Option<BookingSummary> {
        let check_in = self.check_in?;
        let check_out = self.check_out?;
        let nights = dates::duration_nights(check_in, check_out)?;
        let fees = self.engine.fees();
        let room_fee = nights * fees.room_fee_per_night;
        let extra_bed_fee = i64::from(extra_beds) * fees.extra_bed_fee_per_bed;
        Some(BookingSummary {
            nights,
            room_fee,
            extra_bed_fee,
            total_fee: room_fee + extra_bed_fee,
        })
    }

    /// Submit the form. Under [`RevalidatePolicy::FreshSnapshot`] the
    /// availability collection is re-read first, so an edit made since the
    /// form opened is caught here instead of slipping through. The selection
    /// resets on success.
    pub async fn submit(&mut self, details: GuestDetails) -> Result<Booking, EngineError> {
        let check_in = self.check_in.ok_or(EngineError::Validation(
            crate::engine::ValidationError::MissingField("check-in date"),
        ))?;
        let check_out = self.check_out.ok_or(EngineError::Validation(
            crate::engine::ValidationError::MissingField("check-out date"),
        ))?;

        if self.policy == RevalidatePolicy::FreshSnapshot {
            self.snapshot = self.engine.load_snapshot().await?;
        }

        let request = BookingRequest {
            guest_name: details.guest_name,
            email: details.email,
            phone: details.phone,
            check_in,
            check_out,
            guests: details.guests,
            extra_beds: details.extra_beds,
            special_requests: details.special_requests,
        };
        let booking = self.engine.create(request, &self.snapshot).await?;
        self.check_in = None;
        self.check_out = None;
        Ok(booking)
    }

    /// Submit, retrying a bounded number of times on store unavailability.
    /// Validation failures are never retried.
    pub async fn submit_with_retry(
        &mut self,
        details: GuestDetails,
        attempts: u32,
        delay: Duration,
    ) -> Result<Booking, EngineError> {
        let attempts = attempts.max(1);
        let mut last = None;
        for attempt in 1..=attempts {
            match self.submit(details.clone()).await {
                Ok(booking) => return Ok(booking),
                Err(EngineError::Store(e)) => {
                    tracing::warn!("submit attempt {attempt} failed: {e}");
                    last = Some(EngineError::Store(e));
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(last.unwrap_or(EngineError::Store(crate::store::StoreError::Unavailable(
            "no submit attempts made".into(),
        ))))
    }
}
