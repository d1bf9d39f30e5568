//! Lifecycle transitions. Each one writes the booking record first and the
//! shared availability collection second; a fan-out failure after the status
//! write surfaces as a partial-mutation error rather than rolling back.

use chrono::Utc;
use ulid::Ulid;

use crate::availability::Attribution;
use crate::model::{Booking, BookingEvent, BookingRequest, BookingStatus};
use crate::observability;

use super::validate;
use super::{CompletionPolicy, DeleteAllConfirmed, Engine, EngineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    Accepted,
    /// The booking was already accepted; nothing was written.
    AlreadyAccepted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompleteOutcome {
    /// Whether the span was restored to available. False only under
    /// [`CompletionPolicy::KeepWhilePendingOverlap`] with a live overlap.
    pub released: bool,
}

/// What a bulk delete actually did. `failed_dates` are availability entries
/// that could not be restored; the bookings themselves are always cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteAllReport {
    pub deleted: usize,
    pub failed_dates: Vec<chrono::NaiveDate>,
}

impl Engine {
    /// Create a pending booking from a validated request.
    ///
    /// Validation runs against the snapshot the caller holds, so this is an
    /// advisory check only; the authoritative reservation happens at accept.
    /// No availability entries are written here.
    pub async fn create(
        &self,
        req: BookingRequest,
        snapshot: &crate::model::AvailabilitySnapshot,
    ) -> Result<Booking, EngineError> {
        let nights = validate::validate_request(&req, snapshot).inspect_err(|e| {
            metrics::counter!(observability::VALIDATION_FAILURES_TOTAL).increment(1);
            tracing::debug!("booking request rejected: {e}");
        })?;

        let fees = validate::compute_fees(nights.len() as i64, req.extra_beds, self.fees());
        let now = Utc::now();
        let booking = Booking {
            id: Ulid::new(),
            guest_name: req.guest_name,
            email: req.email,
            phone: req.phone,
            check_in: req.check_in,
            check_out: req.check_out,
            guests: req.guests,
            extra_beds: req.extra_beds,
            room_fee_per_night: self.fees().room_fee_per_night,
            extra_bed_fee_per_bed: self.fees().extra_bed_fee_per_bed,
            room_fee: fees.room_fee,
            extra_bed_fee: fees.extra_bed_fee,
            total_fee: fees.total_fee,
            special_requests: req.special_requests,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_booking(booking.clone()).await?;
        metrics::counter!(observability::BOOKINGS_CREATED_TOTAL).increment(1);
        tracing::info!(
            id = %booking.id,
            guest = %booking.guest_name,
            check_in = %booking.check_in,
            check_out = %booking.check_out,
            total_fee = booking.total_fee,
            "booking created"
        );
        self.notify.send(BookingEvent::Created {
            id: booking.id,
            guest_name: booking.guest_name.clone(),
            check_in: booking.check_in,
            check_out: booking.check_out,
            total_fee: booking.total_fee,
        });
        Ok(booking)
    }

    /// Accept a pending booking. This is the commit point: the booking's
    /// span is written unavailable, attributed to the booking. Accepting an
    /// already-accepted booking is reported, not retried.
    pub async fn accept(&self, id: Ulid) -> Result<AcceptOutcome, EngineError> {
        let booking = self
            .store
            .get_booking(id)
            .await?
            .ok_or(EngineError::NotFound(id))?;
        if booking.status == BookingStatus::Accepted {
            return Ok(AcceptOutcome::AlreadyAccepted);
        }

        self.store
            .set_booking_status(id, BookingStatus::Accepted, Utc::now())
            .await?;

        let nights = booking.nights();
        self.availability
            .mark_unavailable(&nights, Attribution::booking(booking.id, &booking.guest_name))
            .await
            .map_err(|e| EngineError::from_availability("accept", e))?;

        metrics::counter!(observability::BOOKINGS_ACCEPTED_TOTAL).increment(1);
        tracing::info!(id = %id, nights = nights.len(), "booking accepted");
        self.notify.send(BookingEvent::Accepted {
            id,
            guest_name: booking.guest_name,
            nights: nights.len(),
        });
        Ok(AcceptOutcome::Accepted)
    }

    /// Mark a booking completed and, policy permitting, restore its span.
    pub async fn complete(&self, id: Ulid) -> Result<CompleteOutcome, EngineError> {
        let booking = self
            .store
            .get_booking(id)
            .await?
            .ok_or(EngineError::NotFound(id))?;
        let was_accepted = booking.status == BookingStatus::Accepted;

        self.store
            .set_booking_status(id, BookingStatus::Completed, Utc::now())
            .await?;

        let released = if was_accepted {
            let nights = booking.nights();
            let keep = match self.config.completion {
                CompletionPolicy::AlwaysRelease => Vec::new(),
                CompletionPolicy::KeepWhilePendingOverlap => {
                    self.pending_overlap(&nights).await?
                }
            };
            let release: Vec<_> = nights
                .iter()
                .copied()
                .filter(|d| !keep.contains(d))
                .collect();
            self.availability
                .mark_available(&release)
                .await
                .map_err(|e| EngineError::from_availability("complete", e))?;
            !release.is_empty() || nights.is_empty()
        } else {
            false
        };

        metrics::counter!(observability::BOOKINGS_COMPLETED_TOTAL).increment(1);
        tracing::info!(id = %id, released, "booking completed");
        self.notify.send(BookingEvent::Completed { id, released });
        Ok(CompleteOutcome { released })
    }

    /// Remove a booking entirely. An accepted booking has its span restored
    /// first, then the record is removed; for any other status the record
    /// just goes away.
    pub async fn delete(&self, id: Ulid) -> Result<(), EngineError> {
        let booking = self
            .store
            .get_booking(id)
            .await?
            .ok_or(EngineError::NotFound(id))?;

        if booking.status == BookingStatus::Accepted {
            self.availability
                .mark_available(&booking.nights())
                .await
                .map_err(|e| EngineError::from_availability("delete", e))?;
        }
        self.store.remove_booking(id).await?;

        metrics::counter!(observability::BOOKINGS_DELETED_TOTAL).increment(1);
        tracing::info!(id = %id, "booking deleted");
        self.notify.send(BookingEvent::Deleted { id });
        Ok(())
    }

    /// Remove every booking, restoring the spans of accepted ones. Manual
    /// admin blocks are untouched. Restoration failures are collected, not
    /// fatal: the report names the dates whose entries survived.
    pub async fn delete_all(&self, _token: DeleteAllConfirmed) -> Result<DeleteAllReport, EngineError> {
        let bookings = self.store.list_bookings().await?;
        let mut failed_dates = Vec::new();

        for booking in &bookings {
            if booking.status != BookingStatus::Accepted {
                continue;
            }
            if let Err(e) = self.availability.mark_available(&booking.nights()).await {
                tracing::warn!(id = %booking.id, "failed to restore span during bulk delete: {e}");
                match e {
                    crate::availability::AvailabilityError::Partial { failed } => {
                        failed_dates.extend(failed);
                    }
                    crate::availability::AvailabilityError::Store(_) => {
                        failed_dates.extend(booking.nights());
                    }
                }
            }
        }

        let removed = self.store.clear_bookings().await?;
        let deleted = removed.len();
        metrics::counter!(observability::BOOKINGS_DELETED_TOTAL).increment(deleted as u64);
        tracing::info!(deleted, restore_failures = failed_dates.len(), "all bookings deleted");
        for booking in &removed {
            self.notify.send(BookingEvent::Deleted { id: booking.id });
        }
        Ok(DeleteAllReport {
            deleted,
            failed_dates,
        })
    }

    /// Dates in `nights` that some other pending booking still wants.
    async fn pending_overlap(
        &self,
        nights: &[chrono::NaiveDate],
    ) -> Result<Vec<chrono::NaiveDate>, EngineError> {
        let bookings = self.store.list_bookings().await?;
        let mut keep = Vec::new();
        for other in bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Pending)
        {
            for date in other.nights() {
                if nights.contains(&date) && !keep.contains(&date) {
                    keep.push(date);
                }
            }
        }
        Ok(keep)
    }
}
