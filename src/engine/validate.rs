use chrono::NaiveDate;

use crate::dates;
use crate::model::{AvailabilitySnapshot, BookingRequest, FeeSchedule};

use super::ValidationError;

pub(super) struct FeeBreakdown {
    pub room_fee: i64,
    pub extra_bed_fee: i64,
    pub total_fee: i64,
}

/// Exact integer arithmetic: nightly rate × nights plus bed rate × beds.
pub(super) fn compute_fees(nights: i64, extra_beds: u32, fees: &FeeSchedule) -> FeeBreakdown {
    let room_fee = nights * fees.room_fee_per_night;
    let extra_bed_fee = i64::from(extra_beds) * fees.extra_bed_fee_per_bed;
    FeeBreakdown {
        room_fee,
        extra_bed_fee,
        total_fee: room_fee + extra_bed_fee,
    }
}

pub(super) fn validate_email(email: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidEmail(email.to_string());
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(invalid());
    }
    if email.chars().any(char::is_whitespace) || domain.contains('@') {
        return Err(invalid());
    }
    Ok(())
}

pub(super) fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')');
    if phone.len() < 10 || !phone.chars().all(allowed) {
        return Err(ValidationError::InvalidPhone(phone.to_string()));
    }
    Ok(())
}

/// Check a request against the caller's snapshot and return the night span
/// it would reserve. The span is checked one date at a time so the error
/// names exactly which date collided. The checkout date is never part of the
/// reserved span, but a blocked checkout date still rejects the request;
/// only an *absent* checkout entry (same-day turnover on another booking's
/// departure) passes.
pub(super) fn validate_request(
    req: &BookingRequest,
    snapshot: &AvailabilitySnapshot,
) -> Result<Vec<NaiveDate>, ValidationError> {
    if req.guest_name.trim().is_empty() {
        return Err(ValidationError::MissingField("guest name"));
    }
    validate_email(&req.email)?;
    validate_phone(&req.phone)?;
    if req.guests == 0 {
        return Err(ValidationError::NoGuests);
    }
    if dates::duration_nights(req.check_in, req.check_out).is_none() {
        return Err(ValidationError::InvalidDateRange {
            check_in: req.check_in,
            check_out: req.check_out,
        });
    }

    let nights = dates::enumerate_nights(req.check_in, req.check_out);
    if let Some(conflict) = snapshot.first_conflict(&nights) {
        return Err(ValidationError::DateUnavailable(conflict));
    }
    if !snapshot.is_available(req.check_out) {
        return Err(ValidationError::DateUnavailable(req.check_out));
    }
    Ok(nights)
}
