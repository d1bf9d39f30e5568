use chrono::NaiveDate;
use ulid::Ulid;

use crate::availability::AvailabilityError;
use crate::store::StoreError;

/// A booking request that fails local invariants. Each variant carries
/// enough to tell the guest exactly what to fix — in particular which date
/// collided, when one did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingField(&'static str),
    InvalidDateRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    DateInPast(NaiveDate),
    DateUnavailable(NaiveDate),
    NoGuests,
    InvalidEmail(String),
    InvalidPhone(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingField(field) => write!(f, "{field} is required"),
            ValidationError::InvalidDateRange { check_in, check_out } => {
                write!(f, "check-out {check_out} must be after check-in {check_in}")
            }
            ValidationError::DateInPast(date) => write!(f, "{date} is in the past"),
            ValidationError::DateUnavailable(date) => {
                write!(f, "{date} is not available, please choose different dates")
            }
            ValidationError::NoGuests => write!(f, "at least one guest is required"),
            ValidationError::InvalidEmail(email) => write!(f, "invalid email address: {email}"),
            ValidationError::InvalidPhone(phone) => write!(f, "invalid phone number: {phone}"),
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    Validation(ValidationError),
    NotFound(Ulid),
    Store(StoreError),
    /// A multi-date fan-out landed partially. Successful writes stay; the
    /// named dates did not get written and the snapshot is stale until the
    /// next full reload.
    PartialMutation {
        action: &'static str,
        failed: Vec<NaiveDate>,
    },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation(e) => write!(f, "validation failed: {e}"),
            EngineError::NotFound(id) => write!(f, "booking not found: {id}"),
            EngineError::Store(e) => write!(f, "{e}"),
            EngineError::PartialMutation { action, failed } => {
                write!(f, "{action} partially failed for dates: ")?;
                for (i, d) in failed.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{d}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<ValidationError> for EngineError {
    fn from(e: ValidationError) -> Self {
        EngineError::Validation(e)
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        EngineError::Store(e)
    }
}

impl EngineError {
    /// Attach the failing lifecycle action to an adapter error.
    pub(crate) fn from_availability(action: &'static str, e: AvailabilityError) -> Self {
        match e {
            AvailabilityError::Store(e) => EngineError::Store(e),
            AvailabilityError::Partial { failed } => EngineError::PartialMutation { action, failed },
        }
    }
}
