use ulid::Ulid;

use crate::model::BookingStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    NotFound(Ulid),
    AlreadyExists(Ulid),
    Forbidden(&'static str),
    /// Malformed or out-of-range field.
    Invalid(String),
    CheckInPast,
    CheckOutNotAfterCheckIn,
    CardExpired,
    /// Overlapping live bookings reach the room's `total_rooms`.
    RoomUnavailable(Ulid),
    /// Room switched off or hotel deactivated.
    NotBookable(Ulid),
    AlreadyCancelled(Ulid),
    StayStarted(Ulid),
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    NotEligibleForReview(&'static str),
    AlreadyReviewed(Ulid),
    HasBookings(Ulid),
    LimitExceeded(&'static str),
    PaymentDeclined(String),
    WalError(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            EngineError::Forbidden(msg) => write!(f, "forbidden: {msg}"),
            EngineError::Invalid(msg) => write!(f, "invalid: {msg}"),
            EngineError::CheckInPast => write!(f, "check-in in the past"),
            EngineError::CheckOutNotAfterCheckIn => {
                write!(f, "check-out must be after check-in")
            }
            EngineError::CardExpired => write!(f, "card has expired"),
            EngineError::RoomUnavailable(_) => {
                write!(f, "room not available for selected dates")
            }
            EngineError::NotBookable(id) => write!(f, "room {id} is not open for booking"),
            EngineError::AlreadyCancelled(id) => write!(f, "booking {id} already cancelled"),
            EngineError::StayStarted(id) => {
                write!(f, "booking {id}: cannot cancel a stay that has started or passed")
            }
            EngineError::InvalidTransition { from, to } => {
                write!(f, "invalid status transition: {from} -> {to}")
            }
            EngineError::NotEligibleForReview(reason) => write!(f, "cannot review: {reason}"),
            EngineError::AlreadyReviewed(hotel) => write!(f, "hotel {hotel} already reviewed"),
            EngineError::HasBookings(id) => {
                write!(f, "cannot delete {id}: bookings reference it")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::PaymentDeclined(msg) => write!(f, "payment declined: {msg}"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
