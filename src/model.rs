use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::clock::midnight_ms;

/// Unix milliseconds, used for creation timestamps and the clock.
pub type Ms = i64;

/// Half-open range of nights `[check_in, check_out)`.
///
/// The guest sleeps on `check_in` and leaves on `check_out`, so a stay ending
/// on the day another begins does not overlap it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stay {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl Stay {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        debug_assert!(check_in < check_out, "Stay check-in must be before check-out");
        Self { check_in, check_out }
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn overlaps(&self, other: &Stay) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    /// True if a guest occupies the room on the night of `day`.
    pub fn contains_night(&self, day: NaiveDate) -> bool {
        self.check_in <= day && day < self.check_out
    }

    /// The stay is over once check-out day (00:00 UTC) lies before `now`.
    pub fn has_ended(&self, now: Ms) -> bool {
        midnight_ms(self.check_out) < now
    }
}

impl fmt::Display for Stay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.check_in, self.check_out)
    }
}

// ── Catalog ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: Ulid,
    pub name: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub star_rating: u8,
    pub image_url: Option<String>,
    pub active: bool,
    pub created_at: Ms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Amenity {
    Wifi,
    AirConditioning,
    Television,
    Minibar,
    Balcony,
}

impl Amenity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Amenity::Wifi => "wifi",
            Amenity::AirConditioning => "air_conditioning",
            Amenity::Television => "television",
            Amenity::Minibar => "minibar",
            Amenity::Balcony => "balcony",
        }
    }
}

impl FromStr for Amenity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wifi" => Ok(Amenity::Wifi),
            "air_conditioning" | "ac" => Ok(Amenity::AirConditioning),
            "television" | "tv" => Ok(Amenity::Television),
            "minibar" => Ok(Amenity::Minibar),
            "balcony" => Ok(Amenity::Balcony),
            other => Err(format!("unknown amenity: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: Ulid,
    pub hotel_id: Ulid,
    pub room_type: String,
    pub description: String,
    pub price_per_night: Decimal,
    /// Maximum guests per unit.
    pub max_guests: u8,
    /// Interchangeable physical units of this room type. Bounds the number of
    /// simultaneously active bookings.
    pub total_rooms: u32,
    pub available: bool,
    pub amenities: Vec<Amenity>,
    pub created_at: Ms,
}

// ── Bookings ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Whether a booking in this status occupies a unit of inventory.
    pub fn holds_inventory(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    /// Pending → Confirmed | Cancelled; Confirmed → Completed | Cancelled.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestContact {
    pub full_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub room_id: Ulid,
    pub hotel_id: Ulid,
    pub user_id: String,
    pub stay: Stay,
    pub guests: u8,
    pub total_price: Decimal,
    pub guest: GuestContact,
    pub special_requests: Option<String>,
    pub status: BookingStatus,
    pub payment_ref: Option<String>,
    pub booked_at: Ms,
}

impl Booking {
    /// Completed either by the sweep or, between sweeps, by a confirmed stay
    /// whose check-out has passed.
    pub fn is_completed(&self, now: Ms) -> bool {
        match self.status {
            BookingStatus::Completed => true,
            BookingStatus::Confirmed => self.stay.has_ended(now),
            _ => false,
        }
    }

    /// Status as reads report it: a confirmed stay that has ended reads as
    /// completed before the sweep persists it.
    pub fn effective_status(&self, now: Ms) -> BookingStatus {
        if self.is_completed(now) {
            BookingStatus::Completed
        } else {
            self.status
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: Ulid,
    pub hotel_id: Ulid,
    pub user_id: String,
    pub rating: u8,
    pub title: String,
    pub comment: String,
    pub created_at: Ms,
}

// ── Per-room state ───────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RoomState {
    pub room: Room,
    /// Every booking ever made for this room, sorted by `stay.check_in`.
    pub bookings: Vec<Booking>,
    /// Set once the room is deleted; waiters on the lock must not write.
    pub retired: bool,
}

impl RoomState {
    pub fn new(room: Room) -> Self {
        Self {
            room,
            bookings: Vec::new(),
            retired: false,
        }
    }

    /// Insert booking maintaining sort order by check-in.
    pub fn insert_booking(&mut self, booking: Booking) {
        let pos = self
            .bookings
            .partition_point(|b| b.stay.check_in <= booking.stay.check_in);
        self.bookings.insert(pos, booking);
    }

    pub fn remove_booking(&mut self, id: Ulid) -> Option<Booking> {
        let pos = self.bookings.iter().position(|b| b.id == id)?;
        Some(self.bookings.remove(pos))
    }

    pub fn booking(&self, id: Ulid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    pub fn booking_mut(&mut self, id: Ulid) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|b| b.id == id)
    }

    /// Bookings of any status whose stay overlaps `stay`.
    /// Binary search skips everything checking in on or after `stay.check_out`.
    pub fn overlapping(&self, stay: &Stay) -> impl Iterator<Item = &Booking> {
        let right_bound = self
            .bookings
            .partition_point(|b| b.stay.check_in < stay.check_out);
        let check_in = stay.check_in;
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.stay.check_out > check_in)
    }
}

/// The event types. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    HotelCreated {
        hotel: Hotel,
    },
    HotelUpdated {
        hotel: Hotel,
    },
    /// Removes the hotel together with its rooms and reviews.
    HotelDeleted {
        id: Ulid,
    },
    RoomCreated {
        room: Room,
    },
    RoomUpdated {
        room: Room,
    },
    RoomDeleted {
        id: Ulid,
        hotel_id: Ulid,
    },
    BookingPlaced {
        booking: Booking,
    },
    BookingStatusChanged {
        id: Ulid,
        room_id: Ulid,
        status: BookingStatus,
        payment_ref: Option<String>,
    },
    /// Admission rolled back (payment failed or never completed).
    BookingRemoved {
        id: Ulid,
        room_id: Ulid,
    },
    ReviewPosted {
        review: Review,
    },
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct HotelSummary {
    pub hotel: Hotel,
    pub room_count: usize,
    pub min_price: Option<Decimal>,
    /// 0 when the hotel has no reviews.
    pub average_rating: f64,
    pub review_count: usize,
}

/// Accepted outcome of an availability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub room_id: Ulid,
    pub stay: Stay,
    pub nights: i64,
    pub total_price: Decimal,
    /// Units still free over the whole stay after this booking is counted out.
    pub remaining: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewEligibility {
    Eligible,
    NoCompletedStay,
    AlreadyReviewed,
}

impl ReviewEligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, ReviewEligibility::Eligible)
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self {
            ReviewEligibility::Eligible => None,
            ReviewEligibility::NoCompletedStay => {
                Some("reviews require a completed stay at this hotel")
            }
            ReviewEligibility::AlreadyReviewed => Some("hotel already reviewed"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dashboard {
    pub hotels: usize,
    pub rooms: usize,
    pub bookings: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub cancelled: usize,
    pub completed: usize,
}
