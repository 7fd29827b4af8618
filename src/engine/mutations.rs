use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::auth::Actor;
use crate::limits::*;
use crate::model::*;
use crate::observability;
use crate::payment::{CardExpiryError, validate_card_expiry};

use super::admission::{check_availability, check_cancellable};
use super::{Engine, EngineError, WalCommand};

#[derive(Debug, Clone, PartialEq)]
pub struct HotelDraft {
    pub id: Ulid,
    pub name: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub star_rating: u8,
    pub image_url: Option<String>,
}

/// Partial hotel update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotelPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub star_rating: Option<u8>,
    pub image_url: Option<Option<String>>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomDraft {
    pub id: Ulid,
    pub hotel_id: Ulid,
    pub room_type: String,
    pub description: String,
    pub price_per_night: Decimal,
    pub max_guests: u8,
    pub total_rooms: u32,
    pub amenities: Vec<Amenity>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomPatch {
    pub room_type: Option<String>,
    pub description: Option<String>,
    pub price_per_night: Option<Decimal>,
    pub max_guests: Option<u8>,
    pub total_rooms: Option<u32>,
    pub available: Option<bool>,
    pub amenities: Option<Vec<Amenity>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub id: Ulid,
    pub room_id: Ulid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u8,
    pub guest: GuestContact,
    pub special_requests: Option<String>,
    /// `MM/YY`. Checked before admission when present.
    pub card_expiry: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDraft {
    pub id: Ulid,
    pub hotel_id: Ulid,
    pub rating: u8,
    pub title: String,
    pub comment: String,
}

// ── Field validation ─────────────────────────────────────

fn required(field: &str, value: &str, max: usize) -> Result<(), EngineError> {
    if value.trim().is_empty() {
        return Err(EngineError::Invalid(format!("{field} is required")));
    }
    optional(field, value, max)
}

fn optional(field: &str, value: &str, max: usize) -> Result<(), EngineError> {
    if value.chars().count() > max {
        return Err(EngineError::Invalid(format!(
            "{field} longer than {max} characters"
        )));
    }
    Ok(())
}

fn require_admin(actor: &Actor) -> Result<(), EngineError> {
    if actor.admin {
        Ok(())
    } else {
        Err(EngineError::Forbidden("admin role required"))
    }
}

fn validate_hotel(h: &Hotel) -> Result<(), EngineError> {
    required("name", &h.name, MAX_HOTEL_NAME_LEN)?;
    optional("description", &h.description, MAX_HOTEL_DESCRIPTION_LEN)?;
    required("address", &h.address, MAX_ADDRESS_LEN)?;
    required("city", &h.city, MAX_CITY_LEN)?;
    required("country", &h.country, MAX_COUNTRY_LEN)?;
    if !(MIN_STAR_RATING..=MAX_STAR_RATING).contains(&h.star_rating) {
        return Err(EngineError::Invalid(format!(
            "star_rating must be between {MIN_STAR_RATING} and {MAX_STAR_RATING}"
        )));
    }
    if let Some(url) = &h.image_url {
        optional("image_url", url, MAX_IMAGE_URL_LEN)?;
    }
    Ok(())
}

fn validate_room(r: &Room) -> Result<(), EngineError> {
    required("room_type", &r.room_type, MAX_ROOM_TYPE_LEN)?;
    optional("description", &r.description, MAX_ROOM_DESCRIPTION_LEN)?;
    let min = Decimal::new(MIN_PRICE_CENTS, 2);
    let max = Decimal::new(MAX_PRICE_CENTS, 2);
    if r.price_per_night < min || r.price_per_night > max {
        return Err(EngineError::Invalid(format!(
            "price_per_night must be between {min} and {max}"
        )));
    }
    if r.price_per_night != r.price_per_night.round_dp(2) {
        return Err(EngineError::Invalid(
            "price_per_night has more than two decimal places".into(),
        ));
    }
    if !(1..=MAX_OCCUPANCY).contains(&r.max_guests) {
        return Err(EngineError::Invalid(format!(
            "max_guests must be between 1 and {MAX_OCCUPANCY}"
        )));
    }
    if !(1..=MAX_TOTAL_ROOMS).contains(&r.total_rooms) {
        return Err(EngineError::Invalid(format!(
            "total_rooms must be between 1 and {MAX_TOTAL_ROOMS}"
        )));
    }
    Ok(())
}

fn validate_booking_request(req: &BookingRequest) -> Result<(), EngineError> {
    if !(1..=MAX_GUESTS).contains(&req.guests) {
        return Err(EngineError::Invalid(format!(
            "guests must be between 1 and {MAX_GUESTS}"
        )));
    }
    required("guest_name", &req.guest.full_name, MAX_GUEST_NAME_LEN)?;
    required("guest_email", &req.guest.email, MAX_EMAIL_LEN)?;
    if !req.guest.email.contains('@') {
        return Err(EngineError::Invalid("guest_email is not an email address".into()));
    }
    required("guest_phone", &req.guest.phone, MAX_PHONE_LEN)?;
    if let Some(s) = &req.special_requests {
        optional("special_requests", s, MAX_SPECIAL_REQUESTS_LEN)?;
    }
    Ok(())
}

fn validate_review(r: &ReviewDraft) -> Result<(), EngineError> {
    if !(MIN_RATING..=MAX_RATING).contains(&r.rating) {
        return Err(EngineError::Invalid(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}"
        )));
    }
    required("title", &r.title, MAX_REVIEW_TITLE_LEN)?;
    required("comment", &r.comment, MAX_REVIEW_COMMENT_LEN)
}

impl Engine {
    // ── Hotels ───────────────────────────────────────────

    pub async fn create_hotel(&self, actor: &Actor, draft: HotelDraft) -> Result<Hotel, EngineError> {
        require_admin(actor)?;
        let hotel = Hotel {
            id: draft.id,
            name: draft.name,
            description: draft.description,
            address: draft.address,
            city: draft.city,
            country: draft.country,
            star_rating: draft.star_rating,
            image_url: draft.image_url,
            active: true,
            created_at: self.now(),
        };
        validate_hotel(&hotel)?;

        let _catalog = self.catalog_lock.lock().await;
        if self.store.hotel_count() >= MAX_HOTELS_PER_TENANT {
            return Err(EngineError::LimitExceeded("too many hotels"));
        }
        if self.store.contains_hotel(&hotel.id) {
            return Err(EngineError::AlreadyExists(hotel.id));
        }
        self.persist_catalog(&Event::HotelCreated { hotel: hotel.clone() })
            .await?;
        info!("hotel {} created: {}", hotel.id, hotel.name);
        Ok(hotel)
    }

    pub async fn update_hotel(
        &self,
        actor: &Actor,
        id: Ulid,
        patch: HotelPatch,
    ) -> Result<Hotel, EngineError> {
        require_admin(actor)?;
        let _catalog = self.catalog_lock.lock().await;
        let mut hotel = self.store.get_hotel(&id).ok_or(EngineError::NotFound(id))?;
        if let Some(v) = patch.name {
            hotel.name = v;
        }
        if let Some(v) = patch.description {
            hotel.description = v;
        }
        if let Some(v) = patch.address {
            hotel.address = v;
        }
        if let Some(v) = patch.city {
            hotel.city = v;
        }
        if let Some(v) = patch.country {
            hotel.country = v;
        }
        if let Some(v) = patch.star_rating {
            hotel.star_rating = v;
        }
        if let Some(v) = patch.image_url {
            hotel.image_url = v;
        }
        if let Some(v) = patch.active {
            hotel.active = v;
        }
        validate_hotel(&hotel)?;
        self.persist_catalog(&Event::HotelUpdated { hotel: hotel.clone() })
            .await?;
        Ok(hotel)
    }

    /// Deactivated hotels disappear from guest search and stop taking
    /// bookings; their history is kept.
    pub async fn set_hotel_active(
        &self,
        actor: &Actor,
        id: Ulid,
        active: bool,
    ) -> Result<Hotel, EngineError> {
        let patch = HotelPatch {
            active: Some(active),
            ..HotelPatch::default()
        };
        self.update_hotel(actor, id, patch).await
    }

    /// Remove a hotel with its rooms and reviews. Refused while any of its
    /// rooms holds a booking record.
    pub async fn delete_hotel(&self, actor: &Actor, id: Ulid) -> Result<(), EngineError> {
        require_admin(actor)?;
        let _catalog = self.catalog_lock.lock().await;
        if !self.store.contains_hotel(&id) {
            return Err(EngineError::NotFound(id));
        }

        // Acquire room locks in sorted order to prevent deadlocks.
        let mut room_ids = self.store.rooms_of(&id);
        room_ids.sort();
        let mut guards = Vec::with_capacity(room_ids.len());
        for rid in &room_ids {
            if let Some(rs) = self.store.get_room(rid) {
                guards.push(rs.write_owned().await);
            }
        }
        if let Some(busy) = guards.iter().find(|g| !g.bookings.is_empty()) {
            debug!("hotel {id} delete refused: room {} has bookings", busy.room.id);
            return Err(EngineError::HasBookings(id));
        }

        self.persist_catalog(&Event::HotelDeleted { id }).await?;
        for guard in guards.iter_mut() {
            guard.retired = true;
        }
        info!("hotel {id} deleted with {} rooms", room_ids.len());
        Ok(())
    }

    // ── Rooms ────────────────────────────────────────────

    pub async fn create_room(&self, actor: &Actor, draft: RoomDraft) -> Result<Room, EngineError> {
        require_admin(actor)?;
        let room = Room {
            id: draft.id,
            hotel_id: draft.hotel_id,
            room_type: draft.room_type,
            description: draft.description,
            price_per_night: draft.price_per_night,
            max_guests: draft.max_guests,
            total_rooms: draft.total_rooms,
            available: true,
            amenities: normalize_amenities(draft.amenities),
            created_at: self.now(),
        };
        validate_room(&room)?;

        let _catalog = self.catalog_lock.lock().await;
        if !self.store.contains_hotel(&room.hotel_id) {
            return Err(EngineError::NotFound(room.hotel_id));
        }
        if self.store.rooms_of(&room.hotel_id).len() >= MAX_ROOMS_PER_HOTEL {
            return Err(EngineError::LimitExceeded("too many rooms in hotel"));
        }
        if self.store.contains_room(&room.id) {
            return Err(EngineError::AlreadyExists(room.id));
        }
        self.persist_catalog(&Event::RoomCreated { room: room.clone() })
            .await?;
        Ok(room)
    }

    /// Lowering `total_rooms` below the current overlap keeps existing
    /// bookings; it only refuses new ones.
    pub async fn update_room(
        &self,
        actor: &Actor,
        id: Ulid,
        patch: RoomPatch,
    ) -> Result<Room, EngineError> {
        require_admin(actor)?;
        let mut guard = self.room_write(id).await?;
        let mut room = guard.room.clone();
        if let Some(v) = patch.room_type {
            room.room_type = v;
        }
        if let Some(v) = patch.description {
            room.description = v;
        }
        if let Some(v) = patch.price_per_night {
            room.price_per_night = v;
        }
        if let Some(v) = patch.max_guests {
            room.max_guests = v;
        }
        if let Some(v) = patch.total_rooms {
            room.total_rooms = v;
        }
        if let Some(v) = patch.available {
            room.available = v;
        }
        if let Some(v) = patch.amenities {
            room.amenities = normalize_amenities(v);
        }
        validate_room(&room)?;
        self.persist_and_apply(&mut guard, &Event::RoomUpdated { room: room.clone() })
            .await?;
        Ok(room)
    }

    pub async fn delete_room(&self, actor: &Actor, id: Ulid) -> Result<(), EngineError> {
        require_admin(actor)?;
        let _catalog = self.catalog_lock.lock().await;
        let mut guard = self.room_write(id).await?;
        if !guard.bookings.is_empty() {
            return Err(EngineError::HasBookings(id));
        }
        let hotel_id = guard.room.hotel_id;
        self.persist_catalog(&Event::RoomDeleted { id, hotel_id }).await?;
        guard.retired = true;
        Ok(())
    }

    // ── Bookings ─────────────────────────────────────────

    /// Admit, record as pending, authorize payment, then confirm.
    ///
    /// The room lock covers only the availability check and the pending
    /// write; the payment call runs unlocked. A declined payment removes the
    /// pending booking again.
    pub async fn place_booking(
        &self,
        actor: &Actor,
        req: BookingRequest,
    ) -> Result<Booking, EngineError> {
        let result = self.place_booking_inner(actor, req).await;
        let outcome = match &result {
            Ok(_) => "confirmed",
            Err(EngineError::RoomUnavailable(_)) => "unavailable",
            Err(EngineError::PaymentDeclined(_)) => "payment_declined",
            Err(_) => "rejected",
        };
        metrics::counter!(observability::BOOKINGS_TOTAL, "outcome" => outcome).increment(1);
        result
    }

    async fn place_booking_inner(
        &self,
        actor: &Actor,
        req: BookingRequest,
    ) -> Result<Booking, EngineError> {
        validate_booking_request(&req)?;
        let today = self.today();
        if let Some(expiry) = &req.card_expiry {
            validate_card_expiry(expiry, today).map_err(|e| match e {
                CardExpiryError::Expired => EngineError::CardExpired,
                CardExpiryError::Malformed => EngineError::Invalid(e.to_string()),
            })?;
        }
        if self.store.room_for_booking(&req.id).is_some() {
            return Err(EngineError::AlreadyExists(req.id));
        }

        let booking = {
            let mut guard = self.room_write(req.room_id).await?;
            let hotel_active = self
                .store
                .get_hotel(&guard.room.hotel_id)
                .is_some_and(|h| h.active);
            if !guard.room.available || !hotel_active {
                return Err(EngineError::NotBookable(req.room_id));
            }
            if req.guests > guard.room.max_guests {
                return Err(EngineError::Invalid(format!(
                    "room sleeps at most {} guests",
                    guard.room.max_guests
                )));
            }
            if guard.bookings.len() >= MAX_BOOKINGS_PER_ROOM {
                return Err(EngineError::LimitExceeded("too many bookings on room"));
            }

            let quote = check_availability(&guard, req.check_in, req.check_out, today)?;
            if quote.nights > MAX_STAY_NIGHTS {
                return Err(EngineError::LimitExceeded("stay too long"));
            }

            let booking = Booking {
                id: req.id,
                room_id: req.room_id,
                hotel_id: guard.room.hotel_id,
                user_id: actor.user_id.clone(),
                stay: quote.stay,
                guests: req.guests,
                total_price: quote.total_price,
                guest: req.guest,
                special_requests: req.special_requests,
                status: BookingStatus::Pending,
                payment_ref: None,
                booked_at: self.now(),
            };
            // Claimed under the room lock so two requests with one id cannot both land.
            if !self.store.reserve_booking_id(booking.id, booking.room_id) {
                return Err(EngineError::AlreadyExists(booking.id));
            }
            let placed = Event::BookingPlaced { booking: booking.clone() };
            if let Err(e) = self.persist_and_apply(&mut guard, &placed).await {
                self.store.release_booking_id(&booking.id);
                return Err(e);
            }
            booking
        };

        match self.payments.authorize(booking.id, booking.total_price).await {
            Ok(payment_ref) => {
                let mut guard = self.booking_write(booking.id).await?;
                let current = guard
                    .booking(booking.id)
                    .map(|b| b.status)
                    .ok_or(EngineError::NotFound(booking.id))?;
                if !current.can_transition_to(BookingStatus::Confirmed) {
                    warn!(
                        "booking {} authorized ({payment_ref}) but already {current}",
                        booking.id
                    );
                    return Err(EngineError::InvalidTransition {
                        from: current,
                        to: BookingStatus::Confirmed,
                    });
                }
                let event = Event::BookingStatusChanged {
                    id: booking.id,
                    room_id: booking.room_id,
                    status: BookingStatus::Confirmed,
                    payment_ref: Some(payment_ref.clone()),
                };
                self.persist_and_apply(&mut guard, &event).await?;
                info!("booking {} confirmed for {} ({payment_ref})", booking.id, booking.stay);
                Ok(Booking {
                    status: BookingStatus::Confirmed,
                    payment_ref: Some(payment_ref),
                    ..booking
                })
            }
            Err(e) => {
                warn!("booking {} payment failed: {e}", booking.id);
                let mut guard = self.booking_write(booking.id).await?;
                let current = guard.booking(booking.id).map(|b| b.status);
                if current != Some(BookingStatus::Pending) {
                    warn!(
                        "booking {} declined but no longer pending ({current:?}), left as is",
                        booking.id
                    );
                    return Err(EngineError::PaymentDeclined(e.to_string()));
                }
                let event = Event::BookingRemoved {
                    id: booking.id,
                    room_id: booking.room_id,
                };
                self.persist_and_apply(&mut guard, &event).await?;
                Err(EngineError::PaymentDeclined(e.to_string()))
            }
        }
    }

    /// Guest (owner) or admin cancellation of a stay that has not begun.
    pub async fn cancel_booking(&self, actor: &Actor, id: Ulid) -> Result<Booking, EngineError> {
        let mut guard = self.booking_write(id).await?;
        let booking = guard.booking(id).cloned().ok_or(EngineError::NotFound(id))?;
        if !actor.may_access(&booking.user_id) {
            return Err(EngineError::Forbidden("not your booking"));
        }
        check_cancellable(&booking, self.today())?;
        let event = Event::BookingStatusChanged {
            id,
            room_id: booking.room_id,
            status: BookingStatus::Cancelled,
            payment_ref: None,
        };
        self.persist_and_apply(&mut guard, &event).await?;
        metrics::counter!(observability::BOOKINGS_CANCELLED_TOTAL).increment(1);
        Ok(Booking {
            status: BookingStatus::Cancelled,
            ..booking
        })
    }

    pub async fn update_booking_status(
        &self,
        actor: &Actor,
        id: Ulid,
        status: BookingStatus,
    ) -> Result<Booking, EngineError> {
        require_admin(actor)?;
        let mut guard = self.booking_write(id).await?;
        let booking = guard.booking(id).cloned().ok_or(EngineError::NotFound(id))?;
        if !booking.status.can_transition_to(status) {
            return Err(EngineError::InvalidTransition {
                from: booking.status,
                to: status,
            });
        }
        let event = Event::BookingStatusChanged {
            id,
            room_id: booking.room_id,
            status,
            payment_ref: None,
        };
        self.persist_and_apply(&mut guard, &event).await?;
        Ok(Booking { status, ..booking })
    }

    // ── Reviews ──────────────────────────────────────────

    pub async fn post_review(&self, actor: &Actor, draft: ReviewDraft) -> Result<Review, EngineError> {
        validate_review(&draft)?;
        let _reviews = self.review_lock.lock().await;
        if !self.store.contains_hotel(&draft.hotel_id) {
            return Err(EngineError::NotFound(draft.hotel_id));
        }
        if self.store.review_exists(&draft.id) {
            return Err(EngineError::AlreadyExists(draft.id));
        }
        match self.review_eligibility(actor, draft.hotel_id).await? {
            ReviewEligibility::Eligible => {}
            ReviewEligibility::AlreadyReviewed => {
                return Err(EngineError::AlreadyReviewed(draft.hotel_id));
            }
            other => {
                return Err(EngineError::NotEligibleForReview(
                    other.reason().unwrap_or("not eligible"),
                ));
            }
        }
        let review = Review {
            id: draft.id,
            hotel_id: draft.hotel_id,
            user_id: actor.user_id.clone(),
            rating: draft.rating,
            title: draft.title,
            comment: draft.comment,
            created_at: self.now(),
        };
        self.persist_catalog(&Event::ReviewPosted { review: review.clone() })
            .await?;
        Ok(review)
    }

    // ── Sweeps ───────────────────────────────────────────

    /// Persist `Completed` for confirmed stays whose check-out has passed.
    pub async fn complete_finished_stays(&self) -> Result<usize, EngineError> {
        let now = self.now();
        let mut completed = 0;
        for room_id in self.store.room_ids() {
            let Ok(mut guard) = self.room_write(room_id).await else {
                continue;
            };
            let due: Vec<Ulid> = guard
                .bookings
                .iter()
                .filter(|b| b.status == BookingStatus::Confirmed && b.stay.has_ended(now))
                .map(|b| b.id)
                .collect();
            for id in due {
                let event = Event::BookingStatusChanged {
                    id,
                    room_id,
                    status: BookingStatus::Completed,
                    payment_ref: None,
                };
                self.persist_and_apply(&mut guard, &event).await?;
                completed += 1;
            }
        }
        Ok(completed)
    }

    /// Cancel bookings stuck in `Pending` longer than `ttl_ms`, freeing the
    /// inventory held by payment calls that never returned.
    pub async fn expire_stale_pending(&self, ttl_ms: Ms) -> Result<usize, EngineError> {
        let cutoff = self.now() - ttl_ms;
        let mut expired = 0;
        for room_id in self.store.room_ids() {
            let Ok(mut guard) = self.room_write(room_id).await else {
                continue;
            };
            let stale: Vec<Ulid> = guard
                .bookings
                .iter()
                .filter(|b| b.status == BookingStatus::Pending && b.booked_at < cutoff)
                .map(|b| b.id)
                .collect();
            for id in stale {
                let event = Event::BookingStatusChanged {
                    id,
                    room_id,
                    status: BookingStatus::Cancelled,
                    payment_ref: None,
                };
                self.persist_and_apply(&mut guard, &event).await?;
                expired += 1;
            }
        }
        Ok(expired)
    }

    // ── WAL maintenance ──────────────────────────────────

    /// Compact the WAL by rewriting it with only the events needed to recreate
    /// the current state. All writers are locked out for the duration so no
    /// append can land between the snapshot and the swap.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let _catalog = self.catalog_lock.lock().await;
        let _reviews = self.review_lock.lock().await;

        let mut room_ids = self.store.room_ids();
        room_ids.sort();
        let mut guards = Vec::with_capacity(room_ids.len());
        for rid in &room_ids {
            if let Some(rs) = self.store.get_room(rid) {
                guards.push(rs.write_owned().await);
            }
        }

        let mut events = Vec::new();
        for hotel in self.store.hotels() {
            events.push(Event::HotelCreated { hotel });
        }
        for guard in guards.iter().filter(|g| !g.retired) {
            events.push(Event::RoomCreated {
                room: guard.room.clone(),
            });
            for booking in &guard.bookings {
                events.push(Event::BookingPlaced {
                    booking: booking.clone(),
                });
            }
        }
        for review in self.store.reviews() {
            events.push(Event::ReviewPosted { review });
        }

        let count = events.len();
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact { events, response: tx })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))?;
        debug!("WAL compacted to {count} events");
        Ok(())
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = tokio::sync::oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}

fn normalize_amenities(mut amenities: Vec<Amenity>) -> Vec<Amenity> {
    amenities.sort();
    amenities.dedup();
    amenities
}
