use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::model::*;

use super::SharedRoomState;

/// Catalog maps plus the indexes that route a booking or a review back to its
/// owner. Room state lives behind per-room locks; everything else is keyed
/// directly in a `DashMap`.
pub struct InMemoryStore {
    hotels: DashMap<Ulid, Hotel>,
    rooms: DashMap<Ulid, SharedRoomState>,
    hotel_rooms: DashMap<Ulid, Vec<Ulid>>,
    booking_to_room: DashMap<Ulid, Ulid>,
    /// user → (booking, room), in booking order.
    user_bookings: DashMap<String, Vec<(Ulid, Ulid)>>,
    reviews: DashMap<Ulid, Vec<Review>>,
    reviewed: DashMap<(Ulid, String), Ulid>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            hotels: DashMap::new(),
            rooms: DashMap::new(),
            hotel_rooms: DashMap::new(),
            booking_to_room: DashMap::new(),
            user_bookings: DashMap::new(),
            reviews: DashMap::new(),
            reviewed: DashMap::new(),
        }
    }

    // ── Hotels ───────────────────────────────────────────────

    pub fn hotel_count(&self) -> usize {
        self.hotels.len()
    }

    pub fn contains_hotel(&self, id: &Ulid) -> bool {
        self.hotels.contains_key(id)
    }

    pub fn get_hotel(&self, id: &Ulid) -> Option<Hotel> {
        self.hotels.get(id).map(|e| e.value().clone())
    }

    pub fn hotels(&self) -> Vec<Hotel> {
        self.hotels.iter().map(|e| e.value().clone()).collect()
    }

    // ── Rooms ────────────────────────────────────────────────

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn contains_room(&self, id: &Ulid) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn get_room(&self, id: &Ulid) -> Option<SharedRoomState> {
        self.rooms.get(id).map(|e| e.value().clone())
    }

    pub fn room_ids(&self) -> Vec<Ulid> {
        self.rooms.iter().map(|e| *e.key()).collect()
    }

    pub fn rooms_of(&self, hotel_id: &Ulid) -> Vec<Ulid> {
        self.hotel_rooms
            .get(hotel_id)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    // ── Bookings ─────────────────────────────────────────────

    pub fn room_for_booking(&self, booking_id: &Ulid) -> Option<Ulid> {
        self.booking_to_room.get(booking_id).map(|e| *e.value())
    }

    /// Claim `booking_id` for `room_id`. False when any room already holds it.
    pub fn reserve_booking_id(&self, booking_id: Ulid, room_id: Ulid) -> bool {
        match self.booking_to_room.entry(booking_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(room_id);
                true
            }
        }
    }

    /// Undo a reservation whose booking never reached the log.
    pub fn release_booking_id(&self, booking_id: &Ulid) {
        self.booking_to_room.remove(booking_id);
    }

    pub fn booking_count(&self) -> usize {
        self.booking_to_room.len()
    }

    pub fn bookings_of(&self, user_id: &str) -> Vec<(Ulid, Ulid)> {
        self.user_bookings
            .get(user_id)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    // ── Reviews ──────────────────────────────────────────────

    pub fn reviews_of(&self, hotel_id: &Ulid) -> Vec<Review> {
        self.reviews
            .get(hotel_id)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    pub fn has_reviewed(&self, hotel_id: Ulid, user_id: &str) -> bool {
        self.reviewed.contains_key(&(hotel_id, user_id.to_string()))
    }

    pub fn review_exists(&self, id: &Ulid) -> bool {
        self.reviewed.iter().any(|e| e.value() == id)
    }

    /// Mean rating and count; 0.0 when there are no reviews.
    pub fn rating_of(&self, hotel_id: &Ulid) -> (f64, usize) {
        match self.reviews.get(hotel_id) {
            Some(list) if !list.is_empty() => {
                let sum: u32 = list.iter().map(|r| r.rating as u32).sum();
                (sum as f64 / list.len() as f64, list.len())
            }
            _ => (0.0, 0),
        }
    }

    pub fn reviews(&self) -> Vec<Review> {
        self.reviews
            .iter()
            .flat_map(|e| e.value().clone())
            .collect()
    }

    // ── Event application ────────────────────────────────────

    /// Apply an event that does not touch per-room state.
    pub fn apply_catalog(&self, event: &Event) {
        match event {
            Event::HotelCreated { hotel } | Event::HotelUpdated { hotel } => {
                self.hotels.insert(hotel.id, hotel.clone());
            }
            Event::HotelDeleted { id } => {
                self.hotels.remove(id);
                if let Some((_, room_ids)) = self.hotel_rooms.remove(id) {
                    for room_id in room_ids {
                        self.rooms.remove(&room_id);
                    }
                }
                if let Some((_, reviews)) = self.reviews.remove(id) {
                    for review in reviews {
                        self.reviewed.remove(&(*id, review.user_id));
                    }
                }
            }
            Event::RoomCreated { room } => {
                let rs = RoomState::new(room.clone());
                self.rooms.insert(room.id, Arc::new(RwLock::new(rs)));
                self.hotel_rooms.entry(room.hotel_id).or_default().push(room.id);
            }
            Event::RoomDeleted { id, hotel_id } => {
                self.rooms.remove(id);
                if let Some(mut ids) = self.hotel_rooms.get_mut(hotel_id) {
                    ids.retain(|r| r != id);
                }
            }
            Event::ReviewPosted { review } => {
                self.reviewed
                    .insert((review.hotel_id, review.user_id.clone()), review.id);
                self.reviews
                    .entry(review.hotel_id)
                    .or_default()
                    .push(review.clone());
            }
            Event::RoomUpdated { .. }
            | Event::BookingPlaced { .. }
            | Event::BookingStatusChanged { .. }
            | Event::BookingRemoved { .. } => {}
        }
    }

    /// Apply a room-scoped event. Caller holds the room's write lock.
    pub fn apply_to_room(&self, rs: &mut RoomState, event: &Event) {
        match event {
            Event::RoomUpdated { room } => {
                rs.room = room.clone();
            }
            Event::BookingPlaced { booking } => {
                self.booking_to_room.insert(booking.id, booking.room_id);
                self.user_bookings
                    .entry(booking.user_id.clone())
                    .or_default()
                    .push((booking.id, booking.room_id));
                rs.insert_booking(booking.clone());
            }
            Event::BookingStatusChanged {
                id,
                status,
                payment_ref,
                ..
            } => {
                if let Some(b) = rs.booking_mut(*id) {
                    b.status = *status;
                    if payment_ref.is_some() {
                        b.payment_ref = payment_ref.clone();
                    }
                }
            }
            Event::BookingRemoved { id, .. } => {
                if let Some(b) = rs.remove_booking(*id) {
                    self.booking_to_room.remove(id);
                    if let Some(mut list) = self.user_bookings.get_mut(&b.user_id) {
                        list.retain(|(bid, _)| bid != id);
                    }
                }
            }
            _ => {}
        }
    }

    /// Apply any event during startup replay. Nothing else holds the room
    /// locks yet, so `try_write` never contends. Never use `blocking_write`
    /// here: replay may run inside an async context (lazy tenant creation).
    pub fn replay(&self, event: &Event) {
        match room_of(event) {
            Some(room_id) => {
                if let Some(rs) = self.get_room(&room_id)
                    && let Ok(mut guard) = rs.try_write()
                {
                    self.apply_to_room(&mut guard, event);
                }
            }
            None => self.apply_catalog(event),
        }
    }
}

/// Room whose lock guards this event, for room-scoped events.
pub fn room_of(event: &Event) -> Option<Ulid> {
    match event {
        Event::RoomUpdated { room } => Some(room.id),
        Event::BookingPlaced { booking } => Some(booking.room_id),
        Event::BookingStatusChanged { room_id, .. } | Event::BookingRemoved { room_id, .. } => {
            Some(*room_id)
        }
        Event::HotelCreated { .. }
        | Event::HotelUpdated { .. }
        | Event::HotelDeleted { .. }
        | Event::RoomCreated { .. }
        | Event::RoomDeleted { .. }
        | Event::ReviewPosted { .. } => None,
    }
}
