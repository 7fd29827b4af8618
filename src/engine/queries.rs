use chrono::NaiveDate;
use rust_decimal::Decimal;
use ulid::Ulid;

use crate::auth::Actor;
use crate::model::*;

use super::admission::{check_availability, eligible_for_review};
use super::{Engine, EngineError};

/// Hotel search criteria. Empty filter matches every visible hotel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotelFilter {
    /// Case-insensitive substring of name, description, city or country.
    pub term: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub min_stars: Option<u8>,
    /// Keep hotels with at least one room at or below this nightly price.
    pub max_price: Option<Decimal>,
}

impl HotelFilter {
    fn matches_hotel(&self, h: &Hotel) -> bool {
        if let Some(term) = &self.term {
            let term = term.to_lowercase();
            let hit = [&h.name, &h.description, &h.city, &h.country]
                .iter()
                .any(|f| f.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        if let Some(city) = &self.city
            && !h.city.eq_ignore_ascii_case(city)
        {
            return false;
        }
        if let Some(country) = &self.country
            && !h.country.eq_ignore_ascii_case(country)
        {
            return false;
        }
        self.min_stars.is_none_or(|min| h.star_rating >= min)
    }
}

impl Engine {
    async fn summarize(&self, hotel: Hotel) -> HotelSummary {
        let mut room_count = 0;
        let mut min_price: Option<Decimal> = None;
        for rid in self.store.rooms_of(&hotel.id) {
            let Some(rs) = self.store.get_room(&rid) else {
                continue;
            };
            let guard = rs.read().await;
            room_count += 1;
            let price = guard.room.price_per_night;
            min_price = Some(min_price.map_or(price, |m| m.min(price)));
        }
        let (average_rating, review_count) = self.store.rating_of(&hotel.id);
        HotelSummary {
            hotel,
            room_count,
            min_price,
            average_rating,
            review_count,
        }
    }

    fn visible_hotel(&self, actor: &Actor, id: Ulid) -> Result<Hotel, EngineError> {
        match self.store.get_hotel(&id) {
            Some(h) if h.active || actor.admin => Ok(h),
            _ => Err(EngineError::NotFound(id)),
        }
    }

    /// Active hotels (all hotels for admins) matching `filter`, sorted by name.
    pub async fn search_hotels(&self, actor: &Actor, filter: &HotelFilter) -> Vec<HotelSummary> {
        let mut hotels: Vec<Hotel> = self
            .store
            .hotels()
            .into_iter()
            .filter(|h| (h.active || actor.admin) && filter.matches_hotel(h))
            .collect();
        hotels.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        let mut out = Vec::with_capacity(hotels.len());
        for hotel in hotels {
            let summary = self.summarize(hotel).await;
            if let Some(max) = filter.max_price
                && summary.min_price.is_none_or(|p| p > max)
            {
                continue;
            }
            out.push(summary);
        }
        out
    }

    pub async fn get_hotel(&self, actor: &Actor, id: Ulid) -> Result<HotelSummary, EngineError> {
        let hotel = self.visible_hotel(actor, id)?;
        Ok(self.summarize(hotel).await)
    }

    /// Rooms of a hotel, cheapest first.
    pub async fn list_rooms(&self, actor: &Actor, hotel_id: Ulid) -> Result<Vec<Room>, EngineError> {
        self.visible_hotel(actor, hotel_id)?;
        let mut rooms = Vec::new();
        for rid in self.store.rooms_of(&hotel_id) {
            if let Some(rs) = self.store.get_room(&rid) {
                rooms.push(rs.read().await.room.clone());
            }
        }
        rooms.sort_by(|a, b| a.price_per_night.cmp(&b.price_per_night).then(a.id.cmp(&b.id)));
        Ok(rooms)
    }

    /// Dry-run of the admission check; nothing is reserved.
    pub async fn quote(
        &self,
        room_id: Ulid,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Quote, EngineError> {
        let rs = self
            .store
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let guard = rs.read().await;
        if guard.retired {
            return Err(EngineError::NotFound(room_id));
        }
        let hotel_active = self
            .store
            .get_hotel(&guard.room.hotel_id)
            .is_some_and(|h| h.active);
        if !guard.room.available || !hotel_active {
            return Err(EngineError::NotBookable(room_id));
        }
        check_availability(&guard, check_in, check_out, self.today())
    }

    async fn read_booking(&self, id: Ulid) -> Result<Booking, EngineError> {
        let room_id = self
            .store
            .room_for_booking(&id)
            .ok_or(EngineError::NotFound(id))?;
        let rs = self
            .store
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(id))?;
        let guard = rs.read().await;
        guard.booking(id).cloned().ok_or(EngineError::NotFound(id))
    }

    /// Booking with its effective status. Owner or admin only.
    pub async fn get_booking(&self, actor: &Actor, id: Ulid) -> Result<Booking, EngineError> {
        let mut booking = self.read_booking(id).await?;
        if !actor.may_access(&booking.user_id) {
            return Err(EngineError::Forbidden("not your booking"));
        }
        booking.status = booking.effective_status(self.now());
        Ok(booking)
    }

    async fn bookings_of_user(&self, user_id: &str) -> Vec<Booking> {
        let mut out = Vec::new();
        for (booking_id, room_id) in self.store.bookings_of(user_id) {
            if let Some(rs) = self.store.get_room(&room_id)
                && let Some(b) = rs.read().await.booking(booking_id)
            {
                out.push(b.clone());
            }
        }
        out
    }

    /// The actor's bookings, newest first.
    pub async fn my_bookings(&self, actor: &Actor) -> Vec<Booking> {
        let now = self.now();
        let mut out = self.bookings_of_user(&actor.user_id).await;
        for b in out.iter_mut() {
            b.status = b.effective_status(now);
        }
        sort_newest_first(&mut out);
        out
    }

    /// Every booking, optionally narrowed to one (effective) status. Admin only.
    pub async fn list_bookings(
        &self,
        actor: &Actor,
        status: Option<BookingStatus>,
    ) -> Result<Vec<Booking>, EngineError> {
        if !actor.admin {
            return Err(EngineError::Forbidden("admin role required"));
        }
        let now = self.now();
        let mut out = Vec::new();
        for room_id in self.store.room_ids() {
            let Some(rs) = self.store.get_room(&room_id) else {
                continue;
            };
            let guard = rs.read().await;
            for b in &guard.bookings {
                let effective = b.effective_status(now);
                if status.is_none_or(|s| s == effective) {
                    out.push(Booking {
                        status: effective,
                        ..b.clone()
                    });
                }
            }
        }
        sort_newest_first(&mut out);
        Ok(out)
    }

    pub async fn review_eligibility(
        &self,
        actor: &Actor,
        hotel_id: Ulid,
    ) -> Result<ReviewEligibility, EngineError> {
        if !self.store.contains_hotel(&hotel_id) {
            return Err(EngineError::NotFound(hotel_id));
        }
        let already = self.store.has_reviewed(hotel_id, &actor.user_id);
        let stays = self.bookings_of_user(&actor.user_id).await;
        Ok(eligible_for_review(
            stays.iter().filter(|b| b.hotel_id == hotel_id),
            already,
            self.now(),
        ))
    }

    /// Reviews of a hotel, newest first.
    pub async fn list_reviews(&self, actor: &Actor, hotel_id: Ulid) -> Result<Vec<Review>, EngineError> {
        self.visible_hotel(actor, hotel_id)?;
        let mut reviews = self.store.reviews_of(&hotel_id);
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reviews)
    }

    pub async fn dashboard(&self, actor: &Actor) -> Result<Dashboard, EngineError> {
        if !actor.admin {
            return Err(EngineError::Forbidden("admin role required"));
        }
        let now = self.now();
        let mut dash = Dashboard {
            hotels: self.store.hotel_count(),
            rooms: self.store.room_count(),
            ..Dashboard::default()
        };
        for room_id in self.store.room_ids() {
            let Some(rs) = self.store.get_room(&room_id) else {
                continue;
            };
            let guard = rs.read().await;
            for b in &guard.bookings {
                dash.bookings += 1;
                match b.effective_status(now) {
                    BookingStatus::Pending => dash.pending += 1,
                    BookingStatus::Confirmed => dash.confirmed += 1,
                    BookingStatus::Cancelled => dash.cancelled += 1,
                    BookingStatus::Completed => dash.completed += 1,
                }
            }
        }
        Ok(dash)
    }
}

fn sort_newest_first(bookings: &mut [Booking]) {
    bookings.sort_by(|a, b| b.booked_at.cmp(&a.booked_at).then(b.id.cmp(&a.id)));
}
