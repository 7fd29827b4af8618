//! Admission rules for bookings: availability, cancellation and review
//! eligibility. Pure functions over a room's state; the caller holds the lock.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::model::*;

use super::EngineError;

/// Number of live (non-cancelled) bookings overlapping `stay`.
pub fn overlap_count(rs: &RoomState, stay: &Stay) -> u32 {
    rs.overlapping(stay)
        .filter(|b| b.status.holds_inventory())
        .count() as u32
}

/// Decide whether `[check_in, check_out)` can be admitted for the room.
///
/// Rules apply in order: past check-in, non-positive length, capacity. A stay
/// is refused once the overlapping live bookings reach `total_rooms`, whether
/// or not those bookings overlap each other.
pub fn check_availability(
    rs: &RoomState,
    check_in: NaiveDate,
    check_out: NaiveDate,
    today: NaiveDate,
) -> Result<Quote, EngineError> {
    if check_in < today {
        return Err(EngineError::CheckInPast);
    }
    if check_out <= check_in {
        return Err(EngineError::CheckOutNotAfterCheckIn);
    }
    let stay = Stay::new(check_in, check_out);
    let overlap = overlap_count(rs, &stay);
    if overlap >= rs.room.total_rooms {
        return Err(EngineError::RoomUnavailable(rs.room.id));
    }
    let nights = stay.nights();
    Ok(Quote {
        room_id: rs.room.id,
        stay,
        nights,
        total_price: rs.room.price_per_night * Decimal::from(nights),
        remaining: rs.room.total_rooms - overlap,
    })
}

pub fn check_cancellable(booking: &Booking, today: NaiveDate) -> Result<(), EngineError> {
    if booking.status == BookingStatus::Cancelled {
        return Err(EngineError::AlreadyCancelled(booking.id));
    }
    if booking.stay.check_in <= today {
        return Err(EngineError::StayStarted(booking.id));
    }
    if !booking.status.can_transition_to(BookingStatus::Cancelled) {
        return Err(EngineError::InvalidTransition {
            from: booking.status,
            to: BookingStatus::Cancelled,
        });
    }
    Ok(())
}

/// A user may review a hotel once, after a completed stay there.
pub fn eligible_for_review<'a>(
    mut user_bookings_at_hotel: impl Iterator<Item = &'a Booking>,
    already_reviewed: bool,
    now: Ms,
) -> ReviewEligibility {
    if already_reviewed {
        return ReviewEligibility::AlreadyReviewed;
    }
    if user_bookings_at_hotel.any(|b| b.is_completed(now)) {
        ReviewEligibility::Eligible
    } else {
        ReviewEligibility::NoCompletedStay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use ulid::Ulid;

    use crate::clock::midnight_ms;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn base() -> NaiveDate {
        d("2025-06-01")
    }

    fn day(offset: i64) -> NaiveDate {
        base() + chrono::Duration::days(offset)
    }

    fn room_state(total_rooms: u32) -> RoomState {
        RoomState::new(Room {
            id: Ulid::new(),
            hotel_id: Ulid::new(),
            room_type: "Deluxe".into(),
            description: String::new(),
            price_per_night: Decimal::new(12000, 2),
            max_guests: 2,
            total_rooms,
            available: true,
            amenities: vec![],
            created_at: 0,
        })
    }

    fn booking_at(rs: &RoomState, stay: Stay, status: BookingStatus) -> Booking {
        Booking {
            id: Ulid::new(),
            room_id: rs.room.id,
            hotel_id: rs.room.hotel_id,
            user_id: "alice".into(),
            stay,
            guests: 1,
            total_price: Decimal::ZERO,
            guest: GuestContact {
                full_name: "Alice".into(),
                email: "alice@example.com".into(),
                phone: "555-0100".into(),
            },
            special_requests: None,
            status,
            payment_ref: None,
            booked_at: 0,
        }
    }

    fn add(rs: &mut RoomState, a: i64, b: i64, status: BookingStatus) -> Ulid {
        let booking = booking_at(rs, Stay::new(day(a), day(b)), status);
        let id = booking.id;
        rs.insert_booking(booking);
        id
    }

    /// Three-branch overlap form used by the original booking form.
    fn three_branch(b: &Stay, c: &Stay) -> bool {
        (b.check_in <= c.check_in && b.check_out > c.check_in)
            || (b.check_in < c.check_out && b.check_out >= c.check_out)
            || (b.check_in >= c.check_in && b.check_out <= c.check_out)
    }

    #[test]
    fn price_three_nights() {
        let rs = room_state(1);
        let q = check_availability(&rs, d("2025-07-01"), d("2025-07-04"), base()).unwrap();
        assert_eq!(q.nights, 3);
        assert_eq!(q.total_price, Decimal::new(36000, 2));
        assert_eq!(q.remaining, 1);
    }

    #[test]
    fn past_check_in_rejected() {
        let rs = room_state(1);
        assert_eq!(
            check_availability(&rs, day(-1), day(2), base()),
            Err(EngineError::CheckInPast)
        );
        // today is allowed
        assert!(check_availability(&rs, day(0), day(1), base()).is_ok());
    }

    #[test]
    fn zero_and_negative_nights_rejected() {
        let rs = room_state(1);
        assert_eq!(
            check_availability(&rs, day(3), day(3), base()),
            Err(EngineError::CheckOutNotAfterCheckIn)
        );
        assert_eq!(
            check_availability(&rs, day(3), day(2), base()),
            Err(EngineError::CheckOutNotAfterCheckIn)
        );
    }

    #[test]
    fn past_check_in_wins_over_bad_range() {
        let rs = room_state(1);
        assert_eq!(
            check_availability(&rs, day(-2), day(-3), base()),
            Err(EngineError::CheckInPast)
        );
    }

    #[test]
    fn single_unit_conflict_and_adjacency() {
        let mut rs = room_state(1);
        add(&mut rs, 10, 14, BookingStatus::Confirmed);

        assert!(matches!(
            check_availability(&rs, day(12), day(16), base()),
            Err(EngineError::RoomUnavailable(_))
        ));
        assert!(check_availability(&rs, day(14), day(16), base()).is_ok());
        assert!(check_availability(&rs, day(8), day(10), base()).is_ok());
    }

    #[test]
    fn cancelled_bookings_do_not_count() {
        let mut rs = room_state(1);
        add(&mut rs, 10, 14, BookingStatus::Cancelled);
        let q = check_availability(&rs, day(10), day(14), base()).unwrap();
        assert_eq!(q.remaining, 1);
    }

    #[test]
    fn pending_and_completed_count() {
        let mut rs = room_state(2);
        add(&mut rs, 10, 14, BookingStatus::Pending);
        add(&mut rs, 10, 14, BookingStatus::Completed);
        assert!(check_availability(&rs, day(11), day(12), base()).is_err());
    }

    #[test]
    fn count_is_not_per_night() {
        // Two disjoint bookings both overlap the long candidate stay: with two
        // units the candidate is refused even though no night has two guests.
        let mut rs = room_state(2);
        add(&mut rs, 1, 3, BookingStatus::Confirmed);
        add(&mut rs, 5, 7, BookingStatus::Confirmed);
        assert!(matches!(
            check_availability(&rs, day(0), day(10), base()),
            Err(EngineError::RoomUnavailable(_))
        ));
        let q = check_availability(&rs, day(2), day(4), base()).unwrap();
        assert_eq!(q.remaining, 1);
    }

    #[test]
    fn rejection_is_idempotent() {
        let mut rs = room_state(1);
        add(&mut rs, 10, 14, BookingStatus::Confirmed);
        let first = check_availability(&rs, day(11), day(13), base());
        let second = check_availability(&rs, day(11), day(13), base());
        assert!(first.is_err());
        assert_eq!(first, second);
        assert_eq!(rs.bookings.len(), 1);
    }

    #[test]
    fn overlap_boundary_grid() {
        let existing = Stay::new(day(10), day(14));
        for a in 5..20 {
            for b in (a + 1)..21 {
                let cand = Stay::new(day(a), day(b));
                assert_eq!(
                    cand.overlaps(&existing),
                    three_branch(&existing, &cand),
                    "candidate [{a}, {b})"
                );
            }
        }
    }

    #[test]
    fn cancellable_rules() {
        let rs = room_state(1);
        let today = day(5);
        let future = booking_at(&rs, Stay::new(day(6), day(8)), BookingStatus::Confirmed);
        assert_eq!(check_cancellable(&future, today), Ok(()));

        let mut cancelled = future.clone();
        cancelled.status = BookingStatus::Cancelled;
        assert_eq!(
            check_cancellable(&cancelled, today),
            Err(EngineError::AlreadyCancelled(cancelled.id))
        );

        let started = booking_at(&rs, Stay::new(day(5), day(8)), BookingStatus::Confirmed);
        assert_eq!(
            check_cancellable(&started, today),
            Err(EngineError::StayStarted(started.id))
        );

        let pending = booking_at(&rs, Stay::new(day(9), day(10)), BookingStatus::Pending);
        assert_eq!(check_cancellable(&pending, today), Ok(()));
    }

    #[test]
    fn review_eligibility_rules() {
        let rs = room_state(1);
        let stay = Stay::new(day(1), day(3));
        let after_checkout = midnight_ms(day(3)) + 1;
        let confirmed = booking_at(&rs, stay, BookingStatus::Confirmed);
        let cancelled = booking_at(&rs, stay, BookingStatus::Cancelled);

        assert_eq!(
            eligible_for_review([&confirmed].into_iter(), false, after_checkout),
            ReviewEligibility::Eligible
        );
        assert_eq!(
            eligible_for_review([&confirmed].into_iter(), false, midnight_ms(day(2))),
            ReviewEligibility::NoCompletedStay
        );
        assert_eq!(
            eligible_for_review([&cancelled].into_iter(), false, after_checkout),
            ReviewEligibility::NoCompletedStay
        );
        assert_eq!(
            eligible_for_review([&confirmed].into_iter(), true, after_checkout),
            ReviewEligibility::AlreadyReviewed
        );
        assert_eq!(
            eligible_for_review(std::iter::empty(), false, after_checkout),
            ReviewEligibility::NoCompletedStay
        );
    }

    fn stay_strategy() -> impl Strategy<Value = (i64, i64)> {
        (0i64..60, 1i64..15).prop_map(|(start, len)| (start, start + len))
    }

    proptest! {
        #[test]
        fn canonical_overlap_matches_three_branch(
            (a, b) in stay_strategy(),
            (c, e) in stay_strategy(),
        ) {
            let existing = Stay::new(day(a), day(b));
            let cand = Stay::new(day(c), day(e));
            prop_assert_eq!(cand.overlaps(&existing), three_branch(&existing, &cand));
            prop_assert_eq!(cand.overlaps(&existing), existing.overlaps(&cand));
        }

        #[test]
        fn admitted_bookings_never_exceed_inventory(
            total_rooms in 1u32..4,
            requests in prop::collection::vec((stay_strategy(), any::<bool>()), 1..40),
        ) {
            let mut rs = room_state(total_rooms);
            for ((a, b), cancel_one) in requests {
                if let Ok(q) = check_availability(&rs, day(a), day(b), base()) {
                    let booking = booking_at(&rs, q.stay, BookingStatus::Confirmed);
                    rs.insert_booking(booking);
                }
                if cancel_one
                    && let Some(live) = rs.bookings.iter_mut().find(|b| b.status.holds_inventory())
                {
                    live.status = BookingStatus::Cancelled;
                }
                for n in 0..80 {
                    let night = day(n);
                    let occupied = rs
                        .bookings
                        .iter()
                        .filter(|b| b.status.holds_inventory() && b.stay.contains_night(night))
                        .count() as u32;
                    prop_assert!(occupied <= total_rooms);
                }
            }
        }

        #[test]
        fn cancellation_frees_capacity(
            (a, b) in stay_strategy(),
        ) {
            let mut rs = room_state(1);
            let id = add(&mut rs, a, b, BookingStatus::Confirmed);
            prop_assert!(check_availability(&rs, day(a), day(b), base()).is_err());
            if let Some(booking) = rs.booking_mut(id) {
                booking.status = BookingStatus::Cancelled;
            }
            prop_assert!(check_availability(&rs, day(a), day(b), base()).is_ok());
        }
    }
}
