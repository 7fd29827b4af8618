//! Hard limits on sizes and counts. Field lengths follow the hotel catalog
//! columns; counts bound memory per tenant.

pub const MAX_TENANTS: usize = 1_000;
pub const MAX_TENANT_NAME_LEN: usize = 256;

pub const MAX_HOTELS_PER_TENANT: usize = 10_000;
pub const MAX_ROOMS_PER_HOTEL: usize = 500;
pub const MAX_BOOKINGS_PER_ROOM: usize = 100_000;

// ── Hotel ────────────────────────────────────────────────

pub const MAX_HOTEL_NAME_LEN: usize = 200;
pub const MAX_HOTEL_DESCRIPTION_LEN: usize = 2_000;
pub const MAX_ADDRESS_LEN: usize = 500;
pub const MAX_CITY_LEN: usize = 100;
pub const MAX_COUNTRY_LEN: usize = 100;
pub const MAX_IMAGE_URL_LEN: usize = 500;
pub const MIN_STAR_RATING: u8 = 1;
pub const MAX_STAR_RATING: u8 = 5;

// ── Room ─────────────────────────────────────────────────

pub const MAX_ROOM_TYPE_LEN: usize = 100;
pub const MAX_ROOM_DESCRIPTION_LEN: usize = 1_000;
pub const MAX_TOTAL_ROOMS: u32 = 100;
pub const MAX_OCCUPANCY: u8 = 10;
/// Nightly price bounds, in cents.
pub const MIN_PRICE_CENTS: i64 = 1;
pub const MAX_PRICE_CENTS: i64 = 10_000_000;

// ── Booking ──────────────────────────────────────────────

pub const MAX_GUESTS: u8 = 10;
pub const MAX_STAY_NIGHTS: i64 = 365;
pub const MAX_GUEST_NAME_LEN: usize = 200;
pub const MAX_EMAIL_LEN: usize = 100;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_SPECIAL_REQUESTS_LEN: usize = 1_000;

// ── Review ───────────────────────────────────────────────

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
pub const MAX_REVIEW_TITLE_LEN: usize = 200;
pub const MAX_REVIEW_COMMENT_LEN: usize = 2_000;
