use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{Duration as Days, NaiveDate, Utc};
use tokio::net::TcpListener;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Config, NoTls, SimpleQueryMessage, SimpleQueryRow};
use ulid::Ulid;

use innkeep::auth::AdminList;
use innkeep::tenant::{SweepConfig, TenantManager};
use innkeep::wire;

// ── Test infrastructure ──────────────────────────────────────

async fn start_test_server() -> (SocketAddr, Arc<TenantManager>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let dir = std::env::temp_dir().join(format!("innkeep_int_test_{}", Ulid::new()));
    std::fs::create_dir_all(&dir).unwrap();
    let tm = Arc::new(TenantManager::new(dir, SweepConfig::default()));

    let tm2 = tm.clone();
    tokio::spawn(async move {
        loop {
            let (socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let tm = tm2.clone();
            tokio::spawn(async move {
                let _ = wire::process_connection(
                    socket,
                    tm,
                    "innkeep".to_string(),
                    AdminList::parse("admin"),
                    None,
                )
                .await;
            });
        }
    });

    (addr, tm)
}

async fn connect_as(addr: SocketAddr, user: &str) -> tokio_postgres::Client {
    let mut config = Config::new();
    config
        .host(addr.ip().to_string())
        .port(addr.port())
        .dbname("seaside")
        .user(user)
        .password("innkeep");

    let (client, connection) = config.connect(NoTls).await.unwrap();
    tokio::spawn(async move {
        let _ = connection.await;
    });
    client
}

async fn query_rows(client: &tokio_postgres::Client, sql: &str) -> Vec<SimpleQueryRow> {
    client
        .simple_query(sql)
        .await
        .unwrap()
        .into_iter()
        .filter_map(|m| match m {
            SimpleQueryMessage::Row(r) => Some(r),
            _ => None,
        })
        .collect()
}

fn days_ahead(n: i64) -> NaiveDate {
    Utc::now().date_naive() + Days::days(n)
}

/// Creates a hotel with one room type of `total_rooms` units at 120.00.
async fn seed_hotel(admin: &tokio_postgres::Client, total_rooms: u32) -> (Ulid, Ulid) {
    let hotel = Ulid::new();
    let room = Ulid::new();
    admin
        .batch_execute(&format!(
            "INSERT INTO hotels (id, name, address, city, country, star_rating) \
             VALUES ('{hotel}', 'Harbour Inn', '2 Quay Rd', 'Porto', 'Portugal', 4)"
        ))
        .await
        .unwrap();
    admin
        .batch_execute(&format!(
            "INSERT INTO rooms (id, hotel_id, room_type, price_per_night, max_guests, total_rooms, amenities) \
             VALUES ('{room}', '{hotel}', 'Double', 120.00, 2, {total_rooms}, 'wifi,balcony')"
        ))
        .await
        .unwrap();
    (hotel, room)
}

fn booking_sql(id: Ulid, room: Ulid, check_in: NaiveDate, check_out: NaiveDate) -> String {
    format!(
        "INSERT INTO bookings (id, room_id, check_in, check_out, guests, guest_name, guest_email, guest_phone) \
         VALUES ('{id}', '{room}', '{check_in}', '{check_out}', 2, 'Ann Guest', 'ann@example.com', '555-0100')"
    )
}

// ── Tests ────────────────────────────────────────────────────

#[tokio::test]
async fn catalog_round_trip() {
    let (addr, _tm) = start_test_server().await;
    let admin = connect_as(addr, "admin").await;
    let (hotel, room) = seed_hotel(&admin, 3).await;

    let guest = connect_as(addr, "alice").await;
    let hotels = query_rows(&guest, "SELECT * FROM hotels WHERE city = 'Porto'").await;
    assert_eq!(hotels.len(), 1);
    assert_eq!(hotels[0].get("id"), Some(hotel.to_string().as_str()));
    assert_eq!(hotels[0].get("room_count"), Some("1"));
    assert_eq!(hotels[0].get("min_price"), Some("120"));

    let rooms = query_rows(&guest, &format!("SELECT * FROM rooms WHERE hotel_id = '{hotel}'")).await;
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].get("id"), Some(room.to_string().as_str()));
    assert_eq!(rooms[0].get("amenities"), Some("wifi,balcony"));
}

#[tokio::test]
async fn guest_books_and_sees_own_booking() {
    let (addr, _tm) = start_test_server().await;
    let admin = connect_as(addr, "admin").await;
    let (_hotel, room) = seed_hotel(&admin, 2).await;

    let guest = connect_as(addr, "alice").await;
    let bid = Ulid::new();
    guest
        .batch_execute(&booking_sql(bid, room, days_ahead(30), days_ahead(33)))
        .await
        .unwrap();

    let mine = query_rows(&guest, "SELECT * FROM bookings").await;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].get("id"), Some(bid.to_string().as_str()));
    assert_eq!(mine[0].get("user_id"), Some("alice"));
    assert_eq!(mine[0].get("nights"), Some("3"));
    assert_eq!(mine[0].get("total_price"), Some("360"));
    assert_eq!(mine[0].get("status"), Some("confirmed"));

    let bob = connect_as(addr, "bob").await;
    assert!(query_rows(&bob, "SELECT * FROM bookings").await.is_empty());
    let err = bob
        .simple_query(&format!("SELECT * FROM bookings WHERE id = '{bid}'"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::INSUFFICIENT_PRIVILEGE));
}

#[tokio::test]
async fn oversell_is_rejected() {
    let (addr, _tm) = start_test_server().await;
    let admin = connect_as(addr, "admin").await;
    let (_hotel, room) = seed_hotel(&admin, 1).await;

    let alice = connect_as(addr, "alice").await;
    alice
        .batch_execute(&booking_sql(Ulid::new(), room, days_ahead(40), days_ahead(42)))
        .await
        .unwrap();

    // Overlaps the last night of alice's stay.
    let bob = connect_as(addr, "bob").await;
    let err = bob
        .batch_execute(&booking_sql(Ulid::new(), room, days_ahead(41), days_ahead(44)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::EXCLUSION_VIOLATION));

    // Back-to-back stays share no night.
    bob.batch_execute(&booking_sql(Ulid::new(), room, days_ahead(42), days_ahead(44)))
        .await
        .unwrap();
}

#[tokio::test]
async fn availability_row_reports_remaining_units() {
    let (addr, _tm) = start_test_server().await;
    let admin = connect_as(addr, "admin").await;
    let (_hotel, room) = seed_hotel(&admin, 2).await;
    let (ci, co) = (days_ahead(50), days_ahead(52));

    let guest = connect_as(addr, "alice").await;
    let avail = format!(
        "SELECT * FROM availability WHERE room_id = '{room}' AND check_in = '{ci}' AND check_out = '{co}'"
    );
    let before = query_rows(&guest, &avail).await;
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].get("available"), Some("t"));
    assert_eq!(before[0].get("remaining"), Some("2"));
    assert_eq!(before[0].get("total_price"), Some("240"));

    guest.batch_execute(&booking_sql(Ulid::new(), room, ci, co)).await.unwrap();
    guest.batch_execute(&booking_sql(Ulid::new(), room, ci, co)).await.unwrap();

    let after = query_rows(&guest, &avail).await;
    assert_eq!(after[0].get("available"), Some("f"));
    assert!(after[0].get("reason").is_some());
}

#[tokio::test]
async fn cancel_frees_the_room() {
    let (addr, _tm) = start_test_server().await;
    let admin = connect_as(addr, "admin").await;
    let (_hotel, room) = seed_hotel(&admin, 1).await;
    let (ci, co) = (days_ahead(60), days_ahead(61));

    let alice = connect_as(addr, "alice").await;
    let bid = Ulid::new();
    alice.batch_execute(&booking_sql(bid, room, ci, co)).await.unwrap();

    let bob = connect_as(addr, "bob").await;
    let err = bob
        .batch_execute(&format!("DELETE FROM bookings WHERE id = '{bid}'"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::INSUFFICIENT_PRIVILEGE));

    alice
        .batch_execute(&format!("DELETE FROM bookings WHERE id = '{bid}'"))
        .await
        .unwrap();
    let cancelled = query_rows(&alice, &format!("SELECT * FROM bookings WHERE id = '{bid}'")).await;
    assert_eq!(cancelled[0].get("status"), Some("cancelled"));

    bob.batch_execute(&booking_sql(Ulid::new(), room, ci, co)).await.unwrap();
}

#[tokio::test]
async fn guests_cannot_edit_catalog() {
    let (addr, _tm) = start_test_server().await;
    let admin = connect_as(addr, "admin").await;
    let (hotel, _room) = seed_hotel(&admin, 1).await;

    let guest = connect_as(addr, "alice").await;
    let err = guest
        .batch_execute(&format!("UPDATE hotels SET star_rating = 5 WHERE id = '{hotel}'"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::INSUFFICIENT_PRIVILEGE));

    let err = guest.simple_query("SELECT * FROM dashboard").await.unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::INSUFFICIENT_PRIVILEGE));

    let dash = query_rows(&admin, "SELECT * FROM dashboard").await;
    assert_eq!(dash.len(), 1);
}

#[tokio::test]
async fn review_requires_completed_stay() {
    let (addr, _tm) = start_test_server().await;
    let admin = connect_as(addr, "admin").await;
    let (hotel, room) = seed_hotel(&admin, 1).await;

    let guest = connect_as(addr, "alice").await;
    guest
        .batch_execute(&booking_sql(Ulid::new(), room, days_ahead(10), days_ahead(12)))
        .await
        .unwrap();

    let elig = query_rows(
        &guest,
        &format!("SELECT * FROM review_eligibility WHERE hotel_id = '{hotel}'"),
    )
    .await;
    assert_eq!(elig[0].get("eligible"), Some("f"));

    let err = guest
        .batch_execute(&format!(
            "INSERT INTO reviews (id, hotel_id, rating, title, comment) \
             VALUES ('{}', '{hotel}', 5, 'Lovely', 'Would stay again')",
            Ulid::new()
        ))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::OBJECT_NOT_IN_PREREQUISITE_STATE));

    let reviews = query_rows(&guest, &format!("SELECT * FROM reviews WHERE hotel_id = '{hotel}'")).await;
    assert!(reviews.is_empty());
}

#[tokio::test]
async fn syntax_errors_map_to_42601() {
    let (addr, _tm) = start_test_server().await;
    let guest = connect_as(addr, "alice").await;
    let err = guest.simple_query("SELEKT nonsense").await.unwrap_err();
    assert_eq!(err.code(), Some(&SqlState::SYNTAX_ERROR));
}

#[tokio::test]
async fn tenants_do_not_share_state() {
    let (addr, _tm) = start_test_server().await;
    let admin = connect_as(addr, "admin").await;
    seed_hotel(&admin, 1).await;

    let mut config = Config::new();
    config
        .host(addr.ip().to_string())
        .port(addr.port())
        .dbname("mountain")
        .user("alice")
        .password("innkeep");
    let (other, connection) = config.connect(NoTls).await.unwrap();
    tokio::spawn(async move {
        let _ = connection.await;
    });
    assert!(query_rows(&other, "SELECT * FROM hotels").await.is_empty());
}

#[tokio::test]
async fn wrong_password_is_refused() {
    let (addr, _tm) = start_test_server().await;
    let mut config = Config::new();
    config
        .host(addr.ip().to_string())
        .port(addr.port())
        .dbname("seaside")
        .user("alice")
        .password("nope");
    assert!(config.connect(NoTls).await.is_err());
}
