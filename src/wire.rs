use std::fmt::Debug;
use std::io;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::Sink;
use futures::stream;
use pgwire::api::auth::cleartext::CleartextPasswordAuthStartupHandler;
use pgwire::api::auth::{DefaultServerParameterProvider, StartupHandler};
use pgwire::api::copy::CopyHandler;
use pgwire::api::portal::{Format, Portal};
use pgwire::api::query::{ExtendedQueryHandler, SimpleQueryHandler};
use pgwire::api::results::{
    DataRowEncoder, DescribePortalResponse, DescribeStatementResponse, FieldFormat, FieldInfo,
    QueryResponse, Response, Tag,
};
use pgwire::api::stmt::{QueryParser, StoredStatement};
use pgwire::api::store::PortalStore;
use pgwire::api::{ClientInfo, ClientPortalStore, NoopHandler, PgWireServerHandlers, Type};
use pgwire::error::{ErrorInfo, PgWireError, PgWireResult};
use pgwire::messages::PgWireBackendMessage;
use pgwire::messages::data::DataRow;
use pgwire::tokio::TlsAcceptor;
use rust_decimal::Decimal;
use tokio::net::TcpStream;

use crate::auth::{Actor, AdminList, InnkeepAuthSource};
use crate::engine::{Engine, EngineError};
use crate::model::*;
use crate::observability;
use crate::sql::{self, Command, SqlError};
use crate::tenant::TenantManager;

pub struct InnkeepHandler {
    tenant_manager: Arc<TenantManager>,
    admins: AdminList,
    query_parser: Arc<InnkeepQueryParser>,
}

impl InnkeepHandler {
    pub fn new(tenant_manager: Arc<TenantManager>, admins: AdminList) -> Self {
        Self {
            tenant_manager,
            admins,
            query_parser: Arc::new(InnkeepQueryParser),
        }
    }

    /// Tenant engine from the database name, actor from the login user.
    fn resolve<C: ClientInfo>(&self, client: &C) -> PgWireResult<(Arc<Engine>, Actor)> {
        let metadata = client.metadata();
        let db = metadata
            .get("database")
            .cloned()
            .unwrap_or_else(|| "default".to_string());
        let user = metadata
            .get("user")
            .cloned()
            .unwrap_or_else(|| "anonymous".to_string());
        let engine = self.tenant_manager.get_or_create(&db).map_err(|e| {
            metrics::counter!(observability::AUTH_FAILURES_TOTAL).increment(1);
            tracing::warn!("tenant {db} unavailable for {user}: {e}");
            user_error("08006", format!("tenant error: {e}"))
        })?;
        Ok((engine, self.admins.actor(&user)))
    }

    /// Run one command, recording its latency and outcome.
    async fn run(&self, engine: &Engine, actor: &Actor, cmd: Command) -> PgWireResult<Response> {
        let label = observability::command_label(&cmd);
        let start = Instant::now();
        let result = self.execute_command(engine, actor, cmd).await;
        metrics::histogram!(observability::QUERY_DURATION_SECONDS, "command" => label)
            .record(start.elapsed().as_secs_f64());
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(observability::QUERIES_TOTAL, "command" => label, "status" => status)
            .increment(1);
        result
    }

    async fn execute_command(
        &self,
        engine: &Engine,
        actor: &Actor,
        cmd: Command,
    ) -> PgWireResult<Response> {
        match cmd {
            Command::InsertHotel(draft) => {
                engine.create_hotel(actor, draft).await.map_err(engine_err)?;
                Ok(executed("INSERT", 1))
            }
            Command::UpdateHotel { id, patch } => {
                engine.update_hotel(actor, id, patch).await.map_err(engine_err)?;
                Ok(executed("UPDATE", 1))
            }
            Command::DeleteHotel { id } => {
                engine.delete_hotel(actor, id).await.map_err(engine_err)?;
                Ok(executed("DELETE", 1))
            }
            Command::InsertRoom(draft) => {
                engine.create_room(actor, draft).await.map_err(engine_err)?;
                Ok(executed("INSERT", 1))
            }
            Command::UpdateRoom { id, patch } => {
                engine.update_room(actor, id, patch).await.map_err(engine_err)?;
                Ok(executed("UPDATE", 1))
            }
            Command::DeleteRoom { id } => {
                engine.delete_room(actor, id).await.map_err(engine_err)?;
                Ok(executed("DELETE", 1))
            }
            Command::InsertBooking(req) => {
                let room_id = req.room_id;
                match engine.place_booking(actor, req).await {
                    Ok(_) => Ok(executed("INSERT", 1)),
                    Err(e) => {
                        tracing::warn!("booking on room {room_id} by {} rejected: {e}", actor.user_id);
                        Err(engine_err(e))
                    }
                }
            }
            Command::UpdateBookingStatus { id, status } => {
                engine
                    .update_booking_status(actor, id, status)
                    .await
                    .map_err(engine_err)?;
                Ok(executed("UPDATE", 1))
            }
            Command::CancelBooking { id } => {
                engine.cancel_booking(actor, id).await.map_err(engine_err)?;
                Ok(executed("DELETE", 1))
            }
            Command::InsertReview(draft) => {
                engine.post_review(actor, draft).await.map_err(engine_err)?;
                Ok(executed("INSERT", 1))
            }
            Command::SelectHotels { id, filter } => {
                let hotels = match id {
                    Some(id) => vec![engine.get_hotel(actor, id).await.map_err(engine_err)?],
                    None => engine.search_hotels(actor, &filter).await,
                };
                rows(hotel_schema(), hotels.iter(), encode_hotel)
            }
            Command::SelectRooms { hotel_id } => {
                let rooms = engine.list_rooms(actor, hotel_id).await.map_err(engine_err)?;
                rows(room_schema(), rooms.iter(), encode_room)
            }
            Command::SelectBookings { id, status } => {
                let bookings = match id {
                    Some(id) => {
                        let b = engine.get_booking(actor, id).await.map_err(engine_err)?;
                        if status.is_none_or(|s| s == b.status) {
                            vec![b]
                        } else {
                            Vec::new()
                        }
                    }
                    None if actor.admin => {
                        engine.list_bookings(actor, status).await.map_err(engine_err)?
                    }
                    None => {
                        let mut mine = engine.my_bookings(actor).await;
                        mine.retain(|b| status.is_none_or(|s| s == b.status));
                        mine
                    }
                };
                rows(booking_schema(), bookings.iter(), encode_booking)
            }
            Command::SelectAvailability {
                room_id,
                check_in,
                check_out,
            } => {
                let outcome = match engine.quote(room_id, check_in, check_out).await {
                    Ok(q) => Availability::Open(q),
                    Err(
                        e @ (EngineError::RoomUnavailable(_)
                        | EngineError::NotBookable(_)
                        | EngineError::CheckInPast
                        | EngineError::CheckOutNotAfterCheckIn),
                    ) => Availability::Closed(e.to_string()),
                    Err(e) => return Err(engine_err(e)),
                };
                let row = (room_id, check_in, check_out, outcome);
                rows(availability_schema(), std::iter::once(&row), encode_availability)
            }
            Command::SelectReviewEligibility { hotel_id } => {
                let eligibility = engine
                    .review_eligibility(actor, hotel_id)
                    .await
                    .map_err(engine_err)?;
                let row = (hotel_id, eligibility);
                rows(eligibility_schema(), std::iter::once(&row), encode_eligibility)
            }
            Command::SelectReviews { hotel_id } => {
                let reviews = engine.list_reviews(actor, hotel_id).await.map_err(engine_err)?;
                rows(review_schema(), reviews.iter(), encode_review)
            }
            Command::SelectDashboard => {
                let dash = engine.dashboard(actor).await.map_err(engine_err)?;
                rows(dashboard_schema(), std::iter::once(&dash), encode_dashboard)
            }
        }
    }
}

fn executed(tag: &str, n: usize) -> Response {
    Response::Execution(Tag::new(tag).with_rows(n))
}

// ── Result sets ──────────────────────────────────────────────────

enum Availability {
    Open(Quote),
    Closed(String),
}

fn field(name: &str, ty: Type) -> FieldInfo {
    FieldInfo::new(name.into(), None, None, ty, FieldFormat::Text)
}

fn hotel_schema() -> Vec<FieldInfo> {
    vec![
        field("id", Type::VARCHAR),
        field("name", Type::VARCHAR),
        field("description", Type::VARCHAR),
        field("address", Type::VARCHAR),
        field("city", Type::VARCHAR),
        field("country", Type::VARCHAR),
        field("star_rating", Type::INT2),
        field("image_url", Type::VARCHAR),
        field("active", Type::BOOL),
        field("room_count", Type::INT8),
        field("min_price", Type::NUMERIC),
        field("average_rating", Type::FLOAT8),
        field("review_count", Type::INT8),
        field("created_at", Type::INT8),
    ]
}

fn room_schema() -> Vec<FieldInfo> {
    vec![
        field("id", Type::VARCHAR),
        field("hotel_id", Type::VARCHAR),
        field("room_type", Type::VARCHAR),
        field("description", Type::VARCHAR),
        field("price_per_night", Type::NUMERIC),
        field("max_guests", Type::INT2),
        field("total_rooms", Type::INT4),
        field("available", Type::BOOL),
        field("amenities", Type::VARCHAR),
        field("created_at", Type::INT8),
    ]
}

fn booking_schema() -> Vec<FieldInfo> {
    vec![
        field("id", Type::VARCHAR),
        field("room_id", Type::VARCHAR),
        field("hotel_id", Type::VARCHAR),
        field("user_id", Type::VARCHAR),
        field("check_in", Type::DATE),
        field("check_out", Type::DATE),
        field("nights", Type::INT8),
        field("guests", Type::INT2),
        field("total_price", Type::NUMERIC),
        field("guest_name", Type::VARCHAR),
        field("guest_email", Type::VARCHAR),
        field("guest_phone", Type::VARCHAR),
        field("special_requests", Type::VARCHAR),
        field("status", Type::VARCHAR),
        field("payment_ref", Type::VARCHAR),
        field("booked_at", Type::INT8),
    ]
}

fn availability_schema() -> Vec<FieldInfo> {
    vec![
        field("room_id", Type::VARCHAR),
        field("check_in", Type::DATE),
        field("check_out", Type::DATE),
        field("available", Type::BOOL),
        field("nights", Type::INT8),
        field("total_price", Type::NUMERIC),
        field("remaining", Type::INT8),
        field("reason", Type::VARCHAR),
    ]
}

fn eligibility_schema() -> Vec<FieldInfo> {
    vec![
        field("hotel_id", Type::VARCHAR),
        field("eligible", Type::BOOL),
        field("reason", Type::VARCHAR),
    ]
}

fn review_schema() -> Vec<FieldInfo> {
    vec![
        field("id", Type::VARCHAR),
        field("hotel_id", Type::VARCHAR),
        field("user_id", Type::VARCHAR),
        field("rating", Type::INT2),
        field("title", Type::VARCHAR),
        field("comment", Type::VARCHAR),
        field("created_at", Type::INT8),
    ]
}

fn dashboard_schema() -> Vec<FieldInfo> {
    [
        "hotels",
        "rooms",
        "bookings",
        "pending",
        "confirmed",
        "cancelled",
        "completed",
    ]
    .iter()
    .map(|name| field(name, Type::INT8))
    .collect()
}

/// Result schema for a statement, used by Describe before parameters are bound.
fn schema_for(sql: &str) -> Vec<FieldInfo> {
    let lower = sql.to_lowercase();
    if !lower.trim_start().starts_with("select") {
        return Vec::new();
    }
    let table = lower
        .split_once(" from ")
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .map(|t| t.trim_matches(|c: char| c == ';' || c == '"'));
    match table {
        Some("hotels") => hotel_schema(),
        Some("rooms") => room_schema(),
        Some("bookings") => booking_schema(),
        Some("availability") => availability_schema(),
        Some("review_eligibility") => eligibility_schema(),
        Some("reviews") => review_schema(),
        Some("dashboard") => dashboard_schema(),
        _ => Vec::new(),
    }
}

fn rows<'a, T: 'a>(
    schema: Vec<FieldInfo>,
    items: impl Iterator<Item = &'a T>,
    encode: fn(&mut DataRowEncoder, &T) -> PgWireResult<()>,
) -> PgWireResult<Response> {
    let schema = Arc::new(schema);
    let data: Vec<PgWireResult<DataRow>> = items
        .map(|item| {
            let mut encoder = DataRowEncoder::new(schema.clone());
            encode(&mut encoder, item)?;
            Ok(encoder.take_row())
        })
        .collect();
    Ok(Response::Query(QueryResponse::new(schema, stream::iter(data))))
}

fn money(d: Decimal) -> String {
    d.normalize().to_string()
}

fn encode_hotel(e: &mut DataRowEncoder, s: &HotelSummary) -> PgWireResult<()> {
    let h = &s.hotel;
    e.encode_field(&h.id.to_string())?;
    e.encode_field(&h.name)?;
    e.encode_field(&h.description)?;
    e.encode_field(&h.address)?;
    e.encode_field(&h.city)?;
    e.encode_field(&h.country)?;
    e.encode_field(&(h.star_rating as i16))?;
    e.encode_field(&h.image_url)?;
    e.encode_field(&h.active)?;
    e.encode_field(&(s.room_count as i64))?;
    e.encode_field(&s.min_price.map(money))?;
    e.encode_field(&s.average_rating)?;
    e.encode_field(&(s.review_count as i64))?;
    e.encode_field(&h.created_at)
}

fn encode_room(e: &mut DataRowEncoder, r: &Room) -> PgWireResult<()> {
    let amenities: Vec<&str> = r.amenities.iter().map(Amenity::as_str).collect();
    e.encode_field(&r.id.to_string())?;
    e.encode_field(&r.hotel_id.to_string())?;
    e.encode_field(&r.room_type)?;
    e.encode_field(&r.description)?;
    e.encode_field(&money(r.price_per_night))?;
    e.encode_field(&(r.max_guests as i16))?;
    e.encode_field(&(r.total_rooms as i32))?;
    e.encode_field(&r.available)?;
    e.encode_field(&amenities.join(","))?;
    e.encode_field(&r.created_at)
}

fn encode_booking(e: &mut DataRowEncoder, b: &Booking) -> PgWireResult<()> {
    e.encode_field(&b.id.to_string())?;
    e.encode_field(&b.room_id.to_string())?;
    e.encode_field(&b.hotel_id.to_string())?;
    e.encode_field(&b.user_id)?;
    e.encode_field(&b.stay.check_in.to_string())?;
    e.encode_field(&b.stay.check_out.to_string())?;
    e.encode_field(&b.stay.nights())?;
    e.encode_field(&(b.guests as i16))?;
    e.encode_field(&money(b.total_price))?;
    e.encode_field(&b.guest.full_name)?;
    e.encode_field(&b.guest.email)?;
    e.encode_field(&b.guest.phone)?;
    e.encode_field(&b.special_requests)?;
    e.encode_field(&b.status.to_string())?;
    e.encode_field(&b.payment_ref)?;
    e.encode_field(&b.booked_at)
}

type AvailabilityRow = (ulid::Ulid, chrono::NaiveDate, chrono::NaiveDate, Availability);

fn encode_availability(e: &mut DataRowEncoder, row: &AvailabilityRow) -> PgWireResult<()> {
    let (room_id, check_in, check_out, outcome) = row;
    e.encode_field(&room_id.to_string())?;
    e.encode_field(&check_in.to_string())?;
    e.encode_field(&check_out.to_string())?;
    match outcome {
        Availability::Open(q) => {
            e.encode_field(&true)?;
            e.encode_field(&Some(q.nights))?;
            e.encode_field(&Some(money(q.total_price)))?;
            e.encode_field(&Some(q.remaining as i64))?;
            e.encode_field(&None::<String>)
        }
        Availability::Closed(reason) => {
            e.encode_field(&false)?;
            e.encode_field(&None::<i64>)?;
            e.encode_field(&None::<String>)?;
            e.encode_field(&None::<i64>)?;
            e.encode_field(&Some(reason.clone()))
        }
    }
}

fn encode_eligibility(
    e: &mut DataRowEncoder,
    row: &(ulid::Ulid, ReviewEligibility),
) -> PgWireResult<()> {
    let (hotel_id, eligibility) = row;
    e.encode_field(&hotel_id.to_string())?;
    e.encode_field(&eligibility.is_eligible())?;
    e.encode_field(&eligibility.reason().map(str::to_string))
}

fn encode_review(e: &mut DataRowEncoder, r: &Review) -> PgWireResult<()> {
    e.encode_field(&r.id.to_string())?;
    e.encode_field(&r.hotel_id.to_string())?;
    e.encode_field(&r.user_id)?;
    e.encode_field(&(r.rating as i16))?;
    e.encode_field(&r.title)?;
    e.encode_field(&r.comment)?;
    e.encode_field(&r.created_at)
}

fn encode_dashboard(e: &mut DataRowEncoder, d: &Dashboard) -> PgWireResult<()> {
    for n in [
        d.hotels,
        d.rooms,
        d.bookings,
        d.pending,
        d.confirmed,
        d.cancelled,
        d.completed,
    ] {
        e.encode_field(&(n as i64))?;
    }
    Ok(())
}

// ── Simple Query Protocol ────────────────────────────────────────

#[async_trait]
impl SimpleQueryHandler for InnkeepHandler {
    async fn do_query<C>(&self, client: &mut C, query: &str) -> PgWireResult<Vec<Response>>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let (engine, actor) = self.resolve(client)?;
        let cmd = sql::parse_sql(query).map_err(sql_err)?;
        Ok(vec![self.run(&engine, &actor, cmd).await?])
    }
}

// ── Extended Query Protocol ──────────────────────────────────────

#[derive(Debug)]
pub struct InnkeepQueryParser;

#[async_trait]
impl QueryParser for InnkeepQueryParser {
    type Statement = String;

    async fn parse_sql<C>(
        &self,
        _client: &C,
        sql: &str,
        _types: &[Option<Type>],
    ) -> PgWireResult<String>
    where
        C: ClientInfo + Unpin + Send + Sync,
    {
        Ok(sql.to_string())
    }

    fn get_parameter_types(&self, stmt: &String) -> PgWireResult<Vec<Type>> {
        Ok(vec![Type::VARCHAR; count_params(stmt)])
    }

    fn get_result_schema(
        &self,
        stmt: &String,
        _column_format: Option<&Format>,
    ) -> PgWireResult<Vec<FieldInfo>> {
        Ok(schema_for(stmt))
    }
}

#[async_trait]
impl ExtendedQueryHandler for InnkeepHandler {
    type Statement = String;
    type QueryParser = InnkeepQueryParser;

    fn query_parser(&self) -> Arc<Self::QueryParser> {
        self.query_parser.clone()
    }

    async fn do_query<C>(
        &self,
        client: &mut C,
        portal: &Portal<Self::Statement>,
        _max_rows: usize,
    ) -> PgWireResult<Response>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let (engine, actor) = self.resolve(client)?;
        let sql = substitute_params(portal);
        let cmd = sql::parse_sql(&sql).map_err(sql_err)?;
        self.run(&engine, &actor, cmd).await
    }

    async fn do_describe_statement<C>(
        &self,
        _client: &mut C,
        target: &StoredStatement<Self::Statement>,
    ) -> PgWireResult<DescribeStatementResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        let param_types = vec![Type::VARCHAR; count_params(&target.statement)];
        Ok(DescribeStatementResponse::new(
            param_types,
            schema_for(&target.statement),
        ))
    }

    async fn do_describe_portal<C>(
        &self,
        _client: &mut C,
        target: &Portal<Self::Statement>,
    ) -> PgWireResult<DescribePortalResponse>
    where
        C: ClientInfo + ClientPortalStore + Sink<PgWireBackendMessage> + Unpin + Send + Sync,
        C::PortalStore: PortalStore<Statement = Self::Statement>,
        C::Error: Debug,
        PgWireError: From<C::Error>,
    {
        Ok(DescribePortalResponse::new(schema_for(
            &target.statement.statement,
        )))
    }
}

/// Highest `$N` placeholder in the statement.
fn count_params(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut max = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'$' {
            i += 1;
            continue;
        }
        i += 1;
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if let Ok(n) = sql[start..i].parse::<usize>() {
            max = max.max(n);
        }
    }
    max
}

/// Inline bound text parameters as quoted literals, highest index first so
/// `$1` never clobbers `$10`.
fn substitute_params(portal: &Portal<String>) -> String {
    let mut sql = portal.statement.statement.clone();
    for (i, param) in portal.parameters.iter().enumerate().rev() {
        let value = match param {
            Some(bytes) => format!("'{}'", String::from_utf8_lossy(bytes).replace('\'', "''")),
            None => "NULL".to_string(),
        };
        sql = sql.replace(&format!("${}", i + 1), &value);
    }
    sql
}

// ── Factory ──────────────────────────────────────────────────────

pub struct InnkeepFactory {
    handler: Arc<InnkeepHandler>,
    auth_handler: Arc<
        CleartextPasswordAuthStartupHandler<InnkeepAuthSource, DefaultServerParameterProvider>,
    >,
    noop: Arc<NoopHandler>,
}

impl InnkeepFactory {
    pub fn new(tenant_manager: Arc<TenantManager>, password: String, admins: AdminList) -> Self {
        Self {
            handler: Arc::new(InnkeepHandler::new(tenant_manager, admins)),
            auth_handler: Arc::new(CleartextPasswordAuthStartupHandler::new(
                InnkeepAuthSource::new(password),
                DefaultServerParameterProvider::default(),
            )),
            noop: Arc::new(NoopHandler),
        }
    }
}

impl PgWireServerHandlers for InnkeepFactory {
    fn simple_query_handler(&self) -> Arc<impl SimpleQueryHandler> {
        self.handler.clone()
    }

    fn extended_query_handler(&self) -> Arc<impl ExtendedQueryHandler> {
        self.handler.clone()
    }

    fn startup_handler(&self) -> Arc<impl StartupHandler> {
        self.auth_handler.clone()
    }

    fn copy_handler(&self) -> Arc<impl CopyHandler> {
        self.noop.clone()
    }
}

/// Serve one client connection to completion.
pub async fn process_connection(
    socket: TcpStream,
    tenant_manager: Arc<TenantManager>,
    password: String,
    admins: AdminList,
    tls: Option<TlsAcceptor>,
) -> io::Result<()> {
    let factory = Arc::new(InnkeepFactory::new(tenant_manager, password, admins));
    pgwire::tokio::process_socket(socket, tls, factory).await
}

// ── Errors ───────────────────────────────────────────────────────

/// SQLSTATE for an engine error.
pub fn sqlstate(e: &EngineError) -> &'static str {
    match e {
        EngineError::NotFound(_) => "P0002",
        EngineError::Forbidden(_) => "42501",
        EngineError::Invalid(_)
        | EngineError::CheckInPast
        | EngineError::CheckOutNotAfterCheckIn
        | EngineError::CardExpired
        | EngineError::LimitExceeded(_) => "22023",
        EngineError::RoomUnavailable(_) | EngineError::NotBookable(_) => "23P01",
        EngineError::HasBookings(_) => "23503",
        EngineError::AlreadyExists(_) | EngineError::AlreadyReviewed(_) => "23505",
        EngineError::InvalidTransition { .. }
        | EngineError::AlreadyCancelled(_)
        | EngineError::StayStarted(_)
        | EngineError::NotEligibleForReview(_) => "55000",
        EngineError::PaymentDeclined(_) => "P0001",
        EngineError::WalError(_) => "58030",
    }
}

fn user_error(code: &str, message: String) -> PgWireError {
    PgWireError::UserError(Box::new(ErrorInfo::new(
        "ERROR".into(),
        code.into(),
        message,
    )))
}

fn engine_err(e: EngineError) -> PgWireError {
    user_error(sqlstate(&e), e.to_string())
}

fn sql_err(e: SqlError) -> PgWireError {
    user_error("42601", e.to_string())
}
