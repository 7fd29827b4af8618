use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlparser::ast::{
    self, AssignmentTarget, BinaryOperator, Expr, FromTable, ObjectNamePart, SetExpr, Statement,
    TableFactor, TableObject, Value, ValueWithSpan,
};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use ulid::Ulid;

use crate::engine::{
    BookingRequest, HotelDraft, HotelFilter, HotelPatch, ReviewDraft, RoomDraft, RoomPatch,
};
use crate::model::*;

/// Parsed command from SQL input.
#[derive(Debug, PartialEq)]
pub enum Command {
    InsertHotel(HotelDraft),
    UpdateHotel { id: Ulid, patch: HotelPatch },
    DeleteHotel { id: Ulid },
    InsertRoom(RoomDraft),
    UpdateRoom { id: Ulid, patch: RoomPatch },
    DeleteRoom { id: Ulid },
    InsertBooking(BookingRequest),
    UpdateBookingStatus { id: Ulid, status: BookingStatus },
    /// `DELETE FROM bookings` cancels; booking records are never erased.
    CancelBooking { id: Ulid },
    InsertReview(ReviewDraft),
    SelectHotels { id: Option<Ulid>, filter: HotelFilter },
    SelectRooms { hotel_id: Ulid },
    SelectBookings {
        id: Option<Ulid>,
        status: Option<BookingStatus>,
    },
    SelectAvailability {
        room_id: Ulid,
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    SelectReviewEligibility { hotel_id: Ulid },
    SelectReviews { hotel_id: Ulid },
    SelectDashboard,
}

pub fn parse_sql(sql: &str) -> Result<Command, SqlError> {
    let dialect = PostgreSqlDialect {};
    let stmts = Parser::parse_sql(&dialect, sql).map_err(|e| SqlError::Parse(e.to_string()))?;
    let Some(stmt) = stmts.first() else {
        return Err(SqlError::Empty);
    };

    match stmt {
        Statement::Insert(insert) => parse_insert(insert),
        Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => parse_update(table, assignments, selection.as_ref()),
        Statement::Delete(delete) => parse_delete(delete),
        Statement::Query(query) => parse_select(query),
        other => Err(SqlError::Unsupported(format!("{other}"))),
    }
}

// ── INSERT ────────────────────────────────────────────────────

const HOTEL_COLUMNS: &[&str] = &[
    "id",
    "name",
    "description",
    "address",
    "city",
    "country",
    "star_rating",
    "image_url",
];
const ROOM_COLUMNS: &[&str] = &[
    "id",
    "hotel_id",
    "room_type",
    "description",
    "price_per_night",
    "max_guests",
    "total_rooms",
    "amenities",
];
const BOOKING_COLUMNS: &[&str] = &[
    "id",
    "room_id",
    "check_in",
    "check_out",
    "guests",
    "guest_name",
    "guest_email",
    "guest_phone",
    "special_requests",
    "card_expiry",
];
const REVIEW_COLUMNS: &[&str] = &["id", "hotel_id", "rating", "title", "comment"];

/// One VALUES row keyed by the INSERT's column list.
struct Row<'a> {
    table: &'static str,
    cells: Vec<(String, &'a Expr)>,
}

impl<'a> Row<'a> {
    fn new(
        table: &'static str,
        allowed: &[&str],
        columns: &[ast::Ident],
        values: &'a [Expr],
    ) -> Result<Self, SqlError> {
        if columns.is_empty() {
            return Err(SqlError::Parse(format!("INSERT INTO {table} needs a column list")));
        }
        if columns.len() != values.len() {
            return Err(SqlError::WrongArity(table, columns.len(), values.len()));
        }
        let mut cells = Vec::with_capacity(columns.len());
        for (col, value) in columns.iter().zip(values) {
            let name = col.value.to_lowercase();
            if !allowed.contains(&name.as_str()) {
                return Err(SqlError::UnknownColumn(table, name));
            }
            if cells.iter().any(|(c, _)| *c == name) {
                return Err(SqlError::Parse(format!("column {name} given twice")));
            }
            cells.push((name, value));
        }
        Ok(Self { table, cells })
    }

    fn get(&self, col: &str) -> Option<&'a Expr> {
        self.cells.iter().find(|(c, _)| c == col).map(|(_, e)| *e)
    }

    fn req(&self, col: &'static str) -> Result<&'a Expr, SqlError> {
        self.get(col).ok_or(SqlError::MissingColumn(self.table, col))
    }

    fn opt_string(&self, col: &str) -> Result<Option<String>, SqlError> {
        self.get(col).map_or(Ok(None), parse_string_or_null)
    }
}

fn parse_insert(insert: &ast::Insert) -> Result<Command, SqlError> {
    let table = insert_table_name(insert)?;
    let values = extract_insert_row(insert)?;
    let columns = &insert.columns;

    match table.as_str() {
        "hotels" => {
            let row = Row::new("hotels", HOTEL_COLUMNS, columns, values)?;
            Ok(Command::InsertHotel(HotelDraft {
                id: parse_ulid(row.req("id")?)?,
                name: parse_string(row.req("name")?)?,
                description: row.opt_string("description")?.unwrap_or_default(),
                address: parse_string(row.req("address")?)?,
                city: parse_string(row.req("city")?)?,
                country: parse_string(row.req("country")?)?,
                star_rating: parse_u8(row.req("star_rating")?)?,
                image_url: row.opt_string("image_url")?,
            }))
        }
        "rooms" => {
            let row = Row::new("rooms", ROOM_COLUMNS, columns, values)?;
            Ok(Command::InsertRoom(RoomDraft {
                id: parse_ulid(row.req("id")?)?,
                hotel_id: parse_ulid(row.req("hotel_id")?)?,
                room_type: parse_string(row.req("room_type")?)?,
                description: row.opt_string("description")?.unwrap_or_default(),
                price_per_night: parse_decimal(row.req("price_per_night")?)?,
                max_guests: parse_u8(row.req("max_guests")?)?,
                total_rooms: parse_u32(row.req("total_rooms")?)?,
                amenities: row.get("amenities").map_or(Ok(Vec::new()), parse_amenities)?,
            }))
        }
        "bookings" => {
            let row = Row::new("bookings", BOOKING_COLUMNS, columns, values)?;
            Ok(Command::InsertBooking(BookingRequest {
                id: parse_ulid(row.req("id")?)?,
                room_id: parse_ulid(row.req("room_id")?)?,
                check_in: parse_date(row.req("check_in")?)?,
                check_out: parse_date(row.req("check_out")?)?,
                guests: parse_u8(row.req("guests")?)?,
                guest: GuestContact {
                    full_name: parse_string(row.req("guest_name")?)?,
                    email: parse_string(row.req("guest_email")?)?,
                    phone: parse_string(row.req("guest_phone")?)?,
                },
                special_requests: row.opt_string("special_requests")?,
                card_expiry: row.opt_string("card_expiry")?,
            }))
        }
        "reviews" => {
            let row = Row::new("reviews", REVIEW_COLUMNS, columns, values)?;
            Ok(Command::InsertReview(ReviewDraft {
                id: parse_ulid(row.req("id")?)?,
                hotel_id: parse_ulid(row.req("hotel_id")?)?,
                rating: parse_u8(row.req("rating")?)?,
                title: parse_string(row.req("title")?)?,
                comment: parse_string(row.req("comment")?)?,
            }))
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

// ── UPDATE ────────────────────────────────────────────────────

fn parse_update(
    table: &ast::TableWithJoins,
    assignments: &[ast::Assignment],
    selection: Option<&Expr>,
) -> Result<Command, SqlError> {
    let table = table_factor_name(&table.relation)?;
    let id = where_id(selection)?;
    if assignments.is_empty() {
        return Err(SqlError::Parse("UPDATE without SET".into()));
    }

    match table.as_str() {
        "hotels" => {
            let mut patch = HotelPatch::default();
            for a in assignments {
                let value = &a.value;
                match assignment_column(a)?.as_str() {
                    "name" => patch.name = Some(parse_string(value)?),
                    "description" => patch.description = Some(parse_string(value)?),
                    "address" => patch.address = Some(parse_string(value)?),
                    "city" => patch.city = Some(parse_string(value)?),
                    "country" => patch.country = Some(parse_string(value)?),
                    "star_rating" => patch.star_rating = Some(parse_u8(value)?),
                    "image_url" => patch.image_url = Some(parse_string_or_null(value)?),
                    "active" => patch.active = Some(parse_bool(value)?),
                    other => return Err(SqlError::UnknownColumn("hotels", other.into())),
                }
            }
            Ok(Command::UpdateHotel { id, patch })
        }
        "rooms" => {
            let mut patch = RoomPatch::default();
            for a in assignments {
                let value = &a.value;
                match assignment_column(a)?.as_str() {
                    "room_type" => patch.room_type = Some(parse_string(value)?),
                    "description" => patch.description = Some(parse_string(value)?),
                    "price_per_night" => patch.price_per_night = Some(parse_decimal(value)?),
                    "max_guests" => patch.max_guests = Some(parse_u8(value)?),
                    "total_rooms" => patch.total_rooms = Some(parse_u32(value)?),
                    "available" => patch.available = Some(parse_bool(value)?),
                    "amenities" => patch.amenities = Some(parse_amenities(value)?),
                    other => return Err(SqlError::UnknownColumn("rooms", other.into())),
                }
            }
            Ok(Command::UpdateRoom { id, patch })
        }
        "bookings" => {
            let mut status = None;
            for a in assignments {
                match assignment_column(a)?.as_str() {
                    "status" => status = Some(parse_status(&a.value)?),
                    other => return Err(SqlError::UnknownColumn("bookings", other.into())),
                }
            }
            let status = status.ok_or(SqlError::MissingColumn("bookings", "status"))?;
            Ok(Command::UpdateBookingStatus { id, status })
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn assignment_column(a: &ast::Assignment) -> Result<String, SqlError> {
    match &a.target {
        AssignmentTarget::ColumnName(name) => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty column name".into()))
        }
        AssignmentTarget::Tuple(_) => Err(SqlError::Unsupported("tuple assignment".into())),
    }
}

// ── DELETE ────────────────────────────────────────────────────

fn parse_delete(delete: &ast::Delete) -> Result<Command, SqlError> {
    let table = delete_table_name(delete)?;
    let id = where_id(delete.selection.as_ref())?;

    match table.as_str() {
        "hotels" => Ok(Command::DeleteHotel { id }),
        "rooms" => Ok(Command::DeleteRoom { id }),
        "bookings" => Ok(Command::CancelBooking { id }),
        _ => Err(SqlError::UnknownTable(table)),
    }
}

// ── SELECT ────────────────────────────────────────────────────

/// One `column <op> value` term of an AND-only WHERE clause.
struct Predicate<'a> {
    column: String,
    op: BinaryOperator,
    value: &'a Expr,
}

impl Predicate<'_> {
    fn is(&self, column: &str, op: BinaryOperator) -> bool {
        self.column == column && self.op == op
    }
}

fn conjuncts<'a>(expr: &'a Expr, out: &mut Vec<Predicate<'a>>) -> Result<(), SqlError> {
    match expr {
        Expr::Nested(inner) => conjuncts(inner, out),
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            conjuncts(left, out)?;
            conjuncts(right, out)
        }
        Expr::BinaryOp { left, op, right } => {
            let column = expr_column_name(left)
                .ok_or_else(|| SqlError::Unsupported(format!("filter {expr}")))?;
            out.push(Predicate {
                column,
                op: op.clone(),
                value: right,
            });
            Ok(())
        }
        other => Err(SqlError::Unsupported(format!("filter {other}"))),
    }
}

fn predicates(selection: Option<&Expr>) -> Result<Vec<Predicate<'_>>, SqlError> {
    let mut out = Vec::new();
    if let Some(expr) = selection {
        conjuncts(expr, &mut out)?;
    }
    Ok(out)
}

fn unsupported_filter(p: &Predicate<'_>) -> SqlError {
    SqlError::UnsupportedFilter(format!("{} {}", p.column, p.op))
}

fn parse_select(query: &ast::Query) -> Result<Command, SqlError> {
    let select = match query.body.as_ref() {
        SetExpr::Select(s) => s,
        _ => return Err(SqlError::Unsupported("non-SELECT query".into())),
    };
    let Some(from) = select.from.first() else {
        return Err(SqlError::Parse("SELECT without FROM".into()));
    };
    let table = table_factor_name(&from.relation)?;
    let preds = predicates(select.selection.as_ref())?;

    match table.as_str() {
        "hotels" => {
            let mut id = None;
            let mut filter = HotelFilter::default();
            for p in &preds {
                if p.is("id", BinaryOperator::Eq) {
                    id = Some(parse_ulid(p.value)?);
                } else if p.is("search", BinaryOperator::Eq) {
                    filter.term = Some(parse_string(p.value)?);
                } else if p.is("city", BinaryOperator::Eq) {
                    filter.city = Some(parse_string(p.value)?);
                } else if p.is("country", BinaryOperator::Eq) {
                    filter.country = Some(parse_string(p.value)?);
                } else if p.is("star_rating", BinaryOperator::GtEq) {
                    filter.min_stars = Some(parse_u8(p.value)?);
                } else if p.is("price_per_night", BinaryOperator::LtEq) {
                    filter.max_price = Some(parse_decimal(p.value)?);
                } else {
                    return Err(unsupported_filter(p));
                }
            }
            Ok(Command::SelectHotels { id, filter })
        }
        "rooms" => Ok(Command::SelectRooms {
            hotel_id: required_id(&preds, "hotel_id")?,
        }),
        "bookings" => {
            let (mut id, mut status) = (None, None);
            for p in &preds {
                if p.is("id", BinaryOperator::Eq) {
                    id = Some(parse_ulid(p.value)?);
                } else if p.is("status", BinaryOperator::Eq) {
                    status = Some(parse_status(p.value)?);
                } else {
                    return Err(unsupported_filter(p));
                }
            }
            Ok(Command::SelectBookings { id, status })
        }
        "availability" => {
            let (mut room_id, mut check_in, mut check_out) = (None, None, None);
            for p in &preds {
                if p.is("room_id", BinaryOperator::Eq) {
                    room_id = Some(parse_ulid(p.value)?);
                } else if p.is("check_in", BinaryOperator::Eq) {
                    check_in = Some(parse_date(p.value)?);
                } else if p.is("check_out", BinaryOperator::Eq) {
                    check_out = Some(parse_date(p.value)?);
                } else {
                    return Err(unsupported_filter(p));
                }
            }
            Ok(Command::SelectAvailability {
                room_id: room_id.ok_or(SqlError::MissingFilter("room_id"))?,
                check_in: check_in.ok_or(SqlError::MissingFilter("check_in"))?,
                check_out: check_out.ok_or(SqlError::MissingFilter("check_out"))?,
            })
        }
        "review_eligibility" => Ok(Command::SelectReviewEligibility {
            hotel_id: required_id(&preds, "hotel_id")?,
        }),
        "reviews" => Ok(Command::SelectReviews {
            hotel_id: required_id(&preds, "hotel_id")?,
        }),
        "dashboard" => match preds.first() {
            None => Ok(Command::SelectDashboard),
            Some(p) => Err(unsupported_filter(p)),
        },
        _ => Err(SqlError::UnknownTable(table)),
    }
}

/// The single `column = 'ulid'` filter a table requires.
fn required_id(preds: &[Predicate<'_>], column: &'static str) -> Result<Ulid, SqlError> {
    let mut id = None;
    for p in preds {
        if p.is(column, BinaryOperator::Eq) {
            id = Some(parse_ulid(p.value)?);
        } else {
            return Err(unsupported_filter(p));
        }
    }
    id.ok_or(SqlError::MissingFilter(column))
}

fn where_id(selection: Option<&Expr>) -> Result<Ulid, SqlError> {
    required_id(&predicates(selection)?, "id")
}

// ── Helpers ───────────────────────────────────────────────────

fn object_name_last(name: &ast::ObjectName) -> Option<String> {
    name.0.last().and_then(|part| match part {
        ObjectNamePart::Identifier(ident) => Some(ident.value.to_lowercase()),
        _ => None,
    })
}

fn insert_table_name(insert: &ast::Insert) -> Result<String, SqlError> {
    match &insert.table {
        TableObject::TableName(name) => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("unsupported table object in INSERT".into())),
    }
}

fn delete_table_name(delete: &ast::Delete) -> Result<String, SqlError> {
    let tables_with_joins = match &delete.from {
        FromTable::WithFromKeyword(t) | FromTable::WithoutKeyword(t) => t,
    };
    match tables_with_joins.first() {
        Some(first) => table_factor_name(&first.relation),
        None => Err(SqlError::Parse("DELETE without table".into())),
    }
}

fn table_factor_name(tf: &TableFactor) -> Result<String, SqlError> {
    match tf {
        TableFactor::Table { name, .. } => {
            object_name_last(name).ok_or_else(|| SqlError::Parse("empty table name".into()))
        }
        _ => Err(SqlError::Parse("complex table expression".into())),
    }
}

fn extract_insert_row(insert: &ast::Insert) -> Result<&[Expr], SqlError> {
    let body = insert
        .source
        .as_ref()
        .ok_or(SqlError::Parse("no VALUES".into()))?;
    match body.body.as_ref() {
        SetExpr::Values(values) => match values.rows.as_slice() {
            [] => Err(SqlError::Parse("empty VALUES".into())),
            [row] => Ok(row),
            _ => Err(SqlError::Unsupported("multi-row INSERT".into())),
        },
        _ => Err(SqlError::Parse("expected VALUES".into())),
    }
}

fn expr_column_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier(ident) => Some(ident.value.to_lowercase()),
        Expr::CompoundIdentifier(parts) => parts.last().map(|i| i.value.to_lowercase()),
        _ => None,
    }
}

fn extract_value(expr: &Expr) -> Option<&Value> {
    match expr {
        Expr::Value(ValueWithSpan { value, .. }) => Some(value),
        _ => None,
    }
}

fn parse_string(expr: &Expr) -> Result<String, SqlError> {
    match extract_value(expr) {
        Some(Value::SingleQuotedString(s)) => Ok(s.clone()),
        Some(value) => Err(SqlError::Parse(format!("expected string, got {value}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr}"))),
    }
}

fn parse_string_or_null(expr: &Expr) -> Result<Option<String>, SqlError> {
    match extract_value(expr) {
        Some(Value::Null) => Ok(None),
        _ => parse_string(expr).map(Some),
    }
}

fn parse_ulid(expr: &Expr) -> Result<Ulid, SqlError> {
    let s = parse_string(expr)?;
    Ulid::from_string(&s).map_err(|e| SqlError::Parse(format!("bad ULID {s}: {e}")))
}

fn parse_date(expr: &Expr) -> Result<NaiveDate, SqlError> {
    let s = parse_string(expr)?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
        .map_err(|e| SqlError::Parse(format!("bad date {s}: {e}")))
}

/// Numeric literal text, with a leading minus folded in. Quoted numbers are
/// accepted too.
fn numeric_text(expr: &Expr) -> Result<String, SqlError> {
    if let Expr::UnaryOp {
        op: ast::UnaryOperator::Minus,
        expr,
    } = expr
    {
        return Ok(format!("-{}", numeric_text(expr)?));
    }
    match extract_value(expr) {
        Some(Value::Number(s, _)) | Some(Value::SingleQuotedString(s)) => Ok(s.clone()),
        Some(value) => Err(SqlError::Parse(format!("expected number, got {value}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr}"))),
    }
}

fn parse_i64(expr: &Expr) -> Result<i64, SqlError> {
    let s = numeric_text(expr)?;
    s.parse()
        .map_err(|e| SqlError::Parse(format!("bad integer {s}: {e}")))
}

fn parse_u8(expr: &Expr) -> Result<u8, SqlError> {
    let v = parse_i64(expr)?;
    u8::try_from(v).map_err(|_| SqlError::Parse(format!("{v} out of range")))
}

fn parse_u32(expr: &Expr) -> Result<u32, SqlError> {
    let v = parse_i64(expr)?;
    u32::try_from(v).map_err(|_| SqlError::Parse(format!("{v} out of range")))
}

fn parse_decimal(expr: &Expr) -> Result<Decimal, SqlError> {
    let s = numeric_text(expr)?;
    Decimal::from_str(&s).map_err(|e| SqlError::Parse(format!("bad amount {s}: {e}")))
}

fn parse_bool(expr: &Expr) -> Result<bool, SqlError> {
    match extract_value(expr) {
        Some(Value::Boolean(b)) => Ok(*b),
        Some(Value::SingleQuotedString(s)) => match s.to_lowercase().as_str() {
            "true" | "t" | "1" => Ok(true),
            "false" | "f" | "0" => Ok(false),
            _ => Err(SqlError::Parse(format!("bad bool: {s}"))),
        },
        Some(Value::Number(n, _)) => Ok(n != "0"),
        Some(value) => Err(SqlError::Parse(format!("expected bool, got {value}"))),
        None => Err(SqlError::Parse(format!("expected value, got {expr}"))),
    }
}

fn parse_status(expr: &Expr) -> Result<BookingStatus, SqlError> {
    BookingStatus::from_str(&parse_string(expr)?).map_err(SqlError::Parse)
}

/// `'wifi,balcony'` or `ARRAY['wifi', 'balcony']`.
fn parse_amenities(expr: &Expr) -> Result<Vec<Amenity>, SqlError> {
    let names: Vec<String> = match expr {
        Expr::Array(array) => array
            .elem
            .iter()
            .map(parse_string)
            .collect::<Result<_, _>>()?,
        _ => match parse_string_or_null(expr)? {
            None => Vec::new(),
            Some(s) => s.split(',').map(str::to_string).collect(),
        },
    };
    names
        .iter()
        .filter(|n| !n.trim().is_empty())
        .map(|n| Amenity::from_str(n).map_err(SqlError::Parse))
        .collect()
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
pub enum SqlError {
    Parse(String),
    Empty,
    Unsupported(String),
    UnknownTable(String),
    UnknownColumn(&'static str, String),
    MissingColumn(&'static str, &'static str),
    WrongArity(&'static str, usize, usize),
    MissingFilter(&'static str),
    UnsupportedFilter(String),
}

impl std::fmt::Display for SqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlError::Parse(s) => write!(f, "parse error: {s}"),
            SqlError::Empty => write!(f, "empty query"),
            SqlError::Unsupported(s) => write!(f, "unsupported: {s}"),
            SqlError::UnknownTable(t) => write!(f, "unknown table: {t}"),
            SqlError::UnknownColumn(t, c) => write!(f, "unknown column {c} in {t}"),
            SqlError::MissingColumn(t, c) => write!(f, "{t}: column {c} is required"),
            SqlError::WrongArity(t, expected, got) => {
                write!(f, "{t}: {expected} columns but {got} values")
            }
            SqlError::MissingFilter(col) => write!(f, "missing filter: {col}"),
            SqlError::UnsupportedFilter(s) => write!(f, "unsupported filter: {s}"),
        }
    }
}

impl std::error::Error for SqlError {}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
    const ID2: &str = "01BX5ZZKBKACTAV9WEVGEMMVRZ";

    fn ulid(s: &str) -> Ulid {
        Ulid::from_string(s).unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn insert_hotel() {
        let sql = format!(
            "INSERT INTO hotels (id, name, address, city, country, star_rating) \
             VALUES ('{ID}', 'Seaview', '1 Beach Rd', 'Faro', 'Portugal', 4)"
        );
        let Command::InsertHotel(draft) = parse_sql(&sql).unwrap() else {
            panic!("expected InsertHotel");
        };
        assert_eq!(draft.id, ulid(ID));
        assert_eq!(draft.name, "Seaview");
        assert_eq!(draft.description, "");
        assert_eq!(draft.star_rating, 4);
        assert_eq!(draft.image_url, None);
    }

    #[test]
    fn insert_columns_in_any_order() {
        let sql = format!(
            "INSERT INTO reviews (rating, comment, title, hotel_id, id) \
             VALUES (5, 'Great', 'Loved it', '{ID2}', '{ID}')"
        );
        assert_eq!(
            parse_sql(&sql).unwrap(),
            Command::InsertReview(ReviewDraft {
                id: ulid(ID),
                hotel_id: ulid(ID2),
                rating: 5,
                title: "Loved it".into(),
                comment: "Great".into(),
            })
        );
    }

    #[test]
    fn insert_room_with_amenities() {
        let sql = format!(
            "INSERT INTO rooms (id, hotel_id, room_type, price_per_night, max_guests, total_rooms, amenities) \
             VALUES ('{ID}', '{ID2}', 'Suite', 249.99, 3, 2, 'wifi, ac,minibar')"
        );
        let Command::InsertRoom(room) = parse_sql(&sql).unwrap() else {
            panic!("expected InsertRoom");
        };
        assert_eq!(room.price_per_night, Decimal::new(24999, 2));
        assert_eq!(room.max_guests, 3);
        assert_eq!(room.total_rooms, 2);
        assert_eq!(
            room.amenities,
            vec![Amenity::Wifi, Amenity::AirConditioning, Amenity::Minibar]
        );

        let sql = format!(
            "INSERT INTO rooms (id, hotel_id, room_type, price_per_night, max_guests, total_rooms, amenities) \
             VALUES ('{ID}', '{ID2}', 'Suite', '80', 2, 1, ARRAY['balcony'])"
        );
        let Command::InsertRoom(room) = parse_sql(&sql).unwrap() else {
            panic!("expected InsertRoom");
        };
        assert_eq!(room.price_per_night, Decimal::new(80, 0));
        assert_eq!(room.amenities, vec![Amenity::Balcony]);
    }

    #[test]
    fn insert_booking() {
        let sql = format!(
            "INSERT INTO bookings (id, room_id, check_in, check_out, guests, guest_name, guest_email, guest_phone, card_expiry) \
             VALUES ('{ID}', '{ID2}', '2025-07-01', '2025-07-04', 2, 'Ann', 'ann@example.com', '555', '12/30')"
        );
        let Command::InsertBooking(req) = parse_sql(&sql).unwrap() else {
            panic!("expected InsertBooking");
        };
        assert_eq!(req.check_in, d("2025-07-01"));
        assert_eq!(req.check_out, d("2025-07-04"));
        assert_eq!(req.guests, 2);
        assert_eq!(req.guest.email, "ann@example.com");
        assert_eq!(req.special_requests, None);
        assert_eq!(req.card_expiry.as_deref(), Some("12/30"));
    }

    #[test]
    fn insert_errors() {
        let missing = format!("INSERT INTO reviews (id, hotel_id, rating, title) VALUES ('{ID}', '{ID}', 5, 'x')");
        assert_eq!(
            parse_sql(&missing),
            Err(SqlError::MissingColumn("reviews", "comment"))
        );
        let unknown = format!("INSERT INTO hotels (id, stars) VALUES ('{ID}', 3)");
        assert_eq!(
            parse_sql(&unknown),
            Err(SqlError::UnknownColumn("hotels", "stars".into()))
        );
        let no_cols = format!("INSERT INTO hotels VALUES ('{ID}')");
        assert!(matches!(parse_sql(&no_cols), Err(SqlError::Parse(_))));
        let bad_date = format!(
            "INSERT INTO bookings (id, room_id, check_in, check_out, guests, guest_name, guest_email, guest_phone) \
             VALUES ('{ID}', '{ID}', '07/01/2025', '2025-07-04', 1, 'a', 'a@b', '1')"
        );
        assert!(matches!(parse_sql(&bad_date), Err(SqlError::Parse(_))));
        let unknown_table = format!("INSERT INTO guests (id) VALUES ('{ID}')");
        assert_eq!(
            parse_sql(&unknown_table),
            Err(SqlError::UnknownTable("guests".into()))
        );
        let twice = format!(
            "INSERT INTO reviews (id, hotel_id, rating, rating, title, comment) \
             VALUES ('{ID}', '{ID}', 5, 1, 'x', 'y')"
        );
        assert_eq!(
            parse_sql(&twice),
            Err(SqlError::Parse("column rating given twice".into()))
        );
    }

    #[test]
    fn update_hotel_and_room() {
        let sql = format!("UPDATE hotels SET active = false, image_url = NULL WHERE id = '{ID}'");
        assert_eq!(
            parse_sql(&sql).unwrap(),
            Command::UpdateHotel {
                id: ulid(ID),
                patch: HotelPatch {
                    active: Some(false),
                    image_url: Some(None),
                    ..HotelPatch::default()
                },
            }
        );

        let sql = format!(
            "UPDATE rooms SET price_per_night = 99.5, total_rooms = 3, available = true WHERE id = '{ID}'"
        );
        assert_eq!(
            parse_sql(&sql).unwrap(),
            Command::UpdateRoom {
                id: ulid(ID),
                patch: RoomPatch {
                    price_per_night: Some(Decimal::new(995, 1)),
                    total_rooms: Some(3),
                    available: Some(true),
                    ..RoomPatch::default()
                },
            }
        );
    }

    #[test]
    fn update_booking_status() {
        let sql = format!("UPDATE bookings SET status = 'completed' WHERE id = '{ID}'");
        assert_eq!(
            parse_sql(&sql).unwrap(),
            Command::UpdateBookingStatus {
                id: ulid(ID),
                status: BookingStatus::Completed,
            }
        );
        let sql = format!("UPDATE bookings SET guests = 3 WHERE id = '{ID}'");
        assert!(matches!(parse_sql(&sql), Err(SqlError::UnknownColumn(..))));
        let sql = "UPDATE bookings SET status = 'cancelled'";
        assert_eq!(parse_sql(sql), Err(SqlError::MissingFilter("id")));
    }

    #[test]
    fn delete_maps_to_cancel_for_bookings() {
        let sql = format!("DELETE FROM bookings WHERE id = '{ID}'");
        assert_eq!(parse_sql(&sql).unwrap(), Command::CancelBooking { id: ulid(ID) });
        let sql = format!("DELETE FROM rooms WHERE id = '{ID}'");
        assert_eq!(parse_sql(&sql).unwrap(), Command::DeleteRoom { id: ulid(ID) });
        let sql = format!("DELETE FROM hotels WHERE id = '{ID}'");
        assert_eq!(parse_sql(&sql).unwrap(), Command::DeleteHotel { id: ulid(ID) });
    }

    #[test]
    fn select_hotels_with_filters() {
        assert_eq!(
            parse_sql("SELECT * FROM hotels").unwrap(),
            Command::SelectHotels {
                id: None,
                filter: HotelFilter::default(),
            }
        );
        let sql = "SELECT * FROM hotels WHERE city = 'Lisbon' AND (star_rating >= 4 AND price_per_night <= 150) AND search = 'view'";
        assert_eq!(
            parse_sql(sql).unwrap(),
            Command::SelectHotels {
                id: None,
                filter: HotelFilter {
                    term: Some("view".into()),
                    city: Some("Lisbon".into()),
                    country: None,
                    min_stars: Some(4),
                    max_price: Some(Decimal::new(150, 0)),
                },
            }
        );
        let sql = "SELECT * FROM hotels WHERE star_rating = 4";
        assert!(matches!(parse_sql(sql), Err(SqlError::UnsupportedFilter(_))));
        let sql = "SELECT * FROM hotels WHERE city = 'a' OR city = 'b'";
        assert!(parse_sql(sql).is_err());
    }

    #[test]
    fn select_availability() {
        let sql = format!(
            "SELECT * FROM availability WHERE room_id = '{ID}' AND check_in = '2025-07-01' AND check_out = '2025-07-04'"
        );
        assert_eq!(
            parse_sql(&sql).unwrap(),
            Command::SelectAvailability {
                room_id: ulid(ID),
                check_in: d("2025-07-01"),
                check_out: d("2025-07-04"),
            }
        );
        let sql = format!("SELECT * FROM availability WHERE room_id = '{ID}'");
        assert_eq!(parse_sql(&sql), Err(SqlError::MissingFilter("check_in")));
    }

    #[test]
    fn select_by_hotel() {
        let sql = format!("SELECT * FROM rooms WHERE hotel_id = '{ID}'");
        assert_eq!(parse_sql(&sql).unwrap(), Command::SelectRooms { hotel_id: ulid(ID) });
        let sql = format!("SELECT * FROM reviews WHERE hotel_id = '{ID}'");
        assert_eq!(parse_sql(&sql).unwrap(), Command::SelectReviews { hotel_id: ulid(ID) });
        let sql = format!("SELECT * FROM review_eligibility WHERE hotel_id = '{ID}'");
        assert_eq!(
            parse_sql(&sql).unwrap(),
            Command::SelectReviewEligibility { hotel_id: ulid(ID) }
        );
        assert_eq!(
            parse_sql("SELECT * FROM rooms"),
            Err(SqlError::MissingFilter("hotel_id"))
        );
    }

    #[test]
    fn select_bookings_and_dashboard() {
        assert_eq!(
            parse_sql("SELECT * FROM bookings WHERE status = 'canceled'").unwrap(),
            Command::SelectBookings {
                id: None,
                status: Some(BookingStatus::Cancelled),
            }
        );
        assert_eq!(parse_sql("SELECT * FROM dashboard").unwrap(), Command::SelectDashboard);
        assert!(parse_sql("SELECT * FROM bookings WHERE status = 'lost'").is_err());
    }

    #[test]
    fn empty_and_unsupported() {
        assert_eq!(parse_sql(""), Err(SqlError::Empty));
        assert!(matches!(
            parse_sql("CREATE TABLE x (id int)"),
            Err(SqlError::Unsupported(_))
        ));
        assert!(matches!(parse_sql("SELEC nonsense"), Err(SqlError::Parse(_))));
    }
}
