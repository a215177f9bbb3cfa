use std::str::FromStr;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, Timelike, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::models::{
    Booking, BookingStatus, BookingSummary, CardDetails, Expense, ExpenseCategory, Payment,
    PaymentMethod, PaymentWithBooking,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Current UTC time at the second precision timestamps are stored with.
pub fn now() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).with_context(|| format!("bad stored date: {s}"))
}

fn parse_decimal(s: &str) -> anyhow::Result<Decimal> {
    Decimal::from_str(s).with_context(|| format!("bad stored amount: {s}"))
}

// ── Expenses ──

const EXPENSE_COLUMNS: &str = "id, title, amount, category, date, notes, created_at, updated_at";

pub fn insert_expense(conn: &Connection, expense: &Expense) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO expenses (id, title, amount, category, date, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            expense.id,
            expense.title,
            expense.amount.to_string(),
            expense.category.as_str(),
            format_date(&expense.date),
            expense.notes,
            format_ts(&expense.created_at),
            format_ts(&expense.updated_at),
        ],
    )?;
    Ok(())
}

pub fn list_expenses(conn: &Connection) -> anyhow::Result<Vec<Expense>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EXPENSE_COLUMNS} FROM expenses ORDER BY date DESC, created_at DESC"
    ))?;

    let rows = stmt.query_map([], |row| Ok(parse_expense_row(row)))?;

    let mut expenses = vec![];
    for row in rows {
        expenses.push(row??);
    }
    Ok(expenses)
}

pub fn get_expense(conn: &Connection, id: &str) -> anyhow::Result<Option<Expense>> {
    let result = conn
        .query_row(
            &format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1"),
            params![id],
            |row| Ok(parse_expense_row(row)),
        )
        .optional()?;

    result.transpose()
}

/// Overwrites every editable field. Returns false when the id is unknown.
pub fn replace_expense(conn: &Connection, expense: &Expense) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE expenses SET title = ?1, amount = ?2, category = ?3, date = ?4, notes = ?5, updated_at = ?6
         WHERE id = ?7",
        params![
            expense.title,
            expense.amount.to_string(),
            expense.category.as_str(),
            format_date(&expense.date),
            expense.notes,
            format_ts(&expense.updated_at),
            expense.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_expense(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM expenses WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_expense_row(row: &rusqlite::Row) -> anyhow::Result<Expense> {
    let id: String = row.get(0)?;
    let title: String = row.get(1)?;
    let amount_str: String = row.get(2)?;
    let category_str: String = row.get(3)?;
    let date_str: String = row.get(4)?;
    let notes: Option<String> = row.get(5)?;
    let created_at_str: String = row.get(6)?;
    let updated_at_str: String = row.get(7)?;

    let category = ExpenseCategory::parse(&category_str)
        .with_context(|| format!("unknown stored category: {category_str}"))?;

    Ok(Expense {
        id,
        title,
        amount: parse_decimal(&amount_str)?,
        category,
        date: parse_date(&date_str)?,
        notes,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

// ── Bookings ──

const BOOKING_COLUMNS: &str =
    "id, customer_name, pickup_location, drop_location, date, status, paid, created_at, updated_at";

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, customer_name, pickup_location, drop_location, date, status, paid, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            booking.id,
            booking.customer_name,
            booking.pickup_location,
            booking.drop_location,
            booking.date.as_ref().map(format_date),
            booking.status.as_str(),
            booking.paid as i32,
            format_ts(&booking.created_at),
            format_ts(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn list_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
) -> anyhow::Result<Vec<Booking>> {
    let mut bookings = vec![];
    match status_filter {
        Some(status) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ?1 ORDER BY date DESC, created_at DESC"
            ))?;
            let rows = stmt.query_map(params![status.as_str()], |row| Ok(parse_booking_row(row)))?;
            for row in rows {
                bookings.push(row??);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY date DESC, created_at DESC"
            ))?;
            let rows = stmt.query_map([], |row| Ok(parse_booking_row(row)))?;
            for row in rows {
                bookings.push(row??);
            }
        }
    }
    Ok(bookings)
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;

    result.transpose()
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), format_ts(&now()), id],
    )?;
    Ok(count > 0)
}

/// One-way: there is no query that clears `paid`.
pub fn mark_booking_paid(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET paid = 1, updated_at = ?1 WHERE id = ?2",
        params![format_ts(&now()), id],
    )?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let customer_name: Option<String> = row.get(1)?;
    let pickup_location: String = row.get(2)?;
    let drop_location: String = row.get(3)?;
    let date_str: Option<String> = row.get(4)?;
    let status_str: String = row.get(5)?;
    let paid: bool = row.get::<_, i32>(6)? != 0;
    let created_at_str: String = row.get(7)?;
    let updated_at_str: String = row.get(8)?;

    Ok(Booking {
        id,
        customer_name,
        pickup_location,
        drop_location,
        date: date_str.as_deref().map(parse_date).transpose()?,
        status: BookingStatus::parse(&status_str)
            .with_context(|| format!("unknown stored booking status: {status_str}"))?,
        paid,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

// ── Payments ──

const PAYMENT_COLUMNS: &str =
    "p.id, p.booking_id, p.amount, p.method, p.card_number, p.card_holder, p.expiry, p.cvv, p.created_at";

pub fn insert_payment(conn: &Connection, payment: &Payment) -> anyhow::Result<()> {
    let card = payment.method.card();
    conn.execute(
        "INSERT INTO payments (id, booking_id, method, amount, card_number, card_holder, expiry, cvv, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            payment.id,
            payment.booking_id,
            payment.method.as_str(),
            payment.amount.to_string(),
            card.map(|c| c.card_number.as_str()),
            card.map(|c| c.card_holder.as_str()),
            card.map(|c| c.expiry.as_str()),
            card.map(|c| c.cvv.as_str()),
            format_ts(&payment.created_at),
        ],
    )?;
    Ok(())
}

/// Every payment, newest first, with its booking resolved by a left join.
pub fn list_payments_with_bookings(conn: &Connection) -> anyhow::Result<Vec<PaymentWithBooking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PAYMENT_COLUMNS}, b.id, b.pickup_location, b.drop_location, b.date, b.status, b.paid
         FROM payments p LEFT JOIN bookings b ON b.id = p.booking_id
         ORDER BY p.created_at DESC, p.rowid DESC"
    ))?;

    let rows = stmt.query_map([], |row| Ok(parse_payment_with_booking_row(row)))?;

    let mut payments = vec![];
    for row in rows {
        payments.push(row??);
    }
    Ok(payments)
}

pub fn list_payments_for_booking(
    conn: &Connection,
    booking_id: &str,
) -> anyhow::Result<Vec<Payment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments p WHERE p.booking_id = ?1 ORDER BY p.created_at ASC, p.rowid ASC"
    ))?;

    let rows = stmt.query_map(params![booking_id], |row| Ok(parse_payment_row(row)))?;

    let mut payments = vec![];
    for row in rows {
        payments.push(row??);
    }
    Ok(payments)
}

fn parse_payment_row(row: &rusqlite::Row) -> anyhow::Result<Payment> {
    let id: String = row.get(0)?;
    let booking_id: String = row.get(1)?;
    let amount_str: String = row.get(2)?;
    let method_str: String = row.get(3)?;
    let card_number: Option<String> = row.get(4)?;
    let card_holder: Option<String> = row.get(5)?;
    let expiry: Option<String> = row.get(6)?;
    let cvv: Option<String> = row.get(7)?;
    let created_at_str: String = row.get(8)?;

    let method = match method_str.as_str() {
        "cash" => PaymentMethod::Cash,
        "online" => match (card_number, card_holder, expiry, cvv) {
            (Some(card_number), Some(card_holder), Some(expiry), Some(cvv)) => {
                PaymentMethod::Online(CardDetails {
                    card_number,
                    card_holder,
                    expiry,
                    cvv,
                })
            }
            _ => anyhow::bail!("online payment {id} is missing card fields"),
        },
        other => anyhow::bail!("unknown stored payment method: {other}"),
    };

    Ok(Payment {
        id,
        booking_id,
        amount: parse_decimal(&amount_str)?,
        method,
        created_at: parse_ts(&created_at_str),
    })
}

fn parse_payment_with_booking_row(row: &rusqlite::Row) -> anyhow::Result<PaymentWithBooking> {
    let payment = parse_payment_row(row)?;

    let booking_id: Option<String> = row.get(9)?;
    let booking = match booking_id {
        Some(id) => {
            let date_str: Option<String> = row.get(12)?;
            let status_str: String = row.get(13)?;
            Some(BookingSummary {
                id,
                pickup_location: row.get(10)?,
                drop_location: row.get(11)?,
                date: date_str.as_deref().map(parse_date).transpose()?,
                status: BookingStatus::parse(&status_str)
                    .with_context(|| format!("unknown stored booking status: {status_str}"))?,
                paid: row.get::<_, i32>(14)? != 0,
            })
        }
        None => None,
    };

    Ok(PaymentWithBooking { payment, booking })
}
