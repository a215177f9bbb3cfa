pub mod booking;
pub mod expense;
pub mod payment;
pub mod report;

pub use booking::{Booking, BookingForm, BookingStatus};
pub use expense::{Expense, ExpenseCategory, ExpenseForm};
pub use payment::{
    BookingSummary, CardDetails, NewPayment, Payment, PaymentForm, PaymentMethod,
    PaymentWithBooking,
};
pub use report::{FinancialSummary, IncomeReport};

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;

/// Largest amount a single expense or payment may carry. Keeps ledger totals
/// far away from `Decimal::MAX`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, keeping only the date.
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}
