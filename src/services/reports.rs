//! Read-side aggregation over the payment and expense ledgers.
//!
//! Income is keyed on the *booking's* trip date, never on when the payment
//! was made. Month filters are substring matches against `YYYY-MM`, so an
//! empty filter keeps everything that has a date.

use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::errors::AppError;
use crate::models::{Expense, FinancialSummary, IncomeReport, PaymentWithBooking};
use crate::services::{expenses, payments};

fn month_matches(date: chrono::NaiveDate, filter: &str) -> bool {
    date.format("%Y-%m").to_string().contains(filter)
}

/// Sums without panicking. Stored amounts are bounded at write time, so
/// overflow here means the ledger holds rows that bypassed validation.
fn checked_total(mut amounts: impl Iterator<Item = Decimal>) -> Result<Decimal, AppError> {
    amounts
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
        .ok_or_else(|| AppError::Storage(anyhow::anyhow!("amount total overflowed")))
}

pub fn filter_income(
    payments: Vec<PaymentWithBooking>,
    month: &str,
) -> Result<IncomeReport, AppError> {
    let filtered: Vec<PaymentWithBooking> = payments
        .into_iter()
        .filter(|p| p.booking_date().is_some_and(|d| month_matches(d, month)))
        .collect();

    let total_amount = checked_total(filtered.iter().map(|p| p.payment.amount))?;

    Ok(IncomeReport {
        month: month.to_string(),
        count: filtered.len(),
        total_amount,
        payments: filtered,
    })
}

pub fn income_report(conn: &Connection, month: &str) -> Result<IncomeReport, AppError> {
    filter_income(payments::list(conn)?, month)
}

/// Case-insensitive substring match over title, category and notes.
pub fn search_expenses(expenses: Vec<Expense>, term: &str) -> Vec<Expense> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return expenses;
    }
    expenses
        .into_iter()
        .filter(|e| e.search_text().to_lowercase().contains(&term))
        .collect()
}

pub fn summary(conn: &Connection, month: &str) -> Result<FinancialSummary, AppError> {
    let total_income = income_report(conn, month)?.total_amount;

    let total_expenses = checked_total(
        expenses::list(conn)?
            .iter()
            .filter(|e| month_matches(e.date, month))
            .map(|e| e.amount),
    )?;
    let net = total_income
        .checked_sub(total_expenses)
        .ok_or_else(|| AppError::Storage(anyhow::anyhow!("net total overflowed")))?;

    Ok(FinancialSummary {
        month: month.to_string(),
        total_income,
        total_expenses,
        net,
    })
}
