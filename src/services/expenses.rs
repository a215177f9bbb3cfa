use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{parse_calendar_date, Expense, ExpenseCategory, ExpenseForm, MAX_AMOUNT};

/// Expense fields that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseFields {
    pub title: String,
    pub amount: Decimal,
    pub category: ExpenseCategory,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

pub fn validate(form: &ExpenseForm) -> Result<ExpenseFields, AppError> {
    let title = form
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Title is required".to_string()))?;

    let amount = form
        .amount
        .filter(|a| *a > Decimal::ZERO)
        .ok_or_else(|| AppError::Validation("Amount must be positive".to_string()))?;
    if amount > MAX_AMOUNT {
        return Err(AppError::Validation(format!(
            "Amount must not exceed {MAX_AMOUNT}"
        )));
    }

    let category = match form.category.as_deref().map(str::trim) {
        None | Some("") => return Err(AppError::Validation("Category is required".to_string())),
        Some(c) => ExpenseCategory::parse(c)
            .ok_or_else(|| AppError::Validation(format!("Unknown category: {c}")))?,
    };

    let date = match form.date.as_deref().map(str::trim) {
        None | Some("") => return Err(AppError::Validation("Date is required".to_string())),
        Some(d) => parse_calendar_date(d)
            .ok_or_else(|| AppError::Validation(format!("Invalid date: {d}")))?,
    };

    let notes = form
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    Ok(ExpenseFields {
        title: title.to_string(),
        amount,
        category,
        date,
        notes,
    })
}

pub fn list(conn: &Connection) -> Result<Vec<Expense>, AppError> {
    Ok(queries::list_expenses(conn)?)
}

pub fn get(conn: &Connection, id: &str) -> Result<Expense, AppError> {
    queries::get_expense(conn, id)?.ok_or(AppError::NotFound("Expense"))
}

pub fn create(conn: &Connection, form: &ExpenseForm) -> Result<Expense, AppError> {
    let fields = validate(form)?;
    let now = queries::now();

    let expense = Expense {
        id: uuid::Uuid::new_v4().to_string(),
        title: fields.title,
        amount: fields.amount,
        category: fields.category,
        date: fields.date,
        notes: fields.notes,
        created_at: now,
        updated_at: now,
    };
    queries::insert_expense(conn, &expense)?;

    tracing::info!(expense_id = %expense.id, category = expense.category.as_str(), "expense recorded");
    Ok(expense)
}

/// Full-record replace. Validation runs before the lookup.
pub fn update(conn: &Connection, id: &str, form: &ExpenseForm) -> Result<Expense, AppError> {
    let fields = validate(form)?;
    let existing = get(conn, id)?;

    let expense = Expense {
        id: existing.id,
        title: fields.title,
        amount: fields.amount,
        category: fields.category,
        date: fields.date,
        notes: fields.notes,
        created_at: existing.created_at,
        updated_at: queries::now(),
    };

    if !queries::replace_expense(conn, &expense)? {
        return Err(AppError::NotFound("Expense"));
    }
    Ok(expense)
}

pub fn delete(conn: &Connection, id: &str) -> Result<(), AppError> {
    if queries::delete_expense(conn, id)? {
        tracing::info!(expense_id = %id, "expense deleted");
        Ok(())
    } else {
        Err(AppError::NotFound("Expense"))
    }
}
