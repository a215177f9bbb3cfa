use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Expense, ExpenseForm};
use crate::services::{expenses, reports};
use crate::state::AppState;

// GET /api/expenses
#[derive(Deserialize)]
pub struct ExpensesQuery {
    pub search: Option<String>,
}

pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExpensesQuery>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let all = {
        let db = state.db()?;
        expenses::list(&db)?
    };

    let listed = match query.search.as_deref() {
        Some(term) => reports::search_expenses(all, term),
        None => all,
    };
    Ok(Json(listed))
}

// GET /api/expenses/:id
pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Expense>, AppError> {
    let db = state.db()?;
    Ok(Json(expenses::get(&db, &id)?))
}

// POST /api/expenses
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExpenseForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    let Json(form) = payload?;
    let db = state.db()?;
    let expense = expenses::create(&db, &form)?;
    Ok((StatusCode::CREATED, Json(expense)))
}

// PUT /api/expenses/:id
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ExpenseForm>, JsonRejection>,
) -> Result<Json<Expense>, AppError> {
    let Json(form) = payload?;
    let db = state.db()?;
    Ok(Json(expenses::update(&db, &id, &form)?))
}

// DELETE /api/expenses/:id
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.db()?;
    expenses::delete(&db, &id)?;
    Ok(Json(serde_json::json!({ "message": "Expense deleted successfully" })))
}
