use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{FinancialSummary, IncomeReport};
use crate::services::reports;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MonthQuery {
    /// `YYYY-MM`, or any part of it.
    pub month: Option<String>,
}

// GET /api/incomes
pub async fn income_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<IncomeReport>, AppError> {
    let month = query.month.unwrap_or_default();
    let db = state.db()?;
    Ok(Json(reports::income_report(&db, month.trim())?))
}

// GET /api/reports/summary
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<FinancialSummary>, AppError> {
    let month = query.month.unwrap_or_default();
    let db = state.db()?;
    Ok(Json(reports::summary(&db, month.trim())?))
}
