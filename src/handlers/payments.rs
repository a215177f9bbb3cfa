use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{Payment, PaymentForm, PaymentWithBooking};
use crate::services::payments;
use crate::state::AppState;

#[derive(Serialize)]
pub struct PaymentCreated {
    message: &'static str,
    payment: Payment,
}

// POST /api/payments
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PaymentForm>, JsonRejection>,
) -> Result<(StatusCode, Json<PaymentCreated>), AppError> {
    let Json(form) = payload?;

    let payment = {
        let mut db = state.db()?;
        payments::create(&mut db, &form, state.config.duplicate_payments)?
    };

    Ok((
        StatusCode::CREATED,
        Json(PaymentCreated {
            message: "Payment successful",
            payment,
        }),
    ))
}

// GET /api/payments
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PaymentWithBooking>>, AppError> {
    let db = state.db()?;
    Ok(Json(payments::list(&db)?))
}
