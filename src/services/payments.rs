use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::config::DuplicatePaymentPolicy;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    CardDetails, NewPayment, Payment, PaymentForm, PaymentMethod, PaymentWithBooking, MAX_AMOUNT,
};

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Turns a raw submission into a typed payment. Nothing is written here.
pub fn validate(form: &PaymentForm) -> Result<NewPayment, AppError> {
    let (booking_id, method, amount) = match (
        non_blank(&form.booking_id),
        non_blank(&form.method),
        form.amount.filter(|a| !a.is_zero()),
    ) {
        (Some(b), Some(m), Some(a)) => (b, m, a),
        _ => {
            return Err(AppError::Validation(
                "Booking ID, method, and amount are required".to_string(),
            ))
        }
    };

    let method = match method {
        "cash" => PaymentMethod::Cash,
        "online" => PaymentMethod::Online(validate_card(form)?),
        _ => return Err(AppError::Validation("Invalid payment method".to_string())),
    };

    if amount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Amount must be greater than 0".to_string(),
        ));
    }
    if amount > MAX_AMOUNT {
        return Err(AppError::Validation(format!(
            "Amount must not exceed {MAX_AMOUNT}"
        )));
    }

    Ok(NewPayment {
        booking_id: booking_id.to_string(),
        amount,
        method,
    })
}

fn validate_card(form: &PaymentForm) -> Result<CardDetails, AppError> {
    let (card_number, card_holder, expiry, cvv) = match (
        non_blank(&form.card_number),
        non_blank(&form.card_holder),
        non_blank(&form.expiry),
        non_blank(&form.cvv),
    ) {
        (Some(n), Some(h), Some(e), Some(c)) => (n, h, e, c),
        _ => {
            return Err(AppError::Validation(
                "All card details are required for online payment".to_string(),
            ))
        }
    };

    let card_number: String = card_number.chars().filter(|c| !c.is_whitespace()).collect();
    if card_number.len() != 16 || !card_number.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "Enter a valid 16-digit card number".to_string(),
        ));
    }
    if !is_valid_expiry(expiry) {
        return Err(AppError::Validation(
            "Expiry must be in MM/YY format".to_string(),
        ));
    }
    if cvv.len() != 3 || !cvv.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation("CVV must be 3 digits".to_string()));
    }

    Ok(CardDetails {
        card_number,
        card_holder: card_holder.to_string(),
        expiry: expiry.to_string(),
        cvv: cvv.to_string(),
    })
}

fn is_valid_expiry(expiry: &str) -> bool {
    let Some((month, year)) = expiry.split_once('/') else {
        return false;
    };
    let two_digits = |s: &str| s.len() == 2 && s.chars().all(|c| c.is_ascii_digit());
    if !two_digits(month) || !two_digits(year) {
        return false;
    }
    matches!(month.parse::<u8>(), Ok(1..=12))
}

/// Writes the payment and flips the booking's `paid` flag in one transaction.
/// Either both land or neither does.
pub fn record_payment(
    conn: &mut Connection,
    new_payment: NewPayment,
    policy: DuplicatePaymentPolicy,
) -> Result<Payment, AppError> {
    let tx = conn.transaction()?;

    let booking = queries::get_booking(&tx, &new_payment.booking_id)?.ok_or_else(|| {
        AppError::Validation(format!("Booking {} does not exist", new_payment.booking_id))
    })?;

    if !booking.is_payable() {
        return Err(AppError::Validation(format!(
            "Booking is {} and cannot be paid",
            booking.status.as_str()
        )));
    }

    if booking.paid {
        match policy {
            DuplicatePaymentPolicy::Reject => {
                return Err(AppError::Conflict("Booking is already paid".to_string()));
            }
            DuplicatePaymentPolicy::Allow => {
                tracing::warn!(booking_id = %booking.id, "recording additional payment for already-paid booking");
            }
        }
    }

    let payment = Payment {
        id: uuid::Uuid::new_v4().to_string(),
        booking_id: booking.id,
        amount: new_payment.amount,
        method: new_payment.method,
        created_at: queries::now(),
    };

    queries::insert_payment(&tx, &payment)?;
    if !queries::mark_booking_paid(&tx, &payment.booking_id)? {
        return Err(AppError::Storage(anyhow::anyhow!(
            "booking {} vanished while recording payment",
            payment.booking_id
        )));
    }

    tx.commit()?;

    tracing::info!(
        payment_id = %payment.id,
        booking_id = %payment.booking_id,
        method = payment.method.as_str(),
        amount = %payment.amount,
        "payment recorded"
    );
    Ok(payment)
}

pub fn create(
    conn: &mut Connection,
    form: &PaymentForm,
    policy: DuplicatePaymentPolicy,
) -> Result<Payment, AppError> {
    let new_payment = validate(form)?;
    record_payment(conn, new_payment, policy)
}

pub fn list(conn: &Connection) -> Result<Vec<PaymentWithBooking>, AppError> {
    Ok(queries::list_payments_with_bookings(conn)?)
}

/// More than one entry means the booking was paid more than once.
pub fn payments_for_booking(conn: &Connection, booking_id: &str) -> Result<Vec<Payment>, AppError> {
    Ok(queries::list_payments_for_booking(conn, booking_id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Booking, BookingStatus};

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn insert_booking(conn: &Connection, id: &str, status: BookingStatus) {
        let now = queries::now();
        queries::insert_booking(
            conn,
            &Booking {
                id: id.to_string(),
                customer_name: Some("Kasun".to_string()),
                pickup_location: "Negombo".to_string(),
                drop_location: "Jaffna".to_string(),
                date: chrono::NaiveDate::from_ymd_opt(2024, 3, 5),
                status,
                paid: false,
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
    }

    fn cash_form(booking_id: &str, amount: i64) -> PaymentForm {
        PaymentForm {
            booking_id: Some(booking_id.to_string()),
            method: Some("cash".to_string()),
            amount: Some(Decimal::from(amount)),
            ..Default::default()
        }
    }

    fn online_form(booking_id: &str) -> PaymentForm {
        PaymentForm {
            booking_id: Some(booking_id.to_string()),
            method: Some("online".to_string()),
            amount: Some(Decimal::from(250)),
            card_number: Some("4111 1111 1111 1111".to_string()),
            card_holder: Some("Kasun Silva".to_string()),
            expiry: Some("12/27".to_string()),
            cvv: Some("321".to_string()),
        }
    }

    fn is_paid(conn: &Connection, id: &str) -> bool {
        queries::get_booking(conn, id).unwrap().unwrap().paid
    }

    #[test]
    fn test_cash_payment_marks_booking_paid() {
        let mut conn = setup_db();
        insert_booking(&conn, "b1", BookingStatus::Accepted);

        let payment = create(&mut conn, &cash_form("b1", 100), DuplicatePaymentPolicy::Allow).unwrap();
        assert_eq!(payment.method, PaymentMethod::Cash);
        assert_eq!(payment.amount, Decimal::from(100));
        assert!(is_paid(&conn, "b1"));
    }

    #[test]
    fn test_cash_payment_ignores_card_fields() {
        let mut conn = setup_db();
        insert_booking(&conn, "b1", BookingStatus::Accepted);

        let form = PaymentForm {
            method: Some("cash".to_string()),
            ..online_form("b1")
        };
        let payment = create(&mut conn, &form, DuplicatePaymentPolicy::Allow).unwrap();
        assert_eq!(payment.method, PaymentMethod::Cash);
        assert!(payment.method.card().is_none());
    }

    #[test]
    fn test_online_payment_normalizes_card_number() {
        let mut conn = setup_db();
        insert_booking(&conn, "b1", BookingStatus::Accepted);

        let payment = create(&mut conn, &online_form("b1"), DuplicatePaymentPolicy::Allow).unwrap();
        let card = payment.method.card().unwrap();
        assert_eq!(card.card_number, "4111111111111111");
        assert!(is_paid(&conn, "b1"));
    }

    #[test]
    fn test_online_missing_card_field_leaves_booking_unpaid() {
        let mut conn = setup_db();
        insert_booking(&conn, "b1", BookingStatus::Accepted);

        let missing = [
            PaymentForm { card_number: None, ..online_form("b1") },
            PaymentForm { card_holder: None, ..online_form("b1") },
            PaymentForm { expiry: None, ..online_form("b1") },
            PaymentForm { cvv: Some(" ".to_string()), ..online_form("b1") },
        ];
        for form in &missing {
            let result = create(&mut conn, form, DuplicatePaymentPolicy::Allow);
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
        assert!(!is_paid(&conn, "b1"));
        assert!(payments_for_booking(&conn, "b1").unwrap().is_empty());
    }

    #[test]
    fn test_card_format_checks() {
        let bad = [
            PaymentForm { card_number: Some("4111".to_string()), ..online_form("b1") },
            PaymentForm { card_number: Some("411111111111111x".to_string()), ..online_form("b1") },
            PaymentForm { expiry: Some("13/27".to_string()), ..online_form("b1") },
            PaymentForm { expiry: Some("1227".to_string()), ..online_form("b1") },
            PaymentForm { cvv: Some("12".to_string()), ..online_form("b1") },
            PaymentForm { cvv: Some("abc".to_string()), ..online_form("b1") },
        ];
        for form in &bad {
            assert!(validate(form).is_err(), "expected rejection for {form:?}");
        }
        assert!(validate(&online_form("b1")).is_ok());
    }

    #[test]
    fn test_missing_required_fields() {
        let cases = [
            PaymentForm { booking_id: None, ..cash_form("b1", 10) },
            PaymentForm { method: None, ..cash_form("b1", 10) },
            PaymentForm { amount: None, ..cash_form("b1", 10) },
            cash_form("b1", 0),
        ];
        for form in &cases {
            match validate(form) {
                Err(AppError::Validation(msg)) => {
                    assert_eq!(msg, "Booking ID, method, and amount are required")
                }
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_invalid_method_and_negative_amount() {
        let form = PaymentForm {
            method: Some("cheque".to_string()),
            ..cash_form("b1", 10)
        };
        assert!(matches!(validate(&form), Err(AppError::Validation(m)) if m == "Invalid payment method"));
        assert!(matches!(validate(&cash_form("b1", -10)), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_amount_above_ceiling_rejected() {
        let mut conn = setup_db();
        insert_booking(&conn, "b1", BookingStatus::Accepted);

        let at_ceiling = PaymentForm { amount: Some(MAX_AMOUNT), ..cash_form("b1", 1) };
        assert_eq!(validate(&at_ceiling).unwrap().amount, MAX_AMOUNT);

        let huge = PaymentForm { amount: Some(Decimal::MAX), ..cash_form("b1", 1) };
        assert!(matches!(validate(&huge), Err(AppError::Validation(_))));
        let result = create(&mut conn, &huge, DuplicatePaymentPolicy::Allow);
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(!is_paid(&conn, "b1"));
        assert!(payments_for_booking(&conn, "b1").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_or_unaccepted_booking_rejected() {
        let mut conn = setup_db();
        insert_booking(&conn, "pending", BookingStatus::Pending);

        let result = create(&mut conn, &cash_form("ghost", 50), DuplicatePaymentPolicy::Allow);
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = create(&mut conn, &cash_form("pending", 50), DuplicatePaymentPolicy::Allow);
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(!is_paid(&conn, "pending"));
        assert!(payments_for_booking(&conn, "pending").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_payments_allowed_by_default() {
        let mut conn = setup_db();
        insert_booking(&conn, "b1", BookingStatus::Accepted);

        create(&mut conn, &cash_form("b1", 100), DuplicatePaymentPolicy::Allow).unwrap();
        assert!(is_paid(&conn, "b1"));
        create(&mut conn, &cash_form("b1", 100), DuplicatePaymentPolicy::Allow).unwrap();
        assert!(is_paid(&conn, "b1"));

        assert_eq!(payments_for_booking(&conn, "b1").unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_payments_rejected_by_policy() {
        let mut conn = setup_db();
        insert_booking(&conn, "b1", BookingStatus::Accepted);

        create(&mut conn, &cash_form("b1", 100), DuplicatePaymentPolicy::Reject).unwrap();
        let second = create(&mut conn, &cash_form("b1", 100), DuplicatePaymentPolicy::Reject);
        assert!(matches!(second, Err(AppError::Conflict(_))));
        assert_eq!(payments_for_booking(&conn, "b1").unwrap().len(), 1);
    }

    #[test]
    fn test_failed_booking_update_rolls_back_payment() {
        let mut conn = setup_db();
        insert_booking(&conn, "b1", BookingStatus::Accepted);
        conn.execute_batch(
            "CREATE TRIGGER fail_paid BEFORE UPDATE OF paid ON bookings
             BEGIN SELECT RAISE(ABORT, 'bookings are read-only'); END;",
        )
        .unwrap();

        let result = create(&mut conn, &cash_form("b1", 100), DuplicatePaymentPolicy::Allow);
        assert!(matches!(result, Err(AppError::Storage(_))));
        assert!(payments_for_booking(&conn, "b1").unwrap().is_empty());
        assert!(!is_paid(&conn, "b1"));
    }
}
