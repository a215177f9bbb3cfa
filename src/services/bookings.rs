use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{parse_calendar_date, Booking, BookingForm, BookingStatus};

pub fn parse_status(s: &str) -> Result<BookingStatus, AppError> {
    BookingStatus::parse(s.trim())
        .ok_or_else(|| AppError::Validation(format!("Invalid booking status: {s}")))
}

pub fn list(conn: &Connection, status: Option<&str>) -> Result<Vec<Booking>, AppError> {
    let status = status
        .filter(|s| !s.trim().is_empty())
        .map(parse_status)
        .transpose()?;
    Ok(queries::list_bookings(conn, status)?)
}

pub fn get(conn: &Connection, id: &str) -> Result<Booking, AppError> {
    queries::get_booking(conn, id)?.ok_or(AppError::NotFound("Booking"))
}

pub fn create(conn: &Connection, form: &BookingForm) -> Result<Booking, AppError> {
    let required = |value: &Option<String>, name: &str| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    };

    let pickup_location = required(&form.pickup_location, "Pickup location")?;
    let drop_location = required(&form.drop_location, "Drop location")?;

    let date = match form.date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(d) => Some(
            parse_calendar_date(d)
                .ok_or_else(|| AppError::Validation(format!("Invalid date: {d}")))?,
        ),
    };

    let now = queries::now();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        customer_name: form
            .customer_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        pickup_location,
        drop_location,
        date,
        status: BookingStatus::Pending,
        paid: false,
        created_at: now,
        updated_at: now,
    };
    queries::insert_booking(conn, &booking)?;

    tracing::info!(booking_id = %booking.id, "booking created");
    Ok(booking)
}

/// Moves a booking through its lifecycle. `paid` is owned by the payment ledger.
pub fn update_status(conn: &Connection, id: &str, status: &str) -> Result<Booking, AppError> {
    let status = parse_status(status)?;
    if !queries::update_booking_status(conn, id, status)? {
        return Err(AppError::NotFound("Booking"));
    }
    tracing::info!(booking_id = %id, status = status.as_str(), "booking status changed");
    get(conn, id)
}

/// Payments referencing the booking are kept.
pub fn delete(conn: &Connection, id: &str) -> Result<(), AppError> {
    if queries::delete_booking(conn, id)? {
        Ok(())
    } else {
        Err(AppError::NotFound("Booking"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn form() -> BookingForm {
        BookingForm {
            customer_name: Some("Dilani".to_string()),
            pickup_location: Some("Kurunegala".to_string()),
            drop_location: Some("Trincomalee".to_string()),
            date: Some("2024-03-05".to_string()),
        }
    }

    #[test]
    fn test_new_booking_is_pending_and_unpaid() {
        let conn = db::init_db(":memory:").unwrap();
        let booking = create(&conn, &form()).unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(!booking.paid);
        assert_eq!(get(&conn, &booking.id).unwrap().drop_location, "Trincomalee");
    }

    #[test]
    fn test_locations_required_date_optional() {
        let conn = db::init_db(":memory:").unwrap();
        let no_pickup = BookingForm { pickup_location: None, ..form() };
        assert!(matches!(create(&conn, &no_pickup), Err(AppError::Validation(_))));

        let undated = BookingForm { date: None, ..form() };
        assert_eq!(create(&conn, &undated).unwrap().date, None);
    }

    #[test]
    fn test_status_transitions() {
        let conn = db::init_db(":memory:").unwrap();
        let booking = create(&conn, &form()).unwrap();

        let accepted = update_status(&conn, &booking.id, "accepted").unwrap();
        assert_eq!(accepted.status, BookingStatus::Accepted);

        assert!(matches!(
            update_status(&conn, &booking.id, "teleported"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            update_status(&conn, "missing", "rejected"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_with_status_filter() {
        let conn = db::init_db(":memory:").unwrap();
        let first = create(&conn, &form()).unwrap();
        create(&conn, &form()).unwrap();
        update_status(&conn, &first.id, "accepted").unwrap();

        assert_eq!(list(&conn, None).unwrap().len(), 2);
        assert_eq!(list(&conn, Some("accepted")).unwrap().len(), 1);
        assert_eq!(list(&conn, Some("")).unwrap().len(), 2);
        assert!(list(&conn, Some("bogus")).is_err());
    }
}
