pub mod bookings;
pub mod expenses;
pub mod payments;
pub mod reports;
