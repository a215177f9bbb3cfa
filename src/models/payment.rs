use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use super::BookingStatus;

/// Card fields captured for an online payment. Never charged or verified with an issuer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetails {
    #[serde(serialize_with = "serialize_masked")]
    pub card_number: String,
    pub card_holder: String,
    pub expiry: String,
    #[serde(skip_serializing)]
    pub cvv: String,
}

impl CardDetails {
    pub fn masked_number(&self) -> String {
        mask_card_number(&self.card_number)
    }
}

fn mask_card_number(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(|c| !c.is_whitespace()).collect();
    let visible = digits.len().saturating_sub(4);
    digits
        .iter()
        .enumerate()
        .map(|(i, c)| if i < visible { '*' } else { *c })
        .collect()
}

fn serialize_masked<S: Serializer>(number: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&mask_card_number(number))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Online(CardDetails),
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Online(_) => "online",
        }
    }

    pub fn card(&self) -> Option<&CardDetails> {
        match self {
            PaymentMethod::Cash => None,
            PaymentMethod::Online(card) => Some(card),
        }
    }
}

/// A validated payment, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub booking_id: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub booking_id: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
    #[serde(flatten)]
    pub method: PaymentMethod,
    pub created_at: NaiveDateTime,
}

/// The booking fields reports need, resolved at read time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub id: String,
    pub pickup_location: String,
    pub drop_location: String,
    pub date: Option<NaiveDate>,
    pub status: BookingStatus,
    pub paid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWithBooking {
    #[serde(flatten)]
    pub payment: Payment,
    /// `None` when the booking was deleted after payment.
    pub booking: Option<BookingSummary>,
}

impl PaymentWithBooking {
    pub fn booking_date(&self) -> Option<NaiveDate> {
        self.booking.as_ref().and_then(|b| b.date)
    }
}

/// Raw payment submission. Card fields only matter for online payments.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentForm {
    pub booking_id: Option<String>,
    pub method: Option<String>,
    pub amount: Option<Decimal>,
    pub card_number: Option<String>,
    pub card_holder: Option<String>,
    pub expiry: Option<String>,
    pub cvv: Option<String>,
}
