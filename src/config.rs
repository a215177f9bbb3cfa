use std::env;

/// What to do when a payment arrives for a booking that is already paid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePaymentPolicy {
    /// Record the extra payment and log a warning.
    #[default]
    Allow,
    /// Refuse the payment with a conflict.
    Reject,
}

impl DuplicatePaymentPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Some(DuplicatePaymentPolicy::Allow),
            "reject" => Some(DuplicatePaymentPolicy::Reject),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub duplicate_payments: DuplicatePaymentPolicy,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "truck_rental.db".to_string()),
            duplicate_payments: duplicate_policy_or_default(
                env::var("DUPLICATE_PAYMENT_POLICY").ok().as_deref(),
            ),
        }
    }
}

fn duplicate_policy_or_default(value: Option<&str>) -> DuplicatePaymentPolicy {
    let Some(value) = value else {
        return DuplicatePaymentPolicy::default();
    };
    DuplicatePaymentPolicy::parse(value).unwrap_or_else(|| {
        let fallback = DuplicatePaymentPolicy::default();
        tracing::warn!(
            value,
            ?fallback,
            "unrecognised DUPLICATE_PAYMENT_POLICY, expected allow or reject"
        );
        fallback
    })
}
