//! Typed results of the four classification detectors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Semantic category of a service a user signed up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Streaming,
    Ecommerce,
    Social,
    Banking,
    Communication,
    Development,
    Other,
}

/// Billing cadence of a detected subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionFrequency {
    Weekly,
    Monthly,
    Yearly,
}

/// Observed sending cadence of a newsletter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsletterFrequency {
    Daily,
    Weekly,
    Monthly,
    Irregular,
}

/// A detected service account sign-up.
///
/// Batch aggregation keys case-insensitively on `service_name`, keeps the
/// earliest `signup_date`, and counts every additional hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedAccount {
    pub service_name: String,
    pub signup_date: DateTime<Utc>,
    pub service_type: ServiceType,
    pub domain: String,
    pub email_count: usize,
    /// Id of the email that first evidenced the sign-up.
    pub signup_email_id: usize,
    /// Confidence score in `[0, 100]` at detection time.
    pub confidence: u8,
}

/// A detected purchase or order confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedPurchase {
    pub merchant: String,
    /// Non-negative decimal amount.
    pub amount: f64,
    /// ISO 4217 code (`USD`, `EUR`, `GBP`, `JPY`).
    pub currency: String,
    pub purchase_date: DateTime<Utc>,
    pub order_number: Option<String>,
    pub items: Vec<String>,
    pub category: String,
    pub email_id: usize,
    pub confidence: u8,
}

/// A detected recurring subscription.
///
/// Batch aggregation keys case-insensitively on `service_name`; the most
/// recent email drives `monthly_amount`, `frequency` and `last_renewal_date`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedSubscription {
    pub service_name: String,
    pub monthly_amount: f64,
    pub currency: String,
    pub frequency: SubscriptionFrequency,
    pub last_renewal_date: DateTime<Utc>,
    pub email_ids: Vec<usize>,
    pub is_active: bool,
    pub category: String,
}

/// A detected newsletter or promotional sender, keyed by `sender_email`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedNewsletter {
    pub sender_email: String,
    pub sender_name: Option<String>,
    pub email_count: usize,
    pub last_email_date: DateTime<Utc>,
    pub frequency: NewsletterFrequency,
    pub unsubscribe_link: Option<String>,
    pub is_promotional: bool,
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Streaming => "streaming",
            Self::Ecommerce => "ecommerce",
            Self::Social => "social",
            Self::Banking => "banking",
            Self::Communication => "communication",
            Self::Development => "development",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}
