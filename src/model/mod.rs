//! Normalized record types emitted by the parsers and detectors.

pub mod calendar;
pub mod contact;
pub mod detection;
pub mod email;

pub use calendar::CalendarEvent;
pub use contact::Contact;
pub use detection::{
    DetectedAccount, DetectedNewsletter, DetectedPurchase, DetectedSubscription,
    NewsletterFrequency, ServiceType, SubscriptionFrequency,
};
pub use email::{EmailRecord, ParseStats};
