//! `mailsift` — turn personal email archives into structured, classified
//! records.
//!
//! The crate has two tightly-coupled halves:
//!
//! - **Ingestion**: a streaming MBOX parser (chunked reads, `From `-line
//!   splitting, full MIME multipart decoding) and an OLM decoder (ZIP +
//!   OPF-vocabulary XML), both emitting the same normalized
//!   [`model::EmailRecord`].
//! - **Classification**: four deterministic detectors (accounts, purchases,
//!   subscriptions, newsletters) scoring each record against immutable
//!   pattern catalogs and aggregating across the archive.
//!
//! ```no_run
//! use mailsift::{parse_archive, ByteSource, ParseOptions};
//!
//! let source = ByteSource::open("export.mbox")?;
//! let options = ParseOptions::default().with_all_detectors();
//! let result = parse_archive(&source, &options, None);
//! println!("{} emails, {} subscriptions", result.emails.len(), result.subscriptions.len());
//! # Ok::<(), mailsift::SiftError>(())
//! ```

pub mod archive;
pub mod detect;
pub mod error;
pub mod model;
pub mod options;
pub mod parser;
pub mod source;

pub use archive::{parse_archive, sniff_format, ArchiveFormat, ParseResult};
pub use detect::{
    AccountDetector, MailCategory, NewsletterDetector, PurchaseDetector, SubscriptionDetector,
};
pub use error::{Result, SiftError};
pub use model::{
    CalendarEvent, Contact, DetectedAccount, DetectedNewsletter, DetectedPurchase,
    DetectedSubscription, EmailRecord, NewsletterFrequency, ParseStats, ServiceType,
    SubscriptionFrequency,
};
pub use options::{CancelToken, ParseOptions, ProgressStage, ProgressUpdate};
pub use parser::{MboxParser, OlmParser};
pub use source::ByteSource;
