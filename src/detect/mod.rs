//! The classification pipeline: four rule-based detectors over parsed
//! archives.
//!
//! Detectors are deterministic and stateless between single-email calls;
//! batch mode owns temporary aggregation maps that are released when the
//! batch result returns. Pattern catalogs are immutable tables shared by
//! read-only reference.

pub mod account;
pub mod amount;
pub mod catalog;
pub mod newsletter;
pub mod purchase;
pub mod subscription;

pub use account::AccountDetector;
pub use newsletter::{MailCategory, NewsletterDetector};
pub use purchase::PurchaseDetector;
pub use subscription::SubscriptionDetector;

use crate::archive::ParseResult;
use crate::options::{ParseOptions, ProgressFn, ProgressStage, ProgressUpdate};

/// Run the enabled detectors over an already-parsed result.
///
/// No-op when every detector flag is off. On cancellation the partially
/// accumulated detection state is discarded and the result carries
/// [`crate::error::SiftError::Cancelled`].
pub fn apply_detectors(
    result: &mut ParseResult,
    options: &ParseOptions,
    progress: Option<ProgressFn<'_>>,
) {
    if !options.any_detector() {
        if let Some(cb) = progress {
            cb(ProgressUpdate::new(
                ProgressStage::Complete,
                100,
                format!("{} emails", result.emails.len()),
            ));
        }
        return;
    }

    if options.cancelled() {
        result.error = Some(crate::error::SiftError::Cancelled);
        return;
    }

    let report = |stage_done: u8, message: &str| {
        if let Some(cb) = progress {
            cb(ProgressUpdate::new(
                ProgressStage::Detecting,
                stage_done,
                message.to_string(),
            ));
        }
    };

    if options.detect_accounts {
        let detector = AccountDetector::new();
        result.accounts = detector.detect_batch(&result.emails);
        report(25, &format!("{} accounts", result.accounts.len()));
    }
    if options.detect_purchases {
        let detector = PurchaseDetector::new();
        result.purchases = detector.detect_batch(&result.emails);
        report(50, &format!("{} purchases", result.purchases.len()));
    }
    if options.detect_subscriptions {
        let detector = SubscriptionDetector::new();
        result.subscriptions = detector.detect_batch(&result.emails);
        report(75, &format!("{} subscriptions", result.subscriptions.len()));
    }
    if options.detect_newsletters {
        let detector = NewsletterDetector::new();
        result.newsletters = detector.detect_batch(&result.emails);
        report(100, &format!("{} newsletters", result.newsletters.len()));
    }

    if options.cancelled() {
        // Discard partial detector state; no half-built aggregate escapes.
        result.accounts.clear();
        result.purchases.clear();
        result.subscriptions.clear();
        result.newsletters.clear();
        result.error = Some(crate::error::SiftError::Cancelled);
        return;
    }

    if let Some(cb) = progress {
        cb(ProgressUpdate::new(
            ProgressStage::Complete,
            100,
            format!("{} emails", result.emails.len()),
        ));
    }
}
