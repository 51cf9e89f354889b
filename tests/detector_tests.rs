//! Integration tests for the detector pipeline over parsed archives.

use std::path::Path;

use mailsift::detect::amount;
use mailsift::parser::MboxParser;
use mailsift::{
    AccountDetector, ByteSource, NewsletterDetector, NewsletterFrequency, ParseOptions,
    PurchaseDetector, ServiceType, SubscriptionDetector, SubscriptionFrequency,
};

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn parse(name: &str) -> mailsift::ParseResult {
    let source = ByteSource::open(fixture(name)).unwrap();
    MboxParser::parse(&source, &ParseOptions::default())
}

// ─── Purchases ─────────────────────────────────────────────────────

#[test]
fn test_purchase_scenario_amazon() {
    let result = parse("detectors.mbox");
    let detector = PurchaseDetector::new();
    let purchases = detector.detect_batch(&result.emails);
    assert_eq!(purchases.len(), 1);
    let p = &purchases[0];
    assert_eq!(p.merchant, "Amazon");
    assert_eq!(p.amount, 49.99);
    assert_eq!(p.currency, "USD");
    assert_eq!(p.order_number.as_deref(), Some("ABC-123456"));
    assert_eq!(p.category, "ecommerce");
}

#[test]
fn test_amount_round_trip() {
    // Canonical amounts printed into a receipt template must be recovered
    // exactly, with their currency.
    let cases = [
        (12.99_f64, "USD", "$"),
        (1299.5_f64, "USD", "$"),
        (7.0_f64, "GBP", "£"),
        (89.99_f64, "EUR", "€"),
    ];
    for (amount_in, currency_in, symbol) in cases {
        let body = format!("Thanks for shopping.\nOrder total: {symbol}{amount_in:.2}\n");
        let (amount_out, currency_out) = amount::extract_amount(&body).unwrap();
        assert!(
            (amount_out - amount_in).abs() < 1e-9,
            "expected {amount_in}, got {amount_out}"
        );
        assert_eq!(currency_out, currency_in);
    }
}

// ─── Accounts ──────────────────────────────────────────────────────

#[test]
fn test_account_scenario_netflix() {
    let result = parse("detectors.mbox");
    let detector = AccountDetector::new();
    let accounts = detector.detect_batch(&result.emails);
    let netflix = accounts
        .iter()
        .find(|a| a.service_name == "Netflix")
        .expect("Netflix signup should be detected");
    assert_eq!(netflix.service_type, ServiceType::Streaming);
    assert!(netflix.confidence >= 80);
}

#[test]
fn test_account_batch_names_pairwise_distinct() {
    let result = parse("detectors.mbox");
    let accounts = AccountDetector::new().detect_batch(&result.emails);
    let mut names: Vec<String> = accounts
        .iter()
        .map(|a| a.service_name.to_lowercase())
        .collect();
    let before = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), before, "service names must be pairwise distinct");
}

// ─── Subscriptions ─────────────────────────────────────────────────

#[test]
fn test_subscription_from_archive() {
    let result = parse("detectors.mbox");
    let subs = SubscriptionDetector::new().detect_batch(&result.emails);
    assert_eq!(subs.len(), 1);
    let s = &subs[0];
    assert_eq!(s.service_name, "Netflix");
    assert_eq!(s.category, "streaming");
    assert_eq!(s.monthly_amount, 15.49);
    assert_eq!(s.frequency, SubscriptionFrequency::Monthly);
}

// ─── Newsletters ───────────────────────────────────────────────────

#[test]
fn test_newsletter_scenario_weekly() {
    let result = parse("detectors.mbox");
    let newsletters = NewsletterDetector::new().detect_batch(&result.emails);
    assert_eq!(newsletters.len(), 1);
    let n = &newsletters[0];
    assert_eq!(n.sender_email, "newsletter@blog.com");
    assert_eq!(n.email_count, 3);
    assert_eq!(n.frequency, NewsletterFrequency::Weekly);
    assert!(n.unsubscribe_link.as_deref().unwrap_or("").contains("unsubscribe"));
    assert_eq!(
        n.last_email_date.format("%Y-%m-%d").to_string(),
        "2024-01-15"
    );
}

// ─── Whole-pipeline options ────────────────────────────────────────

#[test]
fn test_parse_with_all_detectors() {
    let source = ByteSource::open(fixture("detectors.mbox")).unwrap();
    let options = ParseOptions::default().with_all_detectors();
    let result = MboxParser::parse(&source, &options);
    assert!(result.is_complete());
    assert!(!result.accounts.is_empty());
    assert!(!result.purchases.is_empty());
    assert!(!result.subscriptions.is_empty());
    assert!(!result.newsletters.is_empty());
    // Detection records reference emails by id only.
    for p in &result.purchases {
        assert!(p.email_id < result.emails.len());
    }
    for s in &result.subscriptions {
        for id in &s.email_ids {
            assert!(*id < result.emails.len());
        }
    }
}

#[test]
fn test_detectors_skipped_by_default() {
    let result = parse("detectors.mbox");
    assert!(result.accounts.is_empty());
    assert!(result.purchases.is_empty());
    assert!(result.subscriptions.is_empty());
    assert!(result.newsletters.is_empty());
}

#[test]
fn test_cancellation_discards_detector_state() {
    use mailsift::CancelToken;

    let token = CancelToken::new();
    let captured = token.clone();
    // Cancel as soon as the detector stage reports progress.
    let on_progress = move |update: mailsift::ProgressUpdate| {
        if update.stage == mailsift::ProgressStage::Detecting {
            captured.cancel();
        }
    };
    let options = ParseOptions {
        cancel: Some(token),
        ..ParseOptions::default().with_all_detectors()
    };
    let source = ByteSource::open(fixture("detectors.mbox")).unwrap();
    let result = MboxParser::parse_with_progress(&source, &options, Some(&on_progress));
    assert!(matches!(result.error, Some(mailsift::SiftError::Cancelled)));
    assert!(result.accounts.is_empty());
    assert!(result.purchases.is_empty());
    assert!(result.subscriptions.is_empty());
    assert!(result.newsletters.is_empty());
}
