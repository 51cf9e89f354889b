//! Purchase detector.
//!
//! Promotional anti-patterns are counted first: three or more distinct hits
//! abort the email at confidence 0, so marketing blasts quoting prices never
//! register as purchases. Scoring: catalog merchant +30, strong subject
//! pattern +35, strong body pattern +25, then amount (+20 / +10) and order
//! number (+15). Emitted at score ≥ 70 with a positive amount and a
//! non-empty merchant.

use regex::{Regex, RegexSet};

use crate::detect::amount;
use crate::detect::catalog::{self, MerchantEntry, MERCHANT_CATALOG};
use crate::model::{DetectedPurchase, EmailRecord};

/// Emission threshold.
const MIN_CONFIDENCE: u32 = 70;

/// Distinct anti-pattern hits at which the email is rejected outright.
const ANTI_PATTERN_LIMIT: usize = 3;

/// Order numbers must fall in this length range.
const ORDER_LEN: std::ops::RangeInclusive<usize> = 5..=30;

/// Tokens that look like order numbers but are CSS class fragments leaking
/// out of HTML bodies.
const CSS_SUFFIXES: &[&str] = &[
    "-collapse", "-color", "-width", "-height", "-radius", "-style", "-spacing",
];

/// Detector for order confirmations and receipts.
pub struct PurchaseDetector {
    anti_patterns: RegexSet,
    subject_patterns: Vec<Regex>,
    body_patterns: Vec<Regex>,
    order_pattern: Regex,
}

impl PurchaseDetector {
    pub fn new() -> Self {
        let anti_patterns = RegexSet::new([
            r"(?i)save \$?\d",
            r"(?i)up to \d+% off",
            r"(?i)\d+% off",
            r"(?i)free shipping",
            r"(?i)limited time",
            r"(?i)promo code",
            r"(?i)shop now",
            r"(?i)unsubscribe",
            r"(?i)flash sale",
            r"(?i)exclusive offer",
            r"(?i)use code",
            r"(?i)don.t miss",
        ])
        .expect("invalid purchase anti-patterns");

        let subject_patterns = compile(&[
            r"(?i)^(?:your )?order (?:confirmation|receipt|#)",
            r"(?i)^receipt (?:for|from)",
            r"(?i)^invoice\b",
            r"(?i)^shipping confirmation",
            r"(?i)^your order has (?:shipped|been placed)",
            r"(?i)^payment (?:confirmation|received)",
            r"(?i)^thank you for your (?:order|purchase)",
        ]);

        let body_patterns = compile(&[
            r"(?i)order total:?\s*[$€£¥]",
            r"(?i)payment of\s*[$€£¥]",
            r"(?i)(?:total|amount) charged:?\s*[$€£¥]",
            r"(?i)your order (?:number|#)",
            r"(?i)thank you for your (?:order|purchase)",
            r"(?i)has been (?:shipped|delivered)",
        ]);

        let order_pattern = Regex::new(
            r"(?i)order\s*(?:confirmation|number|no\.?|id)?\s*[:#]\s*([A-Za-z0-9][A-Za-z0-9-]{3,29})",
        )
        .expect("invalid order-number pattern");

        Self {
            anti_patterns,
            subject_patterns,
            body_patterns,
            order_pattern,
        }
    }

    /// The built-in merchant catalog.
    pub fn known_merchants(&self) -> &'static [MerchantEntry] {
        MERCHANT_CATALOG
    }

    /// Category for a merchant name, when the catalog knows it.
    pub fn category(&self, merchant: &str) -> Option<&'static str> {
        let lower = merchant.to_lowercase();
        MERCHANT_CATALOG
            .iter()
            .find(|e| e.name.to_lowercase() == lower)
            .map(|e| e.category)
    }

    /// Score a single email; `Some` at score ≥ 70 with amount and merchant.
    pub fn detect(&self, email: &EmailRecord) -> Option<DetectedPurchase> {
        let haystack = format!("{}\n{}", email.subject, email.body);

        // Promotional vocabulary gate.
        let anti_hits = self.anti_patterns.matches(&haystack).iter().count();
        if anti_hits >= ANTI_PATTERN_LIMIT {
            return None;
        }

        let domain = email.sender_domain().to_string();
        let catalog_hit = catalog::merchant_for_domain(&domain);

        let mut score: u32 = 0;
        if catalog_hit.is_some() {
            score += 30;
        }
        if self
            .subject_patterns
            .iter()
            .any(|p| p.is_match(&email.subject))
        {
            score += 35;
        }
        if self.body_patterns.iter().any(|p| p.is_match(&email.body)) {
            score += 25;
        }

        if score < 30 {
            return None;
        }

        let (amount, currency) = amount::extract_amount(&haystack)?;
        if amount > 0.0 && amount < 10_000.0 {
            score += 20;
        } else if amount >= 10_000.0 {
            score += 10;
        }

        let order_number = self.extract_order_number(&haystack);
        if order_number.is_some() {
            score += 15;
        }

        let confidence = score.min(100);
        if confidence < MIN_CONFIDENCE || amount <= 0.0 {
            return None;
        }

        let merchant = match catalog_hit {
            Some(entry) => entry.name.to_string(),
            None => email
                .sender_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| catalog::humanize_domain(&domain)),
        };
        if merchant.is_empty() {
            return None;
        }

        Some(DetectedPurchase {
            merchant,
            amount,
            currency,
            purchase_date: email.date,
            order_number,
            items: Vec::new(),
            category: catalog_hit.map(|e| e.category.to_string()).unwrap_or_else(|| "other".into()),
            email_id: email.id,
            confidence: confidence as u8,
        })
    }

    /// Detect across a whole archive; one record per qualifying email.
    pub fn detect_batch(&self, emails: &[EmailRecord]) -> Vec<DetectedPurchase> {
        emails.iter().filter_map(|e| self.detect(e)).collect()
    }

    /// Pull a plausible order number out of the text.
    fn extract_order_number(&self, text: &str) -> Option<String> {
        for caps in self.order_pattern.captures_iter(text) {
            let token = caps.get(1)?.as_str();
            if is_valid_order_number(token) {
                return Some(token.to_string());
            }
        }
        None
    }
}

impl Default for PurchaseDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Order-number validity: 5–30 chars, leading alphanumeric, alphanumerics
/// and hyphens throughout, and no CSS-like suffix.
fn is_valid_order_number(token: &str) -> bool {
    if !ORDER_LEN.contains(&token.len()) {
        return false;
    }
    let mut chars = token.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphanumeric()) {
        return false;
    }
    if !token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return false;
    }
    let lower = token.to_lowercase();
    !CSS_SUFFIXES.iter().any(|s| lower.ends_with(s))
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("invalid purchase pattern"))
        .collect()
}
