//! Monetary amount and currency extraction.
//!
//! Context-anchored patterns (`total: $X`, `amount charged: $X`) are tried
//! first; a fallback scan then captures up to five currency-tagged amounts
//! anywhere in the text and returns the largest plausible one.

use std::sync::OnceLock;

use regex::Regex;

/// Upper bound for a believable single amount in the fallback scan.
const MAX_PLAUSIBLE: f64 = 500_000.0;

/// How many fallback captures to consider per message.
const FALLBACK_CAPTURES: usize = 5;

fn anchored_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)(?:order\s+|grand\s+)?total:?\s*([$€£¥])\s*([0-9][0-9.,']*)",
            r"(?i)amount\s+(?:charged|paid|due):?\s*([$€£¥])\s*([0-9][0-9.,']*)",
            r"(?i)payment\s+of\s+([$€£¥])\s*([0-9][0-9.,']*)",
            r"(?i)(?:you\s+paid|charged|billed)\s*:?\s*([$€£¥])\s*([0-9][0-9.,']*)",
            r"(?i)total\s+amount:?\s*([$€£¥])\s*([0-9][0-9.,']*)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("invalid anchored amount pattern"))
        .collect()
    })
}

fn fallback_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:([$€£¥])\s*([0-9][0-9.,']*)|([0-9][0-9.,']*)\s*(USD|EUR|GBP|JPY))")
            .expect("invalid fallback amount pattern")
    })
}

/// ISO 4217 code for a currency symbol.
pub fn currency_code(symbol: &str) -> &'static str {
    match symbol {
        "€" => "EUR",
        "£" => "GBP",
        "¥" => "JPY",
        _ => "USD",
    }
}

/// Extract the most credible `(amount, currency)` pair from `text`.
///
/// Anchored patterns win outright; otherwise the fallback scan returns the
/// maximum captured amount in `(0, 500000]`.
pub fn extract_amount(text: &str) -> Option<(f64, String)> {
    for pattern in anchored_patterns() {
        if let Some(caps) = pattern.captures(text) {
            let symbol = caps.get(1).map(|m| m.as_str()).unwrap_or("$");
            let code = currency_code(symbol);
            if let Some(amount) = parse_amount(caps.get(2)?.as_str(), code) {
                if amount > 0.0 {
                    return Some((amount, code.to_string()));
                }
            }
        }
    }

    let mut best: Option<(f64, String)> = None;
    for caps in fallback_pattern().captures_iter(text).take(FALLBACK_CAPTURES) {
        let (raw, code) = if let Some(symbol) = caps.get(1) {
            (caps.get(2)?.as_str(), currency_code(symbol.as_str()))
        } else {
            let code: &'static str = match caps.get(4)?.as_str().to_uppercase().as_str() {
                "EUR" => "EUR",
                "GBP" => "GBP",
                "JPY" => "JPY",
                _ => "USD",
            };
            (caps.get(3)?.as_str(), code)
        };
        let Some(amount) = parse_amount(raw, code) else {
            continue;
        };
        if amount <= 0.0 || amount > MAX_PLAUSIBLE {
            continue;
        }
        if best.as_ref().map(|(a, _)| amount > *a).unwrap_or(true) {
            best = Some((amount, code.to_string()));
        }
    }
    best
}

/// Parse a raw numeric token into a decimal amount.
///
/// European decimal handling: an EUR amount ending in `,\d{2}` treats dots
/// as thousand separators and the comma as the decimal point. Everywhere
/// else, comma and apostrophe thousand separators are stripped.
pub fn parse_amount(raw: &str, currency: &str) -> Option<f64> {
    let token = raw.trim().trim_end_matches(['.', ',']);
    if token.is_empty() {
        return None;
    }

    let european_decimal = currency == "EUR" && has_comma_decimal_tail(token);
    let normalized = if european_decimal {
        token.replace(['.', '\''], "").replace(',', ".")
    } else {
        token.replace([',', '\''], "")
    };

    normalized.parse::<f64>().ok().filter(|a| a.is_finite() && *a >= 0.0)
}

/// True when the token ends in a `,dd` decimal tail (e.g. `1.234,56`).
fn has_comma_decimal_tail(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() >= 3
        && bytes[bytes.len() - 3] == b','
        && bytes[bytes.len() - 2].is_ascii_digit()
        && bytes[bytes.len() - 1].is_ascii_digit()
}
